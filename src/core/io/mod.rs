mod data;
mod market;

pub use data::*;
pub use market::*;

pub mod write;
pub use write::*;
