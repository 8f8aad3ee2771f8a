mod correlation;
mod moments;
mod roc;

pub use correlation::*;
pub use moments::*;
pub use roc::*;
