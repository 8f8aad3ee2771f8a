//! Shared building blocks for the equity signal research tool: the aligned
//! daily price series and its file formats, output directories, and the
//! scaler + logistic regression pipeline fitted by the walk-forward evaluator.

pub mod core;
pub mod models;
