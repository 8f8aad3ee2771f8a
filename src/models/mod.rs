//! Scaler and classifier used by the walk-forward evaluator.

mod logistic;
mod pipeline;
mod scaler;

pub use logistic::LogisticRegression;
pub use pipeline::Pipeline;
pub use scaler::StandardScaler;

use thiserror::Error;

/// Errors raised while fitting or applying a model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("model has not been fitted yet")]
    NotFitted,

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("cannot fit on an empty matrix")]
    EmptyInput,

    #[error("training labels contain a single class")]
    SingleClass,

    #[error("singular Newton system at iteration {0}")]
    Singular(usize),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
