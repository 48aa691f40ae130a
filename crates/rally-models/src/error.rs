//! Validation errors for model types.

use thiserror::Error;

/// Result type for model validation.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised when a model value violates its invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Invalid bounding box ({x1}, {y1}, {x2}, {y2}): expected x1 <= x2 and y1 <= y2")]
    InvalidBox { x1: f64, y1: f64, x2: f64, y2: f64 },

    #[error("Bounding box has a non-finite coordinate")]
    NonFiniteCoordinate,

    #[error("Unknown reversal kind: {0}")]
    UnknownReversalKind(String),
}
