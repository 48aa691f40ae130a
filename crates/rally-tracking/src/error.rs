//! Error types for trajectory and shot analysis.

use rally_models::{FrameIndex, ModelError};
use rally_storage::StorageError;
use thiserror::Error;

/// Result type for pure data transformations.
pub type DataResult<T> = Result<T, DataError>;

/// Result type for pipeline operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors raised by the trajectory builder when the input cannot be resolved.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("No ball detection in any of {frame_count} frames")]
    InsufficientData { frame_count: usize },

    #[error(
        "{frame_count} trailing frame(s) starting at frame {first_frame} have no detection after the last known position"
    )]
    UnresolvedTrailingGap {
        first_frame: FrameIndex,
        frame_count: usize,
    },

    #[error("Invalid detection at frame {frame}: {source}")]
    Validation {
        frame: FrameIndex,
        #[source]
        source: ModelError,
    },
}

/// Errors that can occur while running the shot analysis pipeline.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("Detection cache error: {0}")]
    Cache(#[from] StorageError),

    #[error("Ball detection failed: {0}")]
    DetectionFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    /// Create a detection failure error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the pipeline can continue by recomputing detections.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Cache(_))
    }
}
