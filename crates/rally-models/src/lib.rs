//! Shared data models for ball trajectory and shot analysis.
//!
//! This crate provides Serde-serializable types for:
//! - Ball bounding boxes and per-frame detections
//! - Shot events (confirmed vertical direction reversals)
//! - The versioned detection log persisted by the detection cache

pub mod bbox;
pub mod detection;
pub mod detection_log;
pub mod error;
pub mod shot;

// Re-export common types
pub use bbox::BoundingBox;
pub use detection::Detection;
pub use detection_log::{BallDetectionLog, FrameRecord, DETECTION_LOG_VERSION};
pub use error::{ModelError, ModelResult};
pub use shot::{FrameIndex, ReversalKind, ShotEvent};
