//! Versioned detection log models.
//!
//! This module defines the portable document persisted by the detection cache:
//! one record per frame, in frame order, with a nullable box.
//!
//! ```json
//! {
//!   "version": 1,
//!   "created_at": "2026-10-19T12:00:00Z",
//!   "frame_count": 2,
//!   "frames": [
//!     {"frame": 0, "bbox": {"x1": 10.0, "y1": 20.0, "x2": 14.0, "y2": 24.0}},
//!     {"frame": 1, "bbox": null}
//!   ]
//! }
//! ```

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::detection::Detection;
use crate::shot::FrameIndex;

/// Version of the detection log format.
/// Increment this when the structure changes to invalidate old caches.
pub const DETECTION_LOG_VERSION: u32 = 1;

/// Ball detections for every frame of one video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct BallDetectionLog {
    /// Version of the log format for cache invalidation
    pub version: u32,

    /// When this log was created
    pub created_at: DateTime<Utc>,

    /// Number of frames in the video
    pub frame_count: usize,

    /// Per-frame records, ordered by frame index
    pub frames: Vec<FrameRecord>,
}

/// Detection record for a single frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct FrameRecord {
    /// Zero-based frame index
    pub frame: FrameIndex,

    /// Ball box, `null` when the ball was not found
    pub bbox: Option<BoundingBox>,
}

impl BallDetectionLog {
    /// Build a log from a dense per-frame detection sequence.
    pub fn from_detections(detections: &[Detection]) -> Self {
        let frames = detections
            .iter()
            .enumerate()
            .map(|(frame, detection)| FrameRecord {
                frame,
                bbox: detection.bbox().copied(),
            })
            .collect();

        Self {
            version: DETECTION_LOG_VERSION,
            created_at: Utc::now(),
            frame_count: detections.len(),
            frames,
        }
    }

    /// Check if this log is compatible with the current version.
    pub fn is_current_version(&self) -> bool {
        self.version == DETECTION_LOG_VERSION
    }

    /// Whether records are numbered `0..frame_count` with no gaps or repeats.
    pub fn is_dense(&self) -> bool {
        self.frames.len() == self.frame_count
            && self
                .frames
                .iter()
                .enumerate()
                .all(|(idx, record)| record.frame == idx)
    }

    /// Whether every recorded box satisfies its corner ordering and is finite.
    pub fn has_valid_boxes(&self) -> bool {
        self.frames
            .iter()
            .filter_map(|r| r.bbox.as_ref())
            .all(BoundingBox::is_valid)
    }

    /// Number of frames with a ball box.
    pub fn present_count(&self) -> usize {
        self.frames.iter().filter(|r| r.bbox.is_some()).count()
    }

    /// Convert back to a per-frame detection sequence.
    ///
    /// Returns `None` when the log is not dense, since frame positions would
    /// otherwise be ambiguous, or when any box fails validation.
    pub fn to_detections(&self) -> Option<Vec<Detection>> {
        if !self.is_dense() || !self.has_valid_boxes() {
            return None;
        }
        Some(self.frames.iter().map(|r| Detection::from(r.bbox)).collect())
    }
}
