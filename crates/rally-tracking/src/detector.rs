//! Ball detection capability.
//!
//! Inference lives outside this crate. The pipeline only needs something that
//! turns one frame into at most one ball box, so detectors are injected
//! through this trait instead of being shared globals.

use async_trait::async_trait;
use rally_models::{BoundingBox, Detection};

use crate::error::AnalysisResult;

/// Per-frame ball detector.
#[async_trait]
pub trait BallDetector: Send + Sync {
    /// Frame representation the detector consumes.
    type Frame: Send + Sync;

    /// Locate the ball in a single frame.
    async fn detect_frame(&self, frame: &Self::Frame) -> AnalysisResult<Detection>;

    /// Detector name for logging.
    fn name(&self) -> &'static str;
}

/// Detector that replays a fixed list of candidate boxes per frame.
///
/// Frames are indices into the script. Useful for offline replays of
/// exported detector output and in tests.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBallDetector {
    frames: Vec<Vec<BoundingBox>>,
}

impl ScriptedBallDetector {
    pub fn new(frames: Vec<Vec<BoundingBox>>) -> Self {
        Self { frames }
    }

    /// Script with at most one box per frame.
    pub fn from_detections(detections: &[Detection]) -> Self {
        Self {
            frames: detections
                .iter()
                .map(|d| d.bbox().copied().into_iter().collect())
                .collect(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

#[async_trait]
impl BallDetector for ScriptedBallDetector {
    type Frame = usize;

    async fn detect_frame(&self, frame: &usize) -> AnalysisResult<Detection> {
        // Frames past the end of the script have no ball
        let candidates = self.frames.get(*frame).cloned().unwrap_or_default();
        Ok(Detection::from_candidates(candidates))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
