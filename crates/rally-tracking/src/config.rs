//! Configuration for trajectory and shot analysis.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How to treat frames after the last known ball position.
///
/// Trailing frames cannot be interpolated or back-filled, so the builder
/// reports them and leaves the decision to the caller.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrailingGapPolicy {
    /// Return `DataError::UnresolvedTrailingGap`.
    Fail,

    /// Analyze only the resolved prefix of the trajectory.
    #[default]
    Truncate,

    /// Repeat the last known box until the final frame.
    HoldLastKnown,
}

impl TrailingGapPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrailingGapPolicy::Fail => "fail",
            TrailingGapPolicy::Truncate => "truncate",
            TrailingGapPolicy::HoldLastKnown => "hold_last_known",
        }
    }
}

impl fmt::Display for TrailingGapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TrailingGapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(TrailingGapPolicy::Fail),
            "truncate" => Ok(TrailingGapPolicy::Truncate),
            "hold_last_known" | "hold" => Ok(TrailingGapPolicy::HoldLastKnown),
            _ => Err(format!("Unknown trailing gap policy: {}", s)),
        }
    }
}

/// Configuration for the shot event detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShotDetectorConfig {
    /// Minimum number of frames that must move in the new direction after a
    /// reversal for it to count as a hit (default: 25).
    pub min_change_frames: usize,

    /// Series length at which candidate confirmation runs on the rayon pool.
    pub parallel_threshold: usize,
}

impl Default for ShotDetectorConfig {
    fn default() -> Self {
        Self {
            min_change_frames: 25,
            parallel_threshold: 4096,
        }
    }
}

impl ShotDetectorConfig {
    /// Look-ahead span examined after each candidate: `ceil(min_change_frames * 1.2)`.
    ///
    /// Computed in integer arithmetic so 25 maps to exactly 30. Saturates for
    /// values too large to scale; such a window never fits any series.
    pub fn confirmation_window(&self) -> usize {
        self.min_change_frames.saturating_mul(6).div_ceil(5)
    }

    /// Consistent frames needed to confirm a candidate.
    ///
    /// The count must exceed `min_change_frames - 1`.
    pub fn required_consistent_frames(&self) -> usize {
        self.min_change_frames
    }

    /// Builder: Set minimum change frames.
    pub fn with_min_change_frames(mut self, frames: usize) -> Self {
        self.min_change_frames = frames;
        self
    }

    /// Builder: Set the parallel scan threshold.
    pub fn with_parallel_threshold(mut self, frames: usize) -> Self {
        self.parallel_threshold = frames;
        self
    }
}

/// Configuration for the whole shot analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Shot detector settings.
    pub shot: ShotDetectorConfig,

    /// Treatment of frames after the last known ball position.
    pub trailing_gap_policy: TrailingGapPolicy,

    /// Whether to try the detection cache before running the detector.
    /// Fresh detections are stored whenever a cache key is given.
    #[serde(default = "default_read_from_cache")]
    pub read_from_cache: bool,
}

fn default_read_from_cache() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            shot: ShotDetectorConfig::default(),
            trailing_gap_policy: TrailingGapPolicy::default(),
            read_from_cache: default_read_from_cache(),
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: Set shot detector config.
    pub fn with_shot_config(mut self, shot: ShotDetectorConfig) -> Self {
        self.shot = shot;
        self
    }

    /// Builder: Set trailing gap policy.
    pub fn with_trailing_gap_policy(mut self, policy: TrailingGapPolicy) -> Self {
        self.trailing_gap_policy = policy;
        self
    }

    /// Builder: Enable/disable reading from the detection cache.
    pub fn with_read_from_cache(mut self, enabled: bool) -> Self {
        self.read_from_cache = enabled;
        self
    }
}
