//! Runner configuration.

use std::path::PathBuf;

use rally_tracking::{AnalysisConfig, ShotDetectorConfig, TrailingGapPolicy};

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Root directory of the detection cache
    pub cache_dir: PathBuf,
    /// Try cached detections before replaying a detection export
    pub read_from_cache: bool,
    /// Frames that must follow a reversal for it to count as a shot
    pub min_change_frames: usize,
    /// Treatment of frames after the last known ball position
    pub trailing_gap_policy: TrailingGapPolicy,
    /// Frame rate used to add timestamps to the output
    pub fps: Option<f64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            read_from_cache: true,
            min_change_frames: ShotDetectorConfig::default().min_change_frames,
            trailing_gap_policy: TrailingGapPolicy::default(),
            fps: None,
        }
    }
}

impl RunnerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            cache_dir: lookup("RALLY_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            read_from_cache: lookup("RALLY_READ_FROM_CACHE")
                .and_then(|s| parse_flag(&s))
                .unwrap_or(defaults.read_from_cache),
            min_change_frames: lookup("RALLY_MIN_CHANGE_FRAMES")
                .and_then(|s| s.parse().ok())
                .filter(|frames| valid_min_change_frames(*frames))
                .unwrap_or(defaults.min_change_frames),
            trailing_gap_policy: lookup("RALLY_TRAILING_GAP_POLICY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.trailing_gap_policy),
            fps: lookup("RALLY_FPS")
                .and_then(|s| s.parse().ok())
                .filter(|fps: &f64| fps.is_finite() && *fps > 0.0),
        }
    }

    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig::new()
            .with_read_from_cache(self.read_from_cache)
            .with_trailing_gap_policy(self.trailing_gap_policy)
            .with_shot_config(
                ShotDetectorConfig::default().with_min_change_frames(self.min_change_frames),
            )
    }
}

/// Positive and small enough for the confirmation window to be computed exactly.
fn valid_min_change_frames(frames: usize) -> bool {
    frames > 0 && frames.checked_mul(6).is_some()
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
