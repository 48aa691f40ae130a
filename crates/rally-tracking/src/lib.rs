#![deny(unreachable_patterns)]
//! Ball trajectory reconstruction and shot event detection.
//!
//! This crate provides:
//! - Gap filling of sparse per-frame ball detections into a trajectory
//! - Trailing-mean smoothing of the ball's vertical midpoint
//! - Windowed confirmation of direction reversals as shot events
//! - A cache-aware pipeline over an injected ball detector

pub mod config;
pub mod detector;
pub mod error;
pub mod pipeline;
pub mod shot_detector;
pub mod smoothing;
pub mod trajectory;

pub use config::{AnalysisConfig, ShotDetectorConfig, TrailingGapPolicy};
pub use detector::{BallDetector, ScriptedBallDetector};
pub use error::{AnalysisError, AnalysisResult, DataError, DataResult};
pub use pipeline::{analyze_detections, DetectionSource, ShotAnalysisPipeline, ShotReport};
pub use shot_detector::{reversal_at, CandidateOutcome, ShotDetector};
pub use smoothing::{first_differences, smooth, trailing_mean, SMOOTHING_WINDOW};
pub use trajectory::{build_trajectory, TrailingGap, Trajectory};
