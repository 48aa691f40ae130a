//! Shot analysis pipeline.
//!
//! Orchestrates one video's worth of frames:
//!
//! 1. Try the detection cache (when a key is given and reading is enabled)
//! 2. Otherwise run the injected [`BallDetector`] on every frame and store the result
//! 3. Build the trajectory, smooth the midpoints, confirm shot events
//!
//! Cache failures never abort a run. They are logged, recorded on the report
//! and the pipeline falls back to the detector.

use std::sync::Arc;

use rally_models::{Detection, FrameIndex, ShotEvent};
use rally_storage::DetectionCache;
use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::AnalysisConfig;
use crate::detector::BallDetector;
use crate::error::{AnalysisError, AnalysisResult};
use crate::shot_detector::ShotDetector;
use crate::trajectory::{build_trajectory, TrailingGap};

/// Where the detections behind a report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    /// Loaded from the detection cache.
    Cache,
    /// Computed by the ball detector during this run.
    Detector,
    /// Handed to [`analyze_detections`] directly.
    Provided,
}

/// Outcome of analyzing one video.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotReport {
    /// Frames in the input detection sequence
    pub frame_count: usize,
    /// Frames that went into the midpoint series
    pub resolved_frames: usize,
    /// Frames after the last known ball position, if any
    pub trailing_gap: Option<TrailingGap>,
    /// Confirmed shot events in frame order
    pub shots: Vec<ShotEvent>,
    pub source: DetectionSource,
    /// Recoverable cache failure hit during the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_error: Option<String>,
}

impl ShotReport {
    /// Frame indices of the confirmed shots.
    pub fn shot_frames(&self) -> Vec<FrameIndex> {
        self.shots.iter().map(|shot| shot.frame).collect()
    }

    pub fn to_json(&self) -> AnalysisResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AnalysisError::internal(format!("Failed to serialize report: {}", e)))
    }
}

/// Run trajectory building and shot detection over detections already in memory.
///
/// # Errors
/// - `DataError::InsufficientData` when no frame has a ball
/// - `DataError::Validation` for a malformed box
/// - `DataError::UnresolvedTrailingGap` under [`TrailingGapPolicy::Fail`](crate::config::TrailingGapPolicy::Fail)
pub fn analyze_detections(
    detections: &[Detection],
    config: &AnalysisConfig,
) -> AnalysisResult<ShotReport> {
    let trajectory = build_trajectory(detections)?;
    let boxes = trajectory.resolve(config.trailing_gap_policy)?;

    if let Some(gap) = trajectory.trailing_gap() {
        warn!(
            first_frame = gap.first_frame,
            frames = gap.frame_count,
            policy = %config.trailing_gap_policy,
            "Ball position unknown after last detection"
        );
    }

    let midpoints: Vec<f64> = boxes.iter().map(|b| b.mid_y()).collect();
    let shots = ShotDetector::with_config(config.shot.clone()).detect_events(&midpoints);

    Ok(ShotReport {
        frame_count: detections.len(),
        resolved_frames: midpoints.len(),
        trailing_gap: trajectory.trailing_gap(),
        shots,
        source: DetectionSource::Provided,
        cache_error: None,
    })
}

/// Cache-aware shot analysis over an injected ball detector.
pub struct ShotAnalysisPipeline<D: BallDetector> {
    detector: D,
    cache: Option<Arc<dyn DetectionCache>>,
    config: AnalysisConfig,
}

impl<D: BallDetector> ShotAnalysisPipeline<D> {
    /// Pipeline without a cache and with default settings.
    pub fn new(detector: D) -> Self {
        Self {
            detector,
            cache: None,
            config: AnalysisConfig::default(),
        }
    }

    /// Builder: Attach a detection cache.
    pub fn with_cache(mut self, cache: Arc<dyn DetectionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Builder: Set analysis config.
    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Analyze a video's frames.
    ///
    /// With a `cache_key`, cached detections are reused when present and
    /// fresh detections are stored after they are computed.
    pub async fn run(
        &self,
        frames: &[D::Frame],
        cache_key: Option<&str>,
    ) -> AnalysisResult<ShotReport> {
        let span = info_span!(
            "shot_analysis",
            cache_key = cache_key.unwrap_or("-"),
            frames = frames.len(),
            detector = self.detector.name(),
        );
        self.run_inner(frames, cache_key).instrument(span).await
    }

    async fn run_inner(
        &self,
        frames: &[D::Frame],
        cache_key: Option<&str>,
    ) -> AnalysisResult<ShotReport> {
        let mut cache_error = None;

        let cached = match (&self.cache, cache_key) {
            (Some(cache), Some(key)) if self.config.read_from_cache => {
                match cache.load(key).await {
                    Ok(Some(detections)) if detections.len() == frames.len() => Some(detections),
                    Ok(Some(detections)) => {
                        warn!(
                            key = %key,
                            cached = detections.len(),
                            frames = frames.len(),
                            "Cached detections do not match frame count, recomputing"
                        );
                        None
                    }
                    Ok(None) => None,
                    Err(e) => {
                        warn!(key = %key, error = %e, "Detection cache load failed, recomputing");
                        cache_error = Some(e.to_string());
                        None
                    }
                }
            }
            _ => None,
        };

        let (detections, source) = match cached {
            Some(detections) => {
                debug!(frames = detections.len(), "Using cached detections");
                (detections, DetectionSource::Cache)
            }
            None => {
                let detections = self.detect_all(frames).await?;
                if let Some(error) = self.store(cache_key, &detections).await {
                    cache_error.get_or_insert(error);
                }
                (detections, DetectionSource::Detector)
            }
        };

        let mut report = analyze_detections(&detections, &self.config)?;
        report.source = source;
        report.cache_error = cache_error;

        info!(
            frames = report.frame_count,
            resolved = report.resolved_frames,
            shots = report.shots.len(),
            source = ?report.source,
            "Shot analysis complete"
        );
        Ok(report)
    }

    async fn detect_all(&self, frames: &[D::Frame]) -> AnalysisResult<Vec<Detection>> {
        let mut detections = Vec::with_capacity(frames.len());
        for frame in frames {
            detections.push(self.detector.detect_frame(frame).await?);
        }

        let present = detections.iter().filter(|d| d.is_present()).count();
        info!(
            detector = self.detector.name(),
            frames = detections.len(),
            present,
            "Ball detection complete"
        );
        Ok(detections)
    }

    /// Store fresh detections, returning the failure message if any.
    async fn store(&self, cache_key: Option<&str>, detections: &[Detection]) -> Option<String> {
        let (Some(cache), Some(key)) = (&self.cache, cache_key) else {
            return None;
        };

        match cache.store(key, detections).await {
            Ok(()) => {
                debug!(key = %key, cache = cache.name(), "Stored detections");
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Detection cache store failed");
                Some(e.to_string())
            }
        }
    }
}
