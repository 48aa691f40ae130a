//! One-shot analysis of a single video's detections.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use rally_models::{BallDetectionLog, Detection};
use rally_storage::{DetectionCache, LocalDetectionCache};
use rally_tracking::{
    analyze_detections, DetectionSource, ScriptedBallDetector, ShotAnalysisPipeline, ShotReport,
};
use serde_json::{json, Value};
use tracing::info;

use crate::config::RunnerConfig;

/// What to analyze.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Detection cache key for the video
    pub cache_key: String,
    /// Uncompressed detection log exported by the detector, replayed on a cache miss
    pub export: Option<PathBuf>,
}

impl RunRequest {
    /// Parse `<cache-key> [detections.json]` from command line arguments.
    pub fn from_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let Some(cache_key) = args.next() else {
            bail!("usage: rally-shots <cache-key> [detections.json]");
        };
        Ok(Self {
            cache_key,
            export: args.next().map(PathBuf::from),
        })
    }
}

/// Read an uncompressed detection log from disk.
pub async fn read_export(path: &Path) -> anyhow::Result<Vec<Detection>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let log: BallDetectionLog = serde_json::from_str(&text)
        .with_context(|| format!("Invalid detection log {}", path.display()))?;

    if !log.is_current_version() {
        bail!(
            "Detection log {} has version {}, expected {}",
            path.display(),
            log.version,
            rally_models::DETECTION_LOG_VERSION
        );
    }
    log.to_detections().with_context(|| {
        format!(
            "Detection log {} is not dense or has invalid boxes",
            path.display()
        )
    })
}

/// Produce the shot report for a request.
pub async fn run(config: &RunnerConfig, request: &RunRequest) -> anyhow::Result<ShotReport> {
    let cache = Arc::new(LocalDetectionCache::new(&config.cache_dir));
    let analysis = config.analysis_config();

    match &request.export {
        Some(path) => {
            let detections = read_export(path).await?;
            let frames: Vec<usize> = (0..detections.len()).collect();
            let pipeline =
                ShotAnalysisPipeline::new(ScriptedBallDetector::from_detections(&detections))
                    .with_cache(cache)
                    .with_config(analysis);

            Ok(pipeline.run(&frames, Some(&request.cache_key)).await?)
        }
        None => {
            let detections = cache
                .load(&request.cache_key)
                .await?
                .with_context(|| format!("No cached detections for {}", request.cache_key))?;
            info!(key = %request.cache_key, frames = detections.len(), "Loaded cached detections");

            let mut report = analyze_detections(&detections, &analysis)?;
            report.source = DetectionSource::Cache;
            Ok(report)
        }
    }
}

/// JSON output, with shot timestamps when a frame rate is known.
pub fn render(report: &ShotReport, fps: Option<f64>) -> anyhow::Result<Value> {
    let mut value = serde_json::to_value(report).context("Failed to serialize report")?;
    if let Some(fps) = fps {
        let times: Vec<f64> = report
            .shots
            .iter()
            .filter_map(|shot| shot.timestamp(fps))
            .collect();
        value["fps"] = json!(fps);
        value["shot_times"] = json!(times);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rally_models::BoundingBox;

    fn v_detections() -> Vec<Detection> {
        (0..=100)
            .map(|i| {
                let y = (100.0 - 2.0 * i as f64).abs() + 10.0;
                Detection::Present(BoundingBox::new(20.0, y - 2.0, 24.0, y + 2.0))
            })
            .collect()
    }

    fn config_for(dir: &Path) -> RunnerConfig {
        RunnerConfig {
            cache_dir: dir.join("cache"),
            ..RunnerConfig::default()
        }
    }

    #[test]
    fn test_request_from_args() {
        let request =
            RunRequest::from_args(["rally_1".to_string(), "out.json".to_string()].into_iter())
                .unwrap();
        assert_eq!(request.cache_key, "rally_1");
        assert_eq!(request.export, Some(PathBuf::from("out.json")));

        assert!(RunRequest::from_args(std::iter::empty()).is_err());
    }

    #[tokio::test]
    async fn test_export_then_cache() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let export = dir.path().join("detections.json");
        let log = BallDetectionLog::from_detections(&v_detections());
        std::fs::write(&export, serde_json::to_string(&log).unwrap()).unwrap();

        let request = RunRequest {
            cache_key: "rally_1".to_string(),
            export: Some(export),
        };
        let first = run(&config, &request).await.unwrap();
        assert_eq!(first.source, DetectionSource::Detector);
        assert_eq!(first.shots.len(), 1);

        // Without the export, the report comes straight from the cache
        let cached = RunRequest {
            cache_key: "rally_1".to_string(),
            export: None,
        };
        let second = run(&config, &cached).await.unwrap();
        assert_eq!(second.source, DetectionSource::Cache);
        assert_eq!(second.shots, first.shots);
    }

    #[tokio::test]
    async fn test_missing_cache_entry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let request = RunRequest {
            cache_key: "unknown".to_string(),
            export: None,
        };
        let error = run(&config_for(dir.path()), &request).await.unwrap_err();
        assert!(error.to_string().contains("No cached detections"));
    }

    #[tokio::test]
    async fn test_outdated_export_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let export = dir.path().join("old.json");
        let mut log = BallDetectionLog::from_detections(&v_detections());
        log.version = 0;
        std::fs::write(&export, serde_json::to_string(&log).unwrap()).unwrap();

        assert!(read_export(&export).await.is_err());
    }

    #[test]
    fn test_render_adds_timestamps() {
        let report = analyze_detections(&v_detections(), &Default::default()).unwrap();
        let value = render(&report, Some(25.0)).unwrap();

        let frame = report.shots[0].frame as f64;
        assert_eq!(value["shot_times"][0], json!(frame / 25.0));
        assert!(render(&report, None).unwrap().get("shot_times").is_none());
    }

    #[tokio::test]
    async fn test_export_with_inverted_box_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let export = dir.path().join("bad.json");
        let mut log = BallDetectionLog::from_detections(&v_detections());
        log.frames[4].bbox = Some(BoundingBox::new(24.0, 30.0, 20.0, 26.0));
        std::fs::write(&export, serde_json::to_string(&log).unwrap()).unwrap();

        let error = read_export(&export).await.unwrap_err();
        assert!(error.to_string().contains("invalid boxes"), "{error}");
    }
}
