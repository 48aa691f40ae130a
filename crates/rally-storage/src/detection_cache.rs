//! Detection cache.
//!
//! Stores and retrieves per-frame ball detections as gzip-compressed JSON
//! files under a local cache root. This lets a pipeline rerun skip the
//! expensive detector pass for a video it has already seen.
//!
//! The cache is a plain read-then-write round trip. It is not safe for
//! concurrent writers to the same key; the last rename wins.

use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use metrics::counter;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};
use rally_models::{BallDetectionLog, Detection, DETECTION_LOG_VERSION};

/// Load/store contract for previously computed detection sequences.
///
/// `load` returns `Ok(None)` for every kind of cache miss (absent, corrupt,
/// outdated, invalid boxes). `Err` is reserved for I/O failures the caller may want to log
/// before recomputing.
#[async_trait]
pub trait DetectionCache: Send + Sync {
    /// Load the detection sequence stored under `key`.
    async fn load(&self, key: &str) -> StorageResult<Option<Vec<Detection>>>;

    /// Store a detection sequence under `key`, replacing any previous entry.
    async fn store(&self, key: &str, detections: &[Detection]) -> StorageResult<()>;

    /// Cache name for logging.
    fn name(&self) -> &'static str;
}

/// Compress a detection log to gzip JSON bytes.
pub fn compress_detection_log(log: &BallDetectionLog) -> StorageResult<Vec<u8>> {
    let json = serde_json::to_string(log).map_err(|e| {
        StorageError::serialization(format!("Failed to serialize detection log: {}", e))
    })?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(json.as_bytes()).map_err(|e| {
        StorageError::serialization(format!("Failed to gzip detection log: {}", e))
    })?;

    encoder.finish().map_err(|e| {
        StorageError::serialization(format!("Failed to finish gzip encoding: {}", e))
    })
}

/// Decompress gzip JSON bytes to a detection log.
///
/// Returns `None` if decompression or deserialization fails, or if the
/// cached version is outdated (treated as cache miss).
pub fn decompress_detection_log(data: &[u8]) -> Option<BallDetectionLog> {
    let mut decoder = GzDecoder::new(data);
    let mut json = String::new();

    if let Err(e) = decoder.read_to_string(&mut json) {
        warn!(error = %e, "Failed to decompress detection cache");
        return None;
    }

    match serde_json::from_str::<BallDetectionLog>(&json) {
        Ok(log) if log.is_current_version() => Some(log),
        Ok(log) => {
            debug!(
                cached_version = log.version,
                current_version = DETECTION_LOG_VERSION,
                "Detection cache version mismatch, treating as miss"
            );
            None
        }
        Err(e) => {
            warn!(error = %e, "Failed to deserialize detection cache");
            None
        }
    }
}

/// Detection cache backed by files under a local directory.
///
/// Keys are relative paths (e.g. `"match_01/ball.json.gz"`) resolved against
/// the cache root.
#[derive(Debug, Clone)]
pub struct LocalDetectionCache {
    root: PathBuf,
}

impl LocalDetectionCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a file path, rejecting keys that escape the root.
    pub fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        if key.trim().is_empty() {
            return Err(StorageError::invalid_key(key));
        }

        let relative = Path::new(key);
        let all_normal = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !all_normal {
            return Err(StorageError::invalid_key(key));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl DetectionCache for LocalDetectionCache {
    async fn load(&self, key: &str) -> StorageResult<Option<Vec<Detection>>> {
        let path = self.path_for(key)?;

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                counter!("rally_detection_cache_total", "outcome" => "miss").increment(1);
                debug!(key = %key, "Detection cache miss (not found)");
                return Ok(None);
            }
            Err(e) => {
                counter!("rally_detection_cache_total", "outcome" => "error").increment(1);
                return Err(StorageError::from(e));
            }
        };

        let detections = decompress_detection_log(&data).and_then(|log| log.to_detections());
        match detections {
            Some(detections) => {
                counter!("rally_detection_cache_total", "outcome" => "hit").increment(1);
                debug!(key = %key, frames = detections.len(), "Detection cache hit");
                Ok(Some(detections))
            }
            None => {
                counter!("rally_detection_cache_total", "outcome" => "miss").increment(1);
                debug!(key = %key, "Detection cache miss (corrupt, outdated or invalid)");
                Ok(None)
            }
        }
    }

    async fn store(&self, key: &str, detections: &[Detection]) -> StorageResult<()> {
        let path = self.path_for(key)?;
        let log = BallDetectionLog::from_detections(detections);
        let compressed = compress_detection_log(&log)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write next to the destination so the rename stays on one filesystem
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, &compressed).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StorageError::from(e));
        }

        debug!(
            key = %key,
            frames = log.frame_count,
            compressed_size = compressed.len(),
            "Stored detections to cache"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rally_models::BoundingBox;

    fn create_test_detections() -> Vec<Detection> {
        (0..20)
            .map(|i| {
                if i % 4 == 3 {
                    Detection::Absent
                } else {
                    let y = i as f64 * 3.0;
                    Detection::Present(BoundingBox::new(100.0, y, 108.0, y + 8.0))
                }
            })
            .collect()
    }

    #[test]
    fn test_compress_decompress_roundtrip() {
        let log = BallDetectionLog::from_detections(&create_test_detections());

        let compressed = compress_detection_log(&log).expect("compress should succeed");
        assert!(!compressed.is_empty());

        let decompressed =
            decompress_detection_log(&compressed).expect("decompress should succeed");
        assert_eq!(log, decompressed);
    }

    #[test]
    fn test_decompress_corrupt_data() {
        let result = decompress_detection_log(b"not gzip data at all");
        assert!(result.is_none(), "Corrupt data should return None");
    }

    #[test]
    fn test_decompress_invalid_json() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"{ invalid json }").unwrap();
        let compressed = encoder.finish().unwrap();

        assert!(decompress_detection_log(&compressed).is_none());
    }

    #[test]
    fn test_decompress_outdated_version() {
        let mut log = BallDetectionLog::from_detections(&create_test_detections());
        log.version = 0;

        let compressed = compress_detection_log(&log).expect("compress should succeed");
        assert!(
            decompress_detection_log(&compressed).is_none(),
            "Outdated version should return None (cache miss)"
        );
    }

    #[test]
    fn test_path_for_rejects_escaping_keys() {
        let cache = LocalDetectionCache::new("/tmp/rally-cache");
        assert!(cache.path_for("match/ball.json.gz").is_ok());
        assert!(matches!(
            cache.path_for("../outside.json.gz"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(cache.path_for("/etc/passwd").is_err());
        assert!(cache.path_for("").is_err());
    }

    #[tokio::test]
    async fn test_store_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalDetectionCache::new(dir.path());
        let detections = create_test_detections();

        cache
            .store("match_01/ball.json.gz", &detections)
            .await
            .expect("store should succeed");

        let loaded = cache.load("match_01/ball.json.gz").await.unwrap();
        assert_eq!(loaded, Some(detections));
        assert!(!dir.path().join("match_01/ball.json.gz.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_missing_key_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalDetectionCache::new(dir.path());

        let loaded = cache.load("never_written.json.gz").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_load_corrupt_file_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json.gz"), b"garbage").unwrap();
        let cache = LocalDetectionCache::new(dir.path());

        let loaded = cache.load("broken.json.gz").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_load_inverted_box_is_miss() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = BallDetectionLog::from_detections(&create_test_detections());
        log.frames[0].bbox = Some(BoundingBox::new(50.0, 50.0, 10.0, 10.0));
        let bytes = compress_detection_log(&log).unwrap();
        std::fs::write(dir.path().join("poisoned.json.gz"), bytes).unwrap();
        let cache = LocalDetectionCache::new(dir.path());

        let loaded = cache.load("poisoned.json.gz").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_load_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("not_a_file")).unwrap();
        let cache = LocalDetectionCache::new(dir.path());

        let err = cache.load("not_a_file").await.unwrap_err();
        assert!(err.is_io());
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let cache = LocalDetectionCache::new(dir.path());

        cache.store("ball.json.gz", &create_test_detections()).await.unwrap();
        cache.store("ball.json.gz", &[Detection::Absent]).await.unwrap();

        let loaded = cache.load("ball.json.gz").await.unwrap();
        assert_eq!(loaded, Some(vec![Detection::Absent]));
    }
}
