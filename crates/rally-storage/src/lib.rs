//! Detection cache for ball analysis.
//!
//! This crate provides:
//! - The `DetectionCache` contract consumed by the analysis pipeline
//! - A local filesystem implementation storing gzip-compressed JSON
//! - Compression helpers for the versioned detection log

pub mod detection_cache;
pub mod error;

pub use detection_cache::{
    compress_detection_log, decompress_detection_log, DetectionCache, LocalDetectionCache,
};
pub use error::{StorageError, StorageResult};
