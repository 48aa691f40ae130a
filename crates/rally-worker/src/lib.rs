//! Shot detection runner.
//!
//! Loads one video's ball detections from the detection cache (or replays an
//! exported detection log into it), runs shot analysis and renders the report.

pub mod config;
pub mod runner;

pub use config::RunnerConfig;
pub use runner::{read_export, render, run, RunRequest};
