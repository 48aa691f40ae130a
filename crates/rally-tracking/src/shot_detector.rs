//! Shot event detection from the ball's vertical midpoint series.
//!
//! A racket or ground contact shows up as a reversal of the ball's vertical
//! direction. Detector jitter produces many short-lived reversals too, so
//! each candidate must be confirmed by the frames that follow it.
//!
//! # Algorithm
//!
//! 1. Smooth the midpoint series with a 5-sample trailing mean
//! 2. Take first differences `delta[i] = s[i] - s[i - 1]`
//! 3. A candidate at `i` is a sign change between `delta[i]` and `delta[i + 1]`
//! 4. Count frames in `i + 1 ..= i + W` whose delta moves in the new direction
//! 5. Confirm when the count reaches `min_change_frames` (exceeds `min_change_frames - 1`)
//!
//! Candidates are only evaluated for `1 <= i < N - 1 - W`, so the window never
//! runs past the end. Each candidate is judged on its own window; there is no
//! state carried between candidates.

use metrics::counter;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::ShotDetectorConfig;
use crate::smoothing::{first_differences, smooth};
use rally_models::{FrameIndex, ReversalKind, ShotEvent};

/// Decision for one reversal candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// Enough frames in the window moved in the new direction.
    Confirmed { event: ShotEvent, consistent: usize },
    /// The reversal did not persist.
    Rejected {
        frame: FrameIndex,
        kind: ReversalKind,
        consistent: usize,
    },
}

impl CandidateOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, CandidateOutcome::Confirmed { .. })
    }

    /// Frames in the window that agreed with the reversal.
    pub fn consistent(&self) -> usize {
        match self {
            CandidateOutcome::Confirmed { consistent, .. }
            | CandidateOutcome::Rejected { consistent, .. } => *consistent,
        }
    }
}

/// Direction reversal between `deltas[i]` and `deltas[i + 1]`, if any.
///
/// Zero deltas never form a reversal.
pub fn reversal_at(deltas: &[f64], i: usize) -> Option<ReversalKind> {
    let (current, next) = (*deltas.get(i)?, *deltas.get(i + 1)?);
    if current > 0.0 && next < 0.0 {
        Some(ReversalKind::Peak)
    } else if current < 0.0 && next > 0.0 {
        Some(ReversalKind::Trough)
    } else {
        None
    }
}

/// Shot event detector over a midpoint series.
#[derive(Debug, Clone, Default)]
pub struct ShotDetector {
    config: ShotDetectorConfig,
}

impl ShotDetector {
    /// Create a new shot detector with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ShotDetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ShotDetectorConfig {
        &self.config
    }

    /// Detect shot frames in a raw (unsmoothed) midpoint series.
    ///
    /// Returns strictly increasing frame indices.
    pub fn detect(&self, midpoints: &[f64]) -> Vec<FrameIndex> {
        self.detect_events(midpoints)
            .into_iter()
            .map(|event| event.frame)
            .collect()
    }

    /// Detect shot events, keeping the reversal direction of each.
    pub fn detect_events(&self, midpoints: &[f64]) -> Vec<ShotEvent> {
        let window = self.config.confirmation_window();
        let end = window
            .checked_add(1)
            .map_or(0, |span| midpoints.len().saturating_sub(span));

        if end <= 1 {
            debug!(
                frames = midpoints.len(),
                window, "Series too short for shot confirmation"
            );
            return Vec::new();
        }

        let deltas = first_differences(&smooth(midpoints));

        let confirmed = |i: usize| match self.evaluate_candidate(&deltas, i)? {
            CandidateOutcome::Confirmed { event, .. } => Some(event),
            CandidateOutcome::Rejected { .. } => None,
        };

        let events: Vec<ShotEvent> = if midpoints.len() >= self.config.parallel_threshold {
            (1..end).into_par_iter().filter_map(confirmed).collect()
        } else {
            (1..end).filter_map(confirmed).collect()
        };

        info!(
            "Detected {} shots from {} frames (window={})",
            events.len(),
            midpoints.len(),
            window
        );
        events
    }

    /// Judge the candidate at frame `i` against its confirmation window.
    ///
    /// `deltas` are first differences of the smoothed series. Returns `None`
    /// when `i` is not a reversal or its window does not fit in the series.
    pub fn evaluate_candidate(&self, deltas: &[f64], i: usize) -> Option<CandidateOutcome> {
        let window = self.config.confirmation_window();
        let fits = i
            .checked_add(window)
            .is_some_and(|last| last < deltas.len());
        if i == 0 || !fits {
            return None;
        }

        let kind = reversal_at(deltas, i)?;
        let sign = kind.outgoing_sign();
        let consistent = deltas[i + 1..=i + window]
            .iter()
            .filter(|delta| **delta * sign > 0.0)
            .count();

        if consistent >= self.config.required_consistent_frames() {
            counter!("rally_shot_candidates_total", "outcome" => "confirmed").increment(1);
            debug!(frame = i, kind = %kind, consistent, "Shot candidate confirmed");
            Some(CandidateOutcome::Confirmed {
                event: ShotEvent::new(i, kind),
                consistent,
            })
        } else {
            counter!("rally_shot_candidates_total", "outcome" => "rejected").increment(1);
            debug!(frame = i, kind = %kind, consistent, "Shot candidate rejected");
            Some(CandidateOutcome::Rejected {
                frame: i,
                kind,
                consistent,
            })
        }
    }
}
