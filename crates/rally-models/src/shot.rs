//! Shot events: confirmed reversals of the ball's vertical motion.
//!
//! Image coordinates grow downwards, so a `Peak` in the midpoint series is
//! the ball at its lowest on screen (moving down, then up) and a `Trough`
//! is the ball at its highest on screen.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Zero-based frame index, the unit of time for the whole pipeline.
pub type FrameIndex = usize;

/// Direction of a vertical motion reversal in the midpoint series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReversalKind {
    /// Rising then falling series (local maximum).
    Peak,
    /// Falling then rising series (local minimum).
    Trough,
}

impl ReversalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReversalKind::Peak => "peak",
            ReversalKind::Trough => "trough",
        }
    }

    /// Sign of the first difference expected after the reversal.
    pub fn outgoing_sign(&self) -> f64 {
        match self {
            ReversalKind::Peak => -1.0,
            ReversalKind::Trough => 1.0,
        }
    }
}

impl fmt::Display for ReversalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReversalKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "peak" | "max" => Ok(ReversalKind::Peak),
            "trough" | "min" => Ok(ReversalKind::Trough),
            _ => Err(ModelError::UnknownReversalKind(s.to_string())),
        }
    }
}

/// A confirmed reversal in vertical ball motion, interpreted as a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ShotEvent {
    /// Frame at which the reversal happens
    pub frame: FrameIndex,
    /// Direction of the reversal
    pub kind: ReversalKind,
}

impl ShotEvent {
    pub fn new(frame: FrameIndex, kind: ReversalKind) -> Self {
        Self { frame, kind }
    }

    /// Time of the event in seconds from the first frame.
    ///
    /// `None` unless `fps` is finite and positive.
    pub fn timestamp(&self, fps: f64) -> Option<f64> {
        (fps.is_finite() && fps > 0.0).then(|| self.frame as f64 / fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversal_kind_parse() {
        assert_eq!("peak".parse::<ReversalKind>().unwrap(), ReversalKind::Peak);
        assert_eq!("Trough".parse::<ReversalKind>().unwrap(), ReversalKind::Trough);
        assert_eq!("min".parse::<ReversalKind>().unwrap(), ReversalKind::Trough);
        assert!("sideways".parse::<ReversalKind>().is_err());
    }

    #[test]
    fn test_timestamp() {
        let event = ShotEvent::new(90, ReversalKind::Trough);
        let seconds = event.timestamp(30.0).unwrap();
        assert!((seconds - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_timestamp_rejects_unusable_fps() {
        let event = ShotEvent::new(90, ReversalKind::Trough);
        assert_eq!(event.timestamp(0.0), None);
        assert_eq!(event.timestamp(-25.0), None);
        assert_eq!(event.timestamp(f64::NAN), None);
        assert_eq!(event.timestamp(f64::INFINITY), None);
    }

    #[test]
    fn test_serializes_as_record() {
        let event = ShotEvent::new(12, ReversalKind::Peak);
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"frame":12,"kind":"peak"}"#);
    }
}
