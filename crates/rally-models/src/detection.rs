//! Per-frame ball detection.
//!
//! At most one ball is tracked, so a frame either carries a single box or
//! nothing. There is no track-id map.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;

/// Result of locating the ball in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Detection {
    /// The ball was found inside this box.
    Present(BoundingBox),
    /// No ball was found.
    #[default]
    Absent,
}

impl Detection {
    /// Collapse a detector's candidate boxes into one slot.
    ///
    /// Each candidate overwrites the previous one, so the last box reported
    /// for the frame wins. No candidates yields `Absent`.
    pub fn from_candidates<I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = BoundingBox>,
    {
        candidates
            .into_iter()
            .last()
            .map_or(Detection::Absent, Detection::Present)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Detection::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Detection::Absent)
    }

    /// The detected box, if any.
    pub fn bbox(&self) -> Option<&BoundingBox> {
        match self {
            Detection::Present(bbox) => Some(bbox),
            Detection::Absent => None,
        }
    }
}

impl From<Option<BoundingBox>> for Detection {
    fn from(value: Option<BoundingBox>) -> Self {
        value.map_or(Detection::Absent, Detection::Present)
    }
}

impl From<Detection> for Option<BoundingBox> {
    fn from(value: Detection) -> Self {
        match value {
            Detection::Present(bbox) => Some(bbox),
            Detection::Absent => None,
        }
    }
}
