//! Trajectory reconstruction from sparse per-frame ball detections.
//!
//! # Algorithm
//!
//! 1. Validate every present box (corner ordering, finite coordinates)
//! 2. Back-fill frames before the first detection with the first known box
//! 3. Linearly interpolate each coordinate across interior gaps
//! 4. Report frames after the last detection as an unresolved trailing gap
//!
//! Trailing frames are never guessed. [`Trajectory::resolve`] applies a
//! [`TrailingGapPolicy`] when the caller needs a dense box sequence.

use rally_models::{BoundingBox, Detection, FrameIndex};
use serde::Serialize;
use tracing::debug;

use crate::config::TrailingGapPolicy;
use crate::error::{DataError, DataResult};

/// Frames after the last known detection that have no position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrailingGap {
    /// First unresolved frame
    pub first_frame: FrameIndex,
    /// Number of unresolved frames, running to the end of the video
    pub frame_count: usize,
}

impl TrailingGap {
    /// One past the last unresolved frame.
    pub fn end_frame(&self) -> FrameIndex {
        self.first_frame + self.frame_count
    }
}

/// Gap-filled ball positions for a whole video.
///
/// Frames `0..resolved_len()` have a box. Any remaining frames up to `len()`
/// form the trailing gap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    boxes: Vec<BoundingBox>,
    trailing_gap: Option<TrailingGap>,
}

impl Trajectory {
    /// Total number of frames, resolved or not.
    pub fn len(&self) -> usize {
        self.boxes.len() + self.trailing_gap.map_or(0, |gap| gap.frame_count)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of frames with a known or filled position.
    pub fn resolved_len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.trailing_gap.is_none()
    }

    /// Boxes for the resolved prefix.
    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    /// Position at `frame`, `None` inside the trailing gap or past the end.
    pub fn frame(&self, frame: FrameIndex) -> Option<&BoundingBox> {
        self.boxes.get(frame)
    }

    pub fn trailing_gap(&self) -> Option<TrailingGap> {
        self.trailing_gap
    }

    /// Vertical midpoint of every resolved frame.
    pub fn midpoints(&self) -> Vec<f64> {
        self.boxes.iter().map(BoundingBox::mid_y).collect()
    }

    /// Express the trajectory as detections again.
    ///
    /// Resolved frames become `Present`, the trailing gap becomes `Absent`.
    /// Building from this output reproduces the same trajectory.
    pub fn to_detections(&self) -> Vec<Detection> {
        let trailing = self.trailing_gap.map_or(0, |gap| gap.frame_count);
        self.boxes
            .iter()
            .copied()
            .map(Detection::Present)
            .chain(std::iter::repeat(Detection::Absent).take(trailing))
            .collect()
    }

    /// Produce a dense box sequence, deciding what to do with the trailing gap.
    pub fn resolve(&self, policy: TrailingGapPolicy) -> DataResult<Vec<BoundingBox>> {
        let Some(gap) = self.trailing_gap else {
            return Ok(self.boxes.clone());
        };

        match policy {
            TrailingGapPolicy::Fail => Err(DataError::UnresolvedTrailingGap {
                first_frame: gap.first_frame,
                frame_count: gap.frame_count,
            }),
            TrailingGapPolicy::Truncate => Ok(self.boxes.clone()),
            TrailingGapPolicy::HoldLastKnown => {
                let mut boxes = self.boxes.clone();
                // A trailing gap always follows at least one known box
                if let Some(last) = boxes.last().copied() {
                    boxes.extend(std::iter::repeat(last).take(gap.frame_count));
                }
                Ok(boxes)
            }
        }
    }
}

/// Convert raw per-frame detections into a gap-filled trajectory.
///
/// # Errors
/// - `DataError::Validation` for a present box violating its invariants
/// - `DataError::InsufficientData` when no frame has a detection
pub fn build_trajectory(detections: &[Detection]) -> DataResult<Trajectory> {
    let mut known: Vec<(FrameIndex, BoundingBox)> = Vec::new();
    for (frame, detection) in detections.iter().enumerate() {
        if let Detection::Present(bbox) = detection {
            bbox.validate()
                .map_err(|source| DataError::Validation { frame, source })?;
            known.push((frame, *bbox));
        }
    }

    let (Some(&(first_frame, first_box)), Some(&(last_frame, last_box))) =
        (known.first(), known.last())
    else {
        return Err(DataError::InsufficientData {
            frame_count: detections.len(),
        });
    };

    let mut boxes = Vec::with_capacity(last_frame + 1);

    // Leading gap: back-propagate the first known box
    boxes.extend(std::iter::repeat(first_box).take(first_frame));

    // Interior gaps: interpolate against frame index
    for pair in known.windows(2) {
        let (a, va) = pair[0];
        let (b, vb) = pair[1];
        boxes.push(va);
        let span = (b - a) as f64;
        for i in (a + 1)..b {
            boxes.push(va.lerp(&vb, (i - a) as f64 / span));
        }
    }
    boxes.push(last_box);

    let trailing_gap = (last_frame + 1 < detections.len()).then(|| TrailingGap {
        first_frame: last_frame + 1,
        frame_count: detections.len() - last_frame - 1,
    });

    debug!(
        frames = detections.len(),
        known = known.len(),
        leading = first_frame,
        trailing = trailing_gap.map_or(0, |gap| gap.frame_count),
        "Built ball trajectory"
    );

    Ok(Trajectory {
        boxes,
        trailing_gap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rally_models::ModelError;

    const EPS: f64 = 1e-9;

    fn present(x1: f64, y1: f64, x2: f64, y2: f64) -> Detection {
        Detection::Present(BoundingBox::new(x1, y1, x2, y2))
    }

    fn assert_box_close(actual: &BoundingBox, expected: &BoundingBox) {
        assert!((actual.x1 - expected.x1).abs() < EPS, "{actual:?} != {expected:?}");
        assert!((actual.y1 - expected.y1).abs() < EPS, "{actual:?} != {expected:?}");
        assert!((actual.x2 - expected.x2).abs() < EPS, "{actual:?} != {expected:?}");
        assert!((actual.y2 - expected.y2).abs() < EPS, "{actual:?} != {expected:?}");
    }

    #[test]
    fn test_present_frames_are_copied() {
        let detections = vec![present(1.0, 2.0, 3.0, 4.0), present(5.0, 6.0, 7.0, 8.0)];
        let trajectory = build_trajectory(&detections).unwrap();

        assert_eq!(trajectory.boxes(), &[
            BoundingBox::new(1.0, 2.0, 3.0, 4.0),
            BoundingBox::new(5.0, 6.0, 7.0, 8.0),
        ]);
        assert!(trajectory.is_fully_resolved());
    }

    #[test]
    fn test_interior_gap_is_interpolated() {
        // Known at frames 2 and 6, gap at 3..=5
        let va = BoundingBox::new(0.0, 10.0, 4.0, 20.0);
        let vb = BoundingBox::new(8.0, 30.0, 20.0, 60.0);
        let mut detections = vec![Detection::Absent; 7];
        detections[2] = Detection::Present(va);
        detections[6] = Detection::Present(vb);

        let trajectory = build_trajectory(&detections).unwrap();
        assert_eq!(trajectory.len(), 7);

        let (a, b) = (2.0, 6.0);
        for i in 3..6 {
            let t = (i as f64 - a) / (b - a);
            let expected = BoundingBox::new(
                va.x1 + (vb.x1 - va.x1) * t,
                va.y1 + (vb.y1 - va.y1) * t,
                va.x2 + (vb.x2 - va.x2) * t,
                va.y2 + (vb.y2 - va.y2) * t,
            );
            assert_box_close(trajectory.frame(i).unwrap(), &expected);
        }
        assert_box_close(trajectory.frame(4).unwrap(), &BoundingBox::new(4.0, 20.0, 12.0, 40.0));
    }

    #[test]
    fn test_leading_gap_is_back_filled() {
        let v = BoundingBox::new(3.0, 4.0, 5.0, 6.0);
        let detections = vec![
            Detection::Absent,
            Detection::Absent,
            Detection::Absent,
            Detection::Present(v),
            present(5.0, 6.0, 7.0, 8.0),
        ];

        let trajectory = build_trajectory(&detections).unwrap();
        for frame in 0..3 {
            assert_eq!(trajectory.frame(frame), Some(&v));
        }
        assert_eq!(trajectory.len(), 5);
    }

    #[test]
    fn test_trailing_gap_is_reported_not_filled() {
        let detections = vec![
            present(0.0, 0.0, 1.0, 1.0),
            present(1.0, 1.0, 2.0, 2.0),
            Detection::Absent,
            Detection::Absent,
        ];

        let trajectory = build_trajectory(&detections).unwrap();
        assert_eq!(trajectory.len(), 4);
        assert_eq!(trajectory.resolved_len(), 2);
        assert_eq!(
            trajectory.trailing_gap(),
            Some(TrailingGap {
                first_frame: 2,
                frame_count: 2
            })
        );
        assert_eq!(trajectory.frame(2), None);
        assert_eq!(trajectory.midpoints().len(), 2);
    }

    #[test]
    fn test_resolve_policies() {
        let last = BoundingBox::new(1.0, 1.0, 2.0, 2.0);
        let detections = vec![
            present(0.0, 0.0, 1.0, 1.0),
            Detection::Present(last),
            Detection::Absent,
            Detection::Absent,
            Detection::Absent,
        ];
        let trajectory = build_trajectory(&detections).unwrap();

        assert_eq!(
            trajectory.resolve(TrailingGapPolicy::Fail),
            Err(DataError::UnresolvedTrailingGap {
                first_frame: 2,
                frame_count: 3
            })
        );
        assert_eq!(trajectory.resolve(TrailingGapPolicy::Truncate).unwrap().len(), 2);

        let held = trajectory.resolve(TrailingGapPolicy::HoldLastKnown).unwrap();
        assert_eq!(held.len(), 5);
        assert!(held[2..].iter().all(|b| *b == last));
    }

    #[test]
    fn test_fully_resolved_ignores_policy() {
        let detections = vec![present(0.0, 0.0, 1.0, 1.0)];
        let trajectory = build_trajectory(&detections).unwrap();
        assert_eq!(trajectory.resolve(TrailingGapPolicy::Fail).unwrap().len(), 1);
    }

    #[test]
    fn test_all_absent_is_insufficient_data() {
        let detections = vec![Detection::Absent; 12];
        assert_eq!(
            build_trajectory(&detections),
            Err(DataError::InsufficientData { frame_count: 12 })
        );
    }

    #[test]
    fn test_empty_input_is_insufficient_data() {
        assert_eq!(
            build_trajectory(&[]),
            Err(DataError::InsufficientData { frame_count: 0 })
        );
    }

    #[test]
    fn test_malformed_box_is_rejected() {
        let detections = vec![
            present(0.0, 0.0, 1.0, 1.0),
            Detection::Absent,
            present(5.0, 9.0, 6.0, 3.0),
        ];

        match build_trajectory(&detections) {
            Err(DataError::Validation { frame, source }) => {
                assert_eq!(frame, 2);
                assert!(matches!(source, ModelError::InvalidBox { .. }));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_rebuilding_is_idempotent() {
        let detections = vec![
            Detection::Absent,
            present(0.0, 10.0, 2.0, 12.0),
            Detection::Absent,
            Detection::Absent,
            present(6.0, 40.0, 8.0, 42.0),
            Detection::Absent,
        ];

        let first = build_trajectory(&detections).unwrap();
        let second = build_trajectory(&first.to_detections()).unwrap();
        assert_eq!(first, second);

        let dense = build_trajectory(&detections[..5]).unwrap();
        let again = build_trajectory(&dense.to_detections()).unwrap();
        assert_eq!(dense, again);
    }

    #[test]
    fn test_single_detection() {
        let only = BoundingBox::new(2.0, 2.0, 4.0, 4.0);
        let detections = vec![Detection::Absent, Detection::Present(only), Detection::Absent];
        let trajectory = build_trajectory(&detections).unwrap();

        assert_eq!(trajectory.boxes(), &[only, only]);
        assert_eq!(trajectory.trailing_gap().map(|g| g.end_frame()), Some(3));
    }
}
