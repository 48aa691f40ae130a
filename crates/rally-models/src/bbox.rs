use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Ball bounding box in pixel coordinates, stored as opposite corners.
///
/// A valid box satisfies `x1 <= x2` and `y1 <= y2` with finite coordinates.
/// Construction does not validate; call [`BoundingBox::validate`] at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    /// Left edge x-coordinate
    pub x1: f64,
    /// Top edge y-coordinate
    pub y1: f64,
    /// Right edge x-coordinate
    pub x2: f64,
    /// Bottom edge y-coordinate
    pub y2: f64,
}

impl BoundingBox {
    /// Create a new bounding box from its corners.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Check the corner ordering and finiteness invariants.
    pub fn validate(&self) -> ModelResult<()> {
        let coords = [self.x1, self.y1, self.x2, self.y2];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::NonFiniteCoordinate);
        }
        if self.x1 > self.x2 || self.y1 > self.y2 {
            return Err(ModelError::InvalidBox {
                x1: self.x1,
                y1: self.y1,
                x2: self.x2,
                y2: self.y2,
            });
        }
        Ok(())
    }

    /// Whether the box satisfies its invariants.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Vertical midpoint `(y1 + y2) / 2`.
    #[inline]
    pub fn mid_y(&self) -> f64 {
        (self.y1 + self.y2) / 2.0
    }

    /// Horizontal midpoint `(x1 + x2) / 2`.
    #[inline]
    pub fn mid_x(&self) -> f64 {
        (self.x1 + self.x2) / 2.0
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Linear interpolation between two boxes, applied per coordinate.
    ///
    /// `t = 0.0` yields `self`, `t = 1.0` yields `other`.
    pub fn lerp(&self, other: &BoundingBox, t: f64) -> BoundingBox {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        BoundingBox {
            x1: mix(self.x1, other.x1),
            y1: mix(self.y1, other.y1),
            x2: mix(self.x2, other.x2),
            y2: mix(self.y2, other.y2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoints() {
        let bbox = BoundingBox::new(10.0, 20.0, 14.0, 30.0);
        assert!((bbox.mid_y() - 25.0).abs() < 1e-9);
        assert!((bbox.mid_x() - 12.0).abs() < 1e-9);
        assert!((bbox.width() - 4.0).abs() < 1e-9);
        assert!((bbox.height() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_validate_accepts_degenerate_box() {
        let point = BoundingBox::new(5.0, 5.0, 5.0, 5.0);
        assert!(point.is_valid());
    }

    #[test]
    fn test_validate_rejects_swapped_corners() {
        let bbox = BoundingBox::new(10.0, 20.0, 5.0, 30.0);
        assert!(matches!(bbox.validate(), Err(ModelError::InvalidBox { .. })));

        let bbox = BoundingBox::new(0.0, 20.0, 5.0, 10.0);
        assert!(!bbox.is_valid());
    }

    #[test]
    fn test_validate_rejects_nan() {
        let bbox = BoundingBox::new(0.0, f64::NAN, 5.0, 10.0);
        assert_eq!(bbox.validate(), Err(ModelError::NonFiniteCoordinate));
    }

    #[test]
    fn test_lerp_per_coordinate() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(10.0, 20.0, 30.0, 50.0);
        let mid = a.lerp(&b, 0.5);
        assert_eq!(mid, BoundingBox::new(5.0, 10.0, 20.0, 30.0));
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
    }
}
