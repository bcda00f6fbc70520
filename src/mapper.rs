//! Coordinate mapping between simulation space and screen space
//!
//! The simulation runs in a fixed abstract box centered on the origin; the
//! host sees positions inside a configured bounding rectangle. The two
//! transforms here are exact algebraic inverses of each other, so positions
//! can round-trip without drift. Padding never affects the scale; it only
//! shrinks the usable drawing area reported to the host.

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutResult};

/// Width and height of the abstract simulation box, per axis
pub const SIM_EXTENT: f64 = 4.0;

/// Lower bound of the abstract simulation box, per axis
pub const SIM_MIN: f64 = -2.0;

/// A point in screen (host) space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point in abstract simulation space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimPoint {
    pub x: f64,
    pub y: f64,
}

impl SimPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Screen-space rectangle the simulation box is mapped onto
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingRect {
    /// Create a bounding rectangle, rejecting non-finite coordinates and
    /// zero or negative area
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> LayoutResult<Self> {
        if !(x1.is_finite() && y1.is_finite() && x2.is_finite() && y2.is_finite()) {
            return Err(LayoutError::NonFiniteBounds { x1, y1, x2, y2 });
        }
        if x2 - x1 <= 0.0 || y2 - y1 <= 0.0 {
            return Err(LayoutError::DegenerateBounds { x1, y1, x2, y2 });
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Center of the rectangle, rounded to whole screen units
    pub fn midpoint_rounded(&self) -> ScreenPoint {
        ScreenPoint::new(
            ((self.x1 + self.x2) / 2.0).round(),
            ((self.y1 + self.y2) / 2.0).round(),
        )
    }
}

/// Insets reserved inside the bounding rectangle for the host's renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Padding {
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Uniform inset on all four sides
    pub fn uniform(inset: f64) -> Self {
        Self::new(inset, inset, inset, inset)
    }

    pub fn validate(&self) -> LayoutResult<()> {
        let ok = |v: f64| v.is_finite() && v >= 0.0;
        if ok(self.top) && ok(self.right) && ok(self.bottom) && ok(self.left) {
            Ok(())
        } else {
            Err(LayoutError::InvalidPadding {
                top: self.top,
                right: self.right,
                bottom: self.bottom,
                left: self.left,
            })
        }
    }
}

impl Default for Padding {
    fn default() -> Self {
        Self::uniform(50.0)
    }
}

/// Bidirectional transform between simulation space and screen space
///
/// The mapping is linear per axis: the fixed simulation box
/// `[SIM_MIN, SIM_MIN + SIM_EXTENT]` spans the bounding rectangle exactly,
/// with the rectangle's top-left as the screen-space origin offset.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper {
    bounds: BoundingRect,
    padding: Padding,
}

impl CoordinateMapper {
    pub fn new(bounds: BoundingRect, padding: Padding) -> Self {
        Self { bounds, padding }
    }

    pub fn bounds(&self) -> &BoundingRect {
        &self.bounds
    }

    /// Convert a screen-space point into simulation space
    pub fn to_sim(&self, point: ScreenPoint) -> SimPoint {
        SimPoint::new(
            (point.x - self.bounds.x1) / self.bounds.width() * SIM_EXTENT + SIM_MIN,
            (point.y - self.bounds.y1) / self.bounds.height() * SIM_EXTENT + SIM_MIN,
        )
    }

    /// Convert a simulation-space point into screen space
    pub fn to_screen(&self, point: SimPoint) -> ScreenPoint {
        ScreenPoint::new(
            self.bounds.x1 + (point.x - SIM_MIN) / SIM_EXTENT * self.bounds.width(),
            self.bounds.y1 + (point.y - SIM_MIN) / SIM_EXTENT * self.bounds.height(),
        )
    }

    /// Mean screen units per simulation unit, across both axes
    ///
    /// Used to express screen-unit lengths (edge rest lengths) in
    /// simulation units.
    pub fn scale(&self) -> f64 {
        (self.bounds.width() + self.bounds.height()) / (2.0 * SIM_EXTENT)
    }

    /// The drawing area left after applying padding insets
    ///
    /// Padding does not change the coordinate scale. If the insets consume
    /// the whole rectangle the area collapses toward its midpoint.
    pub fn usable_area(&self) -> BoundingRect {
        let mid_x = (self.bounds.x1 + self.bounds.x2) / 2.0;
        let mid_y = (self.bounds.y1 + self.bounds.y2) / 2.0;
        BoundingRect {
            x1: (self.bounds.x1 + self.padding.left).min(mid_x),
            y1: (self.bounds.y1 + self.padding.top).min(mid_y),
            x2: (self.bounds.x2 - self.padding.right).max(mid_x),
            y2: (self.bounds.y2 - self.padding.bottom).max(mid_y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn mapper() -> CoordinateMapper {
        let bounds = BoundingRect::new(0.0, 0.0, 400.0, 300.0).unwrap();
        CoordinateMapper::new(bounds, Padding::default())
    }

    #[test]
    fn rejects_zero_area_bounds() {
        assert!(matches!(
            BoundingRect::new(10.0, 10.0, 10.0, 50.0),
            Err(LayoutError::DegenerateBounds { .. })
        ));
        assert!(matches!(
            BoundingRect::new(0.0, 0.0, 100.0, -5.0),
            Err(LayoutError::DegenerateBounds { .. })
        ));
    }

    #[test]
    fn rejects_non_finite_bounds() {
        assert!(matches!(
            BoundingRect::new(0.0, f64::NAN, 100.0, 100.0),
            Err(LayoutError::NonFiniteBounds { .. })
        ));
    }

    #[test]
    fn screen_corners_map_to_sim_box_corners() {
        let m = mapper();
        let top_left = m.to_sim(ScreenPoint::new(0.0, 0.0));
        assert_approx_eq!(f64, top_left.x, SIM_MIN);
        assert_approx_eq!(f64, top_left.y, SIM_MIN);

        let bottom_right = m.to_sim(ScreenPoint::new(400.0, 300.0));
        assert_approx_eq!(f64, bottom_right.x, SIM_MIN + SIM_EXTENT);
        assert_approx_eq!(f64, bottom_right.y, SIM_MIN + SIM_EXTENT);
    }

    #[test]
    fn sim_origin_maps_to_screen_center() {
        let m = mapper();
        let center = m.to_screen(SimPoint::new(0.0, 0.0));
        assert_approx_eq!(f64, center.x, 200.0);
        assert_approx_eq!(f64, center.y, 150.0);
    }

    #[test]
    fn to_screen_adds_bounds_origin_offset() {
        let bounds = BoundingRect::new(100.0, 50.0, 500.0, 350.0).unwrap();
        let m = CoordinateMapper::new(bounds, Padding::uniform(0.0));
        let top_left = m.to_screen(SimPoint::new(SIM_MIN, SIM_MIN));
        assert_approx_eq!(f64, top_left.x, 100.0);
        assert_approx_eq!(f64, top_left.y, 50.0);
    }

    #[test]
    fn round_trip_is_identity() {
        let m = mapper();
        for &(x, y) in &[
            (0.0, 0.0),
            (400.0, 300.0),
            (200.0, 150.0),
            (13.7, 211.9),
            (399.999, 0.001),
        ] {
            let back = m.to_screen(m.to_sim(ScreenPoint::new(x, y)));
            assert_approx_eq!(f64, back.x, x, epsilon = 1e-9);
            assert_approx_eq!(f64, back.y, y, epsilon = 1e-9);
        }
    }

    #[test]
    fn padding_does_not_change_the_scale() {
        let bounds = BoundingRect::new(0.0, 0.0, 400.0, 300.0).unwrap();
        let padded = CoordinateMapper::new(bounds, Padding::uniform(50.0));
        let unpadded = CoordinateMapper::new(bounds, Padding::uniform(0.0));
        let p = ScreenPoint::new(123.0, 45.0);
        assert_eq!(padded.to_sim(p), unpadded.to_sim(p));
        assert_approx_eq!(f64, padded.scale(), unpadded.scale());
    }

    #[test]
    fn usable_area_applies_insets() {
        let bounds = BoundingRect::new(0.0, 0.0, 400.0, 300.0).unwrap();
        let m = CoordinateMapper::new(bounds, Padding::new(10.0, 20.0, 30.0, 40.0));
        let area = m.usable_area();
        assert_approx_eq!(f64, area.x1, 40.0);
        assert_approx_eq!(f64, area.y1, 10.0);
        assert_approx_eq!(f64, area.x2, 380.0);
        assert_approx_eq!(f64, area.y2, 270.0);
    }

    #[test]
    fn oversized_padding_collapses_to_midpoint() {
        let bounds = BoundingRect::new(0.0, 0.0, 100.0, 100.0).unwrap();
        let m = CoordinateMapper::new(bounds, Padding::uniform(80.0));
        let area = m.usable_area();
        assert!(area.x1 <= area.x2);
        assert!(area.y1 <= area.y2);
    }

    #[test]
    fn negative_padding_is_rejected() {
        assert!(Padding::new(0.0, -1.0, 0.0, 0.0).validate().is_err());
        assert!(Padding::uniform(50.0).validate().is_ok());
    }

    #[test]
    fn midpoint_is_rounded() {
        let bounds = BoundingRect::new(0.0, 0.0, 401.0, 300.0).unwrap();
        let mid = bounds.midpoint_rounded();
        assert_approx_eq!(f64, mid.x, 201.0);
        assert_approx_eq!(f64, mid.y, 150.0);
    }
}
