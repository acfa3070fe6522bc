//! Geometry utility functions
//!
//! Shared affine helpers for the glyph transforms: italic shear, horizontal
//! scaling and the centering offset used whenever a glyph moves into a cell
//! of a different width.

use kurbo::Affine;

/// Slope of the synthesized italics, in degrees
pub const ITALIC_SLOPE_DEGREES: f64 = 9.0;

/// Shear that leans outlines to the right by `degrees`
pub fn italic_shear(degrees: f64) -> Affine {
    Affine::skew(degrees.to_radians().tan(), 0.0)
}

/// Horizontal-only scale about the origin
pub fn scale_x(factor: f64) -> Affine {
    Affine::scale_non_uniform(factor, 1.0)
}

/// Horizontal translate
pub fn shift_x(dx: f64) -> Affine {
    Affine::translate((dx, 0.0))
}

/// Offset that re-centres content laid out in a `before`-wide cell inside an
/// `after`-wide cell. Its magnitude is half the width delta.
pub fn centering_offset(before: f64, after: f64) -> f64 {
    -(before - after) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_italic_shear_leans_right() {
        let shear = italic_shear(ITALIC_SLOPE_DEGREES);
        let top = shear * Point::new(0.0, 1000.0);
        assert!((top.x - 158.38).abs() < 0.01);
        assert_eq!(top.y, 1000.0);
        // the baseline does not move
        assert_eq!(shear * Point::new(250.0, 0.0), Point::new(250.0, 0.0));
    }

    #[test]
    fn test_centering_offset_is_half_the_delta() {
        assert_eq!(centering_offset(600.0, 528.0), -36.0);
        assert_eq!(centering_offset(500.0, 528.0), 14.0);
        assert_eq!(centering_offset(528.0, 528.0), 0.0);
    }

    #[test]
    fn test_scale_x_keeps_y() {
        let p = scale_x(0.5) * Point::new(200.0, 300.0);
        assert_eq!(p, Point::new(100.0, 300.0));
    }
}
