//! Outline data structures
//!
//! Glyph outlines are kept in TrueType form: closed contours of quadratic
//! on/off-curve points. Coordinates are stored as `f64` so that a chain of
//! transforms (scale, shear, translate) only rounds once, when the font is
//! written back out.

use kurbo::{Affine, Point, Rect};

/// A single outline point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointData {
    pub x: f64,
    pub y: f64,
    pub on_curve: bool,
}

impl PointData {
    pub fn new(x: f64, y: f64, on_curve: bool) -> Self {
        Self { x, y, on_curve }
    }

    pub fn on(x: f64, y: f64) -> Self {
        Self::new(x, y, true)
    }

    pub fn off(x: f64, y: f64) -> Self {
        Self::new(x, y, false)
    }

    pub fn to_point(self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A closed contour
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourData {
    pub points: Vec<PointData>,
}

impl ContourData {
    pub fn new(points: Vec<PointData>) -> Self {
        Self { points }
    }
}

/// The full outline of a glyph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutlineData {
    pub contours: Vec<ContourData>,
}

impl OutlineData {
    pub fn new(contours: Vec<ContourData>) -> Self {
        Self { contours }
    }

    /// True when the outline has no points at all
    pub fn is_empty(&self) -> bool {
        self.contours.iter().all(|c| c.points.is_empty())
    }

    pub fn point_count(&self) -> usize {
        self.contours.iter().map(|c| c.points.len()).sum()
    }

    pub fn clear(&mut self) {
        self.contours.clear();
    }

    /// Apply an affine transform to every point.
    ///
    /// Quadratic curves are affine-invariant, so transforming the control
    /// points is exact.
    pub fn apply_affine(&mut self, affine: Affine) {
        for point in self.contours.iter_mut().flat_map(|c| c.points.iter_mut()) {
            let moved = affine * point.to_point();
            point.x = moved.x;
            point.y = moved.y;
        }
    }

    /// Append the contours of another outline, transformed.
    pub fn extend_transformed(&mut self, other: &OutlineData, affine: Affine) {
        let mut copy = other.clone();
        copy.apply_affine(affine);
        self.contours.extend(copy.contours);
    }

    /// Control-point bounds, `None` for an empty outline
    pub fn bounds(&self) -> Option<Rect> {
        let mut points = self
            .contours
            .iter()
            .flat_map(|c| c.points.iter())
            .map(|p| p.to_point());
        let first = points.next()?;
        Some(points.fold(Rect::from_points(first, first), |rect, p| {
            rect.union_pt(p)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> ContourData {
        ContourData::new(vec![
            PointData::on(x0, y0),
            PointData::on(x0, y0 + size),
            PointData::on(x0 + size, y0 + size),
            PointData::on(x0 + size, y0),
        ])
    }

    #[test]
    fn bounds_cover_all_points() {
        let outline = OutlineData::new(vec![square(10.0, 0.0, 100.0), square(-20.0, 50.0, 10.0)]);
        let bounds = outline.bounds().unwrap();
        assert_eq!(bounds.min_x(), -20.0);
        assert_eq!(bounds.max_x(), 110.0);
        assert_eq!(bounds.min_y(), 0.0);
        assert_eq!(bounds.max_y(), 100.0);
    }

    #[test]
    fn empty_outline_has_no_bounds() {
        assert!(OutlineData::default().bounds().is_none());
        assert!(OutlineData::default().is_empty());
    }

    #[test]
    fn translate_moves_every_point() {
        let mut outline = OutlineData::new(vec![square(0.0, 0.0, 10.0)]);
        outline.apply_affine(Affine::translate((50.0, 25.0)));
        let bounds = outline.bounds().unwrap();
        assert_eq!((bounds.min_x(), bounds.min_y()), (50.0, 25.0));
        assert_eq!((bounds.max_x(), bounds.max_y()), (60.0, 35.0));
    }
}
