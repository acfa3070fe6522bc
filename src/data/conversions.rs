//! Outline format conversion utilities
//!
//! This module contains conversion logic between our internal outline
//! structures and the glyf representations of read-fonts and write-fonts.
//! Composite glyphs are flattened on the way in: the pipeline moves glyphs
//! between fonts, and components would dangle once their base glyph lives in
//! a different glyph order.

use crate::font_source::data::{ContourData, OutlineData, PointData};
use kurbo::Affine;
use tracing::warn;
use write_fonts::read::tables::glyf::{Anchor, CurvePoint, Glyf, Glyph as ReadGlyph};
use write_fonts::read::tables::loca::Loca;
use write_fonts::read::types::GlyphId;
use write_fonts::read::ReadError;
use write_fonts::tables::glyf::{Bbox, Contour, SimpleGlyph};

/// Deepest component nesting we follow before giving up on a glyph
const MAX_COMPONENT_DEPTH: u8 = 16;

/// Read the outline of `gid`, resolving components recursively.
pub fn outline_from_glyf(loca: &Loca, glyf: &Glyf, gid: u32) -> Result<OutlineData, ReadError> {
    read_outline(loca, glyf, gid, 0)
}

fn read_outline(loca: &Loca, glyf: &Glyf, gid: u32, depth: u8) -> Result<OutlineData, ReadError> {
    if depth > MAX_COMPONENT_DEPTH {
        warn!("Component nesting too deep at glyph {gid}, dropping outline");
        return Ok(OutlineData::default());
    }

    match loca.get_glyf(GlyphId::new(gid), glyf)? {
        None => Ok(OutlineData::default()),
        Some(ReadGlyph::Simple(simple)) => {
            let mut contours = Vec::new();
            let mut points = simple.points();
            let mut current = 0usize;
            for end_pt in simple.end_pts_of_contours() {
                let end = end_pt.get() as usize;
                let mut contour = Vec::with_capacity(end.saturating_sub(current) + 1);
                while current <= end {
                    if let Some(pt) = points.next() {
                        contour.push(PointData::new(pt.x as f64, pt.y as f64, pt.on_curve));
                    }
                    current += 1;
                }
                contours.push(ContourData::new(contour));
            }
            Ok(OutlineData::new(contours))
        }
        Some(ReadGlyph::Composite(composite)) => {
            let mut outline = OutlineData::default();
            for component in composite.components() {
                let base = read_outline(loca, glyf, component.glyph.to_u32(), depth + 1)?;
                let (dx, dy) = match component.anchor {
                    Anchor::Offset { x, y } => (x as f64, y as f64),
                    // point-matched components are rare in the sources we merge
                    Anchor::Point { .. } => {
                        warn!("Point-anchored component in glyph {gid} placed at origin");
                        (0.0, 0.0)
                    }
                };
                let t = component.transform;
                let affine = Affine::new([
                    t.xx.to_f32() as f64,
                    t.yx.to_f32() as f64,
                    t.xy.to_f32() as f64,
                    t.yy.to_f32() as f64,
                    dx,
                    dy,
                ]);
                outline.extend_transformed(&base, affine);
            }
            Ok(outline)
        }
    }
}

/// Convert an outline into a glyf simple glyph, rounding coordinates.
pub fn simple_glyph_from_outline(outline: &OutlineData) -> SimpleGlyph {
    let contours: Vec<Contour> = outline
        .contours
        .iter()
        .filter(|contour| !contour.points.is_empty())
        .map(|contour| {
            contour
                .points
                .iter()
                .map(|p| CurvePoint {
                    x: round_coord(p.x),
                    y: round_coord(p.y),
                    on_curve: p.on_curve,
                })
                .collect::<Vec<_>>()
                .into()
        })
        .collect();

    let mut glyph = SimpleGlyph {
        bbox: Bbox::default(),
        contours,
        instructions: Vec::new(),
    };
    glyph.recompute_bounding_box();
    glyph
}

fn round_coord(value: f64) -> i16 {
    value.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}
