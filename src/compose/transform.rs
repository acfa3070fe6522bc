//! Geometric glyph transforms
//!
//! Every width change moves a glyph from one [`WidthClass`] to another with a
//! scale and a centering translate. A glyph already sitting in its target
//! class is never touched again, so each transform can be re-run safely.

use crate::compose::merge::merge_into;
use crate::core::config_file::BuildConfig;
use crate::font_source::loader::{open_source, DIGIT_ZERO};
use crate::font_source::program::FontProgram;
use crate::geometry::{
    centering_offset, italic_shear, scale_x, shift_x, WidthClass, WidthGrid,
    ITALIC_SLOPE_DEGREES,
};
use anyhow::{bail, Result};
use tracing::{debug, info, warn};

/// Hiragana letter A, the full-width reference of the CJK source
pub const HIRAGANA_A: u32 = 0x3042;

/// Ideographic (zenkaku) space
pub const IDEOGRAPHIC_SPACE: u32 = 0x3000;

/// Name of the slashed variant of the digit zero
pub const SLASHED_ZERO_GLYPH: &str = "zero.zero";

/// Lean every outline and record the italic angle.
pub fn italicize(program: &mut FontProgram) {
    program.info.metrics.italic_angle = -ITALIC_SLOPE_DEGREES;
    let shear = italic_shear(ITALIC_SLOPE_DEGREES);
    for glyph in program.glyphs_mut() {
        glyph.transform(shear);
    }
    debug!("Sheared {} glyphs by {ITALIC_SLOPE_DEGREES} degrees", program.glyph_count());
}

/// Move half-em glyphs onto the 3:5 grid: shift right by half the width
/// delta and widen to `full_35`. Returns the number of glyphs moved.
pub fn width_500_to_600(program: &mut FontProgram, grid: &WidthGrid) -> usize {
    let from = grid.width(WidthClass::Half);
    let to = grid.width(WidthClass::Full35);
    if from == to {
        return 0;
    }
    let offset = shift_x(centering_offset(from as f64, to as f64));
    let mut moved = 0;
    for glyph in program.glyphs_mut().filter(|g| g.advance_width == from) {
        glyph.transform(offset);
        glyph.advance_width = to;
        moved += 1;
    }
    info!("Widened {moved} glyphs from {from} to {to}");
    moved
}

/// Scale the secondary's zero-width glyphs into the `half_12` cell.
pub fn half_width_secondary(
    secondary: &mut FontProgram,
    zero_width: u16,
    grid: &WidthGrid,
) -> usize {
    let target = grid.width(WidthClass::Half12);
    if zero_width == 0 || zero_width == target {
        return 0;
    }
    let scale = target as f64 / zero_width as f64;
    let scaled = zero_width as f64 * scale;
    let affine = shift_x(centering_offset(scaled, target as f64)) * scale_x(scale);

    let mut moved = 0;
    for glyph in secondary
        .glyphs_mut()
        .filter(|g| g.advance_width == zero_width)
    {
        glyph.transform(affine);
        glyph.advance_width = target;
        moved += 1;
    }
    debug!("Scaled {moved} secondary glyphs by {scale:.4} into {target}");
    moved
}

/// Re-centre the primary's half and full cells onto the 1:2 grid.
pub fn half_width_primary(primary: &mut FontProgram, grid: &WidthGrid) -> usize {
    let Some(full) = primary
        .glyph_at(HIRAGANA_A)
        .and_then(|gid| primary.glyph(gid))
        .map(|g| g.advance_width)
    else {
        warn!("Primary has no U+3042; its widths are left as they are");
        return 0;
    };
    let half = full / 2;
    let half_target = grid.width(WidthClass::Half12);
    let full_target = grid.width(WidthClass::Full12);

    let mut moved = 0;
    for glyph in primary.glyphs_mut() {
        if grid.classify(glyph.advance_width, true).is_some() {
            continue;
        }
        let (before, after) = if glyph.advance_width == half {
            (half, half_target)
        } else if glyph.advance_width == full {
            (full, full_target)
        } else {
            continue;
        };
        glyph.transform(shift_x(centering_offset(before as f64, after as f64)));
        glyph.advance_width = after;
        moved += 1;
    }
    debug!("Moved {moved} primary glyphs onto the 1:2 grid");
    moved
}

/// Put both contributors on the 1:2 grid.
pub fn transform_half_width(
    primary: &mut FontProgram,
    secondary: &mut FontProgram,
    zero_width: Option<u16>,
    grid: &WidthGrid,
) -> Result<()> {
    let Some(zero_width) = zero_width else {
        bail!("Secondary source has no digit zero to derive the half width from");
    };
    let secondary_moved = half_width_secondary(secondary, zero_width, grid);
    let primary_moved = half_width_primary(primary, grid);
    info!(
        "Half-width transform: {secondary_moved} secondary and {primary_moved} primary glyphs"
    );
    Ok(())
}

/// Copy the slashed zero's outline onto the digit zero. The advance stays.
pub fn slashed_zero(program: &mut FontProgram) -> bool {
    let Some(source) = program.glyph_by_name(SLASHED_ZERO_GLYPH) else {
        warn!("No '{SLASHED_ZERO_GLYPH}' glyph; digit zero left unslashed");
        return false;
    };
    let Some(target) = program.glyph_at(DIGIT_ZERO) else {
        warn!("No glyph at U+0030; slashed zero skipped");
        return false;
    };
    let Some(outline) = program.glyph(source).map(|g| g.outline.clone()) else {
        return false;
    };
    if let Some(zero) = program.glyph_mut(target) {
        zero.outline = outline;
    }
    debug!("Copied '{SLASHED_ZERO_GLYPH}' onto U+0030");
    true
}

/// Replace the invisible ideographic space with the visible glyph from the
/// auxiliary resource.
pub fn visualize_zenkaku_space(program: &mut FontProgram, config: &BuildConfig) -> Result<()> {
    // an absent U+3000 is fine; the resource supplies one
    let _ = program.clear_codepoint(IDEOGRAPHIC_SPACE);
    let space = open_source(
        config.ideographic_space_source(),
        "ideographic space",
        &config.ideographic_space,
    )?;
    merge_into(program, &space)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_source::data::{ContourData, OutlineData, PointData};
    use crate::font_source::program::Glyph;

    fn grid() -> WidthGrid {
        WidthGrid {
            em: 1000,
            full_35: 600,
            half_12: 528,
        }
    }

    fn box_at(x0: f64, x1: f64) -> OutlineData {
        OutlineData::new(vec![ContourData::new(vec![
            PointData::on(x0, 0.0),
            PointData::on(x0, 700.0),
            PointData::on(x1, 700.0),
            PointData::on(x1, 0.0),
        ])])
    }

    fn x_range(program: &FontProgram, gid: usize) -> (f64, f64) {
        let bounds = program.glyph(gid).unwrap().outline.bounds().unwrap();
        (bounds.min_x(), bounds.max_x())
    }

    fn cjk() -> FontProgram {
        let mut font = FontProgram::default();
        let half = font.add_glyph(Glyph::new("a", 500, box_at(50.0, 450.0))).unwrap();
        let full = font.add_glyph(Glyph::new("uni3042", 1000, box_at(100.0, 900.0))).unwrap();
        font.map_codepoint(0x61, half).unwrap();
        font.map_codepoint(HIRAGANA_A, full).unwrap();
        font
    }

    #[test]
    fn italic_sets_angle_and_shears() {
        let mut font = cjk();
        italicize(&mut font);
        assert_eq!(font.info.metrics.italic_angle, -9.0);
        let (_, max_x) = x_range(&font, 0);
        assert!(max_x > 450.0);
    }

    #[test]
    fn widen_to_600_shifts_by_50() {
        let mut font = cjk();
        assert_eq!(width_500_to_600(&mut font, &grid()), 1);
        assert_eq!(font.glyph(0).unwrap().advance_width, 600);
        assert_eq!(x_range(&font, 0), (100.0, 500.0));
        assert_eq!(font.glyph(1).unwrap().advance_width, 1000);
    }

    #[test]
    fn widen_to_600_is_idempotent() {
        let mut font = cjk();
        width_500_to_600(&mut font, &grid());
        assert_eq!(width_500_to_600(&mut font, &grid()), 0);
        assert_eq!(x_range(&font, 0), (100.0, 500.0));
    }

    #[test]
    fn half_width_secondary_scales_and_centres() {
        let mut font = FontProgram::default();
        font.add_glyph(Glyph::new("zero", 600, box_at(0.0, 600.0))).unwrap();
        font.add_glyph(Glyph::new("wide", 1200, box_at(0.0, 1200.0))).unwrap();

        assert_eq!(half_width_secondary(&mut font, 600, &grid()), 1);
        let glyph = font.glyph(0).unwrap();
        assert_eq!(glyph.advance_width, 528);
        let (min_x, max_x) = x_range(&font, 0);
        assert!((min_x - 0.0).abs() < 1e-9);
        assert!((max_x - 528.0).abs() < 1e-9);
        assert_eq!(font.glyph(1).unwrap().advance_width, 1200);

        // second pass finds nothing at the old width
        assert_eq!(half_width_secondary(&mut font, 600, &grid()), 0);
    }

    #[test]
    fn half_width_primary_translate_is_half_the_delta() {
        let mut font = cjk();
        assert_eq!(half_width_primary(&mut font, &grid()), 2);
        assert_eq!(font.glyph(0).unwrap().advance_width, 528);
        assert_eq!(font.glyph(1).unwrap().advance_width, 1056);
        // 500 -> 528 moves by +14, 1000 -> 1056 by +28
        assert_eq!(x_range(&font, 0), (64.0, 464.0));
        assert_eq!(x_range(&font, 1), (128.0, 928.0));
    }

    #[test]
    fn half_width_primary_skips_glyphs_at_target() {
        let mut font = FontProgram::default();
        let full = font.add_glyph(Glyph::new("uni3042", 1056, box_at(0.0, 1056.0))).unwrap();
        font.map_codepoint(HIRAGANA_A, full).unwrap();
        font.add_glyph(Glyph::new("a", 528, box_at(0.0, 528.0))).unwrap();
        assert_eq!(half_width_primary(&mut font, &grid()), 0);
        assert_eq!(x_range(&font, 1), (0.0, 528.0));
    }

    #[test]
    fn missing_zero_width_is_an_error() {
        let mut primary = cjk();
        let mut secondary = FontProgram::default();
        assert!(transform_half_width(&mut primary, &mut secondary, None, &grid()).is_err());
    }

    #[test]
    fn slashed_zero_copies_outline_only() {
        let mut font = FontProgram::default();
        let zero = font.add_glyph(Glyph::new("zero", 600, box_at(50.0, 550.0))).unwrap();
        font.map_codepoint(DIGIT_ZERO, zero).unwrap();
        font.add_glyph(Glyph::new("zero.zero", 620, box_at(60.0, 540.0))).unwrap();

        assert!(slashed_zero(&mut font));
        let glyph = font.glyph(zero).unwrap();
        assert_eq!(glyph.advance_width, 600);
        assert_eq!(x_range(&font, zero), (60.0, 540.0));
    }

    #[test]
    fn slashed_zero_reaches_the_merged_primary_zero() {
        let mut primary = FontProgram::default();
        let zero = primary.add_glyph(Glyph::new("zero", 600, box_at(40.0, 460.0))).unwrap();
        primary.map_codepoint(DIGIT_ZERO, zero).unwrap();

        let mut secondary = FontProgram::default();
        let zero = secondary.add_glyph(Glyph::new("zero", 600, box_at(50.0, 550.0))).unwrap();
        secondary.map_codepoint(DIGIT_ZERO, zero).unwrap();
        secondary.add_glyph(Glyph::new("zero.zero", 600, box_at(60.0, 540.0))).unwrap();

        crate::compose::conflict::resolve_conflicts(&primary, &mut secondary);
        merge_into(&mut secondary, &primary).unwrap();
        assert!(slashed_zero(&mut secondary));

        let target = secondary.glyph_at(DIGIT_ZERO).unwrap();
        assert_eq!(x_range(&secondary, target), (60.0, 540.0));
        assert_eq!(secondary.glyph(target).unwrap().advance_width, 600);
    }

    #[test]
    fn slashed_zero_without_source_is_skipped() {
        let mut font = FontProgram::default();
        let zero = font.add_glyph(Glyph::new("zero", 600, box_at(50.0, 550.0))).unwrap();
        font.map_codepoint(DIGIT_ZERO, zero).unwrap();
        assert!(!slashed_zero(&mut font));
        assert_eq!(x_range(&font, zero), (50.0, 550.0));
    }
}
