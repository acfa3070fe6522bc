//! Icon glyph grafting
//!
//! The icon font is opened once per run, rescaled to the shared em and given
//! collision-free names. Each style then gets its own shaped copy fitted to
//! that style's half-width cell.

use crate::core::config_file::BuildConfig;
use crate::font_source::loader::{normalize_units_per_em, open_source};
use crate::font_source::program::{FontProgram, GlyphIndex};
use crate::geometry::shift_x;
use anyhow::Result;
use kurbo::Affine;
use tracing::{debug, info, warn};

/// Suffix appended to every icon glyph name
pub const ICON_SUFFIX: &str = "-nf";

/// Powerline separators: right-anchored glyphs that need their own fitting
pub const POWERLINE_RANGE: std::ops::RangeInclusive<u32> = 0xE0B0..=0xE0D4;

/// Vertical stretch of the powerline glyphs so they span the line height
pub const POWERLINE_Y_SCALE: f64 = 1.14;

/// Vertical shift applied after the stretch
pub const POWERLINE_Y_SHIFT: f64 = 21.0;

/// Per-glyph corrections applied before the powerline glyphs are fitted
const POWERLINE_NUDGES: [(u32, f64, f64); 12] = [
    (0xE0B0, -8.0, 0.0),
    (0xE0B1, -8.0, 0.0),
    (0xE0B2, 8.0, 0.0),
    (0xE0B3, 8.0, 0.0),
    (0xE0B4, -12.0, 0.0),
    (0xE0B5, -12.0, 0.0),
    (0xE0B6, 12.0, 0.0),
    (0xE0B7, 12.0, 0.0),
    (0xE0B8, -4.0, -2.0),
    (0xE0BA, 4.0, -2.0),
    (0xE0BC, -4.0, 2.0),
    (0xE0BE, 4.0, 2.0),
];

/// Icons narrower than this share of the em are centred in the cell
const CENTERING_THRESHOLD: f64 = 0.6;

/// The renamed, rescaled icon font shared by all styles
#[derive(Debug, Clone)]
pub struct IconFont {
    program: FontProgram,
}

impl IconFont {
    pub fn load(config: &BuildConfig) -> Result<Self> {
        let program = open_source(config.nerd_font_source(), "icon", &config.nerd_font)?;
        Ok(Self::from_program(program, config.units_per_em()))
    }

    pub fn from_program(mut program: FontProgram, units_per_em: u16) -> Self {
        normalize_units_per_em(&mut program, units_per_em);
        let renamed = rename_icons(&mut program);
        info!("Prepared icon font: {renamed} glyphs renamed");
        Self { program }
    }

    pub fn program(&self) -> &FontProgram {
        &self.program
    }

    /// Code points the icon font supplies a meaningful glyph for
    pub fn codepoints(&self) -> Vec<u32> {
        self.program
            .mappings()
            .into_iter()
            .filter(|&(_, gid)| self.program.glyph(gid).is_some_and(|g| g.is_meaningful()))
            .map(|(cp, _)| cp)
            .collect()
    }

    /// A copy of the icons fitted to a `half_width` cell
    pub fn shaped(&self, half_width: u16) -> FontProgram {
        let mut program = self.program.clone();
        let em = program.info.units_per_em as f64;
        let half = half_width as f64;

        let powerline: Vec<(GlyphIndex, u32)> = program
            .mappings()
            .into_iter()
            .filter(|(cp, _)| POWERLINE_RANGE.contains(cp))
            .map(|(cp, gid)| (gid, cp))
            .collect();

        for (gid, glyph) in program.glyphs_mut().enumerate() {
            if !glyph.is_meaningful() {
                continue;
            }
            if let Some(&(_, codepoint)) = powerline.iter().find(|(g, _)| *g == gid) {
                glyph.transform(powerline_fit(codepoint, glyph.advance_width, half));
            } else if let Some(bounds) = glyph.outline.bounds() {
                if bounds.width() < em * CENTERING_THRESHOLD {
                    let dx = (half - bounds.width()) / 2.0 - bounds.min_x();
                    glyph.transform(shift_x(dx));
                }
            }
            glyph.advance_width = half_width;
        }
        debug!("Shaped icons for a {half_width} unit cell");
        program
    }
}

/// Nudge, fit the cell horizontally, then stretch and lift.
fn powerline_fit(codepoint: u32, advance: u16, half: f64) -> Affine {
    let (dx, dy) = POWERLINE_NUDGES
        .iter()
        .find(|(cp, _, _)| *cp == codepoint)
        .map(|&(_, dx, dy)| (dx, dy))
        .unwrap_or((0.0, 0.0));
    let x_scale = if advance == 0 {
        1.0
    } else {
        half / advance as f64
    };
    Affine::translate((0.0, POWERLINE_Y_SHIFT))
        * Affine::scale_non_uniform(x_scale, POWERLINE_Y_SCALE)
        * Affine::translate((dx, dy))
}

/// Suffix every glyph name, falling back to the encoding on a collision.
fn rename_icons(program: &mut FontProgram) -> usize {
    let mut renamed = 0;
    for gid in 0..program.glyph_count() {
        let Some(name) = program.glyph(gid).map(|g| g.name().to_string()) else {
            continue;
        };
        let plain = format!("{name}{ICON_SUFFIX}");
        let candidate = if program.contains_glyph(&plain) {
            let encoding = program
                .codepoints_of(gid)
                .first()
                .map(|cp| format!("{cp:X}"))
                .unwrap_or_else(|| gid.to_string());
            format!("{plain}-{encoding}")
        } else {
            plain
        };
        match program.rename_glyph(gid, &candidate) {
            Ok(()) => renamed += 1,
            Err(err) => warn!("Icon glyph '{name}' kept its name: {err}"),
        }
    }
    renamed
}

/// Clear whatever sits at the icon code points. Code points with nothing to
/// clear are skipped.
pub fn clear_icon_codepoints(program: &mut FontProgram, codepoints: &[u32]) -> usize {
    codepoints
        .iter()
        .filter_map(|&cp| program.clear_codepoint(cp))
        .map(|set| set.len())
        .sum()
}
