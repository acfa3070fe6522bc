//! Alternate-mapping flattening
//!
//! Some dash and tilde code points reach their glyph only through a plain
//! alternate mapping of another code point. Those are given a glyph of their
//! own so later stages can address them independently.

use crate::data::sfnt;
use crate::font_source::program::{FontProgram, Glyph, GlyphIndex};
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Code points known to hide behind an alternate mapping
pub const PROBLEM_CODEPOINTS: [u32; 4] = [
    // em dash
    0x2014,
    // horizontal bar
    0x2015,
    // wave dash
    0x301C,
    // fullwidth tilde
    0xFF5E,
];

/// Production name of the glyph that owns `codepoint` after flattening
pub fn flattened_name(codepoint: u32) -> String {
    format!("uni{codepoint:04X}")
}

/// Give every problem code point reached only through an alternate its own
/// glyph. Returns the code points that were moved.
pub fn flatten_alternates(program: &mut FontProgram) -> Result<Vec<u32>> {
    let mut flattened = Vec::new();
    for codepoint in PROBLEM_CODEPOINTS {
        if program.cmap().contains_key(&codepoint) {
            continue;
        }
        let Some(anchor) = anchor_of(program, codepoint) else {
            continue;
        };
        let Some(source) = program.glyph(anchor).cloned() else {
            continue;
        };

        let name = flattened_name(codepoint);
        let target = match program.glyph_by_name(&name) {
            Some(gid) => gid,
            None => program.add_glyph(Glyph::empty(name.as_str()))?,
        };
        if target != anchor {
            if let Some(glyph) = program.glyph_mut(target) {
                glyph.outline = source.outline.clone();
                glyph.advance_width = source.advance_width;
            }
        }
        if let Some(glyph) = program.glyph_mut(anchor) {
            glyph
                .alternates
                .retain(|alt| !(alt.codepoint == codepoint && alt.selector.is_none()));
        }
        program.map_codepoint(codepoint, target)?;
        debug!(
            "Flattened U+{codepoint:04X} from '{}' into '{name}'",
            source.name()
        );
        flattened.push(codepoint);
    }
    Ok(flattened)
}

/// Glyph carrying `codepoint` as a plain alternate
fn anchor_of(program: &FontProgram, codepoint: u32) -> Option<GlyphIndex> {
    program.glyphs().iter().position(|g| {
        g.alternates
            .iter()
            .any(|alt| alt.codepoint == codepoint && alt.selector.is_none())
    })
}

/// Flatten and, when anything moved, re-encode the program by writing it to
/// a temporary binary and reading it back.
pub fn flatten(program: &mut FontProgram) -> Result<usize> {
    let flattened = flatten_alternates(program)?;
    if flattened.is_empty() {
        return Ok(0);
    }

    let temp = tempfile::Builder::new()
        .prefix("fontmerge-")
        .suffix(".ttf")
        .tempfile()
        .context("Failed to create temporary font file")?;
    sfnt::save_font(program, temp.path())?;
    *program = sfnt::load_font(temp.path()).context("Failed to reopen flattened font")?;

    info!("Flattened {} alternate mappings", flattened.len());
    Ok(flattened.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_source::data::{ContourData, OutlineData, PointData};
    use crate::font_source::program::AltMapping;

    fn bar() -> OutlineData {
        OutlineData::new(vec![ContourData::new(vec![
            PointData::on(0.0, 300.0),
            PointData::on(0.0, 360.0),
            PointData::on(1000.0, 360.0),
            PointData::on(1000.0, 300.0),
        ])])
    }

    fn dashed() -> FontProgram {
        let mut font = FontProgram::default();
        font.info.units_per_em = 1000;
        font.add_glyph(Glyph::empty(".notdef")).unwrap();
        let dash = font.add_glyph(Glyph::new("emdash", 1000, bar())).unwrap();
        font.map_codepoint(0x2014, dash).unwrap();
        font.glyph_mut(dash)
            .unwrap()
            .alternates
            .push(AltMapping::plain(0x2015));
        font
    }

    #[test]
    fn alternate_becomes_its_own_glyph() {
        let mut font = dashed();
        let moved = flatten_alternates(&mut font).unwrap();
        assert_eq!(moved, vec![0x2015]);

        let gid = font.glyph_by_name("uni2015").unwrap();
        assert_eq!(font.cmap().get(&0x2015), Some(&gid));
        let glyph = font.glyph(gid).unwrap();
        assert_eq!(glyph.advance_width, 1000);
        assert_eq!(glyph.outline, bar());
        assert!(font.glyph(1).unwrap().alternates.is_empty());
    }

    #[test]
    fn existing_glyph_is_reused() {
        let mut font = dashed();
        let existing = font.add_glyph(Glyph::empty("uni2015")).unwrap();
        flatten_alternates(&mut font).unwrap();
        assert_eq!(font.glyph_at(0x2015), Some(existing));
        assert_eq!(font.glyph_count(), 3);
    }

    #[test]
    fn selector_alternates_are_left_alone() {
        let mut font = dashed();
        font.glyph_mut(1).unwrap().alternates = vec![AltMapping {
            codepoint: 0x2015,
            selector: Some(0xFE00),
        }];
        assert!(flatten_alternates(&mut font).unwrap().is_empty());
    }

    #[test]
    fn round_trip_keeps_the_new_glyph() {
        let mut font = dashed();
        assert_eq!(flatten(&mut font).unwrap(), 1);
        let gid = font.glyph_at(0x2015).unwrap();
        assert_eq!(font.glyph(gid).unwrap().name(), "uni2015");
        assert_ne!(font.glyph_at(0x2014), Some(gid));
    }

    #[test]
    fn nothing_to_flatten_skips_the_round_trip() {
        let mut font = FontProgram::default();
        font.add_glyph(Glyph::empty(".notdef")).unwrap();
        assert_eq!(flatten(&mut font).unwrap(), 0);
    }
}
