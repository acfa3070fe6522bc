//! Structural merge of two font programs
//!
//! The incoming program's meaningful glyphs are copied into the receiver.
//! The new glyph list and code point map are built on the side and swapped
//! in at the end, so a failed merge leaves the receiver untouched.

use crate::font_source::program::{FontProgram, Glyph, GlyphIndex};
use anyhow::Result;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Counts of what one merge did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    /// Glyphs added after the receiver's last glyph
    pub appended: usize,
    /// Cleared receiver slots reused by a glyph of the same name
    pub filled: usize,
    /// Incoming code points lost to a meaningful receiver glyph
    pub dropped: usize,
}

/// Merge every meaningful glyph of `incoming` into `receiver`.
pub fn merge_into(receiver: &mut FontProgram, incoming: &FontProgram) -> Result<MergeReport> {
    let mut glyphs: Vec<Glyph> = receiver.glyphs().to_vec();
    let mut cmap = receiver.cmap().clone();
    let mut names: HashMap<String, GlyphIndex> = glyphs
        .iter()
        .enumerate()
        .map(|(gid, g)| (g.name().to_string(), gid))
        .collect();
    let occupied: BTreeSet<u32> = receiver
        .mappings()
        .into_iter()
        .filter(|&(_, gid)| receiver.glyph(gid).is_some_and(Glyph::is_meaningful))
        .map(|(cp, _)| cp)
        .collect();

    let mut report = MergeReport::default();
    let mut placed: HashMap<GlyphIndex, GlyphIndex> = HashMap::new();

    for (gid_in, glyph) in incoming.glyphs().iter().enumerate() {
        if !glyph.is_meaningful() {
            continue;
        }
        let mut alternates = glyph.alternates.clone();
        alternates.retain(|alt| {
            let keep = !occupied.contains(&alt.codepoint);
            if !keep {
                debug!(
                    "Dropped alternate U+{:04X} of '{}'",
                    alt.codepoint,
                    glyph.name()
                );
            }
            keep
        });

        let reusable = names
            .get(glyph.name())
            .copied()
            .filter(|&slot| !glyphs[slot].is_meaningful());
        let gid_out = match reusable {
            Some(slot) => {
                let target = &mut glyphs[slot];
                target.outline = glyph.outline.clone();
                target.advance_width = glyph.advance_width;
                target.alternates = alternates;
                report.filled += 1;
                slot
            }
            None => {
                let name = unique_name(glyph.name(), &names);
                let mut copy = Glyph::new(name.as_str(), glyph.advance_width, glyph.outline.clone());
                copy.alternates = alternates;
                let slot = glyphs.len();
                names.insert(name, slot);
                glyphs.push(copy);
                report.appended += 1;
                slot
            }
        };
        placed.insert(gid_in, gid_out);
    }

    for (&codepoint, gid_in) in incoming.cmap() {
        let Some(&gid_out) = placed.get(gid_in) else {
            continue;
        };
        if occupied.contains(&codepoint) {
            debug!("Dropped incoming U+{codepoint:04X}: receiver glyph is meaningful");
            report.dropped += 1;
            continue;
        }
        cmap.insert(codepoint, gid_out);
    }

    receiver.replace_contents(glyphs, cmap)?;
    info!(
        "Merged {} glyphs ({} appended, {} reused slots), {} code points dropped",
        report.appended + report.filled,
        report.appended,
        report.filled,
        report.dropped
    );
    Ok(report)
}

/// `name`, or `name.N` with the first free N
fn unique_name(name: &str, taken: &HashMap<String, GlyphIndex>) -> String {
    if !taken.contains_key(name) {
        return name.to_string();
    }
    (1..)
        .map(|n| format!("{name}.{n}"))
        .find(|candidate| !taken.contains_key(candidate))
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_source::data::{ContourData, OutlineData, PointData};
    use crate::font_source::program::AltMapping;
    use pretty_assertions::assert_eq;

    fn ink(x: f64) -> OutlineData {
        OutlineData::new(vec![ContourData::new(vec![
            PointData::on(x, 0.0),
            PointData::on(x, 100.0),
            PointData::on(x + 100.0, 0.0),
        ])])
    }

    fn receiver() -> FontProgram {
        let mut font = FontProgram::default();
        font.add_glyph(Glyph::empty(".notdef")).unwrap();
        let a = font.add_glyph(Glyph::new("A", 600, ink(0.0))).unwrap();
        font.map_codepoint(0x41, a).unwrap();
        // cleared by conflict resolution
        font.add_glyph(Glyph::empty("uni3042")).unwrap();
        font
    }

    fn incoming() -> FontProgram {
        let mut font = FontProgram::default();
        font.add_glyph(Glyph::empty(".notdef")).unwrap();
        let hira = font.add_glyph(Glyph::new("uni3042", 1000, ink(10.0))).unwrap();
        font.map_codepoint(0x3042, hira).unwrap();
        let a = font.add_glyph(Glyph::new("A", 500, ink(20.0))).unwrap();
        font.map_codepoint(0x41, a).unwrap();
        let b = font.add_glyph(Glyph::new("B", 500, ink(30.0))).unwrap();
        font.map_codepoint(0x42, b).unwrap();
        font.glyph_mut(b)
            .unwrap()
            .alternates
            .push(AltMapping::plain(0x41));
        font
    }

    #[test]
    fn cleared_slot_is_filled_in_place() {
        let mut target = receiver();
        let report = merge_into(&mut target, &incoming()).unwrap();
        assert_eq!(report.filled, 1);
        assert_eq!(target.glyph_at(0x3042), Some(2));
        assert_eq!(target.glyph(2).unwrap().advance_width, 1000);
    }

    #[test]
    fn name_collision_gets_a_suffix() {
        let mut target = receiver();
        merge_into(&mut target, &incoming()).unwrap();
        assert!(target.contains_glyph("A.1"));
        assert_eq!(target.glyph(1).unwrap().advance_width, 600);
    }

    #[test]
    fn meaningful_receiver_keeps_its_code_point() {
        let mut target = receiver();
        let report = merge_into(&mut target, &incoming()).unwrap();
        assert_eq!(report.dropped, 1);
        assert_eq!(target.glyph_at(0x41), Some(1));
        let b = target.glyph_at(0x42).unwrap();
        assert!(target.glyph(b).unwrap().alternates.is_empty());
    }

    #[test]
    fn empty_incoming_glyphs_are_skipped() {
        let mut target = receiver();
        let before = target.glyph_count();
        let report = merge_into(&mut target, &incoming()).unwrap();
        // .notdef is not meaningful; A.1 and B are appended
        assert_eq!(report.appended, 2);
        assert_eq!(target.glyph_count(), before + 2);
    }
}
