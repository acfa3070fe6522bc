//! Glyph conflict resolution
//!
//! Decides, per code point, which contributor keeps its glyph. The rule has
//! two fixed phases and the order matters:
//!
//! 1. every secondary glyph reachable from a deny-listed code point is
//!    cleared, whether or not the primary has a glyph there yet;
//! 2. every secondary glyph sharing a code point with a meaningful primary
//!    glyph is cleared.
//!
//! Afterwards the two programs have disjoint meaningful coverage.

use crate::font_source::program::{FontProgram, GlyphSet};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Code point ranges the primary always owns
pub const DENY_LIST: [(u32, u32); 6] = [
    // null
    (0x0000, 0x0000),
    // fullwidth ASCII
    (0xFF01, 0xFF5D),
    // halfwidth corner brackets
    (0xFF62, 0xFF63),
    // CJK punctuation and brackets
    (0x3001, 0x3015),
    // fullwidth hyphen-minus
    (0xFF0D, 0xFF0D),
    // middle dot
    (0x00B7, 0x00B7),
];

pub fn is_deny_listed(codepoint: u32) -> bool {
    DENY_LIST
        .iter()
        .any(|&(start, end)| (start..=end).contains(&codepoint))
}

/// Glyphs of `font` reachable from any deny-listed code point
pub fn deny_listed_glyphs(font: &FontProgram) -> GlyphSet {
    font.mappings()
        .into_iter()
        .filter(|&(cp, _)| is_deny_listed(cp))
        .map(|(_, gid)| gid)
        .collect()
}

/// Glyphs of `secondary` at code points where `primary` has a meaningful
/// glyph
pub fn shadowed_glyphs(primary: &FontProgram, secondary: &FontProgram) -> GlyphSet {
    let owned: BTreeSet<u32> = primary
        .mappings()
        .into_iter()
        .filter(|&(_, gid)| primary.glyph(gid).is_some_and(|g| g.is_meaningful()))
        .map(|(cp, _)| cp)
        .collect();

    secondary
        .mappings()
        .into_iter()
        .filter(|(cp, _)| owned.contains(cp))
        .map(|(_, gid)| gid)
        .collect()
}

/// What the resolver cleared from the secondary
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ConflictReport {
    pub deny_listed: GlyphSet,
    pub shadowed: GlyphSet,
}

/// Run both phases against the secondary.
pub fn resolve_conflicts(primary: &FontProgram, secondary: &mut FontProgram) -> ConflictReport {
    let deny_listed = deny_listed_glyphs(secondary);
    secondary.clear_glyphs(&deny_listed);
    debug!("Cleared {} deny-listed glyphs", deny_listed.len());

    let shadowed = shadowed_glyphs(primary, secondary);
    secondary.clear_glyphs(&shadowed);
    info!(
        "Resolved conflicts: {} deny-listed, {} shadowed by the primary",
        deny_listed.len(),
        shadowed.len()
    );

    ConflictReport {
        deny_listed,
        shadowed,
    }
}
