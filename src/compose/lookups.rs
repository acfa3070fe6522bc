//! Substitution and positioning table stripping

use crate::font_source::program::FontProgram;
use tracing::info;

/// Drop every GSUB and GPOS table from the contributor being merged in.
///
/// Rules compiled against its own glyph set would otherwise fire on the
/// receiver's glyphs at the same code points.
pub fn strip_lookups(program: &mut FontProgram) -> usize {
    let tables = program.lookups.len();
    let removed = program.strip_lookups();
    if tables > 0 {
        info!("Removed {removed} lookups from {tables} layout tables");
    }
    removed
}
