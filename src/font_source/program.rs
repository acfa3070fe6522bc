//! The in-memory font program
//!
//! A [`FontProgram`] is what every pipeline stage reads and mutates: an
//! ordered list of glyphs, a code point map, font-level metrics and any
//! substitution/positioning tables the source carried.
//!
//! Glyph ids are indices into the glyph list and are stable for the life of
//! the program. Deleting a glyph clears its slot instead of removing it, so
//! the raw GSUB/GPOS tables of a receiving font keep pointing at the right
//! glyphs.

use crate::font_source::data::OutlineData;
use crate::font_source::metrics::FontInfo;
use kurbo::Affine;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

/// Index of a glyph inside a [`FontProgram`]
pub type GlyphIndex = usize;

/// An explicit set of glyph ids, returned by selection functions
pub type GlyphSet = BTreeSet<GlyphIndex>;

/// A code point reaching a glyph through a secondary mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AltMapping {
    pub codepoint: u32,
    /// Variation selector, `None` for a plain alias
    pub selector: Option<u32>,
}

impl AltMapping {
    pub fn plain(codepoint: u32) -> Self {
        Self {
            codepoint,
            selector: None,
        }
    }
}

/// A single glyph
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    name: String,
    pub outline: OutlineData,
    pub advance_width: u16,
    pub alternates: Vec<AltMapping>,
}

impl Glyph {
    pub fn new(name: impl Into<String>, advance_width: u16, outline: OutlineData) -> Self {
        Self {
            name: name.into(),
            outline,
            advance_width,
            alternates: Vec::new(),
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, 0, OutlineData::default())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the glyph would produce any output: visible contours or a
    /// non-default advance.
    pub fn is_meaningful(&self) -> bool {
        !self.outline.is_empty() || self.advance_width != 0
    }

    /// Apply a transform to the outline; the advance is left alone.
    pub fn transform(&mut self, affine: Affine) {
        self.outline.apply_affine(affine);
    }
}

/// Which layout table a lookup list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Substitution,
    Positioning,
}

impl LookupKind {
    pub fn tag(self) -> [u8; 4] {
        match self {
            LookupKind::Substitution => *b"GSUB",
            LookupKind::Positioning => *b"GPOS",
        }
    }
}

/// A substitution or positioning table kept as raw bytes
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTable {
    pub kind: LookupKind,
    pub lookup_count: u16,
    pub data: Vec<u8>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ProgramError {
    #[error("glyph name '{0}' is already in use")]
    DuplicateName(String),
    #[error("glyph id {0} is out of range")]
    NoSuchGlyph(GlyphIndex),
}

/// A named collection of glyphs plus font-level data
#[derive(Debug, Clone, Default)]
pub struct FontProgram {
    pub info: FontInfo,
    glyphs: Vec<Glyph>,
    name_index: HashMap<String, GlyphIndex>,
    cmap: BTreeMap<u32, GlyphIndex>,
    pub lookups: Vec<LookupTable>,
    /// Tables passed through to the output unchanged
    pub extra_tables: Vec<([u8; 4], Vec<u8>)>,
}

impl FontProgram {
    pub fn new(info: FontInfo) -> Self {
        Self {
            info,
            ..Default::default()
        }
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn glyph(&self, gid: GlyphIndex) -> Option<&Glyph> {
        self.glyphs.get(gid)
    }

    pub fn glyph_mut(&mut self, gid: GlyphIndex) -> Option<&mut Glyph> {
        self.glyphs.get_mut(gid)
    }

    pub fn glyphs_mut(&mut self) -> impl Iterator<Item = &mut Glyph> {
        self.glyphs.iter_mut()
    }

    pub fn contains_glyph(&self, name: &str) -> bool {
        self.name_index.contains_key(name)
    }

    pub fn glyph_by_name(&self, name: &str) -> Option<GlyphIndex> {
        self.name_index.get(name).copied()
    }

    /// Append a glyph, failing if its name is taken.
    pub fn add_glyph(&mut self, glyph: Glyph) -> Result<GlyphIndex, ProgramError> {
        if self.name_index.contains_key(glyph.name()) {
            return Err(ProgramError::DuplicateName(glyph.name));
        }
        let gid = self.glyphs.len();
        self.name_index.insert(glyph.name.clone(), gid);
        self.glyphs.push(glyph);
        Ok(gid)
    }

    pub fn rename_glyph(&mut self, gid: GlyphIndex, new_name: &str) -> Result<(), ProgramError> {
        if self.name_index.contains_key(new_name) {
            return Err(ProgramError::DuplicateName(new_name.to_string()));
        }
        let glyph = self
            .glyphs
            .get_mut(gid)
            .ok_or(ProgramError::NoSuchGlyph(gid))?;
        self.name_index.remove(&glyph.name);
        glyph.name = new_name.to_string();
        self.name_index.insert(glyph.name.clone(), gid);
        Ok(())
    }

    /// Primary code point map
    pub fn cmap(&self) -> &BTreeMap<u32, GlyphIndex> {
        &self.cmap
    }

    pub fn map_codepoint(&mut self, codepoint: u32, gid: GlyphIndex) -> Result<(), ProgramError> {
        if gid >= self.glyphs.len() {
            return Err(ProgramError::NoSuchGlyph(gid));
        }
        self.cmap.insert(codepoint, gid);
        Ok(())
    }

    pub fn unmap_codepoint(&mut self, codepoint: u32) -> Option<GlyphIndex> {
        self.cmap.remove(&codepoint)
    }

    /// The glyph a code point reaches, through the primary map or an
    /// alternate mapping.
    pub fn glyph_at(&self, codepoint: u32) -> Option<GlyphIndex> {
        self.cmap.get(&codepoint).copied().or_else(|| {
            self.glyphs
                .iter()
                .position(|g| g.alternates.iter().any(|alt| alt.codepoint == codepoint))
        })
    }

    /// Every glyph reachable from `codepoint`, primary and alternate.
    pub fn glyphs_at(&self, codepoint: u32) -> GlyphSet {
        let mut set: GlyphSet = self.cmap.get(&codepoint).copied().into_iter().collect();
        set.extend(
            self.glyphs
                .iter()
                .enumerate()
                .filter(|(_, g)| g.alternates.iter().any(|alt| alt.codepoint == codepoint))
                .map(|(gid, _)| gid),
        );
        set
    }

    /// Primary code points of one glyph
    pub fn codepoints_of(&self, gid: GlyphIndex) -> Vec<u32> {
        self.cmap
            .iter()
            .filter(|(_, &g)| g == gid)
            .map(|(&cp, _)| cp)
            .collect()
    }

    /// Every `(code point, glyph)` pair, primary mappings first. Alternates
    /// carrying a variation selector are not plain mappings and are skipped.
    pub fn mappings(&self) -> Vec<(u32, GlyphIndex)> {
        let mut out: Vec<(u32, GlyphIndex)> = self.cmap.iter().map(|(&cp, &g)| (cp, g)).collect();
        for (gid, glyph) in self.glyphs.iter().enumerate() {
            for alt in glyph.alternates.iter().filter(|alt| alt.selector.is_none()) {
                if !self.cmap.contains_key(&alt.codepoint) {
                    out.push((alt.codepoint, gid));
                }
            }
        }
        out
    }

    /// Clear one glyph: empty outline, zero advance, no code points. The
    /// slot and name stay so glyph ids remain valid.
    pub fn clear_glyph(&mut self, gid: GlyphIndex) -> Option<()> {
        let glyph = self.glyphs.get_mut(gid)?;
        glyph.outline.clear();
        glyph.advance_width = 0;
        glyph.alternates.clear();
        self.cmap.retain(|_, g| *g != gid);
        Some(())
    }

    pub fn clear_glyphs(&mut self, set: &GlyphSet) {
        for &gid in set {
            if let Some(glyph) = self.glyphs.get_mut(gid) {
                glyph.outline.clear();
                glyph.advance_width = 0;
                glyph.alternates.clear();
            }
        }
        self.cmap.retain(|_, g| !set.contains(g));
    }

    /// Clear whatever glyph sits at `codepoint`. Returns `None` when nothing
    /// is encoded there.
    pub fn clear_codepoint(&mut self, codepoint: u32) -> Option<GlyphSet> {
        let set = self.glyphs_at(codepoint);
        if set.is_empty() {
            return None;
        }
        self.clear_glyphs(&set);
        Some(set)
    }

    /// Drop every substitution and positioning table.
    pub fn strip_lookups(&mut self) -> usize {
        let removed = self.lookups.iter().map(|l| l.lookup_count as usize).sum();
        self.lookups.clear();
        removed
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.iter().map(|l| l.lookup_count as usize).sum()
    }

    /// Replace the glyph list and code point map in one step.
    pub(crate) fn replace_contents(
        &mut self,
        glyphs: Vec<Glyph>,
        cmap: BTreeMap<u32, GlyphIndex>,
    ) -> Result<(), ProgramError> {
        let mut name_index = HashMap::with_capacity(glyphs.len());
        for (gid, glyph) in glyphs.iter().enumerate() {
            if name_index.insert(glyph.name.clone(), gid).is_some() {
                return Err(ProgramError::DuplicateName(glyph.name.clone()));
            }
        }
        if let Some((_, &gid)) = cmap.iter().find(|(_, &g)| g >= glyphs.len()) {
            return Err(ProgramError::NoSuchGlyph(gid));
        }
        self.glyphs = glyphs;
        self.name_index = name_index;
        self.cmap = cmap;
        Ok(())
    }
}
