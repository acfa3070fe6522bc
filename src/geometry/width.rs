//! Canonical advance-width classes
//!
//! Width transforms only ever move a glyph from one class to another. A
//! glyph whose advance is not in any class is left where it is.

use crate::core::config_file::BuildConfig;

/// A canonical advance width bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidthClass {
    /// Half an em, the narrow cell of both sources
    Half,
    /// A full em, the CJK cell of the default family
    Em,
    /// The 3:5 grid: Latin cell of the default family
    Full35,
    /// The 1:2 grid: Latin cell of the half-width family
    Half12,
    /// The 1:2 grid: CJK cell of the half-width family
    Full12,
}

/// Concrete widths of every class for one configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidthGrid {
    pub em: u16,
    pub full_35: u16,
    pub half_12: u16,
}

impl WidthGrid {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            em: config.units_per_em(),
            full_35: config.full_width_35,
            half_12: config.half_width_12,
        }
    }

    pub fn width(&self, class: WidthClass) -> u16 {
        match class {
            WidthClass::Half => self.em / 2,
            WidthClass::Em => self.em,
            WidthClass::Full35 => self.full_35,
            WidthClass::Half12 => self.half_12,
            WidthClass::Full12 => self.half_12.saturating_mul(2),
        }
    }

    /// Classes a finished glyph may belong to
    pub fn targets(half_width: bool) -> &'static [WidthClass] {
        if half_width {
            &[WidthClass::Half12, WidthClass::Full12]
        } else {
            &[WidthClass::Full35, WidthClass::Em]
        }
    }

    /// The target class an advance already sits in, if any
    pub fn classify(&self, advance: u16, half_width: bool) -> Option<WidthClass> {
        Self::targets(half_width)
            .iter()
            .copied()
            .find(|&class| self.width(class) == advance)
    }
}
