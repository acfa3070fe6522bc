//! Font metrics and naming data
//!
//! This module contains the font-level scalars the pipeline edits: the em
//! split, hhea/post metrics and the name entries. The OS/2 and head tables
//! are carried as owned `write-fonts` tables so that every field we do not
//! touch survives the round trip unchanged.

use std::collections::BTreeMap;
use write_fonts::tables::{head::Head, os2::Os2};

/// Name IDs the pipeline reads or writes
pub mod name_id {
    pub const COPYRIGHT: u16 = 0;
    pub const FAMILY: u16 = 1;
    pub const SUBFAMILY: u16 = 2;
    pub const UNIQUE_ID: u16 = 3;
    pub const FULL_NAME: u16 = 4;
    pub const VERSION: u16 = 5;
    pub const POSTSCRIPT_NAME: u16 = 6;
    pub const LICENSE: u16 = 13;
    pub const LICENSE_URL: u16 = 14;
}

/// Font information
#[derive(Clone, Debug, Default)]
pub struct FontInfo {
    pub units_per_em: u16,
    pub metrics: FontMetrics,
    /// English (Windows, US) name entries keyed by name ID
    pub names: BTreeMap<u16, String>,
    pub head: Head,
    pub os2: Os2,
}

/// Font metrics for spacing and positioning
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FontMetrics {
    /// Em split above the baseline; `ascent + descent == units_per_em`
    pub ascent: i32,
    /// Em split below the baseline, positive
    pub descent: i32,
    pub hhea_ascender: i32,
    pub hhea_descender: i32,
    pub hhea_line_gap: i32,
    pub italic_angle: f64,
    pub underline_position: i32,
    pub underline_thickness: i32,
    pub is_fixed_pitch: bool,
}

impl FontInfo {
    pub fn family_name(&self) -> &str {
        self.names
            .get(&name_id::FAMILY)
            .map(String::as_str)
            .unwrap_or("Untitled")
    }

    pub fn style_name(&self) -> &str {
        self.names
            .get(&name_id::SUBFAMILY)
            .map(String::as_str)
            .unwrap_or("Regular")
    }

    /// Get a display name combining family and style names
    pub fn get_display_name(&self) -> String {
        format!("{} {}", self.family_name(), self.style_name())
    }

    pub fn set_name(&mut self, id: u16, value: impl Into<String>) {
        self.names.insert(id, value.into());
    }

    /// Scale every design-unit value by `factor` and adopt `new_upm`.
    pub fn rescale(&mut self, new_upm: u16, factor: f64) {
        self.units_per_em = new_upm;
        self.head.units_per_em = new_upm;
        self.metrics.rescale(factor);

        let os2 = &mut self.os2;
        for value in [
            &mut os2.x_avg_char_width,
            &mut os2.y_subscript_x_size,
            &mut os2.y_subscript_y_size,
            &mut os2.y_subscript_x_offset,
            &mut os2.y_subscript_y_offset,
            &mut os2.y_superscript_x_size,
            &mut os2.y_superscript_y_size,
            &mut os2.y_superscript_x_offset,
            &mut os2.y_superscript_y_offset,
            &mut os2.y_strikeout_size,
            &mut os2.y_strikeout_position,
            &mut os2.s_typo_ascender,
            &mut os2.s_typo_descender,
            &mut os2.s_typo_line_gap,
        ] {
            *value = scale_i16(*value, factor);
        }
        os2.us_win_ascent = scale_u16(os2.us_win_ascent, factor);
        os2.us_win_descent = scale_u16(os2.us_win_descent, factor);
        if let Some(x_height) = os2.sx_height.as_mut() {
            *x_height = scale_i16(*x_height, factor);
        }
        if let Some(cap_height) = os2.s_cap_height.as_mut() {
            *cap_height = scale_i16(*cap_height, factor);
        }
    }
}

impl FontMetrics {
    fn rescale(&mut self, factor: f64) {
        let scale = |v: i32| (v as f64 * factor).round() as i32;
        self.ascent = scale(self.ascent);
        self.descent = scale(self.descent);
        self.hhea_ascender = scale(self.hhea_ascender);
        self.hhea_descender = scale(self.hhea_descender);
        self.hhea_line_gap = scale(self.hhea_line_gap);
        self.underline_position = scale(self.underline_position);
        self.underline_thickness = scale(self.underline_thickness);
    }
}

fn scale_i16(value: i16, factor: f64) -> i16 {
    (value as f64 * factor)
        .round()
        .clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

fn scale_u16(value: u16, factor: f64) -> u16 {
    (value as f64 * factor).round().clamp(0.0, u16::MAX as f64) as u16
}
