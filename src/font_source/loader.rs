//! Opening the contributing font sources
//!
//! Both contributors of a style are opened together. The secondary (Latin)
//! source is rescaled to the configured em; the primary (CJK) source is
//! expected to already use it.

use crate::core::config_file::BuildConfig;
use crate::data::sfnt;
use crate::font_source::program::{FontProgram, LookupKind};
use anyhow::{Context, Result};
use kurbo::Affine;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// Code point of the digit zero, the width reference of the Latin source
pub const DIGIT_ZERO: u32 = 0x0030;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{role} source for style '{style}' not found at {path}")]
    Missing {
        role: &'static str,
        style: String,
        path: PathBuf,
    },
}

/// The two opened contributors of one style
#[derive(Debug)]
pub struct Contributors {
    /// CJK source; wins code point conflicts and is merged into the secondary
    pub primary: FontProgram,
    /// Latin source; receives the merge
    pub secondary: FontProgram,
    /// Advance of the secondary's digit zero, captured before any glyph is
    /// cleared
    pub secondary_zero_width: Option<u16>,
}

/// Open both contributors for a style pair.
pub fn open_contributors(
    config: &BuildConfig,
    primary_style: &str,
    secondary_style: &str,
) -> Result<Contributors> {
    let primary = open_source(config.primary_source(primary_style), "primary", primary_style)?;
    let mut secondary = open_source(
        config.secondary_source(secondary_style),
        "secondary",
        secondary_style,
    )?;

    normalize_units_per_em(&mut secondary, config.units_per_em());
    if primary.info.units_per_em != config.units_per_em() {
        warn!(
            "Primary source uses {} units per em, expected {}",
            primary.info.units_per_em,
            config.units_per_em()
        );
    }

    let secondary_zero_width = secondary
        .glyph_at(DIGIT_ZERO)
        .and_then(|gid| secondary.glyph(gid))
        .map(|g| g.advance_width);

    Ok(Contributors {
        primary,
        secondary,
        secondary_zero_width,
    })
}

/// Open any single font resource, failing with the role and style in the
/// error.
pub fn open_source(path: PathBuf, role: &'static str, style: &str) -> Result<FontProgram> {
    if !path.exists() {
        return Err(SourceError::Missing {
            role,
            style: style.to_string(),
            path,
        }
        .into());
    }
    let program = sfnt::load_font(&path)
        .with_context(|| format!("Failed to open {role} source for style '{style}'"))?;
    info!(
        "Opened {role} source {} ({} glyphs)",
        path.display(),
        program.glyph_count()
    );
    Ok(program)
}

/// Rescale a font program to `target` units per em: outlines, advances and
/// every font-level metric.
pub fn normalize_units_per_em(program: &mut FontProgram, target: u16) {
    let current = program.info.units_per_em;
    if current == target || current == 0 {
        return;
    }
    let factor = target as f64 / current as f64;
    let affine = Affine::scale(factor);
    for glyph in program.glyphs_mut() {
        glyph.transform(affine);
        glyph.advance_width = (glyph.advance_width as f64 * factor).round() as u16;
    }
    program.info.rescale(target, factor);

    if program
        .lookups
        .iter()
        .any(|l| l.kind == LookupKind::Positioning)
    {
        warn!("Positioning values are kept in the original {current} units per em");
    }
    info!("Rescaled font from {current} to {target} units per em");
}
