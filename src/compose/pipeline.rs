//! Per-style composition pipeline
//!
//! Opens both contributors of a style, runs every composition stage in its
//! fixed order and writes the composed binary to the build directory. The
//! four styles run one after another and share nothing but the caches on
//! [`PipelineContext`].

use crate::compose::conflict::resolve_conflicts;
use crate::compose::context::PipelineContext;
use crate::compose::flatten::flatten;
use crate::compose::icons::clear_icon_codepoints;
use crate::compose::lookups::strip_lookups;
use crate::compose::merge::merge_into;
use crate::compose::metadata::edit_meta_data;
use crate::compose::policy::{StyleSpec, STYLES};
use crate::compose::transform::{
    italicize, slashed_zero, transform_half_width, visualize_zenkaku_space, width_500_to_600,
};
use crate::data::sfnt::save_font;
use crate::font_source::loader::{open_contributors, Contributors, DIGIT_ZERO};
use crate::font_source::program::FontProgram;
use crate::geometry::WidthClass;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Wipe and recreate the build directory.
pub fn prepare_build_dir(ctx: &PipelineContext) -> Result<()> {
    let dir = &ctx.config.build_fonts_dir;
    if dir.exists() {
        fs::remove_dir_all(dir)
            .with_context(|| format!("Failed to clear build directory {}", dir.display()))?;
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create build directory {}", dir.display()))?;
    debug!("Prepared build directory {}", dir.display());
    Ok(())
}

/// Compose one style and write its unpatched binary.
pub fn generate_style(ctx: &PipelineContext, style: &StyleSpec) -> Result<PathBuf> {
    info!("=== Generate {} style ===", style.merged);
    let config = &ctx.config;
    let policy = ctx.policy.for_style(style.italic);
    let grid = ctx.grid();

    let Contributors {
        mut primary,
        mut secondary,
        secondary_zero_width,
    } = open_contributors(config, style.primary, style.secondary)
        .with_context(|| format!("Cannot compose style '{}'", style.merged))?;

    resolve_conflicts(&primary, &mut secondary);
    flatten(&mut primary)?;

    if policy.italic {
        italicize(&mut primary);
    }
    if !policy.invisible_zenkaku_space {
        visualize_zenkaku_space(&mut primary, config)?;
    }
    if policy.half_width {
        transform_half_width(&mut primary, &mut secondary, secondary_zero_width, &grid)?;
    } else {
        width_500_to_600(&mut primary, &grid);
    }

    let off_grid = primary
        .glyphs()
        .iter()
        .filter(|g| g.is_meaningful() && grid.classify(g.advance_width, policy.half_width).is_none())
        .count();
    debug!("{off_grid} primary glyphs are off the width grid");

    strip_lookups(&mut primary);

    if policy.nerd_fonts {
        graft_icons(ctx, &mut primary, &mut secondary)?;
    }

    merge_into(&mut secondary, &primary)?;

    // after the merge, so U+0030 is slashed whichever source supplied it
    if policy.slashed_zero {
        slashed_zero(&mut secondary);
    }

    let variant = policy.variant(config);
    edit_meta_data(&mut secondary, config, style.merged, &variant);
    let output = config.composed_output(&variant, style.merged);
    save_font(&secondary, &output)?;
    info!("Wrote {}", output.display());
    Ok(output)
}

/// Fit the cached icons to this style's half cell and merge them into the
/// primary, clearing whatever either contributor had at those code points.
pub fn graft_icons(
    ctx: &PipelineContext,
    primary: &mut FontProgram,
    secondary: &mut FontProgram,
) -> Result<()> {
    let icons = ctx.icon_font()?;
    let fallback = if ctx.policy.half_width {
        WidthClass::Half12
    } else {
        WidthClass::Full35
    };
    let half_width = secondary
        .glyph_at(DIGIT_ZERO)
        .and_then(|gid| secondary.glyph(gid))
        .map(|g| g.advance_width)
        .filter(|&w| w > 0)
        .unwrap_or_else(|| ctx.grid().width(fallback));

    let codepoints = icons.codepoints();
    let cleared = clear_icon_codepoints(primary, &codepoints)
        + clear_icon_codepoints(secondary, &codepoints);
    debug!("Cleared {cleared} glyphs at icon code points");

    let shaped = icons.shaped(half_width);
    merge_into(primary, &shaped)?;
    info!("Grafted {} icons at width {half_width}", codepoints.len());
    Ok(())
}

/// Compose every style in build order.
pub fn compose_all(ctx: &PipelineContext) -> Result<Vec<PathBuf>> {
    prepare_build_dir(ctx)?;
    STYLES
        .iter()
        .map(|style| generate_style(ctx, style))
        .collect()
}
