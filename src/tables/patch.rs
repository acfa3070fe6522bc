//! Table patching of the composed binaries
//!
//! Runs after every style has been composed. For each style the OS/2 and
//! post tables are dumped, edited and applied back, then the run-wide cmap
//! document is applied on top, producing the final binary.

use crate::compose::context::PipelineContext;
use crate::compose::policy::STYLES;
use crate::geometry::{WidthClass, WidthGrid};
use crate::tables::artifacts::{find_artifact, remove_intermediates, remove_prefixed};
use crate::tables::codec::{self, format_bits, map_entry, CMAP_FORMAT_12, CMAP_FORMAT_4};
use crate::tables::document::TableDocument;
use crate::tables::supplemental::{load_supplemental, SupplementalEntry};
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// fsSelection bit patterns by style
pub const FS_SELECTION: [(&str, &str); 4] = [
    ("Regular", "00000001 01000000"),
    ("RegularItalic", "00000001 00000001"),
    ("Bold", "00000001 00100000"),
    ("BoldItalic", "00000001 00100001"),
];

pub fn fs_selection(style: &str) -> Option<&'static str> {
    FS_SELECTION
        .iter()
        .find(|(name, _)| *name == style)
        .map(|(_, bits)| *bits)
}

/// PANOSE classification of a style: a monospaced sans serif whose
/// proportion reads as monospaced only on the 1:2 grid.
pub fn panose(style: &str, half_width: bool) -> [u8; 10] {
    // RegularItalic is matched by its full name: an italic of the regular
    // weight keeps weight class 5, it is not a bold
    let weight = if matches!(style, "Regular" | "RegularItalic") {
        5
    } else {
        8
    };
    let proportion = if half_width { 9 } else { 3 };
    [2, 11, weight, proportion, 2, 2, 3, 2, 2, 7]
}

/// Set xAvgCharWidth, fsSelection and PANOSE for one style.
pub fn fix_os2_table(doc: &mut TableDocument, style: &str, half_width: bool, grid: &WidthGrid) {
    let avg = if half_width {
        grid.width(WidthClass::Half12)
    } else {
        grid.width(WidthClass::Full35)
    };
    doc.set_value("xAvgCharWidth", avg);

    match fs_selection(style) {
        Some(bits) => {
            doc.set_value("fsSelection", bits);
        }
        None => warn!("No fsSelection pattern for style '{style}'"),
    }

    for (field, value) in codec::PANOSE_FIELDS.iter().zip(panose(style, half_width)) {
        doc.set_value(field, value);
    }
}

/// The family is never flagged as fixed pitch.
pub fn fix_post_table(doc: &mut TableDocument) {
    doc.set_value("isFixedPitch", 0);
}

/// Append every supplemental entry to both Unicode subtable documents.
pub fn fix_cmap_table(doc: &mut TableDocument, entries: &[SupplementalEntry]) {
    for entry in entries {
        let node = map_entry(entry.code, &entry.name);
        doc.append(CMAP_FORMAT_4, &node);
        doc.append(CMAP_FORMAT_12, &node);
    }
}

/// Patch one style. A style whose composed binary cannot be found uniquely
/// is reported and skipped; `Ok(None)` is returned for it.
pub fn patch_style(ctx: &PipelineContext, style: &str) -> Result<Option<PathBuf>> {
    let config = &ctx.config;
    let build = &config.build_fonts_dir;
    let input_prefix = format!("{}{}", config.engine_prefix, config.font_name);

    let artifact = match find_artifact(build, &input_prefix, style) {
        Ok(artifact) => artifact,
        Err(err) => {
            error!("{err}");
            return Ok(None);
        }
    };
    let variant = artifact.variant.as_str();
    let half_width = variant.contains(config.half_width_str.as_str());
    let stem = format!("{}{}{}-{}", config.codec_prefix, config.font_name, variant, style);
    let doc_path = build.join(format!("{stem}.json"));
    let cmap_path = build.join(format!("{stem}_cmap.json"));
    let os2_post_path = build.join(format!("{stem}_os2_post.ttf"));
    let patched_path = build.join(format!("{stem}_os2_post_cmap.ttf"));

    // every codec file lives inside the closure so the cleanup below runs on
    // all exit paths
    let result = (|| -> Result<PathBuf> {
        let mut doc = codec::dump_os2_post(&artifact.path)?;
        fix_os2_table(&mut doc, style, half_width, &ctx.grid());
        fix_post_table(&mut doc);
        doc.save(&doc_path)?;

        let cmap_doc = ctx.cmap_document(|| {
            let entries = load_supplemental(&config.supplemental_cmap)?;
            let mut cmap_doc = codec::dump_cmap(&artifact.path)?;
            fix_cmap_table(&mut cmap_doc, &entries);
            info!("Built cmap document with {} supplemental entries", entries.len());
            Ok(cmap_doc)
        })?;
        cmap_doc.save(&cmap_path)?;

        codec::apply_os2_post(&TableDocument::load(&doc_path)?, &artifact.path, &os2_post_path)?;
        codec::apply_cmap(&TableDocument::load(&cmap_path)?, &os2_post_path, &patched_path)?;
        let output = config.final_output(variant, style);
        fs::rename(&patched_path, &output)
            .with_context(|| format!("Failed to move patched font to {}", output.display()))?;
        Ok(output)
    })();
    remove_intermediates([
        doc_path.as_path(),
        cmap_path.as_path(),
        os2_post_path.as_path(),
        patched_path.as_path(),
    ]);

    let output = result?;
    info!(
        "Patched {} (fsSelection {}, half width: {half_width})",
        output.display(),
        fs_selection(style).unwrap_or("unchanged")
    );
    Ok(Some(output))
}

/// Patch every style. Codec files are cleared on every exit path; the
/// composed binaries only once every style is patched.
pub fn patch_all(ctx: &PipelineContext) -> Result<Vec<PathBuf>> {
    let config = &ctx.config;
    let build = &config.build_fonts_dir;

    let result = (|| -> Result<Vec<PathBuf>> {
        let mut outputs = Vec::new();
        for style in STYLES.iter().map(|s| s.merged) {
            if let Some(path) = patch_style(ctx, style)? {
                outputs.push(path);
            }
        }
        Ok(outputs)
    })();

    remove_prefixed(build, &format!("{}{}", config.codec_prefix, config.font_name))?;
    let outputs = result?;
    remove_prefixed(build, &format!("{}{}", config.engine_prefix, config.font_name))?;
    Ok(outputs)
}

/// Current fsSelection of a dumped document, for diagnostics
pub fn current_fs_selection(doc: &TableDocument) -> Option<String> {
    doc.find("fsSelection")
        .and_then(|node| node.value())
        .and_then(|bits| codec::parse_bits(bits).ok())
        .map(format_bits)
}
