//! Run-wide pipeline context
//!
//! Holds the configuration, the composition policy and the two caches shared
//! by every style of a run. Each cache is filled on first use and then never
//! recomputed for the rest of the run, even if the file behind it changes.

use crate::compose::icons::IconFont;
use crate::compose::policy::CompositionPolicy;
use crate::core::config_file::BuildConfig;
use crate::geometry::WidthGrid;
use crate::tables::document::TableDocument;
use anyhow::Result;
use std::cell::OnceCell;

#[derive(Debug)]
pub struct PipelineContext {
    pub config: BuildConfig,
    pub policy: CompositionPolicy,
    icon_font: OnceCell<IconFont>,
    cmap_document: OnceCell<TableDocument>,
}

impl PipelineContext {
    pub fn new(config: BuildConfig, policy: CompositionPolicy) -> Self {
        Self {
            config,
            policy,
            icon_font: OnceCell::new(),
            cmap_document: OnceCell::new(),
        }
    }

    pub fn grid(&self) -> WidthGrid {
        WidthGrid::from_config(&self.config)
    }

    /// Variant token string of this run
    pub fn variant(&self) -> String {
        self.policy.variant(&self.config)
    }

    /// The prepared icon font, loaded on first use
    pub fn icon_font(&self) -> Result<&IconFont> {
        cached(&self.icon_font, || IconFont::load(&self.config))
    }

    /// The patched cmap document, built by `init` on first use
    pub fn cmap_document(
        &self,
        init: impl FnOnce() -> Result<TableDocument>,
    ) -> Result<&TableDocument> {
        cached(&self.cmap_document, init)
    }

    pub fn has_cmap_document(&self) -> bool {
        self.cmap_document.get().is_some()
    }
}

/// Fill `cell` once; a failed `init` leaves it empty.
fn cached<T>(cell: &OnceCell<T>, init: impl FnOnce() -> Result<T>) -> Result<&T> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    let value = init()?;
    Ok(cell.get_or_init(|| value))
}
