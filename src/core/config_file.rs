//! Build configuration file handling
//!
//! Manages settings from `build.json`: source and build directories, file
//! name prefixes, naming tokens and the width constants of the merged
//! family.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "build.json";

/// Build configuration
///
/// Every field without a `serde(default)` is required; a missing key is a
/// configuration error and stops the run before any font is opened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildConfig {
    /// Version string written to the name table
    pub version: String,
    /// Base family name of the merged fonts
    pub font_name: String,
    /// File name prefix of the CJK sources
    pub primary_prefix: String,
    /// File name prefix of the Latin sources
    pub secondary_prefix: String,
    pub source_fonts_dir: PathBuf,
    pub build_fonts_dir: PathBuf,
    /// OS/2 vendor id, up to four characters
    pub vendor_name: String,
    /// Prefix of the composed, not yet patched, binaries
    pub engine_prefix: String,
    /// Prefix of table documents and patched intermediates
    pub codec_prefix: String,
    /// Single-glyph font supplying the visible ideographic space
    pub ideographic_space: String,
    pub half_width_str: String,
    pub slashed_zero_str: String,
    pub invisible_zenkaku_space_str: String,
    #[serde(default = "default_nerd_fonts_str")]
    pub nerd_fonts_str: String,
    /// Icon font merged in with `--nerd-fonts`
    #[serde(default = "default_nerd_font")]
    pub nerd_font: String,
    /// `code,name,description` list appended to the cmap
    #[serde(default = "default_supplemental_cmap")]
    pub supplemental_cmap: PathBuf,
    pub em_ascent: u16,
    pub em_descent: u16,
    pub half_width_12: u16,
    pub full_width_35: u16,
}

fn default_nerd_fonts_str() -> String {
    "NF".to_string()
}

fn default_nerd_font() -> String {
    "SymbolsNerdFontMono-Regular.ttf".to_string()
}

fn default_supplemental_cmap() -> PathBuf {
    PathBuf::from("add_cmap.csv")
}

impl BuildConfig {
    /// Get the path to the user-level config file
    pub fn user_config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")));
        config_dir.join("fontmerge").join(CONFIG_FILE_NAME)
    }

    /// Resolve which file to load: an explicit path wins, then the working
    /// directory, then the user config directory.
    pub fn locate(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return local;
        }
        let user = Self::user_config_path();
        if user.exists() {
            return user;
        }
        local
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read build config {}", path.display()))?;
        let config = Self::from_json(&contents)
            .with_context(|| format!("Invalid build config {}", path.display()))?;
        debug!("Loaded build config from {:?}", path);
        Ok(config)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.font_name.trim().is_empty() {
            anyhow::bail!("font_name must not be empty");
        }
        if self.em_ascent > i16::MAX as u16 || self.em_descent > i16::MAX as u16 {
            anyhow::bail!("em_ascent and em_descent must each fit a signed 16-bit metric");
        }
        if self.em_ascent as u32 + self.em_descent as u32 > u16::MAX as u32 {
            anyhow::bail!("em_ascent + em_descent does not fit a units-per-em value");
        }
        if self.half_width_12 == 0 || self.full_width_35 == 0 {
            anyhow::bail!("width constants must be positive");
        }
        Ok(())
    }

    /// Units per em every contributor is normalized to
    pub fn units_per_em(&self) -> u16 {
        self.em_ascent + self.em_descent
    }

    /// `hhea`/win ascent: the em ascent plus renderer padding
    pub fn font_ascent(&self) -> i32 {
        self.em_ascent as i32 + 120
    }

    /// `hhea`/win descent: the em descent plus renderer padding
    pub fn font_descent(&self) -> i32 {
        self.em_descent as i32 + 250
    }

    pub fn primary_source(&self, style: &str) -> PathBuf {
        self.source_fonts_dir
            .join(format!("{}{}.ttf", self.primary_prefix, style))
    }

    pub fn secondary_source(&self, style: &str) -> PathBuf {
        self.source_fonts_dir
            .join(format!("{}{}.ttf", self.secondary_prefix, style))
    }

    pub fn ideographic_space_source(&self) -> PathBuf {
        self.source_fonts_dir.join(&self.ideographic_space)
    }

    pub fn nerd_font_source(&self) -> PathBuf {
        self.source_fonts_dir.join(&self.nerd_font)
    }

    /// Composed binary written by the merge pipeline
    pub fn composed_output(&self, variant: &str, style: &str) -> PathBuf {
        self.build_fonts_dir.join(format!(
            "{}{}{}-{}.ttf",
            self.engine_prefix, self.font_name, variant, style
        ))
    }

    /// Final, patched binary
    pub fn final_output(&self, variant: &str, style: &str) -> PathBuf {
        self.build_fonts_dir
            .join(format!("{}{}-{}.ttf", self.font_name, variant, style))
    }
}
