//! Supplemental cmap entries
//!
//! A plain-text list of extra code point to glyph name mappings, one
//! `code,name,description` entry per line. Lines starting with `#` and
//! blank lines are skipped. Codes are hexadecimal with a `0x` prefix or
//! decimal.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplementalEntry {
    pub code: u32,
    pub name: String,
}

pub fn parse_supplemental(text: &str) -> Result<Vec<SupplementalEntry>> {
    let mut entries = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split(',');
        let code = fields.next().map(str::trim).unwrap_or_default();
        let name = fields
            .next()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| anyhow!("line {}: missing glyph name", index + 1))?;
        let code = parse_code(code).with_context(|| format!("line {}: bad code '{code}'", index + 1))?;
        entries.push(SupplementalEntry {
            code,
            name: name.to_string(),
        });
    }
    Ok(entries)
}

pub fn parse_code(code: &str) -> Result<u32> {
    let parsed = match code.strip_prefix("0x").or_else(|| code.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16)?,
        None => code.parse()?,
    };
    Ok(parsed)
}

/// Load the entry list. A missing file yields no entries.
pub fn load_supplemental(path: &Path) -> Result<Vec<SupplementalEntry>> {
    if !path.exists() {
        warn!("No supplemental cmap at {}", path.display());
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read supplemental cmap {}", path.display()))?;
    let entries = parse_supplemental(&text)
        .with_context(|| format!("Invalid supplemental cmap {}", path.display()))?;
    debug!("Loaded {} supplemental cmap entries", entries.len());
    Ok(entries)
}
