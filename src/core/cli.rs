//! Command line interface for fontmerge
//!
//! Handles parsing command line arguments and provides validation for user
//! inputs. Every composition flag is independent; any combination is valid.

use crate::compose::policy::CompositionPolicy;
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

/// fontmerge CLI arguments
///
/// Examples:
///   fontmerge                               # Default family
///   fontmerge --half-width                  # 1:2 grid family
///   fontmerge --slashed-zero --nerd-fonts   # Slashed zero with icons
///   fontmerge --config ./build.json         # Explicit build configuration
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    name = "fontmerge",
    version,
    about = "Merge a CJK font and a Latin monospace font into one family",
    long_about = "fontmerge composes a CJK source and a Latin monospace source into a merged font family. It resolves glyph conflicts, aligns both sources on a shared width grid, optionally grafts icon glyphs, and patches the OS/2, post and cmap tables of the result."
)]
pub struct CliArgs {
    /// Replace the digit zero with its slashed variant
    #[clap(
        long = "slashed-zero",
        help = "Use the slashed zero",
        long_help = "Copy the outline of the Latin source's slashed zero variant onto the digit zero. The family name gains the slashed-zero token."
    )]
    pub slashed_zero: bool,

    /// Keep the ideographic space invisible
    #[clap(
        long = "invisible-zenkaku-space",
        help = "Keep the ideographic space invisible",
        long_help = "Do not replace the ideographic space (U+3000) with the visible glyph from the auxiliary resource. The family name gains the invisible-zenkaku-space token."
    )]
    pub invisible_zenkaku_space: bool,

    /// Build the 1:2 width family
    #[clap(
        long = "half-width",
        help = "Align Latin and CJK glyphs on a 1:2 grid",
        long_help = "Scale the Latin glyphs into the configured half width and re-centre the CJK glyphs onto twice that width, instead of the default 3:5 grid. The family name gains the half-width token."
    )]
    pub half_width: bool,

    /// Graft the icon font
    #[clap(
        long = "nerd-fonts",
        help = "Merge in the icon font",
        long_help = "Merge the glyphs of the configured icon font into the family, fitted to the half-width cell. Icon glyphs take priority over anything already at their code points. The family name gains the nerd-fonts token."
    )]
    pub nerd_fonts: bool,

    /// Path to the build configuration
    #[clap(
        long = "config",
        short = 'c',
        help = "Build configuration file",
        long_help = "Path to the JSON build configuration. Defaults to ./build.json, then build.json in the user config directory."
    )]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    /// Validate the CLI arguments after parsing
    pub fn validate(&self) -> Result<(), String> {
        if let Some(path) = &self.config {
            if !path.is_file() {
                return Err(format!(
                    "Config file does not exist: {}\nMake sure the path is correct and the file exists.",
                    path.display()
                ));
            }
        }
        Ok(())
    }

    /// Composition policy selected by the flags; italic is set per style
    pub fn policy(&self) -> CompositionPolicy {
        let policy = CompositionPolicy {
            italic: false,
            slashed_zero: self.slashed_zero,
            invisible_zenkaku_space: self.invisible_zenkaku_space,
            half_width: self.half_width,
            nerd_fonts: self.nerd_fonts,
        };
        debug!("Composition policy: {:?}", policy);
        policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine_freely() {
        let args = CliArgs::try_parse_from(["fontmerge", "--half-width", "--nerd-fonts"]).unwrap();
        let policy = args.policy();
        assert!(policy.half_width && policy.nerd_fonts);
        assert!(!policy.slashed_zero && !policy.invisible_zenkaku_space && !policy.italic);
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(CliArgs::try_parse_from(["fontmerge", "--bold-zero"]).is_err());
    }

    #[test]
    fn missing_config_fails_validation() {
        let args = CliArgs::try_parse_from(["fontmerge", "--config", "/nonexistent/build.json"]).unwrap();
        assert!(args.validate().is_err());
        assert!(CliArgs::default().validate().is_ok());
    }
}
