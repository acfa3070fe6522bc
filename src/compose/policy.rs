//! Composition policy and the fixed style table

use crate::core::config_file::BuildConfig;

/// Per-run composition switches. Each axis affects exactly one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositionPolicy {
    /// Shear the primary's glyphs; set per style, never from the CLI
    pub italic: bool,
    pub slashed_zero: bool,
    /// Keep the ideographic space invisible instead of grafting the
    /// visible replacement glyph
    pub invisible_zenkaku_space: bool,
    pub half_width: bool,
    pub nerd_fonts: bool,
}

impl CompositionPolicy {
    /// The same policy with the italic axis set for one style
    pub fn for_style(self, italic: bool) -> Self {
        Self { italic, ..self }
    }

    /// Ordered `(enabled, token)` pairs making up the variant string
    pub fn variant_tokens<'a>(&self, config: &'a BuildConfig) -> [(bool, &'a str); 4] {
        [
            (self.half_width, config.half_width_str.as_str()),
            (self.slashed_zero, config.slashed_zero_str.as_str()),
            (
                self.invisible_zenkaku_space,
                config.invisible_zenkaku_space_str.as_str(),
            ),
            (self.nerd_fonts, config.nerd_fonts_str.as_str()),
        ]
    }

    /// Variant suffix of the family name, e.g. `"HWSZ"`
    pub fn variant(&self, config: &BuildConfig) -> String {
        self.variant_tokens(config)
            .iter()
            .fold(String::new(), |mut acc, &(enabled, token)| {
                if enabled {
                    acc.push_str(token);
                }
                acc
            })
    }
}

/// One style of the family and the source styles it is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleSpec {
    /// File suffix of the primary source
    pub primary: &'static str,
    /// File suffix of the secondary source
    pub secondary: &'static str,
    /// Style name of the merged font
    pub merged: &'static str,
    pub italic: bool,
}

/// Styles in build order
pub const STYLES: [StyleSpec; 4] = [
    StyleSpec {
        primary: "Rg",
        secondary: "Regular",
        merged: "Regular",
        italic: false,
    },
    StyleSpec {
        primary: "Bd",
        secondary: "Bold",
        merged: "Bold",
        italic: false,
    },
    StyleSpec {
        primary: "Rg",
        secondary: "RegularItalic",
        merged: "RegularItalic",
        italic: true,
    },
    StyleSpec {
        primary: "Bd",
        secondary: "BoldItalic",
        merged: "BoldItalic",
        italic: true,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config_file::tests::sample_json;

    #[test]
    fn variant_tokens_keep_fixed_order() {
        let config = BuildConfig::from_json(&sample_json("s", "b")).unwrap();
        let policy = CompositionPolicy {
            nerd_fonts: true,
            invisible_zenkaku_space: true,
            half_width: true,
            slashed_zero: true,
            italic: false,
        };
        assert_eq!(policy.variant(&config), "HWSZIZSNF");

        let policy = CompositionPolicy {
            slashed_zero: true,
            nerd_fonts: true,
            ..Default::default()
        };
        assert_eq!(policy.variant(&config), "SZNF");
    }

    #[test]
    fn italic_is_not_a_token() {
        let config = BuildConfig::from_json(&sample_json("s", "b")).unwrap();
        let policy = CompositionPolicy::default().for_style(true);
        assert!(policy.italic);
        assert_eq!(policy.variant(&config), "");
    }
}
