//! End-to-end runs over synthetic source fonts.

use crate::compose::metadata::CODE_PAGE_RANGES;
use crate::compose::policy::CompositionPolicy;
use crate::compose::{compose_all, PipelineContext};
use crate::core::config_file::{tests::sample_json, BuildConfig};
use crate::core::run_pipeline;
use crate::tables::patch::patch_all;
use crate::data::sfnt::{load_font, save_font};
use crate::font_source::data::{ContourData, OutlineData, PointData};
use crate::font_source::metrics::name_id;
use crate::font_source::program::{FontProgram, Glyph, LookupKind, LookupTable};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use write_fonts::types::Tag;

const PRIMARY_STYLES: [&str; 2] = ["Rg", "Bd"];
const SECONDARY_STYLES: [&str; 4] = ["Regular", "Bold", "RegularItalic", "BoldItalic"];

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> OutlineData {
    OutlineData::new(vec![ContourData::new(vec![
        PointData::on(x0, y0),
        PointData::on(x0, y1),
        PointData::on(x1, y1),
        PointData::on(x1, y0),
    ])])
}

fn source_font(glyphs: Vec<(Glyph, Option<u32>)>, fixed_pitch: bool) -> FontProgram {
    let mut font = FontProgram::default();
    font.info.units_per_em = 1000;
    font.info.metrics.hhea_ascender = 880;
    font.info.metrics.hhea_descender = -120;
    font.info.metrics.is_fixed_pitch = fixed_pitch;
    font.add_glyph(Glyph::empty(".notdef")).unwrap();
    for (glyph, codepoint) in glyphs {
        let gid = font.add_glyph(glyph).unwrap();
        if let Some(cp) = codepoint {
            font.map_codepoint(cp, gid).unwrap();
        }
    }
    font
}

fn write_source(path: &Path, glyphs: Vec<(Glyph, Option<u32>)>, fixed_pitch: bool) {
    save_font(&source_font(glyphs, fixed_pitch), path).unwrap();
}

/// GSUB 1.0 with empty script and feature lists and one single-substitution
/// lookup that has no subtables.
fn gsub_with_one_lookup() -> Vec<u8> {
    let words: [u16; 12] = [
        1, 0, 10, 12, 14, // header
        0, // ScriptList
        0, // FeatureList
        1, 4, // LookupList
        1, 0, 0, // Lookup
    ];
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

fn primary_glyphs() -> Vec<(Glyph, Option<u32>)> {
    vec![
        (Glyph::new("zero", 500, rect(60.0, 0.0, 440.0, 700.0)), Some(0x30)),
        (Glyph::new("A", 500, rect(50.0, 0.0, 450.0, 700.0)), Some(0x41)),
        (Glyph::new("uni3000", 1000, OutlineData::default()), Some(0x3000)),
        (Glyph::new("uni3042", 1000, rect(100.0, -50.0, 900.0, 750.0)), Some(0x3042)),
        (Glyph::new("icon1", 1000, rect(200.0, 200.0, 800.0, 800.0)), None),
        (Glyph::new("uniE0A0", 1000, rect(0.0, 0.0, 1000.0, 800.0)), Some(0xE0A0)),
    ]
}

fn secondary_glyphs() -> Vec<(Glyph, Option<u32>)> {
    vec![
        (Glyph::new("zero", 600, rect(100.0, 0.0, 500.0, 700.0)), Some(0x30)),
        (Glyph::new("zero.zero", 600, rect(120.0, 0.0, 480.0, 700.0)), None),
        (Glyph::new("A", 600, rect(0.0, 0.0, 600.0, 600.0)), Some(0x41)),
        (Glyph::new("B", 600, rect(80.0, 0.0, 520.0, 700.0)), Some(0x42)),
        (Glyph::new("periodcentered", 600, rect(250.0, 300.0, 350.0, 400.0)), Some(0xB7)),
    ]
}

struct Fixture {
    _dir: TempDir,
    source: PathBuf,
    build: PathBuf,
    config: BuildConfig,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source");
    let build = dir.path().join("build");
    fs::create_dir_all(&source).unwrap();

    for style in PRIMARY_STYLES {
        let mut primary = source_font(primary_glyphs(), false);
        primary.lookups.push(LookupTable {
            kind: LookupKind::Substitution,
            lookup_count: 1,
            data: gsub_with_one_lookup(),
        });
        save_font(&primary, source.join(format!("LINESeedJP_TTF_{style}.ttf"))).unwrap();
    }
    for style in SECONDARY_STYLES {
        write_source(
            &source.join(format!("JuliaMono-{style}.ttf")),
            secondary_glyphs(),
            true,
        );
    }
    write_source(
        &source.join("Ideographic_Space.ttf"),
        vec![(
            Glyph::new("uni3000", 1000, rect(50.0, -100.0, 950.0, 800.0)),
            Some(0x3000),
        )],
        false,
    );
    write_source(
        &source.join("SymbolsNerdFontMono-Regular.ttf"),
        vec![
            (Glyph::new("branch", 1000, rect(100.0, 0.0, 500.0, 700.0)), Some(0xE0A0)),
            (Glyph::new("rightsep", 1000, rect(0.0, -100.0, 1000.0, 800.0)), Some(0xE0B0)),
        ],
        false,
    );

    let supplemental = dir.path().join("add_cmap.csv");
    fs::write(&supplemental, "# code,name,description\n0xF101,icon1,extra icon\n").unwrap();

    let json = sample_json(source.to_str().unwrap(), build.to_str().unwrap()).replace(
        r#""em_ascent""#,
        &format!(
            r#""supplemental_cmap": "{}", "em_ascent""#,
            supplemental.display()
        ),
    );
    let config = BuildConfig::from_json(&json).unwrap();
    Fixture {
        _dir: dir,
        source,
        build,
        config,
    }
}

fn run(fixture: &Fixture, policy: CompositionPolicy) -> (PipelineContext, Vec<PathBuf>) {
    let ctx = PipelineContext::new(fixture.config.clone(), policy);
    let outputs = run_pipeline(&ctx).unwrap();
    (ctx, outputs)
}

fn build_listing(build: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(build)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    names
}

fn glyph_name_at(font: &FontProgram, codepoint: u32) -> Option<&str> {
    font.glyph_at(codepoint)
        .and_then(|gid| font.glyph(gid))
        .map(|glyph| glyph.name())
}

#[test]
fn default_build_leaves_only_patched_styles() {
    let fixture = fixture();
    fs::create_dir_all(&fixture.build).unwrap();
    fs::write(fixture.build.join("stale.txt"), "old run").unwrap();

    let (ctx, outputs) = run(&fixture, CompositionPolicy::default());

    assert_eq!(
        outputs,
        SECONDARY_STYLES
            .iter()
            .map(|style| fixture.build.join(format!("Moralerspace-{style}.ttf")))
            .collect::<Vec<_>>()
    );
    assert_eq!(
        build_listing(&fixture.build),
        vec![
            "Moralerspace-Bold.ttf",
            "Moralerspace-BoldItalic.ttf",
            "Moralerspace-Regular.ttf",
            "Moralerspace-RegularItalic.ttf",
        ]
    );
    assert!(ctx.has_cmap_document());
}

#[test]
fn primary_wins_and_coverage_is_the_union() {
    let fixture = fixture();
    run(&fixture, CompositionPolicy::default());
    let font = load_font(fixture.build.join("Moralerspace-Regular.ttf")).unwrap();

    // the primary's A, widened from 500 to 600 and shifted by 50
    let a = font.glyph(font.glyph_at(0x41).unwrap()).unwrap();
    assert_eq!(a.advance_width, 600);
    let bounds = a.outline.bounds().unwrap();
    assert_eq!((bounds.min_x(), bounds.max_y()), (100.0, 700.0));

    assert_eq!(glyph_name_at(&font, 0x42), Some("B"));
    assert_eq!(glyph_name_at(&font, 0x3042), Some("uni3042"));
    assert_eq!(font.glyph(font.glyph_at(0x3042).unwrap()).unwrap().advance_width, 1000);

    // deny-listed in the secondary, absent from the primary
    assert_eq!(font.glyph_at(0xB7), None);

    let space = font.glyph(font.glyph_at(0x3000).unwrap()).unwrap();
    assert!(!space.outline.is_empty());

    // the primary's zero wins U+0030 and fills the secondary's cleared slot
    let zero = font.glyph(font.glyph_at(0x30).unwrap()).unwrap();
    assert_eq!(zero.name(), "zero");
    assert_eq!(zero.outline.bounds().unwrap().min_x(), 110.0);

    let primary = load_font(fixture.source.join("LINESeedJP_TTF_Rg.ttf")).unwrap();
    assert_eq!(primary.lookup_count(), 1);
    assert_eq!(font.lookup_count(), 0);
}

#[test]
fn slashed_zero_replaces_the_merged_digit_zero() {
    let fixture = fixture();
    let policy = CompositionPolicy {
        slashed_zero: true,
        ..Default::default()
    };
    let (_, outputs) = run(&fixture, policy);
    assert_eq!(outputs[0], fixture.build.join("MoralerspaceSZ-Regular.ttf"));

    let font = load_font(&outputs[0]).unwrap();
    let zero = font.glyph(font.glyph_at(0x30).unwrap()).unwrap();
    let slashed = font.glyph(font.glyph_by_name("zero.zero").unwrap()).unwrap();
    assert_eq!(zero.outline, slashed.outline);
    assert_eq!(zero.outline.bounds().unwrap().min_x(), 120.0);
    assert_eq!(zero.advance_width, 600);
}

#[test]
fn tables_are_patched() {
    let fixture = fixture();
    run(&fixture, CompositionPolicy::default());
    let font = load_font(fixture.build.join("Moralerspace-Bold.ttf")).unwrap();

    assert!(!font.info.metrics.is_fixed_pitch);
    assert_eq!(font.info.os2.fs_selection.bits(), 0x0120);
    assert_eq!(font.info.os2.panose_10[2], 8);
    assert_eq!(font.info.os2.ul_code_page_range_1, Some(CODE_PAGE_RANGES.0));
    assert_eq!(font.info.os2.ach_vend_id, Tag::new(b"TWR "));

    assert_eq!(
        font.info.names.get(&name_id::FULL_NAME).map(String::as_str),
        Some("Moralerspace Bold")
    );
    assert_eq!(
        font.info.names.get(&name_id::POSTSCRIPT_NAME).map(String::as_str),
        Some("Moralerspace-Bold")
    );

    assert_eq!(glyph_name_at(&font, 0xF101), Some("icon1"));
}

#[test]
fn half_width_slashed_zero_invisible_space() {
    let fixture = fixture();
    let policy = CompositionPolicy {
        half_width: true,
        slashed_zero: true,
        invisible_zenkaku_space: true,
        ..Default::default()
    };
    let (_, outputs) = run(&fixture, policy);
    assert_eq!(
        outputs[0],
        fixture.build.join("MoralerspaceHWSZIZS-Regular.ttf")
    );

    let font = load_font(&outputs[0]).unwrap();
    let advance_at = |cp: u32| font.glyph(font.glyph_at(cp).unwrap()).unwrap().advance_width;
    assert_eq!(advance_at(0x30), 528);
    assert_eq!(advance_at(0x41), 528);
    assert_eq!(advance_at(0x42), 528);
    assert_eq!(advance_at(0x3042), 1056);

    let zero = font.glyph(font.glyph_at(0x30).unwrap()).unwrap();
    let slashed = font.glyph(font.glyph_by_name("zero.zero").unwrap()).unwrap();
    assert_eq!(zero.outline, slashed.outline);

    let space = font.glyph(font.glyph_at(0x3000).unwrap()).unwrap();
    assert!(space.outline.is_empty());

    assert_eq!(font.info.os2.x_avg_char_width, 528);
    assert_eq!(font.info.os2.panose_10[3], 9);
    assert_eq!(
        font.info.names.get(&name_id::FAMILY).map(String::as_str),
        Some("Moralerspace HWSZIZS")
    );
}

#[test]
fn icons_take_over_their_codepoints() {
    let fixture = fixture();
    let policy = CompositionPolicy {
        nerd_fonts: true,
        ..Default::default()
    };
    let (ctx, outputs) = run(&fixture, policy);
    assert_eq!(outputs[1], fixture.build.join("MoralerspaceNF-Bold.ttf"));
    assert!(ctx.icon_font().is_ok());

    let font = load_font(&outputs[1]).unwrap();
    assert_eq!(glyph_name_at(&font, 0xE0A0), Some("branch-nf"));
    assert_eq!(glyph_name_at(&font, 0xE0B0), Some("rightsep-nf"));

    let branch = font.glyph(font.glyph_at(0xE0A0).unwrap()).unwrap();
    assert_eq!(branch.advance_width, 600);
    assert_eq!(branch.outline.bounds().unwrap().min_x(), 100.0);

    // the primary's displaced glyph is cleared and not carried over
    assert!(!font.contains_glyph("uniE0A0"));
}

#[test]
fn failed_patch_leaves_no_codec_files() {
    let fixture = fixture();
    fs::write(&fixture.config.supplemental_cmap, "0xZZ,icon1,broken\n").unwrap();

    let ctx = PipelineContext::new(fixture.config.clone(), CompositionPolicy::default());
    compose_all(&ctx).unwrap();
    assert!(patch_all(&ctx).is_err());

    let listing = build_listing(&fixture.build);
    assert!(listing.iter().all(|name| !name.starts_with("fonttools_")), "{listing:?}");
    // the composed binaries stay for inspection
    assert!(listing.iter().any(|name| name.starts_with("fontforge_")), "{listing:?}");
}

#[test]
fn missing_source_aborts_the_run() {
    let fixture = fixture();
    fs::remove_file(fixture.source.join("JuliaMono-Bold.ttf")).unwrap();

    let ctx = PipelineContext::new(fixture.config.clone(), CompositionPolicy::default());
    let err = compose_all(&ctx).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("'Bold'"), "{message}");
    assert!(message.contains("JuliaMono-Bold.ttf"), "{message}");
}

#[test]
fn missing_ideographic_space_resource_is_an_error() {
    let fixture = fixture();
    fs::remove_file(fixture.source.join("Ideographic_Space.ttf")).unwrap();

    let ctx = PipelineContext::new(fixture.config.clone(), CompositionPolicy::default());
    assert!(compose_all(&ctx).is_err());

    let invisible = CompositionPolicy {
        invisible_zenkaku_space: true,
        ..Default::default()
    };
    let ctx = PipelineContext::new(fixture.config.clone(), invisible);
    assert_eq!(compose_all(&ctx).unwrap().len(), 4);
}
