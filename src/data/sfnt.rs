//! TrueType file I/O
//!
//! Reads a binary font into a [`FontProgram`] through read-fonts and
//! compiles a [`FontProgram`] back into a binary through write-fonts.

use crate::data::conversions::{outline_from_glyf, simple_glyph_from_outline};
use crate::font_source::metrics::{FontInfo, FontMetrics};
use crate::font_source::program::{
    AltMapping, FontProgram, Glyph, GlyphIndex, LookupKind, LookupTable,
};
use anyhow::{anyhow, bail, Context, Result};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::debug;
use write_fonts::from_obj::ToOwnedTable;
use write_fonts::read::tables::cmap::{CmapSubtable, PlatformId};
use write_fonts::read::types::GlyphId16;
use write_fonts::read::{FontRef, TableProvider};
use write_fonts::tables::cmap::Cmap;
use write_fonts::tables::glyf::{Bbox, GlyfLocaBuilder};
use write_fonts::tables::hhea::Hhea;
use write_fonts::tables::hmtx::{Hmtx, LongMetric};
use write_fonts::tables::maxp::Maxp;
use write_fonts::tables::name::{Name, NameRecord};
use write_fonts::tables::post::Post;
use write_fonts::types::{FWord, Fixed, GlyphId, LongDateTime, NameId, Tag, UfWord};
use write_fonts::FontBuilder;

/// Tables copied through to the output unchanged
const PASSTHROUGH_TABLES: [&[u8; 4]; 2] = [b"gasp", b"GDEF"];

/// Seconds between the TrueType epoch (1904) and the Unix epoch
const MAC_EPOCH_OFFSET: i64 = 2_082_844_800;

/// Windows platform, Unicode BMP encoding, US English
const WINDOWS_PLATFORM: u16 = 3;
const WINDOWS_UNICODE_BMP: u16 = 1;
const ENGLISH_US: u16 = 0x0409;

/// Load a TrueType font file from disk
pub fn load_font(path: impl AsRef<Path>) -> Result<FontProgram> {
    let path = path.as_ref();
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read font file {}", path.display()))?;
    read_font(&bytes).with_context(|| format!("Failed to parse font file {}", path.display()))
}

/// Compile a font program and write it to disk
pub fn save_font(program: &FontProgram, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes = write_font(program)?;
    fs::write(path, bytes).with_context(|| format!("Failed to write font file {}", path.display()))?;
    debug!("Saved {} glyphs to {}", program.glyph_count(), path.display());
    Ok(())
}

/// Parse a binary font into a font program
pub fn read_font(bytes: &[u8]) -> Result<FontProgram> {
    let font = FontRef::new(bytes)?;
    let num_glyphs = font.maxp()?.num_glyphs() as u32;

    let info = read_info(&font)?;
    let names = read_glyph_names(&font, num_glyphs);
    let advances = read_advances(&font, num_glyphs)?;

    let (loca, glyf) = match (font.loca(None), font.glyf()) {
        (Ok(loca), Ok(glyf)) => (loca, glyf),
        _ => bail!("Font has no glyf/loca tables; only TrueType outlines are supported"),
    };

    let mut program = FontProgram::new(info);
    for gid in 0..num_glyphs {
        let outline = outline_from_glyf(&loca, &glyf, gid)
            .with_context(|| format!("Failed to read outline of glyph {gid}"))?;
        let glyph = Glyph::new(
            names[gid as usize].clone(),
            advances[gid as usize],
            outline,
        );
        program.add_glyph(glyph)?;
    }

    // The lowest code point of a glyph is its primary encoding; any further
    // code points reaching the same glyph become plain alternates.
    let mut by_glyph: BTreeMap<GlyphIndex, Vec<u32>> = BTreeMap::new();
    for (codepoint, gid) in read_cmap(&font) {
        if (gid as usize) < program.glyph_count() && gid != 0 {
            by_glyph.entry(gid as usize).or_default().push(codepoint);
        }
    }
    for (gid, mut codepoints) in by_glyph {
        codepoints.sort_unstable();
        codepoints.dedup();
        let Some((primary, rest)) = codepoints.split_first() else {
            continue;
        };
        program.map_codepoint(*primary, gid)?;
        if let Some(glyph) = program.glyph_mut(gid) {
            glyph
                .alternates
                .extend(rest.iter().map(|&cp| AltMapping::plain(cp)));
        }
    }

    program.lookups = read_lookups(&font);
    for tag in PASSTHROUGH_TABLES {
        if let Some(data) = font.table_data(Tag::new(tag)) {
            program.extra_tables.push((*tag, data.as_bytes().to_vec()));
        }
    }

    Ok(program)
}

fn read_info(font: &FontRef) -> Result<FontInfo> {
    let head = font.head()?;
    let units_per_em = head.units_per_em();
    let hhea = font.hhea()?;
    let os2 = font.os2().ok();

    let mut names = BTreeMap::new();
    if let Ok(name) = font.name() {
        for record in name.name_record() {
            if record.platform_id() != WINDOWS_PLATFORM || record.language_id() != ENGLISH_US {
                continue;
            }
            if let Ok(string) = record.string(name.string_data()) {
                names.insert(record.name_id().to_u16(), string.chars().collect());
            }
        }
    }

    // The em split follows the typo metrics when they add up to the em,
    // otherwise the hhea ratio is stretched to cover it.
    let upm = units_per_em as i32;
    let typo = os2
        .as_ref()
        .map(|t| (t.s_typo_ascender() as i32, -(t.s_typo_descender() as i32)));
    let (ascent, descent) = match typo {
        Some((asc, desc)) if asc + desc == upm => (asc, desc),
        _ => {
            let asc = hhea.ascender().to_i16() as f64;
            let desc = -(hhea.descender().to_i16() as f64);
            let total = asc + desc;
            let ascent = if total > 0.0 {
                (upm as f64 * asc / total).round() as i32
            } else {
                (upm as f64 * 0.8).round() as i32
            };
            (ascent, upm - ascent)
        }
    };

    let mut metrics = FontMetrics {
        ascent,
        descent,
        hhea_ascender: hhea.ascender().to_i16() as i32,
        hhea_descender: hhea.descender().to_i16() as i32,
        hhea_line_gap: hhea.line_gap().to_i16() as i32,
        ..Default::default()
    };
    if let Ok(post) = font.post() {
        metrics.italic_angle = post.italic_angle().to_f64();
        metrics.underline_position = post.underline_position().to_i16() as i32;
        metrics.underline_thickness = post.underline_thickness().to_i16() as i32;
        metrics.is_fixed_pitch = post.is_fixed_pitch() != 0;
    }

    Ok(FontInfo {
        units_per_em,
        metrics,
        names,
        head: head.to_owned_table(),
        os2: os2.map(|t| t.to_owned_table()).unwrap_or_default(),
    })
}

/// Glyph names from the post table, synthesized where it has none
pub(crate) fn read_glyph_names(font: &FontRef, num_glyphs: u32) -> Vec<String> {
    let post = font.post().ok();
    let mut seen = HashSet::new();
    (0..num_glyphs)
        .map(|gid| {
            let name = post
                .as_ref()
                .and_then(|p| p.glyph_name(GlyphId16::new(gid as u16)))
                .map(str::to_string)
                .unwrap_or_else(|| format!("glyph{gid:05}"));
            let name = if seen.contains(&name) {
                format!("{name}.{gid}")
            } else {
                name
            };
            seen.insert(name.clone());
            name
        })
        .collect()
}

fn read_advances(font: &FontRef, num_glyphs: u32) -> Result<Vec<u16>> {
    let hmtx = font.hmtx()?;
    let metrics = hmtx.h_metrics();
    let last = metrics.last().map(|m| m.advance.get()).unwrap_or(0);
    Ok((0..num_glyphs as usize)
        .map(|gid| metrics.get(gid).map(|m| m.advance.get()).unwrap_or(last))
        .collect())
}

/// Every Unicode mapping from the format 4 and format 12 subtables
pub(crate) fn read_cmap(font: &FontRef) -> Vec<(u32, u32)> {
    let Ok(cmap) = font.cmap() else {
        return Vec::new();
    };
    let mut mappings = Vec::new();
    for record in cmap.encoding_records() {
        let unicode = record.platform_id() == PlatformId::Unicode
            || (record.platform_id() == PlatformId::Windows
                && matches!(record.encoding_id(), 1 | 10));
        if !unicode {
            continue;
        }
        match record.subtable(cmap.offset_data()) {
            Ok(CmapSubtable::Format4(table)) => {
                mappings.extend(table.iter().map(|(cp, gid)| (cp, gid.to_u32())));
            }
            Ok(CmapSubtable::Format12(table)) => {
                mappings.extend(table.iter().map(|(cp, gid)| (cp, gid.to_u32())));
            }
            _ => {}
        }
    }
    mappings
}

fn read_lookups(font: &FontRef) -> Vec<LookupTable> {
    let mut lookups = Vec::new();
    if let Some(data) = font.table_data(Tag::new(b"GSUB")) {
        let lookup_count = font
            .gsub()
            .ok()
            .and_then(|t| t.lookup_list().ok())
            .map(|l| l.lookup_count())
            .unwrap_or(0);
        lookups.push(LookupTable {
            kind: LookupKind::Substitution,
            lookup_count,
            data: data.as_bytes().to_vec(),
        });
    }
    if let Some(data) = font.table_data(Tag::new(b"GPOS")) {
        let lookup_count = font
            .gpos()
            .ok()
            .and_then(|t| t.lookup_list().ok())
            .map(|l| l.lookup_count())
            .unwrap_or(0);
        lookups.push(LookupTable {
            kind: LookupKind::Positioning,
            lookup_count,
            data: data.as_bytes().to_vec(),
        });
    }
    lookups
}

/// Compile a font program into a TrueType binary
pub fn write_font(program: &FontProgram) -> Result<Vec<u8>> {
    if program.glyph_count() == 0 {
        bail!("Cannot write a font without glyphs");
    }
    let Ok(num_glyphs) = u16::try_from(program.glyph_count()) else {
        bail!(
            "{} glyphs exceed the TrueType limit of {}",
            program.glyph_count(),
            u16::MAX
        );
    };
    let info = &program.info;

    let mut glyf_builder = GlyfLocaBuilder::new();
    let mut h_metrics = Vec::with_capacity(program.glyph_count());
    let mut font_bbox = None;
    let mut max_points = 0u16;
    let mut max_contours = 0u16;
    let mut advance_width_max = 0u16;
    let mut min_lsb = i16::MAX;
    let mut min_rsb = i16::MAX;
    let mut x_max_extent = i16::MIN;

    for glyph in program.glyphs() {
        let simple = simple_glyph_from_outline(&glyph.outline);
        glyf_builder
            .add_glyph(&simple)
            .map_err(|e| anyhow!("Failed to compile glyph '{}': {e:?}", glyph.name()))?;

        let lsb = if simple.contours.is_empty() {
            0
        } else {
            let bbox = simple.bbox;
            font_bbox = Some(font_bbox.map_or(bbox, |b: Bbox| b.union(bbox)));
            let points: usize = simple.contours.iter().map(|c| c.len()).sum();
            max_points = max_points.max(points.min(u16::MAX as usize) as u16);
            max_contours = max_contours.max(simple.contours.len().min(u16::MAX as usize) as u16);
            let rsb = glyph.advance_width as i32 - bbox.x_max as i32;
            min_lsb = min_lsb.min(bbox.x_min);
            min_rsb = min_rsb.min(rsb.clamp(i16::MIN as i32, i16::MAX as i32) as i16);
            x_max_extent = x_max_extent.max(bbox.x_max);
            bbox.x_min
        };
        advance_width_max = advance_width_max.max(glyph.advance_width);
        h_metrics.push(LongMetric {
            advance: glyph.advance_width,
            side_bearing: lsb,
        });
    }
    let (glyf, loca, loca_format) = glyf_builder.build();
    let font_bbox = font_bbox.unwrap_or_default();
    if min_lsb == i16::MAX {
        (min_lsb, min_rsb, x_max_extent) = (0, 0, 0);
    }

    let now = LongDateTime::new(chrono::Utc::now().timestamp() + MAC_EPOCH_OFFSET);
    let mut head = info.head.clone();
    head.units_per_em = info.units_per_em;
    head.index_to_loc_format = loca_format as i16;
    head.x_min = font_bbox.x_min;
    head.y_min = font_bbox.y_min;
    head.x_max = font_bbox.x_max;
    head.y_max = font_bbox.y_max;
    head.modified = now;

    let (caret_slope_rise, caret_slope_run) = caret_slope(info);
    let hhea = Hhea {
        ascender: FWord::new(clamp_i16(info.metrics.hhea_ascender)),
        descender: FWord::new(clamp_i16(info.metrics.hhea_descender)),
        line_gap: FWord::new(clamp_i16(info.metrics.hhea_line_gap)),
        advance_width_max: UfWord::new(advance_width_max),
        min_left_side_bearing: FWord::new(min_lsb),
        min_right_side_bearing: FWord::new(min_rsb),
        x_max_extent: FWord::new(x_max_extent),
        caret_slope_rise,
        caret_slope_run,
        caret_offset: 0,
        number_of_h_metrics: num_glyphs,
    };

    let maxp = Maxp {
        num_glyphs,
        max_points: Some(max_points),
        max_contours: Some(max_contours),
        max_composite_points: Some(0),
        max_composite_contours: Some(0),
        max_zones: Some(2),
        max_twilight_points: Some(0),
        max_storage: Some(0),
        max_function_defs: Some(0),
        max_instruction_defs: Some(0),
        max_stack_elements: Some(0),
        max_size_of_instructions: Some(0),
        max_component_elements: Some(0),
        max_component_depth: Some(0),
    };

    let mut cmap_entries: BTreeMap<u32, GlyphIndex> = BTreeMap::new();
    for (codepoint, gid) in program.mappings() {
        cmap_entries.entry(codepoint).or_insert(gid);
    }
    let cmap = Cmap::from_mappings(cmap_entries.iter().filter_map(|(&cp, &gid)| {
        char::from_u32(cp).map(|ch| (ch, GlyphId::new(gid as u32)))
    }))
    .map_err(|e| anyhow!("Conflicting cmap entries: {e}"))?;

    let mut os2 = info.os2.clone();
    let bmp = cmap_entries.keys().map(|&cp| cp.min(0xFFFF) as u16);
    os2.us_first_char_index = bmp.clone().min().unwrap_or(0);
    os2.us_last_char_index = bmp.max().unwrap_or(0);
    let spacing: Vec<u32> = program
        .glyphs()
        .iter()
        .filter(|g| g.advance_width > 0)
        .map(|g| g.advance_width as u32)
        .collect();
    if !spacing.is_empty() {
        os2.x_avg_char_width = (spacing.iter().sum::<u32>() / spacing.len() as u32) as i16;
    }

    let glyph_names: Vec<&str> = program.glyphs().iter().map(|g| g.name()).collect();
    let mut post = Post::new_v2(glyph_names.iter().copied());
    post.italic_angle = Fixed::from_f64(info.metrics.italic_angle);
    post.underline_position = FWord::new(clamp_i16(info.metrics.underline_position));
    post.underline_thickness = FWord::new(clamp_i16(info.metrics.underline_thickness));
    post.is_fixed_pitch = info.metrics.is_fixed_pitch as u32;

    let mut name_records: Vec<NameRecord> = info
        .names
        .iter()
        .map(|(&id, value)| {
            NameRecord::new(
                WINDOWS_PLATFORM,
                WINDOWS_UNICODE_BMP,
                ENGLISH_US,
                NameId::new(id),
                value.clone().into(),
            )
        })
        .collect();
    name_records.sort();
    let name = Name::new(name_records);

    let hmtx = Hmtx {
        h_metrics,
        left_side_bearings: Vec::new(),
    };

    let mut builder = FontBuilder::new();
    builder
        .add_table(&head)?
        .add_table(&hhea)?
        .add_table(&maxp)?
        .add_table(&os2)?
        .add_table(&hmtx)?
        .add_table(&cmap)?
        .add_table(&loca)?
        .add_table(&glyf)?
        .add_table(&name)?
        .add_table(&post)?;
    for lookup in &program.lookups {
        builder.add_raw(Tag::new(&lookup.kind.tag()), lookup.data.clone());
    }
    for (tag, data) in &program.extra_tables {
        builder.add_raw(Tag::new(tag), data.clone());
    }
    Ok(builder.build())
}

/// Caret slope matching the italic angle, upright when there is none
fn caret_slope(info: &FontInfo) -> (i16, i16) {
    let angle = info.metrics.italic_angle;
    if angle == 0.0 {
        return (1, 0);
    }
    let rise = info.units_per_em as f64;
    let run = rise * (-angle).to_radians().tan();
    (clamp_i16(rise as i32), clamp_i16(run.round() as i32))
}

fn clamp_i16(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}
