//! Dumping tables into documents and applying them back
//!
//! OS/2 and post are dumped field by field from their owned `write-fonts`
//! form; applying a document sets every field it names on a fresh owned
//! copy. The cmap is dumped as named mappings and rebuilt from them, with
//! names resolved against the target's glyph order. Tables the document does
//! not cover are copied over byte for byte.

use crate::compose::metadata::vendor_tag;
use crate::data::sfnt::read_glyph_names;
use crate::tables::document::{DocNode, TableDocument};
use crate::tables::supplemental::parse_code;
use anyhow::{anyhow, Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};
use write_fonts::from_obj::ToOwnedTable;
use write_fonts::read::tables::cmap::{CmapSubtable, PlatformId};
use write_fonts::read::{FontRef, TableProvider};
use write_fonts::tables::cmap::Cmap;
use write_fonts::tables::os2::{Os2, SelectionFlags};
use write_fonts::tables::post::Post;
use write_fonts::types::{FWord, Fixed, GlyphId};
use write_fonts::FontBuilder;

pub const OS2_TAG: &str = "OS_2";
pub const POST_TAG: &str = "post";
pub const CMAP_TAG: &str = "cmap";
pub const CMAP_FORMAT_4: &str = "cmap_format_4";
pub const CMAP_FORMAT_12: &str = "cmap_format_12";

/// PANOSE field names in table order
pub const PANOSE_FIELDS: [&str; 10] = [
    "bFamilyType",
    "bSerifStyle",
    "bWeight",
    "bProportion",
    "bContrast",
    "bStrokeVariation",
    "bArmStyle",
    "bLetterForm",
    "bMidline",
    "bXHeight",
];

/// `fsSelection` as two space separated bytes, high byte first
pub fn format_bits(value: u16) -> String {
    format!("{:08b} {:08b}", value >> 8, value & 0xFF)
}

pub fn parse_bits(bits: &str) -> Result<u16> {
    let digits: String = bits.chars().filter(|c| !c.is_whitespace()).collect();
    u16::from_str_radix(&digits, 2).with_context(|| format!("Invalid bit pattern '{bits}'"))
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Dump the OS/2 and post tables of a binary.
pub fn dump_os2_post(path: &Path) -> Result<TableDocument> {
    let bytes = read_bytes(path)?;
    let font = FontRef::new(&bytes)?;
    let os2: Os2 = font.os2()?.to_owned_table();
    let post: Post = font.post()?.to_owned_table();

    let mut panose = DocNode::new("panose");
    for (field, value) in PANOSE_FIELDS.iter().zip(os2.panose_10) {
        panose.children.push(DocNode::leaf(*field, value));
    }

    let mut table = DocNode::new(OS2_TAG)
        .with_child(DocNode::leaf("xAvgCharWidth", os2.x_avg_char_width))
        .with_child(DocNode::leaf("usWeightClass", os2.us_weight_class))
        .with_child(DocNode::leaf("usWidthClass", os2.us_width_class))
        .with_child(DocNode::leaf("fsType", format_bits(os2.fs_type)))
        .with_child(DocNode::leaf("sFamilyClass", os2.s_family_class))
        .with_child(panose)
        .with_child(DocNode::leaf("achVendID", os2.ach_vend_id))
        .with_child(DocNode::leaf("fsSelection", format_bits(os2.fs_selection.bits())))
        .with_child(DocNode::leaf("sTypoAscender", os2.s_typo_ascender))
        .with_child(DocNode::leaf("sTypoDescender", os2.s_typo_descender))
        .with_child(DocNode::leaf("sTypoLineGap", os2.s_typo_line_gap))
        .with_child(DocNode::leaf("usWinAscent", os2.us_win_ascent))
        .with_child(DocNode::leaf("usWinDescent", os2.us_win_descent));
    if let Some(range) = os2.ul_code_page_range_1 {
        table.children.push(DocNode::leaf("ulCodePageRange1", range));
    }
    if let Some(range) = os2.ul_code_page_range_2 {
        table.children.push(DocNode::leaf("ulCodePageRange2", range));
    }

    let post_table = DocNode::new(POST_TAG)
        .with_child(DocNode::leaf("italicAngle", post.italic_angle.to_f64()))
        .with_child(DocNode::leaf("underlinePosition", post.underline_position.to_i16()))
        .with_child(DocNode::leaf("underlineThickness", post.underline_thickness.to_i16()))
        .with_child(DocNode::leaf("isFixedPitch", post.is_fixed_pitch));

    let mut doc = TableDocument::new();
    doc.push_table(table);
    doc.push_table(post_table);
    Ok(doc)
}

/// Dump the Unicode format 4 and format 12 subtables with glyph names.
pub fn dump_cmap(path: &Path) -> Result<TableDocument> {
    let bytes = read_bytes(path)?;
    let font = FontRef::new(&bytes)?;
    let cmap = font.cmap()?;
    let num_glyphs = font.maxp()?.num_glyphs() as u32;
    let names = read_glyph_names(&font, num_glyphs);
    let name_of = |gid: u32| {
        names
            .get(gid as usize)
            .cloned()
            .unwrap_or_else(|| format!("glyph{gid:05}"))
    };

    let mut table = DocNode::new(CMAP_TAG);
    for record in cmap.encoding_records() {
        let platform = match record.platform_id() {
            PlatformId::Unicode => 0,
            PlatformId::Windows => 3,
            _ => continue,
        };
        let header = |tag: &str| {
            DocNode::new(tag)
                .with_attr("platformID", platform)
                .with_attr("platEncID", record.encoding_id())
        };
        let subtable = match record.subtable(cmap.offset_data()) {
            Ok(CmapSubtable::Format4(sub)) => {
                let mut node = header(CMAP_FORMAT_4);
                for (cp, gid) in sub.iter() {
                    node.children.push(map_entry(cp, &name_of(gid.to_u32())));
                }
                node
            }
            Ok(CmapSubtable::Format12(sub)) => {
                let mut node = header(CMAP_FORMAT_12);
                for (cp, gid) in sub.iter() {
                    node.children.push(map_entry(cp, &name_of(gid.to_u32())));
                }
                node
            }
            _ => continue,
        };
        table.children.push(subtable);
    }

    let mut doc = TableDocument::new();
    doc.push_table(table);
    Ok(doc)
}

/// A `map` node as found inside a cmap subtable document
pub fn map_entry(code: u32, name: &str) -> DocNode {
    DocNode::new("map")
        .with_attr("code", format!("{code:#x}"))
        .with_attr("name", name)
}

fn parse_value<T: FromStr>(node: &DocNode) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let raw = node
        .value()
        .ok_or_else(|| anyhow!("<{}> has no value", node.tag))?;
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("<{}> has invalid value '{raw}': {e}", node.tag))
}

fn apply_os2_fields(os2: &mut Os2, table: &DocNode) -> Result<()> {
    for field in &table.children {
        match field.tag.as_str() {
            "xAvgCharWidth" => os2.x_avg_char_width = parse_value(field)?,
            "usWeightClass" => os2.us_weight_class = parse_value(field)?,
            "usWidthClass" => os2.us_width_class = parse_value(field)?,
            "fsType" => os2.fs_type = parse_bits(field.value().unwrap_or_default())?,
            "sFamilyClass" => os2.s_family_class = parse_value(field)?,
            "panose" => {
                for entry in &field.children {
                    if let Some(index) = PANOSE_FIELDS.iter().position(|f| *f == entry.tag) {
                        os2.panose_10[index] = parse_value(entry)?;
                    }
                }
            }
            "achVendID" => os2.ach_vend_id = vendor_tag(field.value().unwrap_or_default()),
            "fsSelection" => {
                let bits = parse_bits(field.value().unwrap_or_default())?;
                os2.fs_selection = SelectionFlags::from_bits_truncate(bits);
            }
            "sTypoAscender" => os2.s_typo_ascender = parse_value(field)?,
            "sTypoDescender" => os2.s_typo_descender = parse_value(field)?,
            "sTypoLineGap" => os2.s_typo_line_gap = parse_value(field)?,
            "usWinAscent" => os2.us_win_ascent = parse_value(field)?,
            "usWinDescent" => os2.us_win_descent = parse_value(field)?,
            "ulCodePageRange1" => os2.ul_code_page_range_1 = Some(parse_value(field)?),
            "ulCodePageRange2" => os2.ul_code_page_range_2 = Some(parse_value(field)?),
            other => debug!("Ignoring OS/2 field <{other}>"),
        }
    }
    Ok(())
}

fn apply_post_fields(post: &mut Post, table: &DocNode) -> Result<()> {
    for field in &table.children {
        match field.tag.as_str() {
            "italicAngle" => post.italic_angle = Fixed::from_f64(parse_value(field)?),
            "underlinePosition" => post.underline_position = FWord::new(parse_value(field)?),
            "underlineThickness" => post.underline_thickness = FWord::new(parse_value(field)?),
            "isFixedPitch" => post.is_fixed_pitch = parse_value(field)?,
            other => debug!("Ignoring post field <{other}>"),
        }
    }
    Ok(())
}

/// Write `source` with the OS/2 and post fields of `doc` applied to `output`.
pub fn apply_os2_post(doc: &TableDocument, source: &Path, output: &Path) -> Result<()> {
    let bytes = read_bytes(source)?;
    let font = FontRef::new(&bytes)?;
    let mut os2: Os2 = font.os2()?.to_owned_table();
    let mut post: Post = font.post()?.to_owned_table();

    for table in doc.iter(OS2_TAG) {
        apply_os2_fields(&mut os2, table)?;
    }
    for table in doc.iter(POST_TAG) {
        apply_post_fields(&mut post, table)?;
    }

    let mut builder = FontBuilder::new();
    builder.add_table(&os2)?.add_table(&post)?;
    builder.copy_missing_tables(font);
    fs::write(output, builder.build())
        .with_context(|| format!("Failed to write {}", output.display()))?;
    debug!("Applied OS/2 and post to {}", output.display());
    Ok(())
}

/// Write `source` with its cmap rebuilt from `doc` to `output`.
///
/// Entries are taken in document order and a later entry for the same code
/// wins. Names the target does not have are reported and skipped.
pub fn apply_cmap(doc: &TableDocument, source: &Path, output: &Path) -> Result<()> {
    let bytes = read_bytes(source)?;
    let font = FontRef::new(&bytes)?;
    let num_glyphs = font.maxp()?.num_glyphs() as u32;
    let gids: HashMap<String, u32> = read_glyph_names(&font, num_glyphs)
        .into_iter()
        .enumerate()
        .map(|(gid, name)| (name, gid as u32))
        .collect();

    let mut mappings: BTreeMap<u32, u32> = BTreeMap::new();
    let mut unresolved = 0;
    for subtable in [CMAP_FORMAT_4, CMAP_FORMAT_12] {
        for node in doc.iter(subtable) {
            for entry in node.children.iter().filter(|c| c.tag == "map") {
                let (Some(code), Some(name)) = (entry.attr("code"), entry.attr("name")) else {
                    continue;
                };
                let code = parse_code(code)?;
                match gids.get(name) {
                    Some(&gid) => {
                        mappings.insert(code, gid);
                    }
                    None => {
                        warn!("cmap entry {code:#x} names unknown glyph '{name}'");
                        unresolved += 1;
                    }
                }
            }
        }
    }

    let cmap = Cmap::from_mappings(
        mappings
            .iter()
            .filter_map(|(&cp, &gid)| char::from_u32(cp).map(|ch| (ch, GlyphId::new(gid)))),
    )
    .map_err(|e| anyhow!("Conflicting cmap entries: {e}"))?;

    let mut builder = FontBuilder::new();
    builder.add_table(&cmap)?;
    builder.copy_missing_tables(font);
    fs::write(output, builder.build())
        .with_context(|| format!("Failed to write {}", output.display()))?;
    debug!(
        "Applied cmap with {} mappings ({unresolved} unresolved) to {}",
        mappings.len(),
        output.display()
    );
    Ok(())
}
