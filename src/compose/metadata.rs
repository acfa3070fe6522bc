//! Font-level metadata of the merged program

use crate::core::config_file::BuildConfig;
use crate::font_source::metrics::name_id;
use crate::font_source::program::FontProgram;
use tracing::debug;
use write_fonts::types::Tag;

/// Attribution of every source family in the merge
pub const COPYRIGHT: &str = "[LINE Seed]
LINE Seed is copyrighted material owned by LINE Corp. (https://seed.line.me/index_jp.html)

[JuliaMono]
Copyright (c) 2020 - 2023, cormullion (https://github.com/cormullion/juliamono)

[Juisee]
Copyright 2022 Yuko Otawara
";

pub const LICENSE: &str = "This Font Software is licensed under the SIL Open Font License,
Version 1.1. This license is available with a FAQ
at: http://scripts.sil.org/OFL";

pub const LICENSE_URL: &str = "http://scripts.sil.org/OFL";

/// Code page ranges with the Korean bit the Latin source sets by mistake
/// replaced by the Japanese one
pub const CODE_PAGE_RANGES: (u32, u32) = (0b1100000000000100000000111111111, 0);

/// Family name with the variant tokens, e.g. `"Moralerspace HWSZ"`
pub fn family_name(config: &BuildConfig, variant: &str) -> String {
    format!("{} {}", config.font_name, variant).trim().to_string()
}

pub fn postscript_name(config: &BuildConfig, variant: &str, style: &str) -> String {
    format!("{}{}-{}", config.font_name, variant, style)
}

/// Four-byte vendor tag, space padded
pub fn vendor_tag(vendor: &str) -> Tag {
    let mut bytes = [b' '; 4];
    for (slot, byte) in bytes.iter_mut().zip(vendor.bytes()) {
        *slot = byte;
    }
    Tag::new(&bytes)
}

/// Set the vertical metrics, code pages, vendor and name table of the
/// merged program.
pub fn edit_meta_data(program: &mut FontProgram, config: &BuildConfig, style: &str, variant: &str) {
    let em_ascent = config.em_ascent as i32;
    let em_descent = config.em_descent as i32;
    let info = &mut program.info;

    info.metrics.ascent = em_ascent;
    info.metrics.descent = em_descent;
    info.metrics.hhea_ascender = config.font_ascent();
    info.metrics.hhea_descender = -config.font_descent();
    info.metrics.hhea_line_gap = 0;

    let os2 = &mut info.os2;
    os2.s_typo_ascender = config.em_ascent as i16;
    os2.s_typo_descender = -(config.em_descent as i16);
    os2.s_typo_line_gap = 0;
    os2.us_win_ascent = config.font_ascent().clamp(0, u16::MAX as i32) as u16;
    os2.us_win_descent = config.font_descent().clamp(0, u16::MAX as i32) as u16;
    os2.ul_code_page_range_1 = Some(CODE_PAGE_RANGES.0);
    os2.ul_code_page_range_2 = Some(CODE_PAGE_RANGES.1);
    os2.ach_vend_id = vendor_tag(&config.vendor_name);

    let family = family_name(config, variant);
    let postscript = postscript_name(config, variant, style);
    info.names.clear();
    info.set_name(name_id::COPYRIGHT, COPYRIGHT);
    info.set_name(name_id::FAMILY, family.as_str());
    info.set_name(name_id::SUBFAMILY, style);
    info.set_name(
        name_id::UNIQUE_ID,
        format!("{};{};{}", config.version, config.vendor_name, postscript),
    );
    info.set_name(name_id::FULL_NAME, format!("{family} {style}"));
    info.set_name(name_id::VERSION, format!("Version {}", config.version));
    info.set_name(name_id::POSTSCRIPT_NAME, postscript);
    info.set_name(name_id::LICENSE, LICENSE);
    info.set_name(name_id::LICENSE_URL, LICENSE_URL);

    debug!("Edited metadata for {}", info.get_display_name());
}
