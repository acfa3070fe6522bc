//! Binary font I/O and outline conversions

pub mod conversions;
pub mod sfnt;

pub use sfnt::{load_font, read_font, save_font, write_font};
