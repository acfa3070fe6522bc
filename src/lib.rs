//! fontmerge
pub mod compose;
pub mod core;
pub mod data;
pub mod font_source;
pub mod geometry;
pub mod logging;
pub mod tables;
#[cfg(test)]
mod tests;
