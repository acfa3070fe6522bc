//! Font source data structures
//!
//! This module contains everything related to the font programs being
//! composed: the in-memory program, outline data, metrics and the loader
//! that opens the contributing sources.

pub mod data;
pub mod loader;
pub mod metrics;
pub mod program;

// Explicit re-exports for public API
pub use data::{ContourData, OutlineData, PointData};
pub use loader::{open_contributors, Contributors, SourceError};
pub use metrics::{FontInfo, FontMetrics};
pub use program::{AltMapping, FontProgram, Glyph, GlyphIndex, GlyphSet, LookupKind, LookupTable};
