//! Binary table patching
//!
//! Works on the composed binaries through editable table documents: dump,
//! edit field by field, apply back onto the binary.

pub mod artifacts;
pub mod codec;
pub mod document;
pub mod patch;
pub mod supplemental;

pub use artifacts::ArtifactError;
pub use document::{DocNode, TableDocument};
pub use patch::{fix_cmap_table, fix_os2_table, fix_post_table, patch_all};
