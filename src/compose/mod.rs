//! Font composition
//!
//! The stages that turn two contributing sources into one merged program,
//! in pipeline order:
//! - conflict: which contributor owns each code point
//! - flatten: alternate mappings made into real glyphs
//! - transform: italic shear, width classes, slashed zero, zenkaku space
//! - lookups: layout table stripping
//! - icons: the optional icon graft
//! - merge: the structural merge
//! - metadata: names and vertical metrics

pub mod conflict;
pub mod context;
pub mod flatten;
pub mod icons;
pub mod lookups;
pub mod merge;
pub mod metadata;
pub mod pipeline;
pub mod policy;
pub mod transform;

pub use context::PipelineContext;
pub use pipeline::{compose_all, generate_style};
pub use policy::{CompositionPolicy, StyleSpec, STYLES};
