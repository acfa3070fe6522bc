//! Geometric primitives shared by the glyph transforms

pub mod utilities;
pub mod width;

// Re-export commonly used items
pub use utilities::{centering_offset, italic_shear, scale_x, shift_x, ITALIC_SLOPE_DEGREES};
pub use width::{WidthClass, WidthGrid};
