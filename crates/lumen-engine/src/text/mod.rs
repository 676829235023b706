//! Font loading and glyph rasterization.

mod font;

pub use font::{coverage_to_rgba, Font, FontLoadError, GlyphSource, RasterizedGlyph};
