use std::path::Path;

use glam::Vec2;
use thiserror::Error;

/// Error returned by [`Font::from_bytes`] and [`Font::from_file`].
#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("failed to read font file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("font parse error: {0}")]
    Parse(String),
}

/// Coverage bitmap and metrics of one character.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterizedGlyph {
    pub width: u32,
    pub height: u32,
    /// Offset from the pen position on the baseline to the bitmap's top-left (+Y down).
    pub bearing: Vec2,
    /// Horizontal pen advance in pixels.
    pub advance: f32,
    /// `width * height` bytes of 8-bit coverage, rows top to bottom.
    pub coverage: Vec<u8>,
}

/// Anything that can turn characters into coverage bitmaps.
pub trait GlyphSource {
    /// Returns `None` when the source has no glyph for `ch`.
    fn rasterize(&self, ch: char) -> Option<RasterizedGlyph>;
}

/// A TrueType/OpenType face rasterized at a fixed pixel size.
pub struct Font {
    inner: fontdue::Font,
    px: f32,
}

impl Font {
    pub fn from_bytes(bytes: &[u8], px: f32) -> Result<Self, FontLoadError> {
        let inner = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError::Parse(e.to_string()))?;
        Ok(Self { inner, px })
    }

    pub fn from_file(path: impl AsRef<Path>, px: f32) -> Result<Self, FontLoadError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| FontLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(&bytes, px)
    }

    #[inline]
    pub fn px(&self) -> f32 {
        self.px
    }
}

impl GlyphSource for Font {
    fn rasterize(&self, ch: char) -> Option<RasterizedGlyph> {
        if self.inner.lookup_glyph_index(ch) == 0 && ch != ' ' {
            return None;
        }
        let (m, coverage) = self.inner.rasterize(ch, self.px);
        // fontdue reports ymin from the baseline, +Y up
        let top = -(m.ymin + m.height as i32);
        Some(RasterizedGlyph {
            width: m.width as u32,
            height: m.height as u32,
            bearing: Vec2::new(m.xmin as f32, top as f32),
            advance: m.advance_width.round(),
            coverage,
        })
    }
}

/// Expands 8-bit coverage to white RGBA with coverage in alpha.
pub fn coverage_to_rgba(coverage: &[u8]) -> Vec<u8> {
    coverage.iter().flat_map(|&a| [255, 255, 255, a]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_expands_to_white_alpha() {
        assert_eq!(coverage_to_rgba(&[0, 128]), vec![255, 255, 255, 0, 255, 255, 255, 128]);
    }

    #[test]
    fn garbage_bytes_fail_to_parse() {
        assert!(matches!(Font::from_bytes(b"not a font", 16.0), Err(FontLoadError::Parse(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = Font::from_file("/nonexistent/font.ttf", 16.0).err();
        assert!(matches!(err, Some(FontLoadError::Io { .. })));
    }
}
