use std::ops::RangeInclusive;

use glam::Vec2;

use crate::render::atlas::{AtlasConfig, AtlasError, TextureAtlas};
use crate::render::sub_texture::SubTexture;
use crate::text::{coverage_to_rgba, GlyphSource};

/// Layout metrics and atlas view of one character.
#[derive(Debug, Clone)]
pub struct GlyphData {
    pub size: Vec2,
    /// Pen position to bitmap top-left, +Y down.
    pub bearing: Vec2,
    pub advance: f32,
    pub sub_texture: SubTexture,
}

/// Glyphs of a contiguous character range packed into one atlas.
pub struct GlyphTable {
    atlas: TextureAtlas,
    first: u32,
    glyphs: Vec<Option<GlyphData>>,
}

impl GlyphTable {
    /// Rasterizes every character of `range` into a fresh atlas.
    ///
    /// Characters the source cannot rasterize, or that no longer fit, are
    /// logged and left out of the table.
    pub fn build(
        source: &dyn GlyphSource,
        range: RangeInclusive<char>,
        atlas: AtlasConfig,
    ) -> Result<Self, AtlasError> {
        let mut atlas = TextureAtlas::new(AtlasConfig { channels: 4, ..atlas })?;
        let first = *range.start() as u32;
        let mut glyphs = Vec::new();
        let mut packed = 0usize;

        for ch in range {
            let Some(raster) = source.rasterize(ch) else {
                log::warn!("no glyph for {ch:?}");
                glyphs.push(None);
                continue;
            };

            let rgba = coverage_to_rgba(&raster.coverage);
            match atlas.add(raster.width, raster.height, 4, &rgba) {
                Ok(sub_texture) => {
                    packed += 1;
                    glyphs.push(Some(GlyphData {
                        size: Vec2::new(raster.width as f32, raster.height as f32),
                        bearing: raster.bearing,
                        advance: raster.advance,
                        sub_texture,
                    }));
                }
                Err(e) => {
                    log::warn!("glyph {ch:?} left out of atlas: {e}");
                    glyphs.push(None);
                }
            }
        }

        log::debug!(
            "glyph atlas {:?}: {packed}/{} glyphs, {} px free",
            atlas.id(),
            glyphs.len(),
            atlas.free_area()
        );
        Ok(Self { atlas, first, glyphs })
    }

    pub fn get(&self, ch: char) -> Option<&GlyphData> {
        let index = (ch as u32).checked_sub(self.first)? as usize;
        self.glyphs.get(index)?.as_ref()
    }

    pub fn atlas(&self) -> &TextureAtlas {
        &self.atlas
    }

    pub fn len(&self) -> usize {
        self.glyphs.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
