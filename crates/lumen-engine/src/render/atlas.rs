//! Free-rectangle texture atlas.
//!
//! Packs images into one base texture and hands back `SubTexture` views.
//! Free space is a list of non-overlapping rectangles; a placement takes the
//! top-left corner of the first rectangle it fits in and splits the rest.
//! Adjacent free rectangles are never merged, so the atlas is meant to be
//! filled once (glyphs, sprite sheets) rather than churned.

use std::path::Path;
use std::rc::Rc;

use thiserror::Error;

use super::sub_texture::SubTexture;
use super::texture::{load_image, Texture, TextureError, TextureId};

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("image has {got} channels, atlas has {expected}")]
    ChannelMismatch { expected: u32, got: u32 },
    #[error("pixel data is {got} bytes, expected {expected}")]
    DataSize { expected: usize, got: usize },
    #[error("no free space for a {width}x{height} image")]
    NoSpace { width: u32, height: u32 },
    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Axis-aligned rectangle in atlas pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SimpleRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl SimpleRect {
    #[inline]
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn overlaps(&self, other: &SimpleRect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

#[derive(Debug, Copy, Clone)]
pub struct AtlasConfig {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    /// Initial capacity of the free list.
    pub reserved_spaces: usize,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self { width: 4096, height: 4096, channels: 4, reserved_spaces: 32 }
    }
}

pub struct TextureAtlas {
    base: Rc<Texture>,
    spaces: Vec<SimpleRect>,
}

impl TextureAtlas {
    pub fn new(config: AtlasConfig) -> Result<Self, AtlasError> {
        let base = Texture::new(config.width, config.height, config.channels, None)?;
        let mut spaces = Vec::with_capacity(config.reserved_spaces.max(1));
        spaces.push(SimpleRect { x: 0, y: 0, w: config.width, h: config.height });
        Ok(Self { base, spaces })
    }

    /// Packs a `width × height` image and returns its view.
    ///
    /// `data` is tightly packed with `channels` bytes per pixel. Zero-sized
    /// requests return an empty view without consuming space.
    pub fn add(
        &mut self,
        width: u32,
        height: u32,
        channels: u32,
        data: &[u8],
    ) -> Result<SubTexture, AtlasError> {
        if channels != self.channels() {
            return Err(AtlasError::ChannelMismatch { expected: self.channels(), got: channels });
        }

        if width == 0 || height == 0 {
            return Ok(SubTexture::empty(self.base.clone()));
        }

        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(AtlasError::DataSize { expected, got: data.len() });
        }

        let Some(index) = self.spaces.iter().position(|r| width <= r.w && height <= r.h) else {
            return Err(AtlasError::NoSpace { width, height });
        };

        let space = self.spaces[index];
        self.base.edit(space.x, space.y, width, height, data);
        let sub = SubTexture::from_pixels(self.base.clone(), space.x, space.y, width, height);

        match (width == space.w, height == space.h) {
            (true, true) => {
                self.spaces.remove(index);
            }
            (true, false) => {
                let r = &mut self.spaces[index];
                r.y += height;
                r.h -= height;
            }
            (false, true) => {
                let r = &mut self.spaces[index];
                r.x += width;
                r.w -= width;
            }
            (false, false) => {
                // below the image, at its width
                let below = SimpleRect {
                    x: space.x,
                    y: space.y + height,
                    w: width,
                    h: space.h - height,
                };
                // right of the image, full height
                let r = &mut self.spaces[index];
                r.x += width;
                r.w -= width;
                self.spaces.push(below);
                self.spaces.sort_by_key(|r| r.w);
            }
        }

        log::trace!(
            "atlas {:?}: placed {width}x{height} at ({}, {}), {} free rects",
            self.id(),
            space.x,
            space.y,
            self.spaces.len()
        );
        Ok(sub)
    }

    /// Decodes an image file with the atlas channel count and packs it.
    pub fn add_image(&mut self, path: impl AsRef<Path>) -> Result<SubTexture, AtlasError> {
        let channels = self.channels();
        let (w, h, data) = load_image(path.as_ref(), channels)?;
        self.add(w, h, channels, &data)
    }

    #[inline]
    pub fn channels(&self) -> u32 {
        self.base.channels()
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.base.id()
    }

    #[inline]
    pub fn base_texture(&self) -> &Rc<Texture> {
        &self.base
    }

    pub fn free_rects(&self) -> &[SimpleRect] {
        &self.spaces
    }

    pub fn free_area(&self) -> u64 {
        self.spaces.iter().map(SimpleRect::area).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use proptest::prelude::*;

    fn atlas(w: u32, h: u32) -> TextureAtlas {
        TextureAtlas::new(AtlasConfig { width: w, height: h, channels: 4, reserved_spaces: 8 })
            .unwrap()
    }

    fn pixels(w: u32, h: u32) -> Vec<u8> {
        vec![200; (w * h * 4) as usize]
    }

    fn placed_rect(atlas: &TextureAtlas, sub: &SubTexture) -> SimpleRect {
        let dims = Vec2::new(atlas.base_texture().width_f(), atlas.base_texture().height_f());
        let start = (sub.uv_start() * dims).round();
        SimpleRect {
            x: start.x as u32,
            y: start.y as u32,
            w: sub.size().x as u32,
            h: sub.size().y as u32,
        }
    }

    #[test]
    fn zero_size_leaves_free_list_untouched() {
        let mut a = atlas(64, 64);
        let before = a.free_rects().to_vec();
        let sub = a.add(0, 0, 4, &[]).unwrap();
        assert_eq!(sub.size(), Vec2::ZERO);
        assert!(Rc::ptr_eq(sub.texture(), a.base_texture()));
        assert_eq!(a.free_rects(), before.as_slice());
    }

    #[test]
    fn rejects_channel_mismatch_and_bad_data() {
        let mut a = atlas(64, 64);
        assert!(matches!(
            a.add(2, 2, 3, &[0; 12]),
            Err(AtlasError::ChannelMismatch { expected: 4, got: 3 })
        ));
        assert!(matches!(a.add(2, 2, 4, &[0; 3]), Err(AtlasError::DataSize { .. })));
    }

    #[test]
    fn exact_fit_consumes_whole_rect() {
        let mut a = atlas(16, 16);
        let sub = a.add(16, 16, 4, &pixels(16, 16)).unwrap();
        assert_eq!(sub.uv_end(), Vec2::ONE);
        assert!(a.free_rects().is_empty());
        assert!(matches!(a.add(1, 1, 4, &pixels(1, 1)), Err(AtlasError::NoSpace { .. })));
    }

    #[test]
    fn full_width_shrinks_vertically() {
        let mut a = atlas(16, 16);
        a.add(16, 4, 4, &pixels(16, 4)).unwrap();
        assert_eq!(a.free_rects(), &[SimpleRect { x: 0, y: 4, w: 16, h: 12 }]);
    }

    #[test]
    fn full_height_shrinks_horizontally() {
        let mut a = atlas(16, 16);
        a.add(5, 16, 4, &pixels(5, 16)).unwrap();
        assert_eq!(a.free_rects(), &[SimpleRect { x: 5, y: 0, w: 11, h: 16 }]);
    }

    #[test]
    fn general_split_sorts_by_width() {
        let mut a = atlas(32, 32);
        a.add(10, 8, 4, &pixels(10, 8)).unwrap();
        assert_eq!(
            a.free_rects(),
            &[
                SimpleRect { x: 0, y: 8, w: 10, h: 24 },
                SimpleRect { x: 10, y: 0, w: 22, h: 32 },
            ]
        );
        assert_eq!(a.free_area(), 32 * 32 - 80);
    }

    #[test]
    fn pixels_land_in_base_texture() {
        let mut a = atlas(8, 8);
        a.add(8, 2, 4, &pixels(8, 2)).unwrap();
        let sub = a.add(2, 2, 4, &[7; 16]).unwrap();
        let r = placed_rect(&a, &sub);
        assert_eq!((r.x, r.y), (0, 2));

        let px = a.base_texture().pixels();
        let at = |x: u32, y: u32| px[((y * 8 + x) * 4) as usize];
        assert_eq!(at(0, 0), 200);
        assert_eq!(at(1, 3), 7);
        assert_eq!(at(2, 3), 0);
    }

    #[test]
    fn add_image_packs_decoded_rgb_as_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stripe.png");
        image::RgbImage::from_raw(3, 1, vec![10, 20, 30, 40, 50, 60, 70, 80, 90])
            .unwrap()
            .save(&path)
            .unwrap();

        let mut a = atlas(8, 8);
        let sub = a.add_image(&path).unwrap();
        assert_eq!(sub.size(), Vec2::new(3.0, 1.0));
        assert_eq!(&a.base_texture().pixels()[..12], &[10, 20, 30, 255, 40, 50, 60, 255, 70, 80, 90, 255]);
    }

    #[test]
    fn add_image_surfaces_decode_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_an_image.png");
        std::fs::write(&path, b"plain text").unwrap();

        let mut a = atlas(8, 8);
        let before = a.free_rects().to_vec();
        assert!(matches!(a.add_image(&path), Err(AtlasError::Texture(TextureError::Image { .. }))));
        assert_eq!(a.free_rects(), before.as_slice());
    }

    proptest! {
        #[test]
        fn placements_never_overlap(sizes in prop::collection::vec((0u32..24, 0u32..24), 1..40)) {
            let mut a = atlas(96, 96);
            let mut placed: Vec<SimpleRect> = Vec::new();
            let mut free_area = a.free_area();

            for (w, h) in sizes {
                let Ok(sub) = a.add(w, h, 4, &pixels(w, h)) else { continue };
                if w == 0 || h == 0 {
                    continue;
                }
                let r = placed_rect(&a, &sub);
                prop_assert_eq!((r.w, r.h), (w, h));
                prop_assert!(r.x + r.w <= 96 && r.y + r.h <= 96);
                for p in &placed {
                    prop_assert!(!r.overlaps(p), "{:?} overlaps {:?}", r, p);
                }
                placed.push(r);

                prop_assert!(a.free_area() < free_area);
                free_area = a.free_area();
            }

            let free = a.free_rects();
            for (i, f) in free.iter().enumerate() {
                for p in &placed {
                    prop_assert!(!f.overlaps(p), "free {:?} overlaps placed {:?}", f, p);
                }
                for g in &free[i + 1..] {
                    prop_assert!(!f.overlaps(g), "free {:?} overlaps free {:?}", f, g);
                }
            }
        }
    }
}
