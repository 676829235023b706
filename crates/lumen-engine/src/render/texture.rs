use std::cell::{Cell, Ref, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use thiserror::Error;

/// Error returned when a texture cannot be created or loaded.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("unsupported channel count {0} (expected 3 or 4)")]
    UnsupportedChannels(u32),
    #[error("pixel data is {got} bytes, expected {expected}")]
    DataSize { expected: usize, got: usize },
    #[error("failed to load image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Process-unique texture identity.
///
/// Used by the texture-unit allocator and by devices to key GPU mirrors.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) u32);

impl TextureId {
    fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Pixel rectangle of a texture.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureRegion {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl TextureRegion {
    /// Smallest region covering both.
    pub fn union(self, other: TextureRegion) -> TextureRegion {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.w).max(other.x + other.w);
        let bottom = (self.y + self.h).max(other.y + other.h);
        TextureRegion { x, y, w: right - x, h: bottom - y }
    }
}

/// CPU-owned texture image.
///
/// Pixels live on the CPU; each mutation bumps `revision` and grows the dirty
/// region, and devices upload that region when they see a newer revision. Textures are shared with
/// `Rc` (sub-textures and materials hold references to their base).
#[derive(Debug)]
pub struct Texture {
    id: TextureId,
    width: u32,
    height: u32,
    channels: u32,
    pixels: RefCell<Vec<u8>>,
    revision: Cell<u64>,
    dirty: Cell<Option<TextureRegion>>,
}

impl Texture {
    /// Creates a texture from tightly packed rows.
    ///
    /// `data = None` yields a zeroed (transparent) image.
    pub fn new(
        width: u32,
        height: u32,
        channels: u32,
        data: Option<&[u8]>,
    ) -> Result<Rc<Self>, TextureError> {
        if channels != 3 && channels != 4 {
            return Err(TextureError::UnsupportedChannels(channels));
        }

        let expected = width as usize * height as usize * channels as usize;
        let pixels = match data {
            Some(bytes) if bytes.len() != expected => {
                return Err(TextureError::DataSize { expected, got: bytes.len() });
            }
            Some(bytes) => bytes.to_vec(),
            None => vec![0; expected],
        };

        Ok(Rc::new(Self {
            id: TextureId::next(),
            width,
            height,
            channels,
            pixels: RefCell::new(pixels),
            revision: Cell::new(0),
            dirty: Cell::new(None),
        }))
    }

    /// 1×1 opaque white RGBA texture.
    pub fn white() -> Rc<Self> {
        Rc::new(Self {
            id: TextureId::next(),
            width: 1,
            height: 1,
            channels: 4,
            pixels: RefCell::new(vec![255; 4]),
            revision: Cell::new(0),
            dirty: Cell::new(None),
        })
    }

    /// Decodes an image file into a texture with `channels` channels.
    pub fn from_file(path: impl AsRef<Path>, channels: u32) -> Result<Rc<Self>, TextureError> {
        let (w, h, data) = load_image(path.as_ref(), channels)?;
        Self::new(w, h, channels, Some(&data))
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.id
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn width_f(&self) -> f32 {
        self.width as f32
    }

    #[inline]
    pub fn height_f(&self) -> f32 {
        self.height as f32
    }

    #[inline]
    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// Monotonic edit counter.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    /// Borrows the pixel store.
    pub fn pixels(&self) -> Ref<'_, Vec<u8>> {
        self.pixels.borrow()
    }

    /// Writes a `width × height` sub-region at `(x_offset, y_offset)`.
    ///
    /// `data` is tightly packed with the texture's channel count. Regions that
    /// fall partly outside the texture are clipped; returns `false` when the
    /// data length does not match the region.
    pub fn edit(&self, x_offset: u32, y_offset: u32, width: u32, height: u32, data: &[u8]) -> bool {
        let ch = self.channels as usize;
        if data.len() != width as usize * height as usize * ch {
            log::warn!(
                "texture {:?}: edit data is {} bytes, expected {}",
                self.id,
                data.len(),
                width as usize * height as usize * ch
            );
            return false;
        }

        let copy_w = width.min(self.width.saturating_sub(x_offset)) as usize;
        let copy_h = height.min(self.height.saturating_sub(y_offset)) as usize;
        if copy_w == 0 || copy_h == 0 {
            return true;
        }

        let mut pixels = self.pixels.borrow_mut();
        let dst_stride = self.width as usize * ch;
        let src_stride = width as usize * ch;
        for row in 0..copy_h {
            let dst = (y_offset as usize + row) * dst_stride + x_offset as usize * ch;
            let src = row * src_stride;
            pixels[dst..dst + copy_w * ch].copy_from_slice(&data[src..src + copy_w * ch]);
        }
        drop(pixels);

        let region = TextureRegion { x: x_offset, y: y_offset, w: copy_w as u32, h: copy_h as u32 };
        let dirty = match self.dirty.get() {
            Some(prev) => prev.union(region),
            None => region,
        };
        self.dirty.set(Some(dirty));
        self.revision.set(self.revision.get() + 1);
        true
    }

    /// Returns the region edited since the last call and clears it.
    pub fn take_dirty_region(&self) -> Option<TextureRegion> {
        self.dirty.take()
    }

    /// Copies `region` out as tightly packed RGBA8 rows.
    pub fn region_rgba8(&self, region: TextureRegion) -> Vec<u8> {
        let pixels = self.pixels.borrow();
        let ch = self.channels as usize;
        let stride = self.width as usize * ch;
        let mut out = Vec::with_capacity(region.w as usize * region.h as usize * 4);
        for row in region.y..region.y + region.h {
            let start = row as usize * stride + region.x as usize * ch;
            let src = &pixels[start..start + region.w as usize * ch];
            match ch {
                4 => out.extend_from_slice(src),
                _ => out.extend(src.chunks_exact(3).flat_map(|p| [p[0], p[1], p[2], 255])),
            }
        }
        out
    }

    /// Returns the pixels expanded to RGBA8, as required by the GPU upload path.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let pixels = self.pixels.borrow();
        match self.channels {
            4 => pixels.clone(),
            _ => pixels
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
        }
    }
}

/// Decodes an image into tightly packed rows with the requested channel count.
pub(crate) fn load_image(path: &Path, channels: u32) -> Result<(u32, u32, Vec<u8>), TextureError> {
    let img = image::open(path).map_err(|source| TextureError::Image {
        path: path.display().to_string(),
        source,
    })?;

    let (w, h) = (img.width(), img.height());
    let data = match channels {
        3 => img.to_rgb8().into_raw(),
        4 => img.to_rgba8().into_raw(),
        other => return Err(TextureError::UnsupportedChannels(other)),
    };
    Ok((w, h, data))
}
