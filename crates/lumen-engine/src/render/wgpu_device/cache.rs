use std::collections::HashMap;
use std::rc::{Rc, Weak};

use wgpu::util::DeviceExt;

use crate::render::renderer3d::{Mesh, MeshId};
use crate::render::texture::{Texture, TextureId};

/// GPU mirror of a CPU texture.
pub(super) struct GpuTexture {
    source: Weak<Texture>,
    revision: u64,
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl GpuTexture {
    fn create(device: &wgpu::Device, label: &str, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    /// Writes an RGBA8 sub-region.
    pub(super) fn edit(&self, queue: &wgpu::Queue, x: u32, y: u32, width: u32, height: u32, rgba: &[u8]) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
    }
}

/// Texture mirrors keyed by id, refreshed when the CPU revision moves.
#[derive(Default)]
pub(super) struct TextureCache {
    entries: HashMap<TextureId, GpuTexture>,
}

impl TextureCache {
    /// Creates the mirror on first sight with a full upload; afterwards only
    /// the region edited since the last sync is written.
    pub(super) fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, texture: &Rc<Texture>) {
        let id = texture.id();
        let (width, height) = (texture.width(), texture.height());

        if let Some(entry) = self.entries.get_mut(&id) {
            if entry.revision == texture.revision() {
                return;
            }
            if let Some(r) = texture.take_dirty_region() {
                entry.edit(queue, r.x, r.y, r.w, r.h, &texture.region_rgba8(r));
                log::trace!("texture {}: {}x{} region at ({}, {}) uploaded", id.raw(), r.w, r.h, r.x, r.y);
            }
            entry.revision = texture.revision();
            return;
        }

        let label = format!("lumen texture {}", id.raw());
        let (tex, view) = GpuTexture::create(device, &label, width, height);
        let entry = GpuTexture { source: Rc::downgrade(texture), revision: texture.revision(), texture: tex, view };
        entry.edit(queue, 0, 0, width, height, &texture.to_rgba8());
        texture.take_dirty_region();
        log::trace!("texture {} uploaded at revision {}", id.raw(), entry.revision);
        self.entries.insert(id, entry);
    }

    pub(super) fn view(&self, id: TextureId) -> Option<&wgpu::TextureView> {
        self.entries.get(&id).map(|e| &e.view)
    }

    /// Drops mirrors whose CPU texture is gone.
    pub(super) fn evict_dead(&mut self) {
        self.entries.retain(|_, e| e.source.strong_count() > 0);
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }
}

pub(super) struct GpuMesh {
    source: Weak<Mesh>,
    pub vbo: wgpu::Buffer,
    pub ibo: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Default)]
pub(super) struct MeshCache {
    entries: HashMap<MeshId, GpuMesh>,
}

impl MeshCache {
    pub(super) fn sync(&mut self, device: &wgpu::Device, mesh: &Rc<Mesh>) {
        self.entries.entry(mesh.id()).or_insert_with(|| GpuMesh {
            source: Rc::downgrade(mesh),
            vbo: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("lumen mesh vbo"),
                contents: bytemuck::cast_slice(mesh.vertices()),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            ibo: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("lumen mesh ibo"),
                contents: bytemuck::cast_slice(mesh.indices()),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: mesh.index_count(),
        });
    }

    pub(super) fn get(&self, id: MeshId) -> Option<&GpuMesh> {
        self.entries.get(&id)
    }

    pub(super) fn evict_dead(&mut self) {
        self.entries.retain(|_, e| e.source.strong_count() > 0);
    }
}
