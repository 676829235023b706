//! wgpu implementation of [`RenderDevice`].
//!
//! Calls made while renderers run are only recorded. `encode` then uploads
//! the whole frame at once (all quad vertices into one buffer, scene and
//! object blocks into dynamic-offset rings, dirty textures and new meshes)
//! and replays the recording into a single render pass. Recording first
//! keeps queue writes from overwriting data an earlier draw still needs.

mod buffers;
mod cache;
mod pipelines;

use std::rc::{Rc, Weak};

use buffers::{QuadIndexBuffer, UniformRing, VertexBuffer};
use cache::{MeshCache, TextureCache};
use pipelines::Pipelines;

pub use pipelines::DEPTH_FORMAT;

use super::ctx::{RenderCtx, RenderTarget};
use super::device::{ObjectBlock, PassKind, RenderDevice, DEFAULT_TEXTURE_SLOTS};
use super::renderer2d::Renderer2DVertex;
use super::renderer3d::Mesh;
use super::texture::Texture;
use super::uniforms::scene_block_layout;

/// Texture bindings in the slot bind group; fixed by the shaders.
pub(crate) const TEXTURE_SLOTS: u32 = DEFAULT_TEXTURE_SLOTS;

/// Slot contents captured for one draw; kept alive until `encode`.
type SlotTable = Vec<Option<Rc<Texture>>>;

#[derive(Debug)]
enum Op {
    Begin { kind: PassKind, scene: usize },
    Quads { first_vertex: u32, vertex_count: u32, slots: usize },
    Mesh { mesh: Rc<Mesh>, object: usize, slots: usize },
    End,
}

/// Recorded frame: ops plus the data they index into.
#[derive(Debug, Default)]
struct Recording {
    ops: Vec<Op>,
    vertices: Vec<Renderer2DVertex>,
    scene_blocks: Vec<Vec<u8>>,
    objects: Vec<ObjectBlock>,
    slot_tables: Vec<SlotTable>,
}

struct GpuState {
    pipelines: Pipelines,
    sampler: wgpu::Sampler,
    placeholder: wgpu::TextureView,
    vertices: VertexBuffer,
    quad_indices: QuadIndexBuffer,
    scenes: UniformRing,
    objects: UniformRing,
}

impl GpuState {
    fn new(ctx: &RenderCtx<'_>) -> Self {
        let alignment = ctx.device.limits().min_uniform_buffer_offset_alignment;
        Self {
            pipelines: Pipelines::new(ctx.device, ctx.surface_format),
            sampler: ctx.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("lumen slot sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            }),
            placeholder: placeholder_view(ctx),
            vertices: VertexBuffer::new("lumen quad vbo"),
            quad_indices: QuadIndexBuffer::new(),
            scenes: UniformRing::new("lumen scene ring", &scene_block_layout(), alignment),
            objects: UniformRing::with_block_size(
                "lumen object ring",
                std::mem::size_of::<ObjectBlock>() as u32,
                alignment,
            ),
        }
    }
}

/// 1x1 opaque white view bound to empty slots.
fn placeholder_view(ctx: &RenderCtx<'_>) -> wgpu::TextureView {
    let extent = wgpu::Extent3d { width: 1, height: 1, depth_or_array_layers: 1 };
    let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("lumen placeholder texture"),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    ctx.queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &[255; 4],
        wgpu::TexelCopyBufferLayout { offset: 0, bytes_per_row: Some(4), rows_per_image: Some(1) },
        extent,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

pub struct WgpuDevice {
    /// Live bindings. Weak so a texture the app dropped can be evicted.
    slots: Vec<Option<Weak<Texture>>>,
    slots_dirty: bool,
    recording: Recording,
    clear_colour: Option<wgpu::Color>,

    gpu: Option<GpuState>,
    textures: TextureCache,
    meshes: MeshCache,
}

impl Default for WgpuDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl WgpuDevice {
    /// Creates the device. GPU objects are built on the first `encode`.
    pub fn new() -> Self {
        Self {
            slots: vec![None; TEXTURE_SLOTS as usize],
            slots_dirty: true,
            recording: Recording::default(),
            clear_colour: Some(wgpu::Color::BLACK),
            gpu: None,
            textures: TextureCache::default(),
            meshes: MeshCache::default(),
        }
    }

    /// Colour the frame is cleared to; `None` keeps previous contents.
    pub fn set_clear_colour(&mut self, colour: Option<wgpu::Color>) {
        self.clear_colour = colour;
    }

    /// Number of ops recorded since the last `encode`.
    pub fn recorded_ops(&self) -> usize {
        self.recording.ops.len()
    }

    /// Index of the slot table for the next draw, snapshotting it if it changed.
    fn current_slots(&mut self) -> usize {
        if self.slots_dirty || self.recording.slot_tables.is_empty() {
            let table = self.slots.iter().map(|slot| slot.as_ref().and_then(Weak::upgrade)).collect();
            self.recording.slot_tables.push(table);
            self.slots_dirty = false;
        }
        self.recording.slot_tables.len() - 1
    }

    /// Uploads the recorded frame and replays it into one render pass.
    pub fn encode(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        let recording = std::mem::take(&mut self.recording);
        self.slots_dirty = true;

        // ── uploads ──────────────────────────────────────────────────────
        let gpu = self.ensure_gpu(ctx);
        gpu.vertices
            .edit(ctx.device, ctx.queue, bytemuck::cast_slice(&recording.vertices), 0);

        let max_quads = recording
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Quads { vertex_count, .. } => Some(vertex_count / 4),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        if max_quads > 0 {
            gpu.quad_indices.ensure_quads(ctx.device, max_quads);
        }

        gpu.scenes.upload(
            ctx.device,
            ctx.queue,
            &gpu.pipelines.scene_bgl,
            recording.scene_blocks.iter().map(Vec::as_slice),
        );
        gpu.objects.upload(
            ctx.device,
            ctx.queue,
            &gpu.pipelines.object_bgl,
            recording.objects.iter().map(bytemuck::bytes_of),
        );

        for texture in recording.slot_tables.iter().flatten().flatten() {
            self.textures.sync(ctx.device, ctx.queue, texture);
        }
        for op in &recording.ops {
            if let Op::Mesh { mesh, .. } = op {
                self.meshes.sync(ctx.device, mesh);
            }
        }

        let Some(gpu) = self.gpu.as_ref() else { return };
        let slot_groups: Vec<wgpu::BindGroup> = recording
            .slot_tables
            .iter()
            .map(|table| self.slot_bind_group(ctx.device, gpu, table))
            .collect();

        // ── replay ───────────────────────────────────────────────────────
        let load = match self.clear_colour {
            Some(c) => wgpu::LoadOp::Clear(c),
            None => wgpu::LoadOp::Load,
        };
        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("lumen frame pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations { load, store: wgpu::StoreOp::Store },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: target.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let mut draws = 0u32;
        for op in &recording.ops {
            match op {
                Op::Begin { kind, scene } => {
                    let Some(scene_group) = gpu.scenes.bind_group() else { continue };
                    let pipeline = match kind {
                        PassKind::Quads2D => &gpu.pipelines.quads,
                        PassKind::Meshes3D => &gpu.pipelines.meshes,
                    };
                    rpass.set_pipeline(pipeline);
                    rpass.set_bind_group(0, scene_group, &[gpu.scenes.offset(*scene)]);
                }
                Op::Quads { first_vertex, vertex_count, slots } => {
                    let (Some(vbo), Some(ibo)) = (gpu.vertices.buffer(), gpu.quad_indices.buffer()) else {
                        continue;
                    };
                    rpass.set_bind_group(1, &slot_groups[*slots], &[]);
                    rpass.set_vertex_buffer(0, vbo.slice(..));
                    rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint32);
                    let count = QuadIndexBuffer::count(vertex_count / 4);
                    rpass.draw_indexed(0..count, *first_vertex as i32, 0..1);
                    draws += 1;
                }
                Op::Mesh { mesh, object, slots } => {
                    let (Some(gpu_mesh), Some(object_group)) =
                        (self.meshes.get(mesh.id()), gpu.objects.bind_group())
                    else {
                        continue;
                    };
                    rpass.set_bind_group(1, &slot_groups[*slots], &[]);
                    rpass.set_bind_group(2, object_group, &[gpu.objects.offset(*object)]);
                    rpass.set_vertex_buffer(0, gpu_mesh.vbo.slice(..));
                    rpass.set_index_buffer(gpu_mesh.ibo.slice(..), wgpu::IndexFormat::Uint32);
                    rpass.draw_indexed(0..gpu_mesh.index_count, 0, 0..1);
                    draws += 1;
                }
                Op::End => {}
            }
        }
        drop(rpass);

        self.textures.evict_dead();
        self.meshes.evict_dead();
        log::trace!(
            "frame: {draws} draws, {} vertices, {} textures resident",
            recording.vertices.len(),
            self.textures.len()
        );
    }

    fn ensure_gpu(&mut self, ctx: &RenderCtx<'_>) -> &mut GpuState {
        if self.gpu.as_ref().is_some_and(|g| g.pipelines.format != ctx.surface_format) {
            log::debug!("surface format changed to {:?}; rebuilding pipelines", ctx.surface_format);
            self.gpu = None;
        }
        self.gpu.get_or_insert_with(|| GpuState::new(ctx))
    }

    fn slot_bind_group(&self, device: &wgpu::Device, gpu: &GpuState, table: &SlotTable) -> wgpu::BindGroup {
        let mut entries: Vec<wgpu::BindGroupEntry<'_>> = table
            .iter()
            .enumerate()
            .map(|(slot, texture)| {
                let view = texture
                    .as_ref()
                    .and_then(|t| self.textures.view(t.id()))
                    .unwrap_or(&gpu.placeholder);
                wgpu::BindGroupEntry { binding: slot as u32, resource: wgpu::BindingResource::TextureView(view) }
            })
            .collect();
        entries.push(wgpu::BindGroupEntry {
            binding: TEXTURE_SLOTS,
            resource: wgpu::BindingResource::Sampler(&gpu.sampler),
        });

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lumen texture slots"),
            layout: &gpu.pipelines.textures_bgl,
            entries: &entries,
        })
    }
}

impl RenderDevice for WgpuDevice {
    fn texture_slots(&self) -> u32 {
        TEXTURE_SLOTS
    }

    fn begin_pass(&mut self, kind: PassKind, scene_block: &[u8]) {
        let scene = self.recording.scene_blocks.len();
        self.recording.scene_blocks.push(scene_block.to_vec());
        self.recording.ops.push(Op::Begin { kind, scene });
    }

    fn bind_texture(&mut self, slot: u32, texture: &Rc<Texture>) {
        let Some(entry) = self.slots.get_mut(slot as usize) else {
            log::warn!("texture slot {slot} out of range (0..{TEXTURE_SLOTS})");
            return;
        };
        *entry = Some(Rc::downgrade(texture));
        self.slots_dirty = true;
    }

    fn draw_quads(&mut self, vertices: &[Renderer2DVertex]) {
        if vertices.is_empty() {
            return;
        }
        let slots = self.current_slots();
        let first_vertex = self.recording.vertices.len() as u32;
        self.recording.vertices.extend_from_slice(vertices);
        self.recording.ops.push(Op::Quads { first_vertex, vertex_count: vertices.len() as u32, slots });
    }

    fn draw_mesh(&mut self, mesh: &Rc<Mesh>, object: &ObjectBlock) {
        let slots = self.current_slots();
        let index = self.recording.objects.len();
        self.recording.objects.push(*object);
        self.recording.ops.push(Op::Mesh { mesh: Rc::clone(mesh), object: index, slots });
    }

    fn end_pass(&mut self) {
        self.recording.ops.push(Op::End);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_vertices(n: usize) -> Vec<Renderer2DVertex> {
        vec![Renderer2DVertex::default(); n * 4]
    }

    #[test]
    fn draws_append_to_one_vertex_stream() {
        let mut dev = WgpuDevice::new();
        dev.begin_pass(PassKind::Quads2D, &[0; 176]);
        dev.draw_quads(&quad_vertices(2));
        dev.draw_quads(&quad_vertices(3));
        dev.end_pass();

        let firsts: Vec<(u32, u32)> = dev
            .recording
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Quads { first_vertex, vertex_count, .. } => Some((*first_vertex, *vertex_count)),
                _ => None,
            })
            .collect();
        assert_eq!(firsts, vec![(0, 8), (8, 12)]);
        assert_eq!(dev.recorded_ops(), 4);
    }

    #[test]
    fn slot_tables_snapshot_only_on_change() {
        let mut dev = WgpuDevice::new();
        let a = Texture::white();
        let b = Texture::white();

        dev.bind_texture(0, &a);
        dev.draw_quads(&quad_vertices(1));
        dev.draw_quads(&quad_vertices(1));
        dev.bind_texture(0, &b);
        dev.draw_quads(&quad_vertices(1));

        let tables = &dev.recording.slot_tables;
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0][0].as_ref().map(|t| t.id()), Some(a.id()));
        assert_eq!(tables[1][0].as_ref().map(|t| t.id()), Some(b.id()));
    }

    #[test]
    fn bound_slots_do_not_keep_textures_alive() {
        let mut dev = WgpuDevice::new();
        let tex = Texture::white();
        dev.bind_texture(1, &tex);
        assert_eq!(Rc::strong_count(&tex), 1);

        drop(tex);
        dev.draw_quads(&quad_vertices(1));
        assert!(dev.recording.slot_tables[0].iter().all(Option::is_none));
    }

    #[test]
    fn snapshot_holds_texture_until_encode() {
        let mut dev = WgpuDevice::new();
        let tex = Texture::white();
        dev.bind_texture(0, &tex);
        dev.draw_quads(&quad_vertices(1));
        assert_eq!(Rc::strong_count(&tex), 2);

        dev.recording = Recording::default();
        assert_eq!(Rc::strong_count(&tex), 1);
    }

    #[test]
    fn out_of_range_slot_is_ignored() {
        let mut dev = WgpuDevice::new();
        dev.bind_texture(TEXTURE_SLOTS, &Texture::white());
        assert!(dev.slots.iter().all(Option::is_none));
    }

    #[test]
    fn empty_quad_draw_is_not_recorded() {
        let mut dev = WgpuDevice::new();
        dev.draw_quads(&[]);
        assert_eq!(dev.recorded_ops(), 0);
    }
}
