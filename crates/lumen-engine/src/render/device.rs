//! The seam between renderers and the GPU.
//!
//! Renderers build vertices, pick texture slots and decide when to flush;
//! a `RenderDevice` turns that into GPU work. `WgpuDevice` does it for real,
//! `HeadlessDevice` just records what it was asked to do.

use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use super::renderer2d::Renderer2DVertex;
use super::renderer3d::{MaterialFlags, Mesh, MeshId};
use super::texture::{Texture, TextureId};
use super::texture_units::{SlotLookup, TextureUnitManager};

/// Default number of texture slots a device exposes.
///
/// Matches wgpu's default `max_sampled_textures_per_shader_stage`.
pub const DEFAULT_TEXTURE_SLOTS: u32 = 16;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PassKind {
    /// Batched quads, alpha blended, no depth test.
    Quads2D,
    /// Indexed meshes with depth test.
    Meshes3D,
}

/// Per-draw data of a 3D submission.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ObjectBlock {
    pub model: [[f32; 4]; 4],
    pub tint: [f32; 4],
    pub tex_unit: u32,
    /// [`MaterialFlags`] bits.
    pub flags: u32,
    pub _pad: [u32; 2],
}

impl ObjectBlock {
    pub fn new(model: Mat4, tint: Vec4, tex_unit: u32, flags: MaterialFlags) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            tint: tint.to_array(),
            tex_unit,
            flags: flags.bits(),
            _pad: [0; 2],
        }
    }
}

pub trait RenderDevice {
    /// Number of texture slots a single draw may reference.
    fn texture_slots(&self) -> u32;

    /// Opens a pass; `scene_block` is the std140 scene uniform block.
    fn begin_pass(&mut self, kind: PassKind, scene_block: &[u8]);

    /// Makes `texture` visible at `slot` for every following draw.
    fn bind_texture(&mut self, slot: u32, texture: &Rc<Texture>);

    /// Draws `vertices` as quads (4 vertices each).
    fn draw_quads(&mut self, vertices: &[Renderer2DVertex]);

    fn draw_mesh(&mut self, mesh: &Rc<Mesh>, object: &ObjectBlock);

    fn end_pass(&mut self);
}

/// Device plus the texture-slot bookkeeping both renderers share.
pub struct RendererCommon<D: RenderDevice> {
    pub device: D,
    pub texture_units: TextureUnitManager,
}

impl<D: RenderDevice> RendererCommon<D> {
    pub fn new(device: D) -> Self {
        let texture_units = TextureUnitManager::new(device.texture_slots());
        Self { device, texture_units }
    }

    /// Resolves a slot for `texture`, binding it on the device when newly assigned.
    ///
    /// `None` means every slot is taken by another texture: the caller must
    /// flush its pending work, `clear()` the manager and call again.
    pub fn bind(&mut self, texture: &Rc<Texture>) -> Option<u32> {
        match self.texture_units.get_unit(texture.id()) {
            SlotLookup::Bound(slot) => Some(slot),
            SlotLookup::Assigned(slot) => {
                self.device.bind_texture(slot, texture);
                Some(slot)
            }
            SlotLookup::Full => None,
        }
    }
}

// ── headless ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    BeginPass { kind: PassKind, scene_block: Vec<u8> },
    BindTexture { slot: u32, texture: TextureId },
    DrawQuads { vertices: Vec<Renderer2DVertex> },
    DrawMesh { mesh: MeshId, object: ObjectBlock },
    EndPass,
}

/// Device that records commands instead of drawing.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    slots: u32,
    commands: Vec<DeviceCommand>,
}

impl HeadlessDevice {
    pub fn new(slots: u32) -> Self {
        Self { slots, commands: Vec::new() }
    }

    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DeviceCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Vertex slices of every quad draw, in order.
    pub fn quad_draws(&self) -> impl Iterator<Item = &[Renderer2DVertex]> {
        self.commands.iter().filter_map(|c| match c {
            DeviceCommand::DrawQuads { vertices } => Some(vertices.as_slice()),
            _ => None,
        })
    }

    pub fn mesh_draws(&self) -> impl Iterator<Item = &ObjectBlock> {
        self.commands.iter().filter_map(|c| match c {
            DeviceCommand::DrawMesh { object, .. } => Some(object),
            _ => None,
        })
    }

    /// Texture bound at `slot` by the latest bind recorded so far.
    pub fn bound_at(&self, slot: u32) -> Option<TextureId> {
        self.commands.iter().rev().find_map(|c| match c {
            DeviceCommand::BindTexture { slot: s, texture } if *s == slot => Some(*texture),
            _ => None,
        })
    }
}

impl RenderDevice for HeadlessDevice {
    fn texture_slots(&self) -> u32 {
        self.slots
    }

    fn begin_pass(&mut self, kind: PassKind, scene_block: &[u8]) {
        self.commands.push(DeviceCommand::BeginPass { kind, scene_block: scene_block.to_vec() });
    }

    fn bind_texture(&mut self, slot: u32, texture: &Rc<Texture>) {
        self.commands.push(DeviceCommand::BindTexture { slot, texture: texture.id() });
    }

    fn draw_quads(&mut self, vertices: &[Renderer2DVertex]) {
        self.commands.push(DeviceCommand::DrawQuads { vertices: vertices.to_vec() });
    }

    fn draw_mesh(&mut self, mesh: &Rc<Mesh>, object: &ObjectBlock) {
        self.commands.push(DeviceCommand::DrawMesh { mesh: mesh.id(), object: *object });
    }

    fn end_pass(&mut self) {
        self.commands.push(DeviceCommand::EndPass);
    }
}
