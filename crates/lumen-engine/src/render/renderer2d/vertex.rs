use bytemuck::{Pod, Zeroable};
use glam::Vec4;

use crate::render::layout::{ShaderDataType, VertexBufferLayout, VertexElement};

/// Batched 2D vertex.
///
/// `position` is already transformed by the quad's model matrix; the shader
/// only applies view/projection. `tint` is packed RGBA8 (see [`pack_tint`]).
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Renderer2DVertex {
    pub position: [f32; 4],
    pub uv: [f32; 2],
    pub tex_unit: u32,
    pub tint: u32,
}

impl Renderer2DVertex {
    pub fn buffer_layout() -> VertexBufferLayout {
        VertexBufferLayout::new([
            VertexElement::new(ShaderDataType::Float4),
            VertexElement::new(ShaderDataType::Float2),
            VertexElement::new(ShaderDataType::FlatInt),
            VertexElement::normalized(ShaderDataType::Byte4),
        ])
    }
}

/// Packs a linear RGBA colour into one `u32`, R in the low byte.
///
/// Channels are clamped to [0, 1] and rounded to the nearest 8-bit value.
pub fn pack_tint(tint: Vec4) -> u32 {
    let c = tint.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
    let [r, g, b, a] = c.round().to_array().map(|v| v as u32);
    r | (g << 8) | (b << 16) | (a << 24)
}

/// Inverse of [`pack_tint`], as raw bytes `[r, g, b, a]`.
#[inline]
pub fn unpack_tint(packed: u32) -> [u8; 4] {
    packed.to_le_bytes()
}
