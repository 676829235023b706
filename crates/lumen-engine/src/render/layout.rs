//! Vertex and uniform buffer layouts.
//!
//! Vertex layouts are tightly packed (stride = sum of element sizes).
//! Uniform layouts follow std140 so the CPU block matches WGSL uniform structs.

use std::collections::HashMap;

/// Data types that can appear in a vertex or uniform buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderDataType {
    FlatByte,
    Byte4,
    Short,
    Short2,
    Short3,
    Short4,
    Float,
    Float2,
    Float3,
    Float4,
    FlatInt,
    Int,
    Mat3,
    Mat4,
}

impl ShaderDataType {
    /// Size in bytes.
    pub const fn size(self) -> u32 {
        match self {
            Self::FlatByte => 1,
            Self::Byte4 => 4,
            Self::Short => 2,
            Self::Short2 => 2 * 2,
            Self::Short3 => 2 * 3,
            Self::Short4 => 2 * 4,
            Self::Float => 4,
            Self::Float2 => 4 * 2,
            Self::Float3 => 4 * 3,
            Self::Float4 => 4 * 4,
            Self::FlatInt | Self::Int => 4,
            Self::Mat3 => 4 * 3 * 3,
            Self::Mat4 => 4 * 4 * 4,
        }
    }

    pub const fn component_count(self) -> u32 {
        match self {
            Self::FlatByte | Self::Short | Self::Float | Self::FlatInt | Self::Int => 1,
            Self::Short2 | Self::Float2 => 2,
            Self::Short3 | Self::Float3 => 3,
            Self::Byte4 | Self::Short4 | Self::Float4 => 4,
            Self::Mat3 => 3 * 3,
            Self::Mat4 => 4 * 4,
        }
    }

    /// std140 base alignment.
    ///
    /// Three-component vectors align like four; matrices align to a vec4 column.
    pub const fn std140_alignment(self) -> u32 {
        match self {
            Self::FlatByte => 1,
            Self::Byte4 => 4,
            Self::Short => 2,
            Self::Short2 => 4,
            Self::Short3 | Self::Short4 => 8,
            Self::Float | Self::FlatInt | Self::Int => 4,
            Self::Float2 => 8,
            Self::Float3 | Self::Float4 => 16,
            Self::Mat3 | Self::Mat4 => 16,
        }
    }

    /// std140 size (a `mat3` occupies three padded vec4 columns).
    pub const fn std140_size(self) -> u32 {
        match self {
            Self::Mat3 => 16 * 3,
            other => other.size(),
        }
    }

    /// wgpu vertex format for this type, if it can be a vertex attribute.
    pub fn vertex_format(self, normalized: bool) -> Option<wgpu::VertexFormat> {
        use wgpu::VertexFormat as F;
        let format = match (self, normalized) {
            (Self::Byte4, true) => F::Unorm8x4,
            (Self::Byte4, false) => F::Uint8x4,
            (Self::Short2, true) => F::Snorm16x2,
            (Self::Short2, false) => F::Sint16x2,
            (Self::Short4, true) => F::Snorm16x4,
            (Self::Short4, false) => F::Sint16x4,
            (Self::Float, _) => F::Float32,
            (Self::Float2, _) => F::Float32x2,
            (Self::Float3, _) => F::Float32x3,
            (Self::Float4, _) => F::Float32x4,
            (Self::FlatInt, _) => F::Uint32,
            (Self::Int, _) => F::Sint32,
            _ => return None,
        };
        Some(format)
    }
}

// ── vertex layout ─────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VertexElement {
    pub data_type: ShaderDataType,
    pub offset: u32,
    pub normalized: bool,
}

impl VertexElement {
    pub const fn new(data_type: ShaderDataType) -> Self {
        Self { data_type, offset: 0, normalized: false }
    }

    pub const fn normalized(data_type: ShaderDataType) -> Self {
        Self { data_type, offset: 0, normalized: true }
    }
}

/// Interleaved vertex layout with computed offsets and stride.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexBufferLayout {
    elements: Vec<VertexElement>,
    stride: u32,
}

impl VertexBufferLayout {
    pub fn new(elements: impl IntoIterator<Item = VertexElement>) -> Self {
        let mut layout = Self::default();
        for e in elements {
            layout.add_element(e);
        }
        layout
    }

    pub fn add_element(&mut self, mut element: VertexElement) {
        element.offset = self.stride;
        self.stride += element.data_type.size();
        self.elements.push(element);
    }

    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn elements(&self) -> &[VertexElement] {
        &self.elements
    }

    /// Vertex attributes at consecutive shader locations starting at `first_location`.
    ///
    /// Elements without a vertex format (matrices, odd shorts) are skipped with a warning.
    pub fn wgpu_attributes(&self, first_location: u32) -> Vec<wgpu::VertexAttribute> {
        let mut attrs = Vec::with_capacity(self.elements.len());
        for (i, e) in self.elements.iter().enumerate() {
            let Some(format) = e.data_type.vertex_format(e.normalized) else {
                log::warn!("{:?} cannot be a vertex attribute; skipped", e.data_type);
                continue;
            };
            attrs.push(wgpu::VertexAttribute {
                format,
                offset: e.offset as u64,
                shader_location: first_location + i as u32,
            });
        }
        attrs
    }
}

// ── uniform layout ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct UniformElement {
    pub name: String,
    pub data_type: ShaderDataType,
    pub offset: u32,
    pub size: u32,
}

/// Named uniform block laid out with std140 rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformBufferLayout {
    elements: Vec<UniformElement>,
    stride: u32,
}

impl UniformBufferLayout {
    pub fn new<'a>(elements: impl IntoIterator<Item = (&'a str, ShaderDataType)>) -> Self {
        let mut elems = Vec::new();
        let mut cursor = 0u32;
        for (name, data_type) in elements {
            let offset = align_up(cursor, data_type.std140_alignment());
            let size = data_type.std140_size();
            elems.push(UniformElement { name: name.to_string(), data_type, offset, size });
            cursor = offset + size;
        }
        Self { elements: elems, stride: align_up(cursor, 16) }
    }

    /// Total block size, rounded up to 16 bytes.
    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn elements(&self) -> &[UniformElement] {
        &self.elements
    }

    pub fn element(&self, name: &str) -> Option<&UniformElement> {
        self.elements.iter().find(|e| e.name == name)
    }
}

#[inline]
pub(crate) const fn align_up(value: u32, alignment: u32) -> u32 {
    (value + alignment - 1) / alignment * alignment
}

/// CPU staging copy of a uniform block.
///
/// `upload_data` writes a named member at its layout offset; devices upload
/// the whole block with `bytes()`.
#[derive(Debug, Clone)]
pub struct UniformBuffer {
    layout: UniformBufferLayout,
    cache: HashMap<String, (u32, u32)>,
    data: Vec<u8>,
}

impl UniformBuffer {
    pub fn new(layout: UniformBufferLayout) -> Self {
        let cache = layout
            .elements()
            .iter()
            .map(|e| (e.name.clone(), (e.offset, e.size)))
            .collect();
        let data = vec![0; layout.stride() as usize];
        Self { layout, cache, data }
    }

    pub fn layout(&self) -> &UniformBufferLayout {
        &self.layout
    }

    /// Copies `bytes` into the member `name`.
    ///
    /// Returns `false` for unknown names. Shorter data (a vec3 for a padded
    /// slot) is accepted; longer data is truncated with a warning.
    pub fn upload_data(&mut self, name: &str, bytes: &[u8]) -> bool {
        let Some(&(offset, size)) = self.cache.get(name) else {
            log::warn!("uniform '{name}' is not part of this block");
            return false;
        };
        let n = if bytes.len() > size as usize {
            log::warn!("uniform '{name}': {} bytes truncated to {size}", bytes.len());
            size as usize
        } else {
            bytes.len()
        };
        let start = offset as usize;
        self.data[start..start + n].copy_from_slice(&bytes[..n]);
        true
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}
