use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use bytemuck::{Pod, Zeroable};

use crate::render::layout::{ShaderDataType, VertexBufferLayout, VertexElement};

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn buffer_layout() -> VertexBufferLayout {
        VertexBufferLayout::new([
            VertexElement::new(ShaderDataType::Float3),
            VertexElement::new(ShaderDataType::Float3),
            VertexElement::new(ShaderDataType::Float2),
        ])
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct MeshId(u32);

impl MeshId {
    fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Indexed triangle geometry.
///
/// The CPU copy is immutable; devices cache GPU buffers by `id`.
#[derive(Debug)]
pub struct Mesh {
    id: MeshId,
    vertices: Vec<MeshVertex>,
    indices: Vec<u32>,
}

impl Mesh {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Rc<Self> {
        debug_assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
        Rc::new(Self { id: MeshId::next(), vertices, indices })
    }

    /// Unit cube centred on the origin, one face per axis direction.
    pub fn cube() -> Rc<Self> {
        // (normal, u axis, v axis) per face
        const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];
        const CORNERS: [(f32, f32); 4] = [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (n, u, v) in FACES {
            let base = vertices.len() as u32;
            for (cu, cv) in CORNERS {
                let position = [0, 1, 2].map(|k| n[k] * 0.5 + u[k] * cu + v[k] * cv);
                vertices.push(MeshVertex { position, normal: n, uv: [cu + 0.5, 0.5 - cv] });
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(vertices, indices)
    }

    #[inline]
    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}
