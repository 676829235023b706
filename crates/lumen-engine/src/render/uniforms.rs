use std::collections::HashMap;

use glam::{Mat4, Vec3, Vec4};

use super::layout::{ShaderDataType, UniformBuffer, UniformBufferLayout};

pub const U_PROJECTION: &str = "u_projection";
pub const U_VIEW: &str = "u_view";
pub const U_LIGHT_POS: &str = "u_lightPos";
pub const U_VIEW_POS: &str = "u_viewPos";
pub const U_LIGHT_COLOUR: &str = "u_lightColour";

/// A typed value stored in a [`SceneUniforms`] map.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float3(Vec3),
    Float4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn data_type(&self) -> ShaderDataType {
        match self {
            Self::Int(_) => ShaderDataType::Int,
            Self::Float3(_) => ShaderDataType::Float3,
            Self::Float4(_) => ShaderDataType::Float4,
            Self::Mat4(_) => ShaderDataType::Mat4,
        }
    }

    /// Native-endian bytes as they are laid out in a uniform block.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Int(v) => v.to_ne_bytes().to_vec(),
            Self::Float3(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            Self::Float4(v) => bytemuck::cast_slice(&v.to_array()).to_vec(),
            Self::Mat4(m) => bytemuck::cast_slice(&m.to_cols_array()).to_vec(),
        }
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        Self::Mat4(m)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Float3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        Self::Float4(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

/// Per-scene uniform values keyed by shader name.
///
/// Built by camera controllers and handed to `begin` on each renderer.
#[derive(Debug, Clone, Default)]
pub struct SceneUniforms {
    values: HashMap<String, UniformValue>,
}

impl SceneUniforms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<UniformValue>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reads a matrix, logging and falling back to identity when absent or mistyped.
    pub fn mat4_or_identity(&self, name: &str) -> Mat4 {
        match self.values.get(name) {
            Some(UniformValue::Mat4(m)) => *m,
            Some(other) => {
                log::warn!("uniform '{name}' is {:?}, expected Mat4; using identity", other.data_type());
                Mat4::IDENTITY
            }
            None => {
                log::warn!("uniform '{name}' missing from scene; using identity");
                Mat4::IDENTITY
            }
        }
    }

    pub fn vec3(&self, name: &str) -> Option<Vec3> {
        match self.values.get(name)? {
            UniformValue::Float3(v) => Some(*v),
            UniformValue::Float4(v) => Some(v.truncate()),
            _ => None,
        }
    }
}

// ── scene block ───────────────────────────────────────────────────────────

/// Layout of the per-pass scene block shared by both renderers' shaders.
pub fn scene_block_layout() -> UniformBufferLayout {
    UniformBufferLayout::new([
        (U_PROJECTION, ShaderDataType::Mat4),
        (U_VIEW, ShaderDataType::Mat4),
        (U_LIGHT_POS, ShaderDataType::Float3),
        (U_VIEW_POS, ShaderDataType::Float3),
        (U_LIGHT_COLOUR, ShaderDataType::Float3),
    ])
}

/// Lighting values written into the scene block.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SceneLighting {
    pub light_pos: Vec3,
    pub view_pos: Vec3,
    pub light_colour: Vec3,
}

/// Packs view/projection (identity fallback) and optional lighting into the scene block.
pub fn build_scene_block(uniforms: &SceneUniforms, lighting: Option<SceneLighting>) -> Vec<u8> {
    let mut block = UniformBuffer::new(scene_block_layout());

    let projection = uniforms.mat4_or_identity(U_PROJECTION);
    let view = uniforms.mat4_or_identity(U_VIEW);
    block.upload_data(U_PROJECTION, bytemuck::cast_slice(&projection.to_cols_array()));
    block.upload_data(U_VIEW, bytemuck::cast_slice(&view.to_cols_array()));

    if let Some(l) = lighting {
        block.upload_data(U_LIGHT_POS, bytemuck::cast_slice(&l.light_pos.to_array()));
        block.upload_data(U_VIEW_POS, bytemuck::cast_slice(&l.view_pos.to_array()));
        block.upload_data(U_LIGHT_COLOUR, bytemuck::cast_slice(&l.light_colour.to_array()));
    }

    block.bytes().to_vec()
}
