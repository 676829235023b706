//! GPU rendering subsystem.
//!
//! Renderers never talk to wgpu directly. They build vertices and per-draw
//! blocks, pick texture slots through [`RendererCommon`] and hand the result
//! to a [`RenderDevice`]. [`WgpuDevice`] records that work and replays it into
//! a render pass once per frame; [`HeadlessDevice`] only logs the calls.
//!
//! Convention:
//! - Positions are in whatever space the scene's projection/view expect.
//! - Texture coordinates have their origin at the top-left texel.

pub mod atlas;
mod ctx;
pub mod device;
pub mod layout;
pub mod renderer2d;
pub mod renderer3d;
pub mod sub_texture;
pub mod texture;
pub mod texture_units;
pub mod uniforms;
pub mod wgpu_device;

pub use atlas::{AtlasConfig, AtlasError, SimpleRect, TextureAtlas};
pub use ctx::{RenderCtx, RenderTarget};
pub use device::{HeadlessDevice, PassKind, RenderDevice, RendererCommon};
pub use renderer2d::{Angle, Quad, QuadDraw, Renderer2D, Renderer2DConfig};
pub use renderer3d::{LightSettings, Material, Mesh, Renderer3D, Renderer3DConfig, Shading};
pub use sub_texture::SubTexture;
pub use texture::{Texture, TextureError, TextureId, TextureRegion};
pub use texture_units::TextureUnitManager;
pub use uniforms::SceneUniforms;
pub use wgpu_device::{WgpuDevice, DEPTH_FORMAT};
