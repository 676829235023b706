use std::rc::Rc;

use bitflags::bitflags;
use glam::Vec4;

use crate::render::texture::Texture;

/// Which fragment path a material uses.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum Shading {
    /// Ambient + diffuse + specular from the scene light.
    #[default]
    Lit,
    /// Texture × tint, no lighting.
    Unlit,
}

bitflags! {
    /// Parts of a [`Material`] the fragment shader should honour.
    ///
    /// Shared with the mesh shader through `ObjectBlock::flags`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MaterialFlags: u32 {
        const TEXTURE = 1 << 0;
        const TINT = 1 << 1;
        /// Ambient + diffuse + specular instead of flat colour.
        const LIT = 1 << 2;
    }
}

/// Surface description for a 3D draw.
///
/// Either part may be absent; the renderer substitutes a white texture and a
/// white tint.
#[derive(Debug, Clone, Default)]
pub struct Material {
    pub texture: Option<Rc<Texture>>,
    pub tint: Option<Vec4>,
    pub shading: Shading,
}

impl Material {
    pub fn textured(texture: Rc<Texture>) -> Self {
        Self { texture: Some(texture), ..Self::default() }
    }

    pub fn tinted(tint: Vec4) -> Self {
        Self { tint: Some(tint), ..Self::default() }
    }

    pub fn textured_tinted(texture: Rc<Texture>, tint: Vec4) -> Self {
        Self { texture: Some(texture), tint: Some(tint), ..Self::default() }
    }

    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.shading = shading;
        self
    }

    /// Which parts are set, plus `LIT` for lit shading.
    pub fn flags(&self) -> MaterialFlags {
        let mut flags = MaterialFlags::empty();
        flags.set(MaterialFlags::TEXTURE, self.texture.is_some());
        flags.set(MaterialFlags::TINT, self.tint.is_some());
        flags.set(MaterialFlags::LIT, self.shading == Shading::Lit);
        flags
    }
}
