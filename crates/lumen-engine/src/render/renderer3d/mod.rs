//! Immediate 3D renderer: one device draw per submitted mesh.

mod material;
mod mesh;

use std::rc::Rc;

use glam::{Mat4, Vec3, Vec4};

pub use material::{Material, MaterialFlags, Shading};
pub use mesh::{Mesh, MeshId, MeshVertex};

use super::device::{ObjectBlock, PassKind, RenderDevice, RendererCommon};
use super::texture::Texture;
use super::uniforms::{
    build_scene_block, SceneLighting, SceneUniforms, U_LIGHT_COLOUR, U_LIGHT_POS, U_VIEW_POS,
};

/// Single point light used when the scene uniforms do not provide one.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LightSettings {
    pub position: Vec3,
    pub view_position: Vec3,
    pub colour: Vec3,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(1.0, 4.0, 6.0),
            view_position: Vec3::ZERO,
            colour: Vec3::ONE,
        }
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct Renderer3DConfig {
    pub light: LightSettings,
}

pub struct Renderer3D {
    default_texture: Rc<Texture>,
    default_tint: Vec4,
    light: LightSettings,
    scene: Option<SceneUniforms>,
    draws: u32,
}

impl Renderer3D {
    pub fn new(config: Renderer3DConfig) -> Self {
        Self {
            default_texture: Texture::white(),
            default_tint: Vec4::ONE,
            light: config.light,
            scene: None,
            draws: 0,
        }
    }

    /// Opens a 3D pass with camera matrices and lighting.
    ///
    /// `u_lightPos`, `u_viewPos` and `u_lightColour` in `uniforms` override
    /// the renderer's light settings.
    pub fn begin<D: RenderDevice>(&mut self, common: &mut RendererCommon<D>, uniforms: &SceneUniforms) {
        if self.scene.is_some() {
            log::warn!("Renderer3D::begin called inside a scene; ending the previous one");
            self.end(common);
        }

        let lighting = SceneLighting {
            light_pos: uniforms.vec3(U_LIGHT_POS).unwrap_or(self.light.position),
            view_pos: uniforms.vec3(U_VIEW_POS).unwrap_or(self.light.view_position),
            light_colour: uniforms.vec3(U_LIGHT_COLOUR).unwrap_or(self.light.colour),
        };
        let block = build_scene_block(uniforms, Some(lighting));
        common.device.begin_pass(PassKind::Meshes3D, &block);

        self.scene = Some(uniforms.clone());
        self.draws = 0;
    }

    /// Draws `mesh` with `material` at `model`.
    pub fn submit<D: RenderDevice>(
        &mut self,
        common: &mut RendererCommon<D>,
        mesh: &Rc<Mesh>,
        material: &Material,
        model: Mat4,
    ) {
        if self.scene.is_none() {
            log::warn!("Renderer3D::submit outside begin/end; ignored");
            return;
        }

        let texture = material.texture.as_ref().unwrap_or(&self.default_texture);
        let slot = match common.bind(texture) {
            Some(slot) => slot,
            None => {
                // earlier draws are already recorded, so the epoch can restart here
                common.texture_units.clear();
                common.bind(texture).unwrap_or(0)
            }
        };

        let tint = material.tint.unwrap_or(self.default_tint);
        let object = ObjectBlock::new(model, tint, slot, material.flags());
        common.device.draw_mesh(mesh, &object);
        self.draws += 1;
    }

    /// Closes the pass and forgets the scene uniforms.
    pub fn end<D: RenderDevice>(&mut self, common: &mut RendererCommon<D>) {
        if self.scene.take().is_none() {
            log::warn!("Renderer3D::end without begin; ignored");
            return;
        }
        common.device.end_pass();
    }

    pub fn light(&self) -> LightSettings {
        self.light
    }

    pub fn set_light(&mut self, light: LightSettings) {
        self.light = light;
    }

    /// Scene uniforms of the open scene, if any.
    pub fn scene(&self) -> Option<&SceneUniforms> {
        self.scene.as_ref()
    }

    /// Draws submitted in the current (or last) scene.
    pub fn draws(&self) -> u32 {
        self.draws
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::{DeviceCommand, HeadlessDevice};
    use crate::render::renderer2d::{Quad, Renderer2D, Renderer2DConfig};
    use crate::render::sub_texture::SubTexture;
    use glam::Vec2;

    fn setup(slots: u32) -> (Renderer3D, RendererCommon<HeadlessDevice>) {
        (Renderer3D::new(Renderer3DConfig::default()), RendererCommon::new(HeadlessDevice::new(slots)))
    }

    #[test]
    fn untextured_material_uses_white_texture_and_tint() {
        let (mut r, mut common) = setup(4);
        let cube = Mesh::cube();

        r.begin(&mut common, &SceneUniforms::new());
        r.submit(&mut common, &cube, &Material::default(), Mat4::IDENTITY);
        r.end(&mut common);

        let object = common.device.mesh_draws().next().unwrap();
        assert_eq!(object.tint, [1.0; 4]);
        assert_eq!(object.flags, MaterialFlags::LIT.bits());
        assert_eq!(common.device.bound_at(object.tex_unit), Some(r.default_texture.id()));
    }

    #[test]
    fn material_texture_tint_and_model_reach_the_draw() {
        let (mut r, mut common) = setup(4);
        let tex = Texture::new(2, 2, 4, None).unwrap();
        let material = Material::textured_tinted(tex.clone(), Vec4::new(0.5, 0.5, 0.5, 1.0))
            .with_shading(Shading::Unlit);
        let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));

        r.begin(&mut common, &SceneUniforms::new());
        r.submit(&mut common, &Mesh::cube(), &material, model);
        r.end(&mut common);

        let object = common.device.mesh_draws().next().unwrap();
        assert_eq!(object.model, model.to_cols_array_2d());
        assert_eq!(object.tint, [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(object.flags, (MaterialFlags::TEXTURE | MaterialFlags::TINT).bits());
        assert_eq!(common.device.bound_at(object.tex_unit), Some(tex.id()));
    }

    #[test]
    fn shares_slots_with_the_2d_renderer() {
        let (mut r3, mut common) = setup(4);
        let mut r2 = Renderer2D::new(Renderer2DConfig::default(), None).unwrap();
        let tex = Texture::new(2, 2, 4, None).unwrap();
        let sub = SubTexture::full(tex.clone());

        r2.begin(&mut common, &SceneUniforms::new());
        r2.submit_textured(&mut common, &Quad::create_central_half_extents(Vec2::ZERO, Vec2::ONE), &sub);
        r2.end(&mut common);

        r3.begin(&mut common, &SceneUniforms::new());
        r3.submit(&mut common, &Mesh::cube(), &Material::textured(tex.clone()), Mat4::IDENTITY);
        r3.end(&mut common);

        let binds = common
            .device
            .commands()
            .iter()
            .filter(|c| matches!(c, DeviceCommand::BindTexture { texture, .. } if *texture == tex.id()))
            .count();
        assert_eq!(binds, 1);
    }

    #[test]
    fn exhausted_slots_restart_the_epoch() {
        let (mut r, mut common) = setup(2);
        let textures: Vec<_> = (0..3).map(|_| Texture::new(1, 1, 4, None).unwrap()).collect();

        r.begin(&mut common, &SceneUniforms::new());
        for t in &textures {
            r.submit(&mut common, &Mesh::cube(), &Material::textured(t.clone()), Mat4::IDENTITY);
        }
        r.end(&mut common);

        let slots: Vec<u32> = common.device.mesh_draws().map(|o| o.tex_unit).collect();
        assert_eq!(slots, vec![0, 1, 0]);
        assert_eq!(common.device.bound_at(0), Some(textures[2].id()));
    }

    #[test]
    fn lighting_comes_from_uniforms_or_settings() {
        let (mut r, mut common) = setup(4);
        let uniforms = SceneUniforms::new().with(U_VIEW_POS, Vec3::new(7.0, 8.0, 9.0));

        r.begin(&mut common, &uniforms);
        assert!(r.scene().is_some());
        r.end(&mut common);
        assert!(r.scene().is_none());

        let Some(DeviceCommand::BeginPass { kind, scene_block }) = common.device.commands().first() else {
            panic!("expected a pass");
        };
        assert_eq!(*kind, PassKind::Meshes3D);
        let light: [f32; 3] = bytemuck::pod_read_unaligned(&scene_block[128..140]);
        let view: [f32; 3] = bytemuck::pod_read_unaligned(&scene_block[144..156]);
        assert_eq!(light, [1.0, 4.0, 6.0]);
        assert_eq!(view, [7.0, 8.0, 9.0]);
    }

    #[test]
    fn submit_outside_scene_is_ignored() {
        let (mut r, mut common) = setup(4);
        r.submit(&mut common, &Mesh::cube(), &Material::default(), Mat4::IDENTITY);
        assert!(common.device.commands().is_empty());
        assert_eq!(r.draws(), 0);
    }
}
