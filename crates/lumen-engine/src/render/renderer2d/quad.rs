use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use crate::render::sub_texture::SubTexture;

/// Corners of the unit quad, matching `QUAD_CORNER_UVS`.
pub(crate) const QUAD_CORNERS: [Vec4; 4] = [
    Vec4::new(-0.5, -0.5, 0.0, 1.0),
    Vec4::new(-0.5, 0.5, 0.0, 1.0),
    Vec4::new(0.5, 0.5, 0.0, 1.0),
    Vec4::new(0.5, -0.5, 0.0, 1.0),
];

/// World transform of a unit square.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quad {
    translate: Vec3,
    scale: Vec3,
}

impl Quad {
    pub fn create_central_half_extents(centre: Vec2, half_extents: Vec2) -> Self {
        Self { translate: centre.extend(0.0), scale: (half_extents * 2.0).extend(1.0) }
    }

    #[inline]
    pub fn translate(&self) -> Vec3 {
        self.translate
    }

    #[inline]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// `T · Rz(angle) · S`; the rotation pivots on the quad's centre.
    pub fn model(&self, rotation: Option<Angle>) -> Mat4 {
        let rot = rotation.map_or(Quat::IDENTITY, |a| Quat::from_rotation_z(a.radians()));
        Mat4::from_scale_rotation_translation(self.scale, rot, self.translate)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Angle {
    Degrees(f32),
    Radians(f32),
}

impl Angle {
    #[inline]
    pub fn radians(self) -> f32 {
        match self {
            Self::Degrees(d) => d.to_radians(),
            Self::Radians(r) => r,
        }
    }
}

/// How a quad is drawn: tint, optional texture view, optional rotation.
#[derive(Debug, Copy, Clone)]
pub struct QuadDraw<'a> {
    pub tint: Vec4,
    pub texture: Option<&'a SubTexture>,
    pub rotation: Option<Angle>,
}

impl Default for QuadDraw<'_> {
    fn default() -> Self {
        Self { tint: Vec4::ONE, texture: None, rotation: None }
    }
}

impl<'a> QuadDraw<'a> {
    pub fn tinted(tint: Vec4) -> Self {
        Self { tint, ..Self::default() }
    }

    pub fn textured(texture: &'a SubTexture) -> Self {
        Self { texture: Some(texture), ..Self::default() }
    }

    pub fn rotated(mut self, angle: Angle) -> Self {
        self.rotation = Some(angle);
        self
    }
}
