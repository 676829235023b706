use std::rc::Rc;

use glam::Vec2;

use super::texture::Texture;

/// Local UVs of a quad's corners, in the order the 2D renderer emits vertices.
pub const QUAD_CORNER_UVS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(1.0, 0.0),
];

/// UV-rectangle view into a shared base texture.
#[derive(Debug, Clone)]
pub struct SubTexture {
    base: Rc<Texture>,
    uv_start: Vec2,
    uv_end: Vec2,
    size: Vec2,
}

impl SubTexture {
    pub fn new(base: Rc<Texture>, uv_start: Vec2, uv_end: Vec2) -> Self {
        let dims = Vec2::new(base.width_f(), base.height_f());
        let size = ((uv_end - uv_start) * dims).round();
        Self { base, uv_start, uv_end, size }
    }

    /// A view covering the whole texture.
    pub fn full(base: Rc<Texture>) -> Self {
        Self::new(base, Vec2::ZERO, Vec2::ONE)
    }

    /// A zero-size view at the origin of `base`.
    pub fn empty(base: Rc<Texture>) -> Self {
        Self::new(base, Vec2::ZERO, Vec2::ZERO)
    }

    /// View over the pixel rectangle `(x, y, w, h)` of `base`.
    pub fn from_pixels(base: Rc<Texture>, x: u32, y: u32, w: u32, h: u32) -> Self {
        let dims = Vec2::new(base.width_f(), base.height_f());
        let start = Vec2::new(x as f32, y as f32) / dims;
        let end = Vec2::new((x + w) as f32, (y + h) as f32) / dims;
        Self::new(base, start, end)
    }

    #[inline]
    pub fn texture(&self) -> &Rc<Texture> {
        &self.base
    }

    #[inline]
    pub fn uv_start(&self) -> Vec2 {
        self.uv_start
    }

    #[inline]
    pub fn uv_end(&self) -> Vec2 {
        self.uv_end
    }

    /// Pixel size of the view.
    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[inline]
    pub fn transform_u(&self, u: f32) -> f32 {
        self.uv_start.x + (self.uv_end.x - self.uv_start.x) * u
    }

    #[inline]
    pub fn transform_v(&self, v: f32) -> f32 {
        self.uv_start.y + (self.uv_end.y - self.uv_start.y) * v
    }

    #[inline]
    pub fn transform_uv(&self, uv: Vec2) -> Vec2 {
        Vec2::new(self.transform_u(uv.x), self.transform_v(uv.y))
    }

    /// Atlas-space UVs for the four quad corners.
    pub fn corners(&self) -> [Vec2; 4] {
        QUAD_CORNER_UVS.map(|uv| self.transform_uv(uv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(w: u32, h: u32) -> Rc<Texture> {
        Texture::new(w, h, 4, None).unwrap()
    }

    #[test]
    fn size_derives_from_uv_rect() {
        let st = SubTexture::from_pixels(base(256, 128), 32, 16, 10, 20);
        assert_eq!(st.size(), Vec2::new(10.0, 20.0));
        assert_eq!(st.uv_start(), Vec2::new(0.125, 0.125));
    }

    #[test]
    fn transform_maps_unit_square_into_rect() {
        let st = SubTexture::new(base(4, 4), Vec2::new(0.25, 0.5), Vec2::new(0.75, 1.0));
        assert_eq!(st.transform_u(0.0), 0.25);
        assert_eq!(st.transform_u(1.0), 0.75);
        assert_eq!(st.transform_v(0.5), 0.75);
        assert_eq!(
            st.corners(),
            [
                Vec2::new(0.25, 0.5),
                Vec2::new(0.25, 1.0),
                Vec2::new(0.75, 1.0),
                Vec2::new(0.75, 0.5),
            ]
        );
    }

    #[test]
    fn full_view_is_identity() {
        let st = SubTexture::full(base(8, 8));
        assert_eq!(st.transform_uv(Vec2::new(0.3, 0.7)), Vec2::new(0.3, 0.7));
        assert_eq!(st.size(), Vec2::new(8.0, 8.0));
    }
}
