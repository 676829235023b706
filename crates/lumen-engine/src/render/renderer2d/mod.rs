//! Batched 2D quad and text renderer.
//!
//! Quads are transformed on the CPU and appended to a fixed-size vertex
//! array. A flush hands the pending vertices to the device as one draw; it
//! happens when the array is full, when a new texture finds every slot taken,
//! and at `end()`. Text is drawn as one textured quad per glyph from a shared
//! glyph atlas.

mod glyphs;
mod quad;
mod vertex;

use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::rc::Rc;

use glam::{Vec2, Vec4};

pub use glyphs::{GlyphData, GlyphTable};
pub use quad::{Angle, Quad, QuadDraw};
pub use vertex::{pack_tint, unpack_tint, Renderer2DVertex};

use quad::QUAD_CORNERS;

use super::atlas::{AtlasConfig, AtlasError};
use super::device::{PassKind, RenderDevice, RendererCommon};
use super::sub_texture::SubTexture;
use super::texture::Texture;
use super::uniforms::{build_scene_block, SceneUniforms};
use crate::text::GlyphSource;

#[derive(Debug, Clone)]
pub struct Renderer2DConfig {
    /// Vertices per batch; rounded down to a whole number of quads.
    pub batch_size: usize,
    pub glyph_atlas: AtlasConfig,
    pub glyph_range: RangeInclusive<char>,
}

impl Default for Renderer2DConfig {
    fn default() -> Self {
        Self {
            batch_size: 8192,
            glyph_atlas: AtlasConfig { width: 512, height: 512, channels: 4, reserved_spaces: 128 },
            glyph_range: ' '..='~',
        }
    }
}

/// Counters for the current scene.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Renderer2DStats {
    pub quads: u32,
    pub glyphs: u32,
    pub flushes: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum SceneState {
    Ready,
    InScene,
}

pub struct Renderer2D {
    default_texture: SubTexture,
    vertices: Vec<Renderer2DVertex>,
    draw_count: usize,
    glyphs: Option<GlyphTable>,
    warned_chars: HashSet<char>,
    stats: Renderer2DStats,
    state: SceneState,
}

impl Renderer2D {
    /// Creates the renderer; with a glyph source, the configured range is
    /// rasterized into the glyph atlas up front.
    pub fn new(
        config: Renderer2DConfig,
        glyph_source: Option<&dyn GlyphSource>,
    ) -> Result<Self, AtlasError> {
        let batch_size = (config.batch_size / 4).max(1) * 4;
        if batch_size != config.batch_size {
            log::warn!("batch size {} rounded to {batch_size}", config.batch_size);
        }

        let glyphs = glyph_source
            .map(|src| GlyphTable::build(src, config.glyph_range.clone(), config.glyph_atlas))
            .transpose()?;

        Ok(Self {
            default_texture: SubTexture::full(Texture::white()),
            vertices: vec![Renderer2DVertex::default(); batch_size],
            draw_count: 0,
            glyphs,
            warned_chars: HashSet::new(),
            stats: Renderer2DStats::default(),
            state: SceneState::Ready,
        })
    }

    /// Starts a scene: opens a 2D pass and uploads `u_projection`/`u_view`.
    pub fn begin<D: RenderDevice>(&mut self, common: &mut RendererCommon<D>, uniforms: &SceneUniforms) {
        if self.state == SceneState::InScene {
            log::warn!("Renderer2D::begin called inside a scene; ending the previous one");
            self.end(common);
        }

        self.draw_count = 0;
        self.stats = Renderer2DStats::default();
        let block = build_scene_block(uniforms, None);
        common.device.begin_pass(PassKind::Quads2D, &block);
        self.state = SceneState::InScene;
    }

    /// Appends one quad (4 vertices) to the batch.
    pub fn submit<D: RenderDevice>(
        &mut self,
        common: &mut RendererCommon<D>,
        quad: &Quad,
        draw: QuadDraw<'_>,
    ) {
        if self.state != SceneState::InScene {
            log::warn!("Renderer2D::submit outside begin/end; ignored");
            return;
        }

        if self.draw_count + 4 > self.vertices.len() {
            self.flush(common);
        }

        let sub = draw.texture.unwrap_or(&self.default_texture);
        let texture = Rc::clone(sub.texture());
        let uvs = sub.corners();
        let slot = self.texture_slot(common, &texture);

        let model = quad.model(draw.rotation);
        let tint = pack_tint(draw.tint);
        let batch = &mut self.vertices[self.draw_count..self.draw_count + 4];
        for ((v, corner), uv) in batch.iter_mut().zip(QUAD_CORNERS).zip(uvs) {
            *v = Renderer2DVertex {
                position: (model * corner).to_array(),
                uv: uv.to_array(),
                tex_unit: slot,
                tint,
            };
        }
        self.draw_count += 4;
        self.stats.quads += 1;
    }

    pub fn submit_tinted<D: RenderDevice>(
        &mut self,
        common: &mut RendererCommon<D>,
        quad: &Quad,
        tint: Vec4,
    ) {
        self.submit(common, quad, QuadDraw::tinted(tint));
    }

    pub fn submit_textured<D: RenderDevice>(
        &mut self,
        common: &mut RendererCommon<D>,
        quad: &Quad,
        texture: &SubTexture,
    ) {
        self.submit(common, quad, QuadDraw::textured(texture));
    }

    pub fn submit_tinted_textured<D: RenderDevice>(
        &mut self,
        common: &mut RendererCommon<D>,
        quad: &Quad,
        tint: Vec4,
        texture: &SubTexture,
    ) {
        self.submit(common, quad, QuadDraw { tint, texture: Some(texture), rotation: None });
    }

    /// Draws one character with its pen at `position` on the baseline.
    ///
    /// Returns the pen advance. Characters without a glyph are not drawn and
    /// advance like a space.
    pub fn submit_char<D: RenderDevice>(
        &mut self,
        common: &mut RendererCommon<D>,
        ch: char,
        position: Vec2,
        tint: Vec4,
    ) -> f32 {
        let Some(table) = &self.glyphs else {
            if self.warned_chars.insert(ch) {
                log::warn!("no glyph table loaded; {ch:?} not drawn");
            }
            return 0.0;
        };

        let Some(glyph) = table.get(ch) else {
            if self.warned_chars.insert(ch) {
                log::warn!("no glyph for {ch:?}; advancing as space");
            }
            return table.get(' ').map_or(0.0, |g| g.advance);
        };

        let advance = glyph.advance;
        if glyph.size.x == 0.0 || glyph.size.y == 0.0 {
            return advance;
        }

        let half = glyph.size * 0.5;
        let quad = Quad::create_central_half_extents(position + glyph.bearing + half, half);
        let sub = glyph.sub_texture.clone();
        self.submit(common, &quad, QuadDraw { tint, texture: Some(&sub), rotation: None });
        self.stats.glyphs += 1;
        advance
    }

    /// Draws `text` left to right on a fixed baseline; returns the total advance.
    pub fn submit_text<D: RenderDevice>(
        &mut self,
        common: &mut RendererCommon<D>,
        text: &str,
        position: Vec2,
        tint: Vec4,
    ) -> f32 {
        let mut x = position.x;
        for ch in text.chars() {
            x += self.submit_char(common, ch, Vec2::new(x, position.y), tint);
        }
        x - position.x
    }

    /// Width `submit_text` would advance, without drawing.
    pub fn measure_text(&self, text: &str) -> f32 {
        let Some(table) = &self.glyphs else {
            return 0.0;
        };
        let space = table.get(' ').map_or(0.0, |g| g.advance);
        text.chars().map(|ch| table.get(ch).map_or(space, |g| g.advance)).sum()
    }

    /// Sends pending vertices to the device as one draw.
    pub fn flush<D: RenderDevice>(&mut self, common: &mut RendererCommon<D>) {
        if self.draw_count == 0 {
            return;
        }
        common.device.draw_quads(&self.vertices[..self.draw_count]);
        log::trace!("Renderer2D flush: {} quads", self.draw_count / 4);
        self.draw_count = 0;
        self.stats.flushes += 1;
    }

    /// Flushes and closes the pass.
    pub fn end<D: RenderDevice>(&mut self, common: &mut RendererCommon<D>) {
        if self.state != SceneState::InScene {
            log::warn!("Renderer2D::end without begin; ignored");
            return;
        }
        self.flush(common);
        common.device.end_pass();
        self.state = SceneState::Ready;
    }

    // ── queries ──────────────────────────────────────────────────────────

    pub fn glyph(&self, ch: char) -> Option<&GlyphData> {
        self.glyphs.as_ref()?.get(ch)
    }

    pub fn glyph_table(&self) -> Option<&GlyphTable> {
        self.glyphs.as_ref()
    }

    pub fn default_texture(&self) -> &SubTexture {
        &self.default_texture
    }

    #[inline]
    pub fn batch_size(&self) -> usize {
        self.vertices.len()
    }

    /// Vertices written since the last flush.
    #[inline]
    pub fn draw_count(&self) -> usize {
        self.draw_count
    }

    #[inline]
    pub fn stats(&self) -> Renderer2DStats {
        self.stats
    }

    #[inline]
    pub fn in_scene(&self) -> bool {
        self.state == SceneState::InScene
    }

    // ── internals ────────────────────────────────────────────────────────

    /// Slot for `texture`; when every slot is taken, flushes and starts a new epoch.
    fn texture_slot<D: RenderDevice>(
        &mut self,
        common: &mut RendererCommon<D>,
        texture: &Rc<Texture>,
    ) -> u32 {
        if let Some(slot) = common.bind(texture) {
            return slot;
        }

        self.flush(common);
        common.texture_units.clear();
        common.bind(texture).unwrap_or_else(|| {
            log::error!("device exposes no texture slots; drawing with slot 0");
            0
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use glam::Mat4;

    use super::glyphs::tests::BoxGlyphs;
    use super::*;
    use crate::render::device::{DeviceCommand, HeadlessDevice};
    use crate::render::texture::TextureId;
    use crate::render::uniforms::{U_PROJECTION, U_VIEW};

    fn setup(batch_size: usize, slots: u32) -> (Renderer2D, RendererCommon<HeadlessDevice>) {
        let config = Renderer2DConfig {
            batch_size,
            glyph_atlas: AtlasConfig { width: 128, height: 128, channels: 4, reserved_spaces: 16 },
            ..Renderer2DConfig::default()
        };
        let source: &dyn GlyphSource = &BoxGlyphs;
        let r = Renderer2D::new(config, Some(source)).unwrap();
        (r, RendererCommon::new(HeadlessDevice::new(slots)))
    }

    fn unit_quad(x: f32) -> Quad {
        Quad::create_central_half_extents(Vec2::new(x, 0.0), Vec2::splat(0.5))
    }

    fn quad_centres(vertices: &[Renderer2DVertex]) -> Vec<Vec2> {
        vertices
            .chunks_exact(4)
            .map(|q| {
                let sum = q.iter().fold(Vec2::ZERO, |acc, v| acc + Vec2::new(v.position[0], v.position[1]));
                sum / 4.0
            })
            .collect()
    }

    #[test]
    fn overflowing_batch_flushes_and_keeps_every_vertex() {
        let (mut r, mut common) = setup(8192, 16);
        let quads = 8192 / 4 + 1;

        r.begin(&mut common, &SceneUniforms::new());
        for i in 0..quads {
            r.submit_tinted(&mut common, &unit_quad(i as f32), Vec4::ONE);
        }
        r.end(&mut common);

        let draws: Vec<_> = common.device.quad_draws().collect();
        assert!(draws.len() >= 2);
        assert_eq!(draws.iter().map(|d| d.len()).sum::<usize>(), 4 * quads);
        assert!(draws.iter().all(|d| d.len() <= 8192));
        assert_eq!(r.stats().flushes as usize, draws.len());
    }

    #[test]
    fn draw_order_survives_flush_boundaries() {
        let (mut r, mut common) = setup(8, 16);
        r.begin(&mut common, &SceneUniforms::new());
        for i in 0..5 {
            r.submit_tinted(&mut common, &unit_quad(i as f32 * 10.0), Vec4::ONE);
        }
        r.end(&mut common);

        let xs: Vec<f32> = common
            .device
            .quad_draws()
            .flat_map(quad_centres)
            .map(|c| c.x)
            .collect();
        assert_eq!(xs, vec![0.0, 10.0, 20.0, 30.0, 40.0]);
        assert_eq!(common.device.quad_draws().count(), 3);
    }

    #[test]
    fn texture_exhaustion_flushes_before_rebinding() {
        let (mut r, mut common) = setup(8192, 2);
        let textures: Vec<SubTexture> =
            (0..5).map(|_| SubTexture::full(Texture::new(2, 2, 4, None).unwrap())).collect();
        let order = [0usize, 1, 0, 2, 3, 1, 4, 4];

        r.begin(&mut common, &SceneUniforms::new());
        for &i in &order {
            r.submit_textured(&mut common, &unit_quad(0.0), &textures[i]);
        }
        r.end(&mut common);

        // replay: each quad must sample the texture it was submitted with
        let mut bound: HashMap<u32, TextureId> = HashMap::new();
        let mut expected = order.iter().map(|&i| textures[i].texture().id());
        for cmd in common.device.commands() {
            match cmd {
                DeviceCommand::BindTexture { slot, texture } => {
                    assert!(*slot < 2);
                    bound.insert(*slot, *texture);
                }
                DeviceCommand::DrawQuads { vertices } => {
                    for q in vertices.chunks_exact(4) {
                        let slot = q[0].tex_unit;
                        assert!(q.iter().all(|v| v.tex_unit == slot));
                        assert_eq!(Some(bound[&slot]), expected.next());
                    }
                }
                _ => {}
            }
        }
        assert_eq!(expected.next(), None);
        assert!(r.stats().flushes > 1);
    }

    #[test]
    fn known_textures_do_not_force_a_flush() {
        let (mut r, mut common) = setup(8192, 2);
        let a = SubTexture::full(Texture::white());
        let b = SubTexture::full(Texture::white());

        r.begin(&mut common, &SceneUniforms::new());
        for _ in 0..10 {
            r.submit_textured(&mut common, &unit_quad(0.0), &a);
            r.submit_textured(&mut common, &unit_quad(0.0), &b);
        }
        r.end(&mut common);
        assert_eq!(common.device.quad_draws().count(), 1);
    }

    #[test]
    fn vertices_carry_uvs_tint_and_slot() {
        let (mut r, mut common) = setup(64, 16);
        let base = Texture::new(4, 4, 4, None).unwrap();
        let sub = SubTexture::from_pixels(base, 0, 0, 2, 2);

        r.begin(&mut common, &SceneUniforms::new());
        r.submit_tinted_textured(&mut common, &unit_quad(0.0), Vec4::new(1.0, 0.0, 0.0, 1.0), &sub);
        r.end(&mut common);

        let draw = common.device.quad_draws().next().unwrap();
        let uvs: Vec<[f32; 2]> = draw.iter().map(|v| v.uv).collect();
        assert_eq!(uvs, vec![[0.0, 0.0], [0.0, 0.5], [0.5, 0.5], [0.5, 0.0]]);
        assert!(draw.iter().all(|v| unpack_tint(v.tint) == [255, 0, 0, 255]));
        assert_eq!(common.device.bound_at(draw[0].tex_unit), Some(sub.texture().id()));
    }

    #[test]
    fn rotated_submit_turns_about_centre() {
        let (mut r, mut common) = setup(64, 16);
        let quad = Quad::create_central_half_extents(Vec2::new(5.0, 5.0), Vec2::new(2.0, 1.0));

        r.begin(&mut common, &SceneUniforms::new());
        let draw = QuadDraw::tinted(Vec4::ONE).rotated(Angle::Radians(std::f32::consts::FRAC_PI_2));
        r.submit(&mut common, &quad, draw);
        r.end(&mut common);

        let draw = common.device.quad_draws().next().unwrap();
        let c = quad_centres(draw)[0];
        assert!((c - Vec2::new(5.0, 5.0)).length() < 1e-5);
        // corner (0.5, -0.5) → (2, -1) → rotated (1, 2)
        let p = draw[3].position;
        assert!((p[0] - 6.0).abs() < 1e-5 && (p[1] - 7.0).abs() < 1e-5);
    }

    #[test]
    fn text_advances_along_baseline() {
        let (mut r, mut common) = setup(64, 16);
        r.begin(&mut common, &SceneUniforms::new());
        let width = r.submit_text(&mut common, "AB", Vec2::new(10.0, 20.0), Vec4::ONE);
        r.end(&mut common);

        let centres: Vec<Vec2> = common.device.quad_draws().flat_map(quad_centres).collect();
        assert_eq!(centres.len(), 2);
        assert_eq!(centres[1].x - centres[0].x, r.glyph('A').unwrap().advance);
        assert_eq!(centres[0].y, centres[1].y);
        // pen (10, 20) + bearing (1, -10) + half size (3, 5)
        assert_eq!(centres[0], Vec2::new(14.0, 15.0));
        assert_eq!(width, 16.0);
        assert_eq!(r.stats().glyphs, 2);
    }

    #[test]
    fn unknown_chars_advance_like_space_and_are_not_drawn() {
        let (mut r, mut common) = setup(64, 16);
        r.begin(&mut common, &SceneUniforms::new());
        let width = r.submit_text(&mut common, "A\u{e9} ~B", Vec2::ZERO, Vec4::ONE);
        r.end(&mut common);

        let centres: Vec<Vec2> = common.device.quad_draws().flat_map(quad_centres).collect();
        assert_eq!(centres.len(), 2);
        // 'é', ' ' and '~' each advance by the space's 4
        assert_eq!(centres[1].x - centres[0].x, 8.0 + 3.0 * 4.0);
        assert_eq!(width, 8.0 + 12.0 + 8.0);
        assert_eq!(r.measure_text("A\u{e9} ~B"), width);
        assert!(r.warned_chars.contains(&'\u{e9}'));
        assert!(r.warned_chars.contains(&'~'));
    }

    #[test]
    fn text_without_glyph_source_draws_nothing() {
        let mut r = Renderer2D::new(Renderer2DConfig::default(), None).unwrap();
        let mut common = RendererCommon::new(HeadlessDevice::new(16));
        r.begin(&mut common, &SceneUniforms::new());
        assert_eq!(r.submit_text(&mut common, "hi", Vec2::ZERO, Vec4::ONE), 0.0);
        r.end(&mut common);
        assert_eq!(common.device.quad_draws().count(), 0);
    }

    #[test]
    fn submit_outside_scene_is_ignored() {
        let (mut r, mut common) = setup(64, 16);
        r.submit_tinted(&mut common, &unit_quad(0.0), Vec4::ONE);
        r.end(&mut common);
        assert!(common.device.commands().is_empty());
        assert_eq!(r.draw_count(), 0);
    }

    #[test]
    fn nested_begin_closes_previous_scene() {
        let (mut r, mut common) = setup(64, 16);
        r.begin(&mut common, &SceneUniforms::new());
        r.submit_tinted(&mut common, &unit_quad(0.0), Vec4::ONE);
        r.begin(&mut common, &SceneUniforms::new());
        r.end(&mut common);

        let kinds: Vec<&str> = common
            .device
            .commands()
            .iter()
            .map(|c| match c {
                DeviceCommand::BeginPass { .. } => "begin",
                DeviceCommand::DrawQuads { .. } => "draw",
                DeviceCommand::EndPass => "end",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["begin", "other", "draw", "end", "begin", "end"]);
    }

    #[test]
    fn begin_uploads_camera_matrices() {
        let (mut r, mut common) = setup(64, 16);
        let proj = Mat4::orthographic_rh(0.0, 640.0, 480.0, 0.0, -1.0, 1.0);
        let uniforms = SceneUniforms::new().with(U_PROJECTION, proj).with(U_VIEW, Mat4::IDENTITY);
        r.begin(&mut common, &uniforms);
        r.end(&mut common);

        let Some(DeviceCommand::BeginPass { kind, scene_block }) = common.device.commands().first() else {
            panic!("expected a pass");
        };
        assert_eq!(*kind, PassKind::Quads2D);
        let cols: [f32; 16] = bytemuck::pod_read_unaligned(&scene_block[..64]);
        assert_eq!(Mat4::from_cols_array(&cols), proj);
    }

    #[test]
    fn batch_size_rounds_to_whole_quads() {
        let r = Renderer2D::new(Renderer2DConfig { batch_size: 10, ..Renderer2DConfig::default() }, None).unwrap();
        assert_eq!(r.batch_size(), 8);
    }
}
