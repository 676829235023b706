use std::cell::Cell;
use std::rc::Rc;

use anyhow::Context;
use glam::{Mat4, Vec2, Vec3, Vec4};

use lumen_engine::camera::{
    CameraController, EulerCameraProps, FollowController, FollowParams, FreeEulerController, OrthoController,
};
use lumen_engine::core::{App, AppControl, FrameCtx};
use lumen_engine::device::GpuInit;
use lumen_engine::events::{Event, EventHandler, EventKind, EventType};
use lumen_engine::input::Key;
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::render::{
    Angle, AtlasConfig, Material, Mesh, Quad, QuadDraw, Renderer2D, Renderer2DConfig, Renderer3D,
    Renderer3DConfig, RendererCommon, Shading, SubTexture, Texture, TextureAtlas, WgpuDevice,
};
use lumen_engine::text::{Font, GlyphSource};
use lumen_engine::time::Timer;
use lumen_engine::window::{Runtime, RuntimeConfig};

const FONT_PX: f32 = 24.0;

const FALLBACK_FONTS: [&str; 5] = [
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
];

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let font_path = std::env::args().nth(1);
    let font = load_font(font_path.as_deref());
    let paused = Rc::new(Cell::new(false));
    let app = Sandbox::new(font.as_ref(), paused.clone()).context("failed to set up the sandbox scene")?;

    Runtime::run_with_handler(
        RuntimeConfig {
            title: "lumen sandbox".to_string(),
            ..Default::default()
        },
        GpuInit::default(),
        focus_handler(paused),
        app,
    )
}

/// Pauses the scene while the window is unfocused.
fn focus_handler(paused: Rc<Cell<bool>>) -> EventHandler {
    let mut handler = EventHandler::new();
    let on_lost = paused.clone();
    handler.set_callback(EventType::WindowLostFocus, move |_| {
        log::debug!("focus lost; pausing");
        on_lost.set(true);
        false
    });
    handler.set_callback(EventType::WindowFocus, move |_| {
        paused.set(false);
        false
    });
    handler
}

fn load_font(explicit: Option<&str>) -> Option<Font> {
    if let Some(path) = explicit {
        match Font::from_file(path, FONT_PX) {
            Ok(font) => return Some(font),
            Err(e) => log::warn!("{e}; trying system fonts"),
        }
    }

    let font = FALLBACK_FONTS
        .iter()
        .find_map(|p| Font::from_file(p, FONT_PX).ok());
    if font.is_none() {
        log::warn!("no font found; text overlay disabled (pass a .ttf path as the first argument)");
    }
    font
}

/// Which camera drives the 3D view.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum CameraMode {
    Free,
    Follow,
}

struct Sandbox {
    common: RendererCommon<WgpuDevice>,
    renderer2d: Renderer2D,
    renderer3d: Renderer3D,

    free_camera: FreeEulerController,
    follow_camera: FollowController,
    overlay_camera: OrthoController,
    mode: CameraMode,

    cube: Rc<Mesh>,
    player: Rc<Cell<Mat4>>,
    checker: Rc<Texture>,
    sprites: Vec<SubTexture>,

    clock: Timer,
    frame_ms: f32,
    scene_time: f32,
    paused: Rc<Cell<bool>>,
}

impl Sandbox {
    fn new(font: Option<&Font>, paused: Rc<Cell<bool>>) -> anyhow::Result<Self> {
        let source = font.map(|f| f as &dyn GlyphSource);
        let renderer2d = Renderer2D::new(Renderer2DConfig::default(), source)?;

        let checker = checkerboard(64, 8, [230, 230, 230, 255], [40, 90, 160, 255])?;

        let mut atlas = TextureAtlas::new(AtlasConfig {
            width: 256,
            height: 256,
            ..Default::default()
        })?;
        let sprites = vec![
            atlas.add(32, 32, 4, &solid(32, 32, [220, 80, 60, 255]))?,
            atlas.add(48, 24, 4, &solid(48, 24, [60, 200, 120, 255]))?,
            atlas.add(16, 64, 4, &solid(16, 64, [240, 200, 40, 255]))?,
        ];

        let player = Rc::new(Cell::new(Mat4::from_translation(Vec3::new(0.0, 0.0, -6.0))));

        Ok(Self {
            common: RendererCommon::new(WgpuDevice::new()),
            renderer2d,
            renderer3d: Renderer3D::new(Renderer3DConfig::default()),
            free_camera: FreeEulerController::new(EulerCameraProps {
                position: Vec3::new(0.0, 1.5, 4.0),
                translation_speed: 5.0,
                ..Default::default()
            }),
            follow_camera: FollowController::new(FollowParams::new(player.clone(), Vec3::new(0.0, 2.0, 6.0))),
            overlay_camera: OrthoController::new(1024, 800),
            mode: CameraMode::Free,
            cube: Mesh::cube(),
            player,
            checker,
            sprites,
            clock: Timer::start(),
            frame_ms: 0.0,
            scene_time: 0.0,
            paused,
        })
    }

    fn active_camera(&self) -> &dyn CameraController {
        match self.mode {
            CameraMode::Free => &self.free_camera,
            CameraMode::Follow => &self.follow_camera,
        }
    }

    fn draw_world(&mut self) {
        let t = self.scene_time;
        let uniforms = self.active_camera().scene_uniforms();
        let common = &mut self.common;

        self.renderer3d.begin(common, &uniforms);

        for i in -3..=3 {
            let x = i as f32 * 2.5;
            let model = Mat4::from_translation(Vec3::new(x, 0.0, -12.0))
                * Mat4::from_rotation_y(t * 0.7 + i as f32);
            let material = if i % 2 == 0 {
                Material::textured(self.checker.clone())
            } else {
                Material::tinted(Vec4::new(0.9, 0.5 + 0.1 * i as f32, 0.3, 1.0))
            };
            self.renderer3d.submit(common, &self.cube, &material, model);
        }

        // orbiting "player" the follow camera tracks
        let player = Mat4::from_rotation_y(t * 0.4) * Mat4::from_translation(Vec3::new(0.0, 0.0, -6.0));
        self.player.set(player);
        let marker = Material::tinted(Vec4::new(1.0, 1.0, 0.2, 1.0)).with_shading(Shading::Unlit);
        self.renderer3d.submit(common, &self.cube, &marker, player * Mat4::from_scale(Vec3::splat(0.5)));

        let floor = Mat4::from_translation(Vec3::new(0.0, -1.5, -8.0)) * Mat4::from_scale(Vec3::new(20.0, 0.1, 20.0));
        self.renderer3d.submit(common, &self.cube, &Material::tinted(Vec4::new(0.3, 0.3, 0.35, 1.0)), floor);

        self.renderer3d.end(common);
    }

    fn draw_overlay(&mut self) {
        let t = self.scene_time;
        let uniforms = self.overlay_camera.scene_uniforms();
        let common = &mut self.common;
        let r2d = &mut self.renderer2d;

        r2d.begin(common, &uniforms);

        r2d.submit_tinted(
            common,
            &Quad::create_central_half_extents(Vec2::new(170.0, 60.0), Vec2::new(160.0, 50.0)),
            Vec4::new(0.0, 0.0, 0.0, 0.6),
        );

        for (i, sprite) in self.sprites.iter().enumerate() {
            let centre = Vec2::new(60.0 + 70.0 * i as f32, 160.0);
            let quad = Quad::create_central_half_extents(centre, sprite.size() * 0.5);
            r2d.submit(common, &quad, QuadDraw::textured(sprite).rotated(Angle::Radians(t + i as f32)));
        }

        let mode = match (self.paused.get(), self.mode) {
            (true, _) => "paused (window unfocused)",
            (false, CameraMode::Free) => "free camera (Tab to switch)",
            (false, CameraMode::Follow) => "follow camera (Tab to switch)",
        };
        let white = Vec4::ONE;
        r2d.submit_text(common, "Lumen sandbox", Vec2::new(20.0, 40.0), white);
        r2d.submit_text(common, mode, Vec2::new(20.0, 70.0), Vec4::new(0.8, 0.8, 0.8, 1.0));
        let timing = format!("{:.2} ms", self.frame_ms);
        r2d.submit_text(common, &timing, Vec2::new(20.0, 100.0), Vec4::new(0.6, 1.0, 0.6, 1.0));

        r2d.end(common);
    }
}

impl App for Sandbox {
    fn on_event(&mut self, event: &mut Event) -> AppControl {
        match *event.kind() {
            EventKind::WindowResize { width, height } => {
                self.free_camera.resize(width, height);
                self.follow_camera.resize(width, height);
                self.overlay_camera.resize(width, height);
            }
            EventKind::KeyPressed { key: Key::Tab, repeat_count: 0 } => {
                self.mode = match self.mode {
                    CameraMode::Free => CameraMode::Follow,
                    CameraMode::Follow => CameraMode::Free,
                };
                log::info!("camera: {:?}", self.mode);
                event.handle(true);
            }
            EventKind::KeyPressed { key: Key::Escape, .. } => return AppControl::Exit,
            _ => {}
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let frame_ms = self.clock.lap().as_secs_f32() * 1000.0;
        self.frame_ms = self.frame_ms * 0.9 + frame_ms * 0.1;

        if !self.paused.get() {
            let dt = ctx.time.dt;
            self.scene_time += dt;
            match self.mode {
                CameraMode::Free => self.free_camera.update(dt, ctx.input),
                CameraMode::Follow => self.follow_camera.update(dt, ctx.input),
            }
        }

        self.draw_world();
        self.draw_overlay();

        let device = &mut self.common.device;
        ctx.render(|rctx, target| device.encode(rctx, target))
    }
}

fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    rgba.repeat((width * height) as usize)
}

fn checkerboard(size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> anyhow::Result<Rc<Texture>> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let odd = ((x / cell) + (y / cell)) % 2 == 1;
            pixels.extend_from_slice(if odd { &b } else { &a });
        }
    }
    Ok(Texture::new(size, size, 4, Some(&pixels))?)
}
