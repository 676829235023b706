use glam::Mat4;

use crate::input::InputState;

use super::{Camera, CameraController};

/// Pixel-space camera for 2D overlays: origin top-left, +Y down.
#[derive(Debug, Clone)]
pub struct OrthoController {
    camera: Camera,
    size: (u32, u32),
}

impl OrthoController {
    pub fn new(width: u32, height: u32) -> Self {
        let mut controller = Self {
            camera: Camera { view: Mat4::IDENTITY, projection: Mat4::IDENTITY },
            size: (0, 0),
        };
        controller.resize(width, height);
        controller
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

impl CameraController for OrthoController {
    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn update(&mut self, _dt: f32, _input: &InputState) {}

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
        let (w, h) = (self.size.0 as f32, self.size.1 as f32);
        self.camera.projection = Mat4::orthographic_rh(0.0, w, h, 0.0, -1.0, 1.0);
    }
}
