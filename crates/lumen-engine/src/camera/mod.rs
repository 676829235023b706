//! Cameras and the controllers that drive them.
//!
//! A controller owns a [`Camera`], updates it from input each frame and
//! produces the [`SceneUniforms`] the renderers' `begin` expects.

mod euler;
mod follow;
mod ortho;

use glam::{Mat4, Vec3};

use crate::input::InputState;
use crate::render::uniforms::{SceneUniforms, U_PROJECTION, U_VIEW, U_VIEW_POS};

pub use euler::{EulerCameraProps, FreeEulerController};
pub use follow::{FollowController, FollowParams};
pub use ortho::OrthoController;

/// View and projection matrices.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub view: Mat4,
    pub projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::perspective_rh(45f32.to_radians(), 1024.0 / 800.0, 0.1, 100.0),
        }
    }
}

impl Camera {
    /// Sets the view to the inverse of the camera's world transform.
    pub fn update_view(&mut self, transform: Mat4) {
        self.view = transform.inverse();
    }

    /// World-space eye position.
    pub fn position(&self) -> Vec3 {
        self.view.inverse().w_axis.truncate()
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

pub trait CameraController {
    fn camera(&self) -> &Camera;

    /// Advances the controller by `dt` seconds.
    fn update(&mut self, dt: f32, input: &InputState);

    /// Adapts the projection to a new target size in pixels.
    fn resize(&mut self, width: u32, height: u32);

    /// `u_projection`, `u_view` and `u_viewPos` for the current camera.
    fn scene_uniforms(&self) -> SceneUniforms {
        let camera = self.camera();
        SceneUniforms::new()
            .with(U_PROJECTION, camera.projection)
            .with(U_VIEW, camera.view)
            .with(U_VIEW_POS, camera.position())
    }
}

/// Width over height, 1.0 when either side is zero.
pub(crate) fn aspect_ratio(width: u32, height: u32) -> f32 {
    if width == 0 || height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_view_inverts_the_transform() {
        let mut cam = Camera::default();
        let transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        cam.update_view(transform);
        assert!(cam.view.abs_diff_eq(transform.inverse(), 1e-6));
        assert!(cam.position().abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-5));
    }

    #[test]
    fn scene_uniforms_carry_camera_matrices() {
        let controller = OrthoController::new(800, 600);
        let u = controller.scene_uniforms();
        assert_eq!(u.mat4_or_identity(U_PROJECTION), controller.camera().projection);
        assert_eq!(u.mat4_or_identity(U_VIEW), Mat4::IDENTITY);
        assert!(u.contains(U_VIEW_POS));
    }

    #[test]
    fn degenerate_aspect_is_one() {
        assert_eq!(aspect_ratio(0, 10), 1.0);
        assert_eq!(aspect_ratio(200, 100), 2.0);
    }
}
