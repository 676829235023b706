use std::cell::Cell;
use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::input::InputState;

use super::{aspect_ratio, Camera, CameraController};

/// Settings of a [`FollowController`].
#[derive(Debug, Clone)]
pub struct FollowParams {
    /// World transform of the followed entity, shared with whoever moves it.
    pub entity_transform: Rc<Cell<Mat4>>,
    pub fov_y_degrees: f32,
    pub aspect_ratio: f32,
    pub near_clip: f32,
    pub far_clip: f32,
    /// Camera offset in the entity's frame: x right, y up, z behind.
    pub offset: Vec3,
}

impl FollowParams {
    pub fn new(entity_transform: Rc<Cell<Mat4>>, offset: Vec3) -> Self {
        Self {
            entity_transform,
            fov_y_degrees: 45.0,
            aspect_ratio: 16.0 / 9.0,
            near_clip: 0.1,
            far_clip: 100.0,
            offset,
        }
    }
}

/// Camera that trails an entity at a fixed offset and looks at it.
#[derive(Debug, Clone)]
pub struct FollowController {
    params: FollowParams,
    camera: Camera,
    position: Vec3,
}

impl FollowController {
    pub fn new(params: FollowParams) -> Self {
        let projection = Mat4::perspective_rh(
            params.fov_y_degrees.to_radians(),
            params.aspect_ratio,
            params.near_clip,
            params.far_clip,
        );
        let mut controller = Self {
            params,
            camera: Camera { view: Mat4::IDENTITY, projection },
            position: Vec3::ZERO,
        };
        controller.track();
        controller
    }

    /// Eye position after the last update.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn params(&self) -> &FollowParams {
        &self.params
    }

    fn track(&mut self) {
        let entity = self.params.entity_transform.get();
        let right = entity.x_axis.truncate();
        let up = entity.y_axis.truncate();
        let forward = -entity.z_axis.truncate();
        let target = entity.w_axis.truncate();

        let offset = self.params.offset;
        let delta = forward * -offset.z + right * offset.x + up * offset.y;
        self.position = target + delta;
        if delta.length_squared() < 1e-8 {
            log::warn!("follow camera offset is zero; view left unchanged");
            return;
        }

        let cam_forward = -delta;
        let mut cam_right = Vec3::Y.cross(delta);
        if cam_right.length_squared() < 1e-8 {
            // straight above or below: take the entity's own right axis
            cam_right = right;
        }
        let cam_up = cam_right.cross(cam_forward).normalize_or(Vec3::Y);
        self.camera.view = Mat4::look_at_rh(self.position, target, cam_up);
    }
}

impl CameraController for FollowController {
    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn update(&mut self, _dt: f32, _input: &InputState) {
        self.track();
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.params.aspect_ratio = aspect_ratio(width, height);
        self.camera.projection = Mat4::perspective_rh(
            self.params.fov_y_degrees.to_radians(),
            self.params.aspect_ratio,
            self.params.near_clip,
            self.params.far_clip,
        );
    }
}
