use glam::{Mat4, Quat, Vec3};

use crate::input::{InputState, Key, MouseButton};

use super::{aspect_ratio, Camera, CameraController};

const MAX_PITCH: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// Settings of a [`FreeEulerController`]. Angles are in radians except `fov_y_degrees`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EulerCameraProps {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    /// World units per second.
    pub translation_speed: f32,
    /// Radians per pixel of mouse movement.
    pub rotation_speed: f32,
    pub fov_y_degrees: f32,
    pub aspect_ratio: f32,
    pub near_clip: f32,
    pub far_clip: f32,
}

impl Default for EulerCameraProps {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            translation_speed: 20.0,
            rotation_speed: 0.004,
            fov_y_degrees: 45.0,
            aspect_ratio: 16.0 / 9.0,
            near_clip: 0.1,
            far_clip: 100.0,
        }
    }
}

/// Free-flying camera.
///
/// W/S move along the view direction projected onto the ground plane, A/D
/// strafe, Space/C move along the camera's up axis. Holding the right mouse
/// button turns the camera; pitch stays within ±89°.
#[derive(Debug, Clone)]
pub struct FreeEulerController {
    props: EulerCameraProps,
    camera: Camera,
    model: Mat4,
    looking: bool,
}

impl FreeEulerController {
    pub fn new(props: EulerCameraProps) -> Self {
        let mut props = props;
        props.pitch = props.pitch.clamp(-MAX_PITCH, MAX_PITCH);

        let mut controller = Self {
            props,
            camera: Camera {
                view: Mat4::IDENTITY,
                projection: Mat4::perspective_rh(
                    props.fov_y_degrees.to_radians(),
                    props.aspect_ratio,
                    props.near_clip,
                    props.far_clip,
                ),
            },
            model: Mat4::IDENTITY,
            looking: false,
        };
        controller.rebuild();
        controller
    }

    pub fn props(&self) -> &EulerCameraProps {
        &self.props
    }

    pub fn position(&self) -> Vec3 {
        self.props.position
    }

    /// Camera-space -Z in world space.
    pub fn forward(&self) -> Vec3 {
        -self.model.z_axis.truncate()
    }

    pub fn right(&self) -> Vec3 {
        self.model.x_axis.truncate()
    }

    pub fn up(&self) -> Vec3 {
        self.model.y_axis.truncate()
    }

    fn rebuild(&mut self) {
        let rotation = Quat::from_rotation_y(self.props.yaw) * Quat::from_rotation_x(self.props.pitch);
        self.model = Mat4::from_rotation_translation(rotation, self.props.position);
        self.camera.update_view(self.model);
    }
}

impl CameraController for FreeEulerController {
    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn update(&mut self, dt: f32, input: &InputState) {
        let step = self.props.translation_speed * dt;
        let (forward, right, up) = (self.forward(), self.right(), self.up());
        let mut moved = false;

        let planar = |v: Vec3| Vec3::new(v.x, 0.0, v.z);
        for (key, delta) in [
            (Key::W, planar(forward)),
            (Key::S, -planar(forward)),
            (Key::D, right),
            (Key::A, -right),
            (Key::Space, up),
            (Key::C, -up),
        ] {
            if input.key_down(key) {
                self.props.position += delta * step;
                moved = true;
            }
        }

        if input.button_down(MouseButton::Right) {
            // the first frame only anchors the cursor
            if self.looking {
                let delta = input.mouse_delta();
                if delta != glam::Vec2::ZERO {
                    self.props.yaw -= delta.x * self.props.rotation_speed;
                    self.props.pitch = (self.props.pitch - delta.y * self.props.rotation_speed)
                        .clamp(-MAX_PITCH, MAX_PITCH);
                    moved = true;
                }
            }
            self.looking = true;
        } else {
            self.looking = false;
        }

        if moved {
            self.rebuild();
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.props.aspect_ratio = aspect_ratio(width, height);
        self.camera.projection = Mat4::perspective_rh(
            self.props.fov_y_degrees.to_radians(),
            self.props.aspect_ratio,
            self.props.near_clip,
            self.props.far_clip,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Event, EventKind};

    fn press(input: &mut InputState, key: Key) {
        input.apply(&Event::new(EventKind::KeyPressed { key, repeat_count: 0 }));
    }

    fn controller() -> FreeEulerController {
        FreeEulerController::new(EulerCameraProps {
            translation_speed: 2.0,
            ..Default::default()
        })
    }

    #[test]
    fn starts_looking_down_negative_z() {
        let c = controller();
        assert!(c.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!(c.camera().view.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn w_moves_forward_on_the_ground_plane() {
        let mut c = FreeEulerController::new(EulerCameraProps {
            translation_speed: 2.0,
            pitch: 0.5,
            ..Default::default()
        });
        let mut input = InputState::new();
        press(&mut input, Key::W);

        c.update(0.5, &input);
        assert_eq!(c.position().y, 0.0);
        assert!(c.position().z < 0.0);
        assert!(c.camera().position().abs_diff_eq(c.position(), 1e-5));
    }

    #[test]
    fn strafe_and_vertical_keys() {
        let mut c = controller();
        let mut input = InputState::new();
        press(&mut input, Key::D);
        press(&mut input, Key::Space);

        c.update(1.0, &input);
        assert!(c.position().abs_diff_eq(Vec3::new(2.0, 2.0, 0.0), 1e-5));
    }

    #[test]
    fn mouse_look_needs_right_button_and_clamps_pitch() {
        let mut c = controller();
        let mut input = InputState::new();
        input.apply(&Event::new(EventKind::MouseMoved { x: 100.0, y: 100.0 }));
        input.end_frame();

        // no button: nothing turns
        input.apply(&Event::new(EventKind::MouseMoved { x: 150.0, y: 100.0 }));
        c.update(0.016, &input);
        assert_eq!(c.props().yaw, 0.0);
        input.end_frame();

        input.apply(&Event::new(EventKind::MouseButtonPressed { button: MouseButton::Right }));
        c.update(0.016, &input); // anchor frame
        input.end_frame();

        input.apply(&Event::new(EventKind::MouseMoved { x: 150.0, y: -100_000.0 }));
        c.update(0.016, &input);
        assert!(c.props().yaw == 0.0);
        assert!((c.props().pitch - MAX_PITCH).abs() < 1e-6);
    }

    #[test]
    fn resize_updates_aspect() {
        let mut c = controller();
        c.resize(1000, 500);
        assert_eq!(c.props().aspect_ratio, 2.0);
        let expected = Mat4::perspective_rh(45f32.to_radians(), 2.0, 0.1, 100.0);
        assert!(c.camera().projection.abs_diff_eq(expected, 1e-6));
    }
}
