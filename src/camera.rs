//! Perspective orbit camera.
//!
//! # Coordinate System
//!
//! Right-handed, like OpenGL:
//! - X: positive right
//! - Y: positive up
//! - Z: positive towards the viewer (the camera looks down -Z in view space)
//!
//! # Orientation
//!
//! The camera is parameterized by `eye`, `target` and `up`. The view matrix is
//! cached and recomputed by every mutator, so reading it never fails. Mutators
//! validate first and leave the camera untouched on error.

use std::cell::RefCell;
use std::rc::Rc;

use log::trace;

use crate::error::MathError;
use crate::gl::Viewport;
use crate::input::{InputState, Key};
use crate::math::{Mat3, Mat4, Quat, Vec3, Vec4};
use crate::projection::Projection;

/// Camera shared between a [`CameraNode`](crate::scene::CameraNode) and the host.
pub type SharedCamera = Rc<RefCell<Camera>>;

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    eye: Vec3,
    target: Vec3,
    up: Vec3,
    projection: Projection,
    view: Mat4,
}

impl Camera {
    pub fn new(eye: Vec3, target: Vec3, up: Vec3, projection: Projection) -> Result<Self, MathError> {
        let view = Mat4::look_at(eye, target, up)?;
        Ok(Self {
            eye,
            target,
            up: up.normalize()?,
            projection,
            view,
        })
    }

    pub fn shared(self) -> SharedCamera {
        Rc::new(RefCell::new(self))
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
    }

    /// World to view transform (the inverse of the camera's world transform).
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.matrix()
    }

    /// Projection matrix for an explicit aspect ratio, usually the viewport's.
    pub fn projection_matrix_for(&self, aspect: f32) -> Result<Mat4, MathError> {
        self.projection.matrix_for(aspect)
    }

    pub fn set_camera_position(&mut self, eye: Vec3) -> Result<(), MathError> {
        self.commit(eye, self.target, self.up)
    }

    pub fn set_target_position(&mut self, target: Vec3) -> Result<(), MathError> {
        self.commit(self.eye, target, self.up)
    }

    pub fn set_up(&mut self, up: Vec3) -> Result<(), MathError> {
        self.commit(self.eye, self.target, up)
    }

    /// Moves eye and target together.
    pub fn translate(&mut self, delta: Vec3) -> Result<(), MathError> {
        self.commit(self.eye + delta, self.target + delta, self.up)
    }

    /// Orbits the eye around the target.
    ///
    /// Pitch turns about the camera's current right axis and yaw about its
    /// current up axis. The up vector is carried along, so successive calls
    /// compose relative to the current orientation and orbiting over the
    /// poles never degenerates.
    pub fn pivot(&mut self, pitch_degrees: f32, yaw_degrees: f32) -> Result<(), MathError> {
        let pitch = Quat::from_axis_angle(self.right(), pitch_degrees.to_radians())?;
        let yaw = Quat::from_axis_angle(self.camera_up(), yaw_degrees.to_radians())?;
        let rotation = (yaw * pitch).normalize()?;

        let t = self.target;
        let orbit = Mat4::translation(t.x, t.y, t.z)
            * rotation.to_mat4()
            * Mat4::translation(-t.x, -t.y, -t.z);

        let eye = orbit.transform_point(self.eye);
        let up = rotation.rotate(self.up);
        trace!("pivot pitch={pitch_degrees} yaw={yaw_degrees} eye={eye:?}");
        self.commit(eye, t, up)
    }

    /// World point to normalized device coordinates.
    pub fn project(&self, point: Vec3) -> Result<Vec3, MathError> {
        let clip = self.projection.matrix() * self.view * Vec4::from(point);
        clip.perspective_divide()
    }

    /// Unit vector from eye to target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize_or_zero()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or_zero()
    }

    /// Up axis orthogonal to [`forward`](Self::forward) and [`right`](Self::right).
    pub fn camera_up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    /// Camera-to-world rotation: maps view-space directions into world space.
    pub fn inverse_rotation(&self) -> Mat3 {
        self.view.to_mat3().transpose()
    }

    fn commit(&mut self, eye: Vec3, target: Vec3, up: Vec3) -> Result<(), MathError> {
        let view = Mat4::look_at(eye, target, up)?;
        self.up = up.normalize()?;
        self.eye = eye;
        self.target = target;
        self.view = view;
        Ok(())
    }
}

/// Drives a camera from mouse and keyboard state.
///
/// Holding the mouse button orbits proportionally to the cursor's offset from
/// the viewport centre. W/A/S/D or the arrow keys move eye and target along
/// the camera's own axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraController {
    /// Units per second.
    pub velocity: f32,
    /// Degrees per second per pixel of cursor offset.
    pub pivot_speed: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self {
            velocity: 1.0,
            pivot_speed: 0.05,
        }
    }
}

impl CameraController {
    pub fn new(velocity: f32, pivot_speed: f32) -> Self {
        Self {
            velocity,
            pivot_speed,
        }
    }

    pub fn tick(
        &self,
        camera: &mut Camera,
        input: &InputState,
        viewport: Viewport,
        dt_seconds: f32,
    ) -> Result<(), MathError> {
        let mouse = input.mouse();
        if mouse.down {
            let (cx, cy) = viewport.center();
            let dx = mouse.x - cx;
            let dy = mouse.y - cy;
            camera.pivot(
                -dy * self.pivot_speed * dt_seconds,
                -dx * self.pivot_speed * dt_seconds,
            )?;
        }

        let mut direction = Vec3::ZERO;
        if input.any_pressed(&[Key::Char('W'), Key::Up]) {
            direction.z = -1.0;
        } else if input.any_pressed(&[Key::Char('S'), Key::Down]) {
            direction.z = 1.0;
        }
        if input.any_pressed(&[Key::Char('A'), Key::Left]) {
            direction.x = -1.0;
        } else if input.any_pressed(&[Key::Char('D'), Key::Right]) {
            direction.x = 1.0;
        }

        let Ok(direction) = direction.normalize() else {
            return Ok(());
        };
        let world = camera.inverse_rotation() * direction;
        camera.translate(world * (self.velocity * dt_seconds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> Camera {
        Camera::new(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::ZERO,
            Vec3::Y,
            Projection::default(),
        )
        .unwrap()
    }

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-4);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-4);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-4);
    }

    #[test]
    fn pivot_composes_additively() {
        let mut twice = camera();
        twice.pivot(10.0, 0.0).unwrap();
        twice.pivot(10.0, 0.0).unwrap();

        let mut once = camera();
        once.pivot(20.0, 0.0).unwrap();

        assert_vec_eq(twice.eye(), once.eye());
        assert_vec_eq(twice.up(), once.up());
    }

    #[test]
    fn pivot_keeps_distance_to_target() {
        let mut cam = camera();
        cam.pivot(35.0, -70.0).unwrap();
        assert_relative_eq!((cam.eye() - cam.target()).magnitude(), 10.0, epsilon = 1e-3);
    }

    #[test]
    fn pivot_over_the_pole_does_not_fail() {
        let mut cam = camera();
        cam.pivot(90.0, 0.0).unwrap();
        cam.pivot(45.0, 0.0).unwrap();
        assert_relative_eq!(cam.eye().magnitude(), 10.0, epsilon = 1e-3);
    }

    #[test]
    fn failed_update_leaves_camera_unchanged() {
        let mut cam = camera();
        let before = cam.clone();
        assert_eq!(
            cam.set_camera_position(Vec3::ZERO),
            Err(MathError::CoincidentPoints)
        );
        assert_eq!(cam, before);
        assert_eq!(
            cam.set_target_position(Vec3::new(0.0, 5.0, 10.0)),
            Err(MathError::ParallelUp)
        );
        assert_eq!(cam, before);
    }

    #[test]
    fn view_matrix_tracks_position() {
        let mut cam = camera();
        cam.set_camera_position(Vec3::new(0.0, 0.0, 4.0)).unwrap();
        let origin = cam.view_matrix().transform_point(Vec3::ZERO);
        assert_relative_eq!(origin.z, -4.0, epsilon = 1e-5);
    }

    #[test]
    fn project_target_lands_at_screen_centre() {
        let cam = camera();
        let ndc = cam.project(Vec3::ZERO).unwrap();
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-6);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }

    #[test]
    fn controller_moves_forward_on_w() {
        let mut cam = camera();
        let mut input = InputState::new();
        input.key_down(Key::Char('w'));
        let viewport = Viewport::new(0, 0, 640, 480);
        CameraController::new(2.0, 0.05)
            .tick(&mut cam, &input, viewport, 0.5)
            .unwrap();
        assert_vec_eq(cam.eye(), Vec3::new(0.0, 0.0, 9.0));
        assert_vec_eq(cam.target(), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn controller_ignores_centred_mouse() {
        let mut cam = camera();
        let before = cam.clone();
        let mut input = InputState::new();
        input.mouse_down();
        input.mouse_move(320.0, 240.0);
        CameraController::default()
            .tick(&mut cam, &input, Viewport::new(0, 0, 640, 480), 0.016)
            .unwrap();
        assert_vec_eq(cam.eye(), before.eye());
    }
}
