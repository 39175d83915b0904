//! Local transform of a scene node.
//!
//! A [`Transform`] keeps position, orientation and scale separately and
//! composes them into a model matrix on demand. Mutators return `&mut Self`
//! so they can be chained:
//!
//! ```ignore
//! transform
//!     .set_position_xyz(5.0, 2.0, 0.0)
//!     .rotate_y_degrees(30.0)
//!     .set_scale_uniform(2.0);
//! ```

use crate::error::MathError;
use crate::math::{Mat3, Mat4, Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) -> &mut Self {
        self.position = position;
        self
    }

    pub fn set_position_xyz(&mut self, x: f32, y: f32, z: f32) -> &mut Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    pub fn translate(&mut self, delta: Vec3) -> &mut Self {
        self.position += delta;
        self
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quat) -> &mut Self {
        self.rotation = rotation;
        self
    }

    /// Applies an extra rotation of `degrees` around `axis` on top of the
    /// current orientation.
    pub fn rotate_axis_degrees(&mut self, axis: Vec3, degrees: f32) -> Result<&mut Self, MathError> {
        let q = Quat::from_axis_angle(axis, degrees.to_radians())?;
        self.rotation = (q * self.rotation).normalize()?;
        Ok(self)
    }

    pub fn rotate_y_degrees(&mut self, degrees: f32) -> &mut Self {
        let (s, c) = (degrees.to_radians() * 0.5).sin_cos();
        self.rotation = Quat::new(0.0, s, 0.0, c) * self.rotation;
        self
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec3) -> &mut Self {
        self.scale = scale;
        self
    }

    pub fn set_scale_uniform(&mut self, s: f32) -> &mut Self {
        self.scale = Vec3::splat(s);
        self
    }

    /// Model matrix: `Translation * Rotation * Scale`.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::translation(self.position.x, self.position.y, self.position.z)
            * self.rotation.to_mat4()
            * Mat4::scaling(self.scale.x, self.scale.y, self.scale.z)
    }

    /// Inverse transpose of the rotation+scale block.
    ///
    /// Falls back to identity for a zero scale.
    pub fn normal_matrix(&self) -> Mat3 {
        let linear = self.rotation.to_mat3()
            * Mat4::scaling(self.scale.x, self.scale.y, self.scale.z).to_mat3();
        linear
            .inverse()
            .map(|m| m.transpose())
            .unwrap_or(Mat3::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_is_identity() {
        assert_eq!(Transform::default().to_matrix(), Mat4::identity());
    }

    #[test]
    fn chained_setters() {
        let mut t = Transform::new();
        t.set_position_xyz(1.0, 2.0, 3.0)
            .rotate_y_degrees(90.0)
            .set_scale_uniform(2.0);

        let p = t.to_matrix().transform_point(Vec3::X);
        // scale 2, rotate +X onto -Z, then translate
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn rotate_axis_rejects_zero_axis() {
        let mut t = Transform::new();
        assert!(t.rotate_axis_degrees(Vec3::ZERO, 10.0).is_err());
        assert_eq!(t.rotation(), Quat::IDENTITY);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let mut t = Transform::new();
        t.set_scale(Vec3::new(2.0, 1.0, 1.0));
        let n = t.normal_matrix();
        assert_relative_eq!(n.get(0, 0), 0.5, epsilon = 1e-6);
        assert_relative_eq!(n.get(1, 1), 1.0, epsilon = 1e-6);
    }
}
