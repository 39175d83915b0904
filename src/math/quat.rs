//! Unit quaternions for rotations.

use std::ops::Mul;

use super::mat3::Mat3;
use super::mat4::Mat4;
use super::vec3::Vec3;
use crate::error::MathError;

/// Quaternion `w + xi + yj + zk`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `radians` counter-clockwise around `axis`.
    ///
    /// The axis does not need to be normalized, but it must not be zero.
    pub fn from_axis_angle(axis: Vec3, radians: f32) -> Result<Self, MathError> {
        let axis = axis.normalize()?;
        let (s, c) = (radians * 0.5).sin_cos();
        Ok(Self::new(axis.x * s, axis.y * s, axis.z * s, c))
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    pub fn normalize(&self) -> Result<Self, MathError> {
        let len = self.length();
        if len <= f32::EPSILON || !len.is_finite() {
            return Err(MathError::ZeroLengthVector);
        }
        Ok(Self::new(self.x / len, self.y / len, self.z / len, self.w / len))
    }

    pub fn conjugate(&self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Rotates `v` by this quaternion (assumed unit length).
    pub fn rotate(&self, v: Vec3) -> Vec3 {
        let u = Vec3::new(self.x, self.y, self.z);
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_quat(*self)
    }

    pub fn to_mat3(&self) -> Mat3 {
        Mat4::from_quat(*self).to_mat3()
    }
}

/// Hamilton product: `a * b` rotates by `b` first, then `a`.
impl Mul<Quat> for Quat {
    type Output = Quat;

    fn mul(self, b: Quat) -> Quat {
        let a = self;
        Quat::new(
            a.w * b.x + a.x * b.w + a.y * b.z - a.z * b.y,
            a.w * b.y - a.x * b.z + a.y * b.w + a.z * b.x,
            a.w * b.z + a.x * b.y - a.y * b.x + a.z * b.w,
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        )
    }
}
