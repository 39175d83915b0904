//! Perspective projection parameters.
//!
//! The [`Projection`] struct is the single source of truth for the perspective
//! parameters of a camera (FOV, aspect ratio, near/far planes). Parameters are
//! validated on construction so [`Projection::matrix`] cannot fail afterwards.

use crate::error::MathError;
use crate::math::Mat4;

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in degrees.
    fov_y_degrees: f32,
    /// Aspect ratio (width / height).
    aspect_ratio: f32,
    z_near: f32,
    z_far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_y_degrees: 50.0,
            aspect_ratio: 1.0,
            z_near: 0.1,
            z_far: 5000.0,
        }
    }
}

impl Projection {
    /// Creates a new projection.
    ///
    /// # Arguments
    /// * `fov_y_degrees` - Vertical field of view in degrees, in `(0, 180)`
    /// * `aspect_ratio` - Width divided by height
    /// * `z_near` - Near clipping plane distance (must be > 0)
    /// * `z_far` - Far clipping plane distance (must be > 0 and != `z_near`)
    pub fn new(
        fov_y_degrees: f32,
        aspect_ratio: f32,
        z_near: f32,
        z_far: f32,
    ) -> Result<Self, MathError> {
        let projection = Self {
            fov_y_degrees,
            aspect_ratio,
            z_near,
            z_far,
        };
        projection.matrix_for(aspect_ratio)?;
        Ok(projection)
    }

    pub fn fov_y_degrees(&self) -> f32 {
        self.fov_y_degrees
    }

    /// Returns the horizontal field of view in degrees.
    pub fn fov_x_degrees(&self) -> f32 {
        let half = self.fov_y_degrees.to_radians() / 2.0;
        (2.0 * (self.aspect_ratio * half.tan()).atan()).to_degrees()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn z_near(&self) -> f32 {
        self.z_near
    }

    pub fn z_far(&self) -> f32 {
        self.z_far
    }

    /// Updates the aspect ratio (typically called on window resize).
    ///
    /// Leaves the projection untouched when the ratio is invalid.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) -> Result<(), MathError> {
        self.matrix_for(aspect_ratio)?;
        self.aspect_ratio = aspect_ratio;
        Ok(())
    }

    /// Right-handed perspective matrix with OpenGL depth range.
    pub fn matrix(&self) -> Mat4 {
        // Parameters were validated when stored
        self.matrix_for(self.aspect_ratio)
            .unwrap_or(Mat4::IDENTITY)
    }

    /// Perspective matrix for an explicit aspect ratio, e.g. the current viewport.
    pub fn matrix_for(&self, aspect_ratio: f32) -> Result<Mat4, MathError> {
        Mat4::perspective(
            self.fov_y_degrees.to_radians(),
            aspect_ratio,
            self.z_near,
            self.z_far,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fov_x_matches_aspect_ratio() {
        let proj = Projection::new(45.0, 1.0, 0.1, 100.0).unwrap();
        assert_relative_eq!(proj.fov_x_degrees(), proj.fov_y_degrees(), epsilon = 1e-4);
    }

    #[test]
    fn fov_x_wider_with_higher_aspect() {
        let proj = Projection::new(45.0, 16.0 / 9.0, 0.1, 100.0).unwrap();
        assert!(proj.fov_x_degrees() > proj.fov_y_degrees());
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(Projection::new(50.0, 1.0, 1.0, 1.0).is_err());
        assert!(Projection::new(180.0, 1.0, 0.1, 10.0).is_err());
        assert!(Projection::new(50.0, -2.0, 0.1, 10.0).is_err());
    }

    #[test]
    fn failed_aspect_update_keeps_previous_value() {
        let mut proj = Projection::default();
        assert!(proj.set_aspect_ratio(0.0).is_err());
        assert_eq!(proj.aspect_ratio(), 1.0);
        proj.set_aspect_ratio(2.0).unwrap();
        assert_eq!(proj.aspect_ratio(), 2.0);
    }
}
