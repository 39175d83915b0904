//! Render settings with environment overrides.

use crate::camera::CameraController;
use crate::error::{ConfigError, MathError};
use crate::projection::Projection;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: [f32; 4],
    pub target_fps: u32,
    pub fov_y_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    /// Camera movement speed, units per second.
    pub velocity: f32,
    pub pivot_speed: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: "voxgl".to_string(),
            width: 640,
            height: 480,
            clear_color: [0.8, 0.8, 0.8, 1.0],
            target_fps: 60,
            fov_y_degrees: 50.0,
            z_near: 0.1,
            z_far: 5000.0,
            velocity: 1.0,
            pivot_speed: 0.05,
        }
    }
}

impl RenderConfig {
    pub const WIDTH_VAR: &'static str = "VOXGL_WIDTH";
    pub const HEIGHT_VAR: &'static str = "VOXGL_HEIGHT";
    pub const FPS_VAR: &'static str = "VOXGL_FPS";

    /// Defaults overridden by `VOXGL_WIDTH`, `VOXGL_HEIGHT` and `VOXGL_FPS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up by variable name.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let positive = |key: &'static str| -> Result<Option<u32>, ConfigError> {
            let Some(value) = lookup(key) else {
                return Ok(None);
            };
            match value.trim().parse::<u32>() {
                Ok(n) if n > 0 => Ok(Some(n)),
                _ => Err(ConfigError::InvalidNumber { key, value }),
            }
        };
        if let Some(width) = positive(Self::WIDTH_VAR)? {
            self.width = width;
        }
        if let Some(height) = positive(Self::HEIGHT_VAR)? {
            self.height = height;
        }
        if let Some(fps) = positive(Self::FPS_VAR)? {
            self.target_fps = fps;
        }
        Ok(self)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn projection(&self) -> Result<Projection, MathError> {
        Projection::new(self.fov_y_degrees, self.aspect_ratio(), self.z_near, self.z_far)
    }

    pub fn controller(&self) -> CameraController {
        CameraController::new(self.velocity, self.pivot_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn overrides_replace_defaults() {
        let config = RenderConfig::default()
            .with_overrides(lookup(&[("VOXGL_WIDTH", "1024"), ("VOXGL_FPS", " 30 ")]))
            .unwrap();
        assert_eq!(config.width, 1024);
        assert_eq!(config.height, 480);
        assert_eq!(config.target_fps, 30);
    }

    #[test]
    fn rejects_non_positive_numbers() {
        let err = RenderConfig::default()
            .with_overrides(lookup(&[("VOXGL_HEIGHT", "0")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                key: "VOXGL_HEIGHT",
                value: "0".into()
            }
        );
        assert!(RenderConfig::default()
            .with_overrides(lookup(&[("VOXGL_WIDTH", "wide")]))
            .is_err());
    }

    #[test]
    fn default_projection_is_valid() {
        let projection = RenderConfig::default().projection().unwrap();
        assert_eq!(projection.fov_y_degrees(), 50.0);
        assert_eq!(projection.z_far(), 5000.0);
    }
}
