//! Uniform values.
//!
//! [`UniformValue`] is what scene nodes carry and scope. [`UniformData`] is the
//! subset a device can upload: textures have already been resolved to sampler
//! unit indices by the time they reach the device.

use super::texture::Texture;
use crate::math::{Mat3, Mat4, Vec2, Vec3, Vec4};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
    Texture(Texture),
}

impl UniformValue {
    /// Device representation, or `None` for textures that still need a unit.
    pub fn to_data(&self) -> Option<UniformData> {
        Some(match *self {
            UniformValue::Float(v) => UniformData::Float(v),
            UniformValue::Int(v) => UniformData::Int(v),
            UniformValue::Vec2(v) => UniformData::Vec2(v.to_array()),
            UniformValue::Vec3(v) => UniformData::Vec3(v.to_array()),
            UniformValue::Vec4(v) => UniformData::Vec4(v.to_array()),
            UniformValue::Mat3(m) => UniformData::Mat3(m.to_cols_array()),
            UniformValue::Mat4(m) => UniformData::Mat4(m.to_cols_array()),
            UniformValue::Texture(_) => return None,
        })
    }

    pub fn as_mat4(&self) -> Option<Mat4> {
        match self {
            UniformValue::Mat4(m) => Some(*m),
            _ => None,
        }
    }

    /// GLSL type name, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            UniformValue::Float(_) => "float",
            UniformValue::Int(_) => "int",
            UniformValue::Vec2(_) => "vec2",
            UniformValue::Vec3(_) => "vec3",
            UniformValue::Vec4(_) => "vec4",
            UniformValue::Mat3(_) => "mat3",
            UniformValue::Mat4(_) => "mat4",
            UniformValue::Texture(_) => "sampler2D",
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<Mat3> for UniformValue {
    fn from(m: Mat3) -> Self {
        UniformValue::Mat3(m)
    }
}

impl From<Mat4> for UniformValue {
    fn from(m: Mat4) -> Self {
        UniformValue::Mat4(m)
    }
}

impl From<Texture> for UniformValue {
    fn from(t: Texture) -> Self {
        UniformValue::Texture(t)
    }
}

/// Raw uniform payload. Matrices are column-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformData {
    Float(f32),
    Int(i32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat3([f32; 9]),
    Mat4([f32; 16]),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrices_upload_column_major() {
        let value = UniformValue::from(Mat4::translation(1.0, 2.0, 3.0));
        match value.to_data() {
            Some(UniformData::Mat4(cols)) => assert_eq!(&cols[12..15], &[1.0, 2.0, 3.0]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn textures_have_no_direct_data() {
        let tex = Texture::from_raw_parts(crate::gl::TextureId(3), 4, 4);
        assert_eq!(UniformValue::from(tex).to_data(), None);
        assert_eq!(UniformValue::from(tex).type_name(), "sampler2D");
    }
}
