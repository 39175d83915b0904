//! Small linear-algebra library.
//!
//! Everything is `f32` and `Copy`. Matrices use the column-vector convention:
//! `A * B * v` applies `B` first, then `A`.

pub mod mat3;
pub mod mat4;
pub mod quat;
pub mod vec2;
pub mod vec3;
pub mod vec4;

pub use mat3::Mat3;
pub use mat4::Mat4;
pub use quat::Quat;
pub use vec2::Vec2;
pub use vec3::Vec3;
pub use vec4::Vec4;
