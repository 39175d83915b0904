//! CPU rendering backend.
//!
//! [`SoftwareDevice`] implements [`Device`](crate::gl::Device) by rasterizing
//! into a [`RenderTarget`] with the edge function and Bresenham algorithms.

mod rasterizer;
mod software;
mod target;

pub use rasterizer::{draw_line, fill_triangle, ClipRect};
pub use software::SoftwareDevice;
pub use target::{pack_argb, RenderTarget};
