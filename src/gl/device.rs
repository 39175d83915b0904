//! The graphics device abstraction.
//!
//! Every render-resource wrapper and every scene node talks to the GPU (or its
//! stand-in) through [`Device`]. Handles are opaque newtype ids handed out by
//! the device.

use std::fmt;

use super::uniform::UniformData;
use crate::error::DeviceError;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);
    };
}

handle!(ShaderId);
handle!(ProgramId);
handle!(BufferId);
handle!(TextureId);
handle!(FramebufferId);
handle!(
    /// Attribute slot of a linked program.
    AttribLocation
);
handle!(
    /// Uniform slot of a linked program. Unique per device, not per program.
    UniformLocation
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveMode {
    Triangles,
    Lines,
}

impl PrimitiveMode {
    /// Vertices consumed per primitive.
    pub fn vertices_per_primitive(self) -> usize {
        match self {
            PrimitiveMode::Triangles => 3,
            PrimitiveMode::Lines => 2,
        }
    }
}

/// Pixel rectangle of the current render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn sized(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Width / height, or 1.0 for an empty viewport.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 * 0.5,
            self.y as f32 + self.height as f32 * 0.5,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearMask {
    pub color: bool,
    pub depth: bool,
}

impl ClearMask {
    pub const COLOR: ClearMask = ClearMask {
        color: true,
        depth: false,
    };
    pub const DEPTH: ClearMask = ClearMask {
        color: false,
        depth: true,
    };
    pub const ALL: ClearMask = ClearMask {
        color: true,
        depth: true,
    };
}

/// Commands understood by a graphics backend.
///
/// Binding calls take `Option`: `None` restores the default binding (no
/// program, no buffer, the default framebuffer).
pub trait Device {
    /// Compiles one stage. On failure the error carries the compiler log.
    fn create_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, DeviceError>;
    fn delete_shader(&mut self, shader: ShaderId);

    /// Links two compiled stages. On failure the error carries the linker log.
    fn create_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, DeviceError>;
    fn delete_program(&mut self, program: ProgramId);
    fn use_program(&mut self, program: Option<ProgramId>);

    fn attrib_location(&mut self, program: ProgramId, name: &str) -> Option<AttribLocation>;
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    /// Writes a uniform of the currently used program.
    fn set_uniform(&mut self, location: UniformLocation, value: &UniformData) -> Result<(), DeviceError>;

    fn create_buffer(&mut self, data: &[f32]) -> Result<BufferId, DeviceError>;
    fn bind_buffer(&mut self, buffer: Option<BufferId>);
    fn delete_buffer(&mut self, buffer: BufferId);
    /// Sources `location` from the bound buffer with `components` floats per vertex.
    fn vertex_attrib_pointer(&mut self, location: AttribLocation, components: u32) -> Result<(), DeviceError>;
    fn draw_arrays(&mut self, mode: PrimitiveMode, first: usize, count: usize) -> Result<(), DeviceError>;

    /// Creates an RGBA8 texture, optionally initialised from `pixels`.
    fn create_texture(&mut self, width: u32, height: u32, pixels: Option<&[u8]>) -> Result<TextureId, DeviceError>;
    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>);
    fn delete_texture(&mut self, texture: TextureId);

    /// Creates a framebuffer rendering into `color` with its own depth attachment.
    fn create_framebuffer(&mut self, color: TextureId, width: u32, height: u32) -> Result<FramebufferId, DeviceError>;
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);
    fn delete_framebuffer(&mut self, framebuffer: FramebufferId);

    fn viewport(&mut self, viewport: Viewport);
    fn clear_color(&mut self, rgba: [f32; 4]);
    fn clear(&mut self, mask: ClearMask);

    fn max_texture_units(&self) -> u32 {
        8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_aspect_and_center() {
        let v = Viewport::sized(640, 480);
        assert!((v.aspect() - 4.0 / 3.0).abs() < 1e-6);
        assert_eq!(v.center(), (320.0, 240.0));
        assert_eq!(Viewport::sized(10, 0).aspect(), 1.0);
    }
}
