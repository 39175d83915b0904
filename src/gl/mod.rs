//! Render resources over an abstract graphics device.

pub mod buffer;
pub mod device;
pub mod framebuffer;
pub mod glsl;
pub mod headless;
pub mod shader;
pub mod texture;
pub mod uniform;

pub use buffer::VertexBuffer;
pub use device::{
    AttribLocation, BufferId, ClearMask, Device, FramebufferId, PrimitiveMode, ProgramId,
    ShaderId, ShaderStage, TextureId, UniformLocation, Viewport,
};
pub use framebuffer::FrameBufferObject;
pub use headless::{Command, HeadlessDevice};
pub use shader::{ShaderProgram, SharedProgram};
pub use texture::Texture;
pub use uniform::{UniformData, UniformValue};
