use log::debug;

use super::device::{Device, FramebufferId, Viewport};
use super::texture::Texture;
use crate::error::DeviceError;

/// Off-screen render target: a colour texture plus a depth attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBufferObject {
    id: FramebufferId,
    color: Texture,
}

impl FrameBufferObject {
    pub fn new(device: &mut dyn Device, width: u32, height: u32) -> Result<Self, DeviceError> {
        let color = Texture::empty(device, width, height)?;
        let id = match device.create_framebuffer(color.id(), width, height) {
            Ok(id) => id,
            Err(e) => {
                color.destroy(device);
                return Err(e);
            }
        };
        debug!("framebuffer {} ({width}x{height})", id.0);
        Ok(Self { id, color })
    }

    pub fn id(&self) -> FramebufferId {
        self.id
    }

    /// The texture the target renders into, usable as a sampler afterwards.
    pub fn color_texture(&self) -> Texture {
        self.color
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::sized(self.color.width(), self.color.height())
    }

    pub fn bind(&self, device: &mut dyn Device) {
        device.bind_framebuffer(Some(self.id));
    }

    /// Rebinds the default target.
    pub fn unbind(&self, device: &mut dyn Device) {
        device.bind_framebuffer(None);
    }

    pub fn destroy(self, device: &mut dyn Device) {
        device.delete_framebuffer(self.id);
        self.color.destroy(device);
    }
}
