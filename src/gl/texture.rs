use std::path::Path;

use log::debug;

use super::device::{Device, TextureId};
use crate::error::DeviceError;

/// Handle to an RGBA8 texture living on a [`Device`].
///
/// The handle is `Copy`; the device owns the pixels. Call
/// [`destroy`](Texture::destroy) to release them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture {
    id: TextureId,
    width: u32,
    height: u32,
}

impl Texture {
    /// Wraps an id the device already handed out.
    pub fn from_raw_parts(id: TextureId, width: u32, height: u32) -> Self {
        Self { id, width, height }
    }

    /// Allocates an uninitialised texture, e.g. a render-target colour attachment.
    pub fn empty(device: &mut dyn Device, width: u32, height: u32) -> Result<Self, DeviceError> {
        let id = device.create_texture(width, height, None)?;
        debug!("created {width}x{height} texture {}", id.0);
        Ok(Self::from_raw_parts(id, width, height))
    }

    /// Uploads tightly packed RGBA8 pixels, row by row from the top.
    pub fn from_rgba(
        device: &mut dyn Device,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<Self, DeviceError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(DeviceError::TextureLoad(format!(
                "expected {expected} bytes for {width}x{height} RGBA, got {}",
                pixels.len()
            )));
        }
        let id = device.create_texture(width, height, Some(pixels))?;
        debug!("uploaded {width}x{height} texture {}", id.0);
        Ok(Self::from_raw_parts(id, width, height))
    }

    /// Decodes an image file (PNG, JPG, ...) and uploads it.
    pub fn from_file<P: AsRef<Path>>(device: &mut dyn Device, path: P) -> Result<Self, DeviceError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| DeviceError::TextureLoad(format!("{}: {e}", path.display())))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        Self::from_rgba(device, width, height, &img.into_raw())
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bind(&self, device: &mut dyn Device, unit: u32) {
        device.bind_texture(unit, Some(self.id));
    }

    pub fn unbind(device: &mut dyn Device, unit: u32) {
        device.bind_texture(unit, None);
    }

    pub fn destroy(self, device: &mut dyn Device) {
        device.delete_texture(self.id);
    }
}
