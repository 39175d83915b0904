use log::debug;

use super::device::{BufferId, Device, PrimitiveMode};
use crate::error::DeviceError;

/// Vertex positions (three floats per vertex) uploaded to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBuffer {
    id: BufferId,
    vertex_count: usize,
}

impl VertexBuffer {
    pub const COMPONENTS: u32 = 3;

    pub fn new(device: &mut dyn Device, positions: &[f32]) -> Result<Self, DeviceError> {
        let id = device.create_buffer(positions)?;
        let vertex_count = positions.len() / Self::COMPONENTS as usize;
        debug!("vertex buffer {} with {vertex_count} vertices", id.0);
        Ok(Self { id, vertex_count })
    }

    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn bind(&self, device: &mut dyn Device) {
        device.bind_buffer(Some(self.id));
    }

    pub fn unbind(&self, device: &mut dyn Device) {
        device.bind_buffer(None);
    }

    /// Draws every vertex. The buffer must be bound and sourced by an attribute.
    pub fn draw(&self, device: &mut dyn Device, mode: PrimitiveMode) -> Result<(), DeviceError> {
        device.draw_arrays(mode, 0, self.vertex_count)
    }

    pub fn destroy(self, device: &mut dyn Device) {
        device.delete_buffer(self.id);
    }
}
