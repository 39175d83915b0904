//! The scene root and the per-frame draw entry point.

use log::trace;

use super::context::{FrameStatistics, TraversalContext};
use super::node::{Group, Node};
use crate::error::SceneError;
use crate::gl::{ClearMask, Device, Viewport};

/// The root of a scene plus the frame-level state drawn around it.
pub struct SceneGraph {
    root: Group,
    viewport: Viewport,
    clear_color: [f32; 4],
}

impl SceneGraph {
    pub const DEFAULT_CLEAR_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            root: Group::new(),
            viewport: Viewport::sized(width, height),
            clear_color: Self::DEFAULT_CLEAR_COLOR,
        }
    }

    pub fn with_clear_color(mut self, rgba: [f32; 4]) -> Self {
        self.clear_color = rgba;
        self
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::sized(width, height);
    }

    pub fn set_clear_color(&mut self, rgba: [f32; 4]) {
        self.clear_color = rgba;
    }

    pub fn root_mut(&mut self) -> &mut Group {
        &mut self.root
    }

    pub fn append(&mut self, node: Box<dyn Node>) {
        self.root.append(node);
    }

    /// Clears the default target and draws the whole graph.
    ///
    /// Returns the frame's statistics. Fails with the first node error, or
    /// with [`SceneError::UnbalancedTraversal`] if a node left state pushed.
    /// The device is restored to the frame's base state in both cases.
    pub fn draw(&mut self, device: &mut dyn Device) -> Result<FrameStatistics, SceneError> {
        device.bind_framebuffer(None);
        device.viewport(self.viewport);
        device.clear_color(self.clear_color);
        device.clear(ClearMask::ALL);

        let mut ctx = TraversalContext::new(device, self.viewport);
        self.root.visit(&mut ctx)?;
        let stats = ctx.statistics();
        trace!("frame: {stats:?}");
        Ok(stats)
    }
}
