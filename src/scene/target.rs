//! Offscreen rendering into a framebuffer whose colour texture can be
//! sampled later in the frame.

use super::context::TraversalContext;
use super::node::{impl_children, Node};
use crate::error::SceneError;
use crate::gl::{Device, FrameBufferObject, Texture};

/// Renders its subtree into an offscreen framebuffer.
pub struct RenderTargetNode {
    fbo: FrameBufferObject,
    children: Vec<Box<dyn Node>>,
}

impl RenderTargetNode {
    pub fn new(fbo: FrameBufferObject) -> Self {
        Self {
            fbo,
            children: Vec::new(),
        }
    }

    /// Creates a `width` x `height` framebuffer to render into.
    pub fn with_size(device: &mut dyn Device, width: u32, height: u32) -> Result<Self, SceneError> {
        Ok(Self::new(FrameBufferObject::new(device, width, height)?))
    }

    pub fn framebuffer(&self) -> &FrameBufferObject {
        &self.fbo
    }

    /// The texture the subtree is rendered into, for sampling elsewhere.
    pub fn color_texture(&self) -> Texture {
        self.fbo.color_texture()
    }
}

impl Node for RenderTargetNode {
    fn enter(&mut self, ctx: &mut TraversalContext<'_>) -> Result<(), SceneError> {
        ctx.push_render_target(&self.fbo);
        Ok(())
    }

    fn exit(&mut self, ctx: &mut TraversalContext<'_>) {
        ctx.pop_render_target();
    }

    impl_children!();
}
