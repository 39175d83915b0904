//! Leaf node that issues a draw call for a vertex buffer.

use log::trace;

use super::context::TraversalContext;
use super::node::{impl_children, Node};
use crate::error::SceneError;
use crate::gl::{Device, PrimitiveMode, VertexBuffer};
use crate::shaders::names;

/// Draws a vertex buffer with the active shader and the visible uniforms.
pub struct MeshNode {
    buffer: VertexBuffer,
    mode: PrimitiveMode,
    children: Vec<Box<dyn Node>>,
}

impl MeshNode {
    pub fn new(buffer: VertexBuffer, mode: PrimitiveMode) -> Self {
        Self {
            buffer,
            mode,
            children: Vec::new(),
        }
    }

    /// Uploads `positions` and wraps them in a triangle mesh.
    pub fn triangles(device: &mut dyn Device, positions: &[f32]) -> Result<Self, SceneError> {
        Ok(Self::new(VertexBuffer::new(device, positions)?, PrimitiveMode::Triangles))
    }

    /// Uploads `positions` and wraps them in a line list.
    pub fn lines(device: &mut dyn Device, positions: &[f32]) -> Result<Self, SceneError> {
        Ok(Self::new(VertexBuffer::new(device, positions)?, PrimitiveMode::Lines))
    }

    pub fn buffer(&self) -> VertexBuffer {
        self.buffer
    }

    pub fn mode(&self) -> PrimitiveMode {
        self.mode
    }

    fn draw(&self, ctx: &mut TraversalContext<'_>) -> Result<(), SceneError> {
        let program = ctx.current_shader().ok_or(SceneError::NoActiveShader)?;
        let mut program = program.borrow_mut();
        let position = program.attrib_location(ctx.device(), names::POSITION)?;

        self.buffer.bind(ctx.device());
        let drawn = ctx
            .device()
            .vertex_attrib_pointer(position, VertexBuffer::COMPONENTS)
            .and_then(|()| ctx.upload_uniforms(&mut program).map(|_| ()))
            .and_then(|()| self.buffer.draw(ctx.device(), self.mode));
        self.buffer.unbind(ctx.device());
        drawn?;

        trace!("drew {} vertices as {:?}", self.buffer.vertex_count(), self.mode);
        ctx.record_draw(self.buffer.vertex_count());
        Ok(())
    }
}

impl Node for MeshNode {
    fn enter(&mut self, ctx: &mut TraversalContext<'_>) -> Result<(), SceneError> {
        self.draw(ctx)
    }

    impl_children!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::{Command, HeadlessDevice, ShaderProgram, Viewport};
    use crate::mesh;

    #[test]
    fn needs_an_active_shader() {
        let mut device = HeadlessDevice::new();
        let mut node = MeshNode::triangles(&mut device, &mesh::cube(1.0)).unwrap();
        let mut ctx = TraversalContext::new(&mut device, Viewport::sized(1, 1));
        assert_eq!(node.visit(&mut ctx), Err(SceneError::NoActiveShader));
        assert_eq!(ctx.statistics().draw_calls, 0);
    }

    #[test]
    fn needs_a_position_attribute() {
        let mut device = HeadlessDevice::new();
        let program = ShaderProgram::new(
            &mut device,
            "attribute vec3 a_other;\nvoid main() { gl_Position = vec4(a_other, 1.0); }",
            "void main() { gl_FragColor = vec4(1.0); }",
        )
        .unwrap()
        .shared();
        let mut node = MeshNode::triangles(&mut device, &mesh::cube(1.0)).unwrap();
        let mut ctx = TraversalContext::new(&mut device, Viewport::sized(1, 1));
        ctx.push_shader(program);
        assert_eq!(
            node.visit(&mut ctx),
            Err(SceneError::MissingAttribute(names::POSITION.into()))
        );
    }

    #[test]
    fn draws_and_unbinds() {
        let mut device = HeadlessDevice::new();
        let program = ShaderProgram::basic(&mut device).unwrap().shared();
        let mut node = MeshNode::lines(&mut device, &mesh::grid(1.0, 2)).unwrap();
        let vertices = node.buffer().vertex_count();

        let mut ctx = TraversalContext::new(&mut device, Viewport::sized(1, 1));
        ctx.push_shader(program);
        node.visit(&mut ctx).unwrap();
        assert_eq!(ctx.statistics().draw_calls, 1);
        assert_eq!(ctx.statistics().vertices, vertices);
        drop(ctx);

        assert_eq!(device.drawn_vertices(), vertices);
        assert!(matches!(
            device.commands().last(),
            Some(Command::BindBuffer(None))
        ));
    }
}
