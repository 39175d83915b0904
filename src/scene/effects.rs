//! Composite nodes built from a material and a generated mesh.

use super::context::TraversalContext;
use super::mesh::MeshNode;
use super::node::{impl_children, Node};
use super::uniforms::{MaterialNode, Uniforms};
use crate::error::SceneError;
use crate::gl::{Device, SharedProgram, UniformValue};
use crate::math::Mat4;
use crate::mesh;
use crate::shaders::names;

fn material_over(mesh: MeshNode, program: SharedProgram, uniforms: Uniforms) -> Box<dyn Node> {
    let mut material = MaterialNode::new(program, uniforms);
    material.append(Box::new(mesh));
    Box::new(material)
}

/// A cube drawn around the viewer, ignoring the camera's translation.
///
/// Must sit below a camera: it reads `u_worldView` and `u_projection` and
/// replaces `u_worldViewProjection` with one built from the rotation part of
/// the view only.
pub struct SkyboxNode {
    children: Vec<Box<dyn Node>>,
}

impl SkyboxNode {
    pub fn new(
        device: &mut dyn Device,
        scale: f32,
        program: SharedProgram,
        uniforms: Uniforms,
    ) -> Result<Self, SceneError> {
        let cube = MeshNode::triangles(device, &mesh::cube(scale))?;
        Ok(Self {
            children: vec![material_over(cube, program, uniforms)],
        })
    }

    fn matrix(ctx: &TraversalContext<'_>, name: &str) -> Result<Mat4, SceneError> {
        ctx.uniform(name)
            .and_then(UniformValue::as_mat4)
            .ok_or_else(|| SceneError::MissingUniform(name.to_owned()))
    }
}

impl Node for SkyboxNode {
    fn enter(&mut self, ctx: &mut TraversalContext<'_>) -> Result<(), SceneError> {
        let view = Self::matrix(ctx, names::WORLD_VIEW)?;
        let projection = Self::matrix(ctx, names::PROJECTION)?;
        let rotation_only = view.to_mat3().to_mat4();

        ctx.push_uniforms();
        ctx.set_uniform(names::WORLD_VIEW_PROJECTION, projection * rotation_only);
        ctx.set_uniform(names::MODEL_TRANSFORM, Mat4::IDENTITY);
        Ok(())
    }

    fn exit(&mut self, ctx: &mut TraversalContext<'_>) {
        ctx.pop_uniforms();
    }

    impl_children!();
}

/// Full-screen pass: a material drawn over a quad covering the viewport.
///
/// Typically samples the colour texture of a
/// [`RenderTargetNode`](super::RenderTargetNode) through a texture uniform.
pub struct PostprocessNode {
    children: Vec<Box<dyn Node>>,
}

impl PostprocessNode {
    pub fn new(device: &mut dyn Device, program: SharedProgram, uniforms: Uniforms) -> Result<Self, SceneError> {
        let quad = MeshNode::triangles(device, &mesh::screen_quad())?;
        Ok(Self {
            children: vec![material_over(quad, program, uniforms)],
        })
    }
}

impl Node for PostprocessNode {
    fn enter(&mut self, ctx: &mut TraversalContext<'_>) -> Result<(), SceneError> {
        ctx.push_uniforms();
        ctx.set_uniform(names::WORLD_VIEW_PROJECTION, Mat4::IDENTITY);
        ctx.set_uniform(names::MODEL_TRANSFORM, Mat4::IDENTITY);
        Ok(())
    }

    fn exit(&mut self, ctx: &mut TraversalContext<'_>) {
        ctx.pop_uniforms();
    }

    impl_children!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::gl::{HeadlessDevice, ShaderProgram, Texture, UniformData, Viewport};
    use crate::math::Vec3;
    use crate::projection::Projection;
    use crate::scene::CameraNode;

    #[test]
    fn skybox_requires_camera_uniforms() {
        let mut device = HeadlessDevice::new();
        let program = ShaderProgram::basic(&mut device).unwrap().shared();
        let mut skybox = SkyboxNode::new(&mut device, 10.0, program, Vec::new()).unwrap();
        let mut ctx = TraversalContext::new(&mut device, Viewport::sized(1, 1));
        assert_eq!(
            skybox.visit(&mut ctx),
            Err(SceneError::MissingUniform(names::WORLD_VIEW.into()))
        );
        assert_eq!(ctx.open_entries(), 0);
    }

    #[test]
    fn skybox_ignores_camera_translation() {
        let mut device = HeadlessDevice::new();
        let program = ShaderProgram::basic(&mut device).unwrap().shared();
        let program_id = program.borrow().id();
        let camera = Camera::new(
            Vec3::new(3.0, 4.0, 5.0),
            Vec3::new(3.0, 4.0, 0.0),
            Vec3::Y,
            Projection::default(),
        )
        .unwrap()
        .shared();
        let projection = camera.borrow().projection_matrix_for(1.0).unwrap();

        let mut root = CameraNode::new(camera);
        root.append(Box::new(
            SkyboxNode::new(&mut device, 10.0, program, Vec::new()).unwrap(),
        ));
        let mut ctx = TraversalContext::new(&mut device, Viewport::sized(8, 8));
        root.visit(&mut ctx).unwrap();
        assert_eq!(ctx.statistics().draw_calls, 1);
        assert_eq!(ctx.statistics().vertices, 36);
        drop(ctx);

        // The camera looks down -z unrotated, so only the projection remains
        assert_eq!(
            device.uniform_value(program_id, names::WORLD_VIEW_PROJECTION),
            Some(UniformData::Mat4(projection.to_cols_array()))
        );
    }

    #[test]
    fn postprocess_draws_a_screen_quad_with_its_source() {
        let mut device = HeadlessDevice::new();
        let program = ShaderProgram::new(
            &mut device,
            "attribute vec3 a_position;\nvarying vec2 v_uv;\nvoid main() {\n  v_uv = a_position.xy * 0.5 + 0.5;\n  gl_Position = vec4(a_position, 1.0);\n}",
            "uniform sampler2D u_source;\nvarying vec2 v_uv;\nvoid main() { gl_FragColor = texture2D(u_source, v_uv); }",
        )
        .unwrap()
        .shared();
        let program_id = program.borrow().id();
        let source = Texture::empty(&mut device, 4, 4).unwrap();
        let mut pass = PostprocessNode::new(
            &mut device,
            program,
            vec![("u_source".into(), source.into())],
        )
        .unwrap();

        let mut ctx = TraversalContext::new(&mut device, Viewport::sized(4, 4));
        pass.visit(&mut ctx).unwrap();
        assert_eq!(ctx.statistics().vertices, 6);
        drop(ctx);
        assert_eq!(
            device.uniform_value(program_id, "u_source"),
            Some(UniformData::Int(0))
        );
        assert_eq!(device.bound_texture(0), None);
    }
}
