//! Camera node: eye, view and projection uniforms for its subtree.

use log::trace;

use super::context::TraversalContext;
use super::node::{impl_children, Node};
use crate::camera::SharedCamera;
use crate::error::{MathError, SceneError};
use crate::gl::Viewport;
use crate::math::{Vec3, Vec4};
use crate::shaders::names;

/// Pushes the camera's eye, view and projection uniforms over its subtree.
///
/// The projection's aspect ratio follows the viewport active when the node is
/// entered, so render targets of any shape get an undistorted image.
pub struct CameraNode {
    camera: SharedCamera,
    children: Vec<Box<dyn Node>>,
}

impl CameraNode {
    pub fn new(camera: SharedCamera) -> Self {
        Self {
            camera,
            children: Vec::new(),
        }
    }

    pub fn camera(&self) -> &SharedCamera {
        &self.camera
    }

    /// World point to normalized device coordinates as seen through `viewport`.
    pub fn project(&self, point: Vec3, viewport: Viewport) -> Result<Vec3, MathError> {
        let camera = self.camera.borrow();
        let projection = camera.projection_matrix_for(viewport.aspect())?;
        let clip = projection * camera.view_matrix() * Vec4::from(point);
        clip.perspective_divide()
    }
}

impl Node for CameraNode {
    fn enter(&mut self, ctx: &mut TraversalContext<'_>) -> Result<(), SceneError> {
        let camera = self.camera.borrow();
        let projection = camera.projection_matrix_for(ctx.viewport().aspect())?;
        let view = camera.view_matrix();
        trace!("camera eye={:?} target={:?}", camera.eye(), camera.target());

        ctx.push_uniforms();
        ctx.set_uniform(names::EYE, camera.eye());
        ctx.set_uniform(names::WORLD_VIEW, view);
        ctx.set_uniform(names::PROJECTION, projection);
        ctx.set_uniform(names::WORLD_VIEW_PROJECTION, projection * view);
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
    use crate::gl::{HeadlessDevice, UniformValue};
    use crate::projection::Projection;
    use approx::assert_relative_eq;

    fn node() -> CameraNode {
        let camera = Camera::new(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
            Projection::default(),
        )
        .unwrap();
        CameraNode::new(camera.shared())
    }

    #[test]
    fn pushes_composed_matrices() {
        let mut node = node();
        let mut device = HeadlessDevice::new();
        let viewport = Viewport::sized(200, 100);
        let mut ctx = TraversalContext::new(&mut device, viewport);
        node.enter(&mut ctx).unwrap();

        let camera = node.camera().borrow();
        let projection = camera.projection_matrix_for(2.0).unwrap();
        assert_eq!(
            ctx.uniform(names::PROJECTION),
            Some(&UniformValue::Mat4(projection))
        );
        assert_eq!(
            ctx.uniform(names::WORLD_VIEW_PROJECTION),
            Some(&UniformValue::Mat4(projection * camera.view_matrix()))
        );
        assert_eq!(
            ctx.uniform(names::EYE),
            Some(&UniformValue::Vec3(Vec3::new(0.0, 0.0, 5.0)))
        );
        drop(camera);

        node.exit(&mut ctx);
        assert!(ctx.uniform(names::WORLD_VIEW).is_none());
    }

    #[test]
    fn target_projects_to_the_centre() {
        let node = node();
        let ndc = node.project(Vec3::ZERO, Viewport::sized(640, 480)).unwrap();
        assert_relative_eq!(ndc.x, 0.0);
        assert_relative_eq!(ndc.y, 0.0);
        assert!(ndc.z > -1.0 && ndc.z < 1.0);
    }

    #[test]
    fn point_in_the_eye_plane_cannot_be_projected() {
        let node = node();
        assert_eq!(
            node.project(Vec3::new(1.0, 0.0, 5.0), Viewport::sized(1, 1)),
            Err(MathError::ZeroHomogeneousW)
        );
    }
}
