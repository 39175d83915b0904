//! Transform node: composes its local matrix with the inherited
//! `u_modelTransform` for its subtree.

use super::context::TraversalContext;
use super::node::{impl_children, Node};
use crate::error::SceneError;
use crate::math::Mat4;
use crate::shaders::names;
use crate::transform::Transform;

/// Local transform of a [`TransformNode`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocalTransform {
    Matrix(Mat4),
    Transform(Transform),
}

impl LocalTransform {
    pub fn matrix(&self) -> Mat4 {
        match self {
            LocalTransform::Matrix(m) => *m,
            LocalTransform::Transform(t) => t.to_matrix(),
        }
    }
}

/// Composes its local transform onto the inherited `u_modelTransform`.
pub struct TransformNode {
    local: LocalTransform,
    children: Vec<Box<dyn Node>>,
}

impl TransformNode {
    pub fn new(transform: Transform) -> Self {
        Self {
            local: LocalTransform::Transform(transform),
            children: Vec::new(),
        }
    }

    pub fn from_matrix(matrix: Mat4) -> Self {
        Self {
            local: LocalTransform::Matrix(matrix),
            children: Vec::new(),
        }
    }

    pub fn local(&self) -> &LocalTransform {
        &self.local
    }

    /// The `Transform`, or `None` when the node holds a raw matrix.
    pub fn transform_mut(&mut self) -> Option<&mut Transform> {
        match &mut self.local {
            LocalTransform::Transform(t) => Some(t),
            LocalTransform::Matrix(_) => None,
        }
    }

    pub fn set_matrix(&mut self, matrix: Mat4) {
        self.local = LocalTransform::Matrix(matrix);
    }
}

impl Node for TransformNode {
    fn enter(&mut self, ctx: &mut TraversalContext<'_>) -> Result<(), SceneError> {
        let local = self.local.matrix();
        let model = match ctx.uniform(names::MODEL_TRANSFORM).and_then(|v| v.as_mat4()) {
            Some(inherited) => inherited * local,
            None => local,
        };
        ctx.push_uniforms();
        ctx.set_uniform(names::MODEL_TRANSFORM, model);
        Ok(())
    }

    fn exit(&mut self, ctx: &mut TraversalContext<'_>) {
        ctx.pop_uniforms();
    }

    impl_children!();
}
