//! Retained-mode scene graph.
//!
//! A frame is one depth-first traversal of a tree of [`Node`]s. Each node
//! pushes state onto the [`TraversalContext`] when entered and pops it when
//! exited, so a node's uniforms, shader, textures and render target are
//! visible exactly to its subtree.

mod camera;
mod context;
mod effects;
mod env;
mod graph;
mod mesh;
mod node;
mod target;
mod transform;
mod uniforms;

pub use camera::CameraNode;
pub use context::{ContextMark, FrameStatistics, ScopeGuard, TraversalContext};
pub use effects::{PostprocessNode, SkyboxNode};
pub use env::UniformEnv;
pub use graph::SceneGraph;
pub use mesh::MeshNode;
pub use node::{Group, Node};
pub use target::RenderTargetNode;
pub use transform::{LocalTransform, TransformNode};
pub use uniforms::{MaterialNode, Uniforms, UniformsNode};
