//! A small retained-mode 3D scene graph over a pluggable graphics device.
//!
//! Scenes are trees of [`scene::Node`]s. Drawing a [`scene::SceneGraph`]
//! walks the tree depth-first; cameras, materials and transforms scope their
//! uniforms, shaders and render targets to their subtree, and mesh leaves
//! draw through the [`gl::Device`] trait. Two devices ship with the crate:
//! [`gl::HeadlessDevice`], which validates and records calls, and
//! [`render::SoftwareDevice`], which rasterizes on the CPU.
//!
//! # Quick Start
//!
//! ```ignore
//! use voxgl::prelude::*;
//!
//! let mut device = SoftwareDevice::new(640, 480);
//! let camera = Camera::new(Vec3::new(0.0, 2.0, 6.0), Vec3::ZERO, Vec3::Y, Projection::default())?.shared();
//! let program = ShaderProgram::basic(&mut device)?.shared();
//!
//! let mut material = MaterialNode::new(program, Vec::new());
//! material.append(Box::new(MeshNode::triangles(&mut device, &mesh::cube(1.0))?));
//! let mut camera_node = CameraNode::new(camera);
//! camera_node.append(Box::new(material));
//!
//! let mut graph = SceneGraph::new(640, 480);
//! graph.append(Box::new(camera_node));
//! let stats = graph.draw(&mut device)?;
//! ```

pub mod camera;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod gl;
pub mod input;
pub mod logging;
pub mod math;
pub mod mesh;
pub mod projection;
pub mod render;
pub mod scene;
pub mod shaders;
pub mod transform;
pub mod window;

pub use error::{Error, Result};

/// Prelude module for convenient imports.
pub mod prelude {
    // Camera
    pub use crate::camera::{Camera, CameraController, SharedCamera};
    pub use crate::projection::Projection;

    // Scene
    pub use crate::scene::{
        CameraNode, FrameStatistics, Group, MaterialNode, MeshNode, Node, PostprocessNode,
        RenderTargetNode, SceneGraph, SkyboxNode, TransformNode, UniformsNode,
    };
    pub use crate::transform::Transform;

    // Devices and resources
    pub use crate::gl::{
        Device, FrameBufferObject, HeadlessDevice, PrimitiveMode, ShaderProgram, Texture,
        UniformValue, VertexBuffer, Viewport,
    };
    pub use crate::mesh;
    pub use crate::render::SoftwareDevice;

    // Math
    pub use crate::math::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

    // Frame loop & input
    pub use crate::clock::{Clock, FrameTick};
    pub use crate::config::RenderConfig;
    pub use crate::input::{InputState, Key};
    pub use crate::window::{FrameLimiter, Window, WindowEvent};

    pub use crate::error::{Error, Result};
}
