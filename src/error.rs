//! Error types.
//!
//! Each layer has its own error enum; [`Error`] wraps all of them for callers
//! (like the demo binary) that just want to bubble everything up with `?`.

use thiserror::Error;

use crate::gl::ShaderStage;

/// Degenerate input to a math routine.
///
/// These replace the silent NaN/Infinity results a naive implementation
/// would produce.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MathError {
    #[error("cannot normalize a zero-length vector")]
    ZeroLengthVector,
    #[error("eye and target coincide")]
    CoincidentPoints,
    #[error("up vector is parallel to the view direction")]
    ParallelUp,
    #[error("degenerate depth range (near = {near}, far = {far})")]
    DegenerateDepthRange { near: f32, far: f32 },
    #[error("invalid aspect ratio {0}")]
    InvalidAspect(f32),
    #[error("invalid vertical field of view {0} rad")]
    InvalidFieldOfView(f32),
    #[error("homogeneous w is zero, cannot divide")]
    ZeroHomogeneousW,
}

/// Failure reported by a [`Device`](crate::gl::Device).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    #[error("{stage} shader compilation failed: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },
    #[error("program linking failed: {log}")]
    ProgramLink { log: String },
    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u32 },
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("framebuffer incomplete: {0}")]
    IncompleteFramebuffer(String),
    #[error("failed to load texture: {0}")]
    TextureLoad(String),
}

/// Failure while traversing the scene graph.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error("no shader is active for this draw")]
    NoActiveShader,
    #[error("undefined attribute {0}")]
    MissingAttribute(String),
    #[error("uniform {0} is not in scope")]
    MissingUniform(String),
    #[error("all {0} texture units are in use")]
    TextureUnitsExhausted(u32),
    #[error("traversal left {0} entries on the context stacks")]
    UnbalancedTraversal(usize),
    #[error(transparent)]
    Math(#[from] MathError),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Invalid input to a mesh routine.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("vertex data length {len} is not a multiple of {expected}")]
    InvalidLength { len: usize, expected: usize },
    #[error("failed to load OBJ file: {0}")]
    Obj(#[from] tobj::LoadError),
}

/// Invalid configuration override.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Math(#[from] MathError),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("window: {0}")]
    Window(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
