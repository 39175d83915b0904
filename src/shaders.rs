//! Built-in shader sources.
//!
//! The software device implements exactly this pair: position transformed by
//! `u_worldViewProjection * u_modelTransform`, flat `u_color` fill.

/// Standard attribute and uniform names shared by nodes and shaders.
pub mod names {
    pub const POSITION: &str = "a_position";
    pub const MODEL_TRANSFORM: &str = "u_modelTransform";
    pub const WORLD_VIEW_PROJECTION: &str = "u_worldViewProjection";
    pub const WORLD_VIEW: &str = "u_worldView";
    pub const PROJECTION: &str = "u_projection";
    pub const EYE: &str = "u_eye";
    pub const COLOR: &str = "u_color";
}

pub const BASIC_VERTEX: &str = r#"
attribute vec3 a_position;
uniform mat4 u_modelTransform;
uniform mat4 u_worldViewProjection;

void main() {
    vec4 worldPosition = u_modelTransform * vec4(a_position, 1.0);
    gl_Position = u_worldViewProjection * worldPosition;
}
"#;

pub const BASIC_FRAGMENT: &str = r#"
precision mediump float;
uniform vec4 u_color;

void main() {
    gl_FragColor = u_color;
}
"#;
