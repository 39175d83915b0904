//! Nodes that scope uniform values and shader programs.

use std::rc::Rc;

use super::context::TraversalContext;
use super::node::{impl_children, Node};
use crate::error::SceneError;
use crate::gl::{SharedProgram, UniformValue};

/// A named set of uniform values.
pub type Uniforms = Vec<(String, UniformValue)>;

/// Pushes a uniform scope holding `values`. Texture values are bound to the
/// next free texture units first and appear in the scope as `Int(unit)`.
///
/// Returns the number of texture units taken.
fn push_uniforms(ctx: &mut TraversalContext<'_>, values: &Uniforms) -> Result<usize, SceneError> {
    let mut resolved = Vec::with_capacity(values.len());
    let mut textures = 0;
    for (name, value) in values {
        let value = match *value {
            UniformValue::Texture(texture) => match ctx.push_texture(texture) {
                Ok(unit) => {
                    textures += 1;
                    UniformValue::Int(unit as i32)
                }
                Err(err) => {
                    for _ in 0..textures {
                        ctx.pop_texture();
                    }
                    return Err(err);
                }
            },
            other => other,
        };
        resolved.push((name.as_str(), value));
    }
    ctx.push_uniforms();
    for (name, value) in resolved {
        ctx.set_uniform(name, value);
    }
    Ok(textures)
}

fn pop_uniforms(ctx: &mut TraversalContext<'_>, textures: usize) {
    ctx.pop_uniforms();
    for _ in 0..textures {
        ctx.pop_texture();
    }
}

/// Scopes a set of uniform values over its subtree.
#[derive(Default)]
pub struct UniformsNode {
    uniforms: Uniforms,
    bound_textures: usize,
    children: Vec<Box<dyn Node>>,
}

impl UniformsNode {
    pub fn new(uniforms: Uniforms) -> Self {
        Self {
            uniforms,
            ..Self::default()
        }
    }

    pub fn uniforms(&self) -> &Uniforms {
        &self.uniforms
    }

    /// Replaces or adds one value; takes effect on the next traversal.
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) {
        set_value(&mut self.uniforms, name, value.into());
    }
}

fn set_value(uniforms: &mut Uniforms, name: &str, value: UniformValue) {
    match uniforms.iter_mut().find(|(n, _)| n == name) {
        Some((_, slot)) => *slot = value,
        None => uniforms.push((name.to_owned(), value)),
    }
}

impl Node for UniformsNode {
    fn enter(&mut self, ctx: &mut TraversalContext<'_>) -> Result<(), SceneError> {
        self.bound_textures = push_uniforms(ctx, &self.uniforms)?;
        Ok(())
    }

    fn exit(&mut self, ctx: &mut TraversalContext<'_>) {
        pop_uniforms(ctx, self.bound_textures);
        self.bound_textures = 0;
    }

    impl_children!();
}

/// A shader program plus the uniform values it is drawn with.
pub struct MaterialNode {
    program: SharedProgram,
    uniforms: Uniforms,
    bound_textures: usize,
    children: Vec<Box<dyn Node>>,
}

impl MaterialNode {
    pub fn new(program: SharedProgram, uniforms: Uniforms) -> Self {
        Self {
            program,
            uniforms,
            bound_textures: 0,
            children: Vec::new(),
        }
    }

    pub fn program(&self) -> &SharedProgram {
        &self.program
    }

    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) {
        set_value(&mut self.uniforms, name, value.into());
    }
}

impl Node for MaterialNode {
    fn enter(&mut self, ctx: &mut TraversalContext<'_>) -> Result<(), SceneError> {
        ctx.push_shader(Rc::clone(&self.program));
        self.bound_textures = push_uniforms(ctx, &self.uniforms)?;
        Ok(())
    }

    fn exit(&mut self, ctx: &mut TraversalContext<'_>) {
        pop_uniforms(ctx, self.bound_textures);
        self.bound_textures = 0;
        ctx.pop_shader();
    }

    impl_children!();
}
