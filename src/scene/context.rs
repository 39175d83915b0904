//! Per-frame traversal state.
//!
//! Every piece of state a node may change while it is entered lives on a stack
//! in [`TraversalContext`]: uniform scopes, the active shader, texture units,
//! viewports and render targets. Pushes update the device immediately and
//! pops restore what the device had before, so siblings never see each
//! other's state.

use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use log::trace;

use super::env::UniformEnv;
use crate::error::{DeviceError, SceneError};
use crate::gl::{
    ClearMask, Device, FrameBufferObject, FramebufferId, ShaderProgram, SharedProgram, Texture,
    UniformValue, Viewport,
};

/// Counters collected during one [`SceneGraph::draw`](super::SceneGraph::draw).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStatistics {
    pub draw_calls: usize,
    pub vertices: usize,
    pub uniform_scopes: usize,
    pub shader_activations: usize,
    pub uniform_writes: usize,
}

/// Stack depths at a point in the traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextMark {
    uniforms: usize,
    shaders: usize,
    textures: usize,
    viewports: usize,
    targets: usize,
}

impl ContextMark {
    fn entries(&self) -> usize {
        self.uniforms + self.shaders + self.textures + self.viewports.saturating_sub(1) + self.targets
    }
}

pub struct TraversalContext<'d> {
    device: &'d mut dyn Device,
    env: UniformEnv,
    shaders: Vec<SharedProgram>,
    textures: Vec<u32>,
    viewports: Vec<Viewport>,
    targets: Vec<FramebufferId>,
    stats: FrameStatistics,
}

impl<'d> TraversalContext<'d> {
    /// Starts a traversal rendering to the default target through `viewport`.
    pub fn new(device: &'d mut dyn Device, viewport: Viewport) -> Self {
        Self {
            device,
            env: UniformEnv::new(),
            shaders: Vec::new(),
            textures: Vec::new(),
            viewports: vec![viewport],
            targets: Vec::new(),
            stats: FrameStatistics::default(),
        }
    }

    pub fn device(&mut self) -> &mut (dyn Device + 'd) {
        &mut *self.device
    }

    pub fn env(&self) -> &UniformEnv {
        &self.env
    }

    pub fn statistics(&self) -> FrameStatistics {
        self.stats
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.env.get(name)
    }

    /// Binds a uniform in the innermost scope.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) {
        self.env.set(name, value);
    }

    pub fn push_uniforms(&mut self) {
        self.env.push_scope();
        self.stats.uniform_scopes += 1;
    }

    pub fn pop_uniforms(&mut self) {
        self.env.pop_scope();
    }

    /// Makes `program` the active shader until the matching [`pop_shader`](Self::pop_shader).
    pub fn push_shader(&mut self, program: SharedProgram) {
        program.borrow().activate(self.device);
        self.shaders.push(program);
        self.stats.shader_activations += 1;
    }

    /// Reactivates the previous shader, or none.
    pub fn pop_shader(&mut self) {
        self.shaders.pop();
        let previous = self.shaders.last().map(|p| p.borrow().id());
        self.device.use_program(previous);
    }

    pub fn current_shader(&self) -> Option<SharedProgram> {
        self.shaders.last().map(Rc::clone)
    }

    /// Binds `texture` to the next free unit and returns that unit.
    pub fn push_texture(&mut self, texture: Texture) -> Result<u32, SceneError> {
        let unit = self.textures.len() as u32;
        let available = self.device.max_texture_units();
        if unit >= available {
            return Err(SceneError::TextureUnitsExhausted(available));
        }
        texture.bind(self.device, unit);
        self.textures.push(unit);
        Ok(unit)
    }

    pub fn pop_texture(&mut self) {
        if let Some(unit) = self.textures.pop() {
            Texture::unbind(self.device, unit);
        }
    }

    pub fn texture_units_in_use(&self) -> usize {
        self.textures.len()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewports
            .last()
            .copied()
            .unwrap_or(Viewport::sized(0, 0))
    }

    pub fn push_viewport(&mut self, viewport: Viewport) {
        self.device.viewport(viewport);
        self.viewports.push(viewport);
    }

    /// Restores the enclosing viewport. The base viewport is never popped.
    pub fn pop_viewport(&mut self) {
        if self.viewports.len() > 1 {
            self.viewports.pop();
            let viewport = self.viewport();
            self.device.viewport(viewport);
        }
    }

    /// Redirects rendering into `fbo`, with its full size as viewport, and clears it.
    pub fn push_render_target(&mut self, fbo: &FrameBufferObject) {
        fbo.bind(self.device);
        self.targets.push(fbo.id());
        self.push_viewport(fbo.viewport());
        self.device.clear(ClearMask::ALL);
    }

    /// Rebinds the enclosing target and viewport.
    pub fn pop_render_target(&mut self) {
        if self.targets.pop().is_some() {
            self.device.bind_framebuffer(self.targets.last().copied());
            self.pop_viewport();
        }
    }

    /// Uploads the visible uniforms to `program`, skipping unchanged values.
    pub fn upload_uniforms(&mut self, program: &mut ShaderProgram) -> Result<usize, DeviceError> {
        let writes = program.uniforms(self.device, self.env.resolved())?;
        self.stats.uniform_writes += writes;
        Ok(writes)
    }

    pub fn record_draw(&mut self, vertices: usize) {
        self.stats.draw_calls += 1;
        self.stats.vertices += vertices;
    }

    pub fn mark(&self) -> ContextMark {
        ContextMark {
            uniforms: self.env.depth(),
            shaders: self.shaders.len(),
            textures: self.textures.len(),
            viewports: self.viewports.len(),
            targets: self.targets.len(),
        }
    }

    /// Entries pushed and not yet popped since the context was created.
    pub fn open_entries(&self) -> usize {
        self.mark().entries()
    }

    /// Pops every stack back to `mark`, restoring device state on the way.
    pub fn unwind_to(&mut self, mark: ContextMark) {
        if self.mark() == mark {
            return;
        }
        trace!("unwinding traversal context to {mark:?}");
        while self.textures.len() > mark.textures {
            self.pop_texture();
        }
        while self.targets.len() > mark.targets {
            self.pop_render_target();
        }
        while self.viewports.len() > mark.viewports {
            self.pop_viewport();
        }
        if self.shaders.len() > mark.shaders {
            self.shaders.truncate(mark.shaders + 1);
            self.pop_shader();
        }
        self.env.truncate(mark.uniforms);
    }

    /// Opens a scope that unwinds everything pushed inside it when dropped,
    /// whether the scope ends normally, through `?`, or by panic.
    pub fn scope(&mut self) -> ScopeGuard<'_, 'd> {
        let mark = self.mark();
        ScopeGuard { ctx: self, mark }
    }
}

pub struct ScopeGuard<'c, 'd> {
    ctx: &'c mut TraversalContext<'d>,
    mark: ContextMark,
}

impl ScopeGuard<'_, '_> {
    /// Entries pushed inside this scope and still open, or popped past its
    /// start. Zero when the stacks are back where the scope began.
    pub fn unbalanced(&self) -> usize {
        let now = self.ctx.mark();
        if now == self.mark {
            return 0;
        }
        now.entries().abs_diff(self.mark.entries()).max(1)
    }
}

impl<'d> Deref for ScopeGuard<'_, 'd> {
    type Target = TraversalContext<'d>;

    fn deref(&self) -> &Self::Target {
        &*self.ctx
    }
}

impl<'d> DerefMut for ScopeGuard<'_, 'd> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.ctx
    }
}

impl Drop for ScopeGuard<'_, '_> {
    fn drop(&mut self) {
        self.ctx.unwind_to(self.mark);
    }
}
