//! A device that renders nothing and remembers everything.
//!
//! [`HeadlessDevice`] validates calls the way a driver would (unknown handles,
//! uniform writes without a program, draws past the end of a buffer) and
//! records each accepted call as a [`Command`]. Tests and benchmarks inspect
//! the log instead of pixels.

use std::collections::HashMap;

use log::{debug, error};

use super::device::{
    AttribLocation, BufferId, ClearMask, Device, FramebufferId, PrimitiveMode, ProgramId,
    ShaderId, ShaderStage, TextureId, UniformLocation, Viewport,
};
use super::glsl::{self, ShaderInterface};
use super::uniform::UniformData;
use crate::error::DeviceError;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateShader(ShaderId, ShaderStage),
    DeleteShader(ShaderId),
    CreateProgram(ProgramId),
    DeleteProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    SetUniform {
        location: UniformLocation,
        name: String,
        value: UniformData,
    },
    CreateBuffer(BufferId, usize),
    BindBuffer(Option<BufferId>),
    DeleteBuffer(BufferId),
    VertexAttribPointer(AttribLocation, u32),
    DrawArrays {
        mode: PrimitiveMode,
        first: usize,
        count: usize,
    },
    CreateTexture(TextureId, u32, u32),
    BindTexture(u32, Option<TextureId>),
    DeleteTexture(TextureId),
    CreateFramebuffer(FramebufferId),
    BindFramebuffer(Option<FramebufferId>),
    DeleteFramebuffer(FramebufferId),
    Viewport(Viewport),
    ClearColor([f32; 4]),
    Clear(ClearMask),
}

#[derive(Debug)]
struct ProgramRecord {
    attributes: Vec<String>,
    uniforms: Vec<(String, UniformLocation)>,
    values: HashMap<UniformLocation, UniformData>,
}

#[derive(Debug)]
pub struct HeadlessDevice {
    next_id: u32,
    shaders: HashMap<ShaderId, ShaderInterface>,
    programs: HashMap<ProgramId, ProgramRecord>,
    buffers: HashMap<BufferId, usize>,
    textures: HashMap<TextureId, (u32, u32)>,
    framebuffers: HashMap<FramebufferId, TextureId>,

    current_program: Option<ProgramId>,
    bound_buffer: Option<BufferId>,
    bound_framebuffer: Option<FramebufferId>,
    texture_units: Vec<Option<TextureId>>,
    attrib_pointers: HashMap<AttribLocation, (BufferId, u32)>,
    viewport: Viewport,

    fail_next_compile: Option<String>,
    fail_next_link: Option<String>,

    commands: Vec<Command>,
    uniform_writes: usize,
    draw_calls: usize,
    vertices: usize,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    pub const TEXTURE_UNITS: u32 = 8;

    pub fn new() -> Self {
        Self {
            next_id: 1,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            framebuffers: HashMap::new(),
            current_program: None,
            bound_buffer: None,
            bound_framebuffer: None,
            texture_units: vec![None; Self::TEXTURE_UNITS as usize],
            attrib_pointers: HashMap::new(),
            viewport: Viewport::sized(0, 0),
            fail_next_compile: None,
            fail_next_link: None,
            commands: Vec::new(),
            uniform_writes: 0,
            draw_calls: 0,
            vertices: 0,
        }
    }

    /// Makes the next `create_shader` fail with `log`.
    pub fn fail_next_compile(&mut self, log: impl Into<String>) {
        self.fail_next_compile = Some(log.into());
    }

    /// Makes the next `create_program` fail with `log`.
    pub fn fail_next_link(&mut self, log: impl Into<String>) {
        self.fail_next_link = Some(log.into());
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Clears the command log and counters, keeping resources and bindings.
    pub fn reset_log(&mut self) {
        self.commands.clear();
        self.uniform_writes = 0;
        self.draw_calls = 0;
        self.vertices = 0;
    }

    pub fn uniform_writes(&self) -> usize {
        self.uniform_writes
    }

    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }

    pub fn drawn_vertices(&self) -> usize {
        self.vertices
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.current_program
    }

    pub fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.bound_framebuffer
    }

    pub fn bound_texture(&self, unit: u32) -> Option<TextureId> {
        self.texture_units.get(unit as usize).copied().flatten()
    }

    pub fn current_viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    /// Last value written to `name` on `program`.
    pub fn uniform_value(&self, program: ProgramId, name: &str) -> Option<UniformData> {
        let record = self.programs.get(&program)?;
        let (_, location) = record.uniforms.iter().find(|(n, _)| n == name)?;
        record.values.get(location).copied()
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl Device for HeadlessDevice {
    fn create_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, DeviceError> {
        let result = match self.fail_next_compile.take() {
            Some(log) => Err(log),
            None => glsl::compile(stage, source),
        };
        let interface = result.map_err(|log| {
            error!("{stage} shader failed to compile: {log}");
            DeviceError::ShaderCompile { stage, log }
        })?;
        let id = ShaderId(self.allocate());
        self.shaders.insert(id, interface);
        self.commands.push(Command::CreateShader(id, stage));
        Ok(id)
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        if self.shaders.remove(&shader).is_some() {
            self.commands.push(Command::DeleteShader(shader));
        }
    }

    fn create_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, DeviceError> {
        let vs = self.shaders.get(&vertex).ok_or(DeviceError::UnknownHandle {
            kind: "shader",
            id: vertex.0,
        })?;
        let fs = self.shaders.get(&fragment).ok_or(DeviceError::UnknownHandle {
            kind: "shader",
            id: fragment.0,
        })?;
        if vs.stage != ShaderStage::Vertex || fs.stage != ShaderStage::Fragment {
            return Err(DeviceError::InvalidOperation(
                "program needs one vertex and one fragment shader".into(),
            ));
        }

        let linked = match self.fail_next_link.take() {
            Some(log) => Err(log),
            None => glsl::link(vs, fs),
        };
        let interface = linked.map_err(|log| {
            error!("program failed to link: {log}");
            DeviceError::ProgramLink { log }
        })?;

        let id = ProgramId(self.allocate());
        let uniforms = interface
            .uniforms
            .into_iter()
            .map(|(name, _)| (name, UniformLocation(self.allocate())))
            .collect();
        self.programs.insert(
            id,
            ProgramRecord {
                attributes: interface.attributes.into_iter().map(|(n, _)| n).collect(),
                uniforms,
                values: HashMap::new(),
            },
        );
        debug!("linked program {}", id.0);
        self.commands.push(Command::CreateProgram(id));
        Ok(id)
    }

    fn delete_program(&mut self, program: ProgramId) {
        if self.programs.remove(&program).is_some() {
            if self.current_program == Some(program) {
                self.current_program = None;
            }
            self.commands.push(Command::DeleteProgram(program));
        }
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.current_program = program.filter(|p| self.programs.contains_key(p));
        self.commands.push(Command::UseProgram(self.current_program));
    }

    fn attrib_location(&mut self, program: ProgramId, name: &str) -> Option<AttribLocation> {
        let record = self.programs.get(&program)?;
        let index = record.attributes.iter().position(|a| a == name)?;
        Some(AttribLocation(index as u32))
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let record = self.programs.get(&program)?;
        record
            .uniforms
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, location)| *location)
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformData) -> Result<(), DeviceError> {
        let program = self
            .current_program
            .ok_or_else(|| DeviceError::InvalidOperation("set_uniform without a program".into()))?;
        let record = self
            .programs
            .get_mut(&program)
            .ok_or(DeviceError::UnknownHandle {
                kind: "program",
                id: program.0,
            })?;
        let name = record
            .uniforms
            .iter()
            .find(|(_, l)| *l == location)
            .map(|(n, _)| n.clone())
            .ok_or_else(|| {
                DeviceError::InvalidOperation(format!(
                    "uniform location {} does not belong to program {}",
                    location.0, program.0
                ))
            })?;
        record.values.insert(location, *value);
        self.uniform_writes += 1;
        self.commands.push(Command::SetUniform {
            location,
            name,
            value: *value,
        });
        Ok(())
    }

    fn create_buffer(&mut self, data: &[f32]) -> Result<BufferId, DeviceError> {
        let id = BufferId(self.allocate());
        self.buffers.insert(id, data.len());
        self.commands.push(Command::CreateBuffer(id, data.len()));
        Ok(id)
    }

    fn bind_buffer(&mut self, buffer: Option<BufferId>) {
        self.bound_buffer = buffer.filter(|b| self.buffers.contains_key(b));
        self.commands.push(Command::BindBuffer(self.bound_buffer));
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer).is_some() {
            if self.bound_buffer == Some(buffer) {
                self.bound_buffer = None;
            }
            self.attrib_pointers.retain(|_, (b, _)| *b != buffer);
            self.commands.push(Command::DeleteBuffer(buffer));
        }
    }

    fn vertex_attrib_pointer(&mut self, location: AttribLocation, components: u32) -> Result<(), DeviceError> {
        let buffer = self.bound_buffer.ok_or_else(|| {
            DeviceError::InvalidOperation("vertex_attrib_pointer without a bound buffer".into())
        })?;
        if !(1..=4).contains(&components) {
            return Err(DeviceError::InvalidOperation(format!(
                "{components} components per vertex"
            )));
        }
        self.attrib_pointers.insert(location, (buffer, components));
        self.commands
            .push(Command::VertexAttribPointer(location, components));
        Ok(())
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: usize, count: usize) -> Result<(), DeviceError> {
        if self.current_program.is_none() {
            return Err(DeviceError::InvalidOperation("draw without a program".into()));
        }
        for (buffer, components) in self.attrib_pointers.values() {
            let len = self.buffers.get(buffer).copied().unwrap_or(0);
            if first + count > len / *components as usize {
                return Err(DeviceError::InvalidOperation(format!(
                    "draw of {count} vertices from {first} overruns buffer {}",
                    buffer.0
                )));
            }
        }
        self.draw_calls += 1;
        self.vertices += count;
        self.commands.push(Command::DrawArrays { mode, first, count });
        Ok(())
    }

    fn create_texture(&mut self, width: u32, height: u32, pixels: Option<&[u8]>) -> Result<TextureId, DeviceError> {
        if let Some(pixels) = pixels {
            if pixels.len() != width as usize * height as usize * 4 {
                return Err(DeviceError::InvalidOperation("pixel data size mismatch".into()));
            }
        }
        let id = TextureId(self.allocate());
        self.textures.insert(id, (width, height));
        self.commands.push(Command::CreateTexture(id, width, height));
        Ok(id)
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>) {
        if let Some(slot) = self.texture_units.get_mut(unit as usize) {
            *slot = texture;
            self.commands.push(Command::BindTexture(unit, texture));
        }
    }

    fn delete_texture(&mut self, texture: TextureId) {
        if self.textures.remove(&texture).is_some() {
            for slot in self.texture_units.iter_mut() {
                if *slot == Some(texture) {
                    *slot = None;
                }
            }
            self.commands.push(Command::DeleteTexture(texture));
        }
    }

    fn create_framebuffer(&mut self, color: TextureId, width: u32, height: u32) -> Result<FramebufferId, DeviceError> {
        let (tw, th) = self
            .textures
            .get(&color)
            .copied()
            .ok_or(DeviceError::UnknownHandle {
                kind: "texture",
                id: color.0,
            })?;
        if (tw, th) != (width, height) || width == 0 || height == 0 {
            return Err(DeviceError::IncompleteFramebuffer(format!(
                "colour attachment is {tw}x{th}, framebuffer is {width}x{height}"
            )));
        }
        let id = FramebufferId(self.allocate());
        self.framebuffers.insert(id, color);
        self.commands.push(Command::CreateFramebuffer(id));
        Ok(id)
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.bound_framebuffer = framebuffer.filter(|f| self.framebuffers.contains_key(f));
        self.commands
            .push(Command::BindFramebuffer(self.bound_framebuffer));
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        if self.framebuffers.remove(&framebuffer).is_some() {
            if self.bound_framebuffer == Some(framebuffer) {
                self.bound_framebuffer = None;
            }
            self.commands.push(Command::DeleteFramebuffer(framebuffer));
        }
    }

    fn viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.commands.push(Command::Viewport(viewport));
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        self.commands.push(Command::ClearColor(rgba));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.commands.push(Command::Clear(mask));
    }

    fn max_texture_units(&self) -> u32 {
        Self::TEXTURE_UNITS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaders::{BASIC_FRAGMENT, BASIC_VERTEX};

    fn program(device: &mut HeadlessDevice) -> ProgramId {
        let vs = device.create_shader(ShaderStage::Vertex, BASIC_VERTEX).unwrap();
        let fs = device.create_shader(ShaderStage::Fragment, BASIC_FRAGMENT).unwrap();
        device.create_program(vs, fs).unwrap()
    }

    #[test]
    fn injected_compile_failure_carries_log() {
        let mut device = HeadlessDevice::new();
        device.fail_next_compile("0:1: boom");
        let err = device
            .create_shader(ShaderStage::Vertex, BASIC_VERTEX)
            .unwrap_err();
        assert_eq!(
            err,
            DeviceError::ShaderCompile {
                stage: ShaderStage::Vertex,
                log: "0:1: boom".into()
            }
        );
        // Only the next call fails
        assert!(device.create_shader(ShaderStage::Vertex, BASIC_VERTEX).is_ok());
    }

    #[test]
    fn uniform_write_requires_active_program() {
        let mut device = HeadlessDevice::new();
        let p = program(&mut device);
        let loc = device.uniform_location(p, "u_color").unwrap();
        assert!(device.set_uniform(loc, &UniformData::Float(1.0)).is_err());
        device.use_program(Some(p));
        device
            .set_uniform(loc, &UniformData::Vec4([1.0, 0.0, 0.0, 1.0]))
            .unwrap();
        assert_eq!(device.uniform_writes(), 1);
        assert_eq!(
            device.uniform_value(p, "u_color"),
            Some(UniformData::Vec4([1.0, 0.0, 0.0, 1.0]))
        );
    }

    #[test]
    fn draw_past_buffer_end_is_rejected() {
        let mut device = HeadlessDevice::new();
        let p = program(&mut device);
        device.use_program(Some(p));
        let buffer = device.create_buffer(&[0.0; 9]).unwrap();
        device.bind_buffer(Some(buffer));
        let loc = device.attrib_location(p, "a_position").unwrap();
        device.vertex_attrib_pointer(loc, 3).unwrap();
        assert!(device.draw_arrays(PrimitiveMode::Triangles, 0, 3).is_ok());
        assert!(device.draw_arrays(PrimitiveMode::Triangles, 1, 3).is_err());
        assert_eq!(device.draw_calls(), 1);
    }

    #[test]
    fn framebuffer_size_must_match_attachment() {
        let mut device = HeadlessDevice::new();
        let tex = device.create_texture(4, 4, None).unwrap();
        assert!(matches!(
            device.create_framebuffer(tex, 8, 8),
            Err(DeviceError::IncompleteFramebuffer(_))
        ));
        assert!(device.create_framebuffer(tex, 4, 4).is_ok());
    }
}
