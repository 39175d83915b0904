//! CPU implementation of [`Device`].
//!
//! Shaders are scanned for their declarations like on [`HeadlessDevice`], and
//! every linked program runs the same fixed pipeline:
//!
//! ```text
//! gl_Position  = u_worldViewProjection * u_modelTransform * vec4(a_position, 1.0)
//! gl_FragColor = u_color
//! ```
//!
//! Missing matrices count as identity and a missing colour as opaque white.
//! Primitives with any vertex at or behind the eye plane (`w <= ε`) are
//! discarded whole; fragments outside the depth range are dropped per pixel.
//!
//! [`HeadlessDevice`]: crate::gl::HeadlessDevice

use std::collections::HashMap;

use log::{debug, error, trace};

use super::rasterizer::{draw_line, fill_triangle, ClipRect};
use super::target::{pack_argb, rgba_bytes_to_argb, RenderTarget};
use crate::error::DeviceError;
use crate::gl::glsl::{self, ShaderInterface};
use crate::gl::{
    AttribLocation, BufferId, ClearMask, Device, FramebufferId, PrimitiveMode, ProgramId,
    ShaderId, ShaderStage, TextureId, UniformData, UniformLocation, Viewport,
};
use crate::math::{Mat4, Vec3, Vec4};
use crate::shaders::names;

const W_EPSILON: f32 = 1e-6;
const WHITE: u32 = 0xFFFF_FFFF;

#[derive(Debug)]
struct SoftProgram {
    attributes: Vec<String>,
    uniforms: Vec<(String, UniformLocation)>,
    values: HashMap<String, UniformData>,
}

impl SoftProgram {
    fn mat4(&self, name: &str) -> Mat4 {
        match self.values.get(name) {
            Some(UniformData::Mat4(cols)) => Mat4::from_cols_array(cols),
            _ => Mat4::IDENTITY,
        }
    }

    fn color(&self) -> u32 {
        match self.values.get(names::COLOR) {
            Some(UniformData::Vec4(rgba)) => pack_argb(*rgba),
            Some(UniformData::Vec3([r, g, b])) => pack_argb([*r, *g, *b, 1.0]),
            _ => WHITE,
        }
    }
}

#[derive(Debug)]
struct TextureImage {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

#[derive(Debug)]
struct Offscreen {
    color: TextureId,
    target: RenderTarget,
}

#[derive(Debug)]
pub struct SoftwareDevice {
    next_id: u32,
    shaders: HashMap<ShaderId, ShaderInterface>,
    programs: HashMap<ProgramId, SoftProgram>,
    buffers: HashMap<BufferId, Vec<f32>>,
    textures: HashMap<TextureId, TextureImage>,
    framebuffers: HashMap<FramebufferId, Offscreen>,

    screen: RenderTarget,
    current_program: Option<ProgramId>,
    bound_buffer: Option<BufferId>,
    bound_framebuffer: Option<FramebufferId>,
    texture_units: Vec<Option<TextureId>>,
    attrib_pointers: HashMap<AttribLocation, (BufferId, u32)>,
    viewport: Viewport,
    clear_color: u32,
}

impl SoftwareDevice {
    pub const TEXTURE_UNITS: u32 = 8;

    pub fn new(width: u32, height: u32) -> Self {
        Self {
            next_id: 1,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            framebuffers: HashMap::new(),
            screen: RenderTarget::new(width, height),
            current_program: None,
            bound_buffer: None,
            bound_framebuffer: None,
            texture_units: vec![None; Self::TEXTURE_UNITS as usize],
            attrib_pointers: HashMap::new(),
            viewport: Viewport::sized(width, height),
            clear_color: 0xFF00_0000,
        }
    }

    /// Resizes the default target. Its contents are lost.
    pub fn resize(&mut self, width: u32, height: u32) {
        debug!("software target resized to {width}x{height}");
        self.screen.resize(width, height);
    }

    pub fn width(&self) -> u32 {
        self.screen.width()
    }

    pub fn height(&self) -> u32 {
        self.screen.height()
    }

    /// The default target as ARGB8888 bytes.
    pub fn frame_bytes(&self) -> Vec<u8> {
        self.screen.to_bytes()
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.screen.pixel(x, y)
    }

    pub fn depth(&self, x: i32, y: i32) -> Option<f32> {
        self.screen.depth(x, y)
    }

    /// Pixels of a texture, including render-target results once resolved.
    pub fn texture_pixels(&self, texture: TextureId) -> Option<&[u32]> {
        self.textures.get(&texture).map(|t| t.pixels.as_slice())
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn active_target(&mut self) -> &mut RenderTarget {
        match self
            .bound_framebuffer
            .and_then(|id| self.framebuffers.get_mut(&id))
        {
            Some(offscreen) => &mut offscreen.target,
            None => &mut self.screen,
        }
    }

    /// Copies an off-screen target's colour into its texture.
    fn resolve(&mut self, framebuffer: FramebufferId) {
        let Some(offscreen) = self.framebuffers.get(&framebuffer) else {
            return;
        };
        if let Some(texture) = self.textures.get_mut(&offscreen.color) {
            texture.pixels.clear();
            texture
                .pixels
                .extend_from_slice(offscreen.target.pixels());
        }
    }

    fn clip_rect(&mut self) -> ClipRect {
        let vp = self.viewport;
        let target = self.active_target();
        ClipRect {
            min_x: vp.x.max(0),
            min_y: vp.y.max(0),
            max_x: (vp.x + vp.width as i32 - 1).min(target.width() as i32 - 1),
            max_y: (vp.y + vp.height as i32 - 1).min(target.height() as i32 - 1),
        }
    }

    /// Clip space to window space: pixels with y pointing down, depth in `[0, 1]`.
    fn to_window(&self, clip: Vec4) -> Option<Vec3> {
        if clip.w <= W_EPSILON {
            return None;
        }
        let ndc = clip.perspective_divide().ok()?;
        let vp = self.viewport;
        Some(Vec3::new(
            vp.x as f32 + (ndc.x + 1.0) * 0.5 * vp.width as f32,
            vp.y as f32 + (1.0 - ndc.y) * 0.5 * vp.height as f32,
            (ndc.z + 1.0) * 0.5,
        ))
    }
}

impl Device for SoftwareDevice {
    fn create_shader(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderId, DeviceError> {
        let interface = glsl::compile(stage, source).map_err(|log| {
            error!("{stage} shader failed to compile: {log}");
            DeviceError::ShaderCompile { stage, log }
        })?;
        let id = ShaderId(self.allocate());
        self.shaders.insert(id, interface);
        Ok(id)
    }

    fn delete_shader(&mut self, shader: ShaderId) {
        self.shaders.remove(&shader);
    }

    fn create_program(&mut self, vertex: ShaderId, fragment: ShaderId) -> Result<ProgramId, DeviceError> {
        let lookup = |id: ShaderId| {
            self.shaders.get(&id).ok_or(DeviceError::UnknownHandle {
                kind: "shader",
                id: id.0,
            })
        };
        let interface = glsl::link(lookup(vertex)?, lookup(fragment)?).map_err(|log| {
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
            SoftProgram {
                attributes: interface.attributes.into_iter().map(|(n, _)| n).collect(),
                uniforms,
                values: HashMap::new(),
            },
        );
        Ok(id)
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.current_program = program.filter(|p| self.programs.contains_key(p));
    }

    fn attrib_location(&mut self, program: ProgramId, name: &str) -> Option<AttribLocation> {
        let program = self.programs.get(&program)?;
        let index = program.attributes.iter().position(|a| a == name)?;
        Some(AttribLocation(index as u32))
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let program = self.programs.get(&program)?;
        program
            .uniforms
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, l)| *l)
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformData) -> Result<(), DeviceError> {
        let program = self
            .current_program
            .and_then(|p| self.programs.get_mut(&p))
            .ok_or_else(|| DeviceError::InvalidOperation("set_uniform without a program".into()))?;
        let name = program
            .uniforms
            .iter()
            .find(|(_, l)| *l == location)
            .map(|(n, _)| n.clone())
            .ok_or_else(|| {
                DeviceError::InvalidOperation(format!(
                    "uniform location {} is not part of the active program",
                    location.0
                ))
            })?;
        program.values.insert(name, *value);
        Ok(())
    }

    fn create_buffer(&mut self, data: &[f32]) -> Result<BufferId, DeviceError> {
        let id = BufferId(self.allocate());
        self.buffers.insert(id, data.to_vec());
        Ok(id)
    }

    fn bind_buffer(&mut self, buffer: Option<BufferId>) {
        self.bound_buffer = buffer.filter(|b| self.buffers.contains_key(b));
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
        self.attrib_pointers.retain(|_, (b, _)| *b != buffer);
        if self.bound_buffer == Some(buffer) {
            self.bound_buffer = None;
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
        Ok(())
    }

    fn draw_arrays(&mut self, mode: PrimitiveMode, first: usize, count: usize) -> Result<(), DeviceError> {
        let program_id = self
            .current_program
            .ok_or_else(|| DeviceError::InvalidOperation("draw without a program".into()))?;
        let program = self
            .programs
            .get(&program_id)
            .ok_or(DeviceError::UnknownHandle {
                kind: "program",
                id: program_id.0,
            })?;

        let Some(position) = program
            .attributes
            .iter()
            .position(|a| a == names::POSITION)
            .map(|i| AttribLocation(i as u32))
        else {
            trace!("program {} has no {} attribute", program_id.0, names::POSITION);
            return Ok(());
        };
        let (buffer, components) = self.attrib_pointers.get(&position).copied().ok_or_else(|| {
            DeviceError::InvalidOperation(format!("{} is not sourced from a buffer", names::POSITION))
        })?;
        let data = self.buffers.get(&buffer).ok_or(DeviceError::UnknownHandle {
            kind: "buffer",
            id: buffer.0,
        })?;
        let stride = components as usize;
        if first + count > data.len() / stride {
            return Err(DeviceError::InvalidOperation(format!(
                "draw of {count} vertices from {first} overruns buffer {}",
                buffer.0
            )));
        }

        let mvp = program.mat4(names::WORLD_VIEW_PROJECTION) * program.mat4(names::MODEL_TRANSFORM);
        let color = program.color();
        let window: Vec<Option<Vec3>> = data[first * stride..(first + count) * stride]
            .chunks_exact(stride)
            .map(|v| {
                let p = Vec4::point(
                    v[0],
                    v.get(1).copied().unwrap_or(0.0),
                    v.get(2).copied().unwrap_or(0.0),
                );
                self.to_window(mvp * p)
            })
            .collect();

        let clip = self.clip_rect();
        let target = self.active_target();
        let mut discarded = 0;
        for primitive in window.chunks_exact(mode.vertices_per_primitive()) {
            match (mode, primitive) {
                (PrimitiveMode::Triangles, [Some(a), Some(b), Some(c)]) => {
                    fill_triangle(target, clip, [*a, *b, *c], color)
                }
                (PrimitiveMode::Lines, [Some(a), Some(b)]) => draw_line(target, clip, *a, *b, color),
                _ => discarded += 1,
            }
        }
        trace!("drew {count} vertices, {discarded} primitives discarded");
        Ok(())
    }

    fn create_texture(&mut self, width: u32, height: u32, pixels: Option<&[u8]>) -> Result<TextureId, DeviceError> {
        let pixels = match pixels {
            Some(bytes) if bytes.len() != width as usize * height as usize * 4 => {
                return Err(DeviceError::InvalidOperation("pixel data size mismatch".into()))
            }
            Some(bytes) => rgba_bytes_to_argb(bytes),
            None => vec![0; width as usize * height as usize],
        };
        let id = TextureId(self.allocate());
        self.textures.insert(
            id,
            TextureImage {
                width,
                height,
                pixels,
            },
        );
        Ok(id)
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureId>) {
        if let Some(slot) = self.texture_units.get_mut(unit as usize) {
            *slot = texture;
        }
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
        for slot in self.texture_units.iter_mut() {
            if *slot == Some(texture) {
                *slot = None;
            }
        }
    }

    fn create_framebuffer(&mut self, color: TextureId, width: u32, height: u32) -> Result<FramebufferId, DeviceError> {
        let texture = self.textures.get(&color).ok_or(DeviceError::UnknownHandle {
            kind: "texture",
            id: color.0,
        })?;
        if (texture.width, texture.height) != (width, height) || width == 0 || height == 0 {
            return Err(DeviceError::IncompleteFramebuffer(format!(
                "colour attachment is {}x{}, framebuffer is {width}x{height}",
                texture.width, texture.height
            )));
        }
        let id = FramebufferId(self.allocate());
        self.framebuffers.insert(
            id,
            Offscreen {
                color,
                target: RenderTarget::new(width, height),
            },
        );
        Ok(id)
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        if let Some(previous) = self.bound_framebuffer {
            self.resolve(previous);
        }
        self.bound_framebuffer = framebuffer.filter(|f| self.framebuffers.contains_key(f));
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.framebuffers.remove(&framebuffer);
        if self.bound_framebuffer == Some(framebuffer) {
            self.bound_framebuffer = None;
        }
    }

    fn viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        self.clear_color = pack_argb(rgba);
    }

    fn clear(&mut self, mask: ClearMask) {
        let color = self.clear_color;
        let target = self.active_target();
        if mask.color {
            target.clear_color(color);
        }
        if mask.depth {
            target.clear_depth();
        }
    }

    fn max_texture_units(&self) -> u32 {
        Self::TEXTURE_UNITS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::{FrameBufferObject, ShaderProgram, UniformValue, VertexBuffer};

    fn draw(device: &mut SoftwareDevice, positions: &[f32], mode: PrimitiveMode, color: Option<[f32; 4]>) {
        let mut program = ShaderProgram::basic(device).unwrap();
        program.activate(device);
        if let Some(c) = color {
            let value = UniformValue::from(Vec4::from(c));
            program.uniforms(device, [("u_color", &value)]).unwrap();
        }
        let vbo = VertexBuffer::new(device, positions).unwrap();
        vbo.bind(device);
        let loc = program.attrib_location(device, "a_position").unwrap();
        device.vertex_attrib_pointer(loc, 3).unwrap();
        vbo.draw(device, mode).unwrap();
    }

    #[test]
    fn full_screen_triangle_fills_target() {
        let mut device = SoftwareDevice::new(4, 4);
        device.clear(ClearMask::ALL);
        let big = [-1.0, -1.0, 0.0, 3.0, -1.0, 0.0, -1.0, 3.0, 0.0];
        draw(&mut device, &big, PrimitiveMode::Triangles, Some([1.0, 0.0, 0.0, 1.0]));
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(device.pixel(x, y), Some(0xFFFF0000));
            }
        }
        let bytes = device.frame_bytes();
        assert_eq!(bytes.len(), 4 * 4 * 4);
    }

    #[test]
    fn default_colour_is_white() {
        let mut device = SoftwareDevice::new(4, 4);
        let big = [-1.0, -1.0, 0.0, 3.0, -1.0, 0.0, -1.0, 3.0, 0.0];
        draw(&mut device, &big, PrimitiveMode::Triangles, None);
        assert_eq!(device.pixel(1, 1), Some(WHITE));
    }

    #[test]
    fn nearer_fragment_wins() {
        let mut device = SoftwareDevice::new(4, 4);
        device.clear(ClearMask::ALL);
        let near = [-1.0, -1.0, -0.5, 3.0, -1.0, -0.5, -1.0, 3.0, -0.5];
        let far = [-1.0, -1.0, 0.5, 3.0, -1.0, 0.5, -1.0, 3.0, 0.5];
        draw(&mut device, &near, PrimitiveMode::Triangles, Some([0.0, 1.0, 0.0, 1.0]));
        draw(&mut device, &far, PrimitiveMode::Triangles, Some([0.0, 0.0, 1.0, 1.0]));
        assert_eq!(device.pixel(2, 2), Some(0xFF00FF00));
        assert_eq!(device.depth(2, 2), Some(0.25));
    }

    #[test]
    fn clear_uses_clear_colour() {
        let mut device = SoftwareDevice::new(2, 2);
        device.clear_color([0.0, 0.0, 1.0, 1.0]);
        device.clear(ClearMask::COLOR);
        assert_eq!(device.pixel(0, 0), Some(0xFF0000FF));
    }

    #[test]
    fn offscreen_render_resolves_into_texture() {
        let mut device = SoftwareDevice::new(4, 4);
        let fbo = FrameBufferObject::new(&mut device, 2, 2).unwrap();
        fbo.bind(&mut device);
        device.viewport(fbo.viewport());
        device.clear_color([1.0, 1.0, 1.0, 1.0]);
        device.clear(ClearMask::ALL);
        fbo.unbind(&mut device);

        let pixels = device.texture_pixels(fbo.color_texture().id()).unwrap();
        assert!(pixels.iter().all(|&p| p == WHITE));
        assert_eq!(device.pixel(0, 0), Some(0));
    }

    #[test]
    fn line_ending_near_the_eye_plane_is_clipped() {
        let mut device = SoftwareDevice::new(64, 64);
        device.clear(ClearMask::ALL);
        let mut program = ShaderProgram::basic(&mut device).unwrap();
        program.activate(&mut device);
        let wvp = UniformValue::from(Mat4::perspective(50f32.to_radians(), 1.0, 0.1, 100.0).unwrap());
        program.uniforms(&mut device, [("u_worldViewProjection", &wvp)]).unwrap();

        let loc = program.attrib_location(&mut device, "a_position").unwrap();
        // w = 1e-5 pushes window x to about 1e12, far past i32
        let grazing = [-1.0e4, 0.0, -1.0e-5, 1.0e4, 0.0, -1.0e-5];
        let vbo = VertexBuffer::new(&mut device, &grazing).unwrap();
        vbo.bind(&mut device);
        device.vertex_attrib_pointer(loc, 3).unwrap();
        vbo.draw(&mut device, PrimitiveMode::Lines).unwrap();

        let wide = [-1.0e7, 0.0, -1.0, 1.0e7, 0.0, -1.0];
        let vbo = VertexBuffer::new(&mut device, &wide).unwrap();
        vbo.bind(&mut device);
        device.vertex_attrib_pointer(loc, 3).unwrap();
        vbo.draw(&mut device, PrimitiveMode::Lines).unwrap();

        for x in 0..64 {
            assert_eq!(device.pixel(x, 32), Some(WHITE));
        }
        assert_eq!(device.pixel(0, 0), Some(0));
    }
}
