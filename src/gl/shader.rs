use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, trace};

use super::device::{AttribLocation, Device, ProgramId, ShaderStage, UniformLocation};
use super::uniform::{UniformData, UniformValue};
use crate::error::{DeviceError, SceneError};
use crate::shaders::{BASIC_FRAGMENT, BASIC_VERTEX};

/// Program shared by every material node that draws with it.
pub type SharedProgram = Rc<RefCell<ShaderProgram>>;

/// A linked shader program plus its client-side caches.
///
/// Attribute and uniform locations are looked up once per name (misses are
/// cached too). The last value written to each uniform is remembered so that
/// [`uniforms`](ShaderProgram::uniforms) only touches the device for values
/// that actually changed.
#[derive(Debug)]
pub struct ShaderProgram {
    id: ProgramId,
    attributes: HashMap<String, Option<AttribLocation>>,
    uniform_locations: HashMap<String, Option<UniformLocation>>,
    last_written: HashMap<String, UniformData>,
}

impl ShaderProgram {
    /// Compiles both stages and links them.
    ///
    /// The intermediate shader objects are released whatever the outcome.
    pub fn new(device: &mut dyn Device, vertex: &str, fragment: &str) -> Result<Self, DeviceError> {
        let vs = device.create_shader(ShaderStage::Vertex, vertex)?;
        let fs = match device.create_shader(ShaderStage::Fragment, fragment) {
            Ok(fs) => fs,
            Err(e) => {
                device.delete_shader(vs);
                return Err(e);
            }
        };
        let linked = device.create_program(vs, fs);
        device.delete_shader(vs);
        device.delete_shader(fs);

        let id = linked?;
        debug!("shader program {} ready", id.0);
        Ok(Self {
            id,
            attributes: HashMap::new(),
            uniform_locations: HashMap::new(),
            last_written: HashMap::new(),
        })
    }

    /// The built-in flat colour program.
    pub fn basic(device: &mut dyn Device) -> Result<Self, DeviceError> {
        Self::new(device, BASIC_VERTEX, BASIC_FRAGMENT)
    }

    pub fn shared(self) -> SharedProgram {
        Rc::new(RefCell::new(self))
    }

    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn activate(&self, device: &mut dyn Device) {
        device.use_program(Some(self.id));
    }

    pub fn attrib_location(
        &mut self,
        device: &mut dyn Device,
        name: &str,
    ) -> Result<AttribLocation, SceneError> {
        let id = self.id;
        let location = *self
            .attributes
            .entry(name.to_string())
            .or_insert_with(|| device.attrib_location(id, name));
        location.ok_or_else(|| SceneError::MissingAttribute(name.to_string()))
    }

    /// `None` when the program has no active uniform of that name.
    pub fn uniform_location(&mut self, device: &mut dyn Device, name: &str) -> Option<UniformLocation> {
        let id = self.id;
        *self
            .uniform_locations
            .entry(name.to_string())
            .or_insert_with(|| device.uniform_location(id, name))
    }

    /// Uploads `values` to this program, skipping unchanged ones.
    ///
    /// The program must be active. Names the program does not declare and
    /// texture values without an assigned unit are ignored. Returns the number
    /// of device writes.
    pub fn uniforms<'a, I>(&mut self, device: &mut dyn Device, values: I) -> Result<usize, DeviceError>
    where
        I: IntoIterator<Item = (&'a str, &'a UniformValue)>,
    {
        let mut writes = 0;
        for (name, value) in values {
            let Some(data) = value.to_data() else {
                trace!("skipping unbound texture uniform {name}");
                continue;
            };
            if self.last_written.get(name) == Some(&data) {
                continue;
            }
            let Some(location) = self.uniform_location(device, name) else {
                continue;
            };
            device.set_uniform(location, &data)?;
            self.last_written.insert(name.to_string(), data);
            writes += 1;
        }
        Ok(writes)
    }

    pub fn destroy(self, device: &mut dyn Device) {
        device.delete_program(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::HeadlessDevice;
    use crate::math::{Mat4, Vec4};

    #[test]
    fn identical_upload_is_elided() {
        let mut device = HeadlessDevice::new();
        let mut program = ShaderProgram::basic(&mut device).unwrap();
        program.activate(&mut device);

        let color = UniformValue::from(Vec4::new(1.0, 0.0, 0.0, 1.0));
        let model = UniformValue::from(Mat4::translation(1.0, 0.0, 0.0));
        let values = [("u_color", &color), ("u_modelTransform", &model)];

        assert_eq!(program.uniforms(&mut device, values).unwrap(), 2);
        assert_eq!(program.uniforms(&mut device, values).unwrap(), 0);

        let moved = UniformValue::from(Mat4::translation(2.0, 0.0, 0.0));
        let values = [("u_color", &color), ("u_modelTransform", &moved)];
        assert_eq!(program.uniforms(&mut device, values).unwrap(), 1);
        assert_eq!(device.uniform_writes(), 3);
    }

    #[test]
    fn undeclared_uniforms_are_ignored() {
        let mut device = HeadlessDevice::new();
        let mut program = ShaderProgram::basic(&mut device).unwrap();
        program.activate(&mut device);
        let v = UniformValue::Float(1.0);
        assert_eq!(program.uniforms(&mut device, [("u_time", &v)]).unwrap(), 0);
    }

    #[test]
    fn missing_attribute_is_an_error() {
        let mut device = HeadlessDevice::new();
        let mut program = ShaderProgram::basic(&mut device).unwrap();
        assert!(program.attrib_location(&mut device, "a_position").is_ok());
        assert_eq!(
            program.attrib_location(&mut device, "a_normal"),
            Err(SceneError::MissingAttribute("a_normal".into()))
        );
    }

    #[test]
    fn compile_error_surfaces_stage_and_log() {
        let mut device = HeadlessDevice::new();
        let err = ShaderProgram::new(&mut device, BASIC_VERTEX, "void main() {").unwrap_err();
        match err {
            DeviceError::ShaderCompile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(log.starts_with("ERROR:"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn link_error_surfaces_log() {
        let mut device = HeadlessDevice::new();
        device.fail_next_link("varying mismatch");
        let err = ShaderProgram::basic(&mut device).unwrap_err();
        assert_eq!(
            err,
            DeviceError::ProgramLink {
                log: "varying mismatch".into()
            }
        );
        assert_eq!(device.live_programs(), 0);
    }
}
