use approx::assert_relative_eq;
use voxgl::error::SceneError;
use voxgl::gl::{Command, UniformData};
use voxgl::prelude::*;
use voxgl::scene::TraversalContext;
use voxgl::shaders::names;

fn camera() -> SharedCamera {
    Camera::new(
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::ZERO,
        Vec3::Y,
        Projection::default(),
    )
    .unwrap()
    .shared()
}

fn camera_material_cube(device: &mut dyn Device, camera: SharedCamera) -> SceneGraph {
    let program = ShaderProgram::basic(device).unwrap().shared();
    let mut material = MaterialNode::new(
        program,
        vec![(names::COLOR.into(), Vec4::new(1.0, 0.0, 0.0, 1.0).into())],
    );
    material.append(Box::new(
        MeshNode::triangles(device, &mesh::cube(1.0)).unwrap(),
    ));
    let mut camera_node = CameraNode::new(camera);
    camera_node.append(Box::new(material));

    let mut graph = SceneGraph::new(64, 64);
    graph.append(Box::new(camera_node));
    graph
}

#[test]
fn camera_material_cube_draws_once() {
    let mut device = HeadlessDevice::new();
    let mut graph = camera_material_cube(&mut device, camera());

    let stats = graph.draw(&mut device).unwrap();
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.vertices, 36);
    assert_eq!(stats.uniform_scopes, 2);
    assert_eq!(stats.shader_activations, 1);
    assert_eq!(device.draw_calls(), 1);
    assert_eq!(device.drawn_vertices(), 36);
    assert_eq!(device.current_program(), None);

    let draw = device
        .commands()
        .iter()
        .position(|c| matches!(c, Command::DrawArrays { count: 36, .. }))
        .unwrap();
    let color_write = device
        .commands()
        .iter()
        .position(|c| matches!(c, Command::SetUniform { name, .. } if name == names::COLOR))
        .unwrap();
    assert!(color_write < draw);
}

#[test]
fn unchanged_frames_skip_uniform_uploads() {
    let mut device = HeadlessDevice::new();
    let camera = camera();
    let mut graph = camera_material_cube(&mut device, camera.clone());

    let first = graph.draw(&mut device).unwrap();
    assert!(first.uniform_writes >= 2);
    let second = graph.draw(&mut device).unwrap();
    assert_eq!(second.uniform_writes, 0);

    camera.borrow_mut().translate(Vec3::new(1.0, 0.0, 0.0)).unwrap();
    let third = graph.draw(&mut device).unwrap();
    // Only the world-view-projection changed for the basic shader
    assert_eq!(third.uniform_writes, 1);
}

#[test]
fn failing_subtree_leaves_the_context_clean() {
    let mut device = HeadlessDevice::new();
    let mut graph = SceneGraph::new(8, 8);
    // A skybox outside any camera is missing its view uniforms
    let program = ShaderProgram::basic(&mut device).unwrap().shared();
    graph.append(Box::new(
        SkyboxNode::new(&mut device, 50.0, program, Vec::new()).unwrap(),
    ));

    assert_eq!(
        graph.draw(&mut device),
        Err(SceneError::MissingUniform(names::WORLD_VIEW.into()))
    );
    assert_eq!(device.current_program(), None);
    assert_eq!(device.draw_calls(), 0);
}

#[test]
fn uniform_environment_is_restored_after_the_root() {
    let mut device = HeadlessDevice::new();
    let mut ctx = TraversalContext::new(&mut device, Viewport::sized(8, 8));
    ctx.push_uniforms();
    ctx.set_uniform("u_time", 1.5f32);
    let before = ctx.env().snapshot();

    let mut node = CameraNode::new(camera());
    node.append(Box::new(TransformNode::new(Transform::from_position(Vec3::X))));
    node.visit(&mut ctx).unwrap();

    assert_eq!(ctx.env().snapshot(), before);
    assert_eq!(ctx.open_entries(), 1);
}

#[test]
fn software_device_renders_the_cube_in_the_centre() {
    let mut device = SoftwareDevice::new(64, 64);
    let mut graph = camera_material_cube(&mut device, camera());
    graph.set_clear_color([0.0, 0.0, 0.0, 1.0]);
    graph.draw(&mut device).unwrap();

    assert_eq!(device.pixel(32, 32), Some(0xFFFF0000));
    assert_eq!(device.pixel(0, 0), Some(0xFF000000));
    // The front face at z = 1 is 4 units from the eye
    let depth = device.depth(32, 32).unwrap();
    let ndc = camera()
        .borrow()
        .project(Vec3::new(0.0, 0.0, 1.0))
        .unwrap();
    assert_relative_eq!(depth, (ndc.z + 1.0) / 2.0, epsilon = 1e-4);
}

#[test]
fn render_target_output_can_be_sampled() {
    let mut device = HeadlessDevice::new();
    let mut target = RenderTargetNode::with_size(&mut device, 16, 16).unwrap();
    let program = ShaderProgram::basic(&mut device).unwrap().shared();
    let mut material = MaterialNode::new(program, Vec::new());
    material.append(Box::new(
        MeshNode::triangles(&mut device, &mesh::cube(1.0)).unwrap(),
    ));
    let mut camera_node = CameraNode::new(camera());
    camera_node.append(Box::new(material));
    target.append(Box::new(camera_node));

    let sampler = ShaderProgram::new(
        &mut device,
        "attribute vec3 a_position;\nvoid main() { gl_Position = vec4(a_position, 1.0); }",
        "uniform sampler2D u_scene;\nvoid main() { gl_FragColor = texture2D(u_scene, vec2(0.5)); }",
    )
    .unwrap()
    .shared();
    let sampler_id = sampler.borrow().id();
    let pass = PostprocessNode::new(
        &mut device,
        sampler,
        vec![("u_scene".into(), target.color_texture().into())],
    )
    .unwrap();

    let mut graph = SceneGraph::new(32, 32);
    graph.append(Box::new(target));
    graph.append(Box::new(pass));
    let stats = graph.draw(&mut device).unwrap();

    assert_eq!(stats.draw_calls, 2);
    assert_eq!(
        device.uniform_value(sampler_id, "u_scene"),
        Some(UniformData::Int(0))
    );
    assert_eq!(device.bound_framebuffer(), None);
    assert_eq!(device.current_viewport(), Viewport::sized(32, 32));
}
