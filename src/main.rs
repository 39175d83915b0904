use std::ops::ControlFlow;

use log::{error, info};
use voxgl::logging::{init_logging, LoggingConfig};
use voxgl::prelude::*;
use voxgl::shaders::names;

fn build_scene(device: &mut SoftwareDevice, camera: SharedCamera, config: &RenderConfig) -> Result<SceneGraph> {
    let program = ShaderProgram::basic(device)?.shared();

    let mut floor = MaterialNode::new(
        program.clone(),
        vec![(names::COLOR.into(), Vec4::new(0.35, 0.35, 0.35, 1.0).into())],
    );
    floor.append(Box::new(MeshNode::lines(device, &mesh::grid(10.0, 20))?));

    let mut cube_transform = Transform::from_position(Vec3::new(0.0, 1.0, 0.0));
    cube_transform.rotate_y_degrees(30.0);
    let mut cube = TransformNode::new(cube_transform);
    cube.append(Box::new(MeshNode::triangles(device, &mesh::cube(1.0))?));
    let mut solid = MaterialNode::new(
        program.clone(),
        vec![(names::COLOR.into(), Vec4::new(0.8, 0.2, 0.2, 1.0).into())],
    );
    solid.append(Box::new(cube));

    let outline = mesh::wireframe(&mesh::cube_at(Vec3::new(2.0, 0.0, -1.0), 1.5))?;
    let mut wire = MaterialNode::new(
        program,
        vec![(names::COLOR.into(), Vec4::new(0.1, 0.2, 0.9, 1.0).into())],
    );
    wire.append(Box::new(MeshNode::lines(device, &outline)?));

    let mut camera_node = CameraNode::new(camera);
    camera_node.append(Box::new(floor));
    camera_node.append(Box::new(solid));
    camera_node.append(Box::new(wire));

    let mut graph = SceneGraph::new(config.width, config.height).with_clear_color(config.clear_color);
    graph.append(Box::new(camera_node));
    Ok(graph)
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    let config = RenderConfig::from_env()?;

    let mut window = Window::new(&config.title, config.width, config.height)?;
    let mut device = SoftwareDevice::new(config.width, config.height);
    let camera = Camera::new(
        Vec3::new(0.0, 4.0, 10.0),
        Vec3::ZERO,
        Vec3::Y,
        config.projection()?,
    )?
    .shared();
    let mut graph = build_scene(&mut device, camera.clone(), &config)?;

    let controller = config.controller();
    let mut input = InputState::new();
    let mut limiter = FrameLimiter::new(config.target_fps);
    let mut clock: Clock = Clock::default();
    let mut failure = None;

    clock.run(&mut limiter, |tick| {
        match window.poll_events(&mut input) {
            WindowEvent::Quit => return ControlFlow::Break(()),
            WindowEvent::Resize(width, height) => {
                if let Err(e) = window.resize(width, height) {
                    failure = Some(e);
                    return ControlFlow::Break(());
                }
                device.resize(width, height);
                graph.resize(width, height);
            }
            WindowEvent::None => {}
        }

        let viewport = graph.viewport();
        if let Err(e) = controller.tick(&mut camera.borrow_mut(), &input, viewport, tick.dt_seconds()) {
            // A degenerate camera move is skipped, the frame still renders
            error!("camera update rejected: {e}");
        }

        let frame = graph
            .draw(&mut device)
            .map_err(Error::from)
            .and_then(|_| window.present(&device.frame_bytes()));
        match frame {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => {
                failure = Some(e);
                ControlFlow::Break(())
            }
        }
    });

    match failure {
        Some(e) => Err(e),
        None => {
            info!("bye");
            Ok(())
        }
    }
}
