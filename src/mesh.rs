//! Vertex data generators.
//!
//! Every generator returns a flat position list, three floats per vertex,
//! ready for [`VertexBuffer::new`](crate::gl::VertexBuffer::new). Triangle
//! lists wind counter-clockwise when seen from outside.

use std::path::Path;

use log::debug;

use crate::error::MeshError;
use crate::math::Vec3;

const FLOATS_PER_VERTEX: usize = 3;
const FLOATS_PER_TRIANGLE: usize = 9;

const CUBE_CORNERS: [Vec3; 8] = [
    Vec3::new(-1.0, -1.0, -1.0),
    Vec3::new(-1.0, 1.0, -1.0),
    Vec3::new(1.0, 1.0, -1.0),
    Vec3::new(1.0, -1.0, -1.0),
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(-1.0, -1.0, 1.0),
];

const CUBE_FACES: [[usize; 3]; 12] = [
    // -z
    [0, 1, 2],
    [0, 2, 3],
    // +x
    [3, 2, 4],
    [3, 4, 5],
    // +z
    [5, 4, 6],
    [5, 6, 7],
    // -x
    [7, 6, 1],
    [7, 1, 0],
    // +y
    [1, 6, 4],
    [1, 4, 2],
    // -y
    [5, 7, 0],
    [5, 0, 3],
];

fn cube_with(corner: impl Fn(Vec3) -> Vec3) -> Vec<f32> {
    CUBE_FACES
        .iter()
        .flatten()
        .flat_map(|&i| corner(CUBE_CORNERS[i]).to_array())
        .collect()
}

/// A cube centred on the origin spanning `[-scale, scale]` on every axis.
pub fn cube(scale: f32) -> Vec<f32> {
    cube_with(|c| c * scale)
}

/// An axis-aligned cube with its minimum corner at `origin`.
pub fn cube_at(origin: Vec3, edge: f32) -> Vec<f32> {
    cube_with(|c| origin + (c + Vec3::ONE) * (edge * 0.5))
}

/// Line list of a square grid on the `y = 0` plane, spanning
/// `[-half_extent, half_extent]` in x and z.
pub fn grid(half_extent: f32, divisions: u32) -> Vec<f32> {
    let divisions = divisions.max(1);
    let step = 2.0 * half_extent / divisions as f32;
    let mut lines = Vec::with_capacity((divisions as usize + 1) * 4 * FLOATS_PER_VERTEX);
    for i in 0..=divisions {
        let t = -half_extent + step * i as f32;
        lines.extend_from_slice(&[-half_extent, 0.0, t, half_extent, 0.0, t]);
        lines.extend_from_slice(&[t, 0.0, -half_extent, t, 0.0, half_extent]);
    }
    lines
}

/// Two triangles covering normalized device coordinates `[-1, 1]²` at `z = 0`.
pub fn screen_quad() -> Vec<f32> {
    vec![
        -1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 1.0, 1.0, 0.0, //
        -1.0, -1.0, 0.0, 1.0, 1.0, 0.0, -1.0, 1.0, 0.0,
    ]
}

/// Converts a triangle list into a line list of every triangle's edges.
///
/// Shared edges are emitted once per triangle.
pub fn wireframe(triangles: &[f32]) -> Result<Vec<f32>, MeshError> {
    if triangles.len() % FLOATS_PER_TRIANGLE != 0 {
        return Err(MeshError::InvalidLength {
            len: triangles.len(),
            expected: FLOATS_PER_TRIANGLE,
        });
    }
    let mut lines = Vec::with_capacity(triangles.len() * 2);
    for tri in triangles.chunks_exact(FLOATS_PER_TRIANGLE) {
        let (a, b, c) = (&tri[0..3], &tri[3..6], &tri[6..9]);
        for (from, to) in [(a, b), (b, c), (c, a)] {
            lines.extend_from_slice(from);
            lines.extend_from_slice(to);
        }
    }
    Ok(lines)
}

/// Triangulated positions of every model in an OBJ file, concatenated.
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Vec<f32>, MeshError> {
    let path = path.as_ref();
    let (models, _materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)?;

    let mut positions = Vec::new();
    for model in &models {
        let mesh = &model.mesh;
        for &index in &mesh.indices {
            let start = index as usize * FLOATS_PER_VERTEX;
            let vertex = mesh
                .positions
                .get(start..start + FLOATS_PER_VERTEX)
                .ok_or(MeshError::Obj(tobj::LoadError::FaceVertexOutOfBounds))?;
            positions.extend_from_slice(vertex);
        }
    }
    debug!(
        "loaded {} models, {} vertices from {}",
        models.len(),
        positions.len() / FLOATS_PER_VERTEX,
        path.display()
    );
    Ok(positions)
}
