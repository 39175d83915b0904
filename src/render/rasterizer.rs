//! Primitive rasterization into a [`RenderTarget`].
//!
//! Vertices arrive in window space: `x`/`y` in pixels, `z` as window depth in
//! `[0, 1]`. Depth is affine in screen space after the perspective divide, so
//! it is interpolated linearly.
//!
//! Triangles use the edge function algorithm (Pineda 1988): every pixel centre
//! inside the bounding box is tested against the three edge equations
//!
//! ```text
//! E(P) = (P.x - A.x) * (B.y - A.y) - (P.y - A.y) * (B.x - A.x)
//! ```
//!
//! and is covered when all three share the sign of the triangle's area. Lines
//! use Bresenham's integer algorithm.

use super::target::RenderTarget;
use crate::math::Vec3;

/// Pixel rectangle primitives are clipped to (the active viewport).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

#[inline]
fn edge_function(a: Vec3, b: Vec3, p: Vec3) -> f32 {
    (p.x - a.x) * (b.y - a.y) - (p.y - a.y) * (b.x - a.x)
}

/// Fills a triangle with a flat colour, depth tested.
///
/// Handles both windings. Degenerate (zero-area) triangles produce nothing.
pub fn fill_triangle(target: &mut RenderTarget, clip: ClipRect, v: [Vec3; 3], color: u32) {
    let [v0, v1, v2] = v;

    let min_x = (v0.x.min(v1.x).min(v2.x).floor() as i32).max(clip.min_x);
    let max_x = (v0.x.max(v1.x).max(v2.x).ceil() as i32).min(clip.max_x);
    let min_y = (v0.y.min(v1.y).min(v2.y).floor() as i32).max(clip.min_y);
    let max_y = (v0.y.max(v1.y).max(v2.y).ceil() as i32).min(clip.max_y);

    let area = edge_function(v0, v1, v2);
    if area.abs() < f32::EPSILON {
        return;
    }
    let inv_area = 1.0 / area;

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            // Sample at pixel centre
            let p = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, 0.0);

            let w0 = edge_function(v1, v2, p);
            let w1 = edge_function(v2, v0, p);
            let w2 = edge_function(v0, v1, p);

            let inside = if area > 0.0 {
                w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
            } else {
                w0 <= 0.0 && w1 <= 0.0 && w2 <= 0.0
            };

            if inside {
                let depth = (w0 * v0.z + w1 * v1.z + w2 * v2.z) * inv_area;
                target.set_pixel_with_depth(x, y, depth, color);
            }
        }
    }
}

/// Parameter range `[t0, t1]` of the segment `a + t * (b - a)` that lies inside
/// `clip` (Liang-Barsky). Works in f64 so far-away endpoints keep precision.
fn clip_segment(a: Vec3, b: Vec3, clip: ClipRect) -> Option<(f64, f64)> {
    if clip.min_x > clip.max_x || clip.min_y > clip.max_y {
        return None;
    }
    let (x0, y0) = (a.x as f64, a.y as f64);
    let (dx, dy) = (b.x as f64 - x0, b.y as f64 - y0);
    if !(x0.is_finite() && y0.is_finite() && dx.is_finite() && dy.is_finite()) {
        return None;
    }
    // Pixel (x, y) covers [x, x + 1)
    let (min_x, max_x) = (clip.min_x as f64, clip.max_x as f64 + 1.0);
    let (min_y, max_y) = (clip.min_y as f64, clip.max_y as f64 + 1.0);

    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [(-dx, x0 - min_x), (dx, max_x - x0), (-dy, y0 - min_y), (dy, max_y - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((t0, t1))
}

/// Draws a one pixel wide line, depth tested.
///
/// The segment is clipped to `clip` first, so endpoints far outside the
/// target cost nothing.
pub fn draw_line(target: &mut RenderTarget, clip: ClipRect, a: Vec3, b: Vec3, color: u32) {
    let Some((t0, t1)) = clip_segment(a, b, clip) else {
        return;
    };
    let pixel_at = |t: f64| -> (i32, i32, f32) {
        let x = a.x as f64 + t * (b.x as f64 - a.x as f64);
        let y = a.y as f64 + t * (b.y as f64 - a.y as f64);
        (
            (x.floor() as i64).clamp(clip.min_x as i64, clip.max_x as i64) as i32,
            (y.floor() as i64).clamp(clip.min_y as i64, clip.max_y as i64) as i32,
            a.z + t as f32 * (b.z - a.z),
        )
    };
    let (x0, y0, z0) = pixel_at(t0);
    let (x1, y1, z1) = pixel_at(t1);

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let steps = dx.max(dy).max(1);

    let x_step = if x0 < x1 { 1 } else { -1 };
    let y_step = if y0 < y1 { 1 } else { -1 };

    // Positive error favours x movement, negative favours y.
    let mut err = dx - dy;
    let (mut x, mut y) = (x0, y0);
    let mut step = 0;

    loop {
        let t = step as f32 / steps as f32;
        target.set_pixel_with_depth(x, y, z0 + t * (z1 - z0), color);
        if x == x1 && y == y1 {
            break;
        }
        step += 1;

        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += x_step;
        }
        if e2 < dx {
            err += dx;
            y += y_step;
        }
    }
}
