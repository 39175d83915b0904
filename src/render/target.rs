//! Colour and depth storage for the software device.
//!
//! A [`RenderTarget`] owns an ARGB colour buffer and a depth buffer of the same
//! size. Depth follows the OpenGL window convention: `0.0` is the near plane,
//! `1.0` the far plane, and a fragment passes when it is strictly closer
//! (`LESS`) than what is stored.

/// Packs a normalized RGBA colour into `0xAARRGGBB`.
pub fn pack_argb(rgba: [f32; 4]) -> u32 {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
    let [r, g, b, a] = rgba;
    (channel(a) << 24) | (channel(r) << 16) | (channel(g) << 8) | channel(b)
}

/// Packs tightly packed RGBA8 bytes into `0xAARRGGBB` words.
pub fn rgba_bytes_to_argb(pixels: &[u8]) -> Vec<u32> {
    pixels
        .chunks_exact(4)
        .map(|p| ((p[3] as u32) << 24) | ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
        .collect()
}

#[derive(Debug, Clone)]
pub struct RenderTarget {
    color: Vec<u32>,
    depth: Vec<f32>,
    width: u32,
    height: u32,
}

impl RenderTarget {
    pub const FAR_DEPTH: f32 = 1.0;

    pub fn new(width: u32, height: u32) -> Self {
        let size = width as usize * height as usize;
        Self {
            color: vec![0; size],
            depth: vec![Self::FAR_DEPTH; size],
            width,
            height,
        }
    }

    /// Reallocates both buffers; contents are lost.
    pub fn resize(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn clear_color(&mut self, color: u32) {
        self.color.fill(color);
    }

    pub fn clear_depth(&mut self) {
        self.depth.fill(Self::FAR_DEPTH);
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Writes `color` at (x, y) if `depth` passes the `LESS` test.
    ///
    /// Out-of-bounds coordinates and depths outside `[0, 1]` are ignored.
    #[inline]
    pub fn set_pixel_with_depth(&mut self, x: i32, y: i32, depth: f32, color: u32) {
        if !(0.0..=1.0).contains(&depth) {
            return;
        }
        if let Some(idx) = self.index(x, y) {
            if depth < self.depth[idx] {
                self.depth[idx] = depth;
                self.color[idx] = color;
            }
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.color[i])
    }

    pub fn depth(&self, x: i32, y: i32) -> Option<f32> {
        self.index(x, y).map(|i| self.depth[i])
    }

    pub fn pixels(&self) -> &[u32] {
        &self.color
    }

    /// Colour buffer as ARGB8888 bytes in native word order, as SDL expects.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.color.iter().flat_map(|c| c.to_ne_bytes()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_test_is_less() {
        let mut target = RenderTarget::new(2, 2);
        target.set_pixel_with_depth(0, 0, 0.5, 0xFF00FF00);
        target.set_pixel_with_depth(0, 0, 0.5, 0xFFFF0000);
        assert_eq!(target.pixel(0, 0), Some(0xFF00FF00));
        target.set_pixel_with_depth(0, 0, 0.25, 0xFFFF0000);
        assert_eq!(target.pixel(0, 0), Some(0xFFFF0000));
    }

    #[test]
    fn out_of_range_writes_are_ignored() {
        let mut target = RenderTarget::new(2, 2);
        target.set_pixel_with_depth(5, 0, 0.1, 1);
        target.set_pixel_with_depth(0, 0, -0.1, 1);
        target.set_pixel_with_depth(0, 0, 1.5, 1);
        assert!(target.pixels().iter().all(|&c| c == 0));
    }

    #[test]
    fn pack_argb_orders_channels() {
        assert_eq!(pack_argb([1.0, 0.0, 0.0, 1.0]), 0xFFFF0000);
        assert_eq!(rgba_bytes_to_argb(&[0, 0, 255, 128]), vec![0x800000FF]);
    }
}
