//! Owned colour and depth buffers.
//!
//! Colours are packed as ARGB `u32`, `(a << 24) | (r << 16) | (g << 8) | b`.
//! The depth buffer stores the distance in front of the camera (camera-space
//! `-z`), so smaller values are closer. It starts at [`f32::MAX`].

use image::{Rgba, RgbaImage};

use crate::colour::Rgb;

/// Packs a colour and alpha into ARGB.
#[inline]
pub fn pack_argb(rgb: Rgb, alpha: u8) -> u32 {
    ((alpha as u32) << 24) | ((rgb.r as u32) << 16) | ((rgb.g as u32) << 8) | rgb.b as u32
}

/// Splits an ARGB value into `(r, g, b, a)`.
#[inline]
pub fn unpack_argb(color: u32) -> (u8, u8, u8, u8) {
    (
        (color >> 16) as u8,
        (color >> 8) as u8,
        color as u8,
        (color >> 24) as u8,
    )
}

/// Colour and depth for a `width * height` image.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    color_buffer: Vec<u32>,
    depth_buffer: Vec<f32>,
    width: u32,
    height: u32,
}

impl FrameBuffer {
    /// Creates a buffer cleared to `background`, or to fully transparent
    /// black when there is none.
    pub fn new(width: u32, height: u32, background: Option<Rgb>) -> Self {
        let clear = background.map(|rgb| pack_argb(rgb, 255)).unwrap_or(0);
        let len = (width as usize) * (height as usize);
        Self {
            color_buffer: vec![clear; len],
            depth_buffer: vec![f32::MAX; len],
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Whether a sample at `depth` would be visible at (x, y): `0 < depth <= stored`.
    #[inline]
    pub fn depth_test(&self, x: i32, y: i32, depth: f32) -> bool {
        self.index(x, y)
            .is_some_and(|idx| depth > 0.0 && depth <= self.depth_buffer[idx])
    }

    /// Writes colour and depth if the depth test passes.
    /// Silently ignores out-of-bounds coordinates.
    #[inline]
    pub fn set_pixel_with_depth(&mut self, x: i32, y: i32, depth: f32, color: u32) {
        if let Some(idx) = self.index(x, y) {
            if depth > 0.0 && depth <= self.depth_buffer[idx] {
                self.depth_buffer[idx] = depth;
                self.color_buffer[idx] = color;
            }
        }
    }

    /// Set a pixel without depth testing.
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if let Some(idx) = self.index(x, y) {
            self.color_buffer[idx] = color;
        }
    }

    /// Straight alpha blend `(1 - alpha) * dst + alpha * src` per channel.
    /// The result is opaque; the depth buffer is untouched.
    #[inline]
    pub fn blend_pixel(&mut self, x: i32, y: i32, rgb: Rgb, alpha: f32) {
        if let Some(idx) = self.index(x, y) {
            let (r, g, b, _) = unpack_argb(self.color_buffer[idx]);
            let mix = |dst: u8, src: u8| ((1.0 - alpha) * dst as f32 + alpha * src as f32) as u8;
            self.color_buffer[idx] = pack_argb(Rgb::new(mix(r, rgb.r), mix(g, rgb.g), mix(b, rgb.b)), 255);
        }
    }

    /// Get the color at (x, y), or None if out of bounds.
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|idx| self.color_buffer[idx])
    }

    /// Get the stored depth at (x, y), or None if out of bounds.
    #[inline]
    pub fn get_depth(&self, x: i32, y: i32) -> Option<f32> {
        self.index(x, y).map(|idx| self.depth_buffer[idx])
    }

    pub fn color_buffer(&self) -> &[u32] {
        &self.color_buffer
    }

    /// Copies the colour buffer into an RGBA image.
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let (r, g, b, a) = unpack_argb(self.color_buffer[(y * self.width + x) as usize]);
            Rgba([r, g, b, a])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_argb() {
        let packed = pack_argb(Rgb::new(0x12, 0x34, 0x56), 0x78);
        assert_eq!(packed, 0x7812_3456);
        assert_eq!(unpack_argb(packed), (0x12, 0x34, 0x56, 0x78));
    }

    #[test]
    fn clears_to_background_or_transparent() {
        let opaque = FrameBuffer::new(2, 2, Some(Rgb::new(10, 20, 30)));
        assert_eq!(opaque.get_pixel(1, 1), Some(0xFF0A_141E));
        let clear = FrameBuffer::new(2, 2, None);
        assert_eq!(clear.get_pixel(0, 0), Some(0));
        assert_eq!(clear.get_depth(0, 0), Some(f32::MAX));
        assert_eq!(clear.get_pixel(2, 0), None);
    }

    #[test]
    fn depth_test_keeps_nearest() {
        let mut fb = FrameBuffer::new(1, 1, None);
        fb.set_pixel_with_depth(0, 0, 10.0, 1);
        fb.set_pixel_with_depth(0, 0, 20.0, 2);
        assert_eq!(fb.get_pixel(0, 0), Some(1));
        fb.set_pixel_with_depth(0, 0, 10.0, 3);
        assert_eq!(fb.get_pixel(0, 0), Some(3));
        fb.set_pixel_with_depth(0, 0, 0.0, 4);
        fb.set_pixel_with_depth(0, 0, -1.0, 5);
        assert_eq!(fb.get_pixel(0, 0), Some(3));
        assert_eq!(fb.get_depth(0, 0), Some(10.0));
    }

    #[test]
    fn blend_is_straight_alpha_and_opaque() {
        let mut fb = FrameBuffer::new(1, 1, Some(Rgb::new(0, 0, 200)));
        fb.blend_pixel(0, 0, Rgb::new(255, 0, 0), 0.5);
        assert_eq!(unpack_argb(fb.get_pixel(0, 0).unwrap()), (127, 0, 100, 255));
        assert_eq!(fb.get_depth(0, 0), Some(f32::MAX));
    }

    #[test]
    fn exports_rgba_image() {
        let mut fb = FrameBuffer::new(3, 2, None);
        fb.set_pixel(2, 1, pack_argb(Rgb::new(1, 2, 3), 255));
        let image = fb.to_image();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(2, 1).0, [1, 2, 3, 255]);
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }
}
