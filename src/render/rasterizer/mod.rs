//! Polygon rasterization.
//!
//! Polygons arrive in viewport coordinates: `(sx, sy)` on the image plane,
//! with `z` holding depth in front of the camera. The rasterizer maps them to
//! pixels with
//!
//! ```text
//! px = width / 2 + sx * scale
//! py = height / 2 - sy * scale      where scale = min(width, height)
//! ```

mod scanline;

pub use scanline::{ScanlineRasterizer, Z_MAX};

use super::framebuffer::FrameBuffer;
use crate::colour::Rgb;
use crate::math::vec3::Vec3;

/// A convex polygon ready for rasterization.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub points: Vec<Vec3>,
    pub rgb: Rgb,
    /// Opacity, 0.0..=1.0.
    pub alpha: f32,
}

impl Polygon {
    pub fn new(points: Vec<Vec3>, rgb: Rgb, alpha: f32) -> Self {
        Self { points, rgb, alpha }
    }

    pub fn is_opaque(&self) -> bool {
        self.alpha >= 1.0
    }
}

/// Options shared by every polygon of a render.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RasterOptions {
    /// Colour drawn at both ends of every span.
    pub stroke: Option<Rgb>,
    /// Only blend translucent pixels in front of the opaque image.
    /// The depth buffer is read but never written for translucent polygons.
    pub translucent_depth_test: bool,
}

/// Fills polygons into a frame buffer.
pub trait Rasterizer {
    fn fill_polygon(&self, polygon: &Polygon, buffer: &mut FrameBuffer);
}
