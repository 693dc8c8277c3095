//! Output back ends.
//!
//! - [`rasterizer`]: z-buffered scanline fill into a [`FrameBuffer`]
//! - [`region`] and [`svg`]: visible regions by boolean path arithmetic
//! - [`scene`]: deduplicated POV-Ray scene text

pub mod framebuffer;
pub mod rasterizer;
pub mod region;
pub mod scene;
pub mod svg;

pub use framebuffer::{pack_argb, unpack_argb, FrameBuffer};
pub use rasterizer::{Polygon, RasterOptions, Rasterizer, ScanlineRasterizer, Z_MAX};
pub use region::{BezierRegionOps, ObjectFills, RegionAccumulator, RegionOps};
pub use scene::{SceneOptions, SceneWriter};
pub use svg::{SvgOptions, SvgWriter};
