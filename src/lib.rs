//! Renders hierarchical brick models on the CPU.
//!
//! A model is a [`Part`] whose records reference other parts by code. The
//! [`Engine`] resolves those references through a [`PartResolver`], then
//! renders the result as a z-buffered raster image, an SVG document of the
//! visible regions, or a POV-Ray scene.
//!
//! # Quick Start
//!
//! ```ignore
//! use bricklayer::prelude::*;
//!
//! let library = PartLibrary::new().with("3001", brick);
//! let camera = Camera::new(Vec3::new(0.0, -200.0, 400.0), Vec3::ZERO)?;
//! let engine = Engine::new(library, ColourTable::default(), camera);
//! let warnings = engine.write_png(&model, "model.png", ImageTarget::new(800, 600), RasterOptions::default())?;
//! ```

// Public API - exposed to library consumers
pub mod bounds;
pub mod camera;
pub mod colour;
pub mod config;
pub mod engine;
pub mod error;
pub mod library;
pub mod math;
pub mod part;
pub mod piece;
pub mod projection;
pub mod render;
pub mod traversal;

// Re-export commonly needed types at crate root for convenience
pub use camera::Camera;
pub use colour::{Colour, ColourCode, ColourTable, Rgb};
pub use config::{Config, RenderConfig};
pub use engine::{Engine, ImageTarget, Rendered};
pub use error::{ConfigError, PartError, RenderError, Warning, Warnings};
pub use library::{PartCache, PartLibrary, PartResolver, PartSource};
pub use part::{Part, Primitive};
pub use piece::{Group, Piece};
pub use projection::Projection;

/// Prelude module for convenient imports.
///
/// # Example
/// ```ignore
/// use bricklayer::prelude::*;
/// ```
pub mod prelude {
    // Camera
    pub use crate::camera::Camera;

    // Colours
    pub use crate::colour::{Colour, ColourAttributes, ColourCode, ColourTable, Rgb};

    // Configuration
    pub use crate::config::{Config, RenderConfig};

    // Engine
    pub use crate::engine::{Engine, ImageTarget, Rendered};

    // Errors
    pub use crate::error::{ConfigError, PartError, RenderError, Warning, Warnings};

    // Model
    pub use crate::library::{PartCache, PartLibrary, PartResolver, PartSource};
    pub use crate::part::{Part, Primitive};
    pub use crate::piece::{Group, Piece};

    // Math
    pub use crate::math::mat3::{AngleUnits, Axis, Mat3};
    pub use crate::math::vec2::Vec2;
    pub use crate::math::vec3::Vec3;

    // Rendering
    pub use crate::render::{RasterOptions, SceneOptions, SvgOptions};
}

/// Module exposing internals for benchmarking. Not part of the stable API.
pub mod bench {
    pub use crate::render::{FrameBuffer, Polygon, Rasterizer, ScanlineRasterizer};
}
