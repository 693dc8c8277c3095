//! Rendering entry point.
//!
//! The [`Engine`] ties a part resolver, a colour table and a camera to the
//! three back ends. Every render walks the model again; nothing is cached
//! between calls except what the resolver itself keeps.
//!
//! ```text
//! Part ─► Flattener ─► Projection ─┬─► ScanlineRasterizer ─► RgbaImage
//!                                  └─► RegionAccumulator  ─► SVG
//! Part ─► SceneWriter ─────────────────────────────────────► POV-Ray
//! ```

use std::path::Path;

use image::RgbaImage;

use crate::camera::Camera;
use crate::colour::{ColourTable, Rgb};
use crate::config::RenderConfig;
use crate::error::{ConfigError, PartError, Result, Warnings};
use crate::library::PartResolver;
use crate::math::Vec2;
use crate::part::Part;
use crate::projection::{ProjectedPrimitive, Projection};
use crate::render::{
    BezierRegionOps, FrameBuffer, Polygon, RasterOptions, Rasterizer, ScanlineRasterizer,
    SceneOptions, SceneWriter, SvgOptions, SvgWriter,
};
use crate::traversal::{Flattened, Flattener};

/// Output of a render along with everything that was skipped on the way.
#[derive(Debug)]
pub struct Rendered<T> {
    pub output: T,
    pub warnings: Warnings,
}

/// Pixel size and background of a raster image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageTarget {
    pub width: u32,
    pub height: u32,
    /// Transparent when `None`.
    pub background: Option<Rgb>,
}

impl ImageTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: None,
        }
    }

    pub fn with_background(mut self, background: Rgb) -> Self {
        self.background = Some(background);
        self
    }
}

pub struct Engine<R> {
    resolver: R,
    colours: ColourTable,
    camera: Camera,
}

impl<R: PartResolver> Engine<R> {
    pub fn new(resolver: R, colours: ColourTable, camera: Camera) -> Self {
        Self {
            resolver,
            colours,
            camera,
        }
    }

    /// Creates an engine with the camera described by `config`.
    pub fn from_config(
        resolver: R,
        colours: ColourTable,
        config: &RenderConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(resolver, colours, config.camera()?))
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn colours(&self) -> &ColourTable {
        &self.colours
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    /// Resolves `model` into camera-space primitives.
    pub fn flatten(&self, model: &Part) -> std::result::Result<Flattened, PartError> {
        let flattened = Flattener::new(&self.resolver, &self.camera).flatten(model)?;
        log::debug!(
            "flatten: {} primitives, {} lights, {} warnings",
            flattened.primitives.len(),
            flattened.lights.len(),
            flattened.warnings.len()
        );
        Ok(flattened)
    }

    /// Flattens and projects `model` onto the viewport.
    pub fn project(
        &self,
        model: &Part,
    ) -> std::result::Result<Rendered<Vec<ProjectedPrimitive>>, PartError> {
        let flattened = self.flatten(model)?;
        let projected =
            Projection::new(self.camera.distance()).project_all(&flattened.primitives);
        Ok(Rendered {
            output: projected,
            warnings: flattened.warnings,
        })
    }

    /// Z-buffered raster image of the filled primitives.
    ///
    /// Opaque polygons are drawn first, then translucent ones in model
    /// order. Translucent polygons are not sorted by depth.
    pub fn render_raster(
        &self,
        model: &Part,
        target: ImageTarget,
        options: RasterOptions,
    ) -> Result<Rendered<RgbaImage>> {
        let ImageTarget {
            width,
            height,
            background,
        } = target;
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidImageSize { width, height }.into());
        }

        let Rendered { output, warnings } = self.project(model)?;
        let (opaque, translucent): (Vec<Polygon>, Vec<Polygon>) = output
            .into_iter()
            .filter(|p| p.kind.is_filled())
            .map(|p| {
                let alpha = self.colours.alpha(p.colour) as f32 / 255.0;
                Polygon::new(p.points, self.colours.rgb(p.colour), alpha)
            })
            .partition(Polygon::is_opaque);
        log::debug!(
            "raster: {} opaque, {} translucent polygons into {}x{}",
            opaque.len(),
            translucent.len(),
            width,
            height
        );

        let rasterizer = ScanlineRasterizer::with_options(options);
        let mut buffer = FrameBuffer::new(width, height, background);
        for polygon in opaque.iter().chain(translucent.iter()) {
            rasterizer.fill_polygon(polygon, &mut buffer);
        }

        Ok(Rendered {
            output: buffer.to_image(),
            warnings,
        })
    }

    /// Renders a raster image and saves it as PNG.
    pub fn write_png(
        &self,
        model: &Part,
        path: impl AsRef<Path>,
        target: ImageTarget,
        options: RasterOptions,
    ) -> Result<Warnings> {
        let Rendered { output, warnings } = self.render_raster(model, target, options)?;
        output.save_with_format(path.as_ref(), image::ImageFormat::Png)?;
        log::debug!("png: wrote {}", path.as_ref().display());
        Ok(warnings)
    }

    /// SVG document of the visible regions of every filled primitive.
    pub fn render_svg(&self, model: &Part, options: SvgOptions) -> Result<Rendered<String>> {
        let Rendered { output, warnings } = self.project(model)?;
        let ops = region_ops(&output, &options);
        log::debug!("svg: region scale {}", ops.scale());
        let svg = SvgWriter::new(ops, &self.colours, options).render(&output)?;
        Ok(Rendered {
            output: svg,
            warnings,
        })
    }

    /// POV-Ray scene with one declaration per distinct part.
    ///
    /// Works in model coordinates; the engine camera is only written out when
    /// `options.camera` asks for it.
    pub fn render_scene(&self, model: &Part, options: SceneOptions) -> Result<Rendered<String>> {
        let (output, warnings) =
            SceneWriter::new(&self.resolver, &self.colours, options).render(model)?;
        Ok(Rendered { output, warnings })
    }
}

/// Region arithmetic fitted to the filled primitives in document space.
fn region_ops(projected: &[ProjectedPrimitive], options: &SvgOptions) -> BezierRegionOps {
    BezierRegionOps::fitted_to(
        projected
            .iter()
            .filter(|p| p.kind.is_filled())
            .flat_map(|p| p.points.iter())
            .map(|p| options.to_document(Vec2::new(p.x, p.y))),
    )
}
