//! Render configuration.
//!
//! Settings live in TOML files:
//!
//! ```toml
//! [camera]
//! position = [0.0, -200.0, 400.0]
//! look_at = [0.0, 0.0, 0.0]
//! distance = 1.0
//!
//! [image]
//! width = 800
//! height = 600
//! background = "#ffffff"
//! stroke = "#000000"
//!
//! [scene]
//! sky = "#87ceeb"
//! ```
//!
//! Missing sections and keys fall back to [`RenderConfig::default`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::{Camera, DEFAULT_DISTANCE};
use crate::colour::Rgb;
use crate::error::ConfigError;
use crate::math::Vec3;
use crate::render::{RasterOptions, SceneOptions, SvgOptions};

/// Serializable settings with TOML file persistence.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !is_toml(path) {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if !is_toml(path) {
            return Err(ConfigError::UnsupportedFormat(path.display().to_string()));
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "toml")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f64; 3],
    pub look_at: [f64; 3],
    pub distance: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, -200.0, 400.0],
            look_at: [0.0, 0.0, 0.0],
            distance: DEFAULT_DISTANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Rgb>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Rgb>,
    /// Hide translucent pixels behind opaque ones.
    pub translucent_depth_test: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            background: None,
            stroke: None,
            translucent_depth_test: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sky: Option<Rgb>,
    /// Emit a `camera` statement from the camera settings.
    pub camera: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub camera: CameraConfig,
    pub image: ImageConfig,
    pub scene: SceneConfig,
}

impl Config for RenderConfig {}

impl RenderConfig {
    /// Checks everything that can be checked before rendering.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.camera()?;
        self.image_size()?;
        Ok(())
    }

    /// Camera from the `[camera]` section. The distance must be positive
    /// and finite.
    pub fn camera(&self) -> Result<Camera, ConfigError> {
        let distance = self.camera.distance;
        if !(distance.is_finite() && distance > 0.0) {
            return Err(ConfigError::InvalidDistance(distance));
        }
        let camera = Camera::new(
            Vec3::from(self.camera.position),
            Vec3::from(self.camera.look_at),
        )?;
        Ok(camera.with_distance(distance))
    }

    /// Image size in pixels; both sides must be non-zero.
    pub fn image_size(&self) -> Result<(u32, u32), ConfigError> {
        let ImageConfig { width, height, .. } = self.image;
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidImageSize { width, height });
        }
        Ok((width, height))
    }

    pub fn raster_options(&self) -> RasterOptions {
        RasterOptions {
            stroke: self.image.stroke,
            translucent_depth_test: self.image.translucent_depth_test,
        }
    }

    /// SVG documents use the image size as centimetres.
    pub fn svg_options(&self) -> Result<SvgOptions, ConfigError> {
        let (width, height) = self.image_size()?;
        Ok(SvgOptions {
            width: width as f64,
            height: height as f64,
            background: self.image.background,
        })
    }

    pub fn scene_options(&self) -> Result<SceneOptions, ConfigError> {
        let camera = if self.scene.camera {
            Some(self.camera()?)
        } else {
            None
        };
        Ok(SceneOptions {
            camera,
            sky: self.scene.sky,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = RenderConfig::from_toml(
            r##"
            [camera]
            position = [0.0, 0.0, 100.0]
            distance = 100.0

            [image]
            width = 10
            height = 10
            background = "#FFFFFF"
            "##,
        )
        .unwrap();
        assert_eq!(config.image.width, 10);
        assert_eq!(config.image.background, Some(Rgb::new(255, 255, 255)));
        assert_eq!(config.image.stroke, None);
        assert_eq!(config.camera.look_at, [0.0, 0.0, 0.0]);

        let camera = config.camera().unwrap();
        assert_relative_eq!(camera.distance(), 100.0);
        assert_relative_eq!(camera.position().z, 100.0);
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = RenderConfig::default();
        config.image.stroke = Some(Rgb::new(0, 0, 0));
        config.scene.sky = Some(Rgb::new(0x87, 0xce, 0xeb));
        let text = config.to_toml().unwrap();
        assert!(text.contains("stroke = \"#000000\""));
        assert_eq!(RenderConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn rejects_bad_values() {
        let bad_colour = RenderConfig::from_toml("[image]\nbackground = \"white\"\n");
        assert!(matches!(bad_colour, Err(ConfigError::Parse(_))));

        let mut config = RenderConfig::default();
        config.image.width = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidImageSize { width: 0, height: 600 })
        ));

        let mut config = RenderConfig::default();
        config.camera.look_at = config.camera.position;
        assert!(matches!(config.camera(), Err(ConfigError::CameraAtLookAt)));
    }

    #[test]
    fn file_extension_must_be_toml() {
        let dir = std::env::temp_dir();
        let result = RenderConfig::default().save_to_file(dir.join("bricklayer.json"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));

        let path = dir.join(format!("bricklayer-{}.toml", std::process::id()));
        let config = RenderConfig::default();
        config.save_to_file(&path).unwrap();
        let loaded = RenderConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn backend_options_follow_settings() {
        let mut config = RenderConfig::default();
        config.image.translucent_depth_test = true;
        config.scene.camera = true;
        assert!(config.raster_options().translucent_depth_test);
        let svg = config.svg_options().unwrap();
        assert_relative_eq!(svg.width, 800.0);
        assert!(config.scene_options().unwrap().camera.is_some());
        assert!(RenderConfig::default().scene_options().unwrap().camera.is_none());
    }

    #[test]
    fn camera_distance_must_be_positive_and_finite() {
        for distance in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut config = RenderConfig::default();
            config.camera.distance = distance;
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidDistance(_))
            ));
        }

        let config = RenderConfig::from_toml("[camera]\ndistance = -5.0\n").unwrap();
        assert!(matches!(
            config.camera(),
            Err(ConfigError::InvalidDistance(d)) if d == -5.0
        ));
    }
}
