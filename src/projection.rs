//! Perspective projection onto the image plane.
//!
//! The camera looks down `-z`. A camera-space point `(x, y, z)` lands on the
//! viewport at
//!
//! ```text
//! sx = d * x / (d - z)
//! sy = d * y / (d - z)
//! ```
//!
//! where `d` is the eye-to-viewport distance. The returned `z` is the depth
//! `-z`, positive in front of the camera.

use crate::camera::DEFAULT_DISTANCE;
use crate::colour::ColourCode;
use crate::math::vec3::Vec3;
use crate::traversal::{CameraPrimitive, PrimitiveKind};

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Eye-to-viewport distance.
    distance: f64,
}

impl Default for Projection {
    fn default() -> Self {
        Self::new(DEFAULT_DISTANCE)
    }
}

/// A primitive projected onto the viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedPrimitive {
    pub owner: usize,
    pub colour: ColourCode,
    pub kind: PrimitiveKind,
    /// `(sx, sy, depth)` per outline vertex.
    pub points: Vec<Vec3>,
    /// Smallest camera-space z of the outline; more negative is farther away.
    pub min_z: f64,
}

impl Projection {
    pub fn new(distance: f64) -> Self {
        Self { distance }
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    #[inline]
    pub fn project(&self, p: Vec3) -> Vec3 {
        let d = self.distance;
        Vec3::new(d * p.x / (d - p.z), d * p.y / (d - p.z), -p.z)
    }

    /// Projects every primitive's outline.
    pub fn project_all(&self, primitives: &[CameraPrimitive]) -> Vec<ProjectedPrimitive> {
        primitives
            .iter()
            .map(|primitive| {
                let outline = primitive.outline();
                ProjectedPrimitive {
                    owner: primitive.owner,
                    colour: primitive.colour,
                    kind: primitive.kind,
                    points: outline.iter().map(|&p| self.project(p)).collect(),
                    min_z: outline.iter().map(|p| p.z).fold(f64::INFINITY, f64::min),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn projects_with_default_distance() {
        let projection = Projection::default();
        let p = projection.project(Vec3::new(0.5, -0.5, -99.0));
        assert_relative_eq!(p.x, 0.005, epsilon = 1e-12);
        assert_relative_eq!(p.y, -0.005, epsilon = 1e-12);
        assert_relative_eq!(p.z, 99.0, epsilon = 1e-12);
    }

    #[test]
    fn farther_points_shrink() {
        let projection = Projection::new(100.0);
        let near = projection.project(Vec3::new(1.0, 0.0, -10.0));
        let far = projection.project(Vec3::new(1.0, 0.0, -100.0));
        assert!(near.x > far.x);
        assert_relative_eq!(far.x, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn optional_lines_keep_only_line_points() {
        let primitive = CameraPrimitive {
            owner: 3,
            colour: ColourCode(0),
            kind: PrimitiveKind::OptionalLine,
            points: vec![
                Vec3::new(0.0, 0.0, -10.0),
                Vec3::new(1.0, 0.0, -20.0),
                Vec3::new(5.0, 5.0, -1.0),
                Vec3::new(5.0, 5.0, -300.0),
            ],
        };
        let projected = Projection::default().project_all(&[primitive]);
        assert_eq!(projected[0].points.len(), 2);
        assert_eq!(projected[0].owner, 3);
        assert_eq!(projected[0].min_z, -20.0);
    }
}
