//! Look-at camera.
//!
//! # Coordinate System
//!
//! Models use the LDraw convention: X right, **negative Y up**, Z towards the
//! viewer. The camera builds an orthonormal basis from its position and
//! look-at point:
//!
//! - `z`: from the look-at point back towards the camera
//! - `x`: `up × z`, where up is world `-Y`
//! - `y`: `z × x`
//!
//! In camera space the camera looks down `-z`, so anything with `z >= 0` is
//! behind (or level with) the eye.

use crate::error::ConfigError;
use crate::math::vec3::Vec3;

/// Default eye-to-viewport distance.
pub const DEFAULT_DISTANCE: f64 = 1.0;

/// Orthonormal camera axes expressed in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub x: Vec3,
    pub y: Vec3,
    pub z: Vec3,
}

impl CameraBasis {
    /// Builds the basis for a camera looking along `-z`.
    ///
    /// When `z` is parallel to world up, `x` falls back to `z × (1, 0, 0)`.
    pub fn from_z(z: Vec3) -> Self {
        let z = z.normalize();
        let mut x = Vec3::UP.cross(z);
        if x.magnitude() == 0.0 {
            x = z.cross(Vec3::RIGHT);
        }
        let x = x.normalize();
        let y = z.cross(x);
        Self { x, y, z }
    }

    /// Expresses an eye-relative vector in camera coordinates.
    #[inline]
    pub fn project(&self, v: Vec3) -> Vec3 {
        Vec3::new(v.dot(self.x), v.dot(self.y), v.dot(self.z))
    }
}

/// A camera placed at `position` and aimed at `look_at`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    position: Vec3,
    look_at: Vec3,
    distance: f64,
    basis: CameraBasis,
}

impl Camera {
    /// Creates a camera with the default viewport distance.
    ///
    /// Fails when `position == look_at`, since no viewing direction exists.
    pub fn new(position: Vec3, look_at: Vec3) -> Result<Self, ConfigError> {
        let direction = position - look_at;
        if direction.magnitude() == 0.0 {
            return Err(ConfigError::CameraAtLookAt);
        }
        Ok(Self {
            position,
            look_at,
            distance: DEFAULT_DISTANCE,
            basis: CameraBasis::from_z(direction),
        })
    }

    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn basis(&self) -> &CameraBasis {
        &self.basis
    }

    /// Converts a world-space point to camera space.
    #[inline]
    pub fn to_camera_space(&self, world: Vec3) -> Vec3 {
        self.basis.project(world - self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-9);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-9);
    }

    #[test]
    fn rejects_camera_at_look_at() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert!(matches!(
            Camera::new(p, p),
            Err(ConfigError::CameraAtLookAt)
        ));
    }

    #[test]
    fn basis_is_orthonormal() {
        let camera = Camera::new(Vec3::new(300.0, -200.0, 250.0), Vec3::ZERO).unwrap();
        let b = camera.basis();
        for axis in [b.x, b.y, b.z] {
            assert_relative_eq!(axis.magnitude(), 1.0, epsilon = 1e-9);
        }
        assert_relative_eq!(b.x.dot(b.y), 0.0, epsilon = 1e-9);
        assert_relative_eq!(b.y.dot(b.z), 0.0, epsilon = 1e-9);
        assert_relative_eq!(b.x.dot(b.z), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn camera_on_z_axis() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 100.0), Vec3::ZERO).unwrap();
        let b = camera.basis();
        assert_vec_eq(b.z, Vec3::new(0.0, 0.0, 1.0));
        assert_vec_eq(b.x, Vec3::new(-1.0, 0.0, 0.0));
        assert_vec_eq(b.y, Vec3::new(0.0, -1.0, 0.0));

        // The look-at point sits straight ahead.
        assert_vec_eq(camera.to_camera_space(Vec3::ZERO), Vec3::new(0.0, 0.0, -100.0));
    }

    #[test]
    fn looking_straight_down_uses_fallback_axis() {
        let camera = Camera::new(Vec3::new(0.0, -100.0, 0.0), Vec3::ZERO).unwrap();
        let b = camera.basis();
        assert_vec_eq(b.z, Vec3::new(0.0, -1.0, 0.0));
        assert_relative_eq!(b.x.magnitude(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(b.x.dot(b.z), 0.0, epsilon = 1e-9);
    }
}
