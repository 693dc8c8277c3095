//! Geometry value types shared by every stage of the pipeline.

pub mod mat3;
pub mod vec2;
pub mod vec3;

pub use mat3::{AngleUnits, Axis, Mat3};
pub use vec2::Vec2;
pub use vec3::Vec3;
