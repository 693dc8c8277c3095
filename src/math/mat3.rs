//! 3x3 rotation/scale matrix.
//!
//! # Convention
//! - Vectors are **column vectors** on the right: `Mat3 * Vec3`
//! - Translation is never stored here; pieces carry it as a separate position
//! - Transforms chain **right-to-left**: `A * B * v` applies B first, then A
//!
//! # Example
//! ```ignore
//! let turned = Mat3::identity().rotate(90.0, Axis::Y, AngleUnits::Degrees);
//! let result = turned * vertex;
//! ```

use std::ops::Mul;

use super::vec3::Vec3;

/// Value substituted for an exactly-zero diagonal entry by [`Mat3::fix_diagonal`].
pub const DIAGONAL_EPSILON: f64 = 1e-6;

/// Axis of rotation for [`Mat3::rotate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Units of the angle passed to [`Mat3::rotate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleUnits {
    #[default]
    Degrees,
    Radians,
}

/// 3x3 matrix stored as `rows[row][col]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    rows: [[f64; 3]; 3],
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat3 {
    pub const fn new(rows: [[f64; 3]; 3]) -> Self {
        Mat3 { rows }
    }

    pub const fn identity() -> Self {
        Mat3::new([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Builds a matrix from nine row-major values, the order used by
    /// sub-file reference records.
    pub fn from_row_major(values: [f64; 9]) -> Self {
        let [a, b, c, d, e, f, g, h, i] = values;
        Mat3::new([[a, b, c], [d, e, f], [g, h, i]])
    }

    /// Creates a rotation matrix around `axis`.
    pub fn rotation(angle: f64, axis: Axis, units: AngleUnits) -> Self {
        let radians = match units {
            AngleUnits::Degrees => angle.to_radians(),
            AngleUnits::Radians => angle,
        };
        let c = radians.cos();
        let s = radians.sin();
        match axis {
            Axis::X => Mat3::new([[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]]),
            Axis::Y => Mat3::new([[c, 0.0, -s], [0.0, 1.0, 0.0], [s, 0.0, c]]),
            Axis::Z => Mat3::new([[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]]),
        }
    }

    /// Returns `self * rotation`.
    ///
    /// The new rotation is applied to vectors before the existing transform,
    /// so chained calls must be written in the order they should take effect.
    pub fn rotate(&self, angle: f64, axis: Axis, units: AngleUnits) -> Self {
        *self * Mat3::rotation(angle, axis, units)
    }

    /// Returns `diag(sx, sy, sz) * self`.
    pub fn scale(&self, sx: f64, sy: f64, sz: f64) -> Self {
        Mat3::new([[sx, 0.0, 0.0], [0.0, sy, 0.0], [0.0, 0.0, sz]]) * *self
    }

    pub fn transpose(&self) -> Self {
        let r = &self.rows;
        Mat3::new([
            [r[0][0], r[1][0], r[2][0]],
            [r[0][1], r[1][1], r[2][1]],
            [r[0][2], r[1][2], r[2][2]],
        ])
    }

    /// Zero means the transform collapses space onto a plane, line or point.
    pub fn determinant(&self) -> f64 {
        let r = &self.rows;
        r[0][0] * (r[1][1] * r[2][2] - r[1][2] * r[2][1])
            + r[0][1] * (r[1][2] * r[2][0] - r[1][0] * r[2][2])
            + r[0][2] * (r[1][0] * r[2][1] - r[1][1] * r[2][0])
    }

    pub fn has_zero_diagonal(&self) -> bool {
        (0..3).any(|i| self.rows[i][i] == 0.0)
    }

    /// Replaces each exactly-zero diagonal entry with [`DIAGONAL_EPSILON`].
    ///
    /// This is a heuristic for consumers that reject flat (zero-scale)
    /// transforms; it is not a geometric correction and can leave the
    /// determinant at zero when whole rows are degenerate.
    pub fn fix_diagonal(&self) -> Self {
        let mut rows = self.rows;
        for (i, row) in rows.iter_mut().enumerate() {
            if row[i] == 0.0 {
                row[i] = DIAGONAL_EPSILON;
            }
        }
        Mat3::new(rows)
    }

    /// The nine entries in row-major order.
    pub fn flatten(&self) -> [f64; 9] {
        let r = &self.rows;
        [
            r[0][0], r[0][1], r[0][2], r[1][0], r[1][1], r[1][2], r[2][0], r[2][1], r[2][2],
        ]
    }

    pub fn rows(&self) -> &[[f64; 3]; 3] {
        &self.rows
    }

    /// Access element at [row][col].
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }
}

/// Matrix multiplication: Mat3 * Mat3.
impl Mul<Mat3> for Mat3 {
    type Output = Mat3;

    fn mul(self, rhs: Mat3) -> Self::Output {
        let mut result = [[0.0f64; 3]; 3];

        for (row, out) in result.iter_mut().enumerate() {
            for (col, value) in out.iter_mut().enumerate() {
                *value = self.rows[row][0] * rhs.rows[0][col]
                    + self.rows[row][1] * rhs.rows[1][col]
                    + self.rows[row][2] * rhs.rows[2][col];
            }
        }

        Mat3::new(result)
    }
}

/// Transform a vector: Mat3 * Vec3 (column vector).
impl Mul<Vec3> for Mat3 {
    type Output = Vec3;

    fn mul(self, v: Vec3) -> Self::Output {
        let r = &self.rows;
        Vec3::new(
            r[0][0] * v.x + r[0][1] * v.y + r[0][2] * v.z,
            r[1][0] * v.x + r[1][1] * v.y + r[1][2] * v.z,
            r[2][0] * v.x + r[2][1] * v.y + r[2][2] * v.z,
        )
    }
}
