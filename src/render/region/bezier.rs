//! Region arithmetic on bezier paths.

use flo_curves::bezier::path::{path_add, path_intersect, path_sub, SimpleBezierPath};
use flo_curves::{Coord2, Coordinate2D};

use super::RegionOps;
use crate::math::Vec2;

/// Side of the square that fitted geometry is scaled into.
const WORKING_SIZE: f64 = 1000.0;

/// Max distance in working units between points that are considered the same
/// during path arithmetic.
const ACCURACY: f64 = 0.01;

/// Paths with less area than this, in working units, count as empty.
const AREA_EPSILON: f64 = 1e-6;

/// [`RegionOps`] backed by `flo_curves` path arithmetic.
///
/// Regions are lists of closed paths made of straight segments, stored in
/// working coordinates `(p - origin) * scale`. [`BezierRegionOps::fitted_to`]
/// picks the origin and scale so the geometry spans [`WORKING_SIZE`] units,
/// which keeps the arithmetic tolerances proportional to the input whatever
/// its magnitude. [`RegionOps::outlines`] maps back to input coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierRegionOps {
    origin: Vec2,
    scale: f64,
}

impl Default for BezierRegionOps {
    fn default() -> Self {
        Self::new()
    }
}

impl BezierRegionOps {
    /// Works directly in input coordinates.
    pub fn new() -> Self {
        Self {
            origin: Vec2::default(),
            scale: 1.0,
        }
    }

    /// Fits the working range to the bounding box of `points`.
    ///
    /// Falls back to [`BezierRegionOps::new`] when there are no points, and
    /// to a unit scale when the box has no finite extent.
    pub fn fitted_to(points: impl IntoIterator<Item = Vec2>) -> Self {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return Self::new();
        };
        let (min, max) = points.fold((first, first), |(min, max), p| {
            (
                Vec2::new(min.x.min(p.x), min.y.min(p.y)),
                Vec2::new(max.x.max(p.x), max.y.max(p.y)),
            )
        });
        let extent = (max.x - min.x).max(max.y - min.y);
        let scale = if extent.is_finite() && extent > 0.0 {
            WORKING_SIZE / extent
        } else {
            1.0
        };
        Self { origin: min, scale }
    }

    /// Working units per input unit.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    fn to_working(&self, p: &Vec2) -> Coord2 {
        Coord2(
            (p.x - self.origin.x) * self.scale,
            (p.y - self.origin.y) * self.scale,
        )
    }

    fn from_working(&self, c: &Coord2) -> Vec2 {
        Vec2::new(
            c.x() / self.scale + self.origin.x,
            c.y() / self.scale + self.origin.y,
        )
    }

    /// A straight segment as a cubic with control points on the line.
    fn line_to(from: Coord2, to: Coord2) -> (Coord2, Coord2, Coord2) {
        let third = |t: f64| {
            Coord2(
                from.x() + (to.x() - from.x()) * t,
                from.y() + (to.y() - from.y()) * t,
            )
        };
        (third(1.0 / 3.0), third(2.0 / 3.0), to)
    }

    /// Signed shoelace area over the segment end points.
    fn area(path: &SimpleBezierPath) -> f64 {
        let (start, segments) = path;
        let mut previous = *start;
        let mut twice_area = 0.0;
        for (_, _, end) in segments {
            twice_area += previous.x() * end.y() - end.x() * previous.y();
            previous = *end;
        }
        twice_area += previous.x() * start.y() - start.x() * previous.y();
        twice_area / 2.0
    }
}

impl RegionOps for BezierRegionOps {
    type Region = Vec<SimpleBezierPath>;

    fn empty(&self) -> Self::Region {
        Vec::new()
    }

    fn polygon(&self, points: &[Vec2]) -> Self::Region {
        let Some(first) = points.first() else {
            return Vec::new();
        };
        let start = self.to_working(first);
        let mut previous = start;
        let mut segments = Vec::with_capacity(points.len());
        for p in points[1..].iter() {
            let next = self.to_working(p);
            segments.push(Self::line_to(previous, next));
            previous = next;
        }
        segments.push(Self::line_to(previous, start));
        vec![(start, segments)]
    }

    fn union(&self, a: &Self::Region, b: &Self::Region) -> Self::Region {
        if self.is_empty(a) {
            return b.clone();
        }
        if self.is_empty(b) {
            return a.clone();
        }
        path_add(a, b, ACCURACY)
    }

    fn intersect(&self, a: &Self::Region, b: &Self::Region) -> Self::Region {
        if self.is_empty(a) || self.is_empty(b) {
            return Vec::new();
        }
        path_intersect(a, b, ACCURACY)
    }

    fn subtract(&self, a: &Self::Region, b: &Self::Region) -> Self::Region {
        if self.is_empty(a) || self.is_empty(b) {
            return a.clone();
        }
        path_sub(a, b, ACCURACY)
    }

    fn contains(&self, outer: &Self::Region, inner: &Self::Region) -> bool {
        if self.is_empty(inner) {
            return true;
        }
        if self.is_empty(outer) {
            return false;
        }
        if inner == outer {
            return true;
        }
        self.is_empty(&self.subtract(inner, outer))
    }

    fn is_empty(&self, region: &Self::Region) -> bool {
        region.iter().all(|p| Self::area(p).abs() < AREA_EPSILON)
    }

    fn outlines(&self, region: &Self::Region) -> Vec<Vec<Vec2>> {
        region
            .iter()
            .filter(|path| Self::area(path).abs() >= AREA_EPSILON)
            .map(|(start, segments)| {
                std::iter::once(start)
                    .chain(segments.iter().map(|(_, _, end)| end))
                    .map(|c| self.from_working(c))
                    .collect()
            })
            .collect()
    }
}
