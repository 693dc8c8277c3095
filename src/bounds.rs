//! Axis-aligned bounding boxes of parts and models.

use std::collections::{HashMap, HashSet};

use crate::error::PartError;
use crate::library::PartResolver;
use crate::math::{Mat3, Vec3};
use crate::part::{Part, Primitive};

/// An axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Smallest box containing all `points`; `None` when there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = Bounds::from_point(*points.next()?);
        Some(points.fold(first, |b, p| b.include(*p)))
    }

    pub fn include(self, p: Vec3) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    pub fn union(self, other: Bounds) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Box around this box after `matrix * p + position`.
    pub fn transformed(&self, matrix: Mat3, position: Vec3) -> Self {
        let corners = self.corners().map(|c| matrix * c + position);
        let first = Bounds::from_point(corners[0]);
        corners[1..].iter().fold(first, |b, p| b.include(*p))
    }
}

fn merge(acc: Option<Bounds>, next: Option<Bounds>) -> Option<Bounds> {
    match (acc, next) {
        (Some(a), Some(b)) => Some(a.union(b)),
        (a, b) => a.or(b),
    }
}

/// Local bounds per part code, computed once.
///
/// Unknown parts and cyclic references contribute nothing.
#[derive(Debug, Default)]
pub struct BoundsCache {
    parts: HashMap<String, Option<Bounds>>,
    visiting: HashSet<String>,
}

impl BoundsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds of a part in its own coordinates.
    pub fn part_bounds<R: PartResolver + ?Sized>(
        &mut self,
        code: &str,
        resolver: &R,
    ) -> Result<Option<Bounds>, PartError> {
        if let Some(bounds) = self.parts.get(code) {
            return Ok(*bounds);
        }
        if !self.visiting.insert(code.to_string()) {
            return Ok(None);
        }
        let bounds = match resolver.resolve(code) {
            Ok(Some(part)) => self.records_bounds(&part, resolver),
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        };
        self.visiting.remove(code);
        let bounds = bounds?;
        self.parts.insert(code.to_string(), bounds);
        Ok(bounds)
    }

    /// Bounds of a whole model, in model coordinates. Lights are ignored.
    pub fn model_bounds<R: PartResolver + ?Sized>(
        &mut self,
        model: &Part,
        resolver: &R,
    ) -> Result<Option<Bounds>, PartError> {
        self.records_bounds(model, resolver)
    }

    fn records_bounds<R: PartResolver + ?Sized>(
        &mut self,
        part: &Part,
        resolver: &R,
    ) -> Result<Option<Bounds>, PartError> {
        let mut acc = None;
        for record in part.records() {
            let next = match record {
                Primitive::Subpart(piece) if piece.is_light() => None,
                Primitive::Subpart(piece) => self
                    .part_bounds(piece.code(), resolver)?
                    .map(|b| b.transformed(piece.matrix, piece.position)),
                Primitive::Line { points, .. } | Primitive::OptionalLine { points, .. } => {
                    Bounds::from_points(points)
                }
                Primitive::Triangle { points, .. } => Bounds::from_points(points),
                Primitive::Quadrilateral { points, .. } => Bounds::from_points(points),
                Primitive::Meta { .. } | Primitive::Comment(_) => None,
            };
            acc = merge(acc, next);
        }
        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::ColourCode;
    use crate::library::PartLibrary;
    use crate::piece::Piece;

    fn unit_triangle() -> Part {
        Part::new(vec![Primitive::Triangle {
            colour: ColourCode(16),
            points: [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 1.0),
            ],
        }])
    }

    #[test]
    fn nested_parts_are_transformed() {
        let library = PartLibrary::new().with("T", unit_triangle());
        let model = Part::new(vec![
            Primitive::Subpart(Piece::new(
                ColourCode(4),
                Vec3::new(10.0, 0.0, 0.0),
                Mat3::identity().scale(2.0, 2.0, 2.0),
                "T",
            )),
            Primitive::Subpart(Piece::light(ColourCode(15), Vec3::new(500.0, 0.0, 0.0))),
        ]);

        let mut cache = BoundsCache::new();
        let bounds = cache.model_bounds(&model, &library).unwrap().unwrap();
        assert_eq!(bounds.min, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(12.0, 2.0, 2.0));
        assert_eq!(cache.part_bounds("T", &library).unwrap().unwrap().max, Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn empty_and_cyclic_parts_have_no_bounds() {
        let reference = |code: &str| {
            Primitive::Subpart(Piece::new(ColourCode(16), Vec3::ZERO, Mat3::identity(), code))
        };
        let library = PartLibrary::new()
            .with("A", Part::new(vec![reference("B")]))
            .with("B", Part::new(vec![reference("A")]));
        let mut cache = BoundsCache::new();
        assert_eq!(cache.part_bounds("A", &library).unwrap(), None);
        assert_eq!(cache.part_bounds("MISSING", &library).unwrap(), None);
    }
}
