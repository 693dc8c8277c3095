//! Occlusion by region arithmetic.
//!
//! Vector output has no depth buffer. Instead every polygon is clipped
//! against the union of everything nearer that was already drawn, so each
//! object ends up with only its visible area:
//!
//! ```text
//! for polygon, nearest first:
//!     if drawn contains polygon: skip
//!     remainder = polygon - (polygon ∩ drawn)
//!     drawn    ∪= remainder
//!     fill[object, colour] ∪= remainder
//! ```
//!
//! The set operations live behind [`RegionOps`] so any planar boolean
//! implementation can be plugged in; [`BezierRegionOps`] is the default.

mod bezier;

pub use bezier::BezierRegionOps;

use std::collections::HashMap;

use crate::colour::ColourCode;
use crate::math::Vec2;
use crate::projection::ProjectedPrimitive;

/// Planar boolean operations over some region representation.
pub trait RegionOps {
    type Region: Clone;

    fn empty(&self) -> Self::Region;

    /// Region enclosed by a closed outline.
    fn polygon(&self, points: &[Vec2]) -> Self::Region;

    fn union(&self, a: &Self::Region, b: &Self::Region) -> Self::Region;
    fn intersect(&self, a: &Self::Region, b: &Self::Region) -> Self::Region;
    fn subtract(&self, a: &Self::Region, b: &Self::Region) -> Self::Region;

    /// Whether `inner` lies entirely within `outer`.
    fn contains(&self, outer: &Self::Region, inner: &Self::Region) -> bool;

    fn is_empty(&self, region: &Self::Region) -> bool;

    /// Closed outlines describing the region.
    fn outlines(&self, region: &Self::Region) -> Vec<Vec<Vec2>>;
}

/// Visible fills of one top-level object.
#[derive(Debug, Clone)]
pub struct ObjectFills<R> {
    pub owner: usize,
    /// Colour to region, in order of first contribution.
    pub fills: Vec<(ColourCode, R)>,
}

/// Accumulates visible regions polygon by polygon, nearest first.
pub struct RegionAccumulator<O: RegionOps> {
    ops: O,
    drawn: O::Region,
    objects: Vec<ObjectFills<O::Region>>,
    by_owner: HashMap<usize, usize>,
}

impl<O: RegionOps> RegionAccumulator<O> {
    pub fn new(ops: O) -> Self {
        let drawn = ops.empty();
        Self {
            ops,
            drawn,
            objects: Vec::new(),
            by_owner: HashMap::new(),
        }
    }

    /// Adds one polygon. Returns whether any of it is visible.
    ///
    /// Everything added earlier is treated as nearer.
    pub fn add(&mut self, owner: usize, colour: ColourCode, points: &[Vec2]) -> bool {
        let polygon = self.ops.polygon(points);
        if self.ops.contains(&self.drawn, &polygon) {
            return false;
        }

        let hidden = self.ops.intersect(&polygon, &self.drawn);
        let remainder = self.ops.subtract(&polygon, &hidden);
        if self.ops.is_empty(&remainder) {
            return false;
        }
        self.drawn = self.ops.union(&self.drawn, &remainder);

        let next = self.objects.len();
        let slot = *self.by_owner.entry(owner).or_insert(next);
        if slot == next {
            self.objects.push(ObjectFills {
                owner,
                fills: Vec::new(),
            });
        }
        let fills = &mut self.objects[slot].fills;
        match fills.iter_mut().find(|(c, _)| *c == colour) {
            Some((_, region)) => *region = self.ops.union(region, &remainder),
            None => fills.push((colour, remainder)),
        }
        true
    }

    /// Adds filled primitives in occlusion order: sorted by smallest
    /// camera-space z ascending (farthest first), consumed from the nearest
    /// end. `map` turns a projected point into output coordinates.
    pub fn add_all(&mut self, primitives: &[ProjectedPrimitive], map: impl Fn(Vec2) -> Vec2) {
        let mut ordered: Vec<&ProjectedPrimitive> =
            primitives.iter().filter(|p| p.kind.is_filled()).collect();
        ordered.sort_by(|a, b| a.min_z.total_cmp(&b.min_z));

        for primitive in ordered.into_iter().rev() {
            let points: Vec<Vec2> = primitive
                .points
                .iter()
                .map(|p| map(Vec2::new(p.x, p.y)))
                .collect();
            self.add(primitive.owner, primitive.colour, &points);
        }
    }

    /// Union of everything drawn so far.
    pub fn drawn(&self) -> &O::Region {
        &self.drawn
    }

    pub fn ops(&self) -> &O {
        &self.ops
    }

    /// Per-object fills in order of first contribution.
    pub fn finish(self) -> Vec<ObjectFills<O::Region>> {
        self.objects
    }
}
