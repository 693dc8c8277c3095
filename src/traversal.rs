//! Model flattening.
//!
//! Walks a model depth-first, resolving every sub-part reference, and turns
//! each drawable record into a camera-space primitive. Colours are resolved
//! at the leaves against the active colour of the nearest enclosing piece.
//!
//! Primitives with any vertex at or behind the camera plane are discarded
//! whole; nothing is clipped.

use crate::camera::Camera;
use crate::colour::ColourCode;
use crate::error::{PartError, Warning, Warnings};
use crate::library::PartResolver;
use crate::math::{Mat3, Vec3};
use crate::part::{Part, Primitive};
use crate::piece::Piece;

/// Accumulated transform and colour while descending into sub-parts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Current {
    pub matrix: Mat3,
    pub position: Vec3,
    pub colour: ColourCode,
}

impl Default for Current {
    fn default() -> Self {
        Self::root()
    }
}

impl Current {
    /// Identity transform at the origin, drawing in white.
    pub fn root() -> Self {
        Self {
            matrix: Mat3::identity(),
            position: Vec3::ZERO,
            colour: ColourCode::WHITE,
        }
    }

    /// Places a local point in world space.
    #[inline]
    pub fn place(&self, point: Vec3) -> Vec3 {
        self.matrix * point + self.position
    }

    /// State inside `piece`.
    pub fn enter(&self, piece: &Piece) -> Self {
        Self {
            matrix: self.matrix * piece.matrix,
            position: self.place(piece.position),
            colour: piece.colour.resolve(self.colour),
        }
    }
}

/// Drawable record kinds that survive flattening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Line,
    Triangle,
    Quadrilateral,
    OptionalLine,
}

impl PrimitiveKind {
    /// Number of outline vertices (optional-line control points excluded).
    pub fn vertex_count(self) -> usize {
        match self {
            PrimitiveKind::Line | PrimitiveKind::OptionalLine => 2,
            PrimitiveKind::Triangle => 3,
            PrimitiveKind::Quadrilateral => 4,
        }
    }

    /// Whether the primitive encloses an area.
    pub fn is_filled(self) -> bool {
        matches!(self, PrimitiveKind::Triangle | PrimitiveKind::Quadrilateral)
    }
}

/// A primitive in camera space.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPrimitive {
    /// Index of the top-level record of the model this came from.
    pub owner: usize,
    pub colour: ColourCode,
    pub kind: PrimitiveKind,
    /// Outline vertices, followed by the two control points of an optional line.
    pub points: Vec<Vec3>,
}

impl CameraPrimitive {
    /// The outline vertices.
    pub fn outline(&self) -> &[Vec3] {
        &self.points[..self.kind.vertex_count()]
    }
}

/// A light source met during the walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightEvent {
    /// World-space position.
    pub position: Vec3,
    pub colour: ColourCode,
}

/// Output of [`Flattener::flatten`].
#[derive(Debug, Default)]
pub struct Flattened {
    pub primitives: Vec<CameraPrimitive>,
    pub lights: Vec<LightEvent>,
    pub warnings: Warnings,
}

const ROOT_NAME: &str = "model";

/// Turns a model into camera-space primitives.
pub struct Flattener<'a, R: ?Sized> {
    resolver: &'a R,
    camera: &'a Camera,
}

impl<'a, R: PartResolver + ?Sized> Flattener<'a, R> {
    pub fn new(resolver: &'a R, camera: &'a Camera) -> Self {
        Self { resolver, camera }
    }

    /// Flattens `model`.
    ///
    /// Unknown parts, cyclic references and degenerate faces are skipped
    /// and reported as warnings. A part that fails to load aborts the walk.
    pub fn flatten(&self, model: &Part) -> Result<Flattened, PartError> {
        let mut out = Flattened::default();
        let mut ancestors = Vec::new();
        let root = Current::root();
        for (owner, record) in model.records().iter().enumerate() {
            self.visit(record, &root, owner, &mut ancestors, &mut out)?;
        }
        log::debug!(
            "flattened {} primitives and {} lights",
            out.primitives.len(),
            out.lights.len()
        );
        Ok(out)
    }

    fn walk(
        &self,
        part: &Part,
        current: &Current,
        owner: usize,
        ancestors: &mut Vec<String>,
        out: &mut Flattened,
    ) -> Result<(), PartError> {
        for record in part.records() {
            self.visit(record, current, owner, ancestors, out)?;
        }
        Ok(())
    }

    fn visit(
        &self,
        record: &Primitive,
        current: &Current,
        owner: usize,
        ancestors: &mut Vec<String>,
        out: &mut Flattened,
    ) -> Result<(), PartError> {
        match record {
            Primitive::Subpart(piece) => self.subpart(piece, current, owner, ancestors, out)?,
            Primitive::Line { colour, points } => {
                self.emit(PrimitiveKind::Line, *colour, points, current, owner, out);
            }
            Primitive::OptionalLine {
                colour,
                points,
                controls,
            } => {
                let all = [points[0], points[1], controls[0], controls[1]];
                self.emit(PrimitiveKind::OptionalLine, *colour, &all, current, owner, out);
            }
            Primitive::Triangle { colour, points } => {
                if self.is_degenerate(points, current) {
                    out.warnings.push(degenerate(ancestors, record));
                } else {
                    self.emit(PrimitiveKind::Triangle, *colour, points, current, owner, out);
                }
            }
            Primitive::Quadrilateral { colour, points } => {
                if self.is_degenerate(points, current) {
                    out.warnings.push(degenerate(ancestors, record));
                } else {
                    self.emit(PrimitiveKind::Quadrilateral, *colour, points, current, owner, out);
                }
            }
            Primitive::Meta { .. } | Primitive::Comment(_) => {}
        }
        Ok(())
    }

    fn subpart(
        &self,
        piece: &Piece,
        current: &Current,
        owner: usize,
        ancestors: &mut Vec<String>,
        out: &mut Flattened,
    ) -> Result<(), PartError> {
        if piece.is_light() {
            out.lights.push(LightEvent {
                position: current.place(piece.position),
                colour: piece.colour.resolve(current.colour),
            });
            return Ok(());
        }

        let code = piece.code();
        if ancestors.iter().any(|a| a == code) {
            out.warnings.push(Warning::CyclicReference {
                code: code.to_string(),
            });
            return Ok(());
        }

        let Some(part) = self.resolver.resolve(code)? else {
            out.warnings.push(Warning::UnresolvedReference {
                code: code.to_string(),
            });
            return Ok(());
        };

        ancestors.push(code.to_string());
        let result = self.walk(&part, &current.enter(piece), owner, ancestors, out);
        ancestors.pop();
        result
    }

    /// Zero-area check on the eye-relative points, before the basis change.
    fn is_degenerate(&self, points: &[Vec3], current: &Current) -> bool {
        let eye = self.camera.position();
        let p: Vec<Vec3> = points.iter().map(|&p| current.place(p) - eye).collect();
        let first = (p[2] - p[0]).cross(p[1] - p[0]);
        if first.magnitude() == 0.0 {
            return true;
        }
        p.len() == 4 && (p[2] - p[0]).cross(p[3] - p[0]).magnitude() == 0.0
    }

    fn emit(
        &self,
        kind: PrimitiveKind,
        colour: ColourCode,
        points: &[Vec3],
        current: &Current,
        owner: usize,
        out: &mut Flattened,
    ) {
        let points: Vec<Vec3> = points
            .iter()
            .map(|&p| self.camera.to_camera_space(current.place(p)))
            .collect();
        if points[..kind.vertex_count()].iter().any(|p| p.z >= 0.0) {
            return;
        }
        out.primitives.push(CameraPrimitive {
            owner,
            colour: colour.resolve(current.colour),
            kind,
            points,
        });
    }
}

fn degenerate(ancestors: &[String], record: &Primitive) -> Warning {
    Warning::DegenerateGeometry {
        code: ancestors
            .last()
            .map(String::as_str)
            .unwrap_or(ROOT_NAME)
            .to_string(),
        primitive: record.name(),
    }
}
