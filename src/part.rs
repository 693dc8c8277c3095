//! Resolved part records.

use std::path::{Path, PathBuf};

use crate::colour::ColourCode;
use crate::math::Vec3;
use crate::piece::{Group, Piece};

/// One record of a part file.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// A reference to another part, placed and coloured.
    Subpart(Piece),
    Line {
        colour: ColourCode,
        points: [Vec3; 2],
    },
    Triangle {
        colour: ColourCode,
        points: [Vec3; 3],
    },
    Quadrilateral {
        colour: ColourCode,
        points: [Vec3; 4],
    },
    /// A line drawn only when both control points fall on the same side of it.
    OptionalLine {
        colour: ColourCode,
        points: [Vec3; 2],
        controls: [Vec3; 2],
    },
    /// A `0 !KIND text` meta command.
    Meta { kind: String, text: String },
    Comment(String),
}

impl Primitive {
    /// Short name used in warnings.
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::Subpart(_) => "reference",
            Primitive::Line { .. } => "line",
            Primitive::Triangle { .. } => "triangle",
            Primitive::Quadrilateral { .. } => "quadrilateral",
            Primitive::OptionalLine { .. } => "optional line",
            Primitive::Meta { .. } => "meta command",
            Primitive::Comment(_) => "comment",
        }
    }
}

/// An immutable, ordered list of records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Part {
    records: Vec<Primitive>,
    path: Option<PathBuf>,
}

impl Part {
    pub fn new(records: Vec<Primitive>) -> Self {
        Self {
            records,
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn records(&self) -> &[Primitive] {
        &self.records
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Text of the first `!CATEGORY` meta command.
    pub fn category(&self) -> Option<&str> {
        self.records.iter().find_map(|record| match record {
            Primitive::Meta { kind, text } if kind == "CATEGORY" => Some(text.trim()),
            _ => None,
        })
    }
}

impl From<Piece> for Part {
    fn from(piece: Piece) -> Self {
        Part::new(vec![Primitive::Subpart(piece)])
    }
}

impl From<&Group> for Part {
    fn from(group: &Group) -> Self {
        group.to_part()
    }
}
