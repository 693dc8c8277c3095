//! Error and warning types.
//!
//! Errors abort a render. Warnings describe geometry that was dropped or
//! adjusted along the way; they are collected next to a successful result and
//! never interrupt rendering.

use std::path::PathBuf;

use thiserror::Error;

/// A part file could not be turned into records. Fatal to the whole render.
#[derive(Error, Debug)]
pub enum PartError {
    #[error("failed to read part file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown command ({tag}) in {} at line {line}", .path.display())]
    UnknownCommand {
        path: PathBuf,
        line: usize,
        tag: String,
    },

    #[error("invalid {record} data in {} at line {line}", .path.display())]
    InvalidRecord {
        path: PathBuf,
        line: usize,
        record: &'static str,
    },
}

/// Invalid render configuration, reported before any rendering starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("camera and look-at positions are the same")]
    CameraAtLookAt,

    #[error("invalid colour `{0}`, expected #rrggbb")]
    InvalidColour(String),

    #[error("invalid image size {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },

    #[error("invalid camera distance {0}, expected a positive number")]
    InvalidDistance(f64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Anything that stops a render call from producing output.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Part(#[from] PartError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("formatting error")]
    Fmt(#[from] std::fmt::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Non-fatal problems found while rendering.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Warning {
    #[error("Part not found: {code}")]
    UnresolvedReference { code: String },

    #[error("Degenerate {primitive} dropped in {code}")]
    DegenerateGeometry {
        code: String,
        primitive: &'static str,
    },

    #[error("Cyclic reference to {code} skipped")]
    CyclicReference { code: String },

    #[error("Zero diagonal in transform of {code} adjusted")]
    FixedDiagonal { code: String },

    #[error("Singular transform of {code} dropped")]
    SingularTransform { code: String },

    #[error("Reference to invalid part {code} dropped")]
    DroppedReference { code: String },

    #[error("Part {code} has no geometry and was not emitted")]
    EmptyObject { code: String },
}

/// Accumulates warnings for one render and logs each as it arrives.
#[derive(Debug, Default, Clone)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: Warning) {
        log::warn!("{warning}");
        self.items.push(warning);
    }

    pub fn extend(&mut self, other: Warnings) {
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.items
    }
}
