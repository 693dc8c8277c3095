//! Part resolution.
//!
//! The renderer never reads part files itself. It asks a [`PartResolver`] for
//! each code it meets; [`PartLibrary`] answers from memory and [`PartCache`]
//! wraps a loader so every code is parsed at most once.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::PartError;
use crate::part::Part;
use crate::piece::normalize_code;

/// Turns a part code into a shared, immutable part.
///
/// `Ok(None)` means the code is unknown, which the renderer treats as a
/// warning. `Err` means a file was found but could not be read, which aborts
/// the render.
pub trait PartResolver {
    fn resolve(&self, code: &str) -> Result<Option<Arc<Part>>, PartError>;
}

impl<R: PartResolver + ?Sized> PartResolver for &R {
    fn resolve(&self, code: &str) -> Result<Option<Arc<Part>>, PartError> {
        (**self).resolve(code)
    }
}

impl<R: PartResolver + ?Sized> PartResolver for Arc<R> {
    fn resolve(&self, code: &str) -> Result<Option<Arc<Part>>, PartError> {
        (**self).resolve(code)
    }
}

/// Loads a part from wherever parts live (usually a parser over a directory).
pub trait PartSource {
    fn load(&self, code: &str) -> Result<Option<Part>, PartError>;
}

impl<F> PartSource for F
where
    F: Fn(&str) -> Result<Option<Part>, PartError>,
{
    fn load(&self, code: &str) -> Result<Option<Part>, PartError> {
        self(code)
    }
}

/// In-memory parts keyed by normalized code.
#[derive(Debug, Default, Clone)]
pub struct PartLibrary {
    parts: HashMap<String, Arc<Part>>,
}

impl PartLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `part` under `code`, replacing any previous entry.
    pub fn insert(&mut self, code: &str, part: Part) -> Arc<Part> {
        let part = Arc::new(part);
        self.parts.insert(normalize_code(code), Arc::clone(&part));
        part
    }

    /// Builder-style [`PartLibrary::insert`].
    pub fn with(mut self, code: &str, part: Part) -> Self {
        self.insert(code, part);
        self
    }

    pub fn contains(&self, code: &str) -> bool {
        self.parts.contains_key(&normalize_code(code))
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl PartResolver for PartLibrary {
    fn resolve(&self, code: &str) -> Result<Option<Arc<Part>>, PartError> {
        Ok(self.parts.get(&normalize_code(code)).cloned())
    }
}

/// Memoizing resolver over a [`PartSource`].
///
/// Misses are cached too, so an unknown code is only looked up once. The map
/// sits behind an `RwLock`; a populated cache can be shared between renders.
pub struct PartCache<S> {
    source: S,
    parts: RwLock<HashMap<String, Option<Arc<Part>>>>,
}

impl<S: PartSource> PartCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            parts: RwLock::new(HashMap::new()),
        }
    }

    /// Number of codes looked up so far, hits and misses alike.
    pub fn len(&self) -> usize {
        self.parts.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: PartSource> PartResolver for PartCache<S> {
    fn resolve(&self, code: &str) -> Result<Option<Arc<Part>>, PartError> {
        let code = normalize_code(code);
        if let Some(entry) = self
            .parts
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&code)
        {
            return Ok(entry.clone());
        }

        log::debug!("loading part {code}");
        let loaded = self.source.load(&code)?.map(Arc::new);
        let mut parts = self.parts.write().unwrap_or_else(|e| e.into_inner());
        Ok(parts.entry(code).or_insert(loaded).clone())
    }
}
