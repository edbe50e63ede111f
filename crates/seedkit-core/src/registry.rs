//! Registry mapping dotted model paths to model descriptors.
//!
//! Fixture files refer to models as `module.ClassName`. Rust cannot import
//! a type by name at runtime, so every model the fixtures may mention is
//! registered up front and looked up here on demand.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, ResolveError, ResolveErrorKind, Result};
use crate::model::{Model, ModelRef};

const DOTTED_PATH_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)+$";

fn dotted_path_regex() -> Result<&'static Regex> {
    static PATTERN: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(DOTTED_PATH_PATTERN))
        .as_ref()
        .map_err(|e| Error::Custom(format!("invalid model path pattern: {e}")))
}

/// A `module.ClassName` path split at its final dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPath<'a> {
    pub module: &'a str,
    pub class_name: &'a str,
}

impl<'a> ModelPath<'a> {
    /// Parse and validate a dotted path.
    pub fn parse(path: &'a str) -> Result<Self> {
        if !dotted_path_regex()?.is_match(path) {
            return Err(malformed(path));
        }
        let (module, class_name) = path.rsplit_once('.').ok_or_else(|| malformed(path))?;
        Ok(Self { module, class_name })
    }
}

impl fmt::Display for ModelPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.class_name)
    }
}

fn malformed(path: &str) -> Error {
    Error::Resolve(ResolveError {
        kind: ResolveErrorKind::MalformedPath,
        path: path.to_string(),
    })
}

/// Explicit table of the models fixtures may name.
///
/// ```
/// use seedkit_core::{FieldInfo, Model, ModelRegistry};
///
/// struct Tag;
/// impl Model for Tag {
///     const TABLE_NAME: &'static str = "tags";
///     const PRIMARY_KEY: &'static [&'static str] = &["id"];
///     fn fields() -> &'static [FieldInfo] { &[] }
/// }
///
/// let mut registry = ModelRegistry::new();
/// registry.register::<Tag>("blog.models.Tag").unwrap();
/// assert_eq!(registry.resolve("blog.models.Tag").unwrap().table_name, "tags");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: BTreeMap<String, ModelRef>,
    modules: BTreeSet<String>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `M` under `path`.
    ///
    /// Registering the same type under the same path again is a no-op. The
    /// same type may be registered under several paths; a path already taken
    /// by another type is rejected.
    pub fn register<M: Model>(&mut self, path: &str) -> Result<()> {
        let parsed = ModelPath::parse(path)?;
        if let Some(existing) = self.models.get(path) {
            if existing.is::<M>() {
                return Ok(());
            }
            return Err(Error::Resolve(ResolveError {
                kind: ResolveErrorKind::DuplicatePath,
                path: path.to_string(),
            }));
        }
        tracing::trace!(path, table = M::TABLE_NAME, "registered model");
        self.modules.insert(parsed.module.to_string());
        self.models.insert(path.to_string(), ModelRef::of::<M>(path));
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<M: Model>(mut self, path: &str) -> Result<Self> {
        self.register::<M>(path)?;
        Ok(self)
    }

    /// Resolve a dotted path to its model.
    pub fn resolve(&self, path: &str) -> Result<ModelRef> {
        let parsed = ModelPath::parse(path)?;
        if let Some(model) = self.models.get(path) {
            return Ok(model.clone());
        }
        let kind = if self.modules.contains(parsed.module) {
            ResolveErrorKind::ModelNotFound
        } else {
            ResolveErrorKind::ModuleNotFound
        };
        Err(Error::Resolve(ResolveError {
            kind,
            path: path.to_string(),
        }))
    }

    /// Check if a path is registered.
    pub fn contains(&self, path: &str) -> bool {
        self.models.contains_key(path)
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
