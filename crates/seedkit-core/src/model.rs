//! Model trait and runtime model descriptors.
//!
//! A [`Model`] is a Rust type carrying table metadata. Fixtures name models
//! by dotted path, so the seeder works with [`ModelRef`], a cheap clonable
//! handle produced by the [`ModelRegistry`](crate::ModelRegistry) that keeps
//! the metadata together with the `TypeId` used as identity.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use crate::field::FieldInfo;

/// Trait for types that map to a database table.
///
/// # Example
///
/// ```
/// use seedkit_core::{FieldInfo, Model, SqlType};
///
/// struct Hero;
///
/// impl Model for Hero {
///     const TABLE_NAME: &'static str = "heroes";
///     const PRIMARY_KEY: &'static [&'static str] = &["id"];
///
///     fn fields() -> &'static [FieldInfo] {
///         const FIELDS: &[FieldInfo] = &[
///             FieldInfo::new("id", SqlType::BigInt).primary_key(true).auto_increment(true),
///             FieldInfo::new("name", SqlType::Text),
///         ];
///         FIELDS
///     }
/// }
///
/// assert_eq!(Hero::fields().len(), 2);
/// ```
pub trait Model: 'static {
    /// The name of the database table.
    const TABLE_NAME: &'static str;

    /// The primary key column name(s).
    const PRIMARY_KEY: &'static [&'static str];

    /// Get field metadata for all columns.
    fn fields() -> &'static [FieldInfo];
}

/// Table metadata for one registered model, as resolved from a dotted path.
#[derive(Debug)]
pub struct ModelInfo {
    /// Dotted path the model was resolved from (`app.models.User`).
    pub path: String,
    /// Text after the final `.` of `path`.
    pub class_name: String,
    pub table_name: &'static str,
    pub primary_key: &'static [&'static str],
    pub fields: &'static [FieldInfo],
    type_id: TypeId,
    type_name: &'static str,
}

impl ModelInfo {
    /// Identity of the underlying Rust type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type name, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Look up a column by name.
    pub fn field(&self, column: &str) -> Option<&'static FieldInfo> {
        self.fields.iter().find(|f| f.column_name == column)
    }
}

/// Shared handle to a model's metadata.
///
/// Two refs are equal when they describe the same Rust type, even if they
/// were resolved from different dotted paths.
#[derive(Clone)]
pub struct ModelRef(Arc<ModelInfo>);

impl ModelRef {
    /// Build a descriptor for `M`, recording the path it is known by.
    pub fn of<M: Model>(path: &str) -> Self {
        let class_name = path.rsplit('.').next().unwrap_or(path).to_string();
        Self(Arc::new(ModelInfo {
            path: path.to_string(),
            class_name,
            table_name: M::TABLE_NAME,
            primary_key: M::PRIMARY_KEY,
            fields: M::fields(),
            type_id: TypeId::of::<M>(),
            type_name: std::any::type_name::<M>(),
        }))
    }

    /// Whether this ref describes the Rust type `M`.
    pub fn is<M: Model>(&self) -> bool {
        self.0.type_id == TypeId::of::<M>()
    }
}

impl Deref for ModelRef {
    type Target = ModelInfo;

    fn deref(&self) -> &ModelInfo {
        &self.0
    }
}

impl PartialEq for ModelRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.type_id == other.0.type_id
    }
}

impl Eq for ModelRef {}

impl Hash for ModelRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.type_id.hash(state);
    }
}

impl fmt::Debug for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRef")
            .field("path", &self.0.path)
            .field("table", &self.0.table_name)
            .finish()
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.path)
    }
}
