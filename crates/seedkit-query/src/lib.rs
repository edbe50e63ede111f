//! Bulk INSERT construction for seedkit.
//!
//! `seedkit-query` turns a model descriptor plus a list of untyped field
//! maps into dialect-specific multi-row INSERT statements and runs them
//! through the `Database` trait from `seedkit-core`.

pub mod builder;

pub use builder::InsertMany;

use seedkit_core::{FieldMap, ModelRef};

/// Create a bulk INSERT for a model.
///
/// # Example
///
/// ```ignore
/// let inserted = insert_many(&user, rows).execute(&db)?;
/// ```
pub fn insert_many(model: &ModelRef, rows: Vec<FieldMap>) -> InsertMany<'_> {
    InsertMany::new(model, rows)
}
