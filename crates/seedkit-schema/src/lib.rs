//! Table DDL for seedkit.
//!
//! This crate provides:
//! - CREATE TABLE generation from a [`ModelRef`]'s field metadata
//! - DROP TABLE generation
//! - Foreign-key dependency ordering of a model list

pub mod create;
pub mod order;

pub use create::CreateTable;
pub use order::sort_models;

use seedkit_core::{Dialect, ModelRef};

/// Start a CREATE TABLE statement for a model.
///
/// # Example
///
/// ```ignore
/// let sql = create_table(&user).if_not_exists(true).build(Dialect::Sqlite);
/// ```
pub fn create_table(model: &ModelRef) -> CreateTable<'_> {
    CreateTable::new(model)
}

/// Generate DROP TABLE SQL.
pub fn drop_table_sql(table_name: &str, if_exists: bool, dialect: Dialect) -> String {
    let table = dialect.quote_identifier(table_name);
    if if_exists {
        format!("DROP TABLE IF EXISTS {}", table)
    } else {
        format!("DROP TABLE {}", table)
    }
}
