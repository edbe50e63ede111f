//! Core types and traits for seedkit.
//!
//! This crate provides the foundational abstractions shared by the fixture
//! loader and the database drivers:
//!
//! - `Value` and `FieldMap` for untyped fixture data
//! - `Database` trait and the scoped `Transaction` guard
//! - `Model` trait, `FieldInfo` and `SqlType` for table metadata
//! - `ModelRegistry` for resolving dotted model paths to `ModelRef`s
//! - `Error` / `Result` used throughout the workspace

pub mod database;
pub mod dialect;
pub mod error;
pub mod field;
pub mod identifiers;
pub mod model;
pub mod registry;
pub mod row;
pub mod types;
pub mod value;

pub use database::{Database, Transaction};
pub use dialect::Dialect;
pub use error::{Error, Result};
pub use field::{FieldInfo, ReferentialAction};
pub use identifiers::{quote_ident, quote_ident_mysql};
pub use model::{Model, ModelInfo, ModelRef};
pub use registry::{ModelPath, ModelRegistry};
pub use row::{ColumnInfo, Row};
pub use types::SqlType;
pub use value::{FieldMap, Value};
