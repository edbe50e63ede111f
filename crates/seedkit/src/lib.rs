//! seedkit - load YAML/JSON fixtures into ORM-managed tables.
//!
//! seedkit reads fixture files describing rows keyed by model, groups
//! them by model class, and bulk-inserts them through a [`Database`]
//! handle inside one transaction. It can also create and drop the
//! tables of the models it finds.
//!
//! - Models are Rust types implementing [`Model`], registered under dotted
//!   paths in a [`ModelRegistry`]
//! - Fixture values are untyped [`Value`]s, so no schema is needed upfront
//! - Any handle implementing [`Database`] works; `seedkit-sqlite` ships one
//!
//! # Quick Start
//!
//! ```ignore
//! use seedkit::prelude::*;
//! use seedkit_sqlite::SqliteDatabase;
//!
//! struct User;
//!
//! impl Model for User {
//!     const TABLE_NAME: &'static str = "users";
//!     const PRIMARY_KEY: &'static [&'static str] = &["id"];
//!
//!     fn fields() -> &'static [FieldInfo] {
//!         const FIELDS: &[FieldInfo] = &[
//!             FieldInfo::new("id", SqlType::BigInt).primary_key(true).auto_increment(true),
//!             FieldInfo::new("name", SqlType::Text),
//!         ];
//!         FIELDS
//!     }
//! }
//!
//! fn seed() -> Result<()> {
//!     let registry = ModelRegistry::new().with::<User>("app.models.User")?;
//!     let mut seeder = Seeder::new(registry).with_database(SqliteDatabase::open_memory()?);
//!     seeder.set_path("fixtures");
//!     seeder.set_fixture_files(["users.yaml"]);
//!
//!     seeder.create_table_all(None, true)?;
//!     seeder.db_data_input(None, None)?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod fixture;
pub mod seeder;

pub use config::{FixturePath, SeedConfig, TextEncoding};
pub use fixture::{ClassFields, FixtureDocument, FixtureFormat, FixtureRecord, GroupedFixture};
pub use seeder::{SeedEntry, SeedReport, Seeder};

pub use seedkit_core::{
    Database, Dialect, Error, FieldInfo, FieldMap, Model, ModelRef, ModelRegistry,
    ReferentialAction, Result, SqlType, Transaction, Value,
};

pub use seedkit_query::{InsertMany, insert_many};

pub use seedkit_schema::{CreateTable, create_table, drop_table_sql, sort_models};

/// Crate version, reported alongside seeding logs.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
///
/// ```ignore
/// use seedkit::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Database, Error, FieldInfo, FieldMap, FixtureDocument, Model, ModelRef, ModelRegistry,
        ReferentialAction, Result, SeedConfig, SeedReport, Seeder, SqlType, TextEncoding, Value,
    };
}
