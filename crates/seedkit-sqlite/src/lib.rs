//! SQLite database handle for seedkit.
//!
// FFI bindings require unsafe code
#![allow(unsafe_code)]
//!
//! This crate provides [`SqliteDatabase`], a [`Database`](seedkit_core::Database)
//! implementation over libsqlite3 (bundled through `libsqlite3-sys`).
//!
//! # Features
//!
//! - Table creation/dropping ordered by foreign-key dependencies
//! - Checked BEGIN/COMMIT/ROLLBACK
//! - Parameter binding for every fixture value; arrays and maps bind as JSON text
//! - In-memory and file-based databases with configurable busy timeout
//!
//! # Example
//!
//! ```rust,ignore
//! use seedkit_sqlite::SqliteDatabase;
//! use seedkit_core::{Database, Value};
//!
//! let db = SqliteDatabase::open_memory()?;
//! db.execute_sql("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
//! db.execute("INSERT INTO users (name) VALUES (?1)", &[Value::from("Alice")])?;
//! ```

pub mod connection;
pub mod ffi;
pub mod types;

pub use connection::{OpenFlags, SqliteConfig, SqliteDatabase};

/// The SQLite library version.
pub fn sqlite_version() -> &'static str {
    ffi::version()
}
