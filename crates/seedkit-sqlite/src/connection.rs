//! SQLite database handle.
//!
//! Safe wrapper around a libsqlite3 connection implementing the seedkit
//! [`Database`] contract.

// Casts match C types exactly at the FFI boundary
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::borrow_as_ptr)]

use crate::ffi;
use crate::types;
use seedkit_core::error::{
    ConnectionError, ConnectionErrorKind, QueryError, QueryErrorKind, SchemaError, SchemaErrorKind,
    TransactionError, TransactionErrorKind,
};
use seedkit_core::row::ColumnInfo;
use seedkit_core::{Database, Dialect, Error, ModelRef, Result, Row, Value};
use seedkit_schema::{CreateTable, drop_table_sql, sort_models};
use std::ffi::{CStr, CString, c_int};
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Configuration for opening SQLite databases.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path to the database file, or ":memory:" for an in-memory database.
    pub path: String,
    /// Open flags (read-only, read-write, create).
    pub flags: OpenFlags,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
    /// Enforce foreign key constraints (`PRAGMA foreign_keys = ON`).
    pub foreign_keys: bool,
}

/// Flags controlling how the database is opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFlags {
    /// Open for reading only.
    pub read_only: bool,
    /// Open for reading and writing.
    pub read_write: bool,
    /// Create the database if it doesn't exist.
    pub create: bool,
    /// Enable URI filename interpretation.
    pub uri: bool,
}

impl OpenFlags {
    /// Create flags for read-only access.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Default::default()
        }
    }

    /// Create flags for read-write access with creation if needed.
    pub fn create_read_write() -> Self {
        Self {
            read_write: true,
            create: true,
            ..Default::default()
        }
    }

    fn to_sqlite_flags(self) -> c_int {
        let mut flags = 0;

        if self.read_only {
            flags |= ffi::SQLITE_OPEN_READONLY;
        }
        if self.read_write {
            flags |= ffi::SQLITE_OPEN_READWRITE;
        }
        if self.create {
            flags |= ffi::SQLITE_OPEN_CREATE;
        }
        if self.uri {
            flags |= ffi::SQLITE_OPEN_URI;
        }

        // Default to read-write if no mode specified
        if flags & (ffi::SQLITE_OPEN_READONLY | ffi::SQLITE_OPEN_READWRITE) == 0 {
            flags |= ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE;
        }

        flags
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: ":memory:".to_string(),
            flags: OpenFlags::create_read_write(),
            busy_timeout_ms: 5000,
            foreign_keys: true,
        }
    }
}

impl SqliteConfig {
    /// Create a new config for a file-based database.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Create a new config for an in-memory database.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Set open flags.
    pub fn flags(mut self, flags: OpenFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set busy timeout.
    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = ms;
        self
    }

    /// Enable or disable foreign key enforcement at open.
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }
}

struct SqliteInner {
    db: *mut ffi::sqlite3,
}

impl SqliteInner {
    /// Whether SQLite itself has an open transaction on this handle.
    ///
    /// Read from the engine on every call: SQLite may end a transaction on
    /// its own (SQLITE_FULL, I/O errors, a raw `ROLLBACK`).
    fn in_transaction(&self) -> bool {
        // SAFETY: db is valid while the inner value is alive
        unsafe { ffi::sqlite3_get_autocommit(self.db) == 0 }
    }
}

// SAFETY: the handle is only touched while holding the Mutex around it.
unsafe impl Send for SqliteInner {}

/// A SQLite database handle.
pub struct SqliteDatabase {
    inner: Mutex<SqliteInner>,
    path: String,
}

impl SqliteDatabase {
    /// Open a database with the given configuration.
    #[tracing::instrument(level = "debug", skip(config), fields(path = %config.path))]
    pub fn open(config: &SqliteConfig) -> Result<Self> {
        let c_path = CString::new(config.path.as_str()).map_err(|_| {
            Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Connect,
                message: "Invalid path: contains null byte".to_string(),
                source: None,
            })
        })?;

        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        let flags = config.flags.to_sqlite_flags();

        // SAFETY: We pass valid pointers and check the return value
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };

        if rc != ffi::SQLITE_OK {
            let msg = if db.is_null() {
                ffi::error_string(rc).to_string()
            } else {
                // SAFETY: db is non-null and must be closed even on failure
                unsafe {
                    let (_, msg) = ffi::last_error(db);
                    ffi::sqlite3_close(db);
                    msg
                }
            };

            return Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Connect,
                message: format!("Failed to open database: {}", msg),
                source: None,
            }));
        }

        if config.busy_timeout_ms > 0 {
            // SAFETY: db is valid
            unsafe {
                ffi::sqlite3_busy_timeout(db, config.busy_timeout_ms.min(i32::MAX as u32) as c_int);
            }
        }

        let conn = Self {
            inner: Mutex::new(SqliteInner { db }),
            path: config.path.clone(),
        };

        if config.foreign_keys {
            conn.execute_raw(Dialect::Sqlite.foreign_key_checks_sql(true))?;
        }

        tracing::debug!(version = ffi::version(), "opened sqlite database");
        Ok(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        Self::open(&SqliteConfig::memory())
    }

    /// Open a file-based database.
    pub fn open_file(path: impl Into<String>) -> Result<Self> {
        Self::open(&SqliteConfig::file(path))
    }

    /// Get the database path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether a transaction is open on this handle.
    pub fn in_transaction(&self) -> bool {
        self.lock().in_transaction()
    }

    fn lock(&self) -> MutexGuard<'_, SqliteInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Execute SQL directly without preparing (DDL, pragmas, several statements).
    pub fn execute_raw(&self, sql: &str) -> Result<()> {
        let inner = self.lock();
        exec(inner.db, sql)
    }

    /// Prepare and execute a query, returning all rows.
    pub fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        let inner = self.lock();
        let stmt = Statement::prepare(inner.db, sql)?;
        stmt.bind_all(params)?;

        // SAFETY: stmt is valid
        let col_count = unsafe { ffi::sqlite3_column_count(stmt.raw) };
        let names = (0..col_count)
            .map(|i| {
                // SAFETY: stmt is valid and i < col_count
                unsafe { types::column_name(stmt.raw, i) }.unwrap_or_else(|| format!("col{}", i))
            })
            .collect();
        let columns = Arc::new(ColumnInfo::new(names));

        let mut rows = Vec::new();
        loop {
            // SAFETY: stmt is valid
            match unsafe { ffi::sqlite3_step(stmt.raw) } {
                ffi::SQLITE_ROW => {
                    let values = (0..col_count)
                        // SAFETY: stmt just returned SQLITE_ROW
                        .map(|i| unsafe { types::read_column(stmt.raw, i) })
                        .collect();
                    rows.push(Row::with_columns(Arc::clone(&columns), values));
                }
                ffi::SQLITE_DONE => break,
                _ => return Err(query_error(inner.db, sql, None)),
            }
        }

        Ok(rows)
    }

    /// Count rows in a table. Mostly useful in tests and diagnostics.
    pub fn count_rows(&self, table: &str) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) AS n FROM {}",
            Dialect::Sqlite.quote_identifier(table)
        );
        let rows = self.query(&sql, &[])?;
        match rows.first() {
            Some(row) => row.get_named("n"),
            None => Ok(0),
        }
    }

    fn set_transaction(&self, sql: &str, want_active: bool) -> Result<()> {
        let inner = self.lock();
        if inner.in_transaction() != want_active {
            let (kind, message) = if want_active {
                (TransactionErrorKind::NotActive, "Not in a transaction")
            } else {
                (TransactionErrorKind::AlreadyActive, "Already in a transaction")
            };
            return Err(Error::Transaction(TransactionError {
                kind,
                message: message.to_string(),
                source: None,
            }));
        }
        exec(inner.db, sql)?;
        tracing::trace!(sql, "transaction state");
        Ok(())
    }
}

impl Database for SqliteDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    #[tracing::instrument(level = "debug", skip(self, models), fields(count = models.len()))]
    fn create_tables(&self, models: &[ModelRef], safe: bool) -> Result<()> {
        for model in sort_models(models) {
            let sql = CreateTable::new(&model)
                .if_not_exists(safe)
                .build(Dialect::Sqlite);
            tracing::trace!(sql = %sql, "create table");
            self.execute_raw(&sql)
                .map_err(|e| schema_error(SchemaErrorKind::Create, model.table_name, e))?;
        }
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self, models), fields(count = models.len()))]
    fn drop_tables(&self, models: &[ModelRef]) -> Result<()> {
        for model in sort_models(models).iter().rev() {
            let sql = drop_table_sql(model.table_name, true, Dialect::Sqlite);
            tracing::trace!(sql = %sql, "drop table");
            self.execute_raw(&sql)
                .map_err(|e| schema_error(SchemaErrorKind::Drop, model.table_name, e))?;
        }
        Ok(())
    }

    fn execute_sql(&self, sql: &str) -> Result<u64> {
        let inner = self.lock();
        // SAFETY: db is valid
        let before = unsafe { ffi::sqlite3_total_changes(inner.db) };
        exec(inner.db, sql)?;
        // SAFETY: db is valid
        let after = unsafe { ffi::sqlite3_total_changes(inner.db) };
        Ok(u64::try_from(after - before).unwrap_or(0))
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let inner = self.lock();
        let stmt = Statement::prepare(inner.db, sql)?;
        stmt.bind_all(params)?;

        // SAFETY: db is valid
        let before = unsafe { ffi::sqlite3_total_changes(inner.db) };
        // SAFETY: stmt is valid
        let rc = unsafe { ffi::sqlite3_step(stmt.raw) };
        match rc {
            ffi::SQLITE_DONE | ffi::SQLITE_ROW => {
                // SAFETY: db is valid
                let after = unsafe { ffi::sqlite3_total_changes(inner.db) };
                Ok(u64::try_from(after - before).unwrap_or(0))
            }
            _ => Err(query_error(inner.db, sql, None)),
        }
    }

    fn begin(&self) -> Result<()> {
        self.set_transaction("BEGIN IMMEDIATE", false)
    }

    fn commit(&self) -> Result<()> {
        self.set_transaction("COMMIT", true)
    }

    fn rollback(&self) -> Result<()> {
        self.set_transaction("ROLLBACK", true)
    }
}

impl Drop for SqliteDatabase {
    fn drop(&mut self) {
        let inner = self.lock();
        if !inner.db.is_null() {
            // SAFETY: db is valid and no statements outlive the handle
            unsafe {
                ffi::sqlite3_close(inner.db);
            }
        }
    }
}

impl std::fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDatabase")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Prepared statement finalized on drop.
struct Statement<'a> {
    raw: *mut ffi::sqlite3_stmt,
    db: *mut ffi::sqlite3,
    sql: &'a str,
}

impl<'a> Statement<'a> {
    fn prepare(db: *mut ffi::sqlite3, sql: &'a str) -> Result<Self> {
        let c_sql = CString::new(sql).map_err(|_| nul_in_sql(sql))?;
        let mut raw: *mut ffi::sqlite3_stmt = ptr::null_mut();

        // SAFETY: All pointers are valid
        let rc = unsafe {
            ffi::sqlite3_prepare_v2(
                db,
                c_sql.as_ptr(),
                c_sql.as_bytes().len() as c_int,
                &mut raw,
                ptr::null_mut(),
            )
        };

        if rc != ffi::SQLITE_OK {
            return Err(query_error(db, sql, None));
        }

        Ok(Self { raw, db, sql })
    }

    fn bind_all(&self, params: &[Value]) -> Result<()> {
        for (i, param) in params.iter().enumerate() {
            // SAFETY: stmt is valid, index is 1-based
            let rc = unsafe { types::bind_value(self.raw, (i + 1) as c_int, param) };
            if rc != ffi::SQLITE_OK {
                return Err(query_error(self.db, self.sql, Some(i + 1)));
            }
        }
        Ok(())
    }
}

impl Drop for Statement<'_> {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            // SAFETY: raw came from sqlite3_prepare_v2 and is finalized once
            unsafe {
                ffi::sqlite3_finalize(self.raw);
            }
        }
    }
}

fn exec(db: *mut ffi::sqlite3, sql: &str) -> Result<()> {
    let c_sql = CString::new(sql).map_err(|_| nul_in_sql(sql))?;
    let mut errmsg: *mut std::ffi::c_char = ptr::null_mut();

    // SAFETY: All pointers are valid
    let rc = unsafe { ffi::sqlite3_exec(db, c_sql.as_ptr(), None, ptr::null_mut(), &mut errmsg) };

    if rc != ffi::SQLITE_OK {
        let message = if errmsg.is_null() {
            ffi::error_string(rc).to_string()
        } else {
            // SAFETY: errmsg was allocated by sqlite3_exec and is freed once
            unsafe {
                let msg = CStr::from_ptr(errmsg).to_string_lossy().into_owned();
                ffi::sqlite3_free(errmsg.cast());
                msg
            }
        };

        return Err(Error::Query(QueryError {
            kind: error_code_to_kind(rc),
            sql: Some(sql.to_string()),
            message,
            source: None,
        }));
    }

    Ok(())
}

fn query_error(db: *mut ffi::sqlite3, sql: &str, param_index: Option<usize>) -> Error {
    // SAFETY: db is valid
    let (code, msg) = unsafe { ffi::last_error(db) };
    let message = match param_index {
        Some(index) => format!("Failed to bind parameter {}: {}", index, msg),
        None => msg,
    };

    Error::Query(QueryError {
        kind: error_code_to_kind(code),
        sql: Some(sql.to_string()),
        message,
        source: None,
    })
}

fn nul_in_sql(sql: &str) -> Error {
    Error::Query(QueryError {
        kind: QueryErrorKind::Syntax,
        sql: Some(sql.to_string()),
        message: "SQL contains null byte".to_string(),
        source: None,
    })
}

fn schema_error(kind: SchemaErrorKind, table: &str, cause: Error) -> Error {
    let verb = match kind {
        SchemaErrorKind::Create => "create",
        SchemaErrorKind::Drop => "drop",
        SchemaErrorKind::Invalid => "define",
    };
    Error::Schema(SchemaError {
        kind,
        message: format!("failed to {} table '{}': {}", verb, table, cause),
        source: Some(Box::new(cause)),
    })
}

fn error_code_to_kind(code: c_int) -> QueryErrorKind {
    // Extended codes carry the primary code in the low byte
    match code & 0xff {
        ffi::SQLITE_CONSTRAINT => QueryErrorKind::Constraint,
        ffi::SQLITE_BUSY | ffi::SQLITE_LOCKED => QueryErrorKind::Busy,
        ffi::SQLITE_NOTFOUND => QueryErrorKind::NotFound,
        _ => QueryErrorKind::Database,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_memory_and_query() {
        let db = SqliteDatabase::open_memory().unwrap();
        assert_eq!(db.path(), ":memory:");
        let rows = db.query("SELECT 1 AS one, 'x' AS two", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_by_name("one"), Some(&Value::BigInt(1)));
        assert_eq!(rows[0].get_by_name("two"), Some(&Value::Text("x".into())));
    }

    #[test]
    fn test_execute_reports_changes() {
        let db = SqliteDatabase::open_memory().unwrap();
        db.execute_raw("CREATE TABLE t (a INTEGER, b TEXT)").unwrap();
        let n = db
            .execute(
                "INSERT INTO t (a, b) VALUES (?1, ?2), (?3, ?4)",
                &[1.into(), "one".into(), 2.into(), Value::Null],
            )
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(db.execute_sql("DELETE FROM t WHERE a = 1").unwrap(), 1);
        assert_eq!(db.count_rows("t").unwrap(), 1);
    }

    #[test]
    fn test_json_binding_for_collections() {
        let db = SqliteDatabase::open_memory().unwrap();
        db.execute_raw("CREATE TABLE t (tags TEXT)").unwrap();
        db.execute(
            "INSERT INTO t (tags) VALUES (?1)",
            &[Value::Array(vec!["a".into(), 1.into()])],
        )
        .unwrap();
        let rows = db.query("SELECT tags FROM t", &[]).unwrap();
        assert_eq!(rows[0].get_named::<String>("tags").unwrap(), r#"["a",1]"#);
    }

    #[test]
    fn test_bad_sql_is_query_error() {
        let db = SqliteDatabase::open_memory().unwrap();
        let err = db.execute("INSERT INTO missing VALUES (1)", &[]).unwrap_err();
        assert!(matches!(err, Error::Query(_)));
        assert_eq!(err.sql(), Some("INSERT INTO missing VALUES (1)"));
    }

    #[test]
    fn test_transaction_state_checks() {
        let db = SqliteDatabase::open_memory().unwrap();
        let err = db.commit().unwrap_err();
        assert!(matches!(
            err,
            Error::Transaction(TransactionError {
                kind: TransactionErrorKind::NotActive,
                ..
            })
        ));

        db.begin().unwrap();
        assert!(db.in_transaction());
        let err = db.begin().unwrap_err();
        assert!(matches!(
            err,
            Error::Transaction(TransactionError {
                kind: TransactionErrorKind::AlreadyActive,
                ..
            })
        ));
        db.rollback().unwrap();
        assert!(!db.in_transaction());
    }

    #[test]
    fn test_transaction_state_follows_engine() {
        let db = SqliteDatabase::open_memory().unwrap();
        db.execute_raw("CREATE TABLE t (a INTEGER)").unwrap();

        db.begin().unwrap();
        db.execute("INSERT INTO t (a) VALUES (?1)", &[1.into()]).unwrap();
        // Ended behind the handle's back, as SQLite does on SQLITE_FULL.
        db.execute_raw("ROLLBACK").unwrap();
        assert!(!db.in_transaction());

        let err = db.rollback().unwrap_err();
        assert!(matches!(
            err,
            Error::Transaction(TransactionError {
                kind: TransactionErrorKind::NotActive,
                ..
            })
        ));

        db.begin().unwrap();
        assert!(db.in_transaction());
        db.execute("INSERT INTO t (a) VALUES (?1)", &[2.into()]).unwrap();
        db.commit().unwrap();
        assert!(!db.in_transaction());
        assert_eq!(db.count_rows("t").unwrap(), 1);
    }

    #[test]
    fn test_constraint_kind() {
        let db = SqliteDatabase::open_memory().unwrap();
        db.execute_raw("CREATE TABLE t (a INTEGER PRIMARY KEY)").unwrap();
        db.execute("INSERT INTO t (a) VALUES (?1)", &[1.into()]).unwrap();
        let err = db.execute("INSERT INTO t (a) VALUES (?1)", &[1.into()]).unwrap_err();
        let Error::Query(q) = err else {
            panic!("expected query error");
        };
        assert_eq!(q.kind, QueryErrorKind::Constraint);
    }
}
