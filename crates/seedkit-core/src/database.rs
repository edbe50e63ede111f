//! Database handle contract.
//!
//! This module defines what the seeder needs from a database:
//!
//! - [`Database`] - table creation/dropping, raw and parameterized
//!   statements, and transaction control
//! - [`Transaction`] - scoped guard that rolls back if dropped unfinalized
//!
//! Handles are synchronous and blocking. A handle is owned by the caller and
//! only borrowed by the operations here.

use crate::dialect::Dialect;
use crate::error::Result;
use crate::model::ModelRef;
use crate::value::Value;

/// A database handle capable of managing tables and executing statements.
///
/// # Example
///
/// ```rust,ignore
/// db.create_tables(&[user, order], true)?;
///
/// let tx = db.transaction()?;
/// db.execute("INSERT INTO users (name) VALUES (?1)", &[Value::from("alice")])?;
/// tx.commit()?;
/// ```
pub trait Database {
    /// SQL dialect spoken by this handle.
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    /// Create tables for the given models.
    ///
    /// With `safe` set, tables that already exist are left alone.
    fn create_tables(&self, models: &[ModelRef], safe: bool) -> Result<()>;

    /// Drop tables for the given models.
    fn drop_tables(&self, models: &[ModelRef]) -> Result<()>;

    /// Execute raw SQL without parameters and return rows affected.
    fn execute_sql(&self, sql: &str) -> Result<u64>;

    /// Execute a parameterized statement and return rows affected.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Begin a transaction.
    fn begin(&self) -> Result<()>;

    /// Commit the open transaction.
    fn commit(&self) -> Result<()>;

    /// Roll back the open transaction.
    fn rollback(&self) -> Result<()>;

    /// Begin a transaction and return a guard for it.
    fn transaction(&self) -> Result<Transaction<'_, Self>>
    where
        Self: Sized,
    {
        self.begin()?;
        Ok(Transaction {
            db: self,
            finalized: false,
        })
    }
}

/// An open transaction on a [`Database`].
///
/// Must be finished with [`commit`](Self::commit) or
/// [`rollback`](Self::rollback). Dropping it unfinished rolls back.
#[must_use = "dropping a Transaction rolls it back"]
pub struct Transaction<'db, D: Database> {
    db: &'db D,
    finalized: bool,
}

impl<'db, D: Database> Transaction<'db, D> {
    /// The database this transaction runs on.
    pub fn database(&self) -> &'db D {
        self.db
    }

    /// Commit the transaction.
    pub fn commit(mut self) -> Result<()> {
        self.finalized = true;
        self.db.commit()
    }

    /// Roll back the transaction.
    pub fn rollback(mut self) -> Result<()> {
        self.finalized = true;
        self.db.rollback()
    }
}

impl<D: Database> Drop for Transaction<'_, D> {
    fn drop(&mut self) {
        if !self.finalized {
            if let Err(e) = self.db.rollback() {
                tracing::error!(error = %e, "rollback of abandoned transaction failed");
            }
        }
    }
}

impl<D: Database> std::fmt::Debug for Transaction<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("finalized", &self.finalized)
            .finish_non_exhaustive()
    }
}

impl<D: Database + ?Sized> Database for &D {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn create_tables(&self, models: &[ModelRef], safe: bool) -> Result<()> {
        (**self).create_tables(models, safe)
    }

    fn drop_tables(&self, models: &[ModelRef]) -> Result<()> {
        (**self).drop_tables(models)
    }

    fn execute_sql(&self, sql: &str) -> Result<u64> {
        (**self).execute_sql(sql)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        (**self).execute(sql, params)
    }

    fn begin(&self) -> Result<()> {
        (**self).begin()
    }

    fn commit(&self) -> Result<()> {
        (**self).commit()
    }

    fn rollback(&self) -> Result<()> {
        (**self).rollback()
    }
}
