//! SQL dialects understood by the query and schema builders.

use crate::identifiers::{quote_ident, quote_ident_mysql};

/// SQL dialect for generating database-specific SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// PostgreSQL dialect (uses $1, $2 placeholders)
    Postgres,
    /// SQLite dialect (uses ?1, ?2 placeholders)
    Sqlite,
    /// MySQL dialect (uses ? placeholders)
    #[default]
    Mysql,
}

impl Dialect {
    /// Generate a placeholder for the given parameter index (1-based).
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite => format!("?{index}"),
            Dialect::Mysql => "?".to_string(),
        }
    }

    /// Quote an identifier for this dialect.
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Dialect::Postgres | Dialect::Sqlite => quote_ident(name),
            Dialect::Mysql => quote_ident_mysql(name),
        }
    }

    /// Statement that turns foreign key enforcement off (`false`) or back on (`true`).
    pub const fn foreign_key_checks_sql(self, enabled: bool) -> &'static str {
        match (self, enabled) {
            (Dialect::Mysql, false) => "SET FOREIGN_KEY_CHECKS=0;",
            (Dialect::Mysql, true) => "SET FOREIGN_KEY_CHECKS=1;",
            (Dialect::Sqlite, false) => "PRAGMA foreign_keys = OFF;",
            (Dialect::Sqlite, true) => "PRAGMA foreign_keys = ON;",
            (Dialect::Postgres, false) => "SET session_replication_role = 'replica';",
            (Dialect::Postgres, true) => "SET session_replication_role = 'origin';",
        }
    }

    /// Most bound parameters one statement may carry.
    ///
    /// SQLite's default `SQLITE_MAX_VARIABLE_NUMBER` is 32766; PostgreSQL
    /// and MySQL encode the parameter count as a 16-bit integer.
    pub const fn max_params(self) -> usize {
        match self {
            Dialect::Sqlite => 32_766,
            Dialect::Postgres | Dialect::Mysql => 65_535,
        }
    }

    /// Lowercase name, used in log fields.
    pub const fn name(self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
            Dialect::Mysql => "mysql",
        }
    }
}
