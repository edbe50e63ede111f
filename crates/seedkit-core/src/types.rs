//! SQL column types.

use crate::dialect::Dialect;

/// SQL data types a model field can declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlType {
    // Integer types
    SmallInt,
    Integer,
    BigInt,

    // Floating point
    Real,
    Double,

    // Fixed precision
    Decimal { precision: u8, scale: u8 },

    Boolean,

    // String types
    VarChar(u32),
    Text,

    Blob,

    // Date/time types
    Date,
    DateTime,
    Timestamp,

    Json,

    // Custom type name
    Custom(&'static str),
}

impl SqlType {
    /// Get the SQL type name for this type in the given dialect.
    pub fn sql_name(&self, dialect: Dialect) -> String {
        match self {
            SqlType::SmallInt => "SMALLINT".to_string(),
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Real => "REAL".to_string(),
            SqlType::Double => match dialect {
                Dialect::Mysql => "DOUBLE".to_string(),
                Dialect::Postgres | Dialect::Sqlite => "DOUBLE PRECISION".to_string(),
            },
            SqlType::Decimal { precision, scale } => format!("DECIMAL({}, {})", precision, scale),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::VarChar(len) => format!("VARCHAR({})", len),
            SqlType::Text => "TEXT".to_string(),
            SqlType::Blob => match dialect {
                Dialect::Postgres => "BYTEA".to_string(),
                Dialect::Mysql | Dialect::Sqlite => "BLOB".to_string(),
            },
            SqlType::Date => "DATE".to_string(),
            SqlType::DateTime => match dialect {
                Dialect::Postgres => "TIMESTAMP".to_string(),
                Dialect::Mysql | Dialect::Sqlite => "DATETIME".to_string(),
            },
            SqlType::Timestamp => "TIMESTAMP".to_string(),
            SqlType::Json => match dialect {
                Dialect::Sqlite => "TEXT".to_string(),
                Dialect::Mysql | Dialect::Postgres => "JSON".to_string(),
            },
            SqlType::Custom(name) => (*name).to_string(),
        }
    }

    /// Check if this is an integer type (eligible for auto-increment).
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            SqlType::SmallInt | SqlType::Integer | SqlType::BigInt
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_names() {
        assert_eq!(SqlType::VarChar(255).sql_name(Dialect::Mysql), "VARCHAR(255)");
        assert_eq!(
            SqlType::Decimal {
                precision: 10,
                scale: 2
            }
            .sql_name(Dialect::Sqlite),
            "DECIMAL(10, 2)"
        );
        assert_eq!(SqlType::Custom("CITEXT").sql_name(Dialect::Postgres), "CITEXT");
    }

    #[test]
    fn test_dialect_specific_names() {
        assert_eq!(SqlType::Blob.sql_name(Dialect::Postgres), "BYTEA");
        assert_eq!(SqlType::Json.sql_name(Dialect::Sqlite), "TEXT");
        assert_eq!(SqlType::Double.sql_name(Dialect::Mysql), "DOUBLE");
    }

    #[test]
    fn test_is_integer() {
        assert!(SqlType::BigInt.is_integer());
        assert!(!SqlType::Text.is_integer());
    }
}
