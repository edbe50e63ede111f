//! Field and column definitions.

use crate::dialect::Dialect;
use crate::types::SqlType;

/// Referential action for foreign key constraints (ON DELETE / ON UPDATE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferentialAction {
    /// No action - raise error if any references exist.
    #[default]
    NoAction,
    /// Restrict - same as NO ACTION.
    Restrict,
    /// Cascade - automatically delete/update referencing rows.
    Cascade,
    /// Set null - set referencing columns to NULL.
    SetNull,
    /// Set default - set referencing columns to their default values.
    SetDefault,
}

impl ReferentialAction {
    /// Get the SQL representation of this action.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }
}

/// Metadata about a model field/column.
///
/// Built with const builder methods so models can expose their columns as a
/// `&'static [FieldInfo]`:
///
/// ```
/// use seedkit_core::{FieldInfo, SqlType};
///
/// const FIELDS: &[FieldInfo] = &[
///     FieldInfo::new("id", SqlType::BigInt).primary_key(true).auto_increment(true),
///     FieldInfo::new("email", SqlType::VarChar(255)).unique(true),
///     FieldInfo::new("nickname", SqlType::Text).nullable(true),
/// ];
/// assert_eq!(FIELDS[1].column_name, "email");
/// ```
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Database column name
    pub column_name: &'static str,
    /// SQL type for this field
    pub sql_type: SqlType,
    /// Explicit SQL type string, takes precedence over `sql_type` in DDL.
    pub sql_type_override: Option<&'static str>,
    /// Whether this field is nullable
    pub nullable: bool,
    /// Whether this is a primary key
    pub primary_key: bool,
    /// Whether this field auto-increments
    pub auto_increment: bool,
    /// Whether this field has a unique constraint
    pub unique: bool,
    /// Default value expression (SQL)
    pub default: Option<&'static str>,
    /// Foreign key reference (`table.column`)
    pub foreign_key: Option<&'static str>,
    /// Referential action for ON DELETE (only valid with foreign_key)
    pub on_delete: Option<ReferentialAction>,
}

impl FieldInfo {
    /// Create a new non-null column.
    pub const fn new(column_name: &'static str, sql_type: SqlType) -> Self {
        Self {
            column_name,
            sql_type,
            sql_type_override: None,
            nullable: false,
            primary_key: false,
            auto_increment: false,
            unique: false,
            default: None,
            foreign_key: None,
            on_delete: None,
        }
    }

    /// Set explicit SQL type override.
    pub const fn sql_type_override(mut self, type_str: &'static str) -> Self {
        self.sql_type_override = Some(type_str);
        self
    }

    /// Set nullable flag.
    pub const fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Set primary key flag.
    pub const fn primary_key(mut self, value: bool) -> Self {
        self.primary_key = value;
        self
    }

    /// Set auto-increment flag.
    pub const fn auto_increment(mut self, value: bool) -> Self {
        self.auto_increment = value;
        self
    }

    /// Set unique constraint flag.
    pub const fn unique(mut self, value: bool) -> Self {
        self.unique = value;
        self
    }

    /// Set default value expression.
    pub const fn default(mut self, expr: &'static str) -> Self {
        self.default = Some(expr);
        self
    }

    /// Set foreign key reference (`table.column`).
    pub const fn foreign_key(mut self, reference: &'static str) -> Self {
        self.foreign_key = Some(reference);
        self
    }

    /// Set ON DELETE action.
    pub const fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Get the effective SQL type name for DDL generation.
    #[must_use]
    pub fn effective_sql_type(&self, dialect: Dialect) -> String {
        match self.sql_type_override {
            Some(override_str) => override_str.to_string(),
            None => self.sql_type.sql_name(dialect),
        }
    }

    /// Split the foreign key reference into `(table, column)`.
    ///
    /// A reference without a column part points at `id`.
    pub fn foreign_key_target(&self) -> Option<(&'static str, &'static str)> {
        let reference = self.foreign_key?;
        Some(reference.split_once('.').unwrap_or((reference, "id")))
    }
}
