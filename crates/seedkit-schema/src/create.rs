//! CREATE TABLE statement builder.

use seedkit_core::{Dialect, FieldInfo, ModelRef, SqlType};

/// Builder for CREATE TABLE statements.
#[derive(Debug)]
pub struct CreateTable<'a> {
    model: &'a ModelRef,
    if_not_exists: bool,
}

impl<'a> CreateTable<'a> {
    /// Create a new CREATE TABLE builder.
    pub fn new(model: &'a ModelRef) -> Self {
        Self {
            model,
            if_not_exists: false,
        }
    }

    /// Toggle the IF NOT EXISTS clause.
    pub fn if_not_exists(mut self, value: bool) -> Self {
        self.if_not_exists = value;
        self
    }

    /// Build the CREATE TABLE SQL.
    pub fn build(&self, dialect: Dialect) -> String {
        let table = self.model.table_name;
        let mut sql = String::from("CREATE TABLE ");

        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }

        sql.push_str(&dialect.quote_identifier(table));
        sql.push_str(" (\n  ");

        let inline_pk = self.inline_sqlite_pk(dialect);
        let mut column_defs = Vec::new();
        let mut constraints = Vec::new();

        for field in self.model.fields {
            let inline = inline_pk == Some(field.column_name);
            column_defs.push(column_definition(field, dialect, inline));

            if field.unique && !field.primary_key {
                constraints.push(format!(
                    "CONSTRAINT {} UNIQUE ({})",
                    dialect.quote_identifier(&format!("uk_{}_{}", table, field.column_name)),
                    dialect.quote_identifier(field.column_name)
                ));
            }

            if let Some((ref_table, ref_column)) = field.foreign_key_target() {
                let mut fk = format!(
                    "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
                    dialect.quote_identifier(&format!("fk_{}_{}", table, field.column_name)),
                    dialect.quote_identifier(field.column_name),
                    dialect.quote_identifier(ref_table),
                    dialect.quote_identifier(ref_column)
                );
                if let Some(action) = field.on_delete {
                    fk.push_str(" ON DELETE ");
                    fk.push_str(action.as_sql());
                }
                constraints.push(fk);
            }
        }

        let pk_cols = self.model.primary_key;
        if inline_pk.is_none() && !pk_cols.is_empty() {
            let cols: Vec<_> = pk_cols.iter().map(|c| dialect.quote_identifier(c)).collect();
            constraints.insert(0, format!("PRIMARY KEY ({})", cols.join(", ")));
        }

        let all_parts: Vec<_> = column_defs.into_iter().chain(constraints).collect();

        sql.push_str(&all_parts.join(",\n  "));
        sql.push_str("\n)");

        sql
    }

    /// SQLite only accepts AUTOINCREMENT on an inline `INTEGER PRIMARY KEY`.
    fn inline_sqlite_pk(&self, dialect: Dialect) -> Option<&'static str> {
        if dialect != Dialect::Sqlite {
            return None;
        }
        match self.model.primary_key {
            [pk] => self
                .model
                .field(pk)
                .filter(|f| f.auto_increment)
                .map(|f| f.column_name),
            _ => None,
        }
    }
}

fn column_definition(field: &FieldInfo, dialect: Dialect, inline_pk: bool) -> String {
    let name = dialect.quote_identifier(field.column_name);

    if inline_pk {
        return format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", name);
    }

    let serial =
        field.auto_increment && dialect == Dialect::Postgres && field.sql_type.is_integer();
    let sql_type = if serial {
        match field.sql_type {
            SqlType::BigInt => "BIGSERIAL".to_string(),
            _ => "SERIAL".to_string(),
        }
    } else {
        field.effective_sql_type(dialect)
    };

    let mut def = format!("{} {}", name, sql_type);

    if !field.nullable || field.primary_key {
        def.push_str(" NOT NULL");
    }

    if field.auto_increment && dialect == Dialect::Mysql {
        def.push_str(" AUTO_INCREMENT");
    }

    if let Some(default) = field.default {
        def.push_str(" DEFAULT ");
        def.push_str(default);
    }

    def
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedkit_core::{FieldInfo, Model, ReferentialAction};

    struct TestHero;

    impl Model for TestHero {
        const TABLE_NAME: &'static str = "heroes";
        const PRIMARY_KEY: &'static [&'static str] = &["id"];

        fn fields() -> &'static [FieldInfo] {
            const FIELDS: &[FieldInfo] = &[
                FieldInfo::new("id", SqlType::BigInt)
                    .primary_key(true)
                    .auto_increment(true),
                FieldInfo::new("name", SqlType::Text).unique(true),
                FieldInfo::new("age", SqlType::Integer).nullable(true),
                FieldInfo::new("team_id", SqlType::BigInt)
                    .nullable(true)
                    .foreign_key("teams.id")
                    .on_delete(ReferentialAction::SetNull),
            ];
            FIELDS
        }
    }

    struct Setting;

    impl Model for Setting {
        const TABLE_NAME: &'static str = "settings";
        const PRIMARY_KEY: &'static [&'static str] = &["key"];

        fn fields() -> &'static [FieldInfo] {
            const FIELDS: &[FieldInfo] = &[
                FieldInfo::new("key", SqlType::VarChar(64)).primary_key(true),
                FieldInfo::new("is_active", SqlType::Boolean).default("1"),
            ];
            FIELDS
        }
    }

    fn hero() -> ModelRef {
        ModelRef::of::<TestHero>("app.models.Hero")
    }

    #[test]
    fn test_create_table_sqlite() {
        let model = hero();
        let sql = CreateTable::new(&model).build(Dialect::Sqlite);
        assert!(sql.starts_with("CREATE TABLE \"heroes\""));
        assert!(sql.contains("\"id\" INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("\"name\" TEXT NOT NULL"));
        assert!(sql.contains("\"age\" INTEGER,"));
        assert!(!sql.contains("PRIMARY KEY (\"id\")"));
    }

    #[test]
    fn test_create_table_if_not_exists() {
        let model = hero();
        let sql = CreateTable::new(&model).if_not_exists(true).build(Dialect::Sqlite);
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"heroes\""));
    }

    #[test]
    fn test_create_table_mysql_auto_increment() {
        let model = hero();
        let sql = CreateTable::new(&model).build(Dialect::Mysql);
        assert!(sql.contains("`id` BIGINT NOT NULL AUTO_INCREMENT"));
        assert!(sql.contains("PRIMARY KEY (`id`)"));
    }

    #[test]
    fn test_create_table_postgres_serial() {
        let model = hero();
        let sql = CreateTable::new(&model).build(Dialect::Postgres);
        assert!(sql.contains("\"id\" BIGSERIAL NOT NULL"));
        assert!(sql.contains("PRIMARY KEY (\"id\")"));
    }

    #[test]
    fn test_create_table_unique_and_foreign_key() {
        let model = hero();
        let sql = CreateTable::new(&model).build(Dialect::Sqlite);
        assert!(sql.contains("CONSTRAINT \"uk_heroes_name\" UNIQUE (\"name\")"));
        assert!(sql.contains(
            "CONSTRAINT \"fk_heroes_team_id\" FOREIGN KEY (\"team_id\") REFERENCES \"teams\"(\"id\") ON DELETE SET NULL"
        ));
    }

    #[test]
    fn test_create_table_default_and_table_pk() {
        let model = ModelRef::of::<Setting>("app.models.Setting");
        let sql = CreateTable::new(&model).build(Dialect::Sqlite);
        assert!(sql.contains("\"key\" VARCHAR(64) NOT NULL"));
        assert!(sql.contains("\"is_active\" BOOLEAN NOT NULL DEFAULT 1"));
        assert!(sql.contains("PRIMARY KEY (\"key\")"));
    }
}
