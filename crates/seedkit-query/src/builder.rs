//! Multi-row INSERT builder.

use indexmap::IndexSet;
use seedkit_core::{Database, Dialect, FieldMap, ModelRef, Result, Value};

/// Bulk INSERT builder.
///
/// Columns are the union of the rows' keys in first-seen order. A row that
/// lacks a column binds NULL for it.
#[derive(Debug)]
pub struct InsertMany<'a> {
    model: &'a ModelRef,
    rows: Vec<FieldMap>,
    chunk_size: Option<usize>,
}

impl<'a> InsertMany<'a> {
    /// Create a new bulk INSERT for the given model.
    pub fn new(model: &'a ModelRef, rows: Vec<FieldMap>) -> Self {
        Self {
            model,
            rows,
            chunk_size: None,
        }
    }

    /// Split the rows into statements of at most `size` rows each.
    ///
    /// A size of zero means no explicit limit. Either way a statement never
    /// binds more parameters than [`Dialect::max_params`] allows.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = (size > 0).then_some(size);
        self
    }

    /// Number of rows to insert.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Union of row keys in first-seen order.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns: IndexSet<&str> = IndexSet::new();
        for row in &self.rows {
            columns.extend(row.keys().map(String::as_str));
        }
        columns.into_iter().collect()
    }

    /// Build the INSERT statements and their parameters.
    ///
    /// Returns no statements when there are no rows.
    pub fn build(&self, dialect: Dialect) -> Vec<(String, Vec<Value>)> {
        if self.rows.is_empty() {
            return Vec::new();
        }

        let columns = self.columns();
        let chunk = if columns.is_empty() {
            if dialect == Dialect::Mysql {
                self.chunk_size.unwrap_or(self.rows.len())
            } else {
                1
            }
        } else {
            // Never exceed the dialect's bound-parameter limit.
            let max_rows = (dialect.max_params() / columns.len()).max(1);
            self.chunk_size.unwrap_or(self.rows.len()).min(max_rows)
        };
        let column_list = if columns.is_empty() {
            String::new()
        } else {
            let quoted: Vec<_> = columns.iter().map(|c| dialect.quote_identifier(c)).collect();
            format!(" ({})", quoted.join(", "))
        };

        self.rows
            .chunks(chunk)
            .map(|rows| self.build_chunk(dialect, &columns, &column_list, rows))
            .collect()
    }

    fn build_chunk(
        &self,
        dialect: Dialect,
        columns: &[&str],
        column_list: &str,
        rows: &[FieldMap],
    ) -> (String, Vec<Value>) {
        let table = dialect.quote_identifier(self.model.table_name);

        // Rows with no columns at all can only take defaults. Only MySQL
        // accepts several such rows in one statement.
        if columns.is_empty() {
            let sql = match dialect {
                Dialect::Mysql => {
                    let tuples = vec!["()"; rows.len()];
                    format!("INSERT INTO {}{} VALUES {}", table, column_list, tuples.join(", "))
                }
                Dialect::Postgres | Dialect::Sqlite => {
                    format!("INSERT INTO {} DEFAULT VALUES", table)
                }
            };
            return (sql, Vec::new());
        }

        let mut params = Vec::with_capacity(rows.len() * columns.len());
        let mut tuples = Vec::with_capacity(rows.len());

        for row in rows {
            let mut placeholders = Vec::with_capacity(columns.len());
            for column in columns {
                params.push(row.get(*column).cloned().unwrap_or(Value::Null));
                placeholders.push(dialect.placeholder(params.len()));
            }
            tuples.push(format!("({})", placeholders.join(", ")));
        }

        let sql = format!(
            "INSERT INTO {}{} VALUES {}",
            table,
            column_list,
            tuples.join(", ")
        );

        (sql, params)
    }

    /// Execute the INSERT statements and return the total rows affected.
    pub fn execute<D: Database>(self, db: &D) -> Result<u64> {
        let dialect = db.dialect();
        let mut affected = 0;
        for (sql, params) in self.build(dialect) {
            tracing::trace!(sql = %sql, params = params.len(), "insert_many");
            affected += db.execute(&sql, &params)?;
        }
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedkit_core::{FieldInfo, Model, SqlType};

    struct User;

    impl Model for User {
        const TABLE_NAME: &'static str = "users";
        const PRIMARY_KEY: &'static [&'static str] = &["id"];

        fn fields() -> &'static [FieldInfo] {
            const FIELDS: &[FieldInfo] = &[
                FieldInfo::new("id", SqlType::BigInt).primary_key(true),
                FieldInfo::new("name", SqlType::Text),
                FieldInfo::new("email", SqlType::Text).nullable(true),
            ];
            FIELDS
        }
    }

    fn row(pairs: &[(&str, Value)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn user() -> ModelRef {
        ModelRef::of::<User>("app.models.User")
    }

    #[test]
    fn test_single_statement_sqlite() {
        let model = user();
        let rows = vec![
            row(&[("id", 1.into()), ("name", "alice".into())]),
            row(&[("id", 2.into()), ("name", "bob".into())]),
        ];
        let statements = InsertMany::new(&model, rows).build(Dialect::Sqlite);
        assert_eq!(statements.len(), 1);
        let (sql, params) = &statements[0];
        assert_eq!(
            sql,
            "INSERT INTO \"users\" (\"id\", \"name\") VALUES (?1, ?2), (?3, ?4)"
        );
        assert_eq!(
            params,
            &vec![
                Value::BigInt(1),
                Value::from("alice"),
                Value::BigInt(2),
                Value::from("bob")
            ]
        );
    }

    #[test]
    fn test_union_of_columns_binds_null() {
        let model = user();
        let rows = vec![
            row(&[("name", "alice".into())]),
            row(&[("email", "b@example.com".into()), ("name", "bob".into())]),
        ];
        let insert = InsertMany::new(&model, rows);
        assert_eq!(insert.columns(), vec!["name", "email"]);

        let statements = insert.build(Dialect::Mysql);
        let (sql, params) = &statements[0];
        assert_eq!(sql, "INSERT INTO `users` (`name`, `email`) VALUES (?, ?), (?, ?)");
        assert_eq!(params[1], Value::Null);
        assert_eq!(params[2], Value::from("b@example.com"));
        assert_eq!(params[3], Value::from("bob"));
    }

    #[test]
    fn test_postgres_placeholders_continue_across_rows() {
        let model = user();
        let rows = vec![row(&[("id", 1.into())]), row(&[("id", 2.into())])];
        let statements = InsertMany::new(&model, rows).build(Dialect::Postgres);
        assert_eq!(
            statements[0].0,
            "INSERT INTO \"users\" (\"id\") VALUES ($1), ($2)"
        );
    }

    #[test]
    fn test_chunk_size_splits_statements() {
        let model = user();
        let rows = (1..=5).map(|i| row(&[("id", Value::BigInt(i))])).collect();
        let statements = InsertMany::new(&model, rows)
            .chunk_size(2)
            .build(Dialect::Sqlite);
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[0].1.len(), 2);
        assert_eq!(statements[2].1, vec![Value::BigInt(5)]);
        // Placeholder numbering restarts per statement
        assert!(statements[1].0.ends_with("VALUES (?1), (?2)"));
    }

    #[test]
    fn test_statements_stay_under_parameter_limit() {
        let model = user();
        let rows: Vec<FieldMap> = (0..12_000)
            .map(|i| {
                row(&[
                    ("id", Value::BigInt(i)),
                    ("name", Value::from(format!("user{i}"))),
                    ("email", Value::Null),
                ])
            })
            .collect();

        let statements = InsertMany::new(&model, rows.clone()).build(Dialect::Sqlite);
        // 32766 / 3 columns = 10922 rows per statement
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].1.len(), 10_922 * 3);
        assert_eq!(statements[1].1.len(), (12_000 - 10_922) * 3);
        assert!(statements.iter().all(|(_, p)| p.len() <= Dialect::Sqlite.max_params()));
        assert!(statements[1].0.contains("(?1, ?2, ?3)"));

        // An explicit chunk size below the limit still wins
        let statements = InsertMany::new(&model, rows.clone())
            .chunk_size(5_000)
            .build(Dialect::Sqlite);
        assert_eq!(statements.len(), 3);

        // MySQL allows more parameters, so 12000 x 3 fits in one statement
        let statements = InsertMany::new(&model, rows).build(Dialect::Mysql);
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_empty_rows_build_nothing() {
        let model = user();
        let insert = InsertMany::new(&model, Vec::new());
        assert!(insert.is_empty());
        assert!(insert.build(Dialect::Sqlite).is_empty());
    }

    #[test]
    fn test_rows_without_columns_use_defaults() {
        let model = user();
        let rows = vec![FieldMap::new(), FieldMap::new()];
        let statements = InsertMany::new(&model, rows.clone()).build(Dialect::Mysql);
        assert_eq!(statements[0].0, "INSERT INTO `users` VALUES (), ()");

        let statements = InsertMany::new(&model, rows).build(Dialect::Sqlite);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].0, "INSERT INTO \"users\" DEFAULT VALUES");
    }
}
