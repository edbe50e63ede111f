//! End-to-end seeding into SQLite.

use seedkit::prelude::*;
use seedkit::FixturePath;
use seedkit_sqlite::SqliteDatabase;

struct Author;

impl Model for Author {
    const TABLE_NAME: &'static str = "authors";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[
            FieldInfo::new("id", SqlType::BigInt)
                .primary_key(true)
                .auto_increment(true),
            FieldInfo::new("name", SqlType::VarChar(80)).unique(true),
            FieldInfo::new("active", SqlType::Boolean).nullable(true),
        ];
        FIELDS
    }
}

struct Book;

impl Model for Book {
    const TABLE_NAME: &'static str = "books";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[
            FieldInfo::new("id", SqlType::BigInt)
                .primary_key(true)
                .auto_increment(true),
            FieldInfo::new("title", SqlType::Text),
            FieldInfo::new("tags", SqlType::Json).nullable(true),
            FieldInfo::new("author_id", SqlType::BigInt)
                .foreign_key("authors.id")
                .on_delete(ReferentialAction::Cascade),
        ];
        FIELDS
    }
}

const AUTHORS_YAML: &str = "\
- model: library.models.Author
  pk: 1
  fields:
    id: 1
    name: Ursula
- model: library.models.Author
  fields:
    id: 2
    name: Octavia
    active: false
";

const BOOKS_JSON: &str = r#"[
  {"model": "library.models.Book", "fields": {"title": "Kindred", "author_id": 2, "tags": ["classic", "sf"]}},
  {"model": "library.models.Book", "fields": {"title": "The Dispossessed", "author_id": 1}}
]"#;

fn registry() -> ModelRegistry {
    ModelRegistry::new()
        .with::<Author>("library.models.Author")
        .and_then(|r| r.with::<Book>("library.models.Book"))
        .unwrap()
}

fn seeder_for(dir: &std::path::Path, files: &[&str]) -> Seeder<SqliteDatabase> {
    Seeder::new(registry())
        .with_database(SqliteDatabase::open_memory().unwrap())
        .with_config(
            SeedConfig::new()
                .path(dir)
                .fixture_files(files.iter().copied()),
        )
}

#[test]
fn seeds_fixture_files_into_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("authors.yaml"), AUTHORS_YAML).unwrap();
    std::fs::write(dir.path().join("books.json"), BOOKS_JSON).unwrap();

    let seeder = seeder_for(dir.path(), &["authors.yaml", "books.json"]);
    seeder.create_table_all(None, true).unwrap();
    let report = seeder.db_data_input(None, Some(false)).unwrap();
    assert_eq!(report.total_rows(), 4);

    let db = seeder.database().unwrap();
    assert!(!db.in_transaction());
    assert_eq!(db.count_rows("authors").unwrap(), 2);
    assert_eq!(db.count_rows("books").unwrap(), 2);

    let rows = db
        .query(
            "SELECT b.title, b.tags, a.name FROM books b JOIN authors a ON a.id = b.author_id ORDER BY b.id",
            &[],
        )
        .unwrap();
    assert_eq!(rows[0].get_named::<String>("name").unwrap(), "Octavia");
    assert_eq!(
        rows[0].get_named::<String>("tags").unwrap(),
        r#"["classic","sf"]"#
    );
    assert_eq!(rows[1].get_named::<Option<String>>("tags").unwrap(), None);

    let active = db
        .query("SELECT active FROM authors ORDER BY id", &[])
        .unwrap();
    assert_eq!(active[0].get_named::<Option<i64>>("active").unwrap(), None);
    assert_eq!(active[1].get_named::<Option<i64>>("active").unwrap(), Some(0));
}

#[test]
fn failing_model_leaves_no_rows_behind() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("authors.yaml"), AUTHORS_YAML).unwrap();
    std::fs::write(
        dir.path().join("dupes.yaml"),
        "- model: library.models.Book\n  fields: {title: Orphan, author_id: 99}\n",
    )
    .unwrap();

    let seeder = seeder_for(dir.path(), &["authors.yaml", "dupes.yaml"]);
    seeder.create_table_all(None, true).unwrap();

    let err = seeder.db_data_input(None, Some(false)).unwrap_err();
    assert!(err.is_rolled_back(), "got: {err}");

    let db = seeder.database().unwrap();
    assert!(!db.in_transaction());
    assert_eq!(db.count_rows("authors").unwrap(), 0);
    assert_eq!(db.count_rows("books").unwrap(), 0);
}

#[test]
fn disabling_foreign_key_checks_allows_out_of_order_fixtures() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("books.json"), BOOKS_JSON).unwrap();
    std::fs::write(dir.path().join("authors.yaml"), AUTHORS_YAML).unwrap();

    let seeder = seeder_for(dir.path(), &["books.json", "authors.yaml"]);
    seeder.create_table_all(None, true).unwrap();

    assert!(seeder.db_data_input(None, Some(false)).unwrap_err().is_rolled_back());

    let report = seeder.db_data_input(None, Some(true)).unwrap();
    assert_eq!(report.entries[0].model, "library.models.Book");
    assert_eq!(seeder.database().unwrap().count_rows("books").unwrap(), 2);
}

#[test]
fn create_then_drop_all_tables() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("books.json"), BOOKS_JSON).unwrap();
    std::fs::write(dir.path().join("authors.yaml"), AUTHORS_YAML).unwrap();

    let seeder = seeder_for(dir.path(), &["books.json", "authors.yaml"]);
    seeder.create_table_all(None, true).unwrap();
    seeder.create_table_all(None, true).unwrap();
    assert!(matches!(
        seeder.create_table_all(None, false),
        Err(Error::Schema(_))
    ));

    seeder.drop_table_all(None, Some(true)).unwrap();
    let db = seeder.database().unwrap();
    assert!(db.count_rows("books").is_err());
    assert!(db.count_rows("authors").is_err());
}

#[test]
fn latin1_fixtures_need_the_right_encoding() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("authors.yml"),
        b"- model: library.models.Author\n  fields: {name: Jos\xe9}\n",
    )
    .unwrap();

    let mut seeder = seeder_for(dir.path(), &["authors.yml"]);
    seeder.create_table_all(None, true).unwrap();
    assert!(matches!(
        seeder.db_data_input(None, Some(false)),
        Err(Error::Fixture(_))
    ));

    seeder.set_encoding(TextEncoding::Latin1);
    seeder.db_data_input(None, Some(false)).unwrap();
    let rows = seeder
        .database()
        .unwrap()
        .query("SELECT name FROM authors", &[])
        .unwrap();
    assert_eq!(rows[0].get_named::<String>("name").unwrap(), "José");
}

#[test]
fn seeds_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let fixtures = dir.path().join("fixtures");
    std::fs::create_dir(&fixtures).unwrap();
    std::fs::write(fixtures.join("authors.yaml"), AUTHORS_YAML).unwrap();

    let config_path = dir.path().join("seed.json");
    let config_json = serde_json::json!({
        "path": [fixtures.join("missing"), fixtures],
        "fixture_files": ["authors.yaml"],
    });
    std::fs::write(&config_path, config_json.to_string()).unwrap();

    let config = SeedConfig::from_file(&config_path).unwrap();
    assert!(matches!(config.path, Some(FixturePath::Many(ref dirs)) if dirs.len() == 2));

    let seeder = Seeder::new(registry())
        .with_database(SqliteDatabase::open_memory().unwrap())
        .with_config(config);
    seeder.create_table_all(None, true).unwrap();
    let report = seeder.db_data_input(None, Some(false)).unwrap();
    assert_eq!(report.total_rows(), 2);
}

#[test]
fn seeds_more_rows_than_one_statement_can_bind() {
    // 12000 rows x 3 columns is over SQLite's 32766 bound-parameter limit
    let authors: Vec<_> = (1..=12_000)
        .map(|i| {
            serde_json::json!({
                "model": "library.models.Author",
                "fields": {"id": i, "name": format!("author-{i}"), "active": i % 2 == 0},
            })
        })
        .collect();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("authors.json"),
        serde_json::Value::Array(authors).to_string(),
    )
    .unwrap();

    let seeder = seeder_for(dir.path(), &["authors.json"]);
    seeder.create_table_all(None, true).unwrap();
    let report = seeder.db_data_input(None, Some(false)).unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.total_rows(), 12_000);
    assert_eq!(report.entries[0].affected, 12_000);
    let db = seeder.database().unwrap();
    assert!(!db.in_transaction());
    assert_eq!(db.count_rows("authors").unwrap(), 12_000);
}
