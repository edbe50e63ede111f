//! Integration tests for the SQLite handle through the `Database` trait.

use seedkit_core::{Database, Error, FieldInfo, FieldMap, Model, ModelRef, SqlType, Value};
use seedkit_query::insert_many;
use seedkit_sqlite::{SqliteConfig, SqliteDatabase};

struct Team;

impl Model for Team {
    const TABLE_NAME: &'static str = "teams";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[
            FieldInfo::new("id", SqlType::BigInt)
                .primary_key(true)
                .auto_increment(true),
            FieldInfo::new("name", SqlType::VarChar(100)).unique(true),
        ];
        FIELDS
    }
}

struct Hero;

impl Model for Hero {
    const TABLE_NAME: &'static str = "heroes";
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    fn fields() -> &'static [FieldInfo] {
        const FIELDS: &[FieldInfo] = &[
            FieldInfo::new("id", SqlType::BigInt)
                .primary_key(true)
                .auto_increment(true),
            FieldInfo::new("name", SqlType::Text),
            FieldInfo::new("powers", SqlType::Json).nullable(true),
            FieldInfo::new("team_id", SqlType::BigInt)
                .nullable(true)
                .foreign_key("teams.id"),
        ];
        FIELDS
    }
}

fn models() -> Vec<ModelRef> {
    // Referencing table first; creation must still succeed
    vec![
        ModelRef::of::<Hero>("app.models.Hero"),
        ModelRef::of::<Team>("app.models.Team"),
    ]
}

fn row(pairs: &[(&str, Value)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

#[test]
fn create_insert_drop_roundtrip() {
    let db = SqliteDatabase::open_memory().unwrap();
    let models = models();
    db.create_tables(&models, true).unwrap();

    let team = &models[1];
    let hero = &models[0];
    let inserted = insert_many(team, vec![row(&[("id", 1.into()), ("name", "Avengers".into())])])
        .execute(&db)
        .unwrap();
    assert_eq!(inserted, 1);

    let inserted = insert_many(
        hero,
        vec![
            row(&[("name", "Thor".into()), ("team_id", 1.into())]),
            row(&[
                ("name", "Loki".into()),
                ("powers", Value::Array(vec!["illusion".into()])),
            ]),
        ],
    )
    .execute(&db)
    .unwrap();
    assert_eq!(inserted, 2);

    let rows = db
        .query("SELECT name, powers, team_id FROM heroes ORDER BY id", &[])
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get_named::<Option<i64>>("team_id").unwrap(), Some(1));
    assert_eq!(
        rows[1].get_named::<String>("powers").unwrap(),
        r#"["illusion"]"#
    );

    db.drop_tables(&models).unwrap();
    let remaining = db
        .query("SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('heroes', 'teams')", &[])
        .unwrap();
    assert!(remaining.is_empty());
}

#[test]
fn create_tables_safe_is_idempotent() {
    let db = SqliteDatabase::open_memory().unwrap();
    let models = models();
    db.create_tables(&models, true).unwrap();
    db.create_tables(&models, true).unwrap();

    let err = db.create_tables(&models, false).unwrap_err();
    assert!(matches!(err, Error::Schema(_)), "got {err:?}");
}

#[test]
fn foreign_keys_enforced_until_disabled() {
    let db = SqliteDatabase::open_memory().unwrap();
    let models = models();
    db.create_tables(&models, true).unwrap();

    let orphan = || {
        insert_many(&models[0], vec![row(&[("name", "Ghost".into()), ("team_id", 99.into())])])
            .execute(&db)
    };
    assert!(orphan().is_err());

    db.execute_sql(db.dialect().foreign_key_checks_sql(false)).unwrap();
    assert_eq!(orphan().unwrap(), 1);
}

#[test]
fn rollback_discards_inserts() {
    let db = SqliteDatabase::open_memory().unwrap();
    let models = models();
    db.create_tables(&models, true).unwrap();

    let tx = db.transaction().unwrap();
    insert_many(&models[1], vec![row(&[("name", "X-Men".into())])])
        .execute(&db)
        .unwrap();
    tx.rollback().unwrap();

    assert_eq!(db.count_rows("teams").unwrap(), 0);
}

#[test]
fn file_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seed.db");
    let path = path.to_str().unwrap().to_string();

    {
        let db = SqliteDatabase::open(&SqliteConfig::file(&path).busy_timeout(1000)).unwrap();
        db.create_tables(&models(), true).unwrap();
        let tx = db.transaction().unwrap();
        insert_many(&models()[1], vec![row(&[("name", "Defenders".into())])])
            .execute(&db)
            .unwrap();
        tx.commit().unwrap();
    }

    let db = SqliteDatabase::open_file(&path).unwrap();
    assert_eq!(db.count_rows("teams").unwrap(), 1);
}
