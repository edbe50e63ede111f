//! The fixture seeder.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use indexmap::IndexSet;
use serde::Serialize;

use seedkit_core::{Database, Error, ModelRef, ModelRegistry, Result};
use seedkit_query::insert_many;

use crate::config::{FixturePath, SeedConfig, TextEncoding};
use crate::fixture::{ClassFields, FixtureDocument, GroupedFixture, short_class_name};

/// Rows inserted for one model by [`Seeder::db_data_input`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedEntry {
    /// Dotted model path as written in the fixtures.
    pub model: String,
    /// Fixture rows sent to the database.
    pub rows: usize,
    /// Rows the database reported as affected.
    pub affected: u64,
}

/// Outcome of a successful [`Seeder::db_data_input`], in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub entries: Vec<SeedEntry>,
}

impl SeedReport {
    pub fn total_rows(&self) -> usize {
        self.entries.iter().map(|e| e.rows).sum()
    }

    pub fn get(&self, model: &str) -> Option<&SeedEntry> {
        self.entries.iter().find(|e| e.model == model)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loads fixture files and seeds them into a [`Database`].
///
/// Model paths found in fixtures (`app.models.User`) are resolved through
/// the [`ModelRegistry`] on every call; nothing is cached.
///
/// # Example
///
/// ```ignore
/// let registry = ModelRegistry::new()
///     .with::<User>("app.models.User")?
///     .with::<Order>("app.models.Order")?;
///
/// let seeder = Seeder::new(registry)
///     .with_database(db)
///     .with_config(SeedConfig::new().path("fixtures").fixture_files(["users.yaml"]));
///
/// seeder.create_table_all(None, true)?;
/// let report = seeder.db_data_input(None, None)?;
/// println!("seeded {} rows", report.total_rows());
/// ```
pub struct Seeder<D: Database> {
    db: Option<D>,
    config: SeedConfig,
    registry: ModelRegistry,
}

impl<D: Database> Seeder<D> {
    /// Create a seeder with no database and an empty configuration.
    pub fn new(registry: ModelRegistry) -> Self {
        Self {
            db: None,
            config: SeedConfig::default(),
            registry,
        }
    }

    pub fn with_database(mut self, db: D) -> Self {
        self.db = Some(db);
        self
    }

    pub fn with_config(mut self, config: SeedConfig) -> Self {
        self.config = config;
        self
    }

    pub fn set_database(&mut self, db: D) {
        self.db = Some(db);
    }

    pub fn set_path(&mut self, path: impl Into<FixturePath>) {
        self.config.path = Some(path.into());
    }

    pub fn set_fixture_files<I, S>(&mut self, files: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.fixture_files = files.into_iter().map(Into::into).collect();
    }

    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        self.config.encoding = encoding;
    }

    pub fn set_config(&mut self, config: SeedConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &SeedConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ModelRegistry {
        &mut self.registry
    }

    /// The database handle, or a configuration error if none is set.
    pub fn database(&self) -> Result<&D> {
        self.db
            .as_ref()
            .ok_or_else(|| Error::config("no database set; call set_database first"))
    }

    /// Give the database handle back to the caller.
    pub fn into_database(self) -> Option<D> {
        self.db
    }

    /// Resolve model paths to distinct models, in first-seen order.
    ///
    /// Without `models_path_list` the paths are taken from the fixtures
    /// (`fixture_data`, or the configured files when that is `None`).
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn get_tables(
        &self,
        models_path_list: Option<&[String]>,
        fixture_data: Option<&[FixtureDocument]>,
    ) -> Result<Vec<ModelRef>> {
        let derived;
        let paths = match models_path_list {
            Some(paths) => paths,
            None => {
                derived = self.load_fixtures(fixture_data)?.1;
                derived.as_slice()
            }
        };

        let mut tables: Vec<ModelRef> = Vec::new();
        for path in paths {
            let model = self.registry.resolve(path)?;
            if !tables.contains(&model) {
                tables.push(model);
            }
        }
        tracing::debug!(tables = tables.len(), "resolved tables");
        Ok(tables)
    }

    /// Create the tables of the given (or fixture-derived) models.
    ///
    /// With `not_exist_create`, existing tables are left alone.
    #[tracing::instrument(level = "debug", skip(self, models_path_list))]
    pub fn create_table_all(
        &self,
        models_path_list: Option<&[String]>,
        not_exist_create: bool,
    ) -> Result<()> {
        let db = self.database()?;
        let tables = self.get_tables(models_path_list, None)?;
        db.create_tables(&tables, not_exist_create)
    }

    /// Drop the tables of the given (or fixture-derived) models.
    ///
    /// With `foreign_key_checks` set, constraint checking is switched off
    /// before the drop and back on after it. `None` uses the configured
    /// [`SeedConfig::foreign_key_checks`]. If resolution or the drop fails the
    /// error is returned and checking stays off.
    #[tracing::instrument(level = "debug", skip(self, models_path_list))]
    pub fn drop_table_all(
        &self,
        models_path_list: Option<&[String]>,
        foreign_key_checks: Option<bool>,
    ) -> Result<()> {
        let db = self.database()?;
        let foreign_key_checks = self.foreign_key_checks(foreign_key_checks);
        let dialect = db.dialect();
        if foreign_key_checks {
            db.execute_sql(dialect.foreign_key_checks_sql(false))?;
        }

        let dropped = self
            .get_tables(models_path_list, None)
            .and_then(|tables| db.drop_tables(&tables));
        if let Err(e) = dropped {
            if foreign_key_checks {
                tracing::warn!(error = %e, "drop failed; foreign key checks left disabled");
            }
            return Err(e);
        }

        if foreign_key_checks {
            db.execute_sql(dialect.foreign_key_checks_sql(true))?;
        }
        Ok(())
    }

    /// Read fixture files using the configured encoding.
    ///
    /// `files` defaults to the configured fixture files.
    pub fn load_fixture_files(&self, files: Option<&[String]>) -> Result<Vec<FixtureDocument>> {
        self.load_fixture_files_with(files, self.config.encoding)
    }

    /// Read fixture files from every configured directory.
    ///
    /// Files that do not exist or whose extension is not `.yaml`, `.yml`
    /// or `.json` are skipped. Documents are returned directory by
    /// directory, then in `files` order.
    #[tracing::instrument(level = "debug", skip(self, files))]
    pub fn load_fixture_files_with(
        &self,
        files: Option<&[String]>,
        encoding: TextEncoding,
    ) -> Result<Vec<FixtureDocument>> {
        let Some(path) = self.config.path.as_ref() else {
            return Err(Error::config("fixture path is not set; call set_path first"));
        };
        let files = files.unwrap_or(self.config.fixture_files.as_slice());

        let mut documents = Vec::new();
        for dir in path.dirs() {
            for file in files {
                let fixture_path: PathBuf = dir.join(file);
                if !fixture_path.is_file() {
                    tracing::trace!(
                        path = %fixture_path.display(),
                        "fixture file not found, skipping"
                    );
                    continue;
                }
                if let Some(document) = FixtureDocument::read(&fixture_path, encoding)? {
                    documents.push(document);
                }
            }
        }
        tracing::debug!(documents = documents.len(), "loaded fixture files");
        Ok(documents)
    }

    /// Split one document into per-record class entries and model paths.
    ///
    /// Every record with a `model` yields one `{class_name: fields}` entry,
    /// so two `Foo` records give two entries. A model path is listed once
    /// per distinct short class name, in first-seen order. Records without
    /// `model` are ignored.
    pub fn load_fixture(fixture: &FixtureDocument) -> (Vec<ClassFields>, Vec<String>) {
        let mut fields = Vec::with_capacity(fixture.len());
        let mut models = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for record in &fixture.records {
            let Some(model) = record.model.as_deref() else {
                continue;
            };
            let class_name = short_class_name(model);
            if seen.insert(class_name) {
                models.push(model.to_string());
            }
            fields.push(ClassFields::new(class_name, record.fields.clone()));
        }
        (fields, models)
    }

    /// Apply [`load_fixture`](Self::load_fixture) to every document.
    ///
    /// Model paths are deduplicated across documents by exact string.
    pub fn load_fixtures(
        &self,
        fixture_data: Option<&[FixtureDocument]>,
    ) -> Result<(Vec<Vec<ClassFields>>, Vec<String>)> {
        let loaded;
        let documents = match fixture_data {
            Some(documents) => documents,
            None => {
                loaded = self.load_fixture_files(None)?;
                loaded.as_slice()
            }
        };

        let mut fixtures_fields = Vec::with_capacity(documents.len());
        let mut fixtures_models: IndexSet<String> = IndexSet::new();
        for document in documents {
            let (fields, models) = Self::load_fixture(document);
            fixtures_fields.push(fields);
            fixtures_models.extend(models);
        }
        Ok((fixtures_fields, fixtures_models.into_iter().collect()))
    }

    /// Insert all fixture rows inside one transaction.
    ///
    /// For each distinct model path, every row recorded under its short class
    /// name (across all documents) goes into one bulk insert. If any step in
    /// the transaction fails it is rolled back once and the cause is returned
    /// wrapped in a rolled-back [`Error::Transaction`].
    ///
    /// With `foreign_key_checks` set, constraint checking is switched off
    /// first and switched back on afterwards, whether or not the insert
    /// succeeded. `None` uses the configured
    /// [`SeedConfig::foreign_key_checks`].
    #[tracing::instrument(level = "debug", skip(self, fixture_data))]
    pub fn db_data_input(
        &self,
        fixture_data: Option<&[FixtureDocument]>,
        foreign_key_checks: Option<bool>,
    ) -> Result<SeedReport> {
        let db = self.database()?;
        let foreign_key_checks = self.foreign_key_checks(foreign_key_checks);
        let dialect = db.dialect();
        if foreign_key_checks {
            db.execute_sql(dialect.foreign_key_checks_sql(false))?;
        }

        let outcome = self.seed(db, fixture_data);

        if foreign_key_checks {
            if let Err(e) = db.execute_sql(dialect.foreign_key_checks_sql(true)) {
                if outcome.is_ok() {
                    return Err(e);
                }
                tracing::warn!(error = %e, "could not re-enable foreign key checks");
            }
        }

        if let Ok(report) = &outcome {
            tracing::info!(
                version = crate::VERSION,
                models = report.len(),
                rows = report.total_rows(),
                "fixtures seeded"
            );
        }
        outcome
    }

    fn foreign_key_checks(&self, requested: Option<bool>) -> bool {
        requested.unwrap_or(self.config.foreign_key_checks)
    }

    fn seed(&self, db: &D, fixture_data: Option<&[FixtureDocument]>) -> Result<SeedReport> {
        let (fields, models) = self.load_fixtures(fixture_data)?;
        let grouped = GroupedFixture::from_fields(&fields);

        let tx = db.transaction()?;
        match self.insert_all(db, &models, &grouped) {
            Ok(report) => {
                if let Err(e) = tx.commit() {
                    if let Err(rb) = db.rollback() {
                        tracing::error!(error = %rb, "rollback after failed commit failed");
                    }
                    return Err(Error::rolled_back(e));
                }
                Ok(report)
            }
            Err(e) => {
                tracing::debug!(error = %e, "seeding failed, rolling back");
                if let Err(rb) = tx.rollback() {
                    tracing::error!(error = %rb, "rollback failed");
                }
                Err(Error::rolled_back(e))
            }
        }
    }

    fn insert_all(
        &self,
        db: &D,
        models: &[String],
        grouped: &GroupedFixture,
    ) -> Result<SeedReport> {
        let mut report = SeedReport::default();
        for path in models {
            let model = self.registry.resolve(path)?;
            let rows = grouped.rows(short_class_name(path));
            if rows.is_empty() {
                tracing::trace!(model = %path, "no rows, skipping");
                continue;
            }

            let count = rows.len();
            let affected = insert_many(&model, rows.to_vec()).execute(db)?;
            tracing::debug!(
                model = %path,
                table = %model.table_name,
                rows = count,
                affected,
                "inserted fixture rows"
            );
            report.entries.push(SeedEntry {
                model: path.clone(),
                rows: count,
                affected,
            });
        }
        Ok(report)
    }
}

impl<D: Database> fmt::Debug for Seeder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seeder")
            .field("has_database", &self.db.is_some())
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}
