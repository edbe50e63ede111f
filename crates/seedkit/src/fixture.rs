//! Fixture documents: reading, parsing and grouping by model class.
//!
//! A fixture file is a YAML or JSON sequence of records:
//!
//! ```yaml
//! - model: app.models.User
//!   fields:
//!     name: alice
//!     age: 30
//! - model: app.models.User
//!   fields: {name: bob}
//! ```
//!
//! Keys other than `model` and `fields` (for example `pk`) are ignored.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use seedkit_core::error::{Error, FixtureError, FixtureErrorKind};
use seedkit_core::{FieldMap, Result};

use crate::config::TextEncoding;

/// Serialization format of a fixture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureFormat {
    Yaml,
    Json,
}

impl FixtureFormat {
    /// Detect the format from a file extension (`.yaml`, `.yml`, `.json`).
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yaml" | "yml" => Some(FixtureFormat::Yaml),
            "json" => Some(FixtureFormat::Json),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            FixtureFormat::Yaml => "YAML",
            FixtureFormat::Json => "JSON",
        }
    }
}

/// One entry of a fixture document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixtureRecord {
    /// Dotted model path, e.g. `app.models.User`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Column values in file order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub fields: FieldMap,
}

impl FixtureRecord {
    pub fn new(model: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            model: Some(model.into()),
            fields,
        }
    }

    /// Text after the final `.` of the model path; the whole path if it has no dot.
    pub fn class_name(&self) -> Option<&str> {
        self.model.as_deref().map(short_class_name)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<FieldMap, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<FieldMap>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn short_class_name(path: &str) -> &str {
    path.rsplit_once('.').map_or(path, |(_, class_name)| class_name)
}

/// The records of one fixture file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureDocument {
    pub records: Vec<FixtureRecord>,
}

impl FixtureDocument {
    pub fn new(records: Vec<FixtureRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Parse a document from text.
    ///
    /// Empty or whitespace-only text, and a top-level null, give an empty
    /// document. Anything else must be a sequence of mappings.
    pub fn parse(text: &str, format: FixtureFormat) -> std::result::Result<Self, String> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let records = match format {
            FixtureFormat::Yaml => parse_yaml(text)?,
            FixtureFormat::Json => parse_json(text)?,
        };
        Ok(Self { records })
    }

    /// Read, decode and parse a fixture file.
    ///
    /// Returns `Ok(None)` when the extension is not a fixture format.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub fn read(path: &Path, encoding: TextEncoding) -> Result<Option<Self>> {
        let Some(format) = FixtureFormat::from_path(path) else {
            tracing::trace!("unrecognized fixture extension, skipping");
            return Ok(None);
        };

        let bytes = std::fs::read(path).map_err(|e| {
            fixture_error(FixtureErrorKind::Io, path, e.to_string(), Some(Box::new(e)))
        })?;
        let text = encoding.decode(bytes).map_err(|e| {
            fixture_error(
                FixtureErrorKind::Decode,
                path,
                format!("not valid {encoding}: {e}"),
                Some(Box::new(e)),
            )
        })?;
        let document = Self::parse(&text, format).map_err(|message| {
            fixture_error(
                FixtureErrorKind::Parse,
                path,
                format!("invalid {} fixture: {message}", format.name()),
                None,
            )
        })?;

        tracing::debug!(records = document.len(), "parsed fixture file");
        Ok(Some(document))
    }
}

impl From<Vec<FixtureRecord>> for FixtureDocument {
    fn from(records: Vec<FixtureRecord>) -> Self {
        Self { records }
    }
}

fn parse_json(text: &str) -> std::result::Result<Vec<FixtureRecord>, String> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
    match value {
        serde_json::Value::Null => Ok(Vec::new()),
        serde_json::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                serde_json::from_value(item)
                    .map_err(|e| format!("invalid record at index {idx}: {e}"))
            })
            .collect(),
        other => Err(format!("expected an array of records, found {}", json_kind(&other))),
    }
}

fn parse_yaml(text: &str) -> std::result::Result<Vec<FixtureRecord>, String> {
    let value: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
    match value {
        serde_yaml::Value::Null => Ok(Vec::new()),
        serde_yaml::Value::Sequence(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                serde_yaml::from_value(item)
                    .map_err(|e| format!("invalid record at index {idx}: {e}"))
            })
            .collect(),
        _ => Err("expected a sequence of records".to_string()),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn fixture_error(
    kind: FixtureErrorKind,
    path: &Path,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
) -> Error {
    Error::Fixture(FixtureError {
        kind,
        path: path.to_path_buf(),
        message,
        source,
    })
}

/// A single-key `{class_name: fields}` entry produced by
/// [`Seeder::load_fixture`](crate::Seeder::load_fixture).
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFields {
    pub class_name: String,
    pub fields: FieldMap,
}

impl ClassFields {
    pub fn new(class_name: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            class_name: class_name.into(),
            fields,
        }
    }
}

/// Field mappings grouped by short class name across documents.
///
/// Keys keep first-seen order; rows for a class keep document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedFixture {
    groups: IndexMap<String, Vec<FieldMap>>,
}

impl GroupedFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group the per-document entries returned by `load_fixtures`.
    pub fn from_fields(fields: &[Vec<ClassFields>]) -> Self {
        let mut grouped = Self::new();
        for entry in fields.iter().flatten() {
            grouped.push(&entry.class_name, entry.fields.clone());
        }
        grouped
    }

    pub fn push(&mut self, class_name: &str, fields: FieldMap) {
        self.groups
            .entry(class_name.to_string())
            .or_default()
            .push(fields);
    }

    /// Rows recorded under `class_name`; empty if none.
    pub fn rows(&self, class_name: &str) -> &[FieldMap] {
        self.groups.get(class_name).map_or(&[], Vec::as_slice)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
