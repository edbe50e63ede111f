//! Seeder configuration.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use seedkit_core::Result;
use seedkit_core::error::{ConfigError, Error};

use crate::fixture::FixtureFormat;

/// One fixture directory or an ordered list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FixturePath {
    Single(PathBuf),
    Many(Vec<PathBuf>),
}

impl FixturePath {
    /// Directories in search order.
    pub fn dirs(&self) -> Vec<&Path> {
        match self {
            FixturePath::Single(dir) => vec![dir.as_path()],
            FixturePath::Many(dirs) => dirs.iter().map(PathBuf::as_path).collect(),
        }
    }
}

impl From<&str> for FixturePath {
    fn from(dir: &str) -> Self {
        FixturePath::Single(PathBuf::from(dir))
    }
}

impl From<&Path> for FixturePath {
    fn from(dir: &Path) -> Self {
        FixturePath::Single(dir.to_path_buf())
    }
}

impl From<PathBuf> for FixturePath {
    fn from(dir: PathBuf) -> Self {
        FixturePath::Single(dir)
    }
}

impl<P: Into<PathBuf>> From<Vec<P>> for FixturePath {
    fn from(dirs: Vec<P>) -> Self {
        FixturePath::Many(dirs.into_iter().map(Into::into).collect())
    }
}

/// Text encoding of fixture files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// ISO-8859-1; every byte maps to the code point of the same value.
    Latin1,
}

impl TextEncoding {
    /// Parse an encoding label such as `utf-8` or `latin-1` (case-insensitive).
    pub fn from_label(label: &str) -> Result<Self> {
        match label.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" | "l1" => Ok(TextEncoding::Latin1),
            _ => Err(Error::config(format!("unsupported fixture encoding '{label}'"))),
        }
    }

    /// Canonical label.
    pub const fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
        }
    }

    /// Decode raw file bytes.
    pub fn decode(self, bytes: Vec<u8>) -> std::result::Result<String, std::string::FromUtf8Error> {
        match self {
            TextEncoding::Utf8 => String::from_utf8(bytes),
            TextEncoding::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TextEncoding {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for TextEncoding {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        TextEncoding::from_label(&label).map_err(serde::de::Error::custom)
    }
}

/// Settings for a [`Seeder`](crate::Seeder).
///
/// Nothing is validated until an operation needs it: a missing `path` only
/// fails when fixture files are loaded.
///
/// # Example
///
/// ```
/// use seedkit::{SeedConfig, TextEncoding};
///
/// let config = SeedConfig::new()
///     .path("fixtures")
///     .fixture_files(["users.yaml", "orders.json"])
///     .encoding(TextEncoding::Utf8);
/// assert_eq!(config.fixture_files.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Directory or directories holding fixture files.
    pub path: Option<FixturePath>,
    /// File names looked up in every directory, in order.
    pub fixture_files: Vec<String>,
    /// Encoding used to decode fixture files.
    pub encoding: TextEncoding,
    /// Foreign-key flag used by `Seeder::db_data_input` and
    /// `Seeder::drop_table_all` when they are called with `None`.
    pub foreign_key_checks: bool,
}

impl SeedConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fixture directory or directories.
    pub fn path(mut self, path: impl Into<FixturePath>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the fixture file names.
    pub fn fixture_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fixture_files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Set the fixture file encoding.
    pub fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the foreign-key flag used when an operation is given `None`.
    pub fn foreign_key_checks(mut self, enabled: bool) -> Self {
        self.foreign_key_checks = enabled;
        self
    }

    /// Read a configuration from a YAML or JSON file, chosen by extension.
    ///
    /// Relative fixture directories are kept as written.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = FixtureFormat::from_path(path).ok_or_else(|| {
            Error::config(format!(
                "config file {} must end in .yaml, .yml or .json",
                path.display()
            ))
        })?;
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(ConfigError {
                message: format!("cannot read config file {}: {}", path.display(), e),
                source: Some(Box::new(e)),
            })
        })?;
        Self::from_str(&text, format).map_err(|e| match e {
            Error::Config(mut c) => {
                c.message = format!("{}: {}", path.display(), c.message);
                Error::Config(c)
            }
            other => other,
        })
    }

    /// Parse a configuration from text.
    pub fn from_str(text: &str, format: FixtureFormat) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let parsed = match format {
            FixtureFormat::Yaml => serde_yaml::from_str(text).map_err(boxed),
            FixtureFormat::Json => serde_json::from_str(text).map_err(boxed),
        };
        parsed.map_err(|e| {
            Error::Config(ConfigError {
                message: format!("invalid seed config: {e}"),
                source: Some(e),
            })
        })
    }
}

fn boxed<E>(e: E) -> Box<dyn std::error::Error + Send + Sync>
where
    E: std::error::Error + Send + Sync + 'static,
{
    Box::new(e)
}
