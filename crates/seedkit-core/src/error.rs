//! Error types for seeding operations.

use std::fmt;
use std::path::PathBuf;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type for all seeding operations.
#[derive(Debug)]
pub enum Error {
    /// Connection-related errors (open, configure)
    Connection(ConnectionError),
    /// Query execution errors
    Query(QueryError),
    /// Type conversion errors
    Type(TypeError),
    /// Transaction errors
    Transaction(TransactionError),
    /// Schema generation errors
    Schema(SchemaError),
    /// Configuration errors (missing path, missing database, bad config file)
    Config(ConfigError),
    /// Fixture file read/decode/parse errors
    Fixture(FixtureError),
    /// Model path resolution errors
    Resolve(ResolveError),
    /// I/O errors
    Io(std::io::Error),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<BoxError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to open the database
    Connect,
    /// Connection is no longer usable
    Disconnected,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub sql: Option<String>,
    pub message: String,
    pub source: Option<BoxError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Syntax error in SQL
    Syntax,
    /// Constraint violation (unique, foreign key, etc.)
    Constraint,
    /// Table or column not found
    NotFound,
    /// Database is locked or busy
    Busy,
    /// Other database error
    Database,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

#[derive(Debug)]
pub struct TransactionError {
    pub kind: TransactionErrorKind,
    pub message: String,
    pub source: Option<BoxError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionErrorKind {
    /// The transaction body failed and the transaction was rolled back
    RolledBack,
    /// Commit or rollback without an open transaction
    NotActive,
    /// Begin while a transaction is already open
    AlreadyActive,
}

#[derive(Debug)]
pub struct SchemaError {
    pub kind: SchemaErrorKind,
    pub message: String,
    pub source: Option<BoxError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// Invalid schema definition
    Invalid,
    /// Table creation failed
    Create,
    /// Table drop failed
    Drop,
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub source: Option<BoxError>,
}

#[derive(Debug)]
pub struct FixtureError {
    pub kind: FixtureErrorKind,
    pub path: PathBuf,
    pub message: String,
    pub source: Option<BoxError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureErrorKind {
    /// The file exists but could not be read
    Io,
    /// The bytes are not valid in the configured encoding
    Decode,
    /// The text is not a valid fixture document
    Parse,
}

#[derive(Debug, Clone)]
pub struct ResolveError {
    pub kind: ResolveErrorKind,
    pub path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveErrorKind {
    /// Not of the form `module.ClassName`
    MalformedPath,
    /// No model registered under the module part of the path
    ModuleNotFound,
    /// Module is known but the class name is not
    ModelNotFound,
    /// Path already registered for a different model type
    DuplicatePath,
}

impl Error {
    /// Shorthand for a configuration error without a source.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(ConfigError {
            message: message.into(),
            source: None,
        })
    }

    /// Wrap `cause` as a rolled-back transaction error, keeping it as the source.
    pub fn rolled_back(cause: Error) -> Self {
        Error::Transaction(TransactionError {
            kind: TransactionErrorKind::RolledBack,
            message: format!("transaction rolled back: {cause}"),
            source: Some(Box::new(cause)),
        })
    }

    /// Get the SQL that caused this error, if available
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            _ => None,
        }
    }

    /// Is this a rolled-back transaction?
    pub fn is_rolled_back(&self) -> bool {
        matches!(
            self,
            Error::Transaction(TransactionError {
                kind: TransactionErrorKind::RolledBack,
                ..
            })
        )
    }

    /// Kind of resolution failure, if this is one.
    pub fn resolve_kind(&self) -> Option<ResolveErrorKind> {
        match self {
            Error::Resolve(e) => Some(e.kind),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "Connection error: {}", e.message),
            Error::Query(e) => write!(f, "Query error: {}", e.message),
            Error::Type(e) => write!(f, "Type error: {}", e),
            Error::Transaction(e) => write!(f, "Transaction error: {}", e.message),
            Error::Schema(e) => write!(f, "Schema error: {}", e.message),
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Fixture(e) => write!(f, "Fixture error: {}", e),
            Error::Resolve(e) => write!(f, "Resolve error: {}", e),
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let boxed = match self {
            Error::Connection(e) => e.source.as_deref(),
            Error::Query(e) => e.source.as_deref(),
            Error::Transaction(e) => e.source.as_deref(),
            Error::Schema(e) => e.source.as_deref(),
            Error::Config(e) => e.source.as_deref(),
            Error::Fixture(e) => e.source.as_deref(),
            Error::Io(e) => return Some(e),
            _ => None,
        };
        boxed.map(|err| err as &(dyn std::error::Error + 'static))
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for FixtureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            FixtureErrorKind::Io => "cannot read",
            FixtureErrorKind::Decode => "cannot decode",
            FixtureErrorKind::Parse => "cannot parse",
        };
        write!(f, "{} {}: {}", what, self.path.display(), self.message)
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ResolveErrorKind::MalformedPath => {
                write!(f, "'{}' is not a dotted module.ClassName path", self.path)
            }
            ResolveErrorKind::ModuleNotFound => {
                write!(f, "no models registered for module of '{}'", self.path)
            }
            ResolveErrorKind::ModelNotFound => write!(f, "model '{}' is not registered", self.path),
            ResolveErrorKind::DuplicatePath => write!(
                f,
                "'{}' is already registered for a different model",
                self.path
            ),
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<TransactionError> for Error {
    fn from(err: TransactionError) -> Self {
        Error::Transaction(err)
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Error::Schema(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<FixtureError> for Error {
    fn from(err: FixtureError) -> Self {
        Error::Fixture(err)
    }
}

impl From<ResolveError> for Error {
    fn from(err: ResolveError) -> Self {
        Error::Resolve(err)
    }
}

/// Result type alias for seeding operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    fn query_error(message: &str) -> Error {
        Error::Query(QueryError {
            kind: QueryErrorKind::Constraint,
            sql: Some("INSERT INTO t VALUES (1)".to_string()),
            message: message.to_string(),
            source: None,
        })
    }

    #[test]
    fn rolled_back_keeps_cause_as_source() {
        let err = Error::rolled_back(query_error("UNIQUE constraint failed"));
        assert!(err.is_rolled_back());

        let source = err.source().expect("source");
        let cause = source.downcast_ref::<Error>().expect("inner Error");
        assert_eq!(cause.sql(), Some("INSERT INTO t VALUES (1)"));
        assert!(err.to_string().contains("UNIQUE constraint failed"));
    }

    #[test]
    fn resolve_display_and_kind() {
        let err = Error::Resolve(ResolveError {
            kind: ResolveErrorKind::ModelNotFound,
            path: "app.models.Ghost".to_string(),
        });
        assert_eq!(err.resolve_kind(), Some(ResolveErrorKind::ModelNotFound));
        assert!(err.to_string().contains("app.models.Ghost"));
        assert!(err.source().is_none());
    }

    #[test]
    fn fixture_display_names_file() {
        let err = Error::Fixture(FixtureError {
            kind: FixtureErrorKind::Parse,
            path: PathBuf::from("/tmp/users.yaml"),
            message: "expected a sequence".to_string(),
            source: None,
        });
        let msg = err.to_string();
        assert!(msg.contains("cannot parse"), "got: {msg}");
        assert!(msg.contains("users.yaml"), "got: {msg}");
    }

    #[test]
    fn io_converts_and_is_source() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.source().is_some());
    }

    #[test]
    fn config_shorthand() {
        let err = Error::config("no fixture path configured");
        assert_eq!(
            err.to_string(),
            "Configuration error: no fixture path configured"
        );
    }
}
