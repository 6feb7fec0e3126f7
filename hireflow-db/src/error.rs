//! Error types for hireflow-db
//!
//! Library callers get structured errors; the binary wraps them in `anyhow`.

use thiserror::Error;

/// Result type alias for hireflow-db operations
pub type Result<T> = std::result::Result<T, DbError>;

/// PostgreSQL SQLSTATE codes the crate reacts to.
pub mod sqlstate {
    /// Database named in the connection does not exist.
    pub const INVALID_CATALOG_NAME: &str = "3D000";
    /// Relation does not exist.
    pub const UNDEFINED_TABLE: &str = "42P01";
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const NOT_NULL_VIOLATION: &str = "23502";
    pub const INVALID_TEXT_REPRESENTATION: &str = "22P02";
}

/// A request descriptor that cannot be turned into SQL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuilderError {
    #[error("query has no source table")]
    EmptyTables,

    #[error("{statement} has no fields")]
    EmptyFields { statement: &'static str },

    #[error("{fields} fields but {values} values")]
    ArityMismatch { fields: usize, values: usize },

    #[error("placeholder ${index} has no bound value ({bound} bound)")]
    PlaceholderOutOfRange { index: usize, bound: usize },

    #[error("bound value ${index} is never referenced by the filter")]
    UnusedValue { index: usize },

    #[error("{statement} requires a filter")]
    MissingFilter { statement: &'static str },

    #[error("invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: &'static str },

    #[error("invalid column spec '{spec}'")]
    InvalidColumnSpec { spec: String },
}

/// Main error type for database operations
#[derive(Error, Debug)]
pub enum DbError {
    /// The pool could not be established
    #[error("failed to connect to database '{database}': {source}")]
    Connect {
        database: String,
        source: sqlx::Error,
    },

    /// The target database was missing and could not be created
    #[error("failed to create database '{database}': {source}")]
    CreateDatabase {
        database: String,
        source: sqlx::Error,
    },

    /// No lease could be borrowed from the pool
    #[error("failed to acquire a pooled connection: {0}")]
    Acquire(#[source] sqlx::Error),

    /// A statement failed on the server
    #[error("query failed: {source}")]
    Query { sql: String, source: sqlx::Error },

    /// A row did not decode into the requested type
    #[error("failed to decode row: {0}")]
    Decode(#[source] sqlx::Error),

    #[error("invalid query: {0}")]
    Builder(#[from] BuilderError),

    /// A migration unit or its ledger entry failed
    #[error("migration {id} ({name}) failed: {source}")]
    Migration {
        id: i32,
        name: &'static str,
        source: Box<DbError>,
    },

    /// The registered migration units are inconsistent
    #[error("invalid migration set: {reason}")]
    MigrationSet { reason: String },

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("configuration error: {reason}")]
    Config { reason: String },
}

impl DbError {
    /// Create a not found error
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// SQLSTATE reported by the server, if the failure came from one.
    pub fn sqlstate(&self) -> Option<String> {
        match self {
            Self::Connect { source, .. }
            | Self::CreateDatabase { source, .. }
            | Self::Query { source, .. }
            | Self::Acquire(source) => source
                .as_database_error()
                .and_then(|e| e.code())
                .map(|code| code.into_owned()),
            Self::Migration { source, .. } => source.sqlstate(),
            _ => None,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        self.sqlstate().as_deref() == Some(sqlstate::UNIQUE_VIOLATION)
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        self.sqlstate().as_deref() == Some(sqlstate::FOREIGN_KEY_VIOLATION)
    }

    pub fn is_undefined_table(&self) -> bool {
        self.sqlstate().as_deref() == Some(sqlstate::UNDEFINED_TABLE)
    }
}

/// True when a connect attempt failed because the database itself is absent.
pub(crate) fn is_missing_database(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == sqlstate::INVALID_CATALOG_NAME)
}
