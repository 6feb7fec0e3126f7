//! hireflow-db: PostgreSQL access layer
//!
//! Builds parameterized SQL from declarative request descriptors, runs it
//! over a pooled connection, bootstraps the database on first start and
//! applies numbered migrations exactly once.
//!
//! # Design Principles
//!
//! - One `Db` value owns the pool; it is passed to dependents, never global
//! - Every implicit query borrows a lease through `Db::wrap` and returns it on all exit paths
//! - Values are always bound (`$1`, `$2`, ...); identifiers go through `ident`
//! - Builder misuse fails before any I/O
//!
//! # Example
//!
//! ```ignore
//! let db = Db::connect(DbConfig::default().apply_env()?).await?;
//! let rows = db
//!     .select(&SelectRequest::new("service.applicants").filter("id = $1").value(id))
//!     .await?;
//! ```

pub mod config;
pub mod ddl;
pub mod error;
pub mod executor;
pub mod ident;
pub mod migrate;
pub mod pool;
pub mod sql;
pub mod value;

pub use config::DbConfig;
pub use ddl::{relation_name, ColumnSpec, Ddl, MAX_IDENT_LEN};
pub use error::{sqlstate, BuilderError, DbError, Result};
pub use executor::{InsertOutcome, Queries};
pub use migrate::{Migration, MigrationFn, MigrationLedger, MigrationReport, Migrator};
pub use pool::Db;
pub use sql::{
    DeleteRequest, Direction, InsertRequest, Projection, SelectRequest, Statement, UpdateRequest,
};
pub use value::SqlValue;

/// Re-exported so migration units and services name the same connection type.
pub use sqlx::postgres::{PgConnection, PgRow};
pub use sqlx::Row;
