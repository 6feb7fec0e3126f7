//! DDL helpers used by migration units
//!
//! Each helper renders literal DDL (pure, testable) and has an executing
//! counterpart on `Db` and on `PgConnection` (via [`Ddl`]). All of them are
//! idempotent: running one twice with the same arguments is not an error
//! and creates nothing twice.
//!
//! Column types and default expressions are trusted SQL fragments written
//! in migration code; identifiers go through `ident`.

use async_trait::async_trait;
use sqlx::postgres::PgConnection;

use crate::error::{BuilderError, Result};
use crate::executor::Queries;
use crate::ident::{qualify, quote_ident, split_column_path};
use crate::pool::Db;

/// Type and default of one column.
///
/// A column is `NOT NULL` exactly when it has a default other than `NULL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    ty: String,
    default: Option<String>,
}

impl ColumnSpec {
    pub fn new(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            default: None,
        }
    }

    pub fn default_to(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    /// Parse the compact `"<type> [<default>]"` form, e.g. `"timestamp now()"`.
    pub fn parse(spec: &str) -> std::result::Result<Self, BuilderError> {
        let spec = spec.trim();
        let (ty, default) = match spec.split_once(char::is_whitespace) {
            Some((ty, rest)) => (ty, Some(rest.trim())),
            None => (spec, None),
        };
        if ty.is_empty() {
            return Err(BuilderError::InvalidColumnSpec {
                spec: spec.to_owned(),
            });
        }
        Ok(Self {
            ty: ty.to_owned(),
            default: default.filter(|d| !d.is_empty()).map(str::to_owned),
        })
    }

    pub fn is_required(&self) -> bool {
        self.default
            .as_deref()
            .is_some_and(|d| !d.eq_ignore_ascii_case("null"))
    }

    fn render(&self, name: &str) -> std::result::Result<String, BuilderError> {
        if self.ty.trim().is_empty() {
            return Err(BuilderError::InvalidColumnSpec {
                spec: format!("{} <empty type>", name),
            });
        }
        let mut column = format!("{} {}", quote_ident(name)?, self.ty);
        if self.is_required() {
            column.push_str(" NOT NULL");
        }
        column.push_str(" DEFAULT ");
        column.push_str(self.default.as_deref().unwrap_or("NULL"));
        Ok(column)
    }
}

/// `CREATE TABLE IF NOT EXISTS <name> (<columns>, PRIMARY KEY (<primary>))`
pub fn create_table_sql(
    name: &str,
    primary: &str,
    columns: &[(&str, ColumnSpec)],
) -> std::result::Result<String, BuilderError> {
    if columns.is_empty() {
        return Err(BuilderError::EmptyFields {
            statement: "CREATE TABLE",
        });
    }
    let columns = columns
        .iter()
        .map(|(name, spec)| spec.render(name))
        .collect::<std::result::Result<Vec<_>, _>>()?
        .join(", ");
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({}, PRIMARY KEY ({}))",
        qualify(name)?,
        columns,
        quote_ident(primary)?
    ))
}

/// `ALTER TABLE <table> ADD COLUMN IF NOT EXISTS <column>`
pub fn create_field_sql(
    table: &str,
    field: &str,
    spec: &ColumnSpec,
) -> std::result::Result<String, BuilderError> {
    Ok(format!(
        "ALTER TABLE {} ADD COLUMN IF NOT EXISTS {}",
        qualify(table)?,
        spec.render(field)?
    ))
}

/// `CREATE SCHEMA IF NOT EXISTS <name>`
pub fn create_schema_sql(name: &str) -> std::result::Result<String, BuilderError> {
    Ok(format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(name)?))
}

/// `CREATE EXTENSION IF NOT EXISTS <name> WITH SCHEMA public`
pub fn create_extension_sql(name: &str) -> std::result::Result<String, BuilderError> {
    Ok(format!(
        "CREATE EXTENSION IF NOT EXISTS {} WITH SCHEMA public",
        quote_ident(name)?
    ))
}

/// PostgreSQL silently truncates longer identifiers to this many bytes.
pub const MAX_IDENT_LEN: usize = 63;

/// Constraint name of the foreign key `source -> target`.
///
/// `<source>_<target>` when it fits in [`MAX_IDENT_LEN`] bytes. Longer names
/// are cut and suffixed with the first 8 hex digits of the full name's md5,
/// so relations sharing a long prefix still get distinct names.
pub fn relation_name(source: &str, target: &str) -> String {
    let full = format!("{}_{}", source, target);
    if full.len() <= MAX_IDENT_LEN {
        return full;
    }
    let digest = format!("{:x}", md5::compute(full.as_bytes()));
    let mut cut = MAX_IDENT_LEN - 9;
    while !full.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}_{}", &full[..cut], &digest[..8])
}

/// Foreign key from `target` (`schema.table.column`) to `source`.
///
/// Returns the drop-if-exists statement and the add statement. The
/// constraint is named by [`relation_name`].
pub fn create_relation_sql(
    source: &str,
    target: &str,
) -> std::result::Result<[String; 2], BuilderError> {
    let (source_table, source_field) = split_column_path(source)?;
    let (target_table, target_field) = split_column_path(target)?;
    let table = qualify(target_table)?;
    let name = quote_ident(&relation_name(source, target))?;

    let drop = format!("ALTER TABLE {} DROP CONSTRAINT IF EXISTS {}", table, name);
    let add = format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
        table,
        name,
        quote_ident(target_field)?,
        qualify(source_table)?,
        quote_ident(source_field)?
    );
    Ok([drop, add])
}

/// Schema helpers on an explicitly held connection.
#[async_trait]
pub trait Ddl: Queries {
    async fn create_table(
        &mut self,
        name: &str,
        primary: &str,
        columns: &[(&str, ColumnSpec)],
    ) -> Result<()> {
        let sql = create_table_sql(name, primary, columns)?;
        self.execute_raw(&sql).await.map(|_| ())
    }

    async fn create_field(&mut self, table: &str, field: &str, spec: &ColumnSpec) -> Result<()> {
        let sql = create_field_sql(table, field, spec)?;
        self.execute_raw(&sql).await.map(|_| ())
    }

    async fn create_schema(&mut self, name: &str) -> Result<()> {
        let sql = create_schema_sql(name)?;
        self.execute_raw(&sql).await.map(|_| ())
    }

    async fn create_extension(&mut self, name: &str) -> Result<()> {
        let sql = create_extension_sql(name)?;
        self.execute_raw(&sql).await.map(|_| ())
    }

    /// Drop-then-add; two statements, not atomic unless run in a transaction.
    async fn create_relation(&mut self, source: &str, target: &str) -> Result<()> {
        let [drop, add] = create_relation_sql(source, target)?;
        self.execute_raw(&drop).await?;
        self.execute_raw(&add).await.map(|_| ())
    }
}

impl Ddl for PgConnection {}

impl Db {
    pub async fn create_table(
        &self,
        name: &str,
        primary: &str,
        columns: &[(&str, ColumnSpec)],
    ) -> Result<()> {
        self.execute_raw(create_table_sql(name, primary, columns)?)
            .await
            .map(|_| ())
    }

    pub async fn create_field(&self, table: &str, field: &str, spec: &ColumnSpec) -> Result<()> {
        self.execute_raw(create_field_sql(table, field, spec)?)
            .await
            .map(|_| ())
    }

    pub async fn create_schema(&self, name: &str) -> Result<()> {
        self.execute_raw(create_schema_sql(name)?).await.map(|_| ())
    }

    pub async fn create_extension(&self, name: &str) -> Result<()> {
        self.execute_raw(create_extension_sql(name)?)
            .await
            .map(|_| ())
    }

    /// Both statements run on the same lease.
    pub async fn create_relation(&self, source: &str, target: &str) -> Result<()> {
        let [drop, add] = create_relation_sql(source, target)?;
        self.wrap(move |conn| {
            Box::pin(async move {
                conn.execute_raw(&drop).await?;
                conn.execute_raw(&add).await.map(|_| ())
            })
        })
        .await
    }
}
