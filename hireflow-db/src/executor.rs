//! Query executor
//!
//! The same operations are available on two receivers:
//! - `Db` borrows a lease per call through [`Db::wrap`]
//! - `PgConnection` (via the [`Queries`] trait) runs on a connection the
//!   caller already holds, e.g. inside a migration unit or a transaction
//!
//! Every failed statement is logged with its SQL text and the driver
//! message, then returned as `DbError::Query`. Nothing is retried.

use async_trait::async_trait;
use sqlx::postgres::{PgConnection, PgRow, Postgres};
use sqlx::{Decode, FromRow, Row, Type};
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::{DbError, Result};
use crate::pool::Db;
use crate::sql::{DeleteRequest, InsertRequest, SelectRequest, Statement, UpdateRequest};

/// Raw result of an INSERT.
#[derive(Default)]
pub struct InsertOutcome {
    pub rows_affected: u64,
    /// Rows produced by a RETURNING clause, empty without one
    pub rows: Vec<PgRow>,
}

/// Query operations on an explicitly held connection.
#[async_trait]
pub trait Queries: Send {
    /// Rows with named columns.
    async fn select(&mut self, req: &SelectRequest) -> Result<Vec<PgRow>>;

    /// Rows decoded into `T`.
    async fn select_as<T>(&mut self, req: &SelectRequest) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static;

    /// Rows as positional values, every column decoded as `T`.
    async fn select_array<T>(&mut self, req: &SelectRequest) -> Result<Vec<Vec<T>>>
    where
        T: for<'r> Decode<'r, Postgres> + Type<Postgres> + Send + 'static;

    /// First row, or `None` when nothing matches.
    async fn select_row(&mut self, req: &SelectRequest) -> Result<Option<PgRow>>;

    async fn insert(&mut self, req: &InsertRequest) -> Result<InsertOutcome>;

    /// Insert and return the generated `id`.
    async fn insert_row(&mut self, req: &InsertRequest) -> Result<Uuid>;

    /// Rows affected.
    async fn update(&mut self, req: &UpdateRequest) -> Result<u64>;

    /// Rows affected.
    async fn delete(&mut self, req: &DeleteRequest) -> Result<u64>;

    /// Literal SQL from trusted code (DDL, several statements separated by `;`).
    async fn execute_raw(&mut self, sql: &str) -> Result<u64>;
}

#[async_trait]
impl Queries for PgConnection {
    async fn select(&mut self, req: &SelectRequest) -> Result<Vec<PgRow>> {
        let stmt = req.build()?;
        fetch_rows(self, &stmt).await
    }

    async fn select_as<T>(&mut self, req: &SelectRequest) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static,
    {
        let stmt = req.build()?;
        decode_rows(fetch_rows(self, &stmt).await?)
    }

    async fn select_array<T>(&mut self, req: &SelectRequest) -> Result<Vec<Vec<T>>>
    where
        T: for<'r> Decode<'r, Postgres> + Type<Postgres> + Send + 'static,
    {
        let stmt = req.build()?;
        positional(fetch_rows(self, &stmt).await?)
    }

    async fn select_row(&mut self, req: &SelectRequest) -> Result<Option<PgRow>> {
        let stmt = req.build()?;
        fetch_first(self, &stmt).await
    }

    async fn insert(&mut self, req: &InsertRequest) -> Result<InsertOutcome> {
        let stmt = req.build()?;
        run_insert(self, &stmt, req.has_returning()).await
    }

    async fn insert_row(&mut self, req: &InsertRequest) -> Result<Uuid> {
        let stmt = req.clone().returning("id").build()?;
        fetch_id(self, &stmt).await
    }

    async fn update(&mut self, req: &UpdateRequest) -> Result<u64> {
        let stmt = req.build()?;
        exec(self, &stmt).await
    }

    async fn delete(&mut self, req: &DeleteRequest) -> Result<u64> {
        let stmt = req.build()?;
        exec(self, &stmt).await
    }

    async fn execute_raw(&mut self, sql: &str) -> Result<u64> {
        exec_raw(self, sql).await
    }
}

impl Db {
    pub async fn select(&self, req: &SelectRequest) -> Result<Vec<PgRow>> {
        let stmt = req.build()?;
        self.wrap(move |conn| Box::pin(async move { fetch_rows(conn, &stmt).await }))
            .await
    }

    pub async fn select_as<T>(&self, req: &SelectRequest) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static,
    {
        decode_rows(self.select(req).await?)
    }

    pub async fn select_array<T>(&self, req: &SelectRequest) -> Result<Vec<Vec<T>>>
    where
        T: for<'r> Decode<'r, Postgres> + Type<Postgres> + Send + 'static,
    {
        positional(self.select(req).await?)
    }

    pub async fn select_row(&self, req: &SelectRequest) -> Result<Option<PgRow>> {
        let stmt = req.build()?;
        self.wrap(move |conn| Box::pin(async move { fetch_first(conn, &stmt).await }))
            .await
    }

    pub async fn insert(&self, req: &InsertRequest) -> Result<InsertOutcome> {
        let stmt = req.build()?;
        let returning = req.has_returning();
        self.wrap(move |conn| Box::pin(async move { run_insert(conn, &stmt, returning).await }))
            .await
    }

    pub async fn insert_row(&self, req: &InsertRequest) -> Result<Uuid> {
        let stmt = req.clone().returning("id").build()?;
        self.wrap(move |conn| Box::pin(async move { fetch_id(conn, &stmt).await }))
            .await
    }

    pub async fn update(&self, req: &UpdateRequest) -> Result<u64> {
        let stmt = req.build()?;
        self.wrap(move |conn| Box::pin(async move { exec(conn, &stmt).await }))
            .await
    }

    pub async fn update_by_id(&self, req: UpdateRequest, id: Uuid) -> Result<u64> {
        self.update(&req.by_id(id)).await
    }

    pub async fn delete(&self, req: &DeleteRequest) -> Result<u64> {
        let stmt = req.build()?;
        self.wrap(move |conn| Box::pin(async move { exec(conn, &stmt).await }))
            .await
    }

    pub async fn delete_by_id(&self, table: &str, id: Uuid) -> Result<u64> {
        self.delete(&DeleteRequest::new(table).by_id(id)).await
    }

    pub async fn execute_raw(&self, sql: impl Into<String>) -> Result<u64> {
        let sql = sql.into();
        self.wrap(move |conn| Box::pin(async move { exec_raw(conn, &sql).await }))
            .await
    }
}

fn failed(sql: &str, source: sqlx::Error) -> DbError {
    error!(sql = %sql, error = %source, "DB query failed");
    DbError::Query {
        sql: sql.to_owned(),
        source,
    }
}

async fn fetch_rows(conn: &mut PgConnection, stmt: &Statement) -> Result<Vec<PgRow>> {
    debug!(sql = %stmt.text, params = stmt.values.len(), "select");
    stmt.query()
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| failed(&stmt.text, e))
}

async fn fetch_first(conn: &mut PgConnection, stmt: &Statement) -> Result<Option<PgRow>> {
    debug!(sql = %stmt.text, params = stmt.values.len(), "select row");
    stmt.query()
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| failed(&stmt.text, e))
}

async fn fetch_id(conn: &mut PgConnection, stmt: &Statement) -> Result<Uuid> {
    debug!(sql = %stmt.text, params = stmt.values.len(), "insert row");
    let row = stmt
        .query()
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| failed(&stmt.text, e))?;
    row.try_get("id").map_err(DbError::Decode)
}

async fn run_insert(
    conn: &mut PgConnection,
    stmt: &Statement,
    returning: bool,
) -> Result<InsertOutcome> {
    if returning {
        let rows = fetch_rows(conn, stmt).await?;
        Ok(InsertOutcome {
            rows_affected: rows.len() as u64,
            rows,
        })
    } else {
        Ok(InsertOutcome {
            rows_affected: exec(conn, stmt).await?,
            rows: Vec::new(),
        })
    }
}

async fn exec(conn: &mut PgConnection, stmt: &Statement) -> Result<u64> {
    debug!(sql = %stmt.text, params = stmt.values.len(), "execute");
    stmt.query()
        .execute(&mut *conn)
        .await
        .map(|done| done.rows_affected())
        .map_err(|e| failed(&stmt.text, e))
}

async fn exec_raw(conn: &mut PgConnection, sql: &str) -> Result<u64> {
    debug!(sql = %sql, "execute raw");
    sqlx::Executor::execute(&mut *conn, sqlx::raw_sql(sql))
        .await
        .map(|done| done.rows_affected())
        .map_err(|e| failed(sql, e))
}

fn decode_rows<T>(rows: Vec<PgRow>) -> Result<Vec<T>>
where
    T: for<'r> FromRow<'r, PgRow>,
{
    rows.iter()
        .map(T::from_row)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(DbError::Decode)
}

fn positional<T>(rows: Vec<PgRow>) -> Result<Vec<Vec<T>>>
where
    T: for<'r> Decode<'r, Postgres> + Type<Postgres>,
{
    rows.iter()
        .map(|row| {
            (0..row.len())
                .map(|i| row.try_get::<T, _>(i))
                .collect::<std::result::Result<Vec<_>, _>>()
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(DbError::Decode)
}
