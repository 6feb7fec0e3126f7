//! Connection manager
//!
//! `Db` owns the sqlx `PgPool`. It is built once by [`Db::connect`] and
//! handed to every dependent (services, HTTP state, migration runner).
//! Implicit queries borrow a lease through [`Db::wrap`]; the lease is a
//! `PoolConnection` that returns to the pool when dropped, so it is released
//! on success, on error and when the borrowing future is cancelled.

use futures::future::BoxFuture;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::Connection;
use tracing::{debug, info, warn};

use crate::config::DbConfig;
use crate::ddl::create_extension_sql;
use crate::error::{is_missing_database, DbError, Result};
use crate::ident::quote_ident;

/// Extension installed when the database is first created.
const UUID_EXTENSION: &str = "uuid-ossp";

/// Pooled PostgreSQL handle
#[derive(Clone)]
pub struct Db {
    pool: PgPool,
    config: DbConfig,
}

impl Db {
    /// Establish the pool, creating the database if it does not exist yet.
    ///
    /// # Errors
    ///
    /// - `DbError::Connect` if the server is unreachable or rejects the login
    /// - `DbError::CreateDatabase` if the database was missing and could not be created
    ///
    /// # Example
    ///
    /// ```ignore
    /// let db = Db::connect(DbConfig::default()).await?;
    /// ```
    pub async fn connect(config: DbConfig) -> Result<Self> {
        config.validate()?;

        match open_pool(&config).await {
            Ok(pool) => {
                info!(
                    host = %config.host,
                    database = %config.database,
                    max_connections = config.max_connections,
                    "Connected to database"
                );
                Ok(Self { pool, config })
            }
            Err(err) if is_missing_database(&err) => {
                warn!(database = %config.database, "Database does not exist, creating it");
                create_database(&config).await?;

                let pool = open_pool(&config).await.map_err(|source| DbError::Connect {
                    database: config.database.clone(),
                    source,
                })?;
                let db = Self { pool, config };
                db.init_database().await?;
                Ok(db)
            }
            Err(source) => Err(DbError::Connect {
                database: config.database,
                source,
            }),
        }
    }

    /// Build the pool without opening a connection.
    ///
    /// The first query connects. Used by tools and tests that never reach
    /// the server.
    pub fn connect_lazy(config: DbConfig) -> Result<Self> {
        config.validate()?;
        let pool = pool_options(&config).connect_lazy_with(config.connect_options());
        Ok(Self { pool, config })
    }

    /// Close the pool and wait for leased connections to come back.
    ///
    /// Calling it again on a closed pool does nothing.
    pub async fn disconnect(&self) {
        if self.pool.is_closed() {
            return;
        }
        self.pool.close().await;
        info!(database = %self.config.database, "Disconnected from database");
    }

    /// Borrow a connection, run `f` with it and give it back.
    ///
    /// The lease is released on every exit path, including when the
    /// returned future is dropped before completion.
    pub async fn wrap<T, F>(&self, f: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T>>,
    {
        let mut lease = self.pool.acquire().await.map_err(DbError::Acquire)?;
        f(&mut *lease).await
    }

    /// Run `f` inside `BEGIN .. COMMIT` on one leased connection.
    ///
    /// An error from `f` rolls the transaction back and is returned
    /// unchanged. Dropping the future mid-way also rolls back.
    pub async fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T>>,
    {
        let mut tx = self.pool.begin().await.map_err(DbError::Acquire)?;

        match f(&mut *tx).await {
            Ok(value) => {
                tx.commit().await.map_err(|source| DbError::Query {
                    sql: "COMMIT".to_string(),
                    source,
                })?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Connections currently leased out of the pool.
    ///
    /// A dropped lease is handed back to the pool on a background task, so
    /// the count can lag behind the end of [`Db::wrap`] briefly.
    pub fn leases(&self) -> u32 {
        self.pool.size().saturating_sub(self.pool.num_idle() as u32)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// One-time schema setup after the database has been created.
    async fn init_database(&self) -> Result<()> {
        self.execute_raw(create_extension_sql(UUID_EXTENSION)?).await?;
        info!(database = %self.config.database, "Database initialized");
        Ok(())
    }
}

fn pool_options(config: &DbConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
}

async fn open_pool(config: &DbConfig) -> std::result::Result<PgPool, sqlx::Error> {
    pool_options(config)
        .connect_with(config.connect_options())
        .await
}

/// `CREATE DATABASE` over a short-lived administrative connection.
async fn create_database(config: &DbConfig) -> Result<()> {
    let failed = |source| DbError::CreateDatabase {
        database: config.database.clone(),
        source,
    };

    let mut admin = PgConnection::connect_with(&config.admin_connect_options())
        .await
        .map_err(failed)?;

    let sql = format!("CREATE DATABASE {}", quote_ident(&config.database)?);
    debug!(sql = %sql, "Creating database");
    let created = sqlx::Executor::execute(&mut admin, sqlx::raw_sql(&sql)).await;

    if let Err(err) = admin.close().await {
        warn!(error = %err, "Failed to close administrative connection");
    }

    created.map_err(failed)?;
    info!(database = %config.database, "Database created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Queries;
    use std::time::Duration;

    // Integration tests require a real database
    // Run with: HIREFLOW_DB_HOST=... cargo test -p hireflow-db -- --ignored

    fn test_config() -> DbConfig {
        DbConfig::default().apply_env().expect("valid test config")
    }

    /// Wait until the lease count reaches `expected` (or give up after 2s).
    async fn settled_leases(db: &Db, expected: u32) -> u32 {
        let settle = async {
            while db.leases() != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };
        let _ = tokio::time::timeout(Duration::from_secs(2), settle).await;
        db.leases()
    }

    #[tokio::test]
    async fn lazy_pool_has_no_leases() {
        let db = Db::connect_lazy(DbConfig::default()).expect("lazy pool");
        assert_eq!(db.leases(), 0);
        assert_eq!(db.config().database, "hireflow");
        db.disconnect().await;
        db.disconnect().await;
        assert!(db.pool().is_closed());
    }

    #[test]
    fn invalid_config_is_rejected_before_connecting() {
        let config = DbConfig {
            max_connections: 0,
            ..DbConfig::default()
        };
        assert!(matches!(
            Db::connect_lazy(config),
            Err(DbError::Config { .. })
        ));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn wrap_releases_lease_on_error() {
        let db = Db::connect(test_config()).await.expect("connect");
        let baseline = db.leases();

        let result: Result<()> = db
            .wrap(|conn| {
                Box::pin(async move {
                    conn.execute_raw("SELECT 1").await?;
                    Err(DbError::not_found("fixture", "boom"))
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(settled_leases(&db, baseline).await, baseline);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn concurrent_wraps_share_the_pool() {
        let db = Db::connect(test_config()).await.expect("connect");

        let handles: Vec<_> = (0..10)
            .map(|i: i32| {
                let db = db.clone();
                tokio::spawn(async move {
                    db.wrap(move |conn| {
                        Box::pin(async move {
                            let value: i32 = sqlx::query_scalar("SELECT $1::int")
                                .bind(i)
                                .fetch_one(&mut *conn)
                                .await
                                .map_err(|source| DbError::Query {
                                    sql: "SELECT $1::int".into(),
                                    source,
                                })?;
                            Ok(value)
                        })
                    })
                    .await
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.await.expect("task panicked").expect("query failed");
            assert_eq!(result, i as i32);
        }
        assert_eq!(settled_leases(&db, 0).await, 0);
    }
}
