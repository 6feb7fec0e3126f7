//! Database connection configuration
//!
//! Loaded from the `[database]` table of the application config, then
//! overridden by environment variables:
//! - `HIREFLOW_DB_HOST`, `HIREFLOW_DB_PORT`
//! - `HIREFLOW_DB_USER`, `HIREFLOW_DB_PASSWORD`
//! - `HIREFLOW_DB_NAME`, `HIREFLOW_DB_MAX_CONNECTIONS`

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;

use crate::error::{DbError, Result};

/// Structured connection descriptor
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Target database, created on first connect when missing
    pub database: String,
    /// Database used for the administrative `CREATE DATABASE` connection.
    /// Unset means the server default (a database named after the user).
    pub admin_database: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Session `statement_timeout` in milliseconds, 0 = disabled
    pub statement_timeout_ms: u64,
    /// Session `lock_timeout` in milliseconds, 0 = disabled
    pub lock_timeout_ms: u64,
    /// Session `idle_in_transaction_session_timeout` in milliseconds, 0 = disabled
    pub idle_in_transaction_timeout_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "hireflow".to_string(),
            admin_database: None,
            max_connections: 5,
            acquire_timeout_secs: 30,
            statement_timeout_ms: 0,
            lock_timeout_ms: 0,
            idle_in_transaction_timeout_ms: 0,
        }
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("database", &self.database)
            .field("admin_database", &self.admin_database)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("statement_timeout_ms", &self.statement_timeout_ms)
            .field("lock_timeout_ms", &self.lock_timeout_ms)
            .field(
                "idle_in_transaction_timeout_ms",
                &self.idle_in_transaction_timeout_ms,
            )
            .finish()
    }
}

impl DbConfig {
    /// Apply `HIREFLOW_DB_*` environment overrides.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (environment, test fixtures).
    pub fn apply_vars<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HIREFLOW_DB_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("HIREFLOW_DB_PORT") {
            self.port = port
                .parse()
                .map_err(|_| DbError::config(format!("invalid HIREFLOW_DB_PORT '{}'", port)))?;
        }
        if let Some(user) = lookup("HIREFLOW_DB_USER") {
            self.user = user;
        }
        if let Some(password) = lookup("HIREFLOW_DB_PASSWORD") {
            self.password = password;
        }
        if let Some(database) = lookup("HIREFLOW_DB_NAME") {
            self.database = database;
        }
        if let Some(max) = lookup("HIREFLOW_DB_MAX_CONNECTIONS") {
            self.max_connections = max.parse().map_err(|_| {
                DbError::config(format!("invalid HIREFLOW_DB_MAX_CONNECTIONS '{}'", max))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(DbError::config("database name is empty"));
        }
        if self.host.trim().is_empty() {
            return Err(DbError::config("database host is empty"));
        }
        if self.max_connections == 0 {
            return Err(DbError::config("max_connections must be at least 1"));
        }
        Ok(())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Options for pooled connections to the target database.
    ///
    /// Session defaults ride along as startup parameters so every pooled
    /// connection gets them, not just the first one.
    pub fn connect_options(&self) -> PgConnectOptions {
        self.server_options()
            .database(&self.database)
            .options(self.session_defaults())
    }

    /// Options for the administrative connection used to create the database.
    pub fn admin_connect_options(&self) -> PgConnectOptions {
        match &self.admin_database {
            Some(db) => self.server_options().database(db),
            None => self.server_options(),
        }
    }

    /// Session parameters applied to every pooled connection.
    pub fn session_defaults(&self) -> Vec<(&'static str, String)> {
        vec![
            ("statement_timeout", self.statement_timeout_ms.to_string()),
            ("lock_timeout", self.lock_timeout_ms.to_string()),
            (
                "idle_in_transaction_session_timeout",
                self.idle_in_transaction_timeout_ms.to_string(),
            ),
            ("client_encoding", "UTF8".to_string()),
            ("standard_conforming_strings", "on".to_string()),
            ("client_min_messages", "warning".to_string()),
        ]
    }

    fn server_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user);
        if self.password.is_empty() {
            options
        } else {
            options.password(&self.password)
        }
    }
}
