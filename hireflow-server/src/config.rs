//! Application configuration
//!
//! Loaded from TOML (`~/.hireflow/config.toml` unless a path is given),
//! falling back to built-in defaults when the file does not exist, then
//! overridden by environment variables:
//! - `HIREFLOW_BIND_ADDR`, `HIREFLOW_CORS_PERMISSIVE`
//! - `HIREFLOW_DB_*` (see [`DbConfig`])
//!
//! ```toml
//! [server]
//! bind_addr = "127.0.0.1:3030"
//!
//! [database]
//! host = "localhost"
//! database = "hireflow"
//! max_connections = 10
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use hireflow_db::{DbConfig, DbError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:3030)
    pub bind_addr: SocketAddr,

    /// Allow permissive CORS (default: false = localhost only)
    ///
    /// WARNING: Setting this to true allows any origin.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3030)),
            cors_permissive: false,
        }
    }
}

/// Whole application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DbConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid {key} '{value}'")]
    InvalidVar { key: &'static str, value: String },

    #[error(transparent)]
    Database(#[from] DbError),
}

/// `~/.hireflow`
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".hireflow"))
}

/// `~/.hireflow/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

impl AppConfig {
    /// Load from `path` (or the default location), then apply the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).or_else(default_config_path);
        let config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!(path = %path.display(), "No config file, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_vars(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Apply overrides from an arbitrary lookup (environment, test fixtures).
    pub fn apply_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("HIREFLOW_BIND_ADDR") {
            self.server.bind_addr = addr.parse().map_err(|_| ConfigError::InvalidVar {
                key: "HIREFLOW_BIND_ADDR",
                value: addr.clone(),
            })?;
        }
        if let Some(flag) = lookup("HIREFLOW_CORS_PERMISSIVE") {
            self.server.cors_permissive = match flag.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        key: "HIREFLOW_CORS_PERMISSIVE",
                        value: flag,
                    })
                }
            };
        }
        self.database = self.database.apply_vars(&lookup)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_vars(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3030);
        assert!(!config.cors_permissive);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nbind_addr = \"0.0.0.0:8000\"\n\n[database]\nhost = \"pg\"\nmax_connections = 20"
        )
        .unwrap();

        let config = AppConfig::from_file(file.path())
            .unwrap()
            .apply_vars(no_vars)
            .unwrap();
        assert_eq!(config.server.bind_addr.port(), 8000);
        assert_eq!(config.database.host, "pg");
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.database.database, "hireflow");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nbind_addr = 3").unwrap();
        let err = AppConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn env_overrides_file() {
        let config = AppConfig::default()
            .apply_vars(|key| match key {
                "HIREFLOW_BIND_ADDR" => Some("127.0.0.1:9999".into()),
                "HIREFLOW_CORS_PERMISSIVE" => Some("true".into()),
                "HIREFLOW_DB_NAME" => Some("staffing".into()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.server.bind_addr.port(), 9999);
        assert!(config.server.cors_permissive);
        assert_eq!(config.database.database, "staffing");
    }

    #[test]
    fn bad_bind_addr_is_reported() {
        let err = AppConfig::default()
            .apply_vars(|key| (key == "HIREFLOW_BIND_ADDR").then(|| "nowhere".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("HIREFLOW_BIND_ADDR"));
    }
}
