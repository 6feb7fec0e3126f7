//! `.env` loading
//!
//! Priority order (highest to lowest):
//! 1. Environment variables already set
//! 2. Current directory .env
//! 3. ~/.hireflow/.env
//!
//! dotenvy never overwrites variables that are already set, so loading the
//! files in this order gives the priorities above. Runs before tracing is
//! initialised so `RUST_LOG` can come from a `.env` file; the outcome is
//! logged afterwards with [`DotenvReport::log`].

use std::path::PathBuf;

use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct DotenvReport {
    pub loaded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl DotenvReport {
    pub fn log(&self) {
        for (path, error) in &self.failed {
            warn!(path = %path.display(), error = %error, "Failed to load .env file");
        }
        if self.loaded.is_empty() {
            debug!("No .env files found (current dir or ~/.hireflow)");
        } else {
            let paths: Vec<_> = self.loaded.iter().map(|p| p.display().to_string()).collect();
            debug!("Loaded environment from: {}", paths.join(", "));
        }
    }
}

pub fn load_dotenv() -> DotenvReport {
    let mut report = DotenvReport::default();

    match dotenvy::dotenv() {
        Ok(path) => report.loaded.push(path),
        Err(e) if e.not_found() => {}
        Err(e) => report.failed.push((PathBuf::from(".env"), e.to_string())),
    }

    if let Some(env_file) = hireflow_server::config::config_dir().map(|dir| dir.join(".env")) {
        if env_file.exists() {
            match dotenvy::from_path(&env_file) {
                Ok(()) => report.loaded.push(env_file),
                Err(e) => report.failed.push((env_file, e.to_string())),
            }
        }
    }

    report
}
