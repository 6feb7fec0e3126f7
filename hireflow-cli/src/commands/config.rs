//! Configuration command

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hireflow_server::config::default_config_path;
use hireflow_server::AppConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a config file with default values
    Init(InitArgs),
    /// Print the effective configuration (file + environment) as TOML
    Show,
    /// Show config file path
    Path,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Force overwrite existing config
    #[arg(long, short)]
    pub force: bool,
}

/// `explicit` is the global `--config` path, if given.
pub fn run_config(args: ConfigArgs, explicit: Option<&Path>) -> Result<()> {
    let path = resolve_path(explicit)?;
    match args.command {
        ConfigCommands::Init(args) => run_init(&path, args),
        ConfigCommands::Show => run_show(&path),
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_path().context("Could not determine home directory"),
    }
}

fn run_init(path: &Path, args: InitArgs) -> Result<()> {
    if path.exists() && !args.force {
        return Err(anyhow::anyhow!(
            "Config already exists at {}\n\nUse --force to overwrite",
            path.display()
        ));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let contents = toml::to_string_pretty(&AppConfig::default())
        .context("Failed to serialize default config")?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn run_show(path: &Path) -> Result<()> {
    let mut config = AppConfig::load(Some(path)).context("Failed to load config")?;
    if !config.database.password.is_empty() {
        config.database.password = "***".to_string();
    }
    print!(
        "{}",
        toml::to_string_pretty(&config).context("Failed to serialize config")?
    );
    Ok(())
}
