//! hireflow CLI - hiring pipeline backend
//!
//! Entry point for the hireflow service:
//! - HTTP API server (`serve`)
//! - Schema migrations (`migrate`)
//! - Configuration management (`config`)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hireflow_server::AppConfig;

mod commands;
mod env;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "hireflow",
    author,
    version,
    about = "Applicant tracking backend: HTTP API and schema migrations over PostgreSQL"
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    /// Config file (default: ~/.hireflow/config.toml)
    #[arg(long, short = 'c', global = true, env = "HIREFLOW_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server (applies pending migrations first)
    Serve(commands::serve::ServeArgs),
    /// Apply pending schema migrations
    Migrate(commands::migrate::MigrateArgs),
    /// Manage hireflow configuration (init, show, path)
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = env::load_dotenv();
    let cli = Cli::parse();

    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();
    dotenv.log();

    match cli.command {
        Commands::Serve(args) => {
            commands::run_serve(args, load_config(cli.config.as_deref())?).await?
        }
        Commands::Migrate(args) => {
            commands::run_migrate(args, load_config(cli.config.as_deref())?).await?
        }
        Commands::Config(args) => commands::run_config(args, cli.config.as_deref())?,
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    AppConfig::load(path).context("Failed to load configuration")
}
