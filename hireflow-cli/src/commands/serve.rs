//! HTTP server command
//!
//! Connects to the database (creating it on first start), applies pending
//! migrations and serves the API until Ctrl+C/SIGTERM.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use hireflow_db::Db;
use hireflow_server::{migrations, run_server, AppConfig};
use tracing::info;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides config/environment)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Do not apply pending migrations before serving
    #[arg(long)]
    pub skip_migrations: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, mut config: AppConfig) -> Result<()> {
    if let Some(bind) = args.bind {
        config.server.bind_addr = bind;
    }
    config.server.cors_permissive |= args.cors_permissive;

    info!("Starting hireflow server on {}", config.server.bind_addr);

    let db = Db::connect(config.database.clone())
        .await
        .context("Failed to connect to database")?;

    if args.skip_migrations {
        info!("Skipping migrations");
    } else {
        let report = migrations::run(&db)
            .await
            .context("Failed to apply migrations")?;
        info!(
            applied = report.applied.len(),
            skipped = report.skipped,
            "Schema up to date"
        );
    }

    // Run server (blocks until shutdown)
    run_server(db, config.server)
        .await
        .context("Server error")?;

    Ok(())
}
