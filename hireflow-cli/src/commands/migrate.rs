//! Migration command
//!
//! `hireflow migrate` applies pending units; `--status` reports which units
//! the ledger has recorded (read-only, the ledger is not created); `--list`
//! prints the registry without connecting.

use anyhow::{Context, Result};
use clap::Parser;
use hireflow_db::{Db, Migrator};
use hireflow_server::{migrations, AppConfig, MIGRATIONS};

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Show applied and pending migrations without applying anything
    #[arg(long, conflicts_with = "list")]
    pub status: bool,

    /// List registered migrations (no database connection)
    #[arg(long)]
    pub list: bool,
}

pub async fn run_migrate(args: MigrateArgs, config: AppConfig) -> Result<()> {
    let migrator = Migrator::new(MIGRATIONS).context("Invalid migration registry")?;

    if args.list {
        for unit in MIGRATIONS {
            println!("{:>4}  {}", unit.id, unit.name);
        }
        return Ok(());
    }

    let db = Db::connect(config.database)
        .await
        .context("Failed to connect to database")?;

    if args.status {
        let applied = db
            .recorded_migrations()
            .await
            .context("Failed to read migration ledger")?;
        let pending: Vec<i32> = migrator.pending(&applied).iter().map(|u| u.id).collect();
        for unit in MIGRATIONS {
            let state = if pending.contains(&unit.id) {
                "pending"
            } else {
                "applied"
            };
            println!("{:>4}  {:<20} {}", unit.id, unit.name, state);
        }
    } else {
        let report = migrations::run(&db)
            .await
            .context("Failed to apply migrations")?;
        if report.applied.is_empty() {
            println!("No migrations to apply ({} already applied)", report.skipped);
        } else {
            println!("Applied migrations: {:?}", report.applied);
        }
    }

    db.disconnect().await;
    Ok(())
}
