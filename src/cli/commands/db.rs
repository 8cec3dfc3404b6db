//! `db`: schema status and rollback

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;

use crate::config::db;
use crate::config::migrations::MigrationManager;
use crate::config::Config;
use crate::settings::Settings;

#[derive(Args)]
pub struct DbCommands {
    #[command(subcommand)]
    pub command: DbSubcommands,
}

#[derive(Subcommand)]
pub enum DbSubcommands {
    /// Show applied and pending migrations
    Status,
    /// Roll back migrations
    Rollback {
        /// Version to roll back to; defaults to undoing the latest migration
        #[arg(long)]
        to: Option<i64>,
    },
}

pub async fn db_command(args: DbCommands, settings: &Settings) -> Result<()> {
    let config = Config::load(settings).await?;
    let manager = MigrationManager::new(config.pool());

    match args.command {
        DbSubcommands::Status => {
            let status = manager.status().await?;
            let info = db::get_db_info(config.pool()).await?;

            println!("Database: {}", config.db_path().display().to_string().cyan());
            println!(
                "Schema version: {} of {}",
                status.current_version.unwrap_or(0),
                status.total_available
            );
            for migration in &status.applied_migrations {
                println!("  {} {:03} {}", "✓".green(), migration.version, migration.name);
            }
            for migration in &status.pending_migrations {
                println!("  {} {:03} {}", "•".yellow(), migration.version, migration.name);
            }
            println!("Field definitions: {}, listings: {}", info.field_definitions, info.listings);
        }
        DbSubcommands::Rollback { to } => {
            let rolled_back = manager.migrate_down(to).await?;
            println!("{} Rolled back {} migrations", "✓".bright_green().bold(), rolled_back);
        }
    }

    Ok(())
}
