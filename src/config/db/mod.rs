//! SQLite connections

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;

/// Open (creating if needed) the database file with WAL and foreign keys enabled
pub async fn connect(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
        }
    }

    let database_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePool::connect(&database_url)
        .await
        .with_context(|| format!("Failed to connect to database: {}", db_path.display()))?;

    for pragma in [
        "PRAGMA journal_mode = WAL",
        "PRAGMA synchronous = NORMAL",
        "PRAGMA foreign_keys = ON",
    ] {
        sqlx::query(pragma)
            .execute(&pool)
            .await
            .with_context(|| format!("Failed to run '{}'", pragma))?;
    }

    log::debug!("Connected to SQLite database: {}", db_path.display());
    Ok(pool)
}

/// In-memory database for tests. A single connection, since every
/// connection to `:memory:` gets its own empty database.
pub async fn connect_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .context("Failed to connect to in-memory database")?;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .context("Failed to enable foreign keys")?;

    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let applied = crate::config::migrations::MigrationManager::new(pool)
        .migrate_up()
        .await?;
    if applied > 0 {
        log::info!("Applied {} database migrations", applied);
    }
    Ok(())
}

/// Row counts of the domain tables, for `install` output
#[derive(Debug, Default)]
pub struct DatabaseInfo {
    pub schema_version: i64,
    pub field_definitions: i64,
    pub prop65_chemicals: i64,
    pub wish_brands: i64,
    pub listings: i64,
}

async fn count_rows(pool: &SqlitePool, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    sqlx::query_scalar(&sql)
        .fetch_one(pool)
        .await
        .with_context(|| format!("Failed to count rows in {}", table))
}

pub async fn get_db_info(pool: &SqlitePool) -> Result<DatabaseInfo> {
    let schema_version: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
        .fetch_one(pool)
        .await
        .context("Failed to read schema version")?;

    Ok(DatabaseInfo {
        schema_version,
        field_definitions: count_rows(pool, "field_definitions").await?,
        prop65_chemicals: count_rows(pool, "prop65_chemicals").await?,
        wish_brands: count_rows(pool, "wish_brands").await?,
        listings: count_rows(pool, "listings").await?,
    })
}
