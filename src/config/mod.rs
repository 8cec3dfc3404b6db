//! SQLite-backed persistence
//!
//! Holds field definitions, reference data, listings and the cached
//! SP-API access token.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};

pub mod db;
pub mod migrations;
pub mod models;
pub mod repository;

use crate::fields::definition::FieldDefinition;
use crate::reference::{Prop65Chemical, WishBrand};
use crate::settings::Settings;

/// Database handle used by the CLI and tests
pub struct Config {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl Config {
    /// Open the database named by `settings.database.connection` and bring its schema up to date
    pub async fn load(settings: &Settings) -> Result<Self> {
        let connection = settings.database_connection()?;

        if connection.is_memory() {
            log::warn!("Using an in-memory database; nothing will be persisted");
            return Self::new_test().await;
        }

        Self::open(Path::new(&connection.path)).await
    }

    pub async fn open(db_path: &Path) -> Result<Self> {
        log::debug!("Opening database at {}", db_path.display());
        let pool = db::connect(db_path).await?;
        db::run_migrations(&pool)
            .await
            .with_context(|| format!("Failed to migrate database {}", db_path.display()))?;

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    /// In-memory database with the schema applied
    pub async fn new_test() -> Result<Self> {
        let pool = db::connect_memory().await?;
        db::run_migrations(&pool).await?;

        Ok(Self {
            pool,
            db_path: PathBuf::from(crate::settings::MEMORY_DATABASE),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    // Field definitions
    pub async fn list_fields(&self) -> Result<Vec<FieldDefinition>> {
        repository::fields::list(&self.pool).await
    }

    pub async fn list_fields_for(&self, marketplace: &str) -> Result<Vec<FieldDefinition>> {
        repository::fields::list_by_marketplace(&self.pool, marketplace).await
    }

    pub async fn get_field(&self, field_name: &str) -> Result<Option<FieldDefinition>> {
        repository::fields::get_by_name(&self.pool, field_name).await
    }

    pub async fn add_field(&self, def: &FieldDefinition) -> Result<i64> {
        repository::fields::insert(&self.pool, def).await
    }

    pub async fn count_fields(&self) -> Result<i64> {
        repository::fields::count(&self.pool).await
    }

    // Reference data
    pub async fn list_chemicals(&self) -> Result<Vec<Prop65Chemical>> {
        repository::reference::list_chemicals(&self.pool).await
    }

    pub async fn list_brands(&self) -> Result<Vec<WishBrand>> {
        repository::reference::list_brands(&self.pool).await
    }
}
