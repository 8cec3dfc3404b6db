//! Applies and rolls back embedded migrations

use anyhow::{Context, Result};
use log::{debug, info, warn};
use sqlx::SqlitePool;

use super::{
    calculate_checksum, get_applied_migrations, get_current_version, get_pending_migrations,
    init_migration_table, load_migrations, validate_migrations, AppliedMigration, Direction, Migration,
};

pub struct MigrationManager<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MigrationManager<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init(&self) -> Result<()> {
        debug!("Initializing migration tracking table");
        init_migration_table(self.pool).await
    }

    /// Apply every pending migration in version order
    pub async fn migrate_up(&self) -> Result<usize> {
        self.init().await?;
        validate_migrations(self.pool).await?;

        let pending = get_pending_migrations(self.pool).await?;
        if pending.is_empty() {
            debug!("Schema is up to date");
            return Ok(0);
        }

        info!("Applying {} pending migrations", pending.len());
        let count = pending.len();
        for migration in pending {
            self.apply(&migration, Direction::Up).await?;
        }

        Ok(count)
    }

    /// Roll back to `target_version`, or to an empty schema when `None`
    pub async fn migrate_down(&self, target_version: Option<i64>) -> Result<usize> {
        self.init().await?;
        validate_migrations(self.pool).await?;

        let target = target_version.unwrap_or(0);
        let current = get_current_version(self.pool).await?.unwrap_or(0);
        if target >= current {
            info!("Already at or below version {}", target);
            return Ok(0);
        }

        let available = load_migrations()?;
        let mut to_rollback = Vec::new();
        for applied in get_applied_migrations(self.pool).await?.into_iter().rev() {
            if applied.version <= target {
                continue;
            }
            let migration = available
                .get(&applied.version)
                .with_context(|| format!("Cannot roll back migration {}: file not found", applied.version))?;
            to_rollback.push(migration.clone());
        }

        info!("Rolling back {} migrations to version {}", to_rollback.len(), target);
        let count = to_rollback.len();
        for migration in to_rollback {
            self.apply(&migration, Direction::Down).await?;
        }

        Ok(count)
    }

    async fn apply(&self, migration: &Migration, direction: Direction) -> Result<()> {
        let sql = match direction {
            Direction::Up => &migration.up_sql,
            Direction::Down => &migration.down_sql,
        };

        if sql.trim().is_empty() {
            warn!(
                "Migration {} has empty {} SQL, skipping",
                migration.version,
                direction.as_str()
            );
            return Ok(());
        }

        info!(
            "{} migration {} '{}'",
            match direction {
                Direction::Up => "Applying",
                Direction::Down => "Rolling back",
            },
            migration.version,
            migration.name
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start migration transaction")?;

        // Migration files hold several statements
        sqlx::raw_sql(sql)
            .execute(&mut *tx)
            .await
            .with_context(|| {
                format!(
                    "Failed to execute migration {} {} SQL",
                    migration.version,
                    direction.as_str()
                )
            })?;

        match direction {
            Direction::Up => {
                sqlx::query("INSERT INTO schema_migrations (version, name, checksum) VALUES (?, ?, ?)")
                    .bind(migration.version)
                    .bind(&migration.name)
                    .bind(calculate_checksum(&migration.up_sql))
                    .execute(&mut *tx)
                    .await
                    .context("Failed to record migration")?;
            }
            Direction::Down => {
                sqlx::query("DELETE FROM schema_migrations WHERE version = ?")
                    .bind(migration.version)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to remove migration record")?;
            }
        }

        tx.commit()
            .await
            .context("Failed to commit migration transaction")?;

        Ok(())
    }

    pub async fn status(&self) -> Result<MigrationStatus> {
        self.init().await?;

        let available = load_migrations()?;
        let applied = get_applied_migrations(self.pool).await?;
        let pending = get_pending_migrations(self.pool).await?;

        Ok(MigrationStatus {
            current_version: get_current_version(self.pool).await?,
            total_available: available.len(),
            applied_migrations: applied,
            pending_migrations: pending,
        })
    }
}

#[derive(Debug)]
pub struct MigrationStatus {
    pub current_version: Option<i64>,
    pub total_available: usize,
    pub applied_migrations: Vec<AppliedMigration>,
    pub pending_migrations: Vec<Migration>,
}

impl MigrationStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.pending_migrations.is_empty()
    }
}
