//! Embedded schema migrations for the listing database

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashSet};

pub mod manager;

pub use manager::{MigrationManager, MigrationStatus};

/// A single migration with up and down SQL
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub name: String,
    pub up_sql: String,
    pub down_sql: String,
}

/// A migration recorded as applied
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppliedMigration {
    pub version: i64,
    pub name: String,
    pub applied_at: chrono::DateTime<chrono::Utc>,
    pub checksum: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

/// Load migrations embedded from `files/NNN_name/{up,down}.sql`
pub fn load_migrations() -> Result<BTreeMap<i64, Migration>> {
    use include_dir::{include_dir, Dir};

    static MIGRATIONS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/config/migrations/files");

    let mut migrations = BTreeMap::new();

    for entry in MIGRATIONS_DIR.dirs() {
        let dir_name = entry
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .context("Invalid migration directory name")?;

        let (version, name) = dir_name
            .split_once('_')
            .with_context(|| format!("Invalid migration directory format: {}. Expected NNN_name", dir_name))?;

        let version: i64 = version
            .parse()
            .with_context(|| format!("Invalid migration version in directory: {}", dir_name))?;

        let read = |file: &str| -> Result<String> {
            let path = format!("{}/{}", dir_name, file);
            let contents = MIGRATIONS_DIR
                .get_file(&path)
                .with_context(|| format!("Missing {} in migration {}", file, dir_name))?
                .contents_utf8()
                .with_context(|| format!("{} is not valid UTF-8 in migration {}", file, dir_name))?;
            Ok(contents.to_string())
        };

        migrations.insert(
            version,
            Migration {
                version,
                name: name.to_string(),
                up_sql: read("up.sql")?,
                down_sql: read("down.sql")?,
            },
        );
    }

    if migrations.is_empty() {
        anyhow::bail!("No migrations found in files directory");
    }

    Ok(migrations)
}

/// Create the migration tracking table
pub async fn init_migration_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            checksum TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create schema_migrations table")?;

    Ok(())
}

pub async fn get_applied_migrations(pool: &SqlitePool) -> Result<Vec<AppliedMigration>> {
    sqlx::query_as::<_, AppliedMigration>(
        "SELECT version, name, applied_at, checksum FROM schema_migrations ORDER BY version",
    )
    .fetch_all(pool)
    .await
    .context("Failed to get applied migrations")
}

/// Checksum of migration SQL with line endings normalised to LF
pub fn calculate_checksum(sql: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let normalized = sql.replace("\r\n", "\n").replace('\r', "\n");

    let mut hasher = DefaultHasher::new();
    normalized.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// Fail if an applied migration was edited or removed after being applied
pub async fn validate_migrations(pool: &SqlitePool) -> Result<()> {
    let available = load_migrations()?;
    let applied = get_applied_migrations(pool).await?;

    for applied_migration in applied {
        let Some(available_migration) = available.get(&applied_migration.version) else {
            anyhow::bail!(
                "Applied migration {} '{}' not found in available migrations",
                applied_migration.version,
                applied_migration.name
            );
        };

        let expected = calculate_checksum(&available_migration.up_sql);
        if applied_migration.checksum != expected {
            anyhow::bail!(
                "Migration {} checksum mismatch (applied {}, expected {}); the migration file was modified after being applied",
                applied_migration.version,
                applied_migration.checksum,
                expected
            );
        }
    }

    Ok(())
}

pub async fn get_pending_migrations(pool: &SqlitePool) -> Result<Vec<Migration>> {
    let available = load_migrations()?;
    let applied: HashSet<i64> = get_applied_migrations(pool)
        .await?
        .into_iter()
        .map(|m| m.version)
        .collect();

    Ok(available
        .into_values()
        .filter(|m| !applied.contains(&m.version))
        .collect())
}

/// Highest applied migration version
pub async fn get_current_version(pool: &SqlitePool) -> Result<Option<i64>> {
    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_migrations")
        .fetch_one(pool)
        .await
        .context("Failed to get current schema version")?;

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_migrations() {
        let migrations = load_migrations().unwrap();
        assert!(migrations.contains_key(&1), "Should have migration 001_initial");
        assert!(migrations.contains_key(&2), "Should have migration 002_listings");
        assert_eq!(migrations[&2].name, "listings");

        for (version, migration) in &migrations {
            assert!(!migration.up_sql.is_empty(), "Migration {} should have up.sql", version);
            assert!(!migration.down_sql.is_empty(), "Migration {} should have down.sql", version);
        }
    }

    #[test]
    fn test_checksum_ignores_line_endings() {
        let unix = "CREATE TABLE a (id INTEGER);\nCREATE TABLE b (id INTEGER);";
        let windows = "CREATE TABLE a (id INTEGER);\r\nCREATE TABLE b (id INTEGER);";
        assert_eq!(calculate_checksum(unix), calculate_checksum(windows));
        assert_ne!(calculate_checksum(unix), calculate_checksum("CREATE TABLE c (id INTEGER);"));
    }
}
