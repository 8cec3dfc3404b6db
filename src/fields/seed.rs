//! Canonical field definitions shipped with the binary

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::SqlitePool;

use super::definition::FieldDefinition;
use crate::config::repository::fields;

const DEFAULT_DEFINITIONS: &str = include_str!("defaults/field_definitions.json");

/// What a seeding run did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SeedOutcome {
    /// Definitions already existed and `force` was not given
    Skipped { existing: i64 },
    Seeded { inserted: usize },
    Replaced { removed: i64, inserted: usize },
}

impl SeedOutcome {
    pub fn inserted(&self) -> usize {
        match self {
            SeedOutcome::Skipped { .. } => 0,
            SeedOutcome::Seeded { inserted } | SeedOutcome::Replaced { inserted, .. } => *inserted,
        }
    }
}

pub fn canonical_definitions() -> Result<Vec<FieldDefinition>> {
    serde_json::from_str(DEFAULT_DEFINITIONS).context("Bundled field definitions are not valid JSON")
}

/// Load the canonical definitions.
///
/// A non-empty table is left alone unless `force` is set, in which case it is
/// truncated and reloaded in one transaction.
pub async fn seed_fields(pool: &SqlitePool, force: bool) -> Result<SeedOutcome> {
    let existing = fields::count(pool).await?;
    if existing > 0 && !force {
        log::info!("Skipping field seeding: {} definitions already present", existing);
        return Ok(SeedOutcome::Skipped { existing });
    }

    let definitions = canonical_definitions()?;
    let inserted = fields::replace_all(pool, &definitions).await?;

    if existing > 0 {
        log::info!("Replaced {} field definitions with {} canonical ones", existing, inserted);
        Ok(SeedOutcome::Replaced { removed: existing, inserted })
    } else {
        log::info!("Seeded {} field definitions", inserted);
        Ok(SeedOutcome::Seeded { inserted })
    }
}
