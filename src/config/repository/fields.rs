//! Repository for field definitions

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::config::models::DbFieldDefinition;
use crate::fields::definition::FieldDefinition;

const SELECT_COLUMNS: &str = "SELECT id, ordering, field_name, display_name, tooltip, example, marketplace, \
     input_type, input_type_aux, required, grouping, type FROM field_definitions";

const INSERT_SQL: &str = r#"
    INSERT INTO field_definitions
        (ordering, field_name, display_name, tooltip, example, marketplace,
         input_type, input_type_aux, required, grouping, type)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

fn into_definitions(rows: Vec<DbFieldDefinition>) -> Result<Vec<FieldDefinition>> {
    rows.into_iter().map(FieldDefinition::try_from).collect()
}

/// Insert a new definition and return its id. Fails when `field_name` is taken.
pub async fn insert(pool: &SqlitePool, def: &FieldDefinition) -> Result<i64> {
    let result = sqlx::query(INSERT_SQL)
        .bind(def.ordering)
        .bind(&def.field_name)
        .bind(&def.display_name)
        .bind(&def.tooltip)
        .bind(&def.example)
        .bind(&def.marketplace)
        .bind(def.input_type.as_str())
        .bind(&def.input_type_aux)
        .bind(def.required)
        .bind(&def.grouping)
        .bind(def.field_type.as_str())
        .execute(pool)
        .await
        .with_context(|| format!("Failed to insert field definition '{}'", def.field_name))?;

    log::debug!("Inserted field definition: {}", def.field_name);
    Ok(result.last_insert_rowid())
}

/// Update the row identified by `def.id`
pub async fn update(pool: &SqlitePool, def: &FieldDefinition) -> Result<()> {
    let id = def
        .id
        .with_context(|| format!("Field definition '{}' has no id", def.field_name))?;

    let result = sqlx::query(
        r#"
        UPDATE field_definitions
        SET ordering = ?, field_name = ?, display_name = ?, tooltip = ?, example = ?,
            marketplace = ?, input_type = ?, input_type_aux = ?, required = ?,
            grouping = ?, type = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(def.ordering)
    .bind(&def.field_name)
    .bind(&def.display_name)
    .bind(&def.tooltip)
    .bind(&def.example)
    .bind(&def.marketplace)
    .bind(def.input_type.as_str())
    .bind(&def.input_type_aux)
    .bind(def.required)
    .bind(&def.grouping)
    .bind(def.field_type.as_str())
    .bind(id)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to update field definition '{}'", def.field_name))?;

    if result.rows_affected() == 0 {
        anyhow::bail!("Field definition with id {} not found", id);
    }

    Ok(())
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<FieldDefinition>> {
    let row: Option<DbFieldDefinition> = sqlx::query_as(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get field definition {}", id))?;

    row.map(FieldDefinition::try_from).transpose()
}

pub async fn get_by_name(pool: &SqlitePool, field_name: &str) -> Result<Option<FieldDefinition>> {
    let row: Option<DbFieldDefinition> =
        sqlx::query_as(&format!("{} WHERE field_name = ?", SELECT_COLUMNS))
            .bind(field_name)
            .fetch_optional(pool)
            .await
            .with_context(|| format!("Failed to get field definition '{}'", field_name))?;

    row.map(FieldDefinition::try_from).transpose()
}

/// All definitions ordered by marketplace, grouping and ordering
pub async fn list(pool: &SqlitePool) -> Result<Vec<FieldDefinition>> {
    let rows: Vec<DbFieldDefinition> = sqlx::query_as(&format!(
        "{} ORDER BY marketplace, grouping, ordering, id",
        SELECT_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .context("Failed to list field definitions")?;

    into_definitions(rows)
}

pub async fn list_by_marketplace(pool: &SqlitePool, marketplace: &str) -> Result<Vec<FieldDefinition>> {
    let rows: Vec<DbFieldDefinition> = sqlx::query_as(&format!(
        "{} WHERE marketplace = ? COLLATE NOCASE ORDER BY grouping, ordering, id",
        SELECT_COLUMNS
    ))
    .bind(marketplace)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to list field definitions for '{}'", marketplace))?;

    into_definitions(rows)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM field_definitions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete field definition {}", id))?;

    Ok(result.rows_affected() > 0)
}

pub async fn count(pool: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM field_definitions")
        .fetch_one(pool)
        .await
        .context("Failed to count field definitions")
}

/// Replace the whole table with `defs` in one transaction
pub async fn replace_all(pool: &SqlitePool, defs: &[FieldDefinition]) -> Result<usize> {
    let mut tx = pool.begin().await.context("Failed to start transaction")?;

    sqlx::query("DELETE FROM field_definitions")
        .execute(&mut *tx)
        .await
        .context("Failed to truncate field definitions")?;

    for def in defs {
        sqlx::query(INSERT_SQL)
            .bind(def.ordering)
            .bind(&def.field_name)
            .bind(&def.display_name)
            .bind(&def.tooltip)
            .bind(&def.example)
            .bind(&def.marketplace)
            .bind(def.input_type.as_str())
            .bind(&def.input_type_aux)
            .bind(def.required)
            .bind(&def.grouping)
            .bind(def.field_type.as_str())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to insert field definition '{}'", def.field_name))?;
    }

    tx.commit().await.context("Failed to commit field definitions")?;
    Ok(defs.len())
}

pub async fn marketplaces(pool: &SqlitePool) -> Result<Vec<String>> {
    sqlx::query_scalar("SELECT DISTINCT marketplace FROM field_definitions ORDER BY marketplace")
        .fetch_all(pool)
        .await
        .context("Failed to list marketplaces")
}

pub async fn groupings(pool: &SqlitePool, marketplace: &str) -> Result<Vec<String>> {
    sqlx::query_scalar(
        "SELECT grouping FROM field_definitions WHERE marketplace = ? COLLATE NOCASE \
         GROUP BY grouping ORDER BY MIN(ordering), grouping",
    )
    .bind(marketplace)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to list groupings for '{}'", marketplace))
}
