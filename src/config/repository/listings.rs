//! Repository for product drafts and Amazon listings

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::config::models::DbListing;
use crate::fields::validate::ValidationReport;
use crate::listing::{AmazonListing, Lifecycle, ListingKind, ListingStatus, ProductDraft};

const SELECT_COLUMNS: &str = "SELECT id, kind, title, product_type, marketplace_id, form_data, requirements, \
     status, validation_errors, submission_id, submitted_at, created_at, updated_at FROM listings";

const UPSERT_SQL: &str = r#"
    INSERT INTO listings
        (id, kind, title, product_type, marketplace_id, form_data, requirements,
         status, validation_errors, submission_id, submitted_at, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    ON CONFLICT(id) DO UPDATE SET
        title = excluded.title,
        product_type = excluded.product_type,
        marketplace_id = excluded.marketplace_id,
        form_data = excluded.form_data,
        requirements = excluded.requirements,
        status = excluded.status,
        validation_errors = excluded.validation_errors,
        submission_id = excluded.submission_id,
        submitted_at = excluded.submitted_at,
        updated_at = excluded.updated_at
"#;

fn lifecycle_from_row(row: &DbListing) -> Result<Lifecycle> {
    let validation_errors: ValidationReport = serde_json::from_str(&row.validation_errors)
        .with_context(|| format!("Listing '{}' has invalid validation errors", row.id))?;

    Ok(Lifecycle {
        status: row.status.parse()?,
        validation_errors,
        submission_id: row.submission_id.clone(),
        submitted_at: row.submitted_at,
    })
}

fn draft_from_row(row: DbListing) -> Result<ProductDraft> {
    let lifecycle = lifecycle_from_row(&row)?;
    let form_data = serde_json::from_str(&row.form_data)
        .with_context(|| format!("Draft '{}' has invalid form data", row.id))?;

    Ok(ProductDraft {
        id: row.id,
        title: row.title,
        form_data,
        lifecycle,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn amazon_from_row(row: DbListing) -> Result<AmazonListing> {
    let lifecycle = lifecycle_from_row(&row)?;
    let form_data = serde_json::from_str(&row.form_data)
        .with_context(|| format!("Amazon listing '{}' has invalid form data", row.id))?;
    let requirements = row
        .requirements
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .with_context(|| format!("Amazon listing '{}' has invalid requirements", row.id))?;

    Ok(AmazonListing {
        id: row.id,
        product_type: row.product_type.unwrap_or_default(),
        marketplace_id: row.marketplace_id.unwrap_or_default(),
        form_data,
        requirements,
        lifecycle,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

async fn fetch(pool: &SqlitePool, kind: ListingKind, id: &str) -> Result<Option<DbListing>> {
    sqlx::query_as(&format!("{} WHERE id = ? AND kind = ?", SELECT_COLUMNS))
        .bind(id)
        .bind(kind.as_str())
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get {} listing '{}'", kind.as_str(), id))
}

pub async fn save_draft(pool: &SqlitePool, draft: &ProductDraft) -> Result<()> {
    let form_data = serde_json::to_string(&draft.form_data)?;
    let validation_errors = serde_json::to_string(&draft.lifecycle.validation_errors)?;

    sqlx::query(UPSERT_SQL)
        .bind(&draft.id)
        .bind(ListingKind::Draft.as_str())
        .bind(&draft.title)
        .bind(None::<String>)
        .bind(None::<String>)
        .bind(form_data)
        .bind(None::<String>)
        .bind(draft.lifecycle.status.as_str())
        .bind(validation_errors)
        .bind(&draft.lifecycle.submission_id)
        .bind(draft.lifecycle.submitted_at)
        .bind(draft.created_at)
        .bind(draft.updated_at)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to save draft '{}'", draft.id))?;

    log::debug!("Saved draft {}", draft.id);
    Ok(())
}

pub async fn get_draft(pool: &SqlitePool, id: &str) -> Result<Option<ProductDraft>> {
    fetch(pool, ListingKind::Draft, id).await?.map(draft_from_row).transpose()
}

pub async fn save_amazon(pool: &SqlitePool, listing: &AmazonListing) -> Result<()> {
    let form_data = serde_json::to_string(&listing.form_data)?;
    let requirements = listing
        .requirements
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let validation_errors = serde_json::to_string(&listing.lifecycle.validation_errors)?;

    sqlx::query(UPSERT_SQL)
        .bind(&listing.id)
        .bind(ListingKind::Amazon.as_str())
        .bind(None::<String>)
        .bind(&listing.product_type)
        .bind(&listing.marketplace_id)
        .bind(form_data)
        .bind(requirements)
        .bind(listing.lifecycle.status.as_str())
        .bind(validation_errors)
        .bind(&listing.lifecycle.submission_id)
        .bind(listing.lifecycle.submitted_at)
        .bind(listing.created_at)
        .bind(listing.updated_at)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to save Amazon listing '{}'", listing.id))?;

    log::debug!("Saved Amazon listing {}", listing.id);
    Ok(())
}

pub async fn get_amazon(pool: &SqlitePool, id: &str) -> Result<Option<AmazonListing>> {
    fetch(pool, ListingKind::Amazon, id).await?.map(amazon_from_row).transpose()
}

pub async fn list_amazon_by_status(pool: &SqlitePool, status: ListingStatus) -> Result<Vec<AmazonListing>> {
    let rows: Vec<DbListing> = sqlx::query_as(&format!(
        "{} WHERE kind = ? AND status = ? ORDER BY created_at",
        SELECT_COLUMNS
    ))
    .bind(ListingKind::Amazon.as_str())
    .bind(status.as_str())
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to list Amazon listings with status '{}'", status))?;

    rows.into_iter().map(amazon_from_row).collect()
}

pub async fn list_drafts(pool: &SqlitePool) -> Result<Vec<ProductDraft>> {
    let rows: Vec<DbListing> = sqlx::query_as(&format!("{} WHERE kind = ? ORDER BY created_at", SELECT_COLUMNS))
        .bind(ListingKind::Draft.as_str())
        .fetch_all(pool)
        .await
        .context("Failed to list drafts")?;

    rows.into_iter().map(draft_from_row).collect()
}

pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM listings WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete listing '{}'", id))?;

    Ok(result.rows_affected() > 0)
}
