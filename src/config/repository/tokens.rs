//! Repository for cached access tokens

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::api::amazon::token::CachedToken;
use crate::config::models::DbToken;

/// Save or replace the token stored under `cache_key`
pub async fn save(pool: &SqlitePool, cache_key: &str, token: &CachedToken) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO tokens (cache_key, access_token, token_type, obtained_at, expires_at, updated_at)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(cache_key)
    .bind(&token.access_token)
    .bind(&token.token_type)
    .bind(token.obtained_at)
    .bind(token.expires_at)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to save token '{}'", cache_key))?;

    log::debug!("Saved token: {}", cache_key);
    Ok(())
}

pub async fn get(pool: &SqlitePool, cache_key: &str) -> Result<Option<CachedToken>> {
    let row: Option<DbToken> = sqlx::query_as(
        "SELECT cache_key, access_token, token_type, obtained_at, expires_at FROM tokens WHERE cache_key = ?",
    )
    .bind(cache_key)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to get token '{}'", cache_key))?;

    Ok(row.map(|row| CachedToken {
        access_token: row.access_token,
        token_type: row.token_type,
        obtained_at: row.obtained_at,
        expires_at: row.expires_at,
    }))
}

pub async fn delete(pool: &SqlitePool, cache_key: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM tokens WHERE cache_key = ?")
        .bind(cache_key)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete token '{}'", cache_key))?;

    if result.rows_affected() > 0 {
        log::debug!("Deleted token: {}", cache_key);
    }

    Ok(())
}

pub async fn cleanup_expired(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM tokens WHERE expires_at <= ?")
        .bind(chrono::Utc::now())
        .execute(pool)
        .await
        .context("Failed to clean up expired tokens")?;

    let deleted = result.rows_affected();
    if deleted > 0 {
        log::info!("Cleaned up {} expired tokens", deleted);
    }

    Ok(deleted)
}
