//! Repository for Prop 65 chemicals and the Wish brand directory

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::reference::{Prop65Chemical, WishBrand};

pub async fn insert_chemical(pool: &SqlitePool, chemical: &Prop65Chemical) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO prop65_chemicals (chemical_name, toxicity_type, listing_mechanism, cas_number, date_listed)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&chemical.chemical_name)
    .bind(&chemical.toxicity_type)
    .bind(&chemical.listing_mechanism)
    .bind(&chemical.cas_number)
    .bind(&chemical.date_listed)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to insert chemical '{}'", chemical.chemical_name))?;

    Ok(())
}

pub async fn list_chemicals(pool: &SqlitePool) -> Result<Vec<Prop65Chemical>> {
    sqlx::query_as(
        "SELECT chemical_name, toxicity_type, listing_mechanism, cas_number, date_listed \
         FROM prop65_chemicals ORDER BY chemical_name",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list Prop 65 chemicals")
}

/// Insert or update a brand keyed by its name
pub async fn upsert_brand(pool: &SqlitePool, brand: &WishBrand) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO wish_brands (brand_name, brand_website) VALUES (?, ?)
        ON CONFLICT(brand_name) DO UPDATE SET brand_website = excluded.brand_website
        "#,
    )
    .bind(&brand.brand_name)
    .bind(&brand.brand_website)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to save brand '{}'", brand.brand_name))?;

    Ok(())
}

pub async fn list_brands(pool: &SqlitePool) -> Result<Vec<WishBrand>> {
    sqlx::query_as("SELECT brand_name, brand_website FROM wish_brands ORDER BY brand_name")
        .fetch_all(pool)
        .await
        .context("Failed to list Wish brands")
}
