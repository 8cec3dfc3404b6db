//! Row types for the listing database

use anyhow::{Context, Result};
use sqlx::FromRow;

use crate::fields::definition::FieldDefinition;

/// Database representation of a field definition
#[derive(Debug, Clone, FromRow)]
pub struct DbFieldDefinition {
    pub id: i64,
    pub ordering: i64,
    pub field_name: String,
    pub display_name: Option<String>,
    pub tooltip: Option<String>,
    pub example: Option<String>,
    pub marketplace: String,
    pub input_type: String,
    pub input_type_aux: Option<String>,
    pub required: bool,
    pub grouping: String,
    pub r#type: String,
}

impl TryFrom<DbFieldDefinition> for FieldDefinition {
    type Error = anyhow::Error;

    fn try_from(row: DbFieldDefinition) -> Result<Self> {
        let input_type = row
            .input_type
            .parse()
            .with_context(|| format!("Field '{}' has an invalid input type", row.field_name))?;
        let field_type = row
            .r#type
            .parse()
            .with_context(|| format!("Field '{}' has an invalid type", row.field_name))?;

        Ok(FieldDefinition {
            id: Some(row.id),
            ordering: row.ordering,
            field_name: row.field_name,
            display_name: row.display_name,
            tooltip: row.tooltip,
            example: row.example,
            marketplace: row.marketplace,
            input_type,
            input_type_aux: row.input_type_aux,
            required: row.required,
            grouping: row.grouping,
            field_type,
        })
    }
}

/// Database representation of a cached access token
#[derive(Debug, Clone, FromRow)]
pub struct DbToken {
    pub cache_key: String,
    pub access_token: String,
    pub token_type: String,
    pub obtained_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

/// Database representation of a draft or Amazon listing
#[derive(Debug, Clone, FromRow)]
pub struct DbListing {
    pub id: String,
    pub kind: String,
    pub title: Option<String>,
    pub product_type: Option<String>,
    pub marketplace_id: Option<String>,
    pub form_data: String, // JSON
    pub requirements: Option<String>, // JSON
    pub status: String,
    pub validation_errors: String, // JSON
    pub submission_id: Option<String>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
