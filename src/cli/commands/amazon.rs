//! `amazon`: product type lookups against the SP-API

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use colored::*;
use std::sync::Arc;

use crate::api::amazon::{http_client, SpApiClient, SpApiCredentials, TokenManager};
use crate::cli::ui::with_spinner;
use crate::config::Config;
use crate::settings::Settings;

#[derive(Args)]
pub struct AmazonCommands {
    #[command(subcommand)]
    pub command: AmazonSubcommands,
}

#[derive(Subcommand)]
pub enum AmazonSubcommands {
    /// Search product types by keyword
    ProductTypes {
        keywords: String,
    },
    /// Required attributes of a product type
    Requirements {
        product_type: String,
    },
}

pub async fn amazon_command(args: AmazonCommands, settings: &Settings) -> Result<()> {
    let credentials = SpApiCredentials::from_settings(&settings.amazon)?;
    let config = Config::load(settings).await?;
    let http = http_client()?;
    let tokens = Arc::new(TokenManager::from_settings(&settings.amazon, http.clone(), Some(config.pool().clone())));
    let client = SpApiClient::from_credentials(&credentials, tokens, http);

    match args.command {
        AmazonSubcommands::ProductTypes { keywords } => {
            let types = with_spinner("Searching product types...", client.search_product_types(&keywords))
                .await
                .map_err(|e| anyhow!(e.user_message()))?;

            if types.is_empty() {
                println!("No product types match '{}'.", keywords);
            }
            for product_type in types {
                println!(
                    "{:<32} {}",
                    product_type.name.bold(),
                    product_type.display_name.as_deref().unwrap_or_default()
                );
            }
        }
        AmazonSubcommands::Requirements { product_type } => {
            let requirements = with_spinner(
                "Fetching listing requirements...",
                client.get_listing_requirements(&product_type),
            )
            .await
            .map_err(|e| anyhow!(e.user_message()))?;

            println!(
                "{} requires {} attributes in {}:",
                requirements.product_type.bold(),
                requirements.required.len(),
                requirements.marketplace_id
            );
            for attribute in &requirements.required {
                println!("  {:<32} {}", attribute, requirements.label(attribute).dimmed());
            }
        }
    }

    Ok(())
}
