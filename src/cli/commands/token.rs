//! `token status`: check the Amazon SP-API credentials

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use colored::*;

use crate::api::amazon::{http_client, TokenManager, TokenState};
use crate::cli::ui::with_spinner;
use crate::config::repository::tokens;
use crate::config::Config;
use crate::settings::Settings;

#[derive(Args)]
pub struct TokenCommands {
    #[command(subcommand)]
    pub command: TokenSubcommands,
}

#[derive(Subcommand)]
pub enum TokenSubcommands {
    /// Show token status, obtaining a token if none is cached
    Status {
        /// Discard the cached token and fetch a new one
        #[arg(short, long)]
        refresh: bool,
    },
}

pub async fn token_command(args: TokenCommands, settings: &Settings) -> Result<()> {
    let config = Config::load(settings).await?;
    let removed = tokens::cleanup_expired(config.pool()).await?;
    if removed > 0 {
        log::debug!("Removed {} expired tokens", removed);
    }

    let manager = TokenManager::from_settings(&settings.amazon, http_client()?, Some(config.pool().clone()));

    match args.command {
        TokenSubcommands::Status { refresh } => status(&manager, refresh).await,
    }
}

async fn status(manager: &TokenManager, refresh: bool) -> Result<()> {
    if manager.state().await == TokenState::InvalidConfig {
        // Surfaces the configuration error itself
        manager.test_connection().await?;
    }

    if refresh {
        let token = with_spinner("Refreshing access token...", manager.refresh_access_token()).await;
        if token.is_none() {
            println!("{} Token refresh failed", "✗".bright_red().bold());
            return Err(anyhow!("Failed to refresh the SP-API access token"));
        }
    } else {
        let result = with_spinner("Obtaining access token...", manager.test_connection()).await;
        if let Err(e) = result {
            println!("{} Connection test failed: {}", "✗".bright_red().bold(), e.to_string().red());
            return Err(e.into());
        }
    }

    let state = manager.state().await;
    match manager.get_token_info().await {
        Some(info) => {
            println!("{} Access token {}", "✓".bright_green().bold(), state.to_string().bright_green());
            println!("  Type:       {}", info.token_type);
            println!("  Obtained:   {}", info.obtained_at.to_rfc3339());
            println!("  Expires:    {}", info.expires_at.to_rfc3339());
            println!("  Expires in: {}s", info.expires_in_seconds);
            println!("  Usable:     {}", if info.is_valid { "yes".green() } else { "no".red() });
            Ok(())
        }
        None => Err(anyhow!("No access token available (state: {})", state)),
    }
}
