//! `search`: query marketplace categories

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use std::sync::Arc;

use crate::cli::ui::with_spinner;
use crate::search::{CategorySearch, HttpCategorySource, SearchMarketplace};
use crate::settings::Settings;

#[derive(Args)]
pub struct SearchCommands {
    #[command(subcommand)]
    pub command: SearchSubcommands,
}

#[derive(Subcommand)]
pub enum SearchSubcommands {
    /// Find categories matching a query
    Categories {
        /// amazon, newegg, sears or walmart
        marketplace: SearchMarketplace,
        query: String,
    },
}

pub async fn search_command(args: SearchCommands, settings: &Settings) -> Result<()> {
    let source = HttpCategorySource::from_settings(&settings.search)?;
    let search = CategorySearch::new(Arc::new(source));

    match args.command {
        SearchSubcommands::Categories { marketplace, query } => {
            let hits = with_spinner("Searching categories...", search.search(marketplace, &query)).await?;
            if hits.is_empty() {
                println!("No {} categories match '{}'.", marketplace, query);
            }
            for hit in hits {
                println!("{:>12}  {}", hit.id.dimmed(), hit.display_path);
            }
        }
    }

    Ok(())
}
