pub mod app;
pub mod commands;
pub mod ui;

pub use app::{Cli, Commands};

use anyhow::Result;

use crate::settings::Settings;

/// Dispatch a parsed command line
pub async fn run(cli: Cli, settings: Settings) -> Result<()> {
    match cli.command {
        Commands::Install(args) => commands::install::install_command(args, &settings).await,
        Commands::Fields(args) => commands::fields::fields_command(args, &settings).await,
        Commands::Form(args) => commands::form::form_command(args, &settings).await,
        Commands::Token(args) => commands::token::token_command(args, &settings).await,
        Commands::Amazon(args) => commands::amazon::amazon_command(args, &settings).await,
        Commands::Search(args) => commands::search::search_command(args, &settings).await,
        Commands::Db(args) => commands::db::db_command(args, &settings).await,
    }
}
