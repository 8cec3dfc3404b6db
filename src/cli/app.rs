use super::commands::{AmazonCommands, DbCommands, FieldsCommands, FormCommands, InstallArgs, SearchCommands, TokenCommands};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "channel-lister")]
#[command(about = "Render, validate and submit multi-marketplace product listings")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database, run migrations and write the default settings file
    Install(InstallArgs),
    /// Field definition management
    Fields(FieldsCommands),
    /// Render listing forms
    Form(FormCommands),
    /// Amazon SP-API access token
    Token(TokenCommands),
    /// Amazon product types and listing requirements
    Amazon(AmazonCommands),
    /// Marketplace category search
    Search(SearchCommands),
    /// Database schema management
    Db(DbCommands),
}
