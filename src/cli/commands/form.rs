//! `form render`: the rendered tabs as JSON

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::config::Config;
use crate::fields::layout::{build_form, build_tab};
use crate::fields::render::RenderContext;
use crate::settings::Settings;

#[derive(Args)]
pub struct FormCommands {
    #[command(subcommand)]
    pub command: FormSubcommands,
}

#[derive(Subcommand)]
pub enum FormSubcommands {
    /// Print the rendered form as JSON
    Render {
        /// Only this marketplace's tab
        #[arg(short, long)]
        marketplace: Option<String>,
    },
}

pub async fn form_command(args: FormCommands, settings: &Settings) -> Result<()> {
    let config = Config::load(settings).await?;
    let ctx = RenderContext::from_settings(settings)
        .with_reference_data(config.list_chemicals().await?, config.list_brands().await?);

    match args.command {
        FormSubcommands::Render { marketplace } => {
            let definitions = config.list_fields().await?;
            let json = match marketplace {
                Some(m) => {
                    let tab = build_tab(&m, &definitions, &ctx)?;
                    serde_json::to_string_pretty(&tab)
                }
                None => serde_json::to_string_pretty(&build_form(&definitions, &ctx)?),
            }
            .context("Failed to serialize rendered form")?;
            println!("{}", json);
        }
    }

    Ok(())
}
