//! `install`: settings file, database and schema in one step

use anyhow::{Context, Result};
use clap::Args;
use colored::*;

use crate::config::{db, Config};
use crate::settings::Settings;

#[derive(Args)]
pub struct InstallArgs {
    /// Overwrite an existing settings file
    #[arg(short, long)]
    pub force: bool,
}

pub async fn install_command(args: InstallArgs, settings: &Settings) -> Result<()> {
    let path = Settings::default_path()?;
    if settings.write_to(&path, args.force)? {
        println!("{} Wrote settings to {}", "✓".bright_green().bold(), path.display().to_string().cyan());
    } else {
        println!(
            "{} Settings file {} already exists (use --force to overwrite)",
            "•".yellow(),
            path.display().to_string().cyan()
        );
    }

    let config = Config::load(settings).await.context("Failed to prepare database")?;
    let info = db::get_db_info(config.pool()).await?;

    println!(
        "{} Database ready at {} (schema version {})",
        "✓".bright_green().bold(),
        config.db_path().display().to_string().cyan(),
        info.schema_version
    );
    println!("  Field definitions: {}", info.field_definitions);
    println!("  Prop 65 chemicals: {}", info.prop65_chemicals);
    println!("  Wish brands:       {}", info.wish_brands);
    println!("  Listings:          {}", info.listings);

    if info.field_definitions == 0 {
        println!("Run {} to load the default field definitions.", "channel-lister fields seed".bold());
    }

    Ok(())
}
