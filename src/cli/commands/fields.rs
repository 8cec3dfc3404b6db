//! `fields`: seed, inspect and edit field definitions

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::*;

use crate::config::repository::fields;
use crate::config::Config;
use crate::fields::definition::FieldDefinition;
use crate::fields::render::{render_input, RenderContext};
use crate::fields::seed::{seed_fields, SeedOutcome};
use crate::settings::Settings;

#[derive(Args)]
pub struct FieldsCommands {
    #[command(subcommand)]
    pub command: FieldsSubcommands,
}

#[derive(Subcommand)]
pub enum FieldsSubcommands {
    /// Load the default field definitions
    Seed {
        /// Replace existing definitions
        #[arg(short, long)]
        force: bool,
    },
    /// List field definitions
    List {
        /// Only this marketplace
        #[arg(short, long)]
        marketplace: Option<String>,
    },
    /// List marketplaces and their groupings
    Marketplaces,
    /// Edit a field definition in place
    Update {
        field_name: String,
        #[command(flatten)]
        changes: FieldChanges,
    },
    /// Remove a field definition
    Remove {
        field_name: String,
    },
}

/// Edits to one definition; unset options keep the stored value
#[derive(Args, Debug, Default)]
pub struct FieldChanges {
    #[arg(long)]
    pub display_name: Option<String>,
    #[arg(long)]
    pub tooltip: Option<String>,
    #[arg(long)]
    pub example: Option<String>,
    /// Encoded aux options, pattern or widget config
    #[arg(long)]
    pub aux: Option<String>,
    #[arg(long)]
    pub grouping: Option<String>,
    #[arg(long)]
    pub ordering: Option<i64>,
    #[arg(long)]
    pub required: Option<bool>,
}

impl FieldChanges {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.tooltip.is_none()
            && self.example.is_none()
            && self.aux.is_none()
            && self.grouping.is_none()
            && self.ordering.is_none()
            && self.required.is_none()
    }

    /// Empty text clears an optional column
    pub fn apply(&self, def: &mut FieldDefinition) {
        fn optional(value: &str) -> Option<String> {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        }

        if let Some(v) = &self.display_name {
            def.display_name = optional(v);
        }
        if let Some(v) = &self.tooltip {
            def.tooltip = optional(v);
        }
        if let Some(v) = &self.example {
            def.example = optional(v);
        }
        if let Some(v) = &self.aux {
            def.input_type_aux = optional(v);
        }
        if let Some(v) = &self.grouping {
            def.grouping = v.trim().to_string();
        }
        if let Some(v) = self.ordering {
            def.ordering = v;
        }
        if let Some(v) = self.required {
            def.required = v;
        }
    }
}

/// Apply `changes` to the stored definition, refusing edits that no longer render
pub async fn update_field(
    config: &Config,
    field_name: &str,
    changes: &FieldChanges,
    ctx: &RenderContext,
) -> Result<FieldDefinition> {
    let mut def = config
        .get_field(field_name)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Field definition '{}' not found", field_name))?;
    let id = def
        .id
        .with_context(|| format!("Field definition '{}' has no id", field_name))?;

    changes.apply(&mut def);
    render_input(&def, ctx).with_context(|| format!("Edited field '{}' would not render", field_name))?;

    fields::update(config.pool(), &def).await?;
    fields::get(config.pool(), id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Field definition {} disappeared during update", id))
}

pub async fn fields_command(args: FieldsCommands, settings: &Settings) -> Result<()> {
    let config = Config::load(settings).await?;

    match args.command {
        FieldsSubcommands::Seed { force } => match seed_fields(config.pool(), force).await? {
            SeedOutcome::Skipped { existing } => println!(
                "{} {} field definitions already present; use --force to replace them",
                "•".yellow(),
                existing
            ),
            SeedOutcome::Seeded { inserted } => {
                println!("{} Seeded {} field definitions", "✓".bright_green().bold(), inserted)
            }
            SeedOutcome::Replaced { removed, inserted } => println!(
                "{} Replaced {} field definitions with {} defaults",
                "✓".bright_green().bold(),
                removed,
                inserted
            ),
        },
        FieldsSubcommands::List { marketplace } => {
            let definitions = match &marketplace {
                Some(m) => config.list_fields_for(m).await?,
                None => config.list_fields().await?,
            };

            if definitions.is_empty() {
                println!("No field definitions found.");
                return Ok(());
            }

            let mut current: Option<(&str, &str)> = None;
            for def in &definitions {
                let heading = (def.marketplace.as_str(), def.grouping.as_str());
                if current != Some(heading) {
                    println!("{} / {}", def.marketplace.bright_blue().bold(), def.grouping.bold());
                    current = Some(heading);
                }
                let required = if def.required { "*".red().to_string() } else { " ".to_string() };
                println!(
                    "  {}{:<4} {:<32} {:<16} {}",
                    required,
                    def.ordering,
                    def.field_name,
                    def.input_type.as_str().dimmed(),
                    def.label()
                );
            }
            println!("{} definitions", definitions.len());
        }
        FieldsSubcommands::Marketplaces => {
            for marketplace in fields::marketplaces(config.pool()).await? {
                let groupings = fields::groupings(config.pool(), &marketplace).await?;
                println!("{}: {}", marketplace.bright_blue().bold(), groupings.join(", "));
            }
        }
        FieldsSubcommands::Update { field_name, changes } => {
            if changes.is_empty() {
                println!("{} Nothing to change for '{}'", "•".yellow(), field_name);
                return Ok(());
            }
            let ctx = RenderContext::from_settings(settings)
                .with_reference_data(config.list_chemicals().await?, config.list_brands().await?);
            let def = update_field(&config, &field_name, &changes, &ctx).await?;
            println!(
                "{} Updated '{}' ({} / {}, ordering {})",
                "✓".bright_green().bold(),
                def.field_name,
                def.marketplace,
                def.grouping,
                def.ordering
            );
        }
        FieldsSubcommands::Remove { field_name } => {
            let def = config
                .get_field(&field_name)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Field definition '{}' not found", field_name))?;
            if let Some(id) = def.id {
                fields::delete(config.pool(), id).await?;
            }
            println!("{} Removed field definition '{}'", "✓".bright_green().bold(), field_name);
        }
    }

    Ok(())
}
