//! Resolve class features and caps through the definition cache.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use sheet_content::ClassCatalogLoader;
use sheet_core::{Character, UsageRecord, UsageState};
use sheet_runtime::{CatalogFeatureLoader, FeatureDefinitionCache, seed_character_features};
use tracing::info;

use super::{OutputFormat, display_name, load_characters};
use crate::config::CliConfig;

/// Resolve features and current caps
#[derive(Parser)]
pub struct Features {
    /// Character JSON file (one document or an array)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Class catalog (overrides SHEET_CATALOG)
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Sheet configuration (overrides SHEET_CONFIG)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,
}

impl Features {
    pub async fn execute(self, cli_config: &CliConfig) -> Result<()> {
        let config = cli_config.load_sheet_config(self.config.as_deref())?;
        let catalog_path = cli_config.catalog_path(self.catalog.as_deref());
        let catalog = ClassCatalogLoader::load(&catalog_path)
            .with_context(|| format!("Failed to load catalog {}", catalog_path.display()))?;
        let characters = load_characters(&self.input)?;

        let cache = FeatureDefinitionCache::start(
            Arc::new(CatalogFeatureLoader::new(catalog)),
            config.cache,
        );

        let snapshots: Vec<_> = characters.iter().map(|c| c.snapshot.clone()).collect();
        if let Some(stats) = cache.preload_for_characters(&snapshots).await {
            info!(loaded = stats.loaded, failed = stats.failed, "cache warmed");
        }

        let mut resolved = Vec::with_capacity(characters.len());
        for character in &characters {
            resolved.push(seed_character_features(&cache, character).await?);
        }
        cache.dispose();

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resolved)?),
            OutputFormat::Summary => resolved.iter().for_each(print_character),
        }
        Ok(())
    }
}

fn print_character(character: &Character) {
    println!(
        "{} {} (level {}, proficiency +{})",
        style("▶").cyan(),
        style(display_name(character)).bold(),
        character.snapshot.total_level(),
        character.snapshot.proficiency_bonus()
    );
    if character.feature_usage.is_empty() {
        println!("  {}", style("no tracked features").dim());
    }
    for (id, record) in &character.feature_usage {
        println!(
            "  {:<24} {:<20} {}",
            id,
            style(record.feature_type()).dim(),
            describe(record)
        );
    }
}

fn describe(record: &UsageRecord) -> String {
    match &record.state {
        UsageState::Slots {
            current_uses,
            max_uses,
            ..
        } => format!("{}/{} used", current_uses, max_uses),
        UsageState::PointsPool {
            current_points,
            max_points,
        } => format!("{}/{} spent", current_points, max_points),
        UsageState::OptionsList {
            selected_options,
            max_selections,
        } => format!("{}/{} selected", selected_options.len(), max_selections),
        UsageState::SpecialUx { custom_state } => format!("{} state key(s)", custom_state.len()),
        UsageState::AvailabilityToggle { is_available } => {
            if *is_available { "available" } else { "spent" }.to_string()
        }
    }
}
