use anyhow::{Context, Result};
use std::path::PathBuf;
use timbre_core::Dataset;
use timbre_search::Recommender;

use crate::config::{self, Config};

/// Fit the scaler and index over the configured dataset and save them.
pub fn run_build(config: &Config, output: Option<PathBuf>) -> Result<()> {
    let output = output
        .or_else(|| config.index_path.clone())
        .unwrap_or_else(config::default_index_path);

    println!("\n🎵 Building similarity index\n");
    println!("  Dataset: {}", config.dataset_path.display());

    let dataset = Dataset::load(&config.dataset_path).with_context(|| {
        format!(
            "Failed to load dataset from {}",
            config.dataset_path.display()
        )
    })?;
    let tracks = dataset.len();

    let recommender = Recommender::build(dataset).context("Failed to build similarity index")?;
    recommender
        .to_artifact()
        .save(&output)
        .with_context(|| format!("Failed to write index to {}", output.display()))?;

    println!("  Tracks indexed: {tracks}");
    println!("  Written to: {}", output.display());

    if config.index_path.as_ref() != Some(&output) {
        println!("\n  Pass --index {} (or set index_path) to use it", output.display());
    }

    Ok(())
}
