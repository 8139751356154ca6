use anyhow::Result;
use timbre_core::FEATURE_COLUMNS;
use timbre_search::{NeighborSearch, QueryMode};

use crate::config::Config;

/// Show dataset size and the fitted per-feature statistics.
pub fn show_info(config: &Config) -> Result<()> {
    let (recommender, source) = super::open_recommender(config)?;
    let resolver = recommender.resolver();
    let scaler = recommender.scaler();

    println!("\n📊 Timbre Dataset\n");
    println!("  Dataset: {}", config.dataset_path.display());
    println!("  Tracks: {}", recommender.dataset().len());
    println!("  Distinct track names: {}", resolver.distinct(QueryMode::Track));
    println!("  Artists: {}", resolver.distinct(QueryMode::Artist));
    println!("  Genres: {}", resolver.distinct(QueryMode::Genre));
    println!("  Index: {} rows, {source}", recommender.index().len());

    println!("\n  {:<18} {:>12} {:>12}", "feature", "mean", "std");
    for (i, name) in FEATURE_COLUMNS.iter().enumerate() {
        println!(
            "  {:<18} {:>12.4} {:>12.4}",
            name,
            scaler.mean()[i],
            scaler.scale()[i]
        );
    }

    Ok(())
}
