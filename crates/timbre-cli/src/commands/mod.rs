pub mod build;
pub mod config;
pub mod info;
pub mod recommend;

pub use build::run_build;
pub use info::show_info;
pub use recommend::{run_recommend, QueryArgs};

use anyhow::{Context, Result};
use timbre_core::Dataset;
use timbre_search::{IndexArtifact, Recommender};

use crate::config::Config;

/// Load the dataset and either the persisted index or a freshly fitted one.
///
/// Returns the recommender and a short description of where the index
/// came from.
pub fn open_recommender(config: &Config) -> Result<(Recommender, String)> {
    let dataset = Dataset::load(&config.dataset_path).with_context(|| {
        format!(
            "Failed to load dataset from {}",
            config.dataset_path.display()
        )
    })?;

    match &config.index_path {
        Some(path) if path.exists() => {
            let artifact = IndexArtifact::load(path)
                .with_context(|| format!("Failed to load index from {}", path.display()))?;
            let recommender = Recommender::from_artifact(dataset, artifact).with_context(|| {
                format!(
                    "Index {} does not match dataset {}; run `timbre build` again",
                    path.display(),
                    config.dataset_path.display()
                )
            })?;
            Ok((recommender, format!("loaded from {}", path.display())))
        }
        other => {
            if let Some(path) = other {
                log::warn!(
                    "Index {} not found, fitting from the dataset instead",
                    path.display()
                );
            }
            let recommender =
                Recommender::build(dataset).context("Failed to build similarity index")?;
            Ok((recommender, String::from("fitted at startup")))
        }
    }
}
