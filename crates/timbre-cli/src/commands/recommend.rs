use anyhow::Result;
use timbre_search::{QueryMode, RecommendOutcome};

use crate::config::Config;

/// Arguments shared by the `track`, `artist` and `genre` commands.
#[derive(Debug, Clone, clap::Args)]
pub struct QueryArgs {
    /// Name to look up (case-insensitive)
    pub name: String,

    /// Number of recommendations (1-20, default from config)
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run_recommend(config: &Config, mode: QueryMode, args: &QueryArgs) -> Result<()> {
    let (recommender, source) = super::open_recommender(config)?;
    log::debug!("Index {source}");

    let count = args.count.unwrap_or(config.default_count);
    let outcome = recommender.recommend(mode, &args.name, count)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render(mode, &args.name, &outcome));
    }

    Ok(())
}

/// Human-readable rendering of a recommendation outcome.
pub fn render(mode: QueryMode, key: &str, outcome: &RecommendOutcome<'_>) -> String {
    let mut lines = Vec::new();

    match outcome {
        RecommendOutcome::NotFound { .. } => lines.push(match mode {
            QueryMode::Track => String::from("🚫 Track not found in the dataset."),
            QueryMode::Artist => format!("🚫 Artist '{key}' not found in the dataset."),
            QueryMode::Genre => format!("🚫 Genre '{key}' not found in the dataset."),
        }),
        RecommendOutcome::Found {
            seed_track,
            recommendations,
            ..
        } => {
            lines.push(match mode {
                QueryMode::Track => format!("Recommended Tracks for '{key}':"),
                QueryMode::Artist => format!("Recommended Tracks for Artist '{key}':"),
                QueryMode::Genre => format!("Recommended Tracks for Genre '{key}':"),
            });
            lines.push(format!(
                "  (based on {} by {}, {})",
                seed_track.track_name, seed_track.artist, seed_track.genre
            ));

            if recommendations.is_empty() {
                lines.push(String::from("  No other tracks to recommend."));
            }
            lines.extend(recommendations.iter().map(|rec| {
                format!(
                    "{}. 🎵 {} by {} ({})  distance {:.4}",
                    rec.rank, rec.track.track_name, rec.track.artist, rec.track.genre, rec.distance
                )
            }));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
