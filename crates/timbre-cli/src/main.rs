use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use timbre_search::QueryMode;

mod commands;
mod config;

use commands::QueryArgs;
use config::{Config, LoggingConfig};

#[derive(Debug, Parser)]
#[command(name = "timbre", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the track dataset (default: ~/.local/share/timbre/tracks.csv)
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Path to a persisted index built by `timbre build`
    #[arg(long, global = true)]
    index: Option<PathBuf>,

    /// Log at debug level regardless of configuration
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Recommend tracks similar to a track
    ///
    /// The name is matched case-insensitively against the track_name column.
    /// If several tracks share the name, the first one in the dataset is
    /// used as the seed.
    Track(QueryArgs),
    /// Recommend tracks similar to an artist
    ///
    /// The artist's first track in the dataset is used as the seed.
    Artist(QueryArgs),
    /// Recommend tracks similar to a genre
    ///
    /// The genre's first track in the dataset is used as the seed.
    Genre(QueryArgs),
    /// Fit the scaler and index and save them for faster startup
    ///
    /// Writes to --output, else the configured index_path, else
    /// ~/.local/share/timbre/index.json.gz. Subsequent queries load the
    /// artifact when index_path (or --index) points at it.
    Build {
        /// Where to write the artifact
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show dataset and feature statistics
    Info,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print one value, or the whole config file
    Get { key: Option<String> },
    /// Set a value in the config file
    Set { key: String, value: String },
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults
    Init,
}

fn parse_level(level: &str) -> Option<twyg::LogLevel> {
    match level.to_lowercase().as_str() {
        "trace" => Some(twyg::LogLevel::Trace),
        "debug" => Some(twyg::LogLevel::Debug),
        "info" => Some(twyg::LogLevel::Info),
        "warn" | "warning" => Some(twyg::LogLevel::Warn),
        "error" => Some(twyg::LogLevel::Error),
        _ => None,
    }
}

/// Set up logging. An unknown configured level falls back to info so that
/// `timbre config set logging.level ...` stays usable to repair it.
fn init_logging(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let configured = parse_level(&logging.level);
    let level = if verbose {
        twyg::LogLevel::Debug
    } else {
        configured.unwrap_or(twyg::LogLevel::Info)
    };

    let opts = twyg::OptsBuilder::new()
        .coloured(logging.coloured)
        .level(level)
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid logging options: {e:?}"))?;
    twyg::setup(opts).map_err(|e| anyhow::anyhow!("Could not set up logging: {e:?}"))?;

    if configured.is_none() {
        log::warn!(
            "Unknown logging level {:?}, using info (expected trace, debug, info, warn or error)",
            logging.level
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?.with_overrides(cli.dataset, cli.index);
    init_logging(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Track(args) => commands::run_recommend(&config, QueryMode::Track, &args)?,
        Commands::Artist(args) => commands::run_recommend(&config, QueryMode::Artist, &args)?,
        Commands::Genre(args) => commands::run_recommend(&config, QueryMode::Genre, &args)?,
        Commands::Build { output } => commands::run_build(&config, output)?,
        Commands::Info => commands::show_info(&config)?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(&config)?,
            ConfigAction::Get { key } => commands::config::get_config(&config, key)?,
            ConfigAction::Set { key, value } => commands::config::set_config(&key, &value)?,
            ConfigAction::Path => commands::config::show_path()?,
            ConfigAction::Example => commands::config::show_example()?,
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}
