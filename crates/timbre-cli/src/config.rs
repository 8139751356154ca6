use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use timbre_search::DEFAULT_RECOMMENDATIONS;

/// Configuration for timbre.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (TIMBRE_* prefix)
/// 3. Config file (~/.config/timbre/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path to the track dataset (CSV).
    ///
    /// Can be set via:
    /// - CLI: --dataset /path/to/tracks.csv
    /// - ENV: TIMBRE_DATASET_PATH
    /// - Config: dataset_path = "/path/to/tracks.csv"
    /// - Default: ~/.local/share/timbre/tracks.csv
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Path to a persisted scaler/index artifact.
    ///
    /// When set and present on disk, the index is loaded instead of rebuilt.
    /// `timbre build` writes here unless given `--output`.
    #[serde(default)]
    pub index_path: Option<PathBuf>,

    /// Number of recommendations when `-n` is not given.
    #[serde(default = "default_count")]
    pub default_count: usize,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of: trace, debug, info, warn, error.
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default = "default_coloured")]
    pub coloured: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            coloured: default_coloured(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
            index_path: None,
            default_count: default_count(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/timbre/config.toml
    /// Reads environment variables with TIMBRE_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("timbre");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Apply CLI overrides on top of the loaded configuration.
    #[must_use]
    pub fn with_overrides(mut self, dataset: Option<PathBuf>, index: Option<PathBuf>) -> Self {
        if let Some(dataset) = dataset {
            self.dataset_path = dataset;
        }
        if index.is_some() {
            self.index_path = index;
        }
        self
    }
}

fn default_dataset_path() -> PathBuf {
    data_dir().join("tracks.csv")
}

/// Where `timbre build` writes when neither `--output` nor `index_path`
/// is given.
pub fn default_index_path() -> PathBuf {
    data_dir().join("index.json.gz")
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("timbre")
}

const fn default_count() -> usize {
    DEFAULT_RECOMMENDATIONS
}

fn default_level() -> String {
    String::from("info")
}

const fn default_coloured() -> bool {
    true
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/timbre/config.toml
/// - macOS: ~/Library/Application Support/timbre/config.toml
/// - Windows: %APPDATA%\timbre\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("timbre")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Timbre Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (TIMBRE_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Track dataset (CSV)
#
# Required columns: track_name, artist, genre, danceability, energy,
# loudness, speechiness, acousticness, instrumentalness, liveness,
# valence, tempo. Other columns are ignored.
#
# Can also be set via:
# - CLI: timbre --dataset /path/to/tracks.csv track "Track_1"
# - Environment: TIMBRE_DATASET_PATH=/path/to/tracks.csv
#
# Default: Platform-specific data directory
#dataset_path = "/path/to/tracks.csv"

# Persisted scaler + index, written by `timbre build`
#
# When this file exists it is loaded at startup instead of refitting.
# It must have been built from the same dataset.
#index_path = "/path/to/index.json.gz"

# Number of recommendations when -n is not given (1-20)
default_count = 5

[logging]
# trace, debug, info, warn or error
level = "info"
coloured = true
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
