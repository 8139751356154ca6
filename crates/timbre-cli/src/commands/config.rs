use anyhow::{Context, Result};
use toml_edit::{value, DocumentMut};

use crate::config::{self, Config};
use timbre_search::MAX_RECOMMENDATIONS;

const KEYS: &str = "dataset_path, index_path, default_count, logging.level, logging.coloured";

/// Show the current effective configuration.
pub fn show_config(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    let config_path = config::config_file_path();
    println!("Config file: {}", config_path.display());
    println!(
        "File exists: {}\n",
        if config_path.exists() { "yes" } else { "no (using defaults)" }
    );

    println!("Settings:");
    for key in KEYS.split(", ") {
        println!("  {key}: {}", lookup(config, key)?);
    }

    println!("\nPriority: CLI args > ENV vars (TIMBRE_*) > Config file > Defaults");

    Ok(())
}

/// Get a specific config value, or print the whole config file.
pub fn get_config(config: &Config, key: Option<String>) -> Result<()> {
    if let Some(key) = key {
        println!("{}", lookup(config, &key)?);
        return Ok(());
    }

    let config_path = config::config_file_path();
    if config_path.exists() {
        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        print!("{}", contents);
    } else {
        println!("Config file does not exist: {}", config_path.display());
        println!("\nRun 'timbre config init' to create it.");
    }

    Ok(())
}

/// Set a config value, preserving the rest of the file.
pub fn set_config(key: &str, raw: &str) -> Result<()> {
    let config_path = config::config_file_path();
    config::ensure_config_file()?;

    let contents = std::fs::read_to_string(&config_path).context("Failed to read config file")?;
    let updated = apply_setting(&contents, key, raw)?;
    std::fs::write(&config_path, updated).context("Failed to write config file")?;

    println!("✓ Updated {} = {}", key, raw);
    println!("  in {}", config_path.display());

    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    println!("{}", config::config_file_path().display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure timbre.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}

fn lookup(config: &Config, key: &str) -> Result<String> {
    Ok(match key {
        "dataset_path" => config.dataset_path.display().to_string(),
        "index_path" => config
            .index_path
            .as_ref()
            .map_or_else(|| String::from("<not set>"), |p| p.display().to_string()),
        "default_count" => config.default_count.to_string(),
        "logging.level" => config.logging.level.clone(),
        "logging.coloured" => config.logging.coloured.to_string(),
        _ => anyhow::bail!("Unknown config key: {}\n\nValid keys: {}", key, KEYS),
    })
}

/// Return `contents` with `key` set to `raw`, validating the value type.
fn apply_setting(contents: &str, key: &str, raw: &str) -> Result<String> {
    let mut doc = contents
        .parse::<DocumentMut>()
        .context("Config file is not valid TOML")?;

    match key {
        "dataset_path" | "index_path" => doc[key] = value(raw),
        "default_count" => {
            let count: i64 = raw
                .parse()
                .with_context(|| format!("default_count must be an integer, got {raw:?}"))?;
            if !(1..=MAX_RECOMMENDATIONS as i64).contains(&count) {
                anyhow::bail!("default_count must be between 1 and {MAX_RECOMMENDATIONS}");
            }
            doc[key] = value(count);
        }
        "logging.level" => {
            let level = raw.to_lowercase();
            if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
                anyhow::bail!("logging.level must be one of trace, debug, info, warn, error");
            }
            doc["logging"]["level"] = value(level);
        }
        "logging.coloured" => {
            let coloured: bool = raw
                .parse()
                .with_context(|| format!("logging.coloured must be true or false, got {raw:?}"))?;
            doc["logging"]["coloured"] = value(coloured);
        }
        _ => anyhow::bail!("Unknown config key: {}\n\nValid keys: {}", key, KEYS),
    }

    Ok(doc.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_setting_keeps_comments() {
        let updated =
            apply_setting(config::example_config(), "dataset_path", "/music/tracks.csv").unwrap();
        assert!(updated.contains("# Timbre Configuration File"));
        assert!(updated.contains("dataset_path = \"/music/tracks.csv\""));
    }

    #[test]
    fn test_apply_setting_nested_and_typed() {
        let updated = apply_setting(config::example_config(), "logging.level", "DEBUG").unwrap();
        let doc = updated.parse::<DocumentMut>().unwrap();
        assert_eq!(doc["logging"]["level"].as_str(), Some("debug"));

        let updated = apply_setting("", "default_count", "12").unwrap();
        let doc = updated.parse::<DocumentMut>().unwrap();
        assert_eq!(doc["default_count"].as_integer(), Some(12));

        let updated = apply_setting("", "logging.coloured", "false").unwrap();
        let doc = updated.parse::<DocumentMut>().unwrap();
        assert_eq!(doc["logging"]["coloured"].as_bool(), Some(false));
    }

    #[test]
    fn test_apply_setting_rejects_bad_values() {
        assert!(apply_setting("", "default_count", "0").is_err());
        assert!(apply_setting("", "default_count", "twenty").is_err());
        assert!(apply_setting("", "logging.level", "loud").is_err());
        assert!(apply_setting("", "colour", "true").is_err());
    }

    #[test]
    fn test_lookup() {
        let config = Config::default();
        assert_eq!(lookup(&config, "index_path").unwrap(), "<not set>");
        assert_eq!(lookup(&config, "default_count").unwrap(), "5");
        assert!(lookup(&config, "nope").is_err());
    }
}
