use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

use crate::dataset::{DatasetFiles, DEFAULT_BASE_URL};
use crate::import::DEFAULT_BATCH_SIZE;

/// Configuration for what2watch.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (W2W_* prefix)
/// 3. Config file (~/.config/what2watch/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite database.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: W2W_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.local/share/what2watch/what2watch.db
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,

    /// Directory the IMDB datasets are downloaded to.
    ///
    /// Can be set via:
    /// - ENV: W2W_DATA_DIR
    /// - Config: data_dir = "/path/to/datasets"
    /// - Default: ~/.cache/what2watch/datasets
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Where the datasets are fetched from.
    #[serde(default = "default_base_url")]
    pub dataset_base_url: String,

    /// Titles written per batch during an import.
    #[serde(
        default = "default_batch_size",
        deserialize_with = "deserialize_batch_size"
    )]
    pub batch_size: usize,

    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            data_dir: default_data_dir(),
            dataset_base_url: default_base_url(),
            batch_size: default_batch_size(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/what2watch/config.toml
    /// Reads environment variables with W2W_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new()
            .context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path.to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder.add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("w2w");
        builder.add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build()
            .context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration with custom database path.
    ///
    /// This is used when the --db CLI flag is provided.
    pub fn load_with_db_path(db_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.database_path = db_path;
        Ok(config)
    }

    /// Where `download` puts the two imported datasets.
    #[must_use]
    pub fn dataset_files(&self) -> DatasetFiles {
        DatasetFiles::in_dir(&self.data_dir)
    }
}

/// Environment variables only carry strings, so accept `5000` and `"5000"`.
fn deserialize_batch_size<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(usize),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Get the default database path.
///
/// Returns: ~/.local/share/what2watch/what2watch.db (or platform equivalent)
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("what2watch")
        .join("what2watch.db")
}

/// Returns: ~/.cache/what2watch/datasets (or platform equivalent)
fn default_data_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("what2watch")
        .join("datasets")
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/what2watch/config.toml
/// - macOS: ~/Library/Application Support/what2watch/config.toml
/// - Windows: %APPDATA%\what2watch\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("what2watch")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# what2watch Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (W2W_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the SQLite database
#
# Stores the title catalog and user preferences
#
# Can also be set via:
# - CLI: what2watch --db /custom/path.db import
# - Environment: W2W_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/what2watch.db"

# Directory the IMDB datasets are downloaded to
#
# Can also be set via:
# - Environment: W2W_DATA_DIR=/path/to/datasets
#
# Default: Platform-specific cache directory
#data_dir = "/path/to/datasets"

# Base URL of the IMDB dataset dumps
#dataset_base_url = "https://datasets.imdbws.com"

# Titles written per batch during an import
#
# Can also be set via:
# - CLI: what2watch import --batch-size 10000
# - Environment: W2W_BATCH_SIZE=10000
batch_size = 5000

# Log filter, overridden by RUST_LOG
log_level = "info"
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
        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config())
        .context("Failed to write config file")?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.database_path.as_os_str().is_empty());
        assert!(config.data_dir.ends_with("datasets"));
        assert_eq!(config.dataset_base_url, "https://datasets.imdbws.com");
        assert_eq!(config.batch_size, 5000);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_config_load() {
        // Should not fail even if config file doesn't exist
        let result = Config::load();
        assert!(result.is_ok());
    }

    #[test]
    fn test_config_with_custom_db_path() {
        let custom_path = PathBuf::from("/tmp/test.db");
        let config = Config::load_with_db_path(custom_path.clone());
        assert!(config.is_ok());
        assert_eq!(config.unwrap().database_path, custom_path);
    }

    #[test]
    fn test_batch_size_accepts_numbers_and_strings() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(deserialize_with = "deserialize_batch_size")]
            batch_size: usize,
        }

        let number: Holder = serde_json::from_str(r#"{"batch_size": 250}"#).unwrap();
        assert_eq!(number.batch_size, 250);
        let text: Holder = serde_json::from_str(r#"{"batch_size": " 1000 "}"#).unwrap();
        assert_eq!(text.batch_size, 1000);
        assert!(serde_json::from_str::<Holder>(r#"{"batch_size": "many"}"#).is_err());
    }

    #[test]
    fn test_dataset_files_follow_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/srv/imdb"),
            ..Config::default()
        };
        assert_eq!(
            config.dataset_files().basics,
            PathBuf::from("/srv/imdb/title.basics.tsv.gz")
        );
    }
}
