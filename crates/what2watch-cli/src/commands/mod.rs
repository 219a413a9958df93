pub mod config;
pub mod download;
pub mod import;
pub mod prefs;
pub mod status;
pub mod suggest;

pub use download::run_download;
pub use import::run_import;
pub use status::show_status;
pub use suggest::suggest;

use anyhow::{Context, Result};
use what2watch_core::schema::Database;
use what2watch_etl::Config;

/// Open the configured database, creating its directory if needed.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    Database::open(&config.database_path).with_context(|| {
        format!("Failed to open database {}", config.database_path.display())
    })
}
