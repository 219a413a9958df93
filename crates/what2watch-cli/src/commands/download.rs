use anyhow::{Context, Result};
use what2watch_etl::{Config, Downloader};

pub async fn run_download(config: &Config, overwrite: bool) -> Result<()> {
    let files = config.dataset_files();
    let downloader = Downloader::new(config.dataset_base_url.clone())?.with_overwrite(overwrite);

    println!("📥 Downloading IMDB datasets to {}", config.data_dir.display());
    let paths = downloader
        .download_all(&files.targets())
        .await
        .context("Dataset download failed")?;

    for path in paths {
        println!("  ✓ {}", path.display());
    }
    println!("\nRun 'what2watch import --skip-download' to import them.");
    Ok(())
}
