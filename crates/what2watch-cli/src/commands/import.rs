use anyhow::{Context, Result};
use what2watch_etl::{build_import_pipeline, Config, DatasetFiles, ImportJob};

/// Run the download + import pipeline.
///
/// Explicit dataset files are imported as they are; otherwise the datasets
/// in the data directory are used, downloaded first unless `skip_download`.
pub async fn run_import(
    config: &Config,
    files: Option<DatasetFiles>,
    skip_download: bool,
) -> Result<()> {
    let download = files.is_none() && !skip_download;
    let files = files.unwrap_or_else(|| config.dataset_files());

    // The import stage opens the database itself; make sure it can.
    drop(super::open_database(config)?);

    let pipeline = build_import_pipeline(config, files, download)
        .context("Failed to build pipeline")?;

    let parent = config
        .database_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
    let state_path = parent.join("pipeline.db");
    let mut store = treadle::SqliteStateStore::open(&state_path)
        .await
        .context("Failed to open pipeline state store")?;

    let job = ImportJob::start();
    log::info!("Starting {job}");

    let mut events = pipeline.workflow.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                treadle::WorkflowEvent::StageStarted { stage, .. } => {
                    println!("  ⏳ [{stage}] Starting...");
                }
                treadle::WorkflowEvent::StageCompleted { stage, .. } => {
                    println!("  ✓ [{stage}] Complete");
                }
                treadle::WorkflowEvent::StageFailed { stage, error, .. } => {
                    eprintln!("  ✗ [{stage}] FAILED: {error}");
                }
                _ => {}
            }
        }
    });

    pipeline
        .workflow
        .advance(&job, &mut store)
        .await
        .context("Pipeline execution failed")?;

    let Some(summary) = pipeline.report.get() else {
        anyhow::bail!("Import did not complete; see the log for the failing stage");
    };

    println!("\n✓ Import complete");
    println!("  Created:        {}", summary.created);
    println!("  Updated:        {}", summary.updated);
    println!("  Skipped:        {}", summary.skipped);
    println!("  New genres:     {}", summary.genres_created);
    println!("  Batches:        {}", summary.batches);
    Ok(())
}
