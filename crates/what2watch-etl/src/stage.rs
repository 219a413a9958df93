//! The download and import stages of the treadle pipeline.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use treadle::{Stage, StageContext, StageOutcome};
use what2watch_core::schema::Database;

use crate::dataset::{DatasetFiles, Downloader};
use crate::error::ImportResult;
use crate::import::{import_datasets, ImportSummary};

/// The Download stage: fetch `title.basics` and `title.ratings` concurrently.
#[derive(Debug)]
pub struct DownloadStage {
    downloader: Downloader,
    files: DatasetFiles,
}

impl DownloadStage {
    #[must_use]
    pub const fn new(downloader: Downloader, files: DatasetFiles) -> Self {
        Self { downloader, files }
    }
}

#[async_trait::async_trait]
impl Stage for DownloadStage {
    fn name(&self) -> &str {
        "download"
    }

    async fn execute(
        &self,
        _item: &dyn treadle::WorkItem,
        _context: &mut StageContext,
    ) -> treadle::Result<StageOutcome> {
        log::info!("Starting download from {}", self.downloader.base_url());

        match self.downloader.download_all(&self.files.targets()).await {
            Ok(paths) => {
                log::info!("Download complete: {} datasets", paths.len());
                Ok(StageOutcome::Complete)
            }
            Err(e) => Err(treadle::TreadleError::StageExecution(format!(
                "Download failed: {e}"
            ))),
        }
    }
}

/// The Import stage: merge both datasets into the title catalog.
///
/// The import is blocking SQLite work and runs on tokio's blocking pool.
/// The summary of a successful run is published through [`report`](Self::report).
#[derive(Debug, Clone)]
pub struct ImportStage {
    db_path: PathBuf,
    files: DatasetFiles,
    batch_size: usize,
    report: Arc<OnceLock<ImportSummary>>,
}

impl ImportStage {
    #[must_use]
    pub fn new(db_path: PathBuf, files: DatasetFiles, batch_size: usize) -> Self {
        Self {
            db_path,
            files,
            batch_size,
            report: Arc::new(OnceLock::new()),
        }
    }

    /// Filled once the stage has completed.
    #[must_use]
    pub fn report(&self) -> Arc<OnceLock<ImportSummary>> {
        Arc::clone(&self.report)
    }

    /// Run the import on the current thread.
    pub fn import(&self) -> ImportResult<ImportSummary> {
        let db = Database::open(&self.db_path)?;
        import_datasets(&db, &self.files.basics, &self.files.ratings, self.batch_size)
    }
}

#[async_trait::async_trait]
impl Stage for ImportStage {
    fn name(&self) -> &str {
        "import"
    }

    async fn execute(
        &self,
        _item: &dyn treadle::WorkItem,
        _context: &mut StageContext,
    ) -> treadle::Result<StageOutcome> {
        log::info!("Starting import into {}", self.db_path.display());

        let stage = self.clone();
        let result = tokio::task::spawn_blocking(move || stage.import())
            .await
            .map_err(|e| {
                treadle::TreadleError::StageExecution(format!("Import task failed: {e}"))
            })?;

        match result {
            Ok(summary) => {
                log::info!("Import complete: {} titles", summary.imported());
                if self.report.set(summary).is_err() {
                    log::debug!("Import report was already set");
                }
                Ok(StageOutcome::Complete)
            }
            Err(e) => Err(treadle::TreadleError::StageExecution(format!(
                "Import failed: {e}"
            ))),
        }
    }
}
