use std::fmt;
use std::sync::{Arc, OnceLock};
use treadle::Workflow;

use crate::config::Config;
use crate::dataset::{DatasetFiles, Downloader};
use crate::import::ImportSummary;
use crate::{DownloadStage, ImportStage};

/// A built import workflow plus the slot its import stage reports into.
pub struct ImportPipeline {
    pub workflow: Workflow,
    pub report: Arc<OnceLock<ImportSummary>>,
}

impl fmt::Debug for ImportPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportPipeline")
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

/// Build the download + import pipeline.
///
/// With `download` set, both datasets are fetched again into the paths of
/// `files` before the import runs; otherwise the files already on disk are
/// imported as they are.
///
/// # Errors
/// Returns an error if the workflow cannot be built.
pub fn build_import_pipeline(
    config: &Config,
    files: DatasetFiles,
    download: bool,
) -> treadle::Result<ImportPipeline> {
    let import_stage = ImportStage::new(
        config.database_path.clone(),
        files.clone(),
        config.batch_size,
    );
    let report = import_stage.report();

    let workflow = if download {
        let downloader = Downloader::new(config.dataset_base_url.clone())
            .map_err(|e| {
                treadle::TreadleError::InvalidWorkflow(format!(
                    "Failed to create download stage: {e}"
                ))
            })?
            .with_overwrite(true);

        Workflow::builder()
            .stage("download", DownloadStage::new(downloader, files))
            .stage("import", import_stage)
            .dependency("import", "download")
            .build()?
    } else {
        Workflow::builder().stage("import", import_stage).build()?
    };

    Ok(ImportPipeline { workflow, report })
}
