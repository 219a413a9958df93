use serde::{Deserialize, Serialize};
use std::fmt;
use treadle::WorkItem;

/// One import run being processed through the pipeline.
///
/// This is the treadle `WorkItem` that flows through the download → import
/// stages. The stages carry the dataset paths themselves; the job only names
/// the run, and every run gets its own id so the state store never mistakes
/// a new run for one that already completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportJob {
    id: String,
}

impl ImportJob {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// A job whose id is derived from the current time, e.g.
    /// `import-20240131T120000.123`.
    #[must_use]
    pub fn start() -> Self {
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3f");
        Self::new(format!("import-{stamp}"))
    }
}

impl WorkItem for ImportJob {
    fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for ImportJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_job_creation() {
        let job = ImportJob::new("test-id");
        assert_eq!(job.id(), "test-id");
        assert_eq!(format!("{job}"), "test-id");
    }

    #[test]
    fn test_started_jobs_are_prefixed() {
        let job = ImportJob::start();
        assert!(job.id().starts_with("import-"));
    }

    #[test]
    fn test_import_job_serializes_id() {
        let job = ImportJob::new("import-1");
        let json = serde_json::to_string(&job).unwrap();
        assert_eq!(json, r#"{"id":"import-1"}"#);
    }
}
