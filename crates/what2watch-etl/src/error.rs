//! Error types for the dataset pipeline.

use std::path::PathBuf;

use thiserror::Error;

use crate::merge::OrderViolation;

/// Errors that make a dataset unusable. Rows that merely lack required
/// values are skipped by the reader and never show up here.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The dataset file could not be opened.
    #[error("failed to open dataset {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Reading or decompressing the stream failed.
    #[error("I/O error while reading dataset: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a header line was read.
    #[error("dataset has no header line")]
    MissingHeader,

    /// The header lacks a column the record type needs.
    #[error("dataset header is missing column `{0}`")]
    MissingColumn(&'static str),

    /// A data line does not split into as many fields as the header, or
    /// is blank.
    #[error("dataset is broken at line {line}: expected {expected} fields, found {found}")]
    BrokenRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// The stream could not be decoded as tab-separated text.
    #[error("dataset is malformed at line {line}: {source}")]
    Malformed { line: u64, source: csv::Error },

    /// A present value could not be converted to its column's type.
    #[error("invalid value {value:?} in column `{column}` at line {line}")]
    InvalidValue {
        line: u64,
        column: &'static str,
        value: String,
    },

    /// One of the joined streams is not strictly ascending.
    #[error(transparent)]
    Order(#[from] OrderViolation),
}

/// Errors raised while fetching dataset files.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to download {url}: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },

    #[error("failed to download {url}: HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} already exists (pass overwrite to replace it)", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("download task failed: {0}")]
    Task(String),

    /// Every failure of a concurrent download round.
    #[error("{} dataset download(s) failed: {}", .0.len(), summarize(.0))]
    Multiple(Vec<DownloadError>),
}

fn summarize(errors: &[DownloadError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that abort an import run.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("database error: {0}")]
    Database(#[from] what2watch_core::Error),

    #[error("batch size must be at least 1, got {0}")]
    InvalidBatchSize(usize),
}

/// Convenience alias for import results.
pub type ImportResult<T> = std::result::Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_lists_every_failure() {
        let err = DownloadError::Multiple(vec![
            DownloadError::AlreadyExists {
                path: PathBuf::from("/tmp/title.basics.tsv.gz"),
            },
            DownloadError::Task("cancelled".to_string()),
        ]);
        let message = err.to_string();
        assert!(message.starts_with("2 dataset download(s) failed"));
        assert!(message.contains("title.basics.tsv.gz"));
        assert!(message.contains("cancelled"));
    }

    #[test]
    fn test_broken_row_message() {
        let err = DatasetError::BrokenRow {
            line: 3,
            expected: 9,
            found: 2,
        };
        assert_eq!(
            err.to_string(),
            "dataset is broken at line 3: expected 9 fields, found 2"
        );
    }
}
