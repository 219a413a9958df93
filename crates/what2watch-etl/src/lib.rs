//! IMDB dataset pipeline for what2watch.
//!
//! Downloads `title.basics` and `title.ratings`, streams both dumps, joins
//! them on the title id and upserts the result into the catalog in batches.
//! The download and import steps are wired as treadle `Stage`s.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod import;
pub mod merge;
pub mod pipeline;
pub mod reader;
pub mod records;
pub mod stage;
pub mod work_item;

pub use config::Config;
pub use dataset::{open_dataset, Dataset, DatasetFiles, Downloader};
pub use error::{DatasetError, DownloadError, ImportError, ImportResult};
pub use import::{import_datasets, ImportSummary, Importer};
pub use merge::{merge_join, Keyed, MergeJoin, OrderViolation};
pub use pipeline::{build_import_pipeline, ImportPipeline};
pub use reader::DatasetReader;
pub use records::{parse_title_id, TitleBasicsRecord, TitleRatingsRecord};
pub use stage::{DownloadStage, ImportStage};
pub use work_item::ImportJob;
