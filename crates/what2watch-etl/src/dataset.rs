//! The published IMDB dataset files and how to fetch and open them.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;

use crate::error::{DatasetError, DownloadError};

/// Where IMDB publishes its dumps.
pub const DEFAULT_BASE_URL: &str = "https://datasets.imdbws.com";

/// One of the files published at [`DEFAULT_BASE_URL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    NameBasics,
    TitleAkas,
    TitleBasics,
    TitleCrew,
    TitleEpisode,
    TitlePrincipals,
    TitleRatings,
}

impl Dataset {
    pub const ALL: [Self; 7] = [
        Self::NameBasics,
        Self::TitleAkas,
        Self::TitleBasics,
        Self::TitleCrew,
        Self::TitleEpisode,
        Self::TitlePrincipals,
        Self::TitleRatings,
    ];

    /// The two datasets an import needs.
    pub const IMPORTED: [Self; 2] = [Self::TitleBasics, Self::TitleRatings];

    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::NameBasics => "name.basics.tsv.gz",
            Self::TitleAkas => "title.akas.tsv.gz",
            Self::TitleBasics => "title.basics.tsv.gz",
            Self::TitleCrew => "title.crew.tsv.gz",
            Self::TitleEpisode => "title.episode.tsv.gz",
            Self::TitlePrincipals => "title.principals.tsv.gz",
            Self::TitleRatings => "title.ratings.tsv.gz",
        }
    }

    #[must_use]
    pub fn url(self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.file_name())
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Local paths of the two imported datasets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetFiles {
    pub basics: PathBuf,
    pub ratings: PathBuf,
}

impl DatasetFiles {
    /// The default file names inside a download directory.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            basics: dir.join(Dataset::TitleBasics.file_name()),
            ratings: dir.join(Dataset::TitleRatings.file_name()),
        }
    }

    /// `(dataset, destination)` pairs for [`Downloader::download_all`].
    #[must_use]
    pub fn targets(&self) -> Vec<(Dataset, PathBuf)> {
        vec![
            (Dataset::TitleBasics, self.basics.clone()),
            (Dataset::TitleRatings, self.ratings.clone()),
        ]
    }
}

/// Open a dataset file for reading, decompressing `.gz` files on the fly.
pub fn open_dataset(path: &Path) -> Result<Box<dyn Read + Send>, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(MultiGzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".part");
    PathBuf::from(name)
}

/// Streams dataset files to disk.
#[derive(Debug, Clone)]
pub struct Downloader {
    http: Client,
    base_url: String,
    overwrite: bool,
}

impl Downloader {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DownloadError> {
        let http = Client::builder()
            .user_agent(concat!("what2watch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DownloadError::Client)?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            overwrite: false,
        })
    }

    /// Replace files that already exist instead of failing.
    #[must_use]
    pub const fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Download one dataset to `dest`, chunk by chunk.
    ///
    /// The body is written to a `.part` file next to `dest` and renamed once
    /// complete, so a failed transfer never leaves a truncated dataset.
    pub async fn download(&self, dataset: Dataset, dest: &Path) -> Result<PathBuf, DownloadError> {
        if !self.overwrite && tokio::fs::try_exists(dest).await.unwrap_or(false) {
            return Err(DownloadError::AlreadyExists {
                path: dest.to_path_buf(),
            });
        }

        let url = dataset.url(&self.base_url);
        let partial = partial_path(dest);
        log::info!("Downloading {} to {}", url, dest.display());

        match self.fetch(&url, &partial).await {
            Ok(bytes) => {
                tokio::fs::rename(&partial, dest)
                    .await
                    .map_err(|source| DownloadError::Write {
                        path: dest.to_path_buf(),
                        source,
                    })?;
                log::info!("Downloaded {} ({} bytes)", dataset, bytes);
                Ok(dest.to_path_buf())
            }
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&partial).await {
                    log::debug!(
                        "Nothing to clean up at {}: {}",
                        partial.display(),
                        remove_err
                    );
                }
                Err(e)
            }
        }
    }

    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        let request_error = |source: reqwest::Error| DownloadError::Request {
            url: url.to_string(),
            source,
        };
        let write_error = |source: std::io::Error| DownloadError::Write {
            path: dest.to_path_buf(),
            source,
        };

        let mut response = self.http.get(url).send().await.map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status,
            });
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(write_error)?;
        }
        let mut file = tokio::fs::File::create(dest).await.map_err(write_error)?;

        let mut bytes = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(request_error)? {
            file.write_all(&chunk).await.map_err(write_error)?;
            bytes += chunk.len() as u64;
        }
        file.flush().await.map_err(write_error)?;

        Ok(bytes)
    }

    /// Download several datasets concurrently.
    ///
    /// Every transfer runs to completion; if any fails, all failures are
    /// returned together as [`DownloadError::Multiple`].
    pub async fn download_all(
        &self,
        targets: &[(Dataset, PathBuf)],
    ) -> Result<Vec<PathBuf>, DownloadError> {
        let mut tasks = JoinSet::new();
        for (index, (dataset, dest)) in targets.iter().cloned().enumerate() {
            let downloader = self.clone();
            tasks.spawn(async move { (index, downloader.download(dataset, &dest).await) });
        }

        let mut paths = vec![None; targets.len()];
        let mut errors = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(path))) => paths[index] = Some(path),
                Ok((_, Err(e))) => {
                    log::warn!("{e}");
                    errors.push(e);
                }
                Err(e) => errors.push(DownloadError::Task(e.to_string())),
            }
        }

        if !errors.is_empty() {
            return Err(DownloadError::Multiple(errors));
        }
        Ok(paths.into_iter().flatten().collect())
    }
}
