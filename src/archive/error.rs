use crate::catalog::error::CatalogError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Download of {url} failed while writing '{path}'")]
    DownloadIo {
        url: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to persist downloaded file to '{0}'")]
    ArchivePersist(PathBuf, #[source] std::io::Error),

    #[error("Failed to open archive '{0}'")]
    ArchiveOpen(PathBuf, #[source] zip::result::ZipError),

    #[error("Archive '{archive}' has no member named '{member}'")]
    MissingMember { archive: PathBuf, member: String },

    #[error("Failed to extract '{member}' from archive '{archive}'")]
    ExtractIo {
        archive: PathBuf,
        member: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create dataset directory '{0}'")]
    DatasetDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to move finished dataset into '{0}'")]
    DatasetPublish(PathBuf, #[source] std::io::Error),

    #[error("Failed to read trip data from '{0}'")]
    CsvRead(PathBuf, #[source] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
