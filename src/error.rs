use crate::archive::error::ArchiveError;
use crate::catalog::error::CatalogError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TripDataError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to create data directory '{0}'")]
    DataDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Data directory path exists but is not a directory: '{0}'")]
    DataDirNotADirectory(PathBuf),

    #[error("Failed to determine the platform data directory")]
    DataDirResolution,

    #[error("Failed to concatenate monthly trip data")]
    Concat(#[source] PolarsError),

    #[error("Failed to write report '{0}'")]
    ReportWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to encode report")]
    ReportEncode(#[from] serde_json::Error),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
