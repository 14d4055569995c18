use crate::archive::error::ArchiveError;
use crate::archive::local_cache::LocalCache;
use crate::catalog::resolver::{ArchiveKind, ArchiveReference, Catalog};
use crate::types::city::City;
use crate::types::period::Period;
use crate::types::trip_batch::LocalDataset;
use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::Client;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};
use tokio::io::AsyncWriteExt;
use tokio::{fs, task};
use tokio_util::io::StreamReader;
use zip::result::ZipError;
use zip::ZipArchive;

/// Prefix of the per-fetch directories datasets are built in before being renamed into place.
pub const STAGING_PREFIX: &str = ".partial-";

/// Result of a cache-or-fetch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The dataset was already on disk; no request was made.
    Cached(LocalDataset),
    /// The dataset was downloaded and extracted by this call.
    Downloaded(LocalDataset),
}

impl FetchOutcome {
    pub fn dataset(&self) -> &LocalDataset {
        match self {
            FetchOutcome::Cached(dataset) | FetchOutcome::Downloaded(dataset) => dataset,
        }
    }

    pub fn into_dataset(self) -> LocalDataset {
        match self {
            FetchOutcome::Cached(dataset) | FetchOutcome::Downloaded(dataset) => dataset,
        }
    }

    pub fn was_cached(&self) -> bool {
        matches!(self, FetchOutcome::Cached(_))
    }
}

/// Downloads monthly archives and extracts their CSV into the local cache.
///
/// Requests are issued one at a time and never retried. Concurrent fetchers
/// sharing a cache directory must be serialized per city by the caller.
pub struct ArchiveFetcher {
    catalog: Catalog,
    cache: LocalCache,
    download_client: Client,
}

impl ArchiveFetcher {
    pub fn new(catalog: Catalog, cache: LocalCache) -> Self {
        Self {
            catalog,
            cache,
            download_client: Client::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// Makes sure the dataset for `city`/`period` is on disk, downloading it if needed.
    ///
    /// A dataset that already exists is returned without touching the network.
    /// Otherwise the archive is downloaded, `<base>.csv` is extracted into a
    /// directory named `<base>`, and the archive is deleted unless `keep_archive`
    /// is set. A failed deletion is logged and does not fail the call.
    ///
    /// The directory is assembled under a staging name and renamed into place
    /// once complete, so a killed run never leaves a false cache hit behind.
    pub async fn fetch_and_extract(
        &self,
        city: City,
        period: Period,
        keep_archive: bool,
    ) -> Result<FetchOutcome, ArchiveError> {
        let reference = self.catalog.resolve(city, period)?;
        let dataset = self.cache.dataset(&reference);

        if self.cache.exists(city, &reference.base_file_name).await {
            info!(
                "{} for {} is already saved to disk at {:?}",
                reference.base_file_name,
                city.display_name(),
                dataset.directory
            );
            return Ok(FetchOutcome::Cached(dataset));
        }

        let city_dir = self.cache.city_dir(city);
        fs::create_dir_all(&city_dir)
            .await
            .map_err(|e| ArchiveError::DatasetDirCreation(city_dir.clone(), e))?;

        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(&city_dir)
            .map_err(|e| ArchiveError::DatasetDirCreation(city_dir.clone(), e))?;
        let staged_file = staging.path().join(reference.tabular_file_name());

        let built = match reference.kind {
            ArchiveKind::Zip => self.fetch_zip(&reference, &staged_file, keep_archive).await,
            ArchiveKind::PlainCsv => self
                .download(&reference.url, &staged_file)
                .await
                .map(|_| ()),
        };
        if let Err(e) = built {
            discard_staging(staging);
            return Err(e);
        }
        publish_dataset(staging, &dataset).await?;

        info!(
            "Saved {} for {} to {:?}",
            reference.base_file_name,
            city.display_name(),
            dataset.tabular_file
        );
        Ok(FetchOutcome::Downloaded(dataset))
    }

    async fn fetch_zip(
        &self,
        reference: &ArchiveReference,
        destination: &Path,
        keep_archive: bool,
    ) -> Result<(), ArchiveError> {
        let archive_path = self.cache.archive_path(reference);
        self.download(&reference.url, &archive_path).await?;

        let member = reference.tabular_file_name();
        let extracted = {
            let archive_path = archive_path.clone();
            let destination = destination.to_path_buf();
            task::spawn_blocking(move || extract_member(&archive_path, &member, &destination))
                .await?
        };

        if !keep_archive {
            if let Err(e) = fs::remove_file(&archive_path).await {
                warn!("Failed to delete archive {:?}: {}", archive_path, e);
            }
        }
        extracted
    }

    /// Streams the body of `url` into `destination`.
    ///
    /// The body is written to a temporary file next to `destination` and only
    /// renamed into place once complete.
    async fn download(&self, url: &str, destination: &Path) -> Result<u64, ArchiveError> {
        info!("Downloading {}", url);

        let response = self
            .download_client
            .get(url)
            .send()
            .await
            .map_err(|e| ArchiveError::NetworkRequest(url.to_string(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", url, e);
                return Err(if let Some(status) = e.status() {
                    ArchiveError::HttpStatus {
                        url: url.to_string(),
                        status,
                        source: e,
                    }
                } else {
                    ArchiveError::NetworkRequest(url.to_string(), e)
                });
            }
        };

        let download_io = |source: std::io::Error| ArchiveError::DownloadIo {
            url: url.to_string(),
            path: destination.to_path_buf(),
            source,
        };

        let parent = destination
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let temp_file = NamedTempFile::new_in(&parent).map_err(download_io)?;
        let mut file = fs::File::from_std(temp_file.as_file().try_clone().map_err(download_io)?);

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let mut reader = StreamReader::new(Box::pin(stream));
        let written = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(download_io)?;
        file.flush().await.map_err(download_io)?;
        drop(file);

        temp_file
            .persist(destination)
            .map_err(|e| ArchiveError::ArchivePersist(destination.to_path_buf(), e.error))?;

        info!("Downloaded {} bytes from {}", written, url);
        Ok(written)
    }
}

/// Moves a fully built staging directory to the dataset's final location.
///
/// A directory already at that location is an incomplete leftover (a complete
/// one would have been a cache hit) and is replaced.
async fn publish_dataset(staging: TempDir, dataset: &LocalDataset) -> Result<(), ArchiveError> {
    if fs::metadata(&dataset.directory).await.is_ok() {
        warn!("Replacing incomplete dataset at {:?}", dataset.directory);
        if let Err(e) = fs::remove_dir_all(&dataset.directory).await {
            warn!("Failed to remove {:?}: {}", dataset.directory, e);
        }
    }

    if let Err(e) = fs::rename(staging.path(), &dataset.directory).await {
        discard_staging(staging);
        return Err(ArchiveError::DatasetPublish(dataset.directory.clone(), e));
    }
    Ok(())
}

fn discard_staging(staging: TempDir) {
    let path = staging.path().to_path_buf();
    if let Err(e) = staging.close() {
        warn!("Failed to remove staging directory {:?}: {}", path, e);
    }
}

/// Copies the `member` entry of a ZIP archive to `destination`.
fn extract_member(archive_path: &Path, member: &str, destination: &Path) -> Result<(), ArchiveError> {
    let file = std::fs::File::open(archive_path)
        .map_err(|e| ArchiveError::ArchiveOpen(archive_path.to_path_buf(), ZipError::Io(e)))?;
    let mut archive = ZipArchive::new(file)
        .map_err(|e| ArchiveError::ArchiveOpen(archive_path.to_path_buf(), e))?;

    let mut entry = match archive.by_name(member) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => {
            return Err(ArchiveError::MissingMember {
                archive: archive_path.to_path_buf(),
                member: member.to_string(),
            })
        }
        Err(e) => return Err(ArchiveError::ArchiveOpen(archive_path.to_path_buf(), e)),
    };

    std::fs::File::create(destination)
        .and_then(|mut out| std::io::copy(&mut entry, &mut out))
        .map_err(|source| ArchiveError::ExtractIo {
            archive: archive_path.to_path_buf(),
            member: member.to_string(),
            source,
        })?;
    Ok(())
}
