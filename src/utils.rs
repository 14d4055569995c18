use crate::error::TripDataError;
use log::info;
use std::io;
use std::path::{Path, PathBuf};

const DATA_DIR_NAME: &str = "bikeshare_tripdata";

pub fn get_data_dir() -> Result<PathBuf, TripDataError> {
    dirs::data_dir()
        .ok_or(TripDataError::DataDirResolution)
        .map(|p| p.join(DATA_DIR_NAME))
}

pub async fn ensure_dir_exists(path: &Path) -> Result<(), TripDataError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_dir() {
                return Err(TripDataError::DataDirNotADirectory(path.to_path_buf()));
            }
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating data directory: {}", path.display());
            tokio::fs::create_dir_all(path)
                .await
                .map_err(|e| TripDataError::DataDirCreation(path.to_path_buf(), e))
        }
        Err(e) => Err(TripDataError::DataDirCreation(path.to_path_buf(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_dir_creates_nested_dirs() -> Result<(), TripDataError> {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("raw/chicago");
        ensure_dir_exists(&nested).await?;
        assert!(nested.is_dir());
        // Second call is a no-op.
        ensure_dir_exists(&nested).await
    }

    #[tokio::test]
    async fn test_ensure_dir_rejects_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("raw");
        std::fs::write(&file, b"").unwrap();
        assert!(matches!(
            ensure_dir_exists(&file).await,
            Err(TripDataError::DataDirNotADirectory(_))
        ));
    }
}
