use crate::catalog::resolver::ArchiveReference;
use crate::config::CacheLayout;
use crate::types::city::City;
use crate::types::trip_batch::LocalDataset;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Deterministic on-disk locations for downloaded archives and extracted datasets.
#[derive(Debug, Clone)]
pub struct LocalCache {
    root: PathBuf,
    layout: CacheLayout,
}

impl LocalCache {
    pub fn new(root: &Path, layout: CacheLayout) -> Self {
        Self {
            root: root.to_path_buf(),
            layout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every dataset of `city`.
    pub fn city_dir(&self, city: City) -> PathBuf {
        match self.layout {
            CacheLayout::PerCity => self.root.join(city.key()),
            CacheLayout::Flat => self.root.clone(),
        }
    }

    pub fn dataset_dir(&self, city: City, base_file_name: &str) -> PathBuf {
        self.city_dir(city).join(base_file_name)
    }

    pub fn archive_path(&self, reference: &ArchiveReference) -> PathBuf {
        self.city_dir(reference.city).join(&reference.archive_name)
    }

    pub fn dataset(&self, reference: &ArchiveReference) -> LocalDataset {
        let directory = self.dataset_dir(reference.city, &reference.base_file_name);
        let tabular_file = directory.join(reference.tabular_file_name());
        LocalDataset {
            city: reference.city,
            period: reference.period,
            directory,
            tabular_file,
        }
    }

    /// Whether the dataset for `base_file_name` is already on disk.
    ///
    /// Never creates directories; a missing root simply yields `false`.
    pub async fn exists(&self, city: City, base_file_name: &str) -> bool {
        fs::metadata(self.dataset_dir(city, base_file_name))
            .await
            .is_ok()
    }
}
