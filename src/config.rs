//! Process-wide settings for the acquisition layer, built once and handed to [`crate::TripData`].

use crate::catalog::resolver::Catalog;
use crate::error::TripDataError;
use crate::utils::get_data_dir;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const RAW_DATA_DIR_VAR: &str = "TRIPDATA_RAW_DATA_DIR";
pub const CACHE_LAYOUT_VAR: &str = "TRIPDATA_CACHE_LAYOUT";
pub const KEEP_ARCHIVES_VAR: &str = "TRIPDATA_KEEP_ARCHIVES";

/// Where extracted datasets are placed under the raw-data root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheLayout {
    /// `<root>/<city>/<base>`
    #[default]
    PerCity,
    /// `<root>/<base>`
    Flat,
}

impl FromStr for CacheLayout {
    type Err = TripDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "per_city" => Ok(CacheLayout::PerCity),
            "flat" => Ok(CacheLayout::Flat),
            other => Err(TripDataError::Config(format!(
                "unknown cache layout '{other}' (expected 'per_city' or 'flat')"
            ))),
        }
    }
}

/// Settings shared by every component of the acquisition layer.
///
/// # Examples
///
/// ```
/// use bikeshare_tripdata::{CacheLayout, TripDataConfig};
///
/// let config = TripDataConfig::builder()
///     .raw_data_root("data/raw")
///     .layout(CacheLayout::Flat)
///     .keep_archive(true)
///     .build();
/// assert!(config.keep_archive);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct TripDataConfig {
    /// Base directory for downloads and extracted datasets.
    #[builder(into)]
    pub raw_data_root: PathBuf,
    #[builder(default)]
    pub layout: CacheLayout,
    /// Keep the downloaded archive next to the extracted dataset.
    #[builder(default)]
    pub keep_archive: bool,
    #[builder(default)]
    pub catalog: Catalog,
}

impl TripDataConfig {
    /// `<platform data dir>/bikeshare_tripdata/raw`.
    pub fn default_root() -> Result<PathBuf, TripDataError> {
        Ok(get_data_dir()?.join("raw"))
    }

    /// Reads the settings from `TRIPDATA_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, TripDataError> {
        let raw_data_root = match env::var_os(RAW_DATA_DIR_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => Self::default_root()?,
        };
        let layout = match env::var(CACHE_LAYOUT_VAR) {
            Ok(value) => value.parse()?,
            Err(_) => CacheLayout::default(),
        };
        let keep_archive = match env::var(KEEP_ARCHIVES_VAR) {
            Ok(value) => parse_flag(&value)?,
            Err(_) => false,
        };

        Ok(Self::builder()
            .raw_data_root(raw_data_root)
            .layout(layout)
            .keep_archive(keep_archive)
            .build())
    }
}

fn parse_flag(value: &str) -> Result<bool, TripDataError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        other => Err(TripDataError::Config(format!(
            "{KEEP_ARCHIVES_VAR} must be a boolean, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Environment variables are process-global; tests touching them take this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn with_vars<T>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let saved: Vec<_> = vars.iter().map(|(k, _)| (*k, env::var_os(k))).collect();
        for (key, value) in vars {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
        let result = f();
        for (key, value) in saved {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
        result
    }

    #[test]
    fn test_from_env_reads_variables() {
        let config = with_vars(
            &[
                (RAW_DATA_DIR_VAR, Some("/srv/tripdata/raw")),
                (CACHE_LAYOUT_VAR, Some("flat")),
                (KEEP_ARCHIVES_VAR, Some("yes")),
            ],
            TripDataConfig::from_env,
        )
        .unwrap();
        assert_eq!(config.raw_data_root, PathBuf::from("/srv/tripdata/raw"));
        assert_eq!(config.layout, CacheLayout::Flat);
        assert!(config.keep_archive);
        assert_eq!(config.catalog, Catalog::default());
    }

    #[test]
    fn test_from_env_defaults_when_unset() {
        let config = with_vars(
            &[
                (RAW_DATA_DIR_VAR, Some("/srv/tripdata/raw")),
                (CACHE_LAYOUT_VAR, None),
                (KEEP_ARCHIVES_VAR, None),
            ],
            TripDataConfig::from_env,
        )
        .unwrap();
        assert_eq!(config.layout, CacheLayout::PerCity);
        assert!(!config.keep_archive);
    }

    #[test]
    fn test_from_env_rejects_bad_values() {
        let bad_layout = with_vars(
            &[
                (RAW_DATA_DIR_VAR, Some("/srv/tripdata/raw")),
                (CACHE_LAYOUT_VAR, Some("nested")),
                (KEEP_ARCHIVES_VAR, None),
            ],
            TripDataConfig::from_env,
        );
        assert!(matches!(bad_layout, Err(TripDataError::Config(_))));

        let bad_flag = with_vars(
            &[
                (RAW_DATA_DIR_VAR, Some("/srv/tripdata/raw")),
                (CACHE_LAYOUT_VAR, None),
                (KEEP_ARCHIVES_VAR, Some("maybe")),
            ],
            TripDataConfig::from_env,
        );
        assert!(matches!(bad_flag, Err(TripDataError::Config(_))));
    }

    #[test]
    fn test_builder_defaults() {
        let config = TripDataConfig::builder().raw_data_root("/tmp/raw").build();
        assert_eq!(config.raw_data_root, PathBuf::from("/tmp/raw"));
        assert_eq!(config.layout, CacheLayout::PerCity);
        assert!(!config.keep_archive);
        assert_eq!(config.catalog, Catalog::default());
    }

    #[test]
    fn test_layout_parsing() {
        assert_eq!("flat".parse::<CacheLayout>().unwrap(), CacheLayout::Flat);
        assert_eq!("per-city".parse::<CacheLayout>().unwrap(), CacheLayout::PerCity);
        assert_eq!("PER_CITY".parse::<CacheLayout>().unwrap(), CacheLayout::PerCity);
        assert!(matches!(
            "nested".parse::<CacheLayout>(),
            Err(TripDataError::Config(_))
        ));
    }

    #[test]
    fn test_flag_parsing() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(parse_flag("1").unwrap());
        assert!(!parse_flag("no").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}
