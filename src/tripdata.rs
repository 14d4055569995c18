//! Main entry point: a client that resolves, caches and loads monthly trip-history archives.

use crate::archive::fetcher::ArchiveFetcher;
use crate::archive::local_cache::LocalCache;
use crate::catalog::availability::AvailabilityChecker;
use crate::catalog::resolver::{ArchiveReference, Catalog};
use crate::config::TripDataConfig;
use crate::error::TripDataError;
use crate::loader::{DownloadReport, MonthRangeLoader};
use crate::types::city::City;
use crate::types::period::Period;
use crate::types::trip_batch::{LocalDataset, TripBatch};
use crate::utils::ensure_dir_exists;
use bon::bon;
use chrono::{Local, NaiveDate};
use futures_util::stream::BoxStream;
use polars::prelude::DataFrame;

/// Client for the published trip histories of the supported bike-share systems.
///
/// Downloaded months are extracted under the configured raw-data root and reused
/// on later calls, so repeated runs only hit the network for months that are not
/// on disk yet.
///
/// # Examples
///
/// ```no_run
/// # use bikeshare_tripdata::{City, TripData, TripDataConfig, TripDataError};
/// # #[tokio::main]
/// # async fn main() -> Result<(), TripDataError> {
/// let client = TripData::with_config(
///     TripDataConfig::builder().raw_data_root("data/raw").build(),
/// )
/// .await?;
///
/// let trips = client
///     .load()
///     .city(City::Chicago)
///     .year(2024)
///     .months(vec![1, 2, 3])
///     .call()
///     .await?;
///
/// if let Some(trips) = trips {
///     println!("{} trips in Q1 2024", trips.height());
/// }
/// # Ok(())
/// # }
/// ```
pub struct TripData {
    loader: MonthRangeLoader,
    availability: AvailabilityChecker,
}

#[bon]
impl TripData {
    /// Creates a client from an explicit configuration, creating the raw-data root if needed.
    ///
    /// # Errors
    ///
    /// Returns [`TripDataError::DataDirCreation`] if the root cannot be created, or
    /// [`TripDataError::DataDirNotADirectory`] if it exists as a file.
    pub async fn with_config(config: TripDataConfig) -> Result<Self, TripDataError> {
        ensure_dir_exists(&config.raw_data_root).await?;
        let cache = LocalCache::new(&config.raw_data_root, config.layout);
        let fetcher = ArchiveFetcher::new(config.catalog, cache);
        Ok(Self {
            loader: MonthRangeLoader::new(fetcher, config.keep_archive),
            availability: AvailabilityChecker::new()?,
        })
    }

    /// Creates a client configured from the `TRIPDATA_*` environment variables.
    pub async fn new() -> Result<Self, TripDataError> {
        Self::with_config(TripDataConfig::from_env()?).await
    }

    pub fn catalog(&self) -> &Catalog {
        self.loader.fetcher().catalog()
    }

    pub fn cache(&self) -> &LocalCache {
        self.loader.fetcher().cache()
    }

    /// Resolves the remote archive for one month without touching the network.
    pub fn resolve(
        &self,
        city: City,
        year: i32,
        month: u32,
    ) -> Result<ArchiveReference, TripDataError> {
        let period = Period::new(year, month)?;
        Ok(self.catalog().resolve(city, period)?)
    }

    /// Checks whether the operator's public data page answers `200 OK`.
    ///
    /// Transport failures are returned as errors rather than reported as `false`.
    pub async fn is_published(&self, city: City) -> Result<bool, TripDataError> {
        Ok(self
            .availability
            .city_is_published(self.catalog(), city)
            .await?)
    }

    /// Makes sure one month is on disk and returns its location.
    #[builder]
    pub async fn fetch(
        &self,
        city: City,
        year: i32,
        month: u32,
        keep_archive: Option<bool>,
    ) -> Result<LocalDataset, TripDataError> {
        let period = Period::new(year, month)?;
        let outcome = self
            .loader
            .fetcher()
            .fetch_and_extract(city, period, keep_archive.unwrap_or(false))
            .await?;
        Ok(outcome.into_dataset())
    }

    /// Loads the requested months of `year` into one frame, skipping months that fail.
    ///
    /// Without `.months(..)` this covers the whole year, or the months up to the
    /// current one for the current year. Returns `None` if no month could be loaded.
    #[builder]
    pub async fn load(
        &self,
        city: City,
        year: i32,
        months: Option<Vec<u32>>,
    ) -> Result<Option<DataFrame>, TripDataError> {
        self.loader
            .load(city, year, months.as_deref(), today())
            .await
    }

    /// Downloads the requested months without loading them, reporting each month's outcome.
    #[builder]
    pub async fn download(
        &self,
        city: City,
        year: i32,
        months: Option<Vec<u32>>,
    ) -> Result<DownloadReport, TripDataError> {
        self.loader
            .download(city, year, months.as_deref(), today())
            .await
    }

    /// Streams one [`TripBatch`] per successfully loaded month, in month order.
    pub async fn batches(
        &self,
        city: City,
        year: i32,
        months: Option<&[u32]>,
    ) -> Result<BoxStream<'_, TripBatch>, TripDataError> {
        self.loader.batches(city, year, months, today()).await
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
