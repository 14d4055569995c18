mod archive;
mod batch;
mod catalog;
mod config;
mod error;
mod loader;
mod tripdata;
mod types;
mod utils;

#[cfg(test)]
mod test_utils;

pub use error::TripDataError;
pub use tripdata::*;

pub use batch::{DownloadRun, RunSummary};

pub use archive::error::ArchiveError;
pub use archive::fetcher::{ArchiveFetcher, FetchOutcome, STAGING_PREFIX};
pub use archive::local_cache::LocalCache;

pub use catalog::availability::AvailabilityChecker;
pub use catalog::error::CatalogError;
pub use catalog::resolver::{archive_name_from_url, ArchiveKind, ArchiveReference, Catalog, CatalogEntry};

pub use config::{CacheLayout, TripDataConfig};

pub use loader::{read_trip_csv, DownloadReport, MonthRangeLoader, PeriodReport, PeriodStatus};

pub use types::city::City;
pub use types::period::{effective_months, Period};
pub use types::trip_batch::{LocalDataset, TripBatch};
