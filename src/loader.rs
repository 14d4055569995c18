//! Cache-or-fetch orchestration over a range of months.
//!
//! A failure in one month is logged and that month yields nothing; the remaining
//! months are still processed. Only setting up the local directories can fail a
//! whole call.

use crate::archive::error::ArchiveError;
use crate::archive::fetcher::{ArchiveFetcher, FetchOutcome};
use crate::error::TripDataError;
use crate::types::city::City;
use crate::types::period::{effective_months, Period};
use crate::types::trip_batch::{LocalDataset, TripBatch};
use crate::utils::ensure_dir_exists;
use chrono::NaiveDate;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use log::{error, info, warn};
use polars::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tokio::task;

const INFER_SCHEMA_ROWS: usize = 10_000;

/// What happened to one month during a download-only run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum PeriodStatus {
    Cached,
    Downloaded,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodReport {
    pub year: i32,
    pub month: u32,
    #[serde(flatten)]
    pub status: PeriodStatus,
}

/// Per-month outcomes of [`MonthRangeLoader::download`] for one city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadReport {
    pub city: City,
    pub year: i32,
    pub periods: Vec<PeriodReport>,
}

impl DownloadReport {
    pub fn failed(&self) -> usize {
        self.periods
            .iter()
            .filter(|p| matches!(p.status, PeriodStatus::Failed(_)))
            .count()
    }

    pub fn succeeded(&self) -> usize {
        self.periods.len() - self.failed()
    }

    /// True when months were requested and none of them could be obtained.
    pub fn failed_entirely(&self) -> bool {
        !self.periods.is_empty() && self.succeeded() == 0
    }
}

pub struct MonthRangeLoader {
    fetcher: ArchiveFetcher,
    keep_archive: bool,
}

impl MonthRangeLoader {
    pub fn new(fetcher: ArchiveFetcher, keep_archive: bool) -> Self {
        Self {
            fetcher,
            keep_archive,
        }
    }

    pub fn fetcher(&self) -> &ArchiveFetcher {
        &self.fetcher
    }

    /// Lazily loads each month of `year` in ascending order, skipping months that fail.
    ///
    /// `today` decides the default month range; see [`effective_months`].
    pub async fn batches(
        &self,
        city: City,
        year: i32,
        months: Option<&[u32]>,
        today: NaiveDate,
    ) -> Result<BoxStream<'_, TripBatch>, TripDataError> {
        self.prepare(city).await?;
        let months = effective_months(year, months, today);

        Ok(stream::iter(months)
            .filter_map(move |month| async move {
                match self.load_period(city, year, month).await {
                    Ok(batch) => Some(batch),
                    Err(e) => {
                        error!(
                            "Skipping {} {:04}-{:02}: {}",
                            city.display_name(),
                            year,
                            month,
                            e
                        );
                        None
                    }
                }
            })
            .boxed())
    }

    /// Loads every available month and stacks them into one frame.
    ///
    /// Returns `None` when no month could be loaded.
    pub async fn load(
        &self,
        city: City,
        year: i32,
        months: Option<&[u32]>,
        today: NaiveDate,
    ) -> Result<Option<DataFrame>, TripDataError> {
        let batches: Vec<TripBatch> = self
            .batches(city, year, months, today)
            .await?
            .collect()
            .await;
        info!(
            "Loaded {} month(s) of trip data for {}",
            batches.len(),
            city.display_name()
        );
        task::spawn_blocking(move || concat_batches(batches)).await?
    }

    /// Makes sure each month is on disk without loading it, reporting every month's outcome.
    pub async fn download(
        &self,
        city: City,
        year: i32,
        months: Option<&[u32]>,
        today: NaiveDate,
    ) -> Result<DownloadReport, TripDataError> {
        self.prepare(city).await?;

        let mut periods = Vec::new();
        for month in effective_months(year, months, today) {
            let status = match self.fetch_period(city, year, month).await {
                Ok(FetchOutcome::Cached(_)) => PeriodStatus::Cached,
                Ok(FetchOutcome::Downloaded(_)) => PeriodStatus::Downloaded,
                Err(e) => {
                    error!(
                        "Failed to fetch {} {:04}-{:02}: {}",
                        city.display_name(),
                        year,
                        month,
                        e
                    );
                    PeriodStatus::Failed(e.to_string())
                }
            };
            periods.push(PeriodReport {
                year,
                month,
                status,
            });
        }

        Ok(DownloadReport {
            city,
            year,
            periods,
        })
    }

    async fn prepare(&self, city: City) -> Result<(), TripDataError> {
        let cache = self.fetcher.cache();
        ensure_dir_exists(cache.root()).await?;
        ensure_dir_exists(&cache.city_dir(city)).await
    }

    async fn fetch_period(
        &self,
        city: City,
        year: i32,
        month: u32,
    ) -> Result<FetchOutcome, ArchiveError> {
        let period = Period::new(year, month)?;
        self.fetcher
            .fetch_and_extract(city, period, self.keep_archive)
            .await
    }

    async fn load_period(
        &self,
        city: City,
        year: i32,
        month: u32,
    ) -> Result<TripBatch, ArchiveError> {
        let outcome = self.fetch_period(city, year, month).await?;
        read_trip_csv(outcome.into_dataset()).await
    }
}

/// Parses a dataset's CSV (with header) into a [`TripBatch`] on a blocking thread.
pub async fn read_trip_csv(dataset: LocalDataset) -> Result<TripBatch, ArchiveError> {
    task::spawn_blocking(move || {
        let path = dataset.tabular_file.clone();
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .try_into_reader_with_file_path(Some(path.clone()))
            .map_err(|e| ArchiveError::CsvRead(path.clone(), e))?
            .finish()
            .map_err(|e| ArchiveError::CsvRead(path, e))?;

        Ok::<TripBatch, ArchiveError>(TripBatch {
            city: dataset.city,
            period: dataset.period,
            frame,
        })
    })
    .await?
}

/// Stacks the months into one frame, in order.
///
/// Columns are matched by name; a column missing from some months is filled
/// with nulls there. A column whose inferred type drifts between months (a
/// station id that is numeric one month and alphanumeric the next) is read as
/// a string in every month.
fn concat_batches(batches: Vec<TripBatch>) -> Result<Option<DataFrame>, TripDataError> {
    if batches.is_empty() {
        return Ok(None);
    }
    let frames = batches.into_iter().map(|batch| batch.frame).collect();
    let frames = unify_drifting_columns(frames).map_err(TripDataError::Concat)?;

    let lazy_frames: Vec<LazyFrame> = frames.into_iter().map(IntoLazy::lazy).collect();
    let combined = concat_lf_diagonal(
        lazy_frames,
        UnionArgs {
            to_supertypes: true,
            ..Default::default()
        },
    )
    .and_then(LazyFrame::collect)
    .map_err(TripDataError::Concat)?;
    Ok(Some(combined))
}

fn unify_drifting_columns(mut frames: Vec<DataFrame>) -> PolarsResult<Vec<DataFrame>> {
    let mut first_seen: HashMap<String, DataType> = HashMap::new();
    let mut drifting: HashSet<String> = HashSet::new();
    for frame in &frames {
        for column in frame.get_columns() {
            let name = column.name().to_string();
            match first_seen.get(&name) {
                Some(dtype) if dtype != column.dtype() => {
                    drifting.insert(name);
                }
                Some(_) => {}
                None => {
                    first_seen.insert(name, column.dtype().clone());
                }
            }
        }
    }
    if drifting.is_empty() {
        return Ok(frames);
    }
    warn!("Column types differ between months, reading as strings: {drifting:?}");

    for frame in &mut frames {
        for name in &drifting {
            let Ok(column) = frame.column(name) else {
                continue;
            };
            if column.dtype() != &DataType::String {
                let as_string = column.cast(&DataType::String)?;
                frame.with_column(as_string)?;
            }
        }
    }
    Ok(frames)
}
