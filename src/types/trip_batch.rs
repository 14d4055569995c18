//! In-memory representation of loaded trip history.

use crate::types::city::City;
use crate::types::period::Period;
use polars::frame::DataFrame;
use std::path::PathBuf;

/// An extracted month of trip history on local storage.
///
/// `directory` is named after the base file name and holds exactly one CSV file
/// with the same base name. Once created it is never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDataset {
    pub city: City,
    pub period: Period,
    pub directory: PathBuf,
    pub tabular_file: PathBuf,
}

/// The trips of one month, loaded from a [`LocalDataset`].
///
/// Columns are whatever the provider published for that month; no schema is
/// enforced here.
#[derive(Debug, Clone)]
pub struct TripBatch {
    pub city: City,
    pub period: Period,
    pub frame: DataFrame,
}

impl TripBatch {
    pub fn height(&self) -> usize {
        self.frame.height()
    }
}
