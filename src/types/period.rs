use crate::catalog::error::CatalogError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};

/// One month of published trip history.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, CatalogError> {
        if !(0..=9999).contains(&year) {
            return Err(CatalogError::InvalidYear(year));
        }
        if !(1..=12).contains(&month) {
            return Err(CatalogError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// The six-digit `YYYYMM` stamp embedded in provider file names.
    pub fn year_month(self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Resolves which months of `year` a request covers.
///
/// Without an explicit selection this is every month of the year, or only the
/// months up to and including the current one when `year` is the year of `today`.
/// Explicit selections are de-duplicated and sorted; out-of-range months are kept
/// so the caller can report them per period.
pub fn effective_months(year: i32, requested: Option<&[u32]>, today: NaiveDate) -> Vec<u32> {
    match requested {
        Some(months) => {
            let mut months = months.to_vec();
            months.sort_unstable();
            months.dedup();
            months
        }
        None => {
            let end_month = if year == today.year() { today.month() } else { 12 };
            (1..=end_month).collect()
        }
    }
}
