//! Defines the closed set of bike-share systems whose trip histories can be fetched.

use crate::catalog::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A city served by one of the supported bike-share systems.
///
/// The set is closed: every variant has an entry in the [`crate::Catalog`], and a
/// city name that does not parse into one of these variants is rejected with
/// [`CatalogError::UnsupportedCity`] before any network or disk access happens.
///
/// # Examples
///
/// ```
/// use bikeshare_tripdata::City;
///
/// let city: City = "New York".parse().unwrap();
/// assert_eq!(city, City::NewYork);
/// assert_eq!(city.key(), "new_york");
/// assert_eq!(city.display_name(), "New York");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum City {
    /// Bay Wheels (San Francisco Bay Area).
    BayArea,
    /// Divvy.
    Chicago,
    /// Citi Bike.
    NewYork,
    /// CoGo.
    Columbus,
    /// Capital Bikeshare.
    WashingtonDc,
    /// BIKETOWN.
    Portland,
}

impl City {
    pub const ALL: [City; 6] = [
        City::BayArea,
        City::Chicago,
        City::NewYork,
        City::Columbus,
        City::WashingtonDc,
        City::Portland,
    ];

    /// The canonical lowercase key, also used as the per-city cache directory name.
    pub fn key(self) -> &'static str {
        match self {
            City::BayArea => "bay_area",
            City::Chicago => "chicago",
            City::NewYork => "new_york",
            City::Columbus => "columbus",
            City::WashingtonDc => "washington_dc",
            City::Portland => "portland",
        }
    }

    /// Human-readable name, suitable for log lines and CLI output.
    pub fn display_name(self) -> &'static str {
        match self {
            City::BayArea => "the Bay Area",
            City::Chicago => "Chicago",
            City::NewYork => "New York",
            City::Columbus => "Columbus",
            City::WashingtonDc => "Washington DC",
            City::Portland => "Portland",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for City {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        City::ALL
            .into_iter()
            .find(|city| city.key() == normalized)
            .ok_or_else(|| CatalogError::UnsupportedCity(s.to_string()))
    }
}
