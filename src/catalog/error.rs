use crate::types::city::City;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("'{0}' is not a bike-share system with published trip data")]
    UnsupportedCity(String),

    #[error("Year {0} is outside 0..=9999")]
    InvalidYear(i32),

    #[error("Month {0} is outside 1..=12")]
    InvalidMonth(u32),

    #[error("No trip data is published for {} after {last_year} (requested {year})", city.display_name())]
    DataUnavailable {
        city: City,
        year: i32,
        last_year: i32,
    },

    #[error("Invalid archive URL '{0}'")]
    InvalidUrl(String),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),
}
