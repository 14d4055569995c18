//! Maps a city and month to the provider's remote archive and its local names.
//!
//! Every supported city has exactly one [`CatalogEntry`]. The defaults mirror the
//! buckets the providers publish to; individual URL prefixes and landing pages can
//! be overridden to point at a mirror.

use crate::catalog::error::CatalogError;
use crate::types::city::City;
use crate::types::period::Period;
use reqwest::Url;

pub(crate) const ARCHIVE_EXTENSION: &str = ".zip";
pub(crate) const TABULAR_EXTENSION: &str = ".csv";
const YEAR_MONTH_PLACEHOLDER: &str = "{yyyymm}";

/// Naming and location rules for one city's published trip data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Slug of the operator's public site, e.g. `divvybikes`.
    pub service: String,
    /// File name with a `{yyyymm}` placeholder, without the archive extension.
    pub file_name_template: String,
    /// Everything in the archive URL before the file name, trailing slash included.
    pub url_prefix: String,
    /// Page probed to decide whether the operator publishes data at all.
    pub landing_page: String,
    /// Last year the provider hosts data for, if the city stopped publishing.
    pub published_through: Option<i32>,
}

impl CatalogEntry {
    fn default_for(city: City) -> Self {
        let (service, template, prefix, published_through) = match city {
            City::BayArea => (
                "bay-wheels",
                "{yyyymm}-baywheels-tripdata",
                "https://s3.amazonaws.com/baywheels-data/",
                None,
            ),
            City::Chicago => (
                "divvybikes",
                "{yyyymm}-divvy-tripdata",
                "https://divvy-tripdata.s3.amazonaws.com/",
                None,
            ),
            City::NewYork => (
                "citibikenyc",
                "{yyyymm}-citibike-tripdata",
                "https://s3.amazonaws.com/tripdata/",
                None,
            ),
            City::Columbus => (
                "cogobikeshare",
                "{yyyymm}-cogo-tripdata",
                "https://cogo-sys-data.s3.amazonaws.com/",
                None,
            ),
            City::WashingtonDc => (
                "capitalbikeshare",
                "{yyyymm}-capitalbikeshare-tripdata",
                "https://s3.amazonaws.com/capitalbikeshare-data/",
                None,
            ),
            City::Portland => (
                "biketownpdx",
                "{yyyymm}.csv",
                "https://s3.amazonaws.com/biketown-tripdata-public/",
                Some(2020),
            ),
        };

        // The Bay Area operator page lives under lyft.com instead of its own domain.
        let landing_page = match city {
            City::BayArea => format!("https://lyft.com/bikes/{service}"),
            _ => format!("https://{service}.com/system-data"),
        };

        Self {
            service: service.to_string(),
            file_name_template: template.to_string(),
            url_prefix: prefix.to_string(),
            landing_page,
            published_through,
        }
    }
}

/// How the remote object for a period is packaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// A ZIP archive holding `<base>.csv`.
    Zip,
    /// The CSV itself, served uncompressed.
    PlainCsv,
}

/// Where one month of data lives remotely and what it is called locally.
///
/// Derived on demand from a [`City`] and [`Period`]; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReference {
    pub city: City,
    pub period: Period,
    pub url: String,
    /// Last path segment of `url`, i.e. the name of the downloaded file.
    pub archive_name: String,
    /// `archive_name` without its extension; names the dataset directory and CSV.
    pub base_file_name: String,
    pub kind: ArchiveKind,
}

impl ArchiveReference {
    pub fn tabular_file_name(&self) -> String {
        format!("{}{}", self.base_file_name, TABULAR_EXTENSION)
    }
}

/// The per-city lookup table. Always holds an entry for every [`City`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: [CatalogEntry; City::ALL.len()],
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            entries: City::ALL.map(CatalogEntry::default_for),
        }
    }
}

impl Catalog {
    pub fn entry(&self, city: City) -> &CatalogEntry {
        &self.entries[city as usize]
    }

    fn entry_mut(&mut self, city: City) -> &mut CatalogEntry {
        &mut self.entries[city as usize]
    }

    /// Replaces the archive URL prefix of `city`, e.g. to read from a mirror.
    pub fn with_url_prefix(mut self, city: City, prefix: impl Into<String>) -> Self {
        self.entry_mut(city).url_prefix = prefix.into();
        self
    }

    /// Replaces the landing page probed by [`crate::TripData::is_published`].
    pub fn with_landing_page(mut self, city: City, url: impl Into<String>) -> Self {
        self.entry_mut(city).landing_page = url.into();
        self
    }

    pub fn landing_page_url(&self, city: City) -> &str {
        &self.entry(city).landing_page
    }

    /// The provider's file name for one month, e.g. `202403-divvy-tripdata`.
    pub fn file_name_for(&self, city: City, period: Period) -> String {
        self.entry(city)
            .file_name_template
            .replace(YEAR_MONTH_PLACEHOLDER, &period.year_month())
    }

    /// The full archive URL for one month.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DataUnavailable`] when the city stopped publishing
    /// before `period`'s year.
    pub fn url_for(&self, city: City, period: Period) -> Result<String, CatalogError> {
        let entry = self.entry(city);
        if let Some(last_year) = entry.published_through {
            if period.year() > last_year {
                return Err(CatalogError::DataUnavailable {
                    city,
                    year: period.year(),
                    last_year,
                });
            }
        }

        let file_name = self.file_name_for(city, period);
        if file_name.ends_with(TABULAR_EXTENSION) {
            Ok(format!("{}{}", entry.url_prefix, file_name))
        } else {
            Ok(format!("{}{}{}", entry.url_prefix, file_name, ARCHIVE_EXTENSION))
        }
    }

    /// Resolves the remote URL and the local names for one month.
    pub fn resolve(&self, city: City, period: Period) -> Result<ArchiveReference, CatalogError> {
        let url = self.url_for(city, period)?;
        let path = archive_name_from_url(&url)?;
        let archive_name = path
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| CatalogError::InvalidUrl(url.clone()))?
            .to_string();

        let (base_file_name, kind) = if let Some(base) = archive_name.strip_suffix(ARCHIVE_EXTENSION)
        {
            (base.to_string(), ArchiveKind::Zip)
        } else if let Some(base) = archive_name.strip_suffix(TABULAR_EXTENSION) {
            (base.to_string(), ArchiveKind::PlainCsv)
        } else {
            return Err(CatalogError::InvalidUrl(url));
        };

        Ok(ArchiveReference {
            city,
            period,
            url,
            archive_name,
            base_file_name,
            kind,
        })
    }
}

/// Returns the path component of `url`, i.e. everything after `scheme://host`.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidUrl`] if the URL cannot be parsed, has no host,
/// or has nothing after the host.
///
/// # Examples
///
/// ```
/// use bikeshare_tripdata::archive_name_from_url;
///
/// let path = archive_name_from_url("https://s3.amazonaws.com/tripdata/202401-citibike-tripdata.zip").unwrap();
/// assert_eq!(path, "/tripdata/202401-citibike-tripdata.zip");
/// ```
pub fn archive_name_from_url(url: &str) -> Result<String, CatalogError> {
    let parsed = Url::parse(url).map_err(|_| CatalogError::InvalidUrl(url.to_string()))?;
    if !parsed.has_host() {
        return Err(CatalogError::InvalidUrl(url.to_string()));
    }
    match parsed.path() {
        "" | "/" => Err(CatalogError::InvalidUrl(url.to_string())),
        path => Ok(path.to_string()),
    }
}
