//! Download runs over several cities, as driven by the `tripdata` binary.

use crate::loader::DownloadReport;
use crate::tripdata::TripData;
use crate::types::city::City;
use bon::Builder;
use log::{error, info, warn};

/// One invocation of the downloader: a set of cities, one year, optional months.
///
/// City names are parsed while running, so one bad name is reported without
/// stopping the others.
#[derive(Debug, Clone, Builder)]
pub struct DownloadRun {
    pub cities: Vec<String>,
    pub year: i32,
    pub months: Option<Vec<u32>>,
    /// Probe each operator's data page first and skip cities that do not answer `200 OK`.
    #[builder(default)]
    pub check_availability: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub reports: Vec<DownloadReport>,
    /// False when any city was unknown, unpublished, unreachable, or produced no month at all.
    pub all_ok: bool,
}

impl DownloadRun {
    pub async fn execute(&self, client: &TripData) -> RunSummary {
        let mut reports = Vec::new();
        let mut all_ok = true;

        for name in &self.cities {
            let city: City = match name.parse() {
                Ok(city) => city,
                Err(e) => {
                    error!("{e}");
                    all_ok = false;
                    continue;
                }
            };

            if self.check_availability {
                match client.is_published(city).await {
                    Ok(true) => {}
                    Ok(false) => {
                        warn!("No published trip data found for {}", city.display_name());
                        all_ok = false;
                        continue;
                    }
                    Err(e) => {
                        error!("{e}");
                        all_ok = false;
                        continue;
                    }
                }
            }

            let report = match client
                .download()
                .city(city)
                .year(self.year)
                .maybe_months(self.months.clone())
                .call()
                .await
            {
                Ok(report) => report,
                Err(e) => {
                    error!("{}: {e}", city.display_name());
                    all_ok = false;
                    continue;
                }
            };
            info!(
                "{}: {} month(s) available, {} failed",
                city.display_name(),
                report.succeeded(),
                report.failed()
            );
            if report.failed_entirely() {
                all_ok = false;
            }
            reports.push(report);
        }

        RunSummary { reports, all_ok }
    }
}
