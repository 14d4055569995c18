use bikeshare_tripdata::{CacheLayout, DownloadRun, TripData, TripDataConfig, TripDataError};
use clap::{Parser, ValueEnum};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LayoutArg {
    PerCity,
    Flat,
}

impl From<LayoutArg> for CacheLayout {
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::PerCity => CacheLayout::PerCity,
            LayoutArg::Flat => CacheLayout::Flat,
        }
    }
}

/// Download monthly bike-share trip archives into the local raw-data directory.
#[derive(Debug, Parser)]
#[command(name = "tripdata", version)]
struct Cli {
    /// Cities to download, e.g. chicago new_york "bay area"
    #[arg(long, num_args = 1.., required = true)]
    cities: Vec<String>,

    #[arg(long)]
    year: i32,

    /// Months to download (default: all months, or up to the current month this year)
    #[arg(long, num_args = 1..)]
    months: Option<Vec<u32>>,

    /// Overrides TRIPDATA_RAW_DATA_DIR
    #[arg(long)]
    raw_data_dir: Option<PathBuf>,

    /// Overrides TRIPDATA_CACHE_LAYOUT
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,

    /// Keep downloaded archives after extraction
    #[arg(long, default_value_t = false)]
    keep_archives: bool,

    /// Probe each operator's data page before downloading
    #[arg(long, default_value_t = false)]
    check_availability: bool,

    /// Write per-month outcomes as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every city produced at least one month of data.
async fn run(cli: Cli) -> Result<bool, TripDataError> {
    let mut config = TripDataConfig::from_env()?;
    if let Some(dir) = cli.raw_data_dir {
        config.raw_data_root = dir;
    }
    if let Some(layout) = cli.layout {
        config.layout = layout.into();
    }
    config.keep_archive |= cli.keep_archives;

    let client = TripData::with_config(config).await?;
    let summary = DownloadRun::builder()
        .cities(cli.cities)
        .year(cli.year)
        .maybe_months(cli.months)
        .check_availability(cli.check_availability)
        .build()
        .execute(&client)
        .await;

    if let Some(path) = cli.report {
        let json = serde_json::to_string_pretty(&summary.reports)?;
        std::fs::write(&path, json).map_err(|e| TripDataError::ReportWrite(path.clone(), e))?;
        info!("Wrote report to {}", path.display());
    }

    Ok(summary.all_ok)
}
