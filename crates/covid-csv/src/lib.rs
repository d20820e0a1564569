//! CSV codec for epidemiological report uploads and responses.
//!
//! Converts between CSV text and [`covid_core`] types. Pure synchronous; no
//! HTTP or database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use covid_core::report::MetricKind;
//!
//! let body = "Province/State,Country/Region,1/22/20,1/23/20\n,Canada,1,2\n";
//! let batch = covid_csv::parse_time_series(body, MetricKind::Confirmed).unwrap();
//! println!("{} rows", batch.rows.len());
//! ```

pub mod error;
mod header;
mod parse;
mod serialize;

use chrono::NaiveDate;
use covid_core::{
  ingest::{DailyReportBatch, TimeSeriesBatch},
  report::{DailyReport, MetricKind, TimeSeries},
};

pub use error::{Error, Result};
pub use header::{DateRange, ensure_unique_from, extract_date_range};

/// Parse a daily-report upload. Every row is stamped with `date`, the batch
/// date supplied alongside the upload.
pub fn parse_daily_reports(input: &str, date: NaiveDate) -> Result<DailyReportBatch> {
  parse::daily_reports(input, date)
}

/// Parse a time-series upload for one metric kind.
///
/// The header must hold a single block of consecutive `M/D/YY` date columns
/// with no repeated names.
pub fn parse_time_series(input: &str, metric: MetricKind) -> Result<TimeSeriesBatch> {
  parse::time_series(input, metric)
}

/// Encode daily reports with the fixed
/// `ID,Date,Admin2,Province/State,Country/Region,Confirmed,Death,Recovered,Active`
/// header.
pub fn write_daily_reports(reports: &[DailyReport]) -> Result<String> {
  serialize::daily_reports(reports)
}

/// Encode time series as one `ID,Address,Date,<metric>` line per day.
pub fn write_time_series(series: &[TimeSeries], metric: MetricKind) -> Result<String> {
  serialize::time_series(series, metric)
}
