//! The `ReportStore` trait.
//!
//! Implemented by storage backends (e.g. `covid-store-sqlite`). The HTTP
//! layer depends on this abstraction, not on any concrete backend; the
//! backend handle is constructed once at startup and passed in explicitly.

use std::future::Future;

use crate::{
  address::AddressKey,
  filter::ReportFilter,
  ingest::{DailyReportBatch, IngestSummary, ResolvedAddress, TimeSeriesBatch},
  report::{DailyReport, TimeSeries},
};

/// Abstraction over a report store backend.
///
/// Every write method is atomic: either the whole call lands or none of it
/// does. Resolving an address and replacing an `(address, date)` row never
/// interleave with another writer.
pub trait ReportStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Find the address matching `key` on the parts it declares, creating it
  /// if none exists.
  fn resolve_address(
    &self,
    key: AddressKey,
  ) -> impl Future<Output = Result<ResolvedAddress, Self::Error>> + Send + '_;

  /// Reconcile a daily-report upload: one row per `(address, batch date)`.
  fn ingest_daily_reports(
    &self,
    batch: DailyReportBatch,
  ) -> impl Future<Output = Result<IngestSummary, Self::Error>> + Send + '_;

  /// Reconcile a time-series upload into its metric kind's table.
  fn ingest_time_series(
    &self,
    batch: TimeSeriesBatch,
  ) -> impl Future<Output = Result<IngestSummary, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Daily reports matching the filter's address and date clauses, ordered
  /// by address id then date.
  fn daily_reports<'a>(
    &'a self,
    filter: &'a ReportFilter,
  ) -> impl Future<Output = Result<Vec<DailyReport>, Self::Error>> + Send + 'a;

  /// One series per matching address for `filter.display`, restricted to
  /// the filter's date clauses. Addresses left with no values are omitted.
  fn time_series<'a>(
    &'a self,
    filter: &'a ReportFilter,
  ) -> impl Future<Output = Result<Vec<TimeSeries>, Self::Error>> + Send + 'a;
}
