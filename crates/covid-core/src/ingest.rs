//! Ingestion batches and the bookkeeping returned after reconciling them.
//!
//! A batch is the fully parsed and validated content of one upload. Nothing
//! is written until a whole batch has been built, so a malformed row never
//! leaves half an upload behind.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{address::AddressKey, report::{Counters, MetricKind}};

// ─── Batches ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyReportRow {
  pub address:  AddressKey,
  pub counters: Counters,
}

/// A daily-report upload: every row shares the batch date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyReportBatch {
  pub date: NaiveDate,
  pub rows: Vec<DailyReportRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesRow {
  pub address: AddressKey,
  /// One value per day, in header order.
  pub values:  Vec<(NaiveDate, i64)>,
}

/// A time-series upload for a single metric kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesBatch {
  pub metric: MetricKind,
  pub rows:   Vec<TimeSeriesRow>,
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// What reconciling one `(address, date)` key did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
  /// No row existed for the key.
  Inserted,
  /// A row existed with different values and was overwritten.
  Replaced,
  /// A row existed with identical values; nothing was written.
  Unchanged,
}

/// The result of resolving an [`AddressKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAddress {
  pub id:      i64,
  pub created: bool,
}

/// Totals reported back to the uploader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
  pub rows:              usize,
  pub addresses_created: usize,
  pub inserted:          usize,
  pub replaced:          usize,
  pub unchanged:         usize,
}

impl IngestSummary {
  pub fn record_address(&mut self, resolved: ResolvedAddress) {
    self.rows += 1;
    if resolved.created {
      self.addresses_created += 1;
    }
  }

  pub fn record(&mut self, outcome: UpsertOutcome) {
    match outcome {
      UpsertOutcome::Inserted => self.inserted += 1,
      UpsertOutcome::Replaced => self.replaced += 1,
      UpsertOutcome::Unchanged => self.unchanged += 1,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn summary_counts_rows_and_outcomes() {
    let mut summary = IngestSummary::default();
    summary.record_address(ResolvedAddress { id: 1, created: true });
    summary.record(UpsertOutcome::Inserted);
    summary.record(UpsertOutcome::Inserted);
    summary.record_address(ResolvedAddress { id: 1, created: false });
    summary.record(UpsertOutcome::Replaced);
    summary.record(UpsertOutcome::Unchanged);

    assert_eq!(summary, IngestSummary {
      rows:              2,
      addresses_created: 1,
      inserted:          2,
      replaced:          1,
      unchanged:         1,
    });
  }
}
