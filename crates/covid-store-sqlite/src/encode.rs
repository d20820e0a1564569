//! Encoding and decoding helpers between domain types and the plain
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD` text, which sorts and compares the same
//! way the calendar does.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use covid_core::{
  address::Address,
  filter::Value,
  report::{Counters, DailyReport, MetricKind, TimeSeries},
};
use rusqlite::types::Value as SqlValue;

use crate::{Error, Result};

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(date: NaiveDate) -> String { date.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Filter values ───────────────────────────────────────────────────────────

pub fn encode_value(value: &Value) -> SqlValue {
  match value {
    Value::Int(i) => SqlValue::Integer(*i),
    Value::Text(s) => SqlValue::Text(s.clone()),
    Value::Date(d) => SqlValue::Text(encode_date(*d)),
  }
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// An `addresses` row as read from SQLite.
pub struct RawAddress {
  pub id:       i64,
  pub admin2:   Option<String>,
  pub province: Option<String>,
  pub country:  String,
}

impl RawAddress {
  /// Columns in the order [`RawAddress::from_row`] expects, qualified with
  /// the `a` alias.
  pub const COLUMNS: &'static str = "a.id, a.admin2, a.address1, a.address2";

  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:       row.get(offset)?,
      admin2:   row.get(offset + 1)?,
      province: row.get(offset + 2)?,
      country:  row.get(offset + 3)?,
    })
  }

  pub fn into_address(self) -> Address {
    Address {
      id:       self.id,
      admin2:   self.admin2,
      province: self.province,
      country:  self.country,
    }
  }
}

/// A `daily_reports` row joined with its address.
pub struct RawDailyReport {
  pub address:  RawAddress,
  pub date:     String,
  pub counters: Counters,
}

impl RawDailyReport {
  pub fn into_report(self) -> Result<DailyReport> {
    Ok(DailyReport {
      address:  self.address.into_address(),
      date:     decode_date(&self.date)?,
      counters: self.counters,
    })
  }
}

/// One address's `(date, value)` rows from a `time_series_*` table, plus the
/// confirmed rows read alongside a flagged metric.
pub struct RawTimeSeries {
  pub address:   RawAddress,
  pub values:    Vec<(String, i64)>,
  pub confirmed: Option<Vec<(String, i64)>>,
}

fn decode_values(rows: Vec<(String, i64)>) -> Result<BTreeMap<NaiveDate, i64>> {
  rows
    .into_iter()
    .map(|(day, value)| decode_date(&day).map(|day| (day, value)))
    .collect()
}

impl RawTimeSeries {
  pub fn into_series(self, metric: MetricKind) -> Result<TimeSeries> {
    Ok(TimeSeries {
      address: self.address.into_address(),
      metric,
      values: decode_values(self.values)?,
      confirmed: self.confirmed.map(decode_values).transpose()?,
    })
  }
}
