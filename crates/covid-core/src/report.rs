//! Report records as they are read back out of the store.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};

use crate::{Error, address::Address};

// ─── Metric kind ─────────────────────────────────────────────────────────────

/// One of the independently tracked time-series counters.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
  #[default]
  Confirmed,
  Death,
  Recovered,
}

impl MetricKind {
  pub const ALL: [Self; 3] = [Self::Confirmed, Self::Death, Self::Recovered];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Confirmed => "confirmed",
      Self::Death => "death",
      Self::Recovered => "recovered",
    }
  }

  /// Capitalised name used for response keys and CSV headers.
  pub fn label(self) -> &'static str {
    match self {
      Self::Confirmed => "Confirmed",
      Self::Death => "Death",
      Self::Recovered => "Recovered",
    }
  }
}

impl fmt::Display for MetricKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

impl FromStr for MetricKind {
  type Err = Error;

  /// Case-insensitive; accepts the `FileType` header values.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| Error::UnknownMetric(s.to_owned()))
  }
}

// ─── Daily reports ───────────────────────────────────────────────────────────

/// The four counters carried by every daily snapshot row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Counters {
  pub confirmed: i64,
  pub death:     i64,
  pub recovered: i64,
  pub active:    i64,
}

/// One daily snapshot for one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyReport {
  #[serde(flatten)]
  pub address:  Address,
  #[serde(rename = "Date")]
  pub date:     NaiveDate,
  #[serde(flatten)]
  pub counters: Counters,
}

// ─── Time series ─────────────────────────────────────────────────────────────

/// All values of one metric for one address, keyed by day.
///
/// Serialises as the address fields plus one map named after the metric,
/// e.g. `"Death": {"2020-01-22": 3}`. When a display flag picked `Death` or
/// `Recovered`, the confirmed values travel alongside under `"Confirmed"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeries {
  pub address:   Address,
  pub metric:    MetricKind,
  pub values:    BTreeMap<NaiveDate, i64>,
  /// Confirmed values over the same dates; `None` when `metric` is already
  /// `Confirmed`.
  pub confirmed: Option<BTreeMap<NaiveDate, i64>>,
}

impl Serialize for TimeSeries {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(None)?;
    map.serialize_entry("id", &self.address.id)?;
    map.serialize_entry("Admin2", &self.address.admin2)?;
    map.serialize_entry("Province/State", &self.address.province)?;
    map.serialize_entry("Country/Region", &self.address.country)?;
    if let Some(confirmed) = &self.confirmed {
      map.serialize_entry(MetricKind::Confirmed.label(), confirmed)?;
    }
    map.serialize_entry(self.metric.label(), &self.values)?;
    map.end()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ontario() -> Address {
    Address {
      id:       7,
      admin2:   None,
      province: Some("Ontario".into()),
      country:  "Canada".into(),
    }
  }

  #[test]
  fn metric_kind_parses_case_insensitively() {
    assert_eq!("Confirmed".parse::<MetricKind>().unwrap(), MetricKind::Confirmed);
    assert_eq!("DEATH".parse::<MetricKind>().unwrap(), MetricKind::Death);
    assert_eq!(" recovered ".parse::<MetricKind>().unwrap(), MetricKind::Recovered);
    assert!(matches!("Active".parse::<MetricKind>(), Err(Error::UnknownMetric(_))));
    assert!("".parse::<MetricKind>().is_err());
  }

  #[test]
  fn daily_report_flattens_address_and_counters() {
    let report = DailyReport {
      address:  ontario(),
      date:     NaiveDate::from_ymd_opt(2021, 1, 20).unwrap(),
      counters: Counters { confirmed: 420, death: 69, recovered: 1337, active: 96 },
    };
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["id"], 7);
    assert_eq!(json["Province/State"], "Ontario");
    assert_eq!(json["Date"], "2021-01-20");
    assert_eq!(json["Confirmed"], 420);
    assert_eq!(json["Death"], 69);
    assert_eq!(json["Recovered"], 1337);
    assert_eq!(json["Active"], 96);
  }

  #[test]
  fn time_series_keys_values_by_metric_label() {
    let day = NaiveDate::from_ymd_opt(2020, 1, 22).unwrap();
    let series = TimeSeries {
      address:   ontario(),
      metric:    MetricKind::Confirmed,
      values:    BTreeMap::from([(day, 30)]),
      confirmed: None,
    };
    let json = serde_json::to_value(&series).unwrap();
    assert_eq!(json["Country/Region"], "Canada");
    assert_eq!(json["Confirmed"]["2020-01-22"], 30);
    assert!(json.get("Death").is_none());
  }

  #[test]
  fn flagged_metric_carries_confirmed_alongside() {
    let day = NaiveDate::from_ymd_opt(2020, 1, 22).unwrap();
    let series = TimeSeries {
      address:   ontario(),
      metric:    MetricKind::Death,
      values:    BTreeMap::from([(day, 3)]),
      confirmed: Some(BTreeMap::from([(day, 30)])),
    };
    let json = serde_json::to_value(&series).unwrap();
    assert_eq!(json["Death"]["2020-01-22"], 3);
    assert_eq!(json["Confirmed"]["2020-01-22"], 30);
    assert!(json.get("Recovered").is_none());
  }
}
