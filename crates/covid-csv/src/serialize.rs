//! Read results → CSV response bodies.

use covid_core::{
  date::format_slashed,
  report::{DailyReport, MetricKind, TimeSeries},
};
use csv::Writer;

use crate::{Error, Result};

pub(crate) const DAILY_REPORT_HEADER: [&str; 9] = [
  "ID",
  "Date",
  "Admin2",
  "Province/State",
  "Country/Region",
  "Confirmed",
  "Death",
  "Recovered",
  "Active",
];

fn encode_err(e: csv::Error) -> Error { Error::Encode(e.to_string()) }

fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
  let bytes = writer.into_inner().map_err(|e| Error::Encode(e.to_string()))?;
  String::from_utf8(bytes).map_err(|e| Error::Encode(e.to_string()))
}

pub(crate) fn daily_reports(reports: &[DailyReport]) -> Result<String> {
  let mut writer = Writer::from_writer(Vec::new());
  writer.write_record(DAILY_REPORT_HEADER).map_err(encode_err)?;

  for r in reports {
    writer
      .write_record([
        r.address.id.to_string(),
        format_slashed(r.date),
        r.address.admin2.clone().unwrap_or_default(),
        r.address.province.clone().unwrap_or_default(),
        r.address.country.clone(),
        r.counters.confirmed.to_string(),
        r.counters.death.to_string(),
        r.counters.recovered.to_string(),
        r.counters.active.to_string(),
      ])
      .map_err(encode_err)?;
  }

  finish(writer)
}

pub(crate) fn time_series(series: &[TimeSeries], metric: MetricKind) -> Result<String> {
  let mut writer = Writer::from_writer(Vec::new());
  writer
    .write_record(["ID", "Address", "Date", metric.label()])
    .map_err(encode_err)?;

  for s in series {
    let id = s.address.id.to_string();
    let label = s.address.label();
    for (day, value) in &s.values {
      let day = format_slashed(*day);
      let value = value.to_string();
      writer
        .write_record([id.as_str(), label.as_str(), day.as_str(), value.as_str()])
        .map_err(encode_err)?;
    }
  }

  finish(writer)
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use chrono::NaiveDate;
  use covid_core::{address::Address, report::Counters};

  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn address(id: i64, admin2: Option<&str>, province: Option<&str>, country: &str) -> Address {
    Address {
      id,
      admin2: admin2.map(str::to_owned),
      province: province.map(str::to_owned),
      country: country.to_owned(),
    }
  }

  #[test]
  fn daily_report_csv_has_fixed_header() {
    let out = daily_reports(&[]).unwrap();
    assert_eq!(
      out.lines().next().unwrap(),
      "ID,Date,Admin2,Province/State,Country/Region,Confirmed,Death,Recovered,Active"
    );
    assert_eq!(out.lines().count(), 1);
  }

  #[test]
  fn daily_report_csv_rows() {
    let report = DailyReport {
      address:  address(1, None, Some("Ontario"), "Canada"),
      date:     ymd(2021, 1, 20),
      counters: Counters { confirmed: 420, death: 69, recovered: 1337, active: 96 },
    };
    let out = daily_reports(&[report]).unwrap();
    assert_eq!(out.lines().nth(1).unwrap(), "1,2021/01/20,,Ontario,Canada,420,69,1337,96");
  }

  #[test]
  fn time_series_csv_header_follows_metric() {
    let out = time_series(&[], MetricKind::Confirmed).unwrap();
    assert_eq!(out.lines().next().unwrap(), "ID,Address,Date,Confirmed");
    let out = time_series(&[], MetricKind::Death).unwrap();
    assert_eq!(out.lines().next().unwrap(), "ID,Address,Date,Death");
  }

  #[test]
  fn time_series_csv_one_line_per_day() {
    let series = TimeSeries {
      address:   address(4, Some("Autauga"), Some("Alabama"), "US"),
      metric:    MetricKind::Recovered,
      values:    BTreeMap::from([(ymd(2021, 10, 31), 30), (ymd(2021, 11, 1), 31)]),
      confirmed: Some(BTreeMap::from([(ymd(2021, 10, 31), 90)])),
    };
    let out = time_series(&[series], MetricKind::Recovered).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines, [
      "ID,Address,Date,Recovered",
      "4,\"Autauga, Alabama, US\",2021/10/31,30",
      "4,\"Autauga, Alabama, US\",2021/11/01,31",
    ]);
  }
}
