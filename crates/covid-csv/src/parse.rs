//! CSV upload → ingestion batch.
//!
//! Every row is validated before the batch is returned; the first bad row
//! fails the whole upload.

use chrono::NaiveDate;
use covid_core::{
  ingest::{DailyReportBatch, DailyReportRow, TimeSeriesBatch, TimeSeriesRow},
  report::{Counters, MetricKind},
};
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::{
  Error, Result,
  header::{
    AddressColumns, DailyColumns, ensure_unique_from, extract_date_range, int_cell, line_of,
    normalize,
  },
};

/// Read the header row and every data row of `input`.
fn read_all(input: &str) -> Result<(Vec<String>, Vec<StringRecord>)> {
  let mut reader = ReaderBuilder::new()
    .flexible(true)
    .trim(Trim::All)
    .from_reader(input.as_bytes());

  let header: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
  if header.iter().all(|h| h.trim().is_empty()) {
    return Err(Error::MissingHeader);
  }

  let records = reader.records().collect::<Result<Vec<_>, csv::Error>>()?;
  Ok((header, records))
}

pub(crate) fn daily_reports(input: &str, date: NaiveDate) -> Result<DailyReportBatch> {
  let (header, records) = read_all(input)?;
  let header: Vec<String> = header.iter().map(|h| normalize(h)).collect();
  let cols = DailyColumns::locate(&header)?;

  let rows = records
    .iter()
    .enumerate()
    .map(|(i, record)| -> Result<DailyReportRow> {
      let line = line_of(record, i as u64 + 2);
      Ok(DailyReportRow {
        address:  cols.address.key(record, line)?,
        counters: Counters {
          confirmed: int_cell(record, cols.confirmed, "Confirmed", line)?,
          death:     int_cell(record, cols.deaths, "Deaths", line)?,
          recovered: int_cell(record, cols.recovered, "Recovered", line)?,
          active:    int_cell(record, cols.active, "Active", line)?,
        },
      })
    })
    .collect::<Result<Vec<_>>>()?;

  Ok(DailyReportBatch { date, rows })
}

pub(crate) fn time_series(input: &str, metric: MetricKind) -> Result<TimeSeriesBatch> {
  let (header, records) = read_all(input)?;

  let range = extract_date_range(&header)?.ok_or(Error::NoDateColumns)?;
  ensure_unique_from(&header, range.begin_index)?;
  let days = range.day_columns(&header)?;

  let normalized: Vec<String> = header.iter().map(|h| normalize(h)).collect();
  let address = AddressColumns::locate(&normalized)?;

  let rows = records
    .iter()
    .enumerate()
    .map(|(i, record)| -> Result<TimeSeriesRow> {
      let line = line_of(record, i as u64 + 2);
      let values = days
        .iter()
        .map(|&(index, day)| Ok((day, int_cell(record, index, header[index].trim(), line)?)))
        .collect::<Result<Vec<(NaiveDate, i64)>>>()?;
      Ok(TimeSeriesRow { address: address.key(record, line)?, values })
    })
    .collect::<Result<Vec<_>>>()?;

  Ok(TimeSeriesBatch { metric, rows })
}

#[cfg(test)]
mod tests {
  use covid_core::address::{AddressKey, Field};

  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  const DAILY_HEADER: &str =
    "Admin2,Province_State,Country_Region,Confirmed,Deaths,Recovered,Active\n";

  // ── Daily reports ──────────────────────────────────────────────────────────

  #[test]
  fn daily_report_row_with_empty_admin2() {
    let input = format!("{DAILY_HEADER},Ontario,Canada,420,69,1337,96\n");
    let batch = daily_reports(&input, ymd(2021, 1, 20)).unwrap();

    assert_eq!(batch.date, ymd(2021, 1, 20));
    assert_eq!(batch.rows, vec![DailyReportRow {
      address:  AddressKey::new("Canada").with_admin2("").with_province("Ontario"),
      counters: Counters { confirmed: 420, death: 69, recovered: 1337, active: 96 },
    }]);
  }

  #[test]
  fn daily_report_header_is_case_insensitive_and_reorderable() {
    let input = "country/region,ACTIVE,deaths,Recovered,confirmed\nUS,1,2,3,4\n";
    let batch = daily_reports(input, ymd(2020, 3, 1)).unwrap();
    let row = &batch.rows[0];

    assert_eq!(row.address.admin2, Field::Absent);
    assert_eq!(row.address.province, Field::Absent);
    assert_eq!(row.address.country, "US");
    assert_eq!(row.counters, Counters { confirmed: 4, death: 2, recovered: 3, active: 1 });
  }

  #[test]
  fn daily_report_rejects_non_integer_counters() {
    let input = format!("{DAILY_HEADER}Autauga,Alabama,US,1,2,3,4\nBaldwin,Alabama,US,1,x,3,4\n");
    let err = daily_reports(&input, ymd(2020, 3, 1)).unwrap_err();
    assert!(
      matches!(err, Error::InvalidValue { line: 3, ref column, ref value } if column == "Deaths" && value == "x"),
      "{err}"
    );
  }

  #[test]
  fn daily_report_rejects_missing_country() {
    let input = format!("{DAILY_HEADER}Autauga,Alabama,,1,2,3,4\n");
    assert!(matches!(
      daily_reports(&input, ymd(2020, 3, 1)),
      Err(Error::MissingCountry { line: 2 })
    ));
  }

  #[test]
  fn daily_report_rejects_short_rows() {
    let input = format!("{DAILY_HEADER}Autauga,Alabama,US,1,2\n");
    assert!(matches!(daily_reports(&input, ymd(2020, 3, 1)), Err(Error::MissingValue { .. })));
  }

  #[test]
  fn empty_upload_has_no_header() {
    assert!(matches!(daily_reports("", ymd(2020, 3, 1)), Err(Error::MissingHeader)));
    assert!(matches!(time_series("", MetricKind::Confirmed), Err(Error::MissingHeader)));
  }

  // ── Time series ────────────────────────────────────────────────────────────

  #[test]
  fn time_series_reads_one_value_per_day() {
    let input = "Admin2,Province/State,Country/Region,1/31/20,2/1/20\n\
                 ,Ontario,Canada,42069,42070\n";
    let batch = time_series(input, MetricKind::Confirmed).unwrap();

    assert_eq!(batch.metric, MetricKind::Confirmed);
    assert_eq!(batch.rows.len(), 1);
    assert_eq!(
      batch.rows[0].address,
      AddressKey::new("Canada").with_admin2("").with_province("Ontario")
    );
    assert_eq!(batch.rows[0].values, vec![(ymd(2020, 1, 31), 42069), (ymd(2020, 2, 1), 42070)]);
  }

  #[test]
  fn time_series_ignores_extra_address_columns() {
    let input = "Province/State,Country/Region,Lat,Long,1/22/20,1/23/20\n\
                 ,Afghanistan,33.9,67.7,0,1\n";
    let batch = time_series(input, MetricKind::Death).unwrap();
    let row = &batch.rows[0];
    assert_eq!(row.address.admin2, Field::Absent);
    assert_eq!(row.address.province, Field::Present(String::new()));
    assert_eq!(row.values, vec![(ymd(2020, 1, 22), 0), (ymd(2020, 1, 23), 1)]);
  }

  #[test]
  fn time_series_rejects_duplicate_dates() {
    let input = "Admin2,Province/State,Country/Region,1/31/20,1/31/20\n,Ontario,Canada,42069,1337\n";
    assert!(matches!(
      time_series(input, MetricKind::Confirmed),
      Err(Error::DuplicateDateColumn(_))
    ));
  }

  #[test]
  fn time_series_rejects_invalid_header_date() {
    let input = "Admin2,Province/State,Country/Region,13/1/20\n,Ontario,Canada,42069,1337\n";
    assert!(matches!(time_series(input, MetricKind::Confirmed), Err(Error::Date(_))));
  }

  #[test]
  fn time_series_requires_date_columns() {
    let input = "Admin2,Province/State,Country/Region\n,Ontario,Canada\n";
    assert!(matches!(time_series(input, MetricKind::Confirmed), Err(Error::NoDateColumns)));
  }

  #[test]
  fn time_series_reports_first_bad_cell() {
    let input = "Country/Region,1/1/20,1/2/20\nCanada,1,2\nUS,3,\n";
    let err = time_series(input, MetricKind::Recovered).unwrap_err();
    assert!(
      matches!(err, Error::InvalidValue { line: 3, ref column, .. } if column == "1/2/20"),
      "{err}"
    );
  }
}
