//! Header-row interpretation.
//!
//! Columns are located by name, never by fixed position: uploads from
//! different sources order and spell their columns differently.

use chrono::{Days, NaiveDate};
use covid_core::{
  address::AddressKey,
  date::{looks_like_date, parse_date},
};
use csv::StringRecord;

use crate::{Error, Result};

/// Lower-cased, trimmed, BOM-stripped header name.
pub(crate) fn normalize(name: &str) -> String {
  name.trim_start_matches('\u{feff}').trim().to_ascii_lowercase()
}

fn position(header: &[String], names: &[&str]) -> Option<usize> {
  header.iter().position(|h| names.contains(&h.as_str()))
}

// ─── Row access ──────────────────────────────────────────────────────────────

pub(crate) fn line_of(record: &StringRecord, fallback: u64) -> u64 {
  record.position().map_or(fallback, |p| p.line())
}

pub(crate) fn cell<'r>(
  record: &'r StringRecord,
  index: usize,
  column: &str,
  line: u64,
) -> Result<&'r str> {
  record.get(index).ok_or_else(|| Error::MissingValue { line, column: column.to_owned() })
}

pub(crate) fn int_cell(record: &StringRecord, index: usize, column: &str, line: u64) -> Result<i64> {
  let raw = cell(record, index, column, line)?;
  raw.parse().map_err(|_| Error::InvalidValue {
    line,
    column: column.to_owned(),
    value:  raw.to_owned(),
  })
}

// ─── Address columns ─────────────────────────────────────────────────────────

/// Where the address parts live in an upload, if they are there at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressColumns {
  pub admin2:   Option<usize>,
  pub province: Option<usize>,
  pub country:  usize,
}

impl AddressColumns {
  /// Locate the address columns in a normalised header. Only the country
  /// column is mandatory.
  pub(crate) fn locate(header: &[String]) -> Result<Self> {
    Ok(Self {
      admin2:   position(header, &["admin2"]),
      province: position(header, &["province_state", "province/state"]),
      country:  position(header, &["country_region", "country/region"])
        .ok_or(Error::MissingColumn("Country_Region"))?,
    })
  }

  /// Build the candidate key for one data row. Columns the header never
  /// declared stay [`Field::Absent`](covid_core::address::Field::Absent).
  pub(crate) fn key(&self, record: &StringRecord, line: u64) -> Result<AddressKey> {
    let country = cell(record, self.country, "Country_Region", line)?;
    if country.is_empty() {
      return Err(Error::MissingCountry { line });
    }

    let mut key = AddressKey::new(country);
    if let Some(i) = self.admin2 {
      key = key.with_admin2(cell(record, i, "Admin2", line)?);
    }
    if let Some(i) = self.province {
      key = key.with_province(cell(record, i, "Province_State", line)?);
    }
    Ok(key)
  }
}

// ─── Daily-report columns ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DailyColumns {
  pub address:   AddressColumns,
  pub confirmed: usize,
  pub deaths:    usize,
  pub recovered: usize,
  pub active:    usize,
}

impl DailyColumns {
  pub(crate) fn locate(header: &[String]) -> Result<Self> {
    let required = |name: &'static str, key: &str| {
      position(header, &[key]).ok_or(Error::MissingColumn(name))
    };
    Ok(Self {
      address:   AddressColumns::locate(header)?,
      confirmed: required("Confirmed", "confirmed")?,
      deaths:    required("Deaths", "deaths")?,
      recovered: required("Recovered", "recovered")?,
      active:    required("Active", "active")?,
    })
  }
}

// ─── Date range ──────────────────────────────────────────────────────────────

/// The block of date columns in a time-series header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
  pub begin:       NaiveDate,
  pub end:         NaiveDate,
  /// Column index of `begin`.
  pub begin_index: usize,
  /// Column index of `end`.
  pub end_index:   usize,
}

/// Find the first and last date-shaped columns of `header`.
///
/// Returns `Ok(None)` when no column looks like a date. A column that looks
/// like a date but is out of range (`13/1/20`) is an error.
pub fn extract_date_range<S: AsRef<str>>(header: &[S]) -> Result<Option<DateRange>> {
  let is_date = |h: &S| looks_like_date(h.as_ref().trim());

  let Some(begin_index) = header.iter().position(is_date) else {
    return Ok(None);
  };
  let end_index = header.iter().rposition(is_date).unwrap_or(begin_index);

  Ok(Some(DateRange {
    begin: parse_date(header[begin_index].as_ref().trim())?,
    end: parse_date(header[end_index].as_ref().trim())?,
    begin_index,
    end_index,
  }))
}

/// Reject a header that repeats any column name from `begin_index` onward.
pub fn ensure_unique_from<S: AsRef<str>>(header: &[S], begin_index: usize) -> Result<()> {
  let mut seen = std::collections::HashSet::new();
  for name in header.iter().skip(begin_index) {
    let name = name.as_ref().trim();
    if !seen.insert(name) {
      return Err(Error::DuplicateDateColumn(name.to_owned()));
    }
  }
  Ok(())
}

impl DateRange {
  /// Number of days covered, inclusive of both ends.
  pub fn day_count(&self) -> usize {
    usize::try_from((self.end - self.begin).num_days() + 1).unwrap_or(0)
  }

  /// Pair each day from `begin` to `end` with its column, checking that the
  /// header really holds one column per consecutive day.
  pub fn day_columns<S: AsRef<str>>(&self, header: &[S]) -> Result<Vec<(usize, NaiveDate)>> {
    let mut columns = Vec::with_capacity(self.day_count());
    let mut expected = self.begin;

    for index in self.begin_index..=self.end_index {
      let found = header.get(index).map_or("", |h| h.as_ref().trim());
      let matches = looks_like_date(found) && parse_date(found).ok() == Some(expected);
      if !matches {
        return Err(Error::NonConsecutiveDates { index, expected, found: found.to_owned() });
      }
      columns.push((index, expected));
      expected = expected.checked_add_days(Days::new(1)).unwrap_or(expected);
    }

    Ok(columns)
  }
}
