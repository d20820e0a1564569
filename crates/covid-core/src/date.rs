//! `M/D/YY` date tokens, as used in upload headers and filter values.
//!
//! The year is always two digits and lands in the 2000s. Parsed values are
//! plain calendar days; there is no time-of-day component anywhere in the
//! system.

use chrono::NaiveDate;

use crate::{Error, Result};

/// Parse a `month/day/year` token with a two-digit year.
///
/// Rejects anything that does not split into exactly three numeric parts,
/// months outside `1..=12`, days outside `1..=31`, years above `99`, and
/// days that do not exist in the given month (`2/30/20`).
pub fn parse_date(input: &str) -> Result<NaiveDate> {
  let invalid = || Error::InvalidDate(input.to_owned());

  let parts: Vec<&str> = input.split('/').collect();
  let [month, day, year] = parts.as_slice() else {
    return Err(invalid());
  };

  let month: u32 = parse_component(month).ok_or_else(invalid)?;
  let day: u32 = parse_component(day).ok_or_else(invalid)?;
  let year: i32 = parse_component(year)
    .and_then(|y: u32| i32::try_from(y).ok())
    .ok_or_else(invalid)?;

  if month > 12 || day > 31 || year > 99 {
    return Err(invalid());
  }

  NaiveDate::from_ymd_opt(2000 + year, month, day).ok_or_else(invalid)
}

/// Whether `token` has the shape of a date: three `/`-separated runs of
/// ASCII digits. Says nothing about whether the values are in range.
pub fn looks_like_date(token: &str) -> bool {
  let parts: Vec<&str> = token.split('/').collect();
  parts.len() == 3
    && parts
      .iter()
      .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

/// `YYYY/MM/DD`, the date layout used in CSV responses.
pub fn format_slashed(date: NaiveDate) -> String {
  date.format("%Y/%m/%d").to_string()
}

fn parse_component<T: std::str::FromStr>(s: &str) -> Option<T> {
  if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  s.parse().ok()
}
