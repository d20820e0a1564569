//! Error types for the covid-csv codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("upload has no header row")]
  MissingHeader,

  #[error("missing required column {0:?}")]
  MissingColumn(&'static str),

  #[error("header has no date columns")]
  NoDateColumns,

  #[error("duplicate column {0:?} in date range")]
  DuplicateDateColumn(String),

  #[error("date columns must be consecutive days: expected {expected} at column {index}, found {found:?}")]
  NonConsecutiveDates {
    index:    usize,
    expected: chrono::NaiveDate,
    found:    String,
  },

  #[error(transparent)]
  Date(#[from] covid_core::Error),

  #[error("line {line}: missing value for column {column:?}")]
  MissingValue { line: u64, column: String },

  #[error("line {line}: invalid value {value:?} for column {column:?}")]
  InvalidValue {
    line:   u64,
    column: String,
    value:  String,
  },

  #[error("line {line}: country is required")]
  MissingCountry { line: u64 },

  #[error("failed to encode csv: {0}")]
  Encode(String),
}

impl Error {
  /// Whether the error describes a bad upload rather than a failure on our
  /// side.
  pub fn is_input_error(&self) -> bool { !matches!(self, Self::Encode(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
