//! Error types for `covid-core`.
//!
//! Every variant is a caller mistake; the HTTP layer maps all of them to 400.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid date {0:?}: expected M/D/YY")]
  InvalidDate(String),

  #[error("unknown filter parameter: {0:?}")]
  UnknownParameter(String),

  #[error("`death` and `recovered` are mutually exclusive")]
  ConflictingDisplayModes,

  #[error("invalid id filter: {0:?}")]
  InvalidId(String),

  #[error("empty value for filter parameter {0:?}")]
  EmptyFilterValue(String),

  #[error("unknown metric kind: {0:?}")]
  UnknownMetric(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
