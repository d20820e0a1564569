//! Response format selection.

use axum::{
  Json,
  http::{HeaderMap, header},
  response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::ApiError;

/// Whether any `Accept` header asks for `text/csv`.
pub fn wants_csv(headers: &HeaderMap) -> bool {
  headers
    .get_all(header::ACCEPT)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .any(|v| v.to_ascii_lowercase().contains("text/csv"))
}

/// Render `items` as JSON, or through `to_csv` when the client asked for CSV.
pub fn respond<T, F>(headers: &HeaderMap, items: &[T], to_csv: F) -> Result<Response, ApiError>
where
  T: Serialize,
  F: FnOnce(&[T]) -> covid_csv::Result<String>,
{
  if wants_csv(headers) {
    let body = to_csv(items)?;
    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body).into_response())
  } else {
    Ok(Json(items).into_response())
  }
}
