//! Handlers for `/daily_reports`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/daily_reports` | Filter parameters; `Accept: text/csv` for CSV |
//! | `POST` | `/daily_reports` | CSV body; `Date: M/D/YY` header required |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::{HeaderMap, header},
  response::Response,
};
use chrono::NaiveDate;
use covid_core::{date::parse_date, filter::compile, ingest::IngestSummary, store::ReportStore};

use crate::{error::ApiError, negotiate::respond};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /daily_reports[?country=..&from=..]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<Vec<(String, String)>>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: ReportStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let filter = compile(params)?;
  let reports = store
    .daily_reports(&filter)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  respond(&headers, &reports, covid_csv::write_daily_reports)
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// The batch date every row of the upload is stamped with.
fn batch_date(headers: &HeaderMap) -> Result<NaiveDate, ApiError> {
  let raw = headers
    .get(header::DATE)
    .ok_or_else(|| ApiError::BadRequest("missing Date header".to_owned()))?
    .to_str()
    .map_err(|_| ApiError::BadRequest("Date header is not text".to_owned()))?;
  parse_date(raw.trim()).map_err(|e| ApiError::BadRequest(format!("Date header: {e}")))
}

/// `POST /daily_reports` with header `Date: 1/20/21` and a CSV body.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  headers: HeaderMap,
  body: String,
) -> Result<Json<IngestSummary>, ApiError>
where
  S: ReportStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let date = batch_date(&headers)?;
  let batch = covid_csv::parse_daily_reports(&body, date)?;
  let summary = store
    .ingest_daily_reports(batch)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(summary))
}
