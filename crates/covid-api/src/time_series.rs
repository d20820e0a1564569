//! Handlers for `/time_series`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/time_series` | Filter parameters; `death` or `recovered` picks the metric |
//! | `POST` | `/time_series` | CSV body; `FileType: Confirmed\|Death\|Recovered` required |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::HeaderMap,
  response::Response,
};
use covid_core::{filter::compile, ingest::IngestSummary, report::MetricKind, store::ReportStore};

use crate::{error::ApiError, negotiate::respond};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /time_series[?death&country=..]`
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
  let series = store
    .time_series(&filter)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  respond(&headers, &series, |s| covid_csv::write_time_series(s, filter.display))
}

// ─── Create ───────────────────────────────────────────────────────────────────

fn file_type(headers: &HeaderMap) -> Result<MetricKind, ApiError> {
  headers
    .get("filetype")
    .ok_or_else(|| ApiError::BadRequest("missing FileType header".to_owned()))?
    .to_str()
    .map_err(|_| ApiError::BadRequest("FileType header is not text".to_owned()))?
    .parse()
    .map_err(ApiError::from)
}

/// `POST /time_series` with header `FileType: Confirmed` and a CSV body.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  headers: HeaderMap,
  body: String,
) -> Result<Json<IngestSummary>, ApiError>
where
  S: ReportStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let metric = file_type(&headers)?;
  let batch = covid_csv::parse_time_series(&body, metric)?;
  let summary = store
    .ingest_time_series(batch)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(summary))
}
