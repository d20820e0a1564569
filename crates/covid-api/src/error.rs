//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("could not encode response: {0}")]
  Encode(String),
}

impl From<covid_core::Error> for ApiError {
  fn from(e: covid_core::Error) -> Self { ApiError::BadRequest(e.to_string()) }
}

impl From<covid_csv::Error> for ApiError {
  fn from(e: covid_csv::Error) -> Self {
    if e.is_input_error() {
      ApiError::BadRequest(e.to_string())
    } else {
      ApiError::Encode(e.to_string())
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::BadRequest(m) => {
        tracing::warn!(reason = %m, "rejected request");
        (StatusCode::BAD_REQUEST, m.clone())
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
      ApiError::Encode(m) => {
        tracing::error!(error = %m, "response encoding failure");
        (StatusCode::INTERNAL_SERVER_ERROR, m.clone())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
