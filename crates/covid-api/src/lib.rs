//! HTTP API for daily reports and time series.
//!
//! Exposes an axum [`Router`] backed by any [`covid_core::store::ReportStore`].
//! Uploads are CSV; reads return JSON, or CSV when the client sends
//! `Accept: text/csv`. Tracing, TLS, and listener setup are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = covid_api::api_router(Arc::new(store), covid_api::DEFAULT_UPLOAD_LIMIT);
//! ```

pub mod daily_reports;
pub mod error;
pub mod negotiate;
pub mod time_series;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, routing::get};
use covid_core::store::ReportStore;

pub use error::ApiError;

/// Upload size cap used when the caller has no preference: 256 MiB, well
/// above the largest published time-series files.
pub const DEFAULT_UPLOAD_LIMIT: usize = 256 * 1024 * 1024;

/// Build a fully-materialised API router for `store`, accepting CSV uploads
/// of up to `upload_limit` bytes.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, upload_limit: usize) -> Router<()>
where
  S: ReportStore + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .route("/daily_reports", get(daily_reports::list::<S>).post(daily_reports::create::<S>))
    .route("/time_series", get(time_series::list::<S>).post(time_series::create::<S>))
    .layer(DefaultBodyLimit::max(upload_limit))
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use covid_store_sqlite::SqliteStore;
  use serde_json::Value;
  use tower::ServiceExt as _;

  use super::*;

  const DAILY_CSV: &str = "Admin2,Province_State,Country_Region,Confirmed,Deaths,Recovered,Active\n\
                           ,Ontario,Canada,420,69,1337,96\n";

  const SERIES_CSV: &str = "Admin2,Province/State,Country/Region,1/31/20,2/1/20\n\
                            ,Ontario,Canada,42069,42070\n";

  async fn app() -> Router {
    app_with_limit(DEFAULT_UPLOAD_LIMIT).await
  }

  async fn app_with_limit(upload_limit: usize) -> Router {
    let store = SqliteStore::open_in_memory().await.unwrap();
    api_router(Arc::new(store), upload_limit)
  }

  /// A valid time-series upload of at least `min_bytes`, padded through a
  /// column the parser ignores.
  fn large_series_csv(min_bytes: usize) -> String {
    let padding = "x".repeat(1000);
    let mut csv = String::from("Province/State,Country/Region,Notes,1/22/20,1/23/20\n");
    let mut row = 0;
    while csv.len() < min_bytes {
      csv.push_str(&format!("P{row},Canada,{padding},{row},{}\n", row + 1));
      row += 1;
    }
    csv
  }

  async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    headers: Vec<(&str, &str)>,
    body: &str,
  ) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = builder.body(Body::from(body.to_owned())).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
  }

  async fn get_json(app: &Router, uri: &str) -> Value {
    let (status, body) = send(app, "GET", uri, vec![], "").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    serde_json::from_str(&body).unwrap()
  }

  async fn error_message(
    app: &Router,
    method: &str,
    uri: &str,
    headers: Vec<(&str, &str)>,
    body: &str,
  ) -> String {
    let (status, body) = send(app, method, uri, headers, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    let json: Value = serde_json::from_str(&body).unwrap();
    json["error"].as_str().unwrap().to_owned()
  }

  // ── Daily reports ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn posted_daily_report_is_read_back() {
    let app = app().await;
    let (status, body) = send(&app, "POST", "/daily_reports", vec![("Date", "1/20/21")], DAILY_CSV).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let summary: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(summary["rows"], 1);
    assert_eq!(summary["inserted"], 1);

    let all = get_json(&app, "/daily_reports").await;
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["Province/State"], "Ontario");
    assert_eq!(all[0]["Country/Region"], "Canada");
    assert_eq!(all[0]["Admin2"], Value::Null);
    assert_eq!(all[0]["Date"], "2021-01-20");
    assert_eq!(all[0]["Confirmed"], 420);
    assert_eq!(all[0]["Active"], 96);
  }

  #[tokio::test]
  async fn reposting_the_same_daily_report_adds_nothing() {
    let app = app().await;
    send(&app, "POST", "/daily_reports", vec![("Date", "1/20/21")], DAILY_CSV).await;
    let (status, body) = send(&app, "POST", "/daily_reports", vec![("Date", "1/20/21")], DAILY_CSV).await;
    assert_eq!(status, StatusCode::OK);
    let summary: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(summary["unchanged"], 1);
    assert_eq!(summary["addresses_created"], 0);

    let all = get_json(&app, "/daily_reports").await;
    assert_eq!(all.as_array().unwrap().len(), 1);
    assert_eq!(all[0]["Confirmed"], 420);
  }

  #[tokio::test]
  async fn daily_report_filters_combine_or_groups() {
    let app = app().await;
    let csv = "Admin2,Province_State,Country_Region,Confirmed,Deaths,Recovered,Active\n\
               ,Ontario,Canada,1,0,0,1\n\
               Autauga,Alabama,US,2,0,0,2\n\
               ,,France,3,0,0,3\n";
    send(&app, "POST", "/daily_reports", vec![("Date", "3/1/20")], csv).await;
    send(&app, "POST", "/daily_reports", vec![("Date", "12/31/19")], csv).await;

    let found = get_json(&app, "/daily_reports?country=canada,us&from=1/1/20").await;
    let found = found.as_array().unwrap();
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|r| r["Date"] == "2020-03-01"));

    // Repeated and differently cased names merge into one group.
    let found = get_json(&app, "/daily_reports?Country=canada&COUNTRY=france&date=3/1/20").await;
    assert_eq!(found.as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn daily_report_csv_when_accepted() {
    let app = app().await;
    send(&app, "POST", "/daily_reports", vec![("Date", "1/20/21")], DAILY_CSV).await;

    let (status, body) = send(&app, "GET", "/daily_reports", vec![("Accept", "text/csv")], "").await;
    assert_eq!(status, StatusCode::OK);
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines, [
      "ID,Date,Admin2,Province/State,Country/Region,Confirmed,Death,Recovered,Active",
      "1,2021/01/20,,Ontario,Canada,420,69,1337,96",
    ]);
  }

  #[tokio::test]
  async fn daily_report_upload_needs_a_valid_date_header() {
    let app = app().await;
    error_message(&app, "POST", "/daily_reports", vec![], DAILY_CSV).await;
    error_message(&app, "POST", "/daily_reports", vec![("Date", "1/20/2021")], DAILY_CSV).await;
    error_message(&app, "POST", "/daily_reports", vec![("Date", "13/1/20")], DAILY_CSV).await;

    assert_eq!(get_json(&app, "/daily_reports").await.as_array().unwrap().len(), 0);
  }

  #[tokio::test]
  async fn bad_row_rejects_whole_upload() {
    let app = app().await;
    let csv = "Admin2,Province_State,Country_Region,Confirmed,Deaths,Recovered,Active\n\
               ,Ontario,Canada,1,0,0,1\n\
               ,Quebec,Canada,x,0,0,1\n";
    let message = error_message(&app, "POST", "/daily_reports", vec![("Date", "3/1/20")], csv).await;
    assert!(message.contains("line 3"), "{message}");
    assert_eq!(get_json(&app, "/daily_reports").await.as_array().unwrap().len(), 0);
  }

  // ── Filters ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn invalid_filters_are_rejected() {
    let app = app().await;
    for uri in [
      "/daily_reports?asd=1",
      "/daily_reports?death&recovered",
      "/daily_reports?from=13/1/20",
      "/daily_reports?id=abc",
      "/time_series?country=us&bogus=1",
      "/time_series?death&recovered",
    ] {
      let (status, body) = send(&app, "GET", uri, vec![], "").await;
      assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}: {body}");
    }
  }

  // ── Time series ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn posted_time_series_is_read_back() {
    let app = app().await;
    let (status, body) = send(&app, "POST", "/time_series", vec![("FileType", "confirmed")], SERIES_CSV).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let all = get_json(&app, "/time_series").await;
    assert_eq!(all.as_array().unwrap().len(), 1);
    assert_eq!(all[0]["Province/State"], "Ontario");
    assert_eq!(all[0]["Confirmed"]["2020-01-31"], 42069);
    assert_eq!(all[0]["Confirmed"]["2020-02-01"], 42070);

    // Nothing was uploaded for deaths.
    assert_eq!(get_json(&app, "/time_series?death").await.as_array().unwrap().len(), 0);
  }

  #[tokio::test]
  async fn time_series_display_flag_selects_metric() {
    let app = app().await;
    send(&app, "POST", "/time_series", vec![("FileType", "Confirmed")], SERIES_CSV).await;
    let deaths = "Admin2,Province/State,Country/Region,1/31/20\n,Ontario,Canada,7\n";
    send(&app, "POST", "/time_series", vec![("FileType", "Death")], deaths).await;

    let found = get_json(&app, "/time_series?death&to=1/31/20").await;
    assert_eq!(found[0]["Death"]["2020-01-31"], 7);
    // Confirmed values ride along, restricted to the same dates.
    assert_eq!(found[0]["Confirmed"]["2020-01-31"], 42069);
    assert!(found[0]["Confirmed"].get("2020-02-01").is_none());
    assert!(found[0].get("Recovered").is_none());

    let found = get_json(&app, "/time_series").await;
    assert!(found[0].get("Death").is_none());
  }

  #[tokio::test]
  async fn uploads_larger_than_two_megabytes_are_ingested() {
    let app = app().await;
    let csv = large_series_csv(3 * 1024 * 1024);
    let rows = csv.lines().count() - 1;

    let (status, body) = send(&app, "POST", "/time_series", vec![("FileType", "Confirmed")], &csv).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let summary: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(summary["rows"], rows);
    assert_eq!(summary["inserted"], rows * 2);
  }

  #[tokio::test]
  async fn uploads_over_the_configured_limit_are_refused() {
    let app = app_with_limit(64 * 1024).await;
    let csv = large_series_csv(128 * 1024);
    let (status, _) = send(&app, "POST", "/time_series", vec![("FileType", "Confirmed")], &csv).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(get_json(&app, "/time_series").await.as_array().unwrap().len(), 0);
  }

  #[tokio::test]
  async fn time_series_csv_when_accepted() {
    let app = app().await;
    send(&app, "POST", "/time_series", vec![("FileType", "Confirmed")], SERIES_CSV).await;

    let (status, body) =
      send(&app, "GET", "/time_series?from=2/1/20", vec![("Accept", "text/csv")], "").await;
    assert_eq!(status, StatusCode::OK);
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines, ["ID,Address,Date,Confirmed", "1,\"Ontario, Canada\",2020/02/01,42070"]);
  }

  #[tokio::test]
  async fn time_series_upload_needs_a_metric_file_type() {
    let app = app().await;
    error_message(&app, "POST", "/time_series", vec![], SERIES_CSV).await;
    error_message(&app, "POST", "/time_series", vec![("FileType", "Active")], SERIES_CSV).await;
  }

  #[tokio::test]
  async fn time_series_header_problems_are_bad_requests() {
    let app = app().await;
    let file_type = vec![("FileType", "Confirmed")];
    for csv in [
      "Admin2,Province/State,Country/Region,1/31/20,1/31/20\n,Ontario,Canada,42069,1337\n",
      "Admin2,Province/State,Country/Region,13/1/20\n,Ontario,Canada,42069\n",
      "Admin2,Province/State,Country/Region\n,Ontario,Canada\n",
      "Admin2,Province/State,Country/Region,1/1/20,1/3/20\n,Ontario,Canada,1,2\n",
    ] {
      error_message(&app, "POST", "/time_series", file_type.clone(), csv).await;
    }
    assert_eq!(get_json(&app, "/time_series").await.as_array().unwrap().len(), 0);
  }

  #[tokio::test]
  async fn empty_upload_is_rejected() {
    let app = app().await;
    let message =
      error_message(&app, "POST", "/time_series", vec![("FileType", "Confirmed")], "").await;
    assert!(message.contains("header"), "{message}");
  }

  #[tokio::test]
  async fn time_series_and_daily_reports_share_addresses() {
    let app = app().await;
    send(&app, "POST", "/daily_reports", vec![("Date", "1/20/21")], DAILY_CSV).await;
    send(&app, "POST", "/time_series", vec![("FileType", "Recovered")], SERIES_CSV).await;

    let daily = get_json(&app, "/daily_reports").await;
    let series = get_json(&app, "/time_series?recovered").await;
    assert_eq!(daily[0]["id"], series[0]["id"]);
  }
}
