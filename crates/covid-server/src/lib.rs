//! Process wiring for the report server: configuration and the top-level
//! router.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use covid_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `COVID_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  pub store_path:   PathBuf,
  /// Largest accepted CSV upload, in bytes.
  pub upload_limit: usize,
}

/// Layer defaults, the optional TOML file at `path`, and the environment,
/// later sources winning.
pub fn load_config(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080_i64)?
    .set_default("store_path", "covid.sqlite3")?
    .set_default("upload_limit", covid_api::DEFAULT_UPLOAD_LIMIT as i64)?
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("COVID").try_parsing(true))
    .build()?
    .try_deserialize()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API router with request tracing.
pub fn app(store: SqliteStore, upload_limit: usize) -> Router {
  covid_api::api_router(Arc::new(store), upload_limit).layer(TraceLayer::new_for_http())
}
