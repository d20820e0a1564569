//! SQL schema for the report store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

use covid_core::report::MetricKind;

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Rows are created on first sighting and never updated or deleted.
CREATE TABLE IF NOT EXISTS addresses (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    admin2    TEXT COLLATE NOCASE,
    address1  TEXT COLLATE NOCASE,            -- province / state
    address2  TEXT NOT NULL COLLATE NOCASE    -- country / region
);

CREATE TABLE IF NOT EXISTS daily_reports (
    address_id  INTEGER NOT NULL REFERENCES addresses(id),
    date        TEXT NOT NULL,                -- YYYY-MM-DD
    confirmed   INTEGER NOT NULL,
    death       INTEGER NOT NULL,
    recovered   INTEGER NOT NULL,
    active      INTEGER NOT NULL,
    PRIMARY KEY (address_id, date)
);

CREATE TABLE IF NOT EXISTS time_series_confirmed (
    address_id  INTEGER NOT NULL REFERENCES addresses(id),
    date        TEXT NOT NULL,
    value       INTEGER NOT NULL,
    PRIMARY KEY (address_id, date)
);

CREATE TABLE IF NOT EXISTS time_series_death (
    address_id  INTEGER NOT NULL REFERENCES addresses(id),
    date        TEXT NOT NULL,
    value       INTEGER NOT NULL,
    PRIMARY KEY (address_id, date)
);

CREATE TABLE IF NOT EXISTS time_series_recovered (
    address_id  INTEGER NOT NULL REFERENCES addresses(id),
    date        TEXT NOT NULL,
    value       INTEGER NOT NULL,
    PRIMARY KEY (address_id, date)
);

CREATE INDEX IF NOT EXISTS addresses_country_idx       ON addresses(address2);
CREATE INDEX IF NOT EXISTS daily_reports_date_idx      ON daily_reports(date);
CREATE INDEX IF NOT EXISTS ts_confirmed_date_idx       ON time_series_confirmed(date);
CREATE INDEX IF NOT EXISTS ts_death_date_idx           ON time_series_death(date);
CREATE INDEX IF NOT EXISTS ts_recovered_date_idx       ON time_series_recovered(date);

PRAGMA user_version = 1;
";

/// The table holding one metric kind's time series.
pub fn time_series_table(metric: MetricKind) -> &'static str {
  match metric {
    MetricKind::Confirmed => "time_series_confirmed",
    MetricKind::Death => "time_series_death",
    MetricKind::Recovered => "time_series_recovered",
  }
}
