//! Address resolution and per-key record replacement.
//!
//! These run synchronously against a connection that is already inside a
//! `BEGIN IMMEDIATE` transaction (see [`crate::SqliteStore`]); the
//! transaction is what keeps the read-then-write sequences below from
//! interleaving with another writer.

use covid_core::{
  address::{AddressKey, Field},
  ingest::{ResolvedAddress, UpsertOutcome},
  report::{Counters, MetricKind},
};
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter, types::Value as SqlValue};

use crate::schema::time_series_table;

// ─── Column list builder ─────────────────────────────────────────────────────

/// The columns and values of an `INSERT` whose shape depends on which
/// optional fields an upload supplied.
#[derive(Debug, Default)]
struct ColumnList {
  columns: Vec<&'static str>,
  values:  Vec<SqlValue>,
}

impl ColumnList {
  fn push(&mut self, column: &'static str, value: impl Into<SqlValue>) {
    self.columns.push(column);
    self.values.push(value.into());
  }

  /// Push `field` only when it carries a non-empty value; otherwise the
  /// column is left out and defaults to `NULL`.
  fn push_non_empty(&mut self, column: &'static str, field: &Field<String>) {
    if let Some(v) = field.non_empty() {
      self.push(column, v.to_owned());
    }
  }

  fn insert_sql(&self, table: &str) -> String {
    let placeholders = vec!["?"; self.columns.len()].join(", ");
    format!("INSERT INTO {table} ({}) VALUES ({placeholders})", self.columns.join(", "))
  }
}

// ─── Addresses ───────────────────────────────────────────────────────────────

/// Find the first address agreeing with `key` on every part it declares, or
/// create one.
///
/// A declared-but-empty part only matches a stored `NULL`. Parts the upload
/// never declared are not compared at all.
pub fn resolve_address(conn: &Connection, key: &AddressKey) -> rusqlite::Result<ResolvedAddress> {
  let mut sql = String::from("SELECT id FROM addresses WHERE address2 = ?");
  let mut params = vec![SqlValue::Text(key.country.clone())];
  for (column, field) in [("admin2", &key.admin2), ("address1", &key.province)] {
    if field.is_present() {
      sql.push_str(&format!(" AND {column} IS ?"));
      params.push(field.non_empty().map_or(SqlValue::Null, |v| SqlValue::Text(v.to_owned())));
    }
  }
  sql.push_str(" ORDER BY id LIMIT 1");

  let existing: Option<i64> = conn
    .prepare_cached(&sql)?
    .query_row(params_from_iter(params.iter()), |row| row.get(0))
    .optional()?;
  if let Some(id) = existing {
    return Ok(ResolvedAddress { id, created: false });
  }

  let mut insert = ColumnList::default();
  insert.push_non_empty("admin2", &key.admin2);
  insert.push_non_empty("address1", &key.province);
  insert.push("address2", key.country.clone());

  conn
    .prepare_cached(&insert.insert_sql("addresses"))?
    .execute(params_from_iter(insert.values.iter()))?;

  let id = conn.last_insert_rowid();
  tracing::debug!(id, country = %key.country, "created address");
  Ok(ResolvedAddress { id, created: true })
}

// ─── Daily reports ───────────────────────────────────────────────────────────

/// Make `counters` the daily report for `(address_id, date)`.
pub fn replace_daily_report(
  conn: &Connection,
  address_id: i64,
  date: &str,
  counters: &Counters,
) -> rusqlite::Result<UpsertOutcome> {
  let existing: Option<Counters> = conn
    .prepare_cached(
      "SELECT confirmed, death, recovered, active
       FROM daily_reports WHERE address_id = ?1 AND date = ?2",
    )?
    .query_row(params![address_id, date], |row| {
      Ok(Counters {
        confirmed: row.get(0)?,
        death:     row.get(1)?,
        recovered: row.get(2)?,
        active:    row.get(3)?,
      })
    })
    .optional()?;

  if existing.as_ref() == Some(counters) {
    return Ok(UpsertOutcome::Unchanged);
  }

  conn
    .prepare_cached(
      "INSERT INTO daily_reports (address_id, date, confirmed, death, recovered, active)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)
       ON CONFLICT (address_id, date) DO UPDATE SET
         confirmed = excluded.confirmed,
         death     = excluded.death,
         recovered = excluded.recovered,
         active    = excluded.active",
    )?
    .execute(params![
      address_id,
      date,
      counters.confirmed,
      counters.death,
      counters.recovered,
      counters.active,
    ])?;

  Ok(if existing.is_some() { UpsertOutcome::Replaced } else { UpsertOutcome::Inserted })
}

// ─── Time series ─────────────────────────────────────────────────────────────

/// Make `value` the `metric` value for `(address_id, date)`.
pub fn replace_time_series(
  conn: &Connection,
  metric: MetricKind,
  address_id: i64,
  date: &str,
  value: i64,
) -> rusqlite::Result<UpsertOutcome> {
  let table = time_series_table(metric);

  let existing: Option<i64> = conn
    .prepare_cached(&format!("SELECT value FROM {table} WHERE address_id = ?1 AND date = ?2"))?
    .query_row(params![address_id, date], |row| row.get(0))
    .optional()?;

  if existing == Some(value) {
    return Ok(UpsertOutcome::Unchanged);
  }

  conn
    .prepare_cached(&format!(
      "INSERT INTO {table} (address_id, date, value) VALUES (?1, ?2, ?3)
       ON CONFLICT (address_id, date) DO UPDATE SET value = excluded.value"
    ))?
    .execute(params![address_id, date, value])?;

  Ok(if existing.is_some() { UpsertOutcome::Replaced } else { UpsertOutcome::Inserted })
}
