//! [`SqliteStore`], the SQLite implementation of [`ReportStore`].

use std::path::Path;

use covid_core::{
  address::AddressKey,
  filter::ReportFilter,
  ingest::{DailyReportBatch, IngestSummary, ResolvedAddress, TimeSeriesBatch},
  report::{Counters, DailyReport, MetricKind, TimeSeries},
  store::ReportStore,
};
use rusqlite::{TransactionBehavior, params_from_iter, types::Value as SqlValue};

use crate::{
  Result,
  encode::{RawAddress, RawDailyReport, RawTimeSeries, encode_date},
  query::{Columns, render},
  reconcile::{replace_daily_report, replace_time_series, resolve_address},
  schema::{SCHEMA, time_series_table},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A report store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ReportStore impl ────────────────────────────────────────────────────────

impl ReportStore for SqliteStore {
  type Error = crate::Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn resolve_address(&self, key: AddressKey) -> Result<ResolvedAddress> {
    let resolved = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let resolved = resolve_address(&tx, &key)?;
        tx.commit()?;
        Ok(resolved)
      })
      .await?;
    Ok(resolved)
  }

  async fn ingest_daily_reports(&self, batch: DailyReportBatch) -> Result<IngestSummary> {
    let day = batch.date;
    let date = encode_date(day);

    let summary = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut summary = IngestSummary::default();
        for row in &batch.rows {
          let address = resolve_address(&tx, &row.address)?;
          summary.record_address(address);
          summary.record(replace_daily_report(&tx, address.id, &date, &row.counters)?);
        }
        tx.commit()?;
        Ok(summary)
      })
      .await?;

    tracing::info!(
      date = %day,
      rows = summary.rows,
      inserted = summary.inserted,
      replaced = summary.replaced,
      unchanged = summary.unchanged,
      "ingested daily reports"
    );
    Ok(summary)
  }

  async fn ingest_time_series(&self, batch: TimeSeriesBatch) -> Result<IngestSummary> {
    let metric = batch.metric;

    let summary = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut summary = IngestSummary::default();
        for row in &batch.rows {
          let address = resolve_address(&tx, &row.address)?;
          summary.record_address(address);
          for &(day, value) in &row.values {
            let outcome = replace_time_series(&tx, metric, address.id, &encode_date(day), value)?;
            summary.record(outcome);
          }
        }
        tx.commit()?;
        Ok(summary)
      })
      .await?;

    tracing::info!(
      %metric,
      rows = summary.rows,
      inserted = summary.inserted,
      replaced = summary.replaced,
      unchanged = summary.unchanged,
      "ingested time series"
    );
    Ok(summary)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn daily_reports<'a>(&'a self, filter: &'a ReportFilter) -> Result<Vec<DailyReport>> {
    let predicate = filter.combined();
    tracing::debug!(%predicate, "querying daily reports");

    let fragment = render(&predicate, Columns { address: "a", dated: "d" });
    let sql = format!(
      "SELECT {}, d.date, d.confirmed, d.death, d.recovered, d.active
       FROM daily_reports d
       JOIN addresses a ON a.id = d.address_id
       WHERE {}
       ORDER BY a.id, d.date",
      RawAddress::COLUMNS,
      fragment.sql,
    );

    let raws: Vec<RawDailyReport> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(fragment.params.iter()), |row| {
            Ok(RawDailyReport {
              address:  RawAddress::from_row(row, 0)?,
              date:     row.get(4)?,
              counters: Counters {
                confirmed: row.get(5)?,
                death:     row.get(6)?,
                recovered: row.get(7)?,
                active:    row.get(8)?,
              },
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDailyReport::into_report).collect()
  }

  async fn time_series<'a>(&'a self, filter: &'a ReportFilter) -> Result<Vec<TimeSeries>> {
    let metric = filter.display;
    tracing::debug!(
      %metric,
      address = %filter.address,
      dates = %filter.dates,
      "querying time series"
    );

    let addresses = render(&filter.address, Columns { address: "a", dated: "a" });
    let dates = render(&filter.dates, Columns { address: "a", dated: "t" });

    let address_sql = format!(
      "SELECT {} FROM addresses a WHERE {} ORDER BY a.id",
      RawAddress::COLUMNS,
      addresses.sql,
    );
    let values_sql = |metric: MetricKind| {
      format!(
        "SELECT t.date, t.value FROM {} t WHERE t.address_id = ? AND {} ORDER BY t.date",
        time_series_table(metric),
        dates.sql,
      )
    };
    let metric_sql = values_sql(metric);
    let confirmed_sql = (metric != MetricKind::Confirmed).then(|| values_sql(MetricKind::Confirmed));

    let raws: Vec<RawTimeSeries> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&address_sql)?;
        let found = stmt
          .query_map(params_from_iter(addresses.params.iter()), |row| RawAddress::from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut values_stmt = conn.prepare(&metric_sql)?;
        let mut confirmed_stmt = confirmed_sql.as_deref().map(|sql| conn.prepare(sql)).transpose()?;

        let mut series = Vec::with_capacity(found.len());
        for address in found {
          let values = dated_values(&mut values_stmt, address.id, &dates.params)?;
          if values.is_empty() {
            continue;
          }
          let confirmed = match confirmed_stmt.as_mut() {
            Some(stmt) => Some(dated_values(stmt, address.id, &dates.params)?),
            None => None,
          };
          series.push(RawTimeSeries { address, values, confirmed });
        }
        Ok(series)
      })
      .await?;

    raws.into_iter().map(|raw| raw.into_series(metric)).collect()
  }
}

/// `(date, value)` rows of one address from a prepared per-address values
/// query whose remaining placeholders are the date clauses.
fn dated_values(
  stmt: &mut rusqlite::Statement<'_>,
  address_id: i64,
  dates: &[SqlValue],
) -> rusqlite::Result<Vec<(String, i64)>> {
  let params = std::iter::once(SqlValue::Integer(address_id)).chain(dates.iter().cloned());
  stmt
    .query_map(params_from_iter(params), |row| Ok((row.get(0)?, row.get(1)?)))?
    .collect()
}
