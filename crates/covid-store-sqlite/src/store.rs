//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::path::Path;

use covid_core::{
  measure::MeasureRecord,
  policy::PolicyRecord,
  record::{EpidemiologicalRecord, Metric},
  store::{MeasureQuery, PolicyQuery, RecordFilter, RecordQuery, RecordStore},
};
use rusqlite::{OpenFlags, OptionalExtension as _, types::Value as SqlValue};

use crate::{
  Error, Result,
  encode::{RawMeasure, RawPolicy, RawRecord, encode_date, present},
  schema::{MEASURE_COLUMNS, POLICY_COLUMNS, RECORD_KEY_COLUMNS, TABLES, schema},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A read-only record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open the pre-populated database at `path` read-only and check that the
  /// record tables exist.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
      | OpenFlags::SQLITE_OPEN_NO_MUTEX
      | OpenFlags::SQLITE_OPEN_URI;
    let conn = tokio_rusqlite::Connection::open_with_flags(path, flags).await?;
    let store = Self { conn };
    store.check_tables().await?;
    Ok(store)
  }

  /// Open an empty in-memory store with the schema created. Useful for
  /// testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let ddl = schema();
    conn
      .call(move |conn| {
        conn.execute_batch(&ddl)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn })
  }

  async fn check_tables(&self) -> Result<()> {
    let found: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
        let names = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
      })
      .await?;

    for table in TABLES {
      if !found.iter().any(|name| name == table) {
        return Err(Error::MissingTable(table));
      }
    }
    Ok(())
  }

  /// Run raw SQL against the connection; tests use it to seed rows.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &str) -> Result<()> {
    let sql = sql.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn select_records(
    &self,
    sql: String,
    params: Vec<SqlValue>,
    metrics: Vec<Metric>,
  ) -> Result<Vec<EpidemiologicalRecord>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            RawRecord::from_row(row, &metrics)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }
}

// ─── SQL building ────────────────────────────────────────────────────────────

fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

fn texts(values: &[String]) -> impl Iterator<Item = SqlValue> + '_ {
  values.iter().cloned().map(SqlValue::Text)
}

/// Translate a [`RecordFilter`] into a `WHERE` clause and its parameters.
/// Returns an empty clause when the filter is empty.
pub(crate) fn where_clause(filter: &RecordFilter) -> (String, Vec<SqlValue>) {
  let mut conds: Vec<String> = Vec::new();
  let mut params: Vec<SqlValue> = Vec::new();

  if let Some(location) = &filter.location {
    conds.push("location = ?".into());
    params.push(SqlValue::Text(location.clone()));
  }
  if !filter.locations.is_empty() {
    conds.push(format!("location IN ({})", placeholders(filter.locations.len())));
    params.extend(texts(&filter.locations));
  }
  if !filter.exclude_locations.is_empty() {
    conds.push(format!("location NOT IN ({})", placeholders(filter.exclude_locations.len())));
    params.extend(texts(&filter.exclude_locations));
  }
  if !filter.continents.is_empty() {
    conds.push(format!("continent IN ({})", placeholders(filter.continents.len())));
    params.extend(texts(&filter.continents));
  }
  if let Some(before) = filter.before {
    // '' would otherwise sort before every date.
    conds.push("NULLIF(date, '') < ?".into());
    params.push(SqlValue::Text(encode_date(before)));
  }
  for metric in &filter.non_null {
    conds.push(present(metric.column()));
  }
  for metric in &filter.positive {
    conds.push(format!("{} AND {} > 0", present(metric.column()), metric.column()));
  }

  let clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  (clause, params)
}

fn select_list(metrics: &[Metric]) -> String {
  let mut cols = String::from(RECORD_KEY_COLUMNS);
  for metric in metrics {
    cols.push_str(", ");
    cols.push_str(metric.column());
  }
  cols
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  async fn get_record(&self, id: i64) -> Result<Option<EpidemiologicalRecord>> {
    let metrics: Vec<Metric> = Metric::all().collect();
    let sql = format!("SELECT {} FROM covid_data WHERE id = ?1", select_list(&metrics));

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(&sql, [id], |row| RawRecord::from_row(row, &metrics))
          .optional()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn list_records(&self, limit: usize) -> Result<Vec<EpidemiologicalRecord>> {
    let metrics: Vec<Metric> = Metric::all().collect();
    let sql = format!("SELECT {} FROM covid_data ORDER BY id LIMIT ?", select_list(&metrics));
    let params = vec![SqlValue::Integer(i64::try_from(limit).unwrap_or(i64::MAX))];
    self.select_records(sql, params, metrics).await
  }

  async fn fetch_records(&self, query: &RecordQuery) -> Result<Vec<EpidemiologicalRecord>> {
    let (clause, params) = where_clause(&query.filter);
    let sql = format!(
      "SELECT {} FROM covid_data {clause} ORDER BY id",
      select_list(&query.metrics)
    );
    tracing::trace!(%sql, "fetching records");
    self.select_records(sql, params, query.metrics.clone()).await
  }

  async fn fetch_measures(&self, query: &MeasureQuery) -> Result<Vec<MeasureRecord>> {
    let country = query.country.clone();
    let limit = query.limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));

    let raws: Vec<RawMeasure> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {MEASURE_COLUMNS} FROM measures_data
           WHERE (?1 IS NULL OR country = ?1)
           ORDER BY id
           LIMIT ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![country, limit], RawMeasure::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMeasure::into_measure).collect()
  }

  async fn fetch_policies(&self, query: &PolicyQuery) -> Result<Vec<PolicyRecord>> {
    let iso = query.authorizing_country_iso.clone();
    let limit = query.limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));

    let raws: Vec<RawPolicy> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {POLICY_COLUMNS} FROM policy_data
           WHERE (?1 IS NULL OR authorizing_country_iso = ?1)
           ORDER BY unique_id
           LIMIT ?2"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![iso, limit], RawPolicy::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPolicy::into_policy).collect()
  }
}
