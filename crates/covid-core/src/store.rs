//! The `RecordStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (`MemoryStore` here,
//! `covid-store-sqlite` for SQLite). The engine depends on this abstraction,
//! not on any concrete backend. Stores only filter and project; every
//! grouping and reduction happens in `covid-engine`.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  measure::MeasureRecord,
  policy::PolicyRecord,
  record::{EpidemiologicalRecord, Metric},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Row predicate over the epidemiological table. All set conditions must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
  /// `location = ?`
  pub location:          Option<String>,
  /// `location IN (...)`; ignored when empty.
  pub locations:         Vec<String>,
  /// `location NOT IN (...)`; ignored when empty.
  pub exclude_locations: Vec<String>,
  /// `continent IN (...)`; ignored when empty.
  pub continents:        Vec<String>,
  /// `date < ?` (exclusive upper bound); undated rows never match.
  pub before:            Option<NaiveDate>,
  /// Every listed metric must be non-null.
  pub non_null:          Vec<Metric>,
  /// Every listed metric must be non-null and strictly positive.
  pub positive:          Vec<Metric>,
}

impl RecordFilter {
  /// Evaluate the predicate against a fully-loaded record.
  pub fn matches(&self, rec: &EpidemiologicalRecord) -> bool {
    if let Some(loc) = &self.location
      && rec.location != *loc
    {
      return false;
    }
    if !self.locations.is_empty() && !self.locations.contains(&rec.location) {
      return false;
    }
    if self.exclude_locations.contains(&rec.location) {
      return false;
    }
    if !self.continents.is_empty() {
      match &rec.continent {
        Some(c) if self.continents.contains(c) => {}
        _ => return false,
      }
    }
    if let Some(before) = self.before
      && !rec.date.is_some_and(|d| d < before)
    {
      return false;
    }
    if self.non_null.iter().any(|m| rec.metric(*m).is_none()) {
      return false;
    }
    self
      .positive
      .iter()
      .all(|m| rec.metric(*m).is_some_and(|v| v > 0.0))
  }
}

/// Parameters for [`RecordStore::fetch_records`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
  pub filter:  RecordFilter,
  /// Metrics to load. Returned records carry only these metrics; an empty
  /// projection loads identifiers and dates only.
  pub metrics: Vec<Metric>,
}

/// Parameters for [`RecordStore::fetch_measures`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasureQuery {
  pub country: Option<String>,
  pub limit:   Option<usize>,
}

/// Parameters for [`RecordStore::fetch_policies`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyQuery {
  pub authorizing_country_iso: Option<String>,
  pub limit:                   Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Read-only access to the pre-populated record tables.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`). Results are
/// ordered by primary key so repeated reads are byte-for-byte stable.
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Epidemiological records ───────────────────────────────────────────

  /// Retrieve a full record by primary key. Returns `None` if not found.
  fn get_record(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<EpidemiologicalRecord>, Self::Error>> + Send + '_;

  /// The first `limit` full records by primary key.
  fn list_records(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<EpidemiologicalRecord>, Self::Error>> + Send + '_;

  /// Filtered, projected records ordered by primary key.
  fn fetch_records<'a>(
    &'a self,
    query: &'a RecordQuery,
  ) -> impl Future<Output = Result<Vec<EpidemiologicalRecord>, Self::Error>> + Send + 'a;

  // ── Measures and policies ─────────────────────────────────────────────

  /// Measure log entries ordered by primary key.
  fn fetch_measures<'a>(
    &'a self,
    query: &'a MeasureQuery,
  ) -> impl Future<Output = Result<Vec<MeasureRecord>, Self::Error>> + Send + 'a;

  /// Policy actions ordered by `unique_id`.
  fn fetch_policies<'a>(
    &'a self,
    query: &'a PolicyQuery,
  ) -> impl Future<Output = Result<Vec<PolicyRecord>, Self::Error>> + Send + 'a;
}

#[cfg(test)]
mod tests {
  use super::*;

  fn rec() -> EpidemiologicalRecord {
    EpidemiologicalRecord::new(1, "Kenya", NaiveDate::from_ymd_opt(2021, 6, 1).unwrap())
      .with_continent("Africa")
      .with(Metric::NewCases, 12.0)
      .with(Metric::Population, 0.0)
  }

  #[test]
  fn empty_filter_matches_everything() {
    assert!(RecordFilter::default().matches(&rec()));
  }

  #[test]
  fn location_sets() {
    let f = RecordFilter { locations: vec!["Kenya".into()], ..Default::default() };
    assert!(f.matches(&rec()));
    let f = RecordFilter { exclude_locations: vec!["Kenya".into()], ..Default::default() };
    assert!(!f.matches(&rec()));
  }

  #[test]
  fn continent_filter_rejects_rows_without_continent() {
    let f = RecordFilter { continents: vec!["Africa".into()], ..Default::default() };
    assert!(f.matches(&rec()));
    let mut r = rec();
    r.continent = None;
    assert!(!f.matches(&r));
  }

  #[test]
  fn date_bound_is_exclusive() {
    let f = RecordFilter {
      before: NaiveDate::from_ymd_opt(2021, 6, 1),
      ..Default::default()
    };
    assert!(!f.matches(&rec()));
  }

  #[test]
  fn undated_rows_fail_any_date_bound() {
    let mut r = rec();
    r.date = None;
    assert!(RecordFilter::default().matches(&r));
    let f = RecordFilter { before: NaiveDate::from_ymd_opt(9999, 1, 1), ..Default::default() };
    assert!(!f.matches(&r));
  }

  #[test]
  fn null_and_positive_constraints() {
    let f = RecordFilter { non_null: vec![Metric::NewCases], ..Default::default() };
    assert!(f.matches(&rec()));
    let f = RecordFilter { non_null: vec![Metric::NewDeaths], ..Default::default() };
    assert!(!f.matches(&rec()));
    let f = RecordFilter { positive: vec![Metric::Population], ..Default::default() };
    assert!(!f.matches(&rec()));
  }
}
