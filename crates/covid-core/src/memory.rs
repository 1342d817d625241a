//! [`MemoryStore`] — an in-memory table-scan implementation of
//! [`RecordStore`].
//!
//! Used by the engine and API test suites, and as the reference semantics the
//! SQLite backend's pushed-down queries must agree with.

use std::convert::Infallible;

use crate::{
  measure::MeasureRecord,
  policy::PolicyRecord,
  record::EpidemiologicalRecord,
  store::{MeasureQuery, PolicyQuery, RecordQuery, RecordStore},
};

/// Immutable record tables held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  records:  Vec<EpidemiologicalRecord>,
  measures: Vec<MeasureRecord>,
  policies: Vec<PolicyRecord>,
}

impl MemoryStore {
  /// Build a store from the three tables; rows are sorted by primary key.
  pub fn new(
    mut records: Vec<EpidemiologicalRecord>,
    mut measures: Vec<MeasureRecord>,
    mut policies: Vec<PolicyRecord>,
  ) -> Self {
    records.sort_by_key(|r| r.id);
    measures.sort_by_key(|m| m.id);
    policies.sort_by(|a, b| a.unique_id.cmp(&b.unique_id));
    Self { records, measures, policies }
  }

  /// A store holding only epidemiological records.
  pub fn from_records(records: Vec<EpidemiologicalRecord>) -> Self {
    Self::new(records, Vec::new(), Vec::new())
  }
}

impl RecordStore for MemoryStore {
  type Error = Infallible;

  async fn get_record(&self, id: i64) -> Result<Option<EpidemiologicalRecord>, Infallible> {
    Ok(self.records.iter().find(|r| r.id == id).cloned())
  }

  async fn list_records(&self, limit: usize) -> Result<Vec<EpidemiologicalRecord>, Infallible> {
    Ok(self.records.iter().take(limit).cloned().collect())
  }

  async fn fetch_records(
    &self,
    query: &RecordQuery,
  ) -> Result<Vec<EpidemiologicalRecord>, Infallible> {
    Ok(
      self
        .records
        .iter()
        .filter(|r| query.filter.matches(r))
        .map(|r| {
          let mut projected = r.clone();
          projected.metrics.retain(|m, _| query.metrics.contains(m));
          projected
        })
        .collect(),
    )
  }

  async fn fetch_measures(&self, query: &MeasureQuery) -> Result<Vec<MeasureRecord>, Infallible> {
    let rows = self
      .measures
      .iter()
      .filter(|m| query.country.as_ref().is_none_or(|c| m.country == *c))
      .take(query.limit.unwrap_or(usize::MAX))
      .cloned()
      .collect();
    Ok(rows)
  }

  async fn fetch_policies(&self, query: &PolicyQuery) -> Result<Vec<PolicyRecord>, Infallible> {
    let rows = self
      .policies
      .iter()
      .filter(|p| {
        query
          .authorizing_country_iso
          .as_ref()
          .is_none_or(|iso| p.authorizing_country_iso.as_ref() == Some(iso))
      })
      .take(query.limit.unwrap_or(usize::MAX))
      .cloned()
      .collect();
    Ok(rows)
  }
}
