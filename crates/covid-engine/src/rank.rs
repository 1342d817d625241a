//! Top-N selection over per-entity scores.

use std::cmp::Ordering;

/// Locations that aggregate other locations and must never be ranked as
/// countries.
pub const DENYLIST: &[&str] = &[
  // Continents and global
  "World",
  "Europe",
  "North America",
  "South America",
  "Asia",
  "Africa",
  "Oceania",
  // Regional groups
  "European Union",
  "European Union (27)",
  "Commonwealth",
  "NATO",
  "G20",
  // Income groups
  "High income",
  "High-income countries",
  "Upper middle income",
  "Upper-middle-income countries",
  "Lower middle income",
  "Lower-middle-income countries",
  "Low-income countries",
  "Low income",
  // Other
  "International",
];

pub const TOP_N: usize = 10;

pub fn is_aggregate(location: &str) -> bool { DENYLIST.contains(&location) }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopN {
  pub limit: usize,
}

impl Default for TopN {
  fn default() -> Self { Self { limit: TOP_N } }
}

impl TopN {
  /// Keep the `limit` highest-scoring entities, best first.
  ///
  /// Denylisted entities are removed before selection. Equal scores are
  /// ordered by name, ascending.
  pub fn select<T>(self, mut items: Vec<(String, f64, T)>) -> Vec<(String, f64, T)> {
    items.retain(|(name, score, _)| !is_aggregate(name) && !score.is_nan());
    items.sort_by(|(na, sa, _), (nb, sb, _)| match sb.total_cmp(sa) {
      Ordering::Equal => na.cmp(nb),
      ord => ord,
    });
    items.truncate(self.limit);
    items
  }
}
