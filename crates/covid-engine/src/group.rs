//! Grouping and reduction primitives.
//!
//! Rows are partitioned by a [`GroupKey`] and each partition is folded by a
//! list of [`Reducer`]s. Null values never reach an accumulator: a reducer
//! that saw no value yields `None` for its group, exactly like SQL aggregates
//! over `NULL`.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use covid_core::record::{EpidemiologicalRecord, Metric};

use crate::bucket::{Bucket, KeyPart, MonthKey};

// ─── Reducers ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregator {
  Sum,
  Max,
  Avg,
  Count,
  /// The value on the most recent date in the group.
  Latest,
}

/// What a reducer reads from each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
  Field(Metric),
  /// `a − b`, null if either side is null.
  Difference(Metric, Metric),
  /// Every row contributes `1`; counts rows regardless of nulls.
  Rows,
}

impl Operand {
  pub fn eval(self, rec: &EpidemiologicalRecord) -> Option<f64> {
    match self {
      Self::Field(m) => rec.metric(m),
      Self::Difference(a, b) => Some(rec.metric(a)? - rec.metric(b)?),
      Self::Rows => Some(1.0),
    }
  }

  /// Metrics that must be loaded to evaluate this operand.
  pub fn metrics(self) -> Vec<Metric> {
    match self {
      Self::Field(m) => vec![m],
      Self::Difference(a, b) => vec![a, b],
      Self::Rows => Vec::new(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reducer {
  pub agg:     Aggregator,
  pub operand: Operand,
}

impl Reducer {
  pub const fn sum(m: Metric) -> Self { Self { agg: Aggregator::Sum, operand: Operand::Field(m) } }

  pub const fn max(m: Metric) -> Self { Self { agg: Aggregator::Max, operand: Operand::Field(m) } }

  pub const fn avg(m: Metric) -> Self { Self { agg: Aggregator::Avg, operand: Operand::Field(m) } }

  pub const fn latest(m: Metric) -> Self {
    Self { agg: Aggregator::Latest, operand: Operand::Field(m) }
  }

  pub const fn count_rows() -> Self { Self { agg: Aggregator::Count, operand: Operand::Rows } }

  pub const fn sum_difference(a: Metric, b: Metric) -> Self {
    Self { agg: Aggregator::Sum, operand: Operand::Difference(a, b) }
  }
}

// ─── Accumulator ─────────────────────────────────────────────────────────────

/// Running state for one reducer over one group.
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
  sum:    f64,
  count:  u64,
  max:    Option<f64>,
  latest: Option<(NaiveDate, f64)>,
}

impl Accumulator {
  /// Undated values count towards every aggregator except `Latest`.
  pub fn push(&mut self, value: f64, date: Option<NaiveDate>) {
    self.sum += value;
    self.count += 1;
    self.max = Some(self.max.map_or(value, |m| m.max(value)));
    let Some(date) = date else { return };
    match self.latest {
      Some((d, _)) if d >= date => {}
      _ => self.latest = Some((date, value)),
    }
  }

  /// The reduced value, or `None` if no value was pushed.
  pub fn finish(&self, agg: Aggregator) -> Option<f64> {
    if self.count == 0 {
      return None;
    }
    match agg {
      Aggregator::Sum => Some(self.sum),
      Aggregator::Max => self.max,
      Aggregator::Avg => Some(self.sum / self.count as f64),
      Aggregator::Count => Some(self.count as f64),
      Aggregator::Latest => self.latest.map(|(_, v)| v),
    }
  }
}

// ─── Group keys ──────────────────────────────────────────────────────────────

/// How rows are partitioned. Key components are listed outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
  /// A single group holding every row; present even when there are no rows.
  Global,
  Location,
  Continent,
  ContinentLocation,
  Month,
  LocationMonth,
  ContinentMonth,
  YearContinent,
}

impl GroupKey {
  /// The bucket for `rec`, or `None` if a key field is null. Undated rows
  /// only fall into groupings without a time component.
  pub fn bucket(self, rec: &EpidemiologicalRecord) -> Option<Bucket> {
    let location = || KeyPart::Text(rec.location.clone());
    let continent = || rec.continent.clone().map(KeyPart::Text);
    let month = || rec.date.map(|d| KeyPart::Month(MonthKey::of(d)));

    Some(match self {
      Self::Global => Vec::new(),
      Self::Location => vec![location()],
      Self::Continent => vec![continent()?],
      Self::ContinentLocation => vec![continent()?, location()],
      Self::Month => vec![month()?],
      Self::LocationMonth => vec![location(), month()?],
      Self::ContinentMonth => vec![continent()?, month()?],
      Self::YearContinent => vec![KeyPart::Year(rec.date?.year()), continent()?],
    })
  }
}

/// The reduced values of one group, indexed like the reducer list.
pub type Reduced = Vec<Option<f64>>;

/// Partition `rows` by `key` and reduce each partition with `reducers`.
///
/// Every bucket containing at least one row appears in the output, in bucket
/// order; a reducer with no non-null input is `None` for that bucket.
pub fn group(
  rows: &[EpidemiologicalRecord],
  key: GroupKey,
  reducers: &[Reducer],
) -> BTreeMap<Bucket, Reduced> {
  let mut acc: BTreeMap<Bucket, Vec<Accumulator>> = BTreeMap::new();
  if key == GroupKey::Global {
    acc.insert(Vec::new(), vec![Accumulator::default(); reducers.len()]);
  }

  for rec in rows {
    let Some(bucket) = key.bucket(rec) else { continue };
    let slots = acc
      .entry(bucket)
      .or_insert_with(|| vec![Accumulator::default(); reducers.len()]);
    for (slot, reducer) in slots.iter_mut().zip(reducers) {
      if let Some(v) = reducer.operand.eval(rec) {
        slot.push(v, rec.date);
      }
    }
  }

  acc
    .into_iter()
    .map(|(bucket, slots)| {
      let values = slots
        .iter()
        .zip(reducers)
        .map(|(slot, reducer)| slot.finish(reducer.agg))
        .collect();
      (bucket, values)
    })
    .collect()
}
