//! The generic aggregation pipeline: group, reduce, transform, rank, shape.
//!
//! Most views are a single [`Aggregate`]: a store filter, a [`GroupKey`], a
//! list of reducers, a [`Transform`] turning each group's reduced values into
//! an output value, an optional [`Rank`], and a [`Shape`] deciding how the
//! groups nest in the result. [`aggregate`] is pure; it never touches the
//! store.

use std::collections::BTreeMap;

use covid_core::{
  record::{EpidemiologicalRecord, Metric},
  store::{RecordFilter, RecordQuery},
};

use crate::{
  bucket::{Bucket, KeyPart},
  group::{GroupKey, Reduced, Reducer, group},
  rank::TopN,
  ratio::{MissingPolicy, PercentFormat, percent, ratio, recovered, round_to},
  value::{Mapping, Value},
};

// ─── Transform ───────────────────────────────────────────────────────────────

/// Turns one group's reduced values into its output value.
///
/// Indices refer to the [`Aggregate::reducers`] list. A transform evaluating
/// to `None` drops the group from the output.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
  /// The reduced value truncated to an integer.
  Integer(usize),
  /// The reduced value as a float, optionally rounded.
  Number { reducer: usize, decimals: Option<u32> },
  /// The reduced value rounded to the nearest integer.
  Rounded(usize),
  /// The reduced value floored at zero, as an integer.
  NonNegative(usize),
  /// `num / den`, or a percentage when `format` is set.
  Ratio {
    num:     usize,
    den:     usize,
    format:  Option<PercentFormat>,
    missing: MissingPolicy,
  },
  /// `max(0, cases − deaths) / cases`. Null if either input is null.
  RecoveredFraction {
    cases:   usize,
    deaths:  usize,
    missing: MissingPolicy,
  },
  /// `max(0, cases − deaths)` as an integer.
  Recovered { cases: usize, deaths: usize },
  /// `a − b` as a float.
  Difference { a: usize, b: usize },
  /// The group's value as a percentage of the sum over all groups sharing
  /// its first `within` key parts. Null when that sum is zero.
  Share {
    reducer:  usize,
    within:   usize,
    decimals: Option<u32>,
  },
  /// A mapping of named fields; a field that cannot be computed is null.
  Fields(Vec<(&'static str, Transform)>),
  /// A mapping of named fields; the group is dropped if any field cannot be
  /// computed.
  StrictFields(Vec<(&'static str, Transform)>),
}

/// Per-call state shared by every group's transform.
struct Context<'a> {
  bucket: &'a Bucket,
  totals: &'a BTreeMap<(usize, usize, Bucket), f64>,
}

impl Transform {
  fn eval(&self, values: &Reduced, ctx: &Context<'_>) -> Option<Value> {
    let at = |i: usize| values.get(i).copied().flatten();
    match self {
      Self::Integer(i) => Some(Value::Int(at(*i)? as i64)),
      Self::Number { reducer, decimals } => {
        let v = at(*reducer)?;
        Some(Value::Float(decimals.map_or(v, |d| round_to(v, d))))
      }
      Self::Rounded(i) => Some(Value::Int(at(*i)?.round() as i64)),
      Self::NonNegative(i) => Some(Value::Int(at(*i)?.max(0.0) as i64)),
      Self::Ratio { num, den, format, missing } => {
        let v = match format {
          Some(fmt) => percent(at(*num), at(*den)).map(|p| fmt.apply(p)),
          None => ratio(at(*num), at(*den)),
        };
        missing.resolve(v).map(Value::Float)
      }
      Self::RecoveredFraction { cases, deaths, missing } => {
        let (c, d) = (at(*cases)?, at(*deaths)?);
        missing.resolve(ratio(Some(recovered(c, d)), Some(c))).map(Value::Float)
      }
      Self::Recovered { cases, deaths } => {
        Some(Value::Int(recovered(at(*cases)?, at(*deaths)?) as i64))
      }
      Self::Difference { a, b } => Some(Value::Float(at(*a)? - at(*b)?)),
      Self::Share { reducer, within, decimals } => {
        let prefix = prefix(ctx.bucket, *within);
        let total = ctx.totals.get(&(*reducer, *within, prefix)).copied();
        let pct = percent(at(*reducer), total)?;
        Some(Value::Float(decimals.map_or(pct, |d| round_to(pct, d))))
      }
      Self::Fields(fields) => Some(Value::Map(
        fields
          .iter()
          .map(|(name, t)| (*name, Value::from(t.eval(values, ctx))))
          .collect(),
      )),
      Self::StrictFields(fields) => {
        let mut out = Mapping::new();
        for (name, t) in fields {
          out.insert(*name, t.eval(values, ctx)?);
        }
        Some(Value::Map(out))
      }
    }
  }

  /// Every `(reducer, within)` pair a [`Transform::Share`] needs totals for.
  fn shares(&self, out: &mut Vec<(usize, usize)>) {
    match self {
      Self::Share { reducer, within, .. } => out.push((*reducer, *within)),
      Self::Fields(fields) | Self::StrictFields(fields) => {
        for (_, t) in fields {
          t.shares(out);
        }
      }
      _ => {}
    }
  }
}

fn prefix(bucket: &Bucket, within: usize) -> Bucket {
  bucket[..within.min(bucket.len())].to_vec()
}

// ─── Rank and shape ──────────────────────────────────────────────────────────

/// What a ranked view orders its entities by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
  /// A reduced value, which need not be the reported one.
  Reducer(usize),
  /// The transformed output value.
  Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank {
  pub score: Score,
  pub top:   TopN,
}

/// How groups are laid out in the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
  /// One mapping level per key part. A global group yields its value bare.
  Nested,
  /// A list of rows; key parts are written under the given field names and
  /// a mapping value's fields are merged in.
  Rows(&'static [&'static str]),
  /// A mapping from the first key part to a list of rows built from the
  /// remaining key parts as in [`Shape::Rows`].
  GroupedRows(&'static [&'static str]),
}

// ─── Aggregate ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
  pub filter:    RecordFilter,
  pub group:     GroupKey,
  pub reducers:  Vec<Reducer>,
  pub transform: Transform,
  pub rank:      Option<Rank>,
  pub shape:     Shape,
}

impl Aggregate {
  /// The store query loading exactly the rows and metrics this pipeline
  /// reads.
  pub fn query(&self) -> RecordQuery {
    let mut metrics: Vec<Metric> = self
      .reducers
      .iter()
      .flat_map(|r| r.operand.metrics())
      .collect();
    metrics.sort();
    metrics.dedup();
    RecordQuery { filter: self.filter.clone(), metrics }
  }
}

/// Run the pipeline over rows already selected by [`Aggregate::query`].
pub fn aggregate(rows: &[EpidemiologicalRecord], aggregation: &Aggregate) -> Value {
  let groups = group(rows, aggregation.group, &aggregation.reducers);

  let mut shares = Vec::new();
  aggregation.transform.shares(&mut shares);
  let mut totals: BTreeMap<(usize, usize, Bucket), f64> = BTreeMap::new();
  for (reducer, within) in shares {
    for (bucket, values) in &groups {
      if let Some(v) = values.get(reducer).copied().flatten() {
        *totals.entry((reducer, within, prefix(bucket, within))).or_default() += v;
      }
    }
  }

  let evaluated: Vec<(&Bucket, &Reduced, Value)> = groups
    .iter()
    .filter_map(|(bucket, values)| {
      let ctx = Context { bucket, totals: &totals };
      Some((bucket, values, aggregation.transform.eval(values, &ctx)?))
    })
    .collect();

  if let Some(rank) = aggregation.rank {
    return ranked(evaluated, rank);
  }

  match aggregation.shape {
    Shape::Nested => nested(evaluated),
    Shape::Rows(names) => {
      Value::List(evaluated.into_iter().map(|(b, _, v)| row(b, names, v)).collect())
    }
    Shape::GroupedRows(names) => {
      let mut out: Vec<(String, Vec<Value>)> = Vec::new();
      for (bucket, _, v) in evaluated {
        let Some((head, rest)) = bucket.split_first() else { continue };
        let key = head.to_string();
        let entry = row(rest, names, v);
        match out.last_mut() {
          Some((k, rows)) if *k == key => rows.push(entry),
          _ => out.push((key, vec![entry])),
        }
      }
      Value::Map(out.into_iter().map(|(k, rows)| (k, Value::List(rows))).collect())
    }
  }
}

fn ranked(evaluated: Vec<(&Bucket, &Reduced, Value)>, rank: Rank) -> Value {
  let scored = evaluated
    .into_iter()
    .filter_map(|(bucket, values, v)| {
      let name = bucket.first()?.to_string();
      let score = match rank.score {
        Score::Reducer(i) => values.get(i).copied().flatten()?,
        Score::Output => v.as_f64()?,
      };
      Some((name, score, v))
    })
    .collect();
  Value::Map(
    rank
      .top
      .select(scored)
      .into_iter()
      .map(|(name, _, v)| (name, v))
      .collect(),
  )
}

fn nested(evaluated: Vec<(&Bucket, &Reduced, Value)>) -> Value {
  let mut root = Mapping::new();
  for (bucket, _, v) in evaluated {
    let Some((leaf, path)) = bucket.split_last() else {
      // Global group.
      return v;
    };
    let mut node = &mut root;
    for part in path {
      node = node.child(&part.to_string());
    }
    node.insert(leaf.to_string(), v);
  }
  Value::Map(root)
}

fn row(parts: &[KeyPart], names: &[&str], value: Value) -> Value {
  let mut out: Mapping = names
    .iter()
    .zip(parts)
    .map(|(name, part)| (*name, part.to_string()))
    .collect();
  match value {
    Value::Map(fields) => {
      for (k, v) in fields.iter() {
        out.insert(k, v.clone());
      }
    }
    other => out.insert("value", other),
  }
  Value::Map(out)
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn rec(id: i64, loc: &str, cont: &str, y: i32, m: u32) -> EpidemiologicalRecord {
    EpidemiologicalRecord::new(id, loc, NaiveDate::from_ymd_opt(y, m, 1).unwrap()).with_continent(cont)
  }

  fn aggregation(group: GroupKey, reducers: Vec<Reducer>, transform: Transform) -> Aggregate {
    Aggregate {
      filter: RecordFilter::default(),
      group,
      reducers,
      transform,
      rank: None,
      shape: Shape::Nested,
    }
  }

  #[test]
  fn query_projects_reducer_metrics_once() {
    let s = aggregation(
      GroupKey::Location,
      vec![
        Reducer::max(Metric::TotalCases),
        Reducer::sum_difference(Metric::TotalCases, Metric::TotalDeaths),
        Reducer::count_rows(),
      ],
      Transform::Integer(0),
    );
    assert_eq!(s.query().metrics, [Metric::TotalCases, Metric::TotalDeaths]);
  }

  #[test]
  fn nested_by_location_and_month() {
    let rows = vec![
      rec(1, "Mali", "Africa", 2020, 1).with(Metric::NewCases, 3.0),
      rec(2, "Mali", "Africa", 2020, 2).with(Metric::NewCases, 4.0),
      rec(3, "Iran", "Asia", 2020, 1).with(Metric::NewCases, 5.0),
    ];
    let out = aggregate(
      &rows,
      &aggregation(
        GroupKey::LocationMonth,
        vec![Reducer::sum(Metric::NewCases)],
        Transform::Integer(0),
      ),
    );
    let json = serde_json::to_string(&out).unwrap();
    assert_eq!(json, r#"{"Iran":{"2020-01":5},"Mali":{"2020-01":3,"2020-02":4}}"#);
  }

  #[test]
  fn omitted_groups_disappear() {
    let rows = vec![
      rec(1, "Mali", "Africa", 2020, 1)
        .with(Metric::TotalCases, 10.0)
        .with(Metric::Population, 100.0),
      rec(2, "Iran", "Asia", 2020, 1).with(Metric::TotalCases, 10.0),
    ];
    let out = aggregate(
      &rows,
      &aggregation(
        GroupKey::Location,
        vec![Reducer::max(Metric::TotalCases), Reducer::max(Metric::Population)],
        Transform::Ratio { num: 0, den: 1, format: None, missing: MissingPolicy::Omit },
      ),
    );
    let map = out.as_map().unwrap();
    assert_eq!(map.keys().collect::<Vec<_>>(), ["Mali"]);
    assert_eq!(map.get("Mali"), Some(&Value::Float(0.1)));
  }

  #[test]
  fn global_fields_render_nulls() {
    let out = aggregate(
      &[],
      &aggregation(
        GroupKey::Global,
        vec![Reducer::latest(Metric::TotalCases)],
        Transform::Fields(vec![("total_cases", Transform::Integer(0))]),
      ),
    );
    assert_eq!(serde_json::to_string(&out).unwrap(), r#"{"total_cases":null}"#);
  }

  #[test]
  fn grouped_rows_with_shares_per_year() {
    let rows = vec![
      rec(1, "Iran", "Asia", 2020, 1).with(Metric::IcuPatients, 30.0),
      rec(2, "Mali", "Africa", 2020, 1).with(Metric::IcuPatients, 10.0),
      rec(3, "Mali", "Africa", 2021, 1).with(Metric::IcuPatients, 0.0),
    ];
    let mut s = aggregation(
      GroupKey::YearContinent,
      vec![Reducer::sum(Metric::IcuPatients)],
      Transform::StrictFields(vec![
        ("icu_patients", Transform::Integer(0)),
        ("percentage", Transform::Share { reducer: 0, within: 1, decimals: None }),
      ]),
    );
    s.shape = Shape::GroupedRows(&["continent"]);
    let json = serde_json::to_string(&aggregate(&rows, &s)).unwrap();
    assert_eq!(
      json,
      r#"{"2020":[{"continent":"Africa","icu_patients":10,"percentage":25.0},{"continent":"Asia","icu_patients":30,"percentage":75.0}]}"#
    );
  }

  #[test]
  fn rows_shape_merges_fields() {
    let rows = vec![
      rec(1, "Iran", "Asia", 2020, 1)
        .with(Metric::TotalDeathsPerMillion, 10.4)
        .with(Metric::HospitalBedsPerThousand, 1.5),
    ];
    let mut s = aggregation(
      GroupKey::ContinentLocation,
      vec![Reducer::avg(Metric::TotalDeathsPerMillion), Reducer::avg(Metric::HospitalBedsPerThousand)],
      Transform::StrictFields(vec![
        ("avg_deaths", Transform::Rounded(0)),
        ("avg_beds", Transform::Number { reducer: 1, decimals: Some(3) }),
      ]),
    );
    s.shape = Shape::Rows(&["continent", "country"]);
    let json = serde_json::to_string(&aggregate(&rows, &s)).unwrap();
    assert_eq!(
      json,
      r#"[{"continent":"Asia","country":"Iran","avg_deaths":10,"avg_beds":1.5}]"#
    );
  }

  #[test]
  fn ranking_orders_by_score_not_output() {
    let rows = vec![
      rec(1, "Chad", "Africa", 2020, 1)
        .with(Metric::TotalCases, 100.0)
        .with(Metric::Population, 1000.0),
      rec(2, "Iran", "Asia", 2020, 1)
        .with(Metric::TotalCases, 50.0)
        .with(Metric::Population, 100.0),
      rec(3, "World", "", 2020, 1)
        .with(Metric::TotalCases, 1e6)
        .with(Metric::Population, 1e9),
    ];
    let mut s = aggregation(
      GroupKey::Location,
      vec![Reducer::max(Metric::TotalCases), Reducer::max(Metric::Population)],
      Transform::Ratio { num: 0, den: 1, format: None, missing: MissingPolicy::Omit },
    );
    s.rank = Some(Rank { score: Score::Reducer(0), top: TopN::default() });
    let out = aggregate(&rows, &s);
    let keys: Vec<_> = out.as_map().unwrap().keys().collect();
    assert_eq!(keys, ["Chad", "Iran"]);
  }
}
