//! Monthly recovery estimation from new cases and new deaths.
//!
//! The first month recovers a fraction of its own cases; every later month
//! recovers a fraction of the previous month's cases. Deaths in the current
//! month are subtracted and the result is floored at zero.

use std::collections::BTreeMap;

use crate::bucket::MonthKey;

pub const FIRST_MONTH_RECOVERY_RATE: f64 = 0.8;
pub const CARRY_OVER_RECOVERY_RATE: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonthlyCounts {
  pub new_cases:  i64,
  pub new_deaths: i64,
}

/// Estimated recoveries per month, in ascending month order.
pub fn estimate_recoveries(months: &BTreeMap<MonthKey, MonthlyCounts>) -> BTreeMap<MonthKey, i64> {
  let mut out = BTreeMap::new();
  let mut previous: Option<i64> = None;
  for (month, counts) in months {
    let recovering = match previous {
      None => (counts.new_cases as f64 * FIRST_MONTH_RECOVERY_RATE).floor(),
      Some(prev) => (prev as f64 * CARRY_OVER_RECOVERY_RATE).floor(),
    };
    out.insert(*month, (recovering as i64 - counts.new_deaths).max(0));
    previous = Some(counts.new_cases);
  }
  out
}
