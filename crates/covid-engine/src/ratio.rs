//! Ratio, percentage and recovered-estimate helpers.
//!
//! A ratio with a null or zero denominator is never a fault. The view that
//! asks for it decides through a [`MissingPolicy`] whether the entity is
//! dropped or receives a default.

/// `num / den`, or `None` if either side is null or `den` is zero.
pub fn ratio(num: Option<f64>, den: Option<f64>) -> Option<f64> {
  let (num, den) = (num?, den?);
  (den != 0.0).then(|| num / den)
}

/// `ratio × 100`.
pub fn percent(num: Option<f64>, den: Option<f64>) -> Option<f64> {
  ratio(num, den).map(|r| r * 100.0)
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
  let scale = 10_f64.powi(decimals as i32);
  (value * scale).round() / scale
}

/// Estimated recovered count: `max(0, cases − deaths)`.
pub fn recovered(cases: f64, deaths: f64) -> f64 { (cases - deaths).max(0.0) }

/// Post-processing for a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PercentFormat {
  /// Round to this many decimal places.
  pub decimals: Option<u32>,
  /// Clamp into `[0, 100]`; used for population fractions.
  pub clamp:    bool,
}

impl PercentFormat {
  pub fn apply(self, pct: f64) -> f64 {
    let pct = if self.clamp { pct.clamp(0.0, 100.0) } else { pct };
    match self.decimals {
      Some(d) => round_to(pct, d),
      None => pct,
    }
  }
}

/// What a view does with an entity whose ratio cannot be computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MissingPolicy {
  /// Drop the entity from the output.
  Omit,
  /// Report this value instead.
  Default(f64),
}

impl MissingPolicy {
  pub fn resolve(self, value: Option<f64>) -> Option<f64> {
    match self {
      Self::Omit => value,
      Self::Default(d) => Some(value.unwrap_or(d)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_and_null_denominators() {
    assert_eq!(ratio(Some(5.0), Some(0.0)), None);
    assert_eq!(ratio(Some(5.0), None), None);
    assert_eq!(ratio(None, Some(2.0)), None);
    assert_eq!(ratio(Some(5.0), Some(2.0)), Some(2.5));
  }

  #[test]
  fn percent_format_clamps_then_rounds() {
    let fmt = PercentFormat { decimals: Some(2), clamp: true };
    assert_eq!(fmt.apply(123.456), 100.0);
    assert_eq!(fmt.apply(-3.0), 0.0);
    assert_eq!(fmt.apply(66.66666), 66.67);
    assert_eq!(PercentFormat::default().apply(123.456), 123.456);
  }

  #[test]
  fn rounding_is_half_away_from_zero() {
    assert_eq!(round_to(2.5, 0), 3.0);
    assert_eq!(round_to(-2.5, 0), -3.0);
    assert_eq!(round_to(1.23456, 3), 1.235);
  }

  #[test]
  fn recovered_never_negative() {
    assert_eq!(recovered(100.0, 7.0), 93.0);
    assert_eq!(recovered(3.0, 7.0), 0.0);
  }

  #[test]
  fn missing_policy() {
    assert_eq!(MissingPolicy::Omit.resolve(None), None);
    assert_eq!(MissingPolicy::Default(0.0).resolve(None), Some(0.0));
    assert_eq!(MissingPolicy::Default(0.0).resolve(Some(0.4)), Some(0.4));
  }
}
