//! Time buckets and composite group keys.

use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

// ─── MonthKey ────────────────────────────────────────────────────────────────

/// A calendar month. Orders chronologically; renders as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
  year:  i32,
  month: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid month {0:?}, expected YYYY-MM")]
pub struct ParseMonthError(String);

impl MonthKey {
  /// Returns `None` unless `month` is in `1..=12` and the year has four
  /// digits.
  pub fn new(year: i32, month: u32) -> Option<Self> {
    ((1000..=9999).contains(&year) && (1..=12).contains(&month))
      .then_some(Self { year, month })
  }

  /// The month containing `date`.
  pub fn of(date: NaiveDate) -> Self {
    Self { year: date.year(), month: date.month() }
  }

  pub fn year(self) -> i32 { self.year }

  pub fn month(self) -> u32 { self.month }

  /// The first day of the month; used as an exclusive upper date bound.
  pub fn first_day(self) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(self.year, self.month, 1)
  }
}

impl fmt::Display for MonthKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:04}-{:02}", self.year, self.month)
  }
}

impl FromStr for MonthKey {
  type Err = ParseMonthError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let err = || ParseMonthError(s.to_owned());
    let (year, month) = s.split_once('-').ok_or_else(err)?;
    if year.len() != 4 || month.len() != 2 {
      return Err(err());
    }
    let year = year.parse().map_err(|_| err())?;
    let month = month.parse().map_err(|_| err())?;
    Self::new(year, month).ok_or_else(err)
  }
}

impl Serialize for MonthKey {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for MonthKey {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(de::Error::custom)
  }
}

// ─── Group keys ──────────────────────────────────────────────────────────────

/// One component of a composite group key.
///
/// Variant order matters only for mixed keys, which never occur: every key
/// produced by a given [`crate::group::GroupKey`] has the same shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyPart {
  Text(String),
  Year(i32),
  Month(MonthKey),
}

impl fmt::Display for KeyPart {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Text(s) => f.write_str(s),
      Self::Year(y) => write!(f, "{y}"),
      Self::Month(m) => write!(f, "{m}"),
    }
  }
}

/// A composite group key, outermost component first.
pub type Bucket = Vec<KeyPart>;
