//! Epidemiological records — one row per (location, date).
//!
//! Records are immutable once loaded. Every numeric column is addressed
//! through [`Metric`], so the engine, the stores and the JSON projection all
//! agree on a single list of column names.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer, ser::SerializeMap};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

// ─── Metric ──────────────────────────────────────────────────────────────────

/// A numeric column of the epidemiological table.
///
/// The string form (via `strum` and `serde`) is the column name.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
  // ── Cases and deaths ────────────────────────────────────────────────────
  TotalCases,
  NewCases,
  NewCasesSmoothed,
  TotalDeaths,
  NewDeaths,
  NewDeathsSmoothed,
  TotalCasesPerMillion,
  NewCasesPerMillion,
  NewCasesSmoothedPerMillion,
  TotalDeathsPerMillion,
  NewDeathsPerMillion,
  NewDeathsSmoothedPerMillion,
  ReproductionRate,

  // ── Hospitalisation ─────────────────────────────────────────────────────
  IcuPatients,
  IcuPatientsPerMillion,
  HospPatients,
  HospPatientsPerMillion,
  WeeklyIcuAdmissions,
  WeeklyIcuAdmissionsPerMillion,
  WeeklyHospAdmissions,
  WeeklyHospAdmissionsPerMillion,

  // ── Testing ─────────────────────────────────────────────────────────────
  TotalTests,
  NewTests,
  TotalTestsPerThousand,
  NewTestsPerThousand,
  NewTestsSmoothed,
  NewTestsSmoothedPerThousand,
  PositiveRate,
  TestsPerCase,

  // ── Vaccination ─────────────────────────────────────────────────────────
  TotalVaccinations,
  PeopleVaccinated,
  PeopleFullyVaccinated,
  TotalBoosters,
  NewVaccinations,
  NewVaccinationsSmoothed,
  TotalVaccinationsPerHundred,
  PeopleVaccinatedPerHundred,
  PeopleFullyVaccinatedPerHundred,
  TotalBoostersPerHundred,
  NewVaccinationsSmoothedPerMillion,
  NewPeopleVaccinatedSmoothed,
  NewPeopleVaccinatedSmoothedPerHundred,

  // ── Policy and demographic covariates ───────────────────────────────────
  StringencyIndex,
  PopulationDensity,
  MedianAge,
  #[serde(rename = "aged_65_older")]
  #[strum(serialize = "aged_65_older")]
  Aged65Older,
  #[serde(rename = "aged_70_older")]
  #[strum(serialize = "aged_70_older")]
  Aged70Older,
  GdpPerCapita,
  ExtremePoverty,
  CardiovascDeathRate,
  DiabetesPrevalence,
  FemaleSmokers,
  MaleSmokers,
  HandwashingFacilities,
  HospitalBedsPerThousand,
  LifeExpectancy,
  HumanDevelopmentIndex,
  Population,

  // ── Excess mortality ────────────────────────────────────────────────────
  ExcessMortalityCumulativeAbsolute,
  ExcessMortalityCumulative,
  ExcessMortality,
  ExcessMortalityCumulativePerMillion,
}

impl Metric {
  /// The column name in the `covid_data` table.
  pub fn column(self) -> &'static str { self.into() }

  /// Whether the column holds a whole-number count (serialised as an
  /// integer) rather than a measurement.
  pub fn is_count(self) -> bool {
    matches!(
      self,
      Self::TotalCases
        | Self::NewCases
        | Self::TotalDeaths
        | Self::NewDeaths
        | Self::IcuPatients
        | Self::HospPatients
        | Self::WeeklyIcuAdmissions
        | Self::WeeklyHospAdmissions
        | Self::TotalTests
        | Self::NewTests
        | Self::TotalVaccinations
        | Self::PeopleVaccinated
        | Self::PeopleFullyVaccinated
        | Self::TotalBoosters
        | Self::NewVaccinations
        | Self::Population
    )
  }

  /// All metrics in table column order.
  pub fn all() -> impl Iterator<Item = Metric> { Self::iter() }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// One row of the epidemiological table.
///
/// `date` is `None` for rows the import left undated. `metrics` only holds non-null values; a missing key is a SQL `NULL`. When
/// a record was fetched with a projection, only the projected metrics are
/// present.
#[derive(Debug, Clone, PartialEq)]
pub struct EpidemiologicalRecord {
  pub id:          i64,
  pub iso_code:    Option<String>,
  pub continent:   Option<String>,
  pub location:    String,
  pub date:        Option<NaiveDate>,
  pub tests_units: Option<String>,
  pub metrics:     BTreeMap<Metric, f64>,
}

impl EpidemiologicalRecord {
  /// A record with no metric values. Pass `None` for an undated row.
  pub fn new(id: i64, location: impl Into<String>, date: impl Into<Option<NaiveDate>>) -> Self {
    Self {
      id,
      iso_code: None,
      continent: None,
      location: location.into(),
      date: date.into(),
      tests_units: None,
      metrics: BTreeMap::new(),
    }
  }

  /// Builder-style setter for the continent.
  pub fn with_continent(mut self, continent: impl Into<String>) -> Self {
    self.continent = Some(continent.into());
    self
  }

  /// Builder-style setter for a single metric value.
  pub fn with(mut self, metric: Metric, value: f64) -> Self {
    self.metrics.insert(metric, value);
    self
  }

  /// The value of `metric`, or `None` if it is null for this row.
  pub fn metric(&self, metric: Metric) -> Option<f64> {
    self.metrics.get(&metric).copied()
  }
}

/// Serialises as a flat object listing every column, `null` for absent
/// metrics, counts as integers.
impl Serialize for EpidemiologicalRecord {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(None)?;
    map.serialize_entry("id", &self.id)?;
    map.serialize_entry("iso_code", &self.iso_code)?;
    map.serialize_entry("continent", &self.continent)?;
    map.serialize_entry("location", &self.location)?;
    map.serialize_entry("date", &self.date)?;
    for metric in Metric::all() {
      let value = self.metric(metric);
      if metric.is_count() {
        map.serialize_entry(metric.column(), &value.map(|v| v as i64))?;
      } else {
        map.serialize_entry(metric.column(), &value)?;
      }
    }
    map.serialize_entry("tests_units", &self.tests_units)?;
    map.end()
  }
}
