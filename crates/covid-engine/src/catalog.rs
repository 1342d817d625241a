//! The view catalog: every named view, its route and its pipeline.
//!
//! The catalog is built once from [`CatalogOptions`] and never mutated, so a
//! single instance can be shared by reference across concurrent requests.

use std::collections::BTreeMap;

use covid_core::{
  Error, Result,
  measure::MeasureSummary,
  policy::PolicySummary,
  record::Metric,
  store::{MeasureQuery, PolicyQuery, RecordFilter, RecordQuery, RecordStore},
};
use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{
  bucket::{KeyPart, MonthKey},
  group::{GroupKey, Reducer, group},
  pipeline::{Aggregate, Rank, Score, Shape, Transform, aggregate},
  rank::{DENYLIST, TopN},
  ratio::{MissingPolicy, PercentFormat},
  recovery::{MonthlyCounts, estimate_recoveries},
  value::{Mapping, Value},
};

/// The six inhabited continents, as they appear in the `continent` column.
pub const CONTINENTS: &[&str] =
  &["Africa", "Asia", "Europe", "North America", "Oceania", "South America"];

/// Locations compared by the recovered-share view.
pub const RECOVERY_REGIONS: &[&str] = &[
  "European Union (27)",
  "Europe",
  "Oceania",
  "North America",
  "South America",
  "South Africa",
  "Asia",
  "Africa",
  "Central African Republic",
];

/// Number of rows returned by the sample views.
pub const SAMPLE_LIMIT: usize = 10;

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
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ViewName {
  RecordsSample,
  RecordById,
  WorldTotals,
  SummedTotals,
  TotalCasesByCountry,
  TotalDeathsByCountry,
  TotalRecoveredByCountry,
  TotalVaccinatedByCountry,
  Top10CountriesByCases,
  Top10CountriesByDeaths,
  Top10CountriesByRecovered,
  Top10CountriesByVaccination,
  ContinentsNewCasesPerMonth,
  ContinentsNewDeathsPerMonth,
  ContinentsNewVaccinationsPerMonth,
  ContinentsEstimatedRecoveriesPerMonth,
  VaccinationRateLatest,
  Top10AvgCasesPerMillion,
  RecoveredShareByRegion,
  IcuShareByContinent,
  MeasuresSample,
  MeasuresSummary,
  AvgStringencyByMonth,
  AvgStringencyByMonthForCountry,
  MonthlyNewCasesForCountry,
  MonthlyNewDeathsForCountry,
  MonthlyRecoveredForCountry,
  MonthlyNewVaccinationsForCountry,
  AvgPopulationByContinent,
  AvgHospitalBedsByContinent,
  HospitalBedsVsDeathRate,
  HandwashingFacilitiesVsCases,
  PoliciesSample,
  PoliciesForCountry,
  PolicyCategoriesForCountry,
}

impl ViewName {
  pub fn as_str(self) -> &'static str { self.into() }
}

/// The path parameter a view takes, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Param {
  None,
  /// A location name, or an ISO code for policy views.
  Country,
  /// A record primary key.
  Id,
}

/// How a view computes its result.
#[derive(Debug, Clone, PartialEq)]
pub enum Pipeline {
  Aggregate(Aggregate),
  /// Monthly recovery estimates per continent.
  Recoveries { continents: Vec<String> },
  Records { limit: usize },
  RecordById,
  Measures { limit: Option<usize> },
  MeasureSummary,
  Policies { limit: Option<usize> },
  PoliciesForCountry,
  /// Tally of policy categories for one authorizing country.
  PolicyCategories,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewSpec {
  pub name:                 ViewName,
  /// Route template with `{param}` placeholders.
  pub route:                &'static str,
  /// Extra routes serving the same view.
  pub aliases:              &'static [&'static str],
  pub summary:              &'static str,
  pub param:                Param,
  pub pipeline:             Pipeline,
  /// An empty result is reported as [`Error::NotFound`].
  pub not_found_when_empty: bool,
}

/// Deployment-specific view settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogOptions {
  /// Months at or after this one are dropped from the all-countries
  /// stringency view.
  pub stringency_cutoff:            Option<MonthKey>,
  /// Decimal places for the top-10 vaccination percentages.
  pub vaccination_percent_decimals: Option<u32>,
}

impl Default for CatalogOptions {
  fn default() -> Self {
    Self {
      stringency_cutoff:            MonthKey::new(2023, 1),
      vaccination_percent_decimals: Some(2),
    }
  }
}

/// Path parameters bound to a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewParams {
  pub country: Option<String>,
  pub id:      Option<String>,
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ViewCatalog {
  views: BTreeMap<ViewName, ViewSpec>,
}

impl Default for ViewCatalog {
  fn default() -> Self { Self::new(CatalogOptions::default()) }
}

impl ViewCatalog {
  pub fn new(options: CatalogOptions) -> Self {
    let views = ViewName::iter().map(|name| (name, build(name, &options))).collect();
    Self { views }
  }

  pub fn get(&self, name: ViewName) -> Option<&ViewSpec> { self.views.get(&name) }

  /// Look a view up by its snake_case name.
  pub fn resolve(&self, name: &str) -> Result<&ViewSpec> {
    name
      .parse::<ViewName>()
      .ok()
      .and_then(|n| self.get(n))
      .ok_or_else(|| Error::UnknownView(name.to_owned()))
  }

  /// Every view in name order.
  pub fn iter(&self) -> impl Iterator<Item = &ViewSpec> { self.views.values() }

  pub fn len(&self) -> usize { self.views.len() }

  pub fn is_empty(&self) -> bool { self.views.is_empty() }

  /// Execute one view against `store`.
  pub async fn run<S: RecordStore>(
    &self,
    store: &S,
    name: ViewName,
    params: &ViewParams,
  ) -> Result<Value> {
    let view = self
      .get(name)
      .ok_or_else(|| Error::UnknownView(name.to_string()))?;

    let country = match view.param {
      Param::Country => Some(required(name, "country", params.country.as_deref())?),
      _ => None,
    };

    let value = match &view.pipeline {
      Pipeline::Aggregate(agg) => {
        let mut query = agg.query();
        if let Some(country) = country {
          query.filter.location = Some(country.to_owned());
        }
        let rows = store.fetch_records(&query).await.map_err(Error::store)?;
        tracing::debug!(view = %name, rows = rows.len(), "aggregating");
        aggregate(&rows, agg)
      }

      Pipeline::Recoveries { continents } => {
        let query = RecordQuery {
          filter:  RecordFilter {
            continents: continents.clone(),
            non_null: vec![Metric::NewCases, Metric::NewDeaths],
            ..Default::default()
          },
          metrics: vec![Metric::NewCases, Metric::NewDeaths],
        };
        let rows = store.fetch_records(&query).await.map_err(Error::store)?;
        tracing::debug!(view = %name, rows = rows.len(), "estimating recoveries");
        recoveries(&rows)
      }

      Pipeline::Records { limit } => {
        let rows = store.list_records(*limit).await.map_err(Error::store)?;
        Value::from_serialize(&rows)?
      }

      Pipeline::RecordById => {
        let raw = required(name, "id", params.id.as_deref())?;
        let id: i64 = raw.parse().map_err(|_| Error::InvalidParameter {
          param: "id",
          value: raw.to_owned(),
        })?;
        let record = store
          .get_record(id)
          .await
          .map_err(Error::store)?
          .ok_or_else(|| Error::NotFound(format!("record {id}")))?;
        Value::from_serialize(&record)?
      }

      Pipeline::Measures { limit } => {
        let query = MeasureQuery { country: None, limit: *limit };
        let rows = store.fetch_measures(&query).await.map_err(Error::store)?;
        Value::from_serialize(&rows)?
      }

      Pipeline::MeasureSummary => {
        let rows = store
          .fetch_measures(&MeasureQuery::default())
          .await
          .map_err(Error::store)?;
        let summary: Vec<MeasureSummary> = rows.iter().map(MeasureSummary::from).collect();
        Value::from_serialize(&summary)?
      }

      Pipeline::Policies { limit } => {
        let query = PolicyQuery { authorizing_country_iso: None, limit: *limit };
        let rows = store.fetch_policies(&query).await.map_err(Error::store)?;
        Value::from_serialize(&rows)?
      }

      Pipeline::PoliciesForCountry => {
        let rows = store
          .fetch_policies(&policy_query(country))
          .await
          .map_err(Error::store)?;
        let summary: Vec<PolicySummary> = rows.iter().map(PolicySummary::from).collect();
        Value::from_serialize(&summary)?
      }

      Pipeline::PolicyCategories => {
        let rows = store
          .fetch_policies(&policy_query(country))
          .await
          .map_err(Error::store)?;
        let mut tally: BTreeMap<&str, i64> = BTreeMap::new();
        for category in rows.iter().filter_map(|p| p.policy_category.as_deref()) {
          *tally.entry(category).or_default() += 1;
        }
        Value::Map(tally.into_iter().collect())
      }
    };

    if view.not_found_when_empty && value.is_empty() {
      let subject = country.map_or_else(|| name.to_string(), ToOwned::to_owned);
      return Err(Error::NotFound(subject));
    }
    Ok(value)
  }
}

fn required<'a>(view: ViewName, param: &'static str, value: Option<&'a str>) -> Result<&'a str> {
  value.ok_or(Error::MissingParameter { view: view.as_str(), param })
}

fn policy_query(iso: Option<&str>) -> PolicyQuery {
  PolicyQuery { authorizing_country_iso: iso.map(ToOwned::to_owned), limit: None }
}

/// continent → month → estimated recoveries.
fn recoveries(rows: &[covid_core::record::EpidemiologicalRecord]) -> Value {
  let sums = group(rows, GroupKey::ContinentMonth, &[
    Reducer::sum(Metric::NewCases),
    Reducer::sum(Metric::NewDeaths),
  ]);

  let mut per_continent: BTreeMap<String, BTreeMap<MonthKey, MonthlyCounts>> = BTreeMap::new();
  for (bucket, values) in sums {
    let [KeyPart::Text(continent), KeyPart::Month(month)] = bucket.as_slice() else { continue };
    let counts = MonthlyCounts {
      new_cases:  values[0].unwrap_or_default() as i64,
      new_deaths: values[1].unwrap_or_default() as i64,
    };
    per_continent.entry(continent.clone()).or_default().insert(*month, counts);
  }

  let mut out = Mapping::new();
  for (continent, months) in per_continent {
    let node = out.child(&continent);
    for (month, estimate) in estimate_recoveries(&months) {
      node.insert(month.to_string(), estimate);
    }
  }
  Value::Map(out)
}

// ─── View definitions ────────────────────────────────────────────────────────

fn strings(items: &[&str]) -> Vec<String> { items.iter().map(|s| (*s).to_owned()).collect() }

fn non_null(metrics: &[Metric]) -> RecordFilter {
  RecordFilter { non_null: metrics.to_vec(), ..Default::default() }
}

fn nested(filter: RecordFilter, group: GroupKey, reducers: Vec<Reducer>, transform: Transform) -> Pipeline {
  Pipeline::Aggregate(Aggregate { filter, group, reducers, transform, rank: None, shape: Shape::Nested })
}

fn top10(filter: RecordFilter, reducers: Vec<Reducer>, transform: Transform, score: Score) -> Pipeline {
  Pipeline::Aggregate(Aggregate {
    filter,
    group: GroupKey::Location,
    reducers,
    transform,
    rank: Some(Rank { score, top: TopN::default() }),
    shape: Shape::Nested,
  })
}

fn excluding_aggregates(mut filter: RecordFilter) -> RecordFilter {
  filter.exclude_locations = strings(DENYLIST);
  filter
}

fn continents_monthly_sum(metric: Metric) -> Pipeline {
  nested(
    RecordFilter { continents: strings(CONTINENTS), non_null: vec![metric], ..Default::default() },
    GroupKey::ContinentMonth,
    vec![Reducer::sum(metric)],
    Transform::Integer(0),
  )
}

fn country_monthly(reducer: Reducer, transform: Transform) -> Pipeline {
  nested(
    RecordFilter { non_null: reducer.operand.metrics(), ..Default::default() },
    GroupKey::Month,
    vec![reducer],
    transform,
  )
}

fn build(name: ViewName, options: &CatalogOptions) -> ViewSpec {
  use Metric::*;
  use ViewName as V;

  let omit = MissingPolicy::Omit;
  let zero = MissingPolicy::Default(0.0);
  let cases_per_capita = Transform::Ratio { num: 0, den: 1, format: None, missing: omit };
  let recovered_fraction = Transform::RecoveredFraction { cases: 0, deaths: 1, missing: zero };

  let (route, summary, param, pipeline) = match name {
    V::RecordsSample => (
      "/covid",
      "First records by id",
      Param::None,
      Pipeline::Records { limit: SAMPLE_LIMIT },
    ),
    V::RecordById => ("/covid/{id}", "One record by id", Param::Id, Pipeline::RecordById),
    V::WorldTotals => (
      "/totals",
      "Latest world totals with estimated recoveries",
      Param::None,
      nested(
        RecordFilter { location: Some("World".into()), ..Default::default() },
        GroupKey::Global,
        vec![
          Reducer::latest(TotalVaccinations),
          Reducer::latest(TotalDeaths),
          Reducer::latest(TotalCases),
        ],
        Transform::Fields(vec![
          ("total_vaccinations", Transform::Integer(0)),
          ("total_deaths", Transform::Integer(1)),
          ("total_estimated_recovered", Transform::Recovered { cases: 2, deaths: 1 }),
          ("total_cases", Transform::Integer(2)),
        ]),
      ),
    ),
    V::SummedTotals => (
      "/d1_0",
      "Column sums over every record",
      Param::None,
      nested(
        RecordFilter::default(),
        GroupKey::Global,
        vec![
          Reducer::sum(TotalVaccinations),
          Reducer::sum(TotalDeaths),
          Reducer::sum(TotalCases),
          Reducer::sum(TotalCasesPerMillion),
          Reducer::sum(TotalDeathsPerMillion),
        ],
        Transform::Fields(vec![
          ("total_vaccinations", Transform::Integer(0)),
          ("total_deaths", Transform::Integer(1)),
          ("total_estimated_recovered", Transform::Difference { a: 3, b: 4 }),
          ("total_cases", Transform::Integer(2)),
        ]),
      ),
    ),
    V::TotalCasesByCountry => (
      "/total_cases_by_country",
      "Peak cases per capita by location",
      Param::None,
      nested(
        non_null(&[TotalCases]),
        GroupKey::Location,
        vec![Reducer::max(TotalCases), Reducer::max(Population)],
        cases_per_capita.clone(),
      ),
    ),
    V::TotalDeathsByCountry => (
      "/total_deaths_by_country",
      "Case-fatality ratio by location",
      Param::None,
      nested(
        non_null(&[TotalDeaths]),
        GroupKey::Location,
        vec![Reducer::max(TotalDeaths), Reducer::max(TotalCases)],
        Transform::Ratio { num: 0, den: 1, format: None, missing: omit },
      ),
    ),
    V::TotalRecoveredByCountry => (
      "/total_recovered_by_country",
      "Estimated recovered fraction by location",
      Param::None,
      nested(
        RecordFilter::default(),
        GroupKey::Location,
        vec![Reducer::max(TotalCases), Reducer::max(TotalDeaths)],
        recovered_fraction.clone(),
      ),
    ),
    V::TotalVaccinatedByCountry => (
      "/total_vaccinated_by_country",
      "Fully vaccinated fraction by location",
      Param::None,
      nested(
        non_null(&[PeopleFullyVaccinated]),
        GroupKey::Location,
        vec![Reducer::max(PeopleFullyVaccinated), Reducer::max(Population)],
        Transform::Ratio { num: 0, den: 1, format: None, missing: zero },
      ),
    ),
    V::Top10CountriesByCases => (
      "/top10_countries_by_cases",
      "Ten countries with the most cases, as cases per capita",
      Param::None,
      top10(
        excluding_aggregates(non_null(&[TotalCases])),
        vec![Reducer::max(TotalCases), Reducer::max(Population)],
        cases_per_capita,
        Score::Reducer(0),
      ),
    ),
    V::Top10CountriesByDeaths => (
      "/top10_countries_by_deaths",
      "Ten countries with the most deaths, as case-fatality ratio",
      Param::None,
      top10(
        excluding_aggregates(non_null(&[TotalDeaths])),
        vec![Reducer::max(TotalDeaths), Reducer::max(TotalCases)],
        Transform::Ratio { num: 0, den: 1, format: None, missing: omit },
        Score::Reducer(0),
      ),
    ),
    V::Top10CountriesByRecovered => (
      "/top10_countries_by_recovered",
      "Ten countries with the highest recovered fraction",
      Param::None,
      top10(
        excluding_aggregates(RecordFilter::default()),
        vec![Reducer::max(TotalCases), Reducer::max(TotalDeaths)],
        recovered_fraction,
        Score::Output,
      ),
    ),
    V::Top10CountriesByVaccination => (
      "/top10_countries_by_vaccination",
      "Ten countries with the most fully vaccinated people, as a percentage",
      Param::None,
      top10(
        excluding_aggregates(non_null(&[PeopleFullyVaccinated])),
        vec![Reducer::max(PeopleFullyVaccinated), Reducer::max(Population)],
        Transform::Ratio {
          num:     0,
          den:     1,
          format:  Some(PercentFormat {
            decimals: options.vaccination_percent_decimals,
            clamp:    true,
          }),
          missing: omit,
        },
        Score::Reducer(0),
      ),
    ),
    V::ContinentsNewCasesPerMonth => (
      "/continents_new_cases_per_month",
      "New cases per continent and month",
      Param::None,
      continents_monthly_sum(NewCases),
    ),
    V::ContinentsNewDeathsPerMonth => (
      "/continents_new_deaths_per_month",
      "New deaths per continent and month",
      Param::None,
      continents_monthly_sum(NewDeaths),
    ),
    V::ContinentsNewVaccinationsPerMonth => (
      "/continents_new_vaccinations_per_month",
      "New vaccinations per continent and month",
      Param::None,
      continents_monthly_sum(NewVaccinations),
    ),
    V::ContinentsEstimatedRecoveriesPerMonth => (
      "/continents_estimated_recoveries_per_month",
      "Estimated recoveries per continent and month",
      Param::None,
      Pipeline::Recoveries { continents: strings(CONTINENTS) },
    ),
    V::VaccinationRateLatest => (
      "/d1_1",
      "Fully vaccinated percentage on the latest reported date",
      Param::None,
      nested(
        RecordFilter { positive: vec![PeopleFullyVaccinated, Population], ..Default::default() },
        GroupKey::Location,
        vec![Reducer::latest(PeopleFullyVaccinated), Reducer::latest(Population)],
        Transform::Ratio {
          num:     0,
          den:     1,
          format:  Some(PercentFormat { decimals: None, clamp: true }),
          missing: omit,
        },
      ),
    ),
    V::Top10AvgCasesPerMillion => (
      "/d1_2",
      "Ten locations with the highest average cases per million",
      Param::None,
      top10(
        excluding_aggregates(RecordFilter::default()),
        vec![Reducer::sum(TotalCasesPerMillion), Reducer::count_rows()],
        Transform::Ratio { num: 0, den: 1, format: None, missing: omit },
        Score::Output,
      ),
    ),
    V::RecoveredShareByRegion => (
      "/recovered_globally",
      "Share of estimated recoveries per region",
      Param::None,
      nested(
        RecordFilter { locations: strings(RECOVERY_REGIONS), ..Default::default() },
        GroupKey::Location,
        vec![Reducer::sum_difference(TotalCasesPerMillion, TotalDeathsPerMillion)],
        Transform::Share { reducer: 0, within: 0, decimals: None },
      ),
    ),
    V::IcuShareByContinent => (
      "/d2_0",
      "ICU patients per continent as a share of the year's continental total; rows without a continent are left out",
      Param::None,
      Pipeline::Aggregate(Aggregate {
        filter:    non_null(&[IcuPatients]),
        group:     GroupKey::YearContinent,
        reducers:  vec![Reducer::sum(IcuPatients)],
        transform: Transform::StrictFields(vec![
          ("icu_patients", Transform::Integer(0)),
          ("percentage", Transform::Share { reducer: 0, within: 1, decimals: None }),
        ]),
        rank:      None,
        shape:     Shape::GroupedRows(&["continent"]),
      }),
    ),
    V::MeasuresSample => (
      "/measures",
      "First measure log entries",
      Param::None,
      Pipeline::Measures { limit: Some(SAMPLE_LIMIT) },
    ),
    V::MeasuresSummary => (
      "/full_measures_data",
      "Every measure as country, region, category and date",
      Param::None,
      Pipeline::MeasureSummary,
    ),
    V::AvgStringencyByMonth => (
      "/avg_stringency_by_month",
      "Average stringency index per location and month",
      Param::None,
      nested(
        RecordFilter {
          before: options.stringency_cutoff.and_then(MonthKey::first_day),
          non_null: vec![StringencyIndex],
          ..Default::default()
        },
        GroupKey::LocationMonth,
        vec![Reducer::avg(StringencyIndex)],
        Transform::Number { reducer: 0, decimals: None },
      ),
    ),
    V::AvgStringencyByMonthForCountry => (
      "/avg_stringency_by_month/{country}",
      "Average stringency index per month for one location",
      Param::Country,
      country_monthly(Reducer::avg(StringencyIndex), Transform::Number {
        reducer:  0,
        decimals: None,
      }),
    ),
    V::MonthlyNewCasesForCountry => (
      "/max_cases_per_month/{country}",
      "New cases per month for one location",
      Param::Country,
      country_monthly(Reducer::sum(NewCases), Transform::Integer(0)),
    ),
    V::MonthlyNewDeathsForCountry => (
      "/max_deaths_per_month/{country}",
      "New deaths per month for one location",
      Param::Country,
      country_monthly(Reducer::sum(NewDeaths), Transform::Integer(0)),
    ),
    V::MonthlyRecoveredForCountry => (
      "/max_recovered_per_month/{country}",
      "Estimated recoveries per month for one location",
      Param::Country,
      country_monthly(Reducer::sum_difference(NewCases, NewDeaths), Transform::NonNegative(0)),
    ),
    V::MonthlyNewVaccinationsForCountry => (
      "/max_vaccinations_per_month/{country}",
      "New vaccinations per month for one location",
      Param::Country,
      country_monthly(Reducer::sum(NewVaccinations), Transform::Integer(0)),
    ),
    V::AvgPopulationByContinent => (
      "/continent_vs_population",
      "Average population per continent; rows without a continent are left out",
      Param::None,
      nested(
        non_null(&[Population]),
        GroupKey::Continent,
        vec![Reducer::avg(Population)],
        Transform::Rounded(0),
      ),
    ),
    V::AvgHospitalBedsByContinent => (
      "/avg_hospital_beds_by_continent",
      "Average hospital beds per thousand by continent and location; rows without a continent are left out",
      Param::None,
      nested(
        non_null(&[HospitalBedsPerThousand]),
        GroupKey::ContinentLocation,
        vec![Reducer::avg(HospitalBedsPerThousand)],
        Transform::Number { reducer: 0, decimals: Some(3) },
      ),
    ),
    V::HospitalBedsVsDeathRate => (
      "/hospital_beds_vs_death_rate",
      "Average deaths per million against hospital beds per thousand; rows without a continent are left out",
      Param::None,
      Pipeline::Aggregate(Aggregate {
        filter:    RecordFilter {
          exclude_locations: strings(&["World"]),
          non_null: vec![TotalDeathsPerMillion, HospitalBedsPerThousand],
          ..Default::default()
        },
        group:     GroupKey::ContinentLocation,
        reducers:  vec![Reducer::avg(TotalDeathsPerMillion), Reducer::avg(HospitalBedsPerThousand)],
        transform: Transform::StrictFields(vec![
          ("avg_deaths", Transform::Rounded(0)),
          ("avg_beds", Transform::Number { reducer: 1, decimals: Some(3) }),
        ]),
        rank:      None,
        shape:     Shape::Rows(&["continent", "country"]),
      }),
    ),
    V::HandwashingFacilitiesVsCases => (
      "/handwashing_facilities_vs_cases",
      "Average handwashing facilities against cases per million; rows without a continent are left out",
      Param::None,
      Pipeline::Aggregate(Aggregate {
        filter:    RecordFilter {
          exclude_locations: strings(&["World"]),
          non_null: vec![HandwashingFacilities, TotalCasesPerMillion],
          ..Default::default()
        },
        group:     GroupKey::ContinentLocation,
        reducers:  vec![Reducer::avg(HandwashingFacilities), Reducer::avg(TotalCasesPerMillion)],
        transform: Transform::StrictFields(vec![
          ("avg_handwashing_facilities", Transform::Number { reducer: 0, decimals: Some(2) }),
          ("avg_total_cases_per_million", Transform::Rounded(1)),
        ]),
        rank:      None,
        shape:     Shape::Rows(&["continent", "country"]),
      }),
    ),
    V::PoliciesSample => (
      "/policies",
      "First policy actions",
      Param::None,
      Pipeline::Policies { limit: Some(SAMPLE_LIMIT) },
    ),
    V::PoliciesForCountry => (
      "/policies/{country}",
      "Policies authorized by one country, by ISO code",
      Param::Country,
      Pipeline::PoliciesForCountry,
    ),
    V::PolicyCategoriesForCountry => (
      "/policy_categories/{country}",
      "Policy counts per category for one country, by ISO code",
      Param::Country,
      Pipeline::PolicyCategories,
    ),
  };

  let aliases: &'static [&'static str] = match name {
    V::RecoveredShareByRegion => &["/d1_3"],
    _ => &[],
  };

  ViewSpec {
    name,
    route,
    aliases,
    summary,
    param,
    pipeline,
    not_found_when_empty: name == V::AvgStringencyByMonthForCountry,
  }
}

#[cfg(test)]
mod tests;
