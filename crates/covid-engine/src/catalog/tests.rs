use chrono::NaiveDate;
use covid_core::{
  measure::MeasureRecord, memory::MemoryStore, policy::PolicyRecord,
  record::EpidemiologicalRecord,
};

use super::*;
use crate::rank::is_aggregate;

fn day(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

fn measure(id: i64, country: &str, category: &str) -> MeasureRecord {
  MeasureRecord {
    id,
    iso: "XXX".into(),
    country: country.into(),
    region: "Region".into(),
    admin_level_name: None,
    pcode: None,
    log_type: "Introduction / extension of measures".into(),
    category: category.into(),
    measure_type: "Schools closure".into(),
    targeted_pop_group: None,
    comments: None,
    non_compliance: "Not applicable".into(),
    date_implemented: Some(day(2020, 3, 1)),
    source: "Government".into(),
    source_type: "Government".into(),
    link: "https://example.org".into(),
    entry_date: Some(day(2020, 3, 2)),
    alternative_source: None,
  }
}

fn policy(id: &str, iso: &str, category: Option<&str>) -> PolicyRecord {
  PolicyRecord {
    unique_id: id.into(),
    authorizing_country_iso: Some(iso.into()),
    authorizing_country_name: Some(format!("Country {iso}")),
    policy_category: category.map(Into::into),
    effective_start_date: Some(day(2020, 4, 1)),
    ..Default::default()
  }
}

fn records() -> Vec<EpidemiologicalRecord> {
  use Metric::*;
  vec![
    EpidemiologicalRecord::new(1, "Chad", day(2020, 1, 15))
      .with_continent("Africa")
      .with(NewCases, 1000.0)
      .with(NewDeaths, 10.0)
      .with(TotalCases, 1000.0)
      .with(TotalDeaths, 10.0)
      .with(Population, 10_000.0)
      .with(StringencyIndex, 50.0)
      .with(IcuPatients, 5.0)
      .with(TotalCasesPerMillion, 100.0)
      .with(TotalDeathsPerMillion, 1.0)
      .with(HospitalBedsPerThousand, 0.4)
      .with(HandwashingFacilities, 5.7),
    EpidemiologicalRecord::new(2, "Chad", day(2020, 2, 15))
      .with_continent("Africa")
      .with(NewCases, 500.0)
      .with(NewDeaths, 20.0)
      .with(TotalCases, 1500.0)
      .with(TotalDeaths, 30.0)
      .with(Population, 10_000.0)
      .with(PeopleFullyVaccinated, 12_000.0)
      .with(StringencyIndex, 70.0)
      .with(IcuPatients, 15.0)
      .with(TotalCasesPerMillion, 150.0)
      .with(TotalDeathsPerMillion, 3.0)
      .with(HospitalBedsPerThousand, 0.4)
      .with(HandwashingFacilities, 5.7),
    EpidemiologicalRecord::new(3, "Chad", day(2023, 2, 1))
      .with_continent("Africa")
      .with(StringencyIndex, 10.0),
    EpidemiologicalRecord::new(4, "Peru", day(2020, 1, 20))
      .with_continent("South America")
      .with(NewCases, 200.0)
      .with(NewDeaths, 5.0)
      .with(NewVaccinations, 30.0)
      .with(TotalCases, 200.0)
      .with(TotalDeaths, 5.0)
      .with(Population, 1000.0)
      .with(PeopleFullyVaccinated, 500.0)
      .with(StringencyIndex, 40.0)
      .with(IcuPatients, 20.0)
      .with(TotalCasesPerMillion, 200.0)
      .with(TotalDeathsPerMillion, 5.0),
    EpidemiologicalRecord::new(5, "World", day(2020, 1, 15))
      .with(TotalCases, 2000.0)
      .with(TotalDeaths, 50.0),
    EpidemiologicalRecord::new(6, "World", day(2020, 2, 15))
      .with(TotalCases, 5000.0)
      .with(TotalDeaths, 100.0)
      .with(TotalVaccinations, 9000.0)
      .with(Population, 1e9)
      .with(PeopleFullyVaccinated, 1e8)
      .with(TotalCasesPerMillion, 5.0),
    EpidemiologicalRecord::new(7, "Asia", day(2020, 2, 15))
      .with(TotalCases, 1e6)
      .with(TotalDeaths, 1e4)
      .with(Population, 1e7)
      .with(PeopleFullyVaccinated, 1e7)
      .with(TotalCasesPerMillion, 1e5)
      .with(TotalDeathsPerMillion, 1e3),
  ]
}

fn store_with(records: Vec<EpidemiologicalRecord>) -> MemoryStore {
  MemoryStore::new(
    records,
    vec![measure(2, "Peru", "Lockdown"), measure(1, "Chad", "Movement restrictions")],
    vec![
      policy("p2", "USA", Some("Schools")),
      policy("p1", "USA", Some("Schools")),
      policy("p3", "USA", Some("Masks")),
      policy("p4", "GBR", None),
    ],
  )
}

fn store() -> MemoryStore { store_with(records()) }

async fn run(catalog: &ViewCatalog, name: ViewName, params: ViewParams) -> Result<Value> {
  catalog.run(&store(), name, &params).await
}

async fn run_plain(name: ViewName) -> Value {
  run(&ViewCatalog::default(), name, ViewParams::default()).await.unwrap()
}

async fn run_country(name: ViewName, country: &str) -> Result<Value> {
  let params = ViewParams { country: Some(country.into()), ..Default::default() };
  run(&ViewCatalog::default(), name, params).await
}

fn json(v: &Value) -> String { serde_json::to_string(v).unwrap() }

fn keys(v: &Value) -> Vec<&str> { v.as_map().unwrap().keys().collect() }

// ─── Registry ────────────────────────────────────────────────────────────────

#[test]
fn every_view_is_registered_once_with_a_unique_route() {
  let catalog = ViewCatalog::default();
  assert_eq!(catalog.len(), ViewName::iter().count());
  let mut routes: Vec<_> = catalog
    .iter()
    .flat_map(|v| std::iter::once(v.route).chain(v.aliases.iter().copied()))
    .collect();
  let mounted = routes.len();
  routes.sort();
  routes.dedup();
  assert_eq!(routes.len(), mounted);
  for view in catalog.iter() {
    assert!(view.route.starts_with('/'));
    assert!(view.aliases.iter().all(|a| a.starts_with('/') && !a.contains('{')), "{}", view.name);
    let templated = view.route.contains('{');
    assert_eq!(templated, view.param != Param::None, "{}", view.name);
  }
}

#[test]
fn recovered_share_keeps_its_short_route() {
  let catalog = ViewCatalog::default();
  let view = catalog.get(ViewName::RecoveredShareByRegion).unwrap();
  assert_eq!(view.route, "/recovered_globally");
  assert_eq!(view.aliases, ["/d1_3"]);
  assert_eq!(catalog.iter().map(|v| v.aliases.len()).sum::<usize>(), 1);
}

#[test]
fn resolve_by_name() {
  let catalog = ViewCatalog::default();
  assert_eq!(catalog.resolve("world_totals").unwrap().route, "/totals");
  assert!(matches!(catalog.resolve("nope"), Err(Error::UnknownView(_))));
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_by_id_found_missing_and_invalid() {
  let catalog = ViewCatalog::default();
  let by_id = |id: &str| ViewParams { id: Some(id.into()), ..Default::default() };

  let rec = run(&catalog, ViewName::RecordById, by_id("4")).await.unwrap();
  assert_eq!(rec.as_map().unwrap().get("location"), Some(&Value::from("Peru")));

  let missing = run(&catalog, ViewName::RecordById, by_id("99")).await;
  assert!(matches!(missing, Err(Error::NotFound(_))));

  let invalid = run(&catalog, ViewName::RecordById, by_id("abc")).await;
  assert!(matches!(invalid, Err(Error::InvalidParameter { param: "id", .. })));

  let absent = run(&catalog, ViewName::RecordById, ViewParams::default()).await;
  assert!(matches!(absent, Err(Error::MissingParameter { param: "id", .. })));
}

#[tokio::test]
async fn samples_are_capped() {
  let records = run_plain(ViewName::RecordsSample).await;
  assert_eq!(records.as_list().unwrap().len(), 7);
  let measures = run_plain(ViewName::MeasuresSample).await;
  let first = &measures.as_list().unwrap()[0];
  assert_eq!(first.as_map().unwrap().get("id"), Some(&Value::Int(1)));
  let policies = run_plain(ViewName::PoliciesSample).await;
  assert_eq!(policies.as_list().unwrap().len(), 4);
}

#[tokio::test]
async fn measures_summary_projects_four_fields() {
  let out = run_plain(ViewName::MeasuresSummary).await;
  let row = out.as_list().unwrap()[0].as_map().unwrap();
  let mut fields: Vec<_> = row.keys().collect();
  fields.sort();
  assert_eq!(fields, ["category", "country", "date_implemented", "region"]);
}

// ─── Totals and ratios ───────────────────────────────────────────────────────

#[tokio::test]
async fn world_totals_use_latest_non_null() {
  let out = run_plain(ViewName::WorldTotals).await;
  assert_eq!(
    json(&out),
    r#"{"total_vaccinations":9000,"total_deaths":100,"total_estimated_recovered":4900,"total_cases":5000}"#
  );
}

#[tokio::test]
async fn world_totals_are_null_without_world_rows() {
  let catalog = ViewCatalog::default();
  let empty = MemoryStore::default();
  let out = catalog.run(&empty, ViewName::WorldTotals, &ViewParams::default()).await.unwrap();
  assert_eq!(
    json(&out),
    r#"{"total_vaccinations":null,"total_deaths":null,"total_estimated_recovered":null,"total_cases":null}"#
  );
}

#[tokio::test]
async fn ratios_by_country() {
  let cases = run_plain(ViewName::TotalCasesByCountry).await;
  assert_eq!(cases.as_map().unwrap().get("Chad"), Some(&Value::Float(0.15)));

  let recovered = run_plain(ViewName::TotalRecoveredByCountry).await;
  assert_eq!(recovered.as_map().unwrap().get("Peru"), Some(&Value::Float(195.0 / 200.0)));

  let vaccinated = run_plain(ViewName::TotalVaccinatedByCountry).await;
  assert_eq!(keys(&vaccinated), ["Asia", "Chad", "Peru", "World"]);
}

// ─── Top-N ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn top_n_views_never_list_aggregates() {
  for name in [
    ViewName::Top10CountriesByCases,
    ViewName::Top10CountriesByDeaths,
    ViewName::Top10CountriesByRecovered,
    ViewName::Top10CountriesByVaccination,
    ViewName::Top10AvgCasesPerMillion,
  ] {
    let out = run_plain(name).await;
    let names = keys(&out);
    assert!(!names.is_empty(), "{name}");
    assert!(names.len() <= 10);
    assert!(names.iter().all(|n| !is_aggregate(n)), "{name}: {names:?}");
  }
}

#[tokio::test]
async fn top_cases_ranked_by_count() {
  let out = run_plain(ViewName::Top10CountriesByCases).await;
  assert_eq!(keys(&out), ["Chad", "Peru"]);
}

#[tokio::test]
async fn vaccination_percentages_are_bounded_and_rounded() {
  let out = run_plain(ViewName::Top10CountriesByVaccination).await;
  let map = out.as_map().unwrap();
  for (_, v) in map.iter() {
    let pct = v.as_f64().unwrap();
    assert!((0.0..=100.0).contains(&pct));
  }
  assert_eq!(map.get("Chad"), Some(&Value::Float(100.0)));
  assert_eq!(map.get("Peru"), Some(&Value::Float(50.0)));

  let latest = run_plain(ViewName::VaccinationRateLatest).await;
  for (_, v) in latest.as_map().unwrap().iter() {
    assert!((0.0..=100.0).contains(&v.as_f64().unwrap()));
  }
}

#[tokio::test]
async fn vaccination_rounding_is_configurable() {
  let catalog = ViewCatalog::new(CatalogOptions {
    vaccination_percent_decimals: Some(0),
    ..Default::default()
  });
  let s = MemoryStore::from_records(vec![
    EpidemiologicalRecord::new(1, "Fiji", day(2021, 1, 1))
      .with(Metric::PeopleFullyVaccinated, 1.0)
      .with(Metric::Population, 3.0),
  ]);
  let out = catalog
    .run(&s, ViewName::Top10CountriesByVaccination, &ViewParams::default())
    .await
    .unwrap();
  assert_eq!(out.as_map().unwrap().get("Fiji"), Some(&Value::Float(33.0)));
}

// ─── Monthly views ───────────────────────────────────────────────────────────

#[tokio::test]
async fn continent_recoveries_follow_estimator() {
  let out = run_plain(ViewName::ContinentsEstimatedRecoveriesPerMonth).await;
  let africa = out.as_map().unwrap().get("Africa").and_then(Value::as_map).unwrap();
  assert_eq!(africa.get("2020-01"), Some(&Value::Int(790)));
  assert_eq!(africa.get("2020-02"), Some(&Value::Int(880)));
}

#[tokio::test]
async fn continent_monthly_sums_preserve_totals() {
  let out = run_plain(ViewName::ContinentsNewCasesPerMonth).await;
  let total: i64 = out
    .as_map()
    .unwrap()
    .iter()
    .flat_map(|(_, months)| months.as_map().unwrap().iter().map(|(_, v)| v.as_i64().unwrap()))
    .sum();
  assert_eq!(total, 1000 + 500 + 200);
}

#[tokio::test]
async fn month_keys_are_seven_chars() {
  let out = run_country(ViewName::MonthlyNewCasesForCountry, "Chad").await.unwrap();
  assert_eq!(json(&out), r#"{"2020-01":1000,"2020-02":500}"#);
  let out = run_plain(ViewName::AvgStringencyByMonth).await;
  for (_, months) in out.as_map().unwrap().iter() {
    for key in months.as_map().unwrap().keys() {
      assert_eq!(key.len(), 7);
      assert_eq!(&key[4..5], "-");
    }
  }
}

#[tokio::test]
async fn stringency_cutoff_is_configurable() {
  let out = run_plain(ViewName::AvgStringencyByMonth).await;
  let chad = out.as_map().unwrap().get("Chad").unwrap();
  assert_eq!(keys(chad), ["2020-01", "2020-02"]);

  let uncut = ViewCatalog::new(CatalogOptions { stringency_cutoff: None, ..Default::default() });
  let out = run(&uncut, ViewName::AvgStringencyByMonth, ViewParams::default()).await.unwrap();
  let chad = out.as_map().unwrap().get("Chad").unwrap();
  assert_eq!(keys(chad), ["2020-01", "2020-02", "2023-02"]);
}

#[tokio::test]
async fn stringency_for_unknown_country_is_not_found() {
  let err = run_country(ViewName::AvgStringencyByMonthForCountry, "Atlantis").await;
  assert!(matches!(err, Err(Error::NotFound(ref c)) if c == "Atlantis"));

  let ok = run_country(ViewName::AvgStringencyByMonthForCountry, "Chad").await.unwrap();
  assert_eq!(keys(&ok), ["2020-01", "2020-02", "2023-02"]);
}

#[tokio::test]
async fn other_country_views_are_empty_for_unknown_country() {
  for name in [
    ViewName::MonthlyNewCasesForCountry,
    ViewName::MonthlyNewDeathsForCountry,
    ViewName::MonthlyRecoveredForCountry,
    ViewName::MonthlyNewVaccinationsForCountry,
    ViewName::PoliciesForCountry,
    ViewName::PolicyCategoriesForCountry,
  ] {
    let out = run_country(name, "Atlantis").await.unwrap();
    assert!(out.is_empty(), "{name}");
  }
}

#[tokio::test]
async fn country_views_require_a_country() {
  let out = run(&ViewCatalog::default(), ViewName::MonthlyNewDeathsForCountry, ViewParams::default()).await;
  assert!(matches!(out, Err(Error::MissingParameter { param: "country", .. })));
}

#[tokio::test]
async fn monthly_recovered_is_non_negative_difference() {
  let out = run_country(ViewName::MonthlyRecoveredForCountry, "Chad").await.unwrap();
  assert_eq!(json(&out), r#"{"2020-01":990,"2020-02":480}"#);
}

// ─── Shares and continent views ──────────────────────────────────────────────

#[tokio::test]
async fn icu_shares_sum_to_one_hundred_per_year() {
  let out = run_plain(ViewName::IcuShareByContinent).await;
  let year = out.as_map().unwrap().get("2020").and_then(Value::as_list).unwrap();
  let total: f64 = year
    .iter()
    .map(|row| row.as_map().unwrap().get("percentage").unwrap().as_f64().unwrap())
    .sum();
  assert!((total - 100.0).abs() < 1e-9);
  assert_eq!(
    json(&year[0]),
    r#"{"continent":"Africa","icu_patients":20,"percentage":50.0}"#
  );
}

#[tokio::test]
async fn recovered_share_covers_listed_regions() {
  let out = run_plain(ViewName::RecoveredShareByRegion).await;
  assert_eq!(keys(&out), ["Asia"]);
  assert_eq!(out.as_map().unwrap().get("Asia"), Some(&Value::Float(100.0)));
}

#[tokio::test]
async fn continent_tables() {
  let pop = run_plain(ViewName::AvgPopulationByContinent).await;
  assert_eq!(json(&pop), r#"{"Africa":10000,"South America":1000}"#);

  let beds = run_plain(ViewName::HospitalBedsVsDeathRate).await;
  assert_eq!(
    json(&beds),
    r#"[{"continent":"Africa","country":"Chad","avg_deaths":2,"avg_beds":0.4}]"#
  );

  let wash = run_plain(ViewName::HandwashingFacilitiesVsCases).await;
  assert_eq!(
    json(&wash),
    r#"[{"continent":"Africa","country":"Chad","avg_handwashing_facilities":5.7,"avg_total_cases_per_million":125}]"#
  );
}

// ─── Policies ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn policies_for_country_in_id_order() {
  let out = run_country(ViewName::PoliciesForCountry, "USA").await.unwrap();
  let rows = out.as_list().unwrap();
  assert_eq!(rows.len(), 3);
  let first = rows[0].as_map().unwrap();
  assert_eq!(first.get("authorizing_country_iso"), Some(&Value::from("USA")));
  assert_eq!(first.get("effective_start_date"), Some(&Value::from("2020-04-01")));
}

#[tokio::test]
async fn policy_categories_are_tallied() {
  let out = run_country(ViewName::PolicyCategoriesForCountry, "USA").await.unwrap();
  assert_eq!(json(&out), r#"{"Masks":1,"Schools":2}"#);
  let none = run_country(ViewName::PolicyCategoriesForCountry, "GBR").await.unwrap();
  assert!(none.is_empty());
}

#[test]
fn continent_views_state_that_continentless_rows_are_left_out() {
  let mut flagged = Vec::new();
  for view in ViewCatalog::default().iter() {
    let Pipeline::Aggregate(agg) = &view.pipeline else { continue };
    let by_continent = matches!(
      agg.group,
      GroupKey::Continent | GroupKey::ContinentLocation | GroupKey::YearContinent
    );
    if by_continent && agg.filter.continents.is_empty() {
      assert!(view.summary.contains("rows without a continent are left out"), "{}", view.name);
      flagged.push(view.name);
    }
  }
  assert_eq!(flagged, [
    ViewName::IcuShareByContinent,
    ViewName::AvgPopulationByContinent,
    ViewName::AvgHospitalBedsByContinent,
    ViewName::HospitalBedsVsDeathRate,
    ViewName::HandwashingFacilitiesVsCases,
  ]);
}

// ─── Undated rows ────────────────────────────────────────────────────────────

#[tokio::test]
async fn undated_rows_only_reach_timeless_views() {
  let catalog = ViewCatalog::default();
  let mut rows = records();
  rows.push(
    EpidemiologicalRecord::new(8, "Chad", None)
      .with_continent("Africa")
      .with(Metric::NewCases, 400.0)
      .with(Metric::TotalCases, 3000.0)
      .with(Metric::StringencyIndex, 90.0)
      .with(Metric::IcuPatients, 40.0),
  );
  let undated = store_with(rows);
  let params = ViewParams::default();

  let cases = catalog.run(&undated, ViewName::TotalCasesByCountry, &params).await.unwrap();
  assert_eq!(cases.as_map().unwrap().get("Chad"), Some(&Value::Float(0.3)));

  let stringency = catalog.run(&undated, ViewName::AvgStringencyByMonth, &params).await.unwrap();
  assert_eq!(keys(stringency.as_map().unwrap().get("Chad").unwrap()), ["2020-01", "2020-02"]);

  let chad = ViewParams { country: Some("Chad".into()), ..Default::default() };
  let monthly = catalog.run(&undated, ViewName::MonthlyNewCasesForCountry, &chad).await.unwrap();
  assert_eq!(keys(&monthly), ["2020-01", "2020-02"]);

  for name in [ViewName::IcuShareByContinent, ViewName::AvgStringencyByMonthForCountry] {
    let with = catalog.run(&undated, name, &chad).await.unwrap();
    let without = catalog.run(&store(), name, &chad).await.unwrap();
    assert_eq!(json(&with), json(&without), "{name}");
  }

  let sample = catalog.run(&undated, ViewName::RecordsSample, &params).await.unwrap();
  assert!(json(&sample).contains(r#""continent":"Africa","location":"Chad","date":null"#));
}

// ─── Determinism ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn every_view_is_idempotent() {
  let catalog = ViewCatalog::default();
  let params = ViewParams { country: Some("Chad".into()), id: Some("1".into()) };
  for view in catalog.iter() {
    let a = catalog.run(&store(), view.name, &params).await.unwrap();
    let b = catalog.run(&store(), view.name, &params).await.unwrap();
    assert_eq!(json(&a), json(&b), "{}", view.name);
  }
}
