//! SQL schema of the three record tables.
//!
//! Production databases are loaded by an external import job and opened
//! read-only; this DDL only runs for in-memory stores.

use covid_core::record::Metric;

/// Tables the store reads from.
pub const TABLES: [&str; 3] = ["covid_data", "measures_data", "policy_data"];

/// Non-metric columns of `covid_data`, in select order.
pub const RECORD_KEY_COLUMNS: &str = "id, iso_code, continent, location, date, tests_units";

pub const MEASURE_COLUMNS: &str = "id, iso, country, region, admin_level_name, pcode, log_type,
  category, measure_type, targeted_pop_group, comments, non_compliance, date_implemented,
  source, source_type, link, entry_date, alternative_source";

pub const POLICY_COLUMNS: &str = "unique_id,
  authorizing_level_of_government, authorizing_country_name, authorizing_country_iso,
  authorizing_state_province, authorizing_local_area, authorizing_local_area_code,
  authorizing_role, authorizing_body, name_of_official,
  affected_level_of_government, affected_country_name, affected_country_iso,
  affected_state_province, affected_local_area, affected_local_area_code,
  policy_relaxing_or_restricting, policy_category, policy_subcategory, policy_target,
  policy_description, issued_date, effective_start_date, anticipated_end_date,
  actual_end_date, intended_duration, prior_row_id_linked,
  data_source_for_policy_announcement, policy_law_name, policy_law_type,
  data_source_for_law_policy, pdf_file_name, attachment_for_policy, policy_number,
  authorizing_entity_has_authority, relevant_authority, data_source_for_authority,
  home_rule_state, dillons_rule_state";

const MEASURES_DDL: &str = "
CREATE TABLE IF NOT EXISTS measures_data (
    id                 INTEGER PRIMARY KEY,
    iso                TEXT NOT NULL,
    country            TEXT NOT NULL,
    region             TEXT NOT NULL,
    admin_level_name   TEXT,
    pcode              TEXT,
    log_type           TEXT NOT NULL,
    category           TEXT NOT NULL,
    measure_type       TEXT NOT NULL,
    targeted_pop_group TEXT,             -- 'checked' or empty
    comments           TEXT,
    non_compliance     TEXT NOT NULL,
    date_implemented   TEXT,             -- YYYY-MM-DD
    source             TEXT NOT NULL,
    source_type        TEXT NOT NULL,
    link               TEXT NOT NULL,
    entry_date         TEXT,
    alternative_source TEXT
);
";

const POLICY_DDL: &str = "
CREATE TABLE IF NOT EXISTS policy_data (
    unique_id                           TEXT PRIMARY KEY,
    authorizing_level_of_government     TEXT,
    authorizing_country_name            TEXT,
    authorizing_country_iso             TEXT,
    authorizing_state_province          TEXT,
    authorizing_local_area              TEXT,
    authorizing_local_area_code         TEXT,
    authorizing_role                    TEXT,
    authorizing_body                    TEXT,
    name_of_official                    TEXT,
    affected_level_of_government        TEXT,
    affected_country_name               TEXT,
    affected_country_iso                TEXT,
    affected_state_province             TEXT,
    affected_local_area                 TEXT,
    affected_local_area_code            TEXT,
    policy_relaxing_or_restricting      TEXT,
    policy_category                     TEXT,
    policy_subcategory                  TEXT,
    policy_target                       TEXT,
    policy_description                  TEXT,
    issued_date                         TEXT,
    effective_start_date                TEXT,
    anticipated_end_date                TEXT,
    actual_end_date                     TEXT,
    intended_duration                   TEXT,
    prior_row_id_linked                 TEXT,
    data_source_for_policy_announcement TEXT,
    policy_law_name                     TEXT,
    policy_law_type                     TEXT,
    data_source_for_law_policy          TEXT,
    pdf_file_name                       TEXT,
    attachment_for_policy               TEXT,
    policy_number                       TEXT,
    authorizing_entity_has_authority    INTEGER,   -- 0 / 1
    relevant_authority                  TEXT,
    data_source_for_authority           TEXT,
    home_rule_state                     INTEGER,
    dillons_rule_state                  INTEGER
);

CREATE INDEX IF NOT EXISTS policy_iso_idx ON policy_data(authorizing_country_iso);
";

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// The metric columns of `covid_data` follow [`Metric`]'s declaration order.
pub fn schema() -> String {
  let metrics: String = Metric::all()
    .map(|m| {
      let ty = if m.is_count() { "INTEGER" } else { "REAL" };
      format!(",\n    {} {ty}", m.column())
    })
    .collect();

  format!(
    "
CREATE TABLE IF NOT EXISTS covid_data (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    iso_code    TEXT,
    continent   TEXT,                -- NULL for aggregate rows
    location    TEXT NOT NULL,
    date        TEXT,                -- YYYY-MM-DD, NULL when undated
    tests_units TEXT{metrics}
);

CREATE INDEX IF NOT EXISTS covid_location_idx ON covid_data(location);
CREATE INDEX IF NOT EXISTS covid_date_idx     ON covid_data(date);
{MEASURES_DDL}{POLICY_DDL}"
  )
}
