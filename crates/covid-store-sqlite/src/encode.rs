//! Decoding helpers between SQLite columns and the core record types.
//!
//! Dates are stored as `YYYY-MM-DD` text; a trailing time component, as
//! written by some import tools, is ignored. A `NULL` or empty date reads as
//! `None`. A metric is present only when
//! its storage class is INTEGER or REAL. Empty strings and other text left
//! behind by CSV imports read as null.

use chrono::NaiveDate;
use covid_core::{
  measure::MeasureRecord,
  policy::PolicyRecord,
  record::{EpidemiologicalRecord, Metric},
};
use rusqlite::{Row, types::ValueRef};

use crate::{Error, Result};

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  let day = s.get(..10).unwrap_or(s);
  NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.filter(|s| !s.is_empty()).as_deref().map(decode_date).transpose()
}

// ─── Metrics ─────────────────────────────────────────────────────────────────

pub fn decode_metric(v: ValueRef<'_>) -> Option<f64> {
  match v {
    ValueRef::Integer(i) => Some(i as f64),
    ValueRef::Real(f) => Some(f),
    _ => None,
  }
}

/// SQL predicate true exactly when [`decode_metric`] yields a value.
pub fn present(column: &str) -> String { format!("typeof({column}) IN ('integer', 'real')") }

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `covid_data` row as read, before date parsing.
pub struct RawRecord {
  pub id:          i64,
  pub iso_code:    Option<String>,
  pub continent:   Option<String>,
  pub location:    String,
  pub date:        Option<String>,
  pub tests_units: Option<String>,
  pub metrics:     Vec<(Metric, f64)>,
}

impl RawRecord {
  /// Read the key columns from positions 0..6 and `metrics` from the
  /// positions after them.
  pub fn from_row(row: &Row<'_>, metrics: &[Metric]) -> rusqlite::Result<Self> {
    let mut values = Vec::with_capacity(metrics.len());
    for (i, metric) in metrics.iter().enumerate() {
      if let Some(v) = decode_metric(row.get_ref(6 + i)?) {
        values.push((*metric, v));
      }
    }
    Ok(Self {
      id:          row.get(0)?,
      iso_code:    row.get(1)?,
      continent:   row.get(2)?,
      location:    row.get(3)?,
      date:        row.get(4)?,
      tests_units: row.get(5)?,
      metrics:     values,
    })
  }

  pub fn into_record(self) -> Result<EpidemiologicalRecord> {
    Ok(EpidemiologicalRecord {
      id:          self.id,
      iso_code:    self.iso_code,
      continent:   self.continent.filter(|c| !c.is_empty()),
      location:    self.location,
      date:        decode_opt_date(self.date)?,
      tests_units: self.tests_units,
      metrics:     self.metrics.into_iter().collect(),
    })
  }
}

/// A `measures_data` row as read, before date parsing.
pub struct RawMeasure {
  record:           MeasureRecord,
  date_implemented: Option<String>,
  entry_date:       Option<String>,
}

impl RawMeasure {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record:           MeasureRecord {
        id:                 row.get("id")?,
        iso:                row.get("iso")?,
        country:            row.get("country")?,
        region:             row.get("region")?,
        admin_level_name:   row.get("admin_level_name")?,
        pcode:              row.get("pcode")?,
        log_type:           row.get("log_type")?,
        category:           row.get("category")?,
        measure_type:       row.get("measure_type")?,
        targeted_pop_group: row.get("targeted_pop_group")?,
        comments:           row.get("comments")?,
        non_compliance:     row.get("non_compliance")?,
        date_implemented:   None,
        source:             row.get("source")?,
        source_type:        row.get("source_type")?,
        link:               row.get("link")?,
        entry_date:         None,
        alternative_source: row.get("alternative_source")?,
      },
      date_implemented: row.get("date_implemented")?,
      entry_date:       row.get("entry_date")?,
    })
  }

  pub fn into_measure(self) -> Result<MeasureRecord> {
    Ok(MeasureRecord {
      date_implemented: decode_opt_date(self.date_implemented)?,
      entry_date: decode_opt_date(self.entry_date)?,
      ..self.record
    })
  }
}

/// A `policy_data` row as read, before date parsing.
pub struct RawPolicy {
  record:               PolicyRecord,
  issued_date:          Option<String>,
  effective_start_date: Option<String>,
  anticipated_end_date: Option<String>,
  actual_end_date:      Option<String>,
}

impl RawPolicy {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record:               PolicyRecord {
        unique_id:                           row.get("unique_id")?,
        authorizing_level_of_government:     row.get("authorizing_level_of_government")?,
        authorizing_country_name:            row.get("authorizing_country_name")?,
        authorizing_country_iso:             row.get("authorizing_country_iso")?,
        authorizing_state_province:          row.get("authorizing_state_province")?,
        authorizing_local_area:              row.get("authorizing_local_area")?,
        authorizing_local_area_code:         row.get("authorizing_local_area_code")?,
        authorizing_role:                    row.get("authorizing_role")?,
        authorizing_body:                    row.get("authorizing_body")?,
        name_of_official:                    row.get("name_of_official")?,
        affected_level_of_government:        row.get("affected_level_of_government")?,
        affected_country_name:               row.get("affected_country_name")?,
        affected_country_iso:                row.get("affected_country_iso")?,
        affected_state_province:             row.get("affected_state_province")?,
        affected_local_area:                 row.get("affected_local_area")?,
        affected_local_area_code:            row.get("affected_local_area_code")?,
        policy_relaxing_or_restricting:      row.get("policy_relaxing_or_restricting")?,
        policy_category:                     row.get("policy_category")?,
        policy_subcategory:                  row.get("policy_subcategory")?,
        policy_target:                       row.get("policy_target")?,
        policy_description:                  row.get("policy_description")?,
        intended_duration:                   row.get("intended_duration")?,
        prior_row_id_linked:                 row.get("prior_row_id_linked")?,
        data_source_for_policy_announcement: row.get("data_source_for_policy_announcement")?,
        policy_law_name:                     row.get("policy_law_name")?,
        policy_law_type:                     row.get("policy_law_type")?,
        data_source_for_law_policy:          row.get("data_source_for_law_policy")?,
        pdf_file_name:                       row.get("pdf_file_name")?,
        attachment_for_policy:               row.get("attachment_for_policy")?,
        policy_number:                       row.get("policy_number")?,
        authorizing_entity_has_authority:    row.get("authorizing_entity_has_authority")?,
        relevant_authority:                  row.get("relevant_authority")?,
        data_source_for_authority:           row.get("data_source_for_authority")?,
        home_rule_state:                     row.get("home_rule_state")?,
        dillons_rule_state:                  row.get("dillons_rule_state")?,
        ..Default::default()
      },
      issued_date:          row.get("issued_date")?,
      effective_start_date: row.get("effective_start_date")?,
      anticipated_end_date: row.get("anticipated_end_date")?,
      actual_end_date:      row.get("actual_end_date")?,
    })
  }

  pub fn into_policy(self) -> Result<PolicyRecord> {
    Ok(PolicyRecord {
      issued_date: decode_opt_date(self.issued_date)?,
      effective_start_date: decode_opt_date(self.effective_start_date)?,
      anticipated_end_date: decode_opt_date(self.anticipated_end_date)?,
      actual_end_date: decode_opt_date(self.actual_end_date)?,
      ..self.record
    })
  }
}
