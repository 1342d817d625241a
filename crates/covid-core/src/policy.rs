//! Government policy actions, keyed by a unique identifier.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the `policy_data` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyRecord {
  pub unique_id: String,

  // ── Authorizing jurisdiction ────────────────────────────────────────────
  pub authorizing_level_of_government: Option<String>,
  pub authorizing_country_name:        Option<String>,
  pub authorizing_country_iso:         Option<String>,
  pub authorizing_state_province:      Option<String>,
  pub authorizing_local_area:          Option<String>,
  pub authorizing_local_area_code:     Option<String>,
  pub authorizing_role:                Option<String>,
  pub authorizing_body:                Option<String>,
  pub name_of_official:                Option<String>,

  // ── Affected jurisdiction ───────────────────────────────────────────────
  pub affected_level_of_government: Option<String>,
  pub affected_country_name:        Option<String>,
  pub affected_country_iso:         Option<String>,
  pub affected_state_province:      Option<String>,
  pub affected_local_area:          Option<String>,
  pub affected_local_area_code:     Option<String>,

  // ── Policy ──────────────────────────────────────────────────────────────
  /// `"Relaxing"` or `"Restricting"` in the source data.
  pub policy_relaxing_or_restricting: Option<String>,
  pub policy_category:                Option<String>,
  pub policy_subcategory:             Option<String>,
  pub policy_target:                  Option<String>,
  pub policy_description:             Option<String>,
  pub issued_date:                    Option<NaiveDate>,
  pub effective_start_date:           Option<NaiveDate>,
  pub anticipated_end_date:           Option<NaiveDate>,
  pub actual_end_date:                Option<NaiveDate>,
  pub intended_duration:              Option<String>,
  pub prior_row_id_linked:            Option<String>,

  // ── Legal source ────────────────────────────────────────────────────────
  pub data_source_for_policy_announcement: Option<String>,
  pub policy_law_name:                     Option<String>,
  pub policy_law_type:                     Option<String>,
  pub data_source_for_law_policy:          Option<String>,
  pub pdf_file_name:                       Option<String>,
  pub attachment_for_policy:               Option<String>,
  pub policy_number:                       Option<String>,
  pub authorizing_entity_has_authority:    Option<bool>,
  pub relevant_authority:                  Option<String>,
  pub data_source_for_authority:           Option<String>,
  pub home_rule_state:                     Option<bool>,
  pub dillons_rule_state:                  Option<bool>,
}

/// The projection served by the per-country policy view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicySummary {
  pub policy_category:          Option<String>,
  pub policy_subcategory:       Option<String>,
  pub authorizing_country_iso:  Option<String>,
  pub authorizing_country_name: Option<String>,
  pub actual_end_date:          Option<NaiveDate>,
  pub effective_start_date:     Option<NaiveDate>,
}

impl From<&PolicyRecord> for PolicySummary {
  fn from(p: &PolicyRecord) -> Self {
    Self {
      policy_category:          p.policy_category.clone(),
      policy_subcategory:       p.policy_subcategory.clone(),
      authorizing_country_iso:  p.authorizing_country_iso.clone(),
      authorizing_country_name: p.authorizing_country_name.clone(),
      actual_end_date:          p.actual_end_date,
      effective_start_date:     p.effective_start_date,
    }
  }
}
