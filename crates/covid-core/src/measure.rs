//! Public-health measure log entries (non-pharmaceutical interventions).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the `measures_data` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureRecord {
  pub id:                 i64,
  pub iso:                String,
  pub country:            String,
  pub region:             String,
  pub admin_level_name:   Option<String>,
  pub pcode:              Option<String>,
  pub log_type:           String,
  pub category:           String,
  pub measure_type:       String,
  /// `"checked"` when the measure targets a population group, else empty.
  pub targeted_pop_group: Option<String>,
  pub comments:           Option<String>,
  pub non_compliance:     String,
  pub date_implemented:   Option<NaiveDate>,
  pub source:             String,
  pub source_type:        String,
  pub link:               String,
  pub entry_date:         Option<NaiveDate>,
  pub alternative_source: Option<String>,
}

/// The four-column projection served by the measures summary view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasureSummary {
  pub country:          String,
  pub region:           String,
  pub category:         String,
  pub date_implemented: Option<NaiveDate>,
}

impl From<&MeasureRecord> for MeasureSummary {
  fn from(m: &MeasureRecord) -> Self {
    Self {
      country:          m.country.clone(),
      region:           m.region.clone(),
      category:         m.category.clone(),
      date_implemented: m.date_implemented,
    }
  }
}
