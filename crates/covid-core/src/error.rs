//! Error types for `covid-core`.
//!
//! Only genuine failures live here. An aggregation that matches no rows is a
//! valid empty result, and a ratio that cannot be computed is omitted or
//! defaulted by the view that owns it; neither is an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A single-entity lookup matched zero rows.
  #[error("no data found for {0}")]
  NotFound(String),

  #[error("unknown view: {0:?}")]
  UnknownView(String),

  #[error("view {view} requires the {param} parameter")]
  MissingParameter {
    view:  &'static str,
    param: &'static str,
  },

  #[error("invalid value {value:?} for parameter {param}")]
  InvalidParameter {
    param: &'static str,
    value: String,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Wrap a backend error from any [`crate::store::RecordStore`].
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
