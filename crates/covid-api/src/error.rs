//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<covid_core::Error> for ApiError {
  fn from(e: covid_core::Error) -> Self {
    use covid_core::Error as E;
    match e {
      E::NotFound(_) | E::UnknownView(_) => ApiError::NotFound(e.to_string()),
      E::MissingParameter { .. } | E::InvalidParameter { .. } => {
        ApiError::BadRequest(e.to_string())
      }
      E::Store(inner) => ApiError::Store(inner),
      E::Serialization(inner) => ApiError::Store(Box::new(inner)),
    }
  }
}

impl From<serde_json::Error> for ApiError {
  fn from(e: serde_json::Error) -> Self { ApiError::Store(Box::new(e)) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => {
        tracing::debug!(%m, "not found");
        (StatusCode::NOT_FOUND, m.clone())
      }
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
