//! Server wiring for the pandemic analytics API.
//!
//! Turns a [`ServerConfig`] into a catalog and a fully layered router; the
//! binary in `main.rs` adds the CLI, configuration loading and the listener.

use std::path::PathBuf;

use axum::{
  Router,
  http::{HeaderValue, Method, header},
};
use covid_api::AppState;
use covid_core::store::RecordStore;
use covid_engine::{CatalogOptions, MonthKey, ViewCatalog};
use serde::{Deserialize, Deserializer, de::Error as _};
use thiserror::Error;
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  trace::TraceLayer,
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `COVID_*` environment variables.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                         String,
  pub port:                         u16,
  pub database_path:                PathBuf,
  pub service_name:                 String,
  /// Empty allows any origin.
  pub cors_allowed_origins:         Vec<String>,
  /// `"YYYY-MM"`, or one of [`OFF`] to keep every month.
  #[serde(deserialize_with = "cutoff_setting")]
  pub stringency_cutoff:            Option<MonthKey>,
  /// Digits kept in vaccination percentages, or one of [`OFF`] for no
  /// rounding.
  #[serde(deserialize_with = "decimals_setting")]
  pub vaccination_percent_decimals: Option<u32>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    let catalog = CatalogOptions::default();
    Self {
      host:                         "0.0.0.0".into(),
      port:                         5000,
      database_path:                PathBuf::from("covid.sqlite3"),
      service_name:                 "covid".into(),
      cors_allowed_origins:         Vec::new(),
      stringency_cutoff:            catalog.stringency_cutoff,
      vaccination_percent_decimals: catalog.vaccination_percent_decimals,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn catalog_options(&self) -> CatalogOptions {
    CatalogOptions {
      stringency_cutoff:            self.stringency_cutoff,
      vaccination_percent_decimals: self.vaccination_percent_decimals,
    }
  }

  pub fn catalog(&self) -> ViewCatalog { ViewCatalog::new(self.catalog_options()) }
}

// ─── Optional settings ───────────────────────────────────────────────────────

/// Spellings that switch an optional setting off, compared case-insensitively.
/// A TOML `false` works too.
pub const OFF: [&str; 4] = ["", "none", "off", "false"];

/// An optional setting as written in TOML or a `COVID_*` variable.
#[derive(Deserialize)]
#[serde(untagged)]
enum Setting {
  Flag(bool),
  Number(u32),
  Text(String),
}

impl Setting {
  /// `None` when switched off, otherwise the value in text form.
  fn enabled<E: serde::de::Error>(self) -> Result<Option<String>, E> {
    match self {
      Self::Flag(false) => Ok(None),
      Self::Flag(true) => Err(E::custom("expected a value or an off switch, found `true`")),
      Self::Number(n) => Ok(Some(n.to_string())),
      Self::Text(s) if OFF.contains(&s.trim().to_ascii_lowercase().as_str()) => Ok(None),
      Self::Text(s) => Ok(Some(s.trim().to_owned())),
    }
  }
}

fn cutoff_setting<'de, D: Deserializer<'de>>(d: D) -> Result<Option<MonthKey>, D::Error> {
  Setting::deserialize(d)?
    .enabled::<D::Error>()?
    .map(|s| s.parse().map_err(D::Error::custom))
    .transpose()
}

fn decimals_setting<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
  Setting::deserialize(d)?
    .enabled::<D::Error>()?
    .map(|s| s.parse().map_err(|_| D::Error::custom(format!("invalid decimal count {s:?}"))))
    .transpose()
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid CORS origin {0:?}")]
  InvalidOrigin(String),
}

// ─── Application ─────────────────────────────────────────────────────────────

fn cors_layer(origins: &[String]) -> Result<CorsLayer, Error> {
  let allow_origin = if origins.is_empty() {
    AllowOrigin::any()
  } else {
    let values = origins
      .iter()
      .map(|o| HeaderValue::from_str(o).map_err(|_| Error::InvalidOrigin(o.clone())))
      .collect::<Result<Vec<_>, _>>()?;
    AllowOrigin::list(values)
  };

  Ok(
    CorsLayer::new()
      .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
      .allow_headers([header::CONTENT_TYPE, header::IF_NONE_MATCH])
      .expose_headers([header::ETAG])
      .allow_origin(allow_origin),
  )
}

/// The API router for `store` with CORS and request tracing applied.
pub fn app<S>(store: S, config: &ServerConfig) -> Result<Router, Error>
where
  S: RecordStore + 'static,
{
  let catalog = config.catalog();
  tracing::debug!(views = catalog.len(), "catalog built");

  let state = AppState::new(store, catalog, config.service_name.as_str());
  Ok(
    covid_api::router(state)
      .layer(cors_layer(&config.cors_allowed_origins)?)
      .layer(TraceLayer::new_for_http()),
  )
}
