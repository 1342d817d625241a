//! JSON REST API for the pandemic analytics service.
//!
//! Exposes an axum [`Router`] serving every [`ViewCatalog`] view, backed by
//! any [`covid_core::store::RecordStore`]. TLS, CORS and request tracing are
//! the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = covid_api::router(AppState::new(store, catalog, "covid"));
//! ```

pub mod error;
pub mod etag;
pub mod views;

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use covid_core::store::RecordStore;
use covid_engine::ViewCatalog;
use serde_json::{Value, json};

pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:        Arc<S>,
  pub catalog:      Arc<ViewCatalog>,
  pub service_name: Arc<str>,
}

impl<S> AppState<S> {
  pub fn new(store: S, catalog: ViewCatalog, service_name: impl Into<Arc<str>>) -> Self {
    Self {
      store:        Arc::new(store),
      catalog:      Arc::new(catalog),
      service_name: service_name.into(),
    }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:        self.store.clone(),
      catalog:      self.catalog.clone(),
      service_name: self.service_name.clone(),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router: one GET route per catalog view and alias, plus
/// `/views` and `/health`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RecordStore + 'static,
{
  let mut router = Router::new()
    .route("/health", get(health::<S>))
    .route("/views", get(views::list::<S>));

  for view in state.catalog.iter() {
    for path in std::iter::once(view.route).chain(view.aliases.iter().copied()) {
      router = router.route(path, views::route::<S>(view));
    }
  }

  router.with_state(state)
}

/// `GET /health`
async fn health<S>(State(state): State<AppState<S>>) -> Json<Value>
where
  S: RecordStore,
{
  Json(json!({
    "message": "Service is healthy.",
    "service": &*state.service_name,
    "version": env!("CARGO_PKG_VERSION"),
  }))
}
