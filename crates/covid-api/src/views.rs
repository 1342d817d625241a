//! Handlers for catalog views and the `/views` listing.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | any catalog route | `ETag` on every body; 304 on `If-None-Match` |
//! | `GET`  | `/views` | Name, route, aliases, summary and parameter of each view |

use axum::{
  Json,
  body::Body,
  extract::{Path, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
  routing::{MethodRouter, get},
};
use bytes::Bytes;
use covid_core::store::RecordStore;
use covid_engine::{Param, ViewName, ViewParams, ViewSpec};
use serde::Serialize;

use crate::{AppState, error::ApiError, etag};

// ─── Routing ─────────────────────────────────────────────────────────────────

/// A GET route serving `view`, binding its path parameter if it has one.
pub fn route<S>(view: &ViewSpec) -> MethodRouter<AppState<S>>
where
  S: RecordStore + 'static,
{
  let name = view.name;
  match view.param {
    Param::None => get(move |State(state): State<AppState<S>>, headers: HeaderMap| {
      serve(state, name, ViewParams::default(), headers)
    }),
    Param::Country => get(
      move |State(state): State<AppState<S>>, Path(country): Path<String>, headers: HeaderMap| {
        serve(state, name, ViewParams { country: Some(country), id: None }, headers)
      },
    ),
    Param::Id => get(
      move |State(state): State<AppState<S>>, Path(id): Path<String>, headers: HeaderMap| {
        serve(state, name, ViewParams { country: None, id: Some(id) }, headers)
      },
    ),
  }
}

// ─── Views ───────────────────────────────────────────────────────────────────

/// Run `name` and answer with its JSON body, or 304 when the client already
/// holds it.
pub async fn serve<S>(
  state: AppState<S>,
  name: ViewName,
  params: ViewParams,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: RecordStore,
{
  let value = state.catalog.run(state.store.as_ref(), name, &params).await?;
  let body = Bytes::from(serde_json::to_vec(&value)?);
  let etag = etag::compute_etag(&body);

  if etag::if_none_match(&headers, &etag) {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }

  Ok(
    (
      StatusCode::OK,
      [(header::CONTENT_TYPE, "application/json".to_owned()), (header::ETAG, etag)],
      Body::from(body),
    )
      .into_response(),
  )
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ViewInfo {
  pub name:    ViewName,
  pub route:   &'static str,
  pub aliases: &'static [&'static str],
  pub summary: &'static str,
  pub param:   Param,
}

/// `GET /views`
pub async fn list<S>(State(state): State<AppState<S>>) -> Json<Vec<ViewInfo>>
where
  S: RecordStore,
{
  let views = state
    .catalog
    .iter()
    .map(|v| ViewInfo {
      name:    v.name,
      route:   v.route,
      aliases: v.aliases,
      summary: v.summary,
      param:   v.param,
    })
    .collect();
  Json(views)
}
