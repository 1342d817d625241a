//! Strong ETags over serialized response bodies.
//!
//! Views are deterministic, so the same data always yields the same body and
//! therefore the same tag.

use axum::http::{HeaderMap, header};
use sha2::{Digest, Sha256};

/// Quoted SHA-256 hex of `body`.
pub fn compute_etag(body: &[u8]) -> String {
  let hash = Sha256::digest(body);
  format!("\"{}\"", hex::encode(hash))
}

/// Whether the request's `If-None-Match` header names `etag` (or is `*`).
pub fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
  headers
    .get_all(header::IF_NONE_MATCH)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(','))
    .map(str::trim)
    .any(|tag| tag == "*" || tag == etag || tag.strip_prefix("W/") == Some(etag))
}
