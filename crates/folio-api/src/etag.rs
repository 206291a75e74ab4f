//! ETags for post resources.
//!
//! A post's tag is a SHA-256 over its id and version, so it changes on every
//! stored write and never collides across posts.

use axum::http::{HeaderMap, header};
use folio_core::post::Post;
use sha2::{Digest, Sha256};

use crate::error::ApiError;

pub fn compute_etag(post: &Post) -> String {
  let mut hasher = Sha256::new();
  hasher.update(post.post_id.as_bytes());
  hasher.update(post.version.to_le_bytes());
  format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// Check an `If-Match` header against `post`.
///
/// Returns the version the write must be conditioned on, or `None` when the
/// header is absent or `*`.
pub fn check_if_match(
  headers: &HeaderMap,
  post: &Post,
) -> Result<Option<i64>, ApiError> {
  let Some(raw) = headers.get(header::IF_MATCH) else {
    return Ok(None);
  };
  let raw = raw.to_str().map_err(|_| ApiError::PreconditionFailed)?;
  if raw.trim() == "*" {
    return Ok(None);
  }

  let current = compute_etag(post);
  let matches = raw
    .split(',')
    .map(|tag| tag.trim().trim_start_matches("W/"))
    .any(|tag| tag == current);

  if matches {
    Ok(Some(post.version))
  } else {
    Err(ApiError::PreconditionFailed)
  }
}
