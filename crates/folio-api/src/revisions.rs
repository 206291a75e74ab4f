//! Handlers for revision history. Owner or administrator only; the store
//! enforces ownership.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/posts/{id}/revisions` | Newest first; `?page`, `limit` |
//! | `POST` | `/posts/{id}/revisions/{revision_id}/restore` | Returns the updated post |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::Response,
};
use folio_core::{
  error::parse_id,
  page::{Page, PageRequest},
  revision::Revision,
  store::ContentStore,
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  extract::QueryParams,
  identity::Identity,
  posts::tagged,
};

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  pub page:  Option<u32>,
  pub limit: Option<u32>,
}

/// `GET /posts/{id}/revisions`
pub async fn list<S: ContentStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(raw_id): Path<String>,
  QueryParams(params): QueryParams<PageParams>,
) -> Result<Json<Page<Revision>>, ApiError> {
  let id = parse_id(&raw_id)?;
  let page = store
    .list_revisions(id, actor, PageRequest::new(params.page, params.limit))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(page))
}

/// `POST /posts/{id}/revisions/{revision_id}/restore`
pub async fn restore<S: ContentStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path((raw_id, raw_revision_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
  let id = parse_id(&raw_id)?;
  let revision_id = parse_id(&raw_revision_id)?;
  let post = store
    .restore_revision(id, revision_id, actor)
    .await
    .map_err(ApiError::store)?;
  Ok(tagged(StatusCode::OK, post))
}
