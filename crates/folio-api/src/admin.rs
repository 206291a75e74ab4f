//! Handlers for `/admin` endpoints. Every route requires the administrator
//! role.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/admin/posts` | Any status; `?deleted=exclude\|include\|only` (default `include`) |
//! | `GET`    | `/admin/posts/{id}` | Deleted posts included |
//! | `DELETE` | `/admin/posts/{id}` | Soft delete |
//! | `DELETE` | `/admin/posts/{id}/permanent` | Post, revisions and comments, atomically |
//! | `POST`   | `/admin/posts/{id}/restore` | Undo a soft delete |
//! | `POST`   | `/admin/posts/bulk-publish` | Body: [`BulkBody`] |
//! | `POST`   | `/admin/posts/{id}/comment-count` | Body: `{"delta": n}` |
//! | `PUT`    | `/admin/comments/{id}/status` | Body: `{"status": "approved"}` |
//! | `GET`    | `/admin/stats` | |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::Response,
};
use folio_core::{
  comment::{Comment, CommentStatus},
  error::parse_id,
  page::{Page, PageRequest},
  post::{Post, PostStatus},
  store::{BulkOutcome, ContentStore, DeletionFilter, PostQuery, PostStats},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  error::ApiError,
  extract::{JsonBody, QueryParams},
  identity::Identity,
  posts::tagged,
};

// ─── List & get ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AdminListParams {
  pub q:         Option<String>,
  pub status:    Option<PostStatus>,
  pub author_id: Option<Uuid>,
  pub tag:       Option<String>,
  pub category:  Option<String>,
  pub deleted:   Option<DeletionFilter>,
  pub page:      Option<u32>,
  pub limit:     Option<u32>,
}

/// `GET /admin/posts`
pub async fn list<S: ContentStore>(
  State(store): State<Arc<S>>,
  identity: Identity,
  QueryParams(params): QueryParams<AdminListParams>,
) -> Result<Json<Page<Post>>, ApiError> {
  identity.require_admin()?;
  let query = PostQuery {
    text:      params.q,
    author_id: params.author_id,
    status:    params.status,
    tag:       params.tag,
    category:  params.category,
    deletion:  params.deleted.unwrap_or(DeletionFilter::Include),
    page:      PageRequest::new(params.page, params.limit),
  };
  let page = store.list_posts(query).await.map_err(ApiError::store)?;
  Ok(Json(page))
}

/// `GET /admin/posts/{id}`
pub async fn get_one<S: ContentStore>(
  State(store): State<Arc<S>>,
  identity: Identity,
  Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
  identity.require_admin()?;
  let id = parse_id(&raw_id)?;
  let post = store
    .get_post(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::not_found(id))?;
  Ok(tagged(StatusCode::OK, post))
}

// ─── Deletion ─────────────────────────────────────────────────────────────────

/// `DELETE /admin/posts/{id}`
pub async fn soft_delete<S: ContentStore>(
  State(store): State<Arc<S>>,
  identity: Identity,
  Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
  let actor = identity.require_admin()?;
  let id = parse_id(&raw_id)?;
  store.soft_delete(id, actor).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /admin/posts/{id}/permanent`
pub async fn force_delete<S: ContentStore>(
  State(store): State<Arc<S>>,
  identity: Identity,
  Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
  let actor = identity.require_admin()?;
  let id = parse_id(&raw_id)?;
  store.force_delete(id, actor).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /admin/posts/{id}/restore`
pub async fn restore<S: ContentStore>(
  State(store): State<Arc<S>>,
  identity: Identity,
  Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
  let actor = identity.require_admin()?;
  let id = parse_id(&raw_id)?;
  let post = store.restore(id, actor).await.map_err(ApiError::store)?;
  Ok(tagged(StatusCode::OK, post))
}

// ─── Bulk ─────────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /admin/posts/bulk-publish`. Ids are taken as
/// raw JSON so that malformed entries, including non-strings, are skipped
/// rather than rejecting the whole batch.
#[derive(Debug, Deserialize)]
pub struct BulkBody {
  pub ids:     Vec<serde_json::Value>,
  #[serde(default = "default_publish")]
  pub publish: bool,
}

fn default_publish() -> bool { true }

impl BulkBody {
  fn string_ids(self) -> Vec<String> {
    self
      .ids
      .into_iter()
      .filter_map(|v| match v {
        serde_json::Value::String(s) => Some(s),
        _ => None,
      })
      .collect()
  }
}

/// `POST /admin/posts/bulk-publish`
pub async fn bulk_publish<S: ContentStore>(
  State(store): State<Arc<S>>,
  identity: Identity,
  JsonBody(body): JsonBody<BulkBody>,
) -> Result<Json<BulkOutcome>, ApiError> {
  let actor = identity.require_admin()?;
  let publish = body.publish;
  let outcome = store
    .bulk_set_published(body.string_ids(), publish, actor)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(outcome))
}

/// `GET /admin/stats`
pub async fn stats<S: ContentStore>(
  State(store): State<Arc<S>>,
  identity: Identity,
) -> Result<Json<PostStats>, ApiError> {
  identity.require_admin()?;
  Ok(Json(store.stats().await.map_err(ApiError::store)?))
}

// ─── Moderation hooks ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CountDelta {
  pub delta: i64,
}

#[derive(Debug, Serialize)]
pub struct CommentCount {
  pub comment_count: u64,
}

/// `POST /admin/posts/{id}/comment-count`
pub async fn adjust_comment_count<S: ContentStore>(
  State(store): State<Arc<S>>,
  identity: Identity,
  Path(raw_id): Path<String>,
  JsonBody(body): JsonBody<CountDelta>,
) -> Result<Json<CommentCount>, ApiError> {
  identity.require_admin()?;
  let id = parse_id(&raw_id)?;
  let comment_count = store
    .adjust_comment_count(id, body.delta)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(CommentCount { comment_count }))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: CommentStatus,
}

/// `PUT /admin/comments/{id}/status`
pub async fn moderate_comment<S: ContentStore>(
  State(store): State<Arc<S>>,
  identity: Identity,
  Path(raw_id): Path<String>,
  JsonBody(body): JsonBody<StatusBody>,
) -> Result<Json<Comment>, ApiError> {
  identity.require_admin()?;
  let id = parse_id(&raw_id)?;
  let comment = store
    .set_comment_status(id, body.status)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(comment))
}
