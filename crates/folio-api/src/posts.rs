//! Handlers for public and author-tier `/posts` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/posts` | Published posts; `?q`, `tag`, `category`, `page`, `limit` |
//! | `GET`    | `/posts/slug/{slug}` | Counts a view when public |
//! | `GET`    | `/posts/{id}` | Owner/admin may read unpublished posts |
//! | `POST`   | `/posts` | Body: [`NewPostBody`]; returns 201 + `ETag` |
//! | `PATCH`  | `/posts/{id}` | Body: [`PatchBody`]; honours `If-Match` |
//! | `DELETE` | `/posts/{id}` | Soft delete; 204 |
//! | `POST`   | `/posts/{id}/publish` | Author: request; admin: publish |
//! | `POST`   | `/posts/{id}/unpublish` | Back to draft |
//! | `GET`    | `/me/posts` | The caller's own posts; `?status` |

use std::{
  collections::{BTreeMap, BTreeSet},
  sync::Arc,
};

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use folio_core::{
  actor::Actor,
  error::parse_id,
  lifecycle::Action,
  page::{Page, PageRequest},
  post::{AssetDescriptor, NewPost, Post, PostPatch, PostStatus},
  store::{ContentStore, PostQuery},
};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::{
  error::ApiError,
  etag::{check_if_match, compute_etag},
  extract::{JsonBody, QueryParams},
  identity::{Identity, MaybeIdentity},
};

/// A post with its `ETag` header.
pub(crate) fn tagged(status: StatusCode, post: Post) -> Response {
  let etag = compute_etag(&post);
  (status, [(header::ETAG, etag)], Json(post)).into_response()
}

/// Load a post the caller may see, or 404 if it is missing or hidden.
pub(crate) async fn load_visible<S: ContentStore>(
  store: &S,
  id: Uuid,
  viewer: Option<&Actor>,
) -> Result<Post, ApiError> {
  store
    .get_post(id)
    .await
    .map_err(ApiError::store)?
    .filter(|p| p.visible_to(viewer))
    .ok_or_else(|| ApiError::not_found(id))
}

/// Best effort: a failed increment is logged, never returned.
async fn count_view<S: ContentStore>(store: &S, post: &Post) {
  if !post.is_public() {
    return;
  }
  if let Err(e) = store.increment_view_count(post.post_id).await {
    tracing::warn!(post_id = %post.post_id, error = %e, "view count not recorded");
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  /// Substring search over title, body and excerpt.
  pub q:        Option<String>,
  pub tag:      Option<String>,
  pub category: Option<String>,
  pub page:     Option<u32>,
  pub limit:    Option<u32>,
}

impl ListParams {
  fn into_query(self) -> PostQuery {
    PostQuery {
      text: self.q,
      tag: self.tag,
      category: self.category,
      page: PageRequest::new(self.page, self.limit),
      ..PostQuery::public()
    }
  }
}

/// `GET /posts`
pub async fn list<S: ContentStore>(
  State(store): State<Arc<S>>,
  QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<Page<Post>>, ApiError> {
  let page = store
    .list_posts(params.into_query())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(page))
}

#[derive(Debug, Default, Deserialize)]
pub struct MineParams {
  pub status: Option<PostStatus>,
  pub page:   Option<u32>,
  pub limit:  Option<u32>,
}

/// `GET /me/posts`
pub async fn mine<S: ContentStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  QueryParams(params): QueryParams<MineParams>,
) -> Result<Json<Page<Post>>, ApiError> {
  let query = PostQuery {
    author_id: Some(actor.id),
    status: params.status,
    page: PageRequest::new(params.page, params.limit),
    ..Default::default()
  };
  let page = store.list_posts(query).await.map_err(ApiError::store)?;
  Ok(Json(page))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /posts/{id}`
pub async fn get_one<S: ContentStore>(
  State(store): State<Arc<S>>,
  MaybeIdentity(viewer): MaybeIdentity,
  Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
  let id = parse_id(&raw_id)?;
  let post = load_visible(store.as_ref(), id, viewer.as_ref()).await?;
  count_view(store.as_ref(), &post).await;
  Ok(tagged(StatusCode::OK, post))
}

/// `GET /posts/slug/{slug}`
pub async fn by_slug<S: ContentStore>(
  State(store): State<Arc<S>>,
  MaybeIdentity(viewer): MaybeIdentity,
  Path(slug): Path<String>,
) -> Result<Response, ApiError> {
  let post = store
    .get_post_by_slug(slug.clone())
    .await
    .map_err(ApiError::store)?
    .filter(|p| p.visible_to(viewer.as_ref()))
    .ok_or_else(|| ApiError::not_found(&slug))?;
  count_view(store.as_ref(), &post).await;
  Ok(tagged(StatusCode::OK, post))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /posts`.
#[derive(Debug, Default, Deserialize)]
pub struct NewPostBody {
  #[serde(default)]
  pub title:         String,
  #[serde(default)]
  pub body:          String,
  pub excerpt:       Option<String>,
  #[serde(default)]
  pub tags:          BTreeSet<String>,
  #[serde(default)]
  pub categories:    BTreeSet<String>,
  pub feature_image: Option<AssetDescriptor>,
  #[serde(default)]
  pub metadata:      BTreeMap<String, serde_json::Value>,
  #[serde(default)]
  pub publish:       bool,
}

impl TryFrom<NewPostBody> for NewPost {
  type Error = ApiError;

  fn try_from(b: NewPostBody) -> Result<Self, ApiError> {
    check_metadata(&b.metadata)?;
    Ok(NewPost {
      title:         b.title,
      body:          b.body,
      excerpt:       b.excerpt,
      tags:          b.tags,
      categories:    b.categories,
      feature_image: b.feature_image,
      metadata:      b.metadata,
      publish:       b.publish,
    })
  }
}

/// Metadata is free-form below this layer; only the keys are checked here.
fn check_metadata(
  metadata: &BTreeMap<String, serde_json::Value>,
) -> Result<(), ApiError> {
  if metadata.keys().any(|k| k.trim().is_empty()) {
    return Err(ApiError::BadRequest("metadata keys must not be blank".into()));
  }
  Ok(())
}

/// `POST /posts`
pub async fn create<S: ContentStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  JsonBody(body): JsonBody<NewPostBody>,
) -> Result<Response, ApiError> {
  let post = store
    .create_post(actor, NewPost::try_from(body)?)
    .await
    .map_err(ApiError::store)?;
  Ok(tagged(StatusCode::CREATED, post))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `PATCH /posts/{id}`. Absent fields are untouched;
/// an explicit `null` clears `excerpt` or `feature_image`.
#[derive(Debug, Default, Deserialize)]
pub struct PatchBody {
  pub title:            Option<String>,
  pub body:             Option<String>,
  #[serde(default, deserialize_with = "present")]
  pub excerpt:          Option<Option<String>>,
  pub tags:             Option<BTreeSet<String>>,
  pub categories:       Option<BTreeSet<String>>,
  #[serde(default, deserialize_with = "present")]
  pub feature_image:    Option<Option<AssetDescriptor>>,
  pub metadata:         Option<BTreeMap<String, serde_json::Value>>,
  pub status:           Option<PostStatus>,
  /// Stored on the revision this edit produces.
  pub note:             Option<String>,
  pub expected_version: Option<i64>,
}

/// Maps a present field (including `null`) to `Some`; `default` covers absence.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  T: Deserialize<'de>,
  D: Deserializer<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

impl TryFrom<PatchBody> for PostPatch {
  type Error = ApiError;

  fn try_from(b: PatchBody) -> Result<Self, ApiError> {
    if let Some(metadata) = &b.metadata {
      check_metadata(metadata)?;
    }
    Ok(PostPatch {
      title:            b.title,
      body:             b.body,
      excerpt:          b.excerpt,
      tags:             b.tags,
      categories:       b.categories,
      feature_image:    b.feature_image,
      metadata:         b.metadata,
      status:           b.status,
      note:             b.note,
      expected_version: b.expected_version,
    })
  }
}

/// `PATCH /posts/{id}`
pub async fn update<S: ContentStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(raw_id): Path<String>,
  headers: HeaderMap,
  JsonBody(body): JsonBody<PatchBody>,
) -> Result<Response, ApiError> {
  let id = parse_id(&raw_id)?;
  let mut patch = PostPatch::try_from(body)?;

  if headers.contains_key(header::IF_MATCH) {
    let current = load_visible(store.as_ref(), id, Some(&actor)).await?;
    if let Some(version) = check_if_match(&headers, &current)? {
      patch.expected_version = Some(version);
    }
  }

  let post = store
    .update_post(id, actor, patch)
    .await
    .map_err(ApiError::store)?;
  Ok(tagged(StatusCode::OK, post))
}

// ─── Lifecycle ────────────────────────────────────────────────────────────────

/// `DELETE /posts/{id}`
pub async fn delete<S: ContentStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
  let id = parse_id(&raw_id)?;
  store.soft_delete(id, actor).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

async fn run_action<S: ContentStore>(
  store: &S,
  actor: Actor,
  raw_id: &str,
  action: Action,
) -> Result<Response, ApiError> {
  let id = parse_id(raw_id)?;
  let post = store
    .transition(id, actor, action)
    .await
    .map_err(ApiError::store)?;
  Ok(tagged(StatusCode::OK, post))
}

/// `POST /posts/{id}/publish`
pub async fn publish<S: ContentStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
  run_action(store.as_ref(), actor, &raw_id, Action::Publish).await
}

/// `POST /posts/{id}/unpublish`
pub async fn unpublish<S: ContentStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
  run_action(store.as_ref(), actor, &raw_id, Action::Unpublish).await
}
