//! Handlers for comments on a post. Content is not validated beyond being
//! non-empty; moderation lives under `/admin`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use folio_core::{
  comment::{Comment, CommentStatus, NewComment},
  error::parse_id,
  store::ContentStore,
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  extract::JsonBody,
  identity::{Identity, MaybeIdentity},
  posts::load_visible,
};

/// `GET /posts/{id}/comments`
///
/// Readers see approved comments; the post's owner and administrators see
/// every comment.
pub async fn list<S: ContentStore>(
  State(store): State<Arc<S>>,
  MaybeIdentity(viewer): MaybeIdentity,
  Path(raw_id): Path<String>,
) -> Result<Json<Vec<Comment>>, ApiError> {
  let id = parse_id(&raw_id)?;
  let post = load_visible(store.as_ref(), id, viewer.as_ref()).await?;
  let mut comments = store.list_comments(id).await.map_err(ApiError::store)?;

  if !viewer.is_some_and(|a| a.can_manage(post.author_id)) {
    comments.retain(|c| c.status == CommentStatus::Approved);
  }
  Ok(Json(comments))
}

#[derive(Debug, Deserialize)]
pub struct NewCommentBody {
  #[serde(default)]
  pub body: String,
}

/// `POST /posts/{id}/comments`
pub async fn create<S: ContentStore>(
  State(store): State<Arc<S>>,
  Identity(actor): Identity,
  Path(raw_id): Path<String>,
  JsonBody(body): JsonBody<NewCommentBody>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
  let id = parse_id(&raw_id)?;
  load_visible(store.as_ref(), id, Some(&actor)).await?;
  let comment = store
    .add_comment(NewComment {
      post_id:   id,
      author_id: actor.id,
      body:      body.body,
    })
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(comment)))
}
