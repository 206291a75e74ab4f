//! The `ContentStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `folio-store-sqlite`).
//! Higher layers (`folio-api`, `folio-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Classify,
  actor::Actor,
  comment::{Comment, CommentStatus, NewComment},
  lifecycle::Action,
  page::{Page, PageRequest},
  post::{NewPost, Post, PostPatch, PostStatus},
  revision::Revision,
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// How soft-deleted posts are treated by [`ContentStore::list_posts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletionFilter {
  #[default]
  Exclude,
  Include,
  Only,
}

/// Parameters for [`ContentStore::list_posts`]. Every filter is conjunctive.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
  /// Substring match over title, body and excerpt.
  pub text:      Option<String>,
  pub author_id: Option<Uuid>,
  pub status:    Option<PostStatus>,
  pub tag:       Option<String>,
  pub category:  Option<String>,
  pub deletion:  DeletionFilter,
  pub page:      PageRequest,
}

impl PostQuery {
  /// Published, non-deleted posts. This is what anonymous readers may list.
  pub fn public() -> Self {
    Self {
      status: Some(PostStatus::Published),
      ..Default::default()
    }
  }
}

// ─── Outcome types ───────────────────────────────────────────────────────────

/// Result of [`ContentStore::bulk_set_published`]. `matched` counts existing
/// posts named in the batch; `modified` those whose state actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
  pub matched:  u64,
  pub modified: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostStats {
  /// Every stored post, deleted or not.
  pub total:          u64,
  pub draft:          u64,
  pub pending:        u64,
  pub published:      u64,
  pub deleted:        u64,
  pub total_views:    u64,
  pub total_comments: u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Folio content store backend.
///
/// Implementations are the authority on every invariant: slug uniqueness,
/// per-post serialisation of writes, append-only revision history and
/// atomic permanent deletion. Authorisation checks that depend on stored
/// ownership also happen here, since only the store sees the current row.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ContentStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Posts ─────────────────────────────────────────────────────────────

  /// Create a post owned by `actor` with a freshly allocated slug.
  fn create_post(
    &self,
    actor: Actor,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Fetch a post by id regardless of status or deletion. Visibility is the
  /// caller's concern (see [`Post::visible_to`]).
  fn get_post(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// Fetch the post currently holding `slug`. Retired slugs do not resolve.
  fn get_post_by_slug(
    &self,
    slug: String,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// Apply `patch`. Snapshots the previous title/body first when either
  /// changes, and re-derives the slug when the title changes.
  fn update_post(
    &self,
    id: Uuid,
    actor: Actor,
    patch: PostPatch,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Run a lifecycle action (publish, unpublish, delete, restore).
  fn transition(
    &self,
    id: Uuid,
    actor: Actor,
    action: Action,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Soft delete. A second call on the same post is a conflict.
  fn soft_delete(
    &self,
    id: Uuid,
    actor: Actor,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Undo a soft delete. Administrators only.
  fn restore(
    &self,
    id: Uuid,
    actor: Actor,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Permanently remove a post with its revisions and comments, all or
  /// nothing. Administrators only.
  fn force_delete(
    &self,
    id: Uuid,
    actor: Actor,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Publish or unpublish a batch. Malformed or unknown ids are skipped.
  fn bulk_set_published(
    &self,
    ids: Vec<String>,
    publish: bool,
    actor: Actor,
  ) -> impl Future<Output = Result<BulkOutcome, Self::Error>> + Send + '_;

  fn list_posts(
    &self,
    query: PostQuery,
  ) -> impl Future<Output = Result<Page<Post>, Self::Error>> + Send + '_;

  fn stats(
    &self,
  ) -> impl Future<Output = Result<PostStats, Self::Error>> + Send + '_;

  // ── Counters ──────────────────────────────────────────────────────────

  fn increment_view_count(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Shift the approved-comment counter by `delta`, clamping at zero.
  /// Returns the new value.
  fn adjust_comment_count(
    &self,
    id: Uuid,
    delta: i64,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Revisions ─────────────────────────────────────────────────────────

  /// Revisions of a post, newest first. Owner or administrator only.
  fn list_revisions(
    &self,
    post_id: Uuid,
    actor: Actor,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<Revision>, Self::Error>> + Send + '_;

  /// Put a revision's title/body back on its post, snapshotting the current
  /// content first. A revision of another post is reported as not found.
  fn restore_revision(
    &self,
    post_id: Uuid,
    revision_id: Uuid,
    actor: Actor,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  fn add_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Move a comment to `status`, adjusting the post's counter by the change
  /// in approved-ness.
  fn set_comment_status(
    &self,
    comment_id: Uuid,
    status: CommentStatus,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  fn list_comments(
    &self,
    post_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;
}
