//! Comments, as far as the engine cares about them: they reference a post,
//! and their approved-ness drives the post's `comment_count`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CommentStatus {
  Pending,
  Approved,
  Rejected,
}

impl CommentStatus {
  /// The change in a post's approved-comment count when a comment moves
  /// from `self` to `next`.
  pub fn count_delta(self, next: CommentStatus) -> i64 {
    let approved = |s| i64::from(s == CommentStatus::Approved);
    approved(next) - approved(self)
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: Uuid,
  pub post_id:    Uuid,
  pub author_id:  Uuid,
  pub body:       String,
  pub status:     CommentStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Input to [`crate::store::ContentStore::add_comment`]. New comments always
/// start as [`CommentStatus::Pending`].
#[derive(Debug, Clone)]
pub struct NewComment {
  pub post_id:   Uuid,
  pub author_id: Uuid,
  pub body:      String,
}
