//! Revision: an immutable snapshot of a post's title and body, taken
//! immediately before the content is overwritten.
//!
//! Revisions are append-only. They outlive soft deletion of their post and
//! disappear only when the post is permanently deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Revision {
  pub revision_id: Uuid,
  pub post_id:     Uuid,
  /// The identity whose edit triggered the snapshot.
  pub editor_id:   Uuid,
  pub title:       String,
  pub content:     String,
  pub note:        Option<String>,
  pub created_at:  DateTime<Utc>,
}
