//! Post: the authoritative content unit.
//!
//! Lifecycle is modelled as two independent axes: [`PostStatus`] and the
//! `is_deleted` flag. Restoring a deleted post needs both (plus
//! `published_at`) to decide where it lands.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, actor::Actor};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PostStatus {
  Draft,
  /// An author has asked for publication; an administrator must approve.
  Pending,
  Published,
  /// Only reached through soft deletion.
  Archived,
}

// ─── Asset reference ─────────────────────────────────────────────────────────

/// What the asset-storage collaborator hands back for an upload. No bytes are
/// ever stored by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
  pub url:       String,
  pub mime_type: String,
  pub size:      u64,
}

// ─── Post ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
  pub post_id:       Uuid,
  pub author_id:     Uuid,
  pub title:         String,
  pub body:          String,
  pub excerpt:       Option<String>,
  pub tags:          BTreeSet<String>,
  pub categories:    BTreeSet<String>,
  pub feature_image: Option<AssetDescriptor>,
  /// Free-form settings; no schema is enforced here.
  pub metadata:      BTreeMap<String, serde_json::Value>,
  pub slug:          String,
  pub status:        PostStatus,
  /// Set the first time the post is published; never cleared.
  pub published_at:  Option<DateTime<Utc>>,
  pub is_deleted:    bool,
  pub view_count:    u64,
  /// Number of approved comments, maintained incrementally.
  pub comment_count: u64,
  /// Bumped on every write; the optimistic-concurrency token.
  pub version:       i64,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Post {
  /// Published and not deleted.
  pub fn is_public(&self) -> bool {
    !self.is_deleted && self.status == PostStatus::Published
  }

  /// Whether `viewer` may read this post.
  ///
  /// Deleted posts are visible to administrators only; unpublished posts to
  /// their owner and administrators.
  pub fn visible_to(&self, viewer: Option<&Actor>) -> bool {
    if self.is_deleted {
      return viewer.is_some_and(Actor::is_admin);
    }
    self.is_public() || viewer.is_some_and(|a| a.can_manage(self.author_id))
  }

  /// Next `updated_at` value, never earlier than the current one.
  pub fn next_updated_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
    now.max(self.updated_at)
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::ContentStore::create_post`].
#[derive(Debug, Clone, Default)]
pub struct NewPost {
  pub title:         String,
  pub body:          String,
  pub excerpt:       Option<String>,
  pub tags:          BTreeSet<String>,
  pub categories:    BTreeSet<String>,
  pub feature_image: Option<AssetDescriptor>,
  pub metadata:      BTreeMap<String, serde_json::Value>,
  /// Honoured only for administrators; everyone else starts in draft.
  pub publish:       bool,
}

impl NewPost {
  pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      body: body.into(),
      ..Default::default()
    }
  }

  pub fn validate(&self) -> Result<()> {
    require_text("title", &self.title)?;
    require_text("body", &self.body)
  }
}

/// A partial update. `None` leaves the stored value untouched; for the
/// optional fields, `Some(None)` clears them.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
  pub title:            Option<String>,
  pub body:             Option<String>,
  pub excerpt:          Option<Option<String>>,
  pub tags:             Option<BTreeSet<String>>,
  pub categories:       Option<BTreeSet<String>>,
  pub feature_image:    Option<Option<AssetDescriptor>>,
  pub metadata:         Option<BTreeMap<String, serde_json::Value>>,
  /// Routed through the lifecycle state machine.
  pub status:           Option<PostStatus>,
  /// Stored on the revision this edit produces, if any.
  pub note:             Option<String>,
  /// If set, the update only applies when the stored version matches.
  pub expected_version: Option<i64>,
}

impl PostPatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(title) = &self.title {
      require_text("title", title)?;
    }
    if let Some(body) = &self.body {
      require_text("body", body)?;
    }
    Ok(())
  }

  /// Whether applying this patch to `post` changes its title or body. This is the
  /// condition for taking a revision snapshot.
  pub fn changes_content(&self, post: &Post) -> bool {
    self.title.as_ref().is_some_and(|t| *t != post.title)
      || self.body.as_ref().is_some_and(|b| *b != post.body)
  }

  pub fn changes_title(&self, post: &Post) -> bool {
    self.title.as_ref().is_some_and(|t| *t != post.title)
  }
}

fn require_text(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::Validation(format!("{field} is required")));
  }
  Ok(())
}
