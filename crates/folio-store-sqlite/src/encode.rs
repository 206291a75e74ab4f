//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Sets and maps are stored as
//! compact JSON. UUIDs are stored as hyphenated lowercase strings.

use std::{
  collections::{BTreeMap, BTreeSet},
  str::FromStr,
};

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use folio_core::{
  comment::{Comment, CommentStatus},
  post::{AssetDescriptor, Post, PostStatus},
  revision::Revision,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// Fixed-width UTC with microseconds, so stored strings sort chronologically.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// The current time at the precision [`encode_dt`] stores.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::UnknownEnum {
    column,
    value: s.to_owned(),
  })
}

pub fn decode_post_status(s: &str) -> Result<PostStatus> {
  decode_enum("status", s)
}

pub fn decode_comment_status(s: &str) -> Result<CommentStatus> {
  decode_enum("comment status", s)
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_set(set: &BTreeSet<String>) -> Result<String> {
  Ok(serde_json::to_string(set)?)
}

pub fn encode_asset(asset: Option<&AssetDescriptor>) -> Result<Option<String>> {
  asset.map(serde_json::to_string).transpose().map_err(Error::from)
}

pub fn encode_metadata(
  metadata: &BTreeMap<String, serde_json::Value>,
) -> Result<String> {
  Ok(serde_json::to_string(metadata)?)
}

fn clamp_count(n: i64) -> u64 { u64::try_from(n).unwrap_or_default() }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawPost::from_row`]. Prefix-free so it can be used
/// directly after `SELECT`.
pub const POST_COLUMNS: &str = "post_id, author_id, title, body, excerpt, \
                                tags, categories, feature_image, metadata, \
                                slug, status, published_at, is_deleted, \
                                view_count, comment_count, version, \
                                created_at, updated_at";

/// Raw strings read directly from a `posts` row.
pub struct RawPost {
  pub post_id:       String,
  pub author_id:     String,
  pub title:         String,
  pub body:          String,
  pub excerpt:       Option<String>,
  pub tags:          String,
  pub categories:    String,
  pub feature_image: Option<String>,
  pub metadata:      String,
  pub slug:          String,
  pub status:        String,
  pub published_at:  Option<String>,
  pub is_deleted:    bool,
  pub view_count:    i64,
  pub comment_count: i64,
  pub version:       i64,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawPost {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post_id:       row.get(0)?,
      author_id:     row.get(1)?,
      title:         row.get(2)?,
      body:          row.get(3)?,
      excerpt:       row.get(4)?,
      tags:          row.get(5)?,
      categories:    row.get(6)?,
      feature_image: row.get(7)?,
      metadata:      row.get(8)?,
      slug:          row.get(9)?,
      status:        row.get(10)?,
      published_at:  row.get(11)?,
      is_deleted:    row.get(12)?,
      view_count:    row.get(13)?,
      comment_count: row.get(14)?,
      version:       row.get(15)?,
      created_at:    row.get(16)?,
      updated_at:    row.get(17)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      post_id:       decode_uuid(&self.post_id)?,
      author_id:     decode_uuid(&self.author_id)?,
      title:         self.title,
      body:          self.body,
      excerpt:       self.excerpt,
      tags:          serde_json::from_str(&self.tags)?,
      categories:    serde_json::from_str(&self.categories)?,
      feature_image: self
        .feature_image
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?,
      metadata:      serde_json::from_str(&self.metadata)?,
      slug:          self.slug,
      status:        decode_post_status(&self.status)?,
      published_at:  self.published_at.as_deref().map(decode_dt).transpose()?,
      is_deleted:    self.is_deleted,
      view_count:    clamp_count(self.view_count),
      comment_count: clamp_count(self.comment_count),
      version:       self.version,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

pub const REVISION_COLUMNS: &str =
  "revision_id, post_id, editor_id, title, content, note, created_at";

/// Raw strings read directly from a `revisions` row.
pub struct RawRevision {
  pub revision_id: String,
  pub post_id:     String,
  pub editor_id:   String,
  pub title:       String,
  pub content:     String,
  pub note:        Option<String>,
  pub created_at:  String,
}

impl RawRevision {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      revision_id: row.get(0)?,
      post_id:     row.get(1)?,
      editor_id:   row.get(2)?,
      title:       row.get(3)?,
      content:     row.get(4)?,
      note:        row.get(5)?,
      created_at:  row.get(6)?,
    })
  }

  pub fn into_revision(self) -> Result<Revision> {
    Ok(Revision {
      revision_id: decode_uuid(&self.revision_id)?,
      post_id:     decode_uuid(&self.post_id)?,
      editor_id:   decode_uuid(&self.editor_id)?,
      title:       self.title,
      content:     self.content,
      note:        self.note,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const COMMENT_COLUMNS: &str =
  "comment_id, post_id, author_id, body, status, created_at, updated_at";

/// Raw strings read directly from a `comments` row.
pub struct RawComment {
  pub comment_id: String,
  pub post_id:    String,
  pub author_id:  String,
  pub body:       String,
  pub status:     String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawComment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id: row.get(0)?,
      post_id:    row.get(1)?,
      author_id:  row.get(2)?,
      body:       row.get(3)?,
      status:     row.get(4)?,
      created_at: row.get(5)?,
      updated_at: row.get(6)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id: decode_uuid(&self.comment_id)?,
      post_id:    decode_uuid(&self.post_id)?,
      author_id:  decode_uuid(&self.author_id)?,
      body:       self.body,
      status:     decode_comment_status(&self.status)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
