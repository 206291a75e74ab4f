//! Slug allocation inside a write transaction.
//!
//! The `slugs` primary key decides uniqueness. Probing existing rows only
//! produces a hint about where to start; an insert that hits the key means
//! another writer got there first, and the next candidate is tried.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use folio_core::slug;
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use crate::{
  Result,
  encode::{decode_uuid, encode_dt, encode_uuid},
};

/// Upper bound on insert attempts before giving up with a conflict.
pub const MAX_SLUG_ATTEMPTS: usize = 32;

/// Assign a slug derived from `title` to `post_id`.
///
/// Candidates already owned by `post_id` (its current slug, or one it held
/// before) are reclaimed rather than treated as taken.
pub(crate) fn allocate(
  conn: &Connection,
  title: &str,
  post_id: Uuid,
  now: DateTime<Utc>,
) -> Result<String> {
  let base = slug::normalize(title);
  let hint = probe(conn, &base)?;
  allocate_with_hint(conn, &base, post_id, &hint, now)
}

/// Existing slugs that are `base` or a numbered variant of it, with owners.
pub(crate) fn probe(
  conn: &Connection,
  base: &str,
) -> Result<HashMap<String, Uuid>> {
  let mut stmt = conn.prepare(
    "SELECT slug, post_id FROM slugs WHERE slug = ?1 OR slug LIKE ?1 || '-%'",
  )?;
  let rows = stmt
    .query_map(params![base], |r| {
      Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  rows
    .into_iter()
    .filter(|(s, _)| slug::is_candidate_of(base, s))
    .map(|(s, owner)| Ok((s, decode_uuid(&owner)?)))
    .collect()
}

pub(crate) fn allocate_with_hint(
  conn: &Connection,
  base: &str,
  post_id: Uuid,
  hint: &HashMap<String, Uuid>,
  now: DateTime<Utc>,
) -> Result<String> {
  let owner_str = encode_uuid(post_id);
  let at_str = encode_dt(now);
  let mut attempts = 0;

  for candidate in slug::candidates(base) {
    match hint.get(&candidate) {
      Some(owner) if *owner == post_id => {
        reclaim(conn, &candidate)?;
        return Ok(candidate);
      }
      Some(_) => continue,
      None => {}
    }

    if attempts == MAX_SLUG_ATTEMPTS {
      break;
    }
    attempts += 1;

    let inserted = conn.execute(
      "INSERT INTO slugs (slug, post_id, assigned_at) VALUES (?1, ?2, ?3)",
      params![candidate, owner_str, at_str],
    );
    match inserted {
      Ok(_) => return Ok(candidate),
      Err(e) if is_unique_violation(&e) => {
        if owner_of(conn, &candidate)? == Some(post_id) {
          reclaim(conn, &candidate)?;
          return Ok(candidate);
        }
        tracing::debug!(slug = %candidate, "slug taken, trying next candidate");
      }
      Err(e) => return Err(e.into()),
    }
  }

  Err(folio_core::Error::SlugExhausted(base.to_owned()).into())
}

/// Mark `slug` as no longer current. The row stays so it is never handed out
/// to another post.
pub(crate) fn retire(
  conn: &Connection,
  slug: &str,
  now: DateTime<Utc>,
) -> Result<()> {
  conn.execute(
    "UPDATE slugs SET retired_at = ?2 WHERE slug = ?1 AND retired_at IS NULL",
    params![slug, encode_dt(now)],
  )?;
  Ok(())
}

pub(crate) fn reclaim(conn: &Connection, slug: &str) -> Result<()> {
  conn.execute(
    "UPDATE slugs SET retired_at = NULL WHERE slug = ?1",
    params![slug],
  )?;
  Ok(())
}

fn owner_of(conn: &Connection, slug: &str) -> Result<Option<Uuid>> {
  let owner: Option<String> = conn
    .query_row(
      "SELECT post_id FROM slugs WHERE slug = ?1",
      params![slug],
      |r| r.get(0),
    )
    .optional()?;
  owner.as_deref().map(decode_uuid).transpose()
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}
