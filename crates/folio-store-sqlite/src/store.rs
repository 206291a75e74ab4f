//! [`SqliteStore`]: the SQLite implementation of [`ContentStore`].

use std::{collections::BTreeSet, path::Path, time::Duration};

use chrono::{DateTime, Utc};
use rusqlite::{
  Connection, OptionalExtension as _, Transaction, TransactionBehavior,
  params, params_from_iter, types::Value,
};
use uuid::Uuid;

use folio_core::{
  Error as CoreError,
  actor::Actor,
  comment::{Comment, CommentStatus, NewComment},
  error::parse_id,
  lifecycle::{self, Action, Lifecycle},
  page::{Page, PageRequest},
  post::{NewPost, Post, PostPatch, PostStatus},
  revision::Revision,
  store::{BulkOutcome, ContentStore, DeletionFilter, PostQuery, PostStats},
};

use crate::{
  Result,
  encode::{
    COMMENT_COLUMNS, POST_COLUMNS, REVISION_COLUMNS, RawComment, RawPost,
    RawRevision, encode_asset, encode_dt, encode_metadata, encode_set,
    encode_uuid, now,
  },
  schema::SCHEMA,
  slugs,
};

/// How long a writer waits on a lock held by another connection.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Folio content store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` inside one `IMMEDIATE` transaction. Any error, domain or
  /// database, drops the transaction and rolls back every statement in it.
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| Ok(in_transaction(conn, f)))
      .await?
  }

  async fn with_conn<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Execute raw SQL against the underlying connection. Test-only hook for
  /// injecting failures (e.g. triggers that abort a statement).
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn in_transaction<T>(
  conn: &mut Connection,
  f: impl FnOnce(&Transaction<'_>) -> Result<T>,
) -> Result<T> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  let out = f(&tx)?;
  tx.commit()?;
  Ok(out)
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn load_post(conn: &Connection, id: Uuid) -> Result<Option<Post>> {
  let raw = conn
    .query_row(
      &format!("SELECT {POST_COLUMNS} FROM posts WHERE post_id = ?1"),
      params![encode_uuid(id)],
      RawPost::from_row,
    )
    .optional()?;
  raw.map(RawPost::into_post).transpose()
}

fn require_post(conn: &Connection, id: Uuid) -> Result<Post> {
  load_post(conn, id)?.ok_or_else(|| CoreError::PostNotFound(id).into())
}

fn insert_post(conn: &Connection, post: &Post) -> Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO posts ({POST_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
    ),
    params![
      encode_uuid(post.post_id),
      encode_uuid(post.author_id),
      post.title,
      post.body,
      post.excerpt,
      encode_set(&post.tags)?,
      encode_set(&post.categories)?,
      encode_asset(post.feature_image.as_ref())?,
      encode_metadata(&post.metadata)?,
      post.slug,
      post.status.as_ref(),
      post.published_at.map(encode_dt),
      post.is_deleted,
      post.view_count as i64,
      post.comment_count as i64,
      post.version,
      encode_dt(post.created_at),
      encode_dt(post.updated_at),
    ],
  )?;
  Ok(())
}

/// Persist `post` only if the stored row is still at `expected_version`.
///
/// Counters are not written here; they only change through their own
/// increments.
fn save_post(conn: &Connection, post: &Post, expected_version: i64) -> Result<()> {
  let changed = conn.execute(
    "UPDATE posts SET
       title = ?3, body = ?4, excerpt = ?5, tags = ?6, categories = ?7,
       feature_image = ?8, metadata = ?9, slug = ?10, status = ?11,
       published_at = ?12, is_deleted = ?13, version = ?14, updated_at = ?15
     WHERE post_id = ?1 AND version = ?2",
    params![
      encode_uuid(post.post_id),
      expected_version,
      post.title,
      post.body,
      post.excerpt,
      encode_set(&post.tags)?,
      encode_set(&post.categories)?,
      encode_asset(post.feature_image.as_ref())?,
      encode_metadata(&post.metadata)?,
      post.slug,
      post.status.as_ref(),
      post.published_at.map(encode_dt),
      post.is_deleted,
      post.version,
      encode_dt(post.updated_at),
    ],
  )?;
  if changed == 0 {
    return Err(CoreError::ConcurrentModification(post.post_id).into());
  }
  Ok(())
}

fn bump(post: &mut Post, at: DateTime<Utc>) {
  post.version += 1;
  post.updated_at = post.next_updated_at(at);
}

/// Append a snapshot of `title`/`content` to the post's history.
fn snapshot(
  conn: &Connection,
  post_id: Uuid,
  editor_id: Uuid,
  title: &str,
  content: &str,
  note: Option<String>,
  at: DateTime<Utc>,
) -> Result<Revision> {
  let revision = Revision {
    revision_id: Uuid::new_v4(),
    post_id,
    editor_id,
    title: title.to_owned(),
    content: content.to_owned(),
    note,
    created_at: at,
  };
  conn.execute(
    "INSERT INTO revisions
       (revision_id, post_id, editor_id, title, content, note, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    params![
      encode_uuid(revision.revision_id),
      encode_uuid(post_id),
      encode_uuid(editor_id),
      revision.title,
      revision.content,
      revision.note,
      encode_dt(at),
    ],
  )?;
  tracing::debug!(%post_id, revision_id = %revision.revision_id, "snapshot taken");
  Ok(revision)
}

/// Move `post` to a slug derived from `title`, retiring the old one.
fn reslug(
  conn: &Connection,
  post: &mut Post,
  title: &str,
  at: DateTime<Utc>,
) -> Result<()> {
  let slug = slugs::allocate(conn, title, post.post_id, at)?;
  if slug != post.slug {
    slugs::retire(conn, &post.slug, at)?;
    post.slug = slug;
  }
  Ok(())
}

fn shift_comment_count(conn: &Connection, post_id: Uuid, delta: i64) -> Result<u64> {
  let current: i64 = conn
    .query_row(
      "SELECT comment_count FROM posts WHERE post_id = ?1",
      params![encode_uuid(post_id)],
      |r| r.get(0),
    )
    .optional()?
    .ok_or(CoreError::PostNotFound(post_id))?;

  let mut next = current.saturating_add(delta);
  if next < 0 {
    tracing::warn!(
      %post_id, current, delta,
      "comment count would go negative; clamping to zero"
    );
    next = 0;
  }

  conn.execute(
    "UPDATE posts SET comment_count = ?2 WHERE post_id = ?1",
    params![encode_uuid(post_id), next],
  )?;
  Ok(next as u64)
}

fn load_comment(conn: &Connection, id: Uuid) -> Result<Option<Comment>> {
  let raw = conn
    .query_row(
      &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE comment_id = ?1"),
      params![encode_uuid(id)],
      RawComment::from_row,
    )
    .optional()?;
  raw.map(RawComment::into_comment).transpose()
}

/// `LIKE` pattern matching `text` anywhere, with wildcards escaped.
fn contains_pattern(text: &str) -> String {
  let escaped = text
    .replace('\\', "\\\\")
    .replace('%', "\\%")
    .replace('_', "\\_");
  format!("%{escaped}%")
}

/// Build the `WHERE` clause and its positional values for a [`PostQuery`].
fn post_filter(query: &PostQuery) -> (String, Vec<Value>) {
  let mut conds: Vec<&'static str> = vec![];
  let mut values: Vec<Value> = vec![];

  match query.deletion {
    DeletionFilter::Exclude => conds.push("is_deleted = 0"),
    DeletionFilter::Only => conds.push("is_deleted = 1"),
    DeletionFilter::Include => {}
  }
  if let Some(status) = query.status {
    conds.push("status = ?");
    values.push(Value::Text(status.as_ref().to_owned()));
  }
  if let Some(author_id) = query.author_id {
    conds.push("author_id = ?");
    values.push(Value::Text(encode_uuid(author_id)));
  }
  if let Some(tag) = &query.tag {
    conds.push("EXISTS (SELECT 1 FROM json_each(posts.tags) WHERE json_each.value = ?)");
    values.push(Value::Text(tag.clone()));
  }
  if let Some(category) = &query.category {
    conds.push(
      "EXISTS (SELECT 1 FROM json_each(posts.categories) WHERE json_each.value = ?)",
    );
    values.push(Value::Text(category.clone()));
  }
  if let Some(text) = query.text.as_deref().filter(|t| !t.trim().is_empty()) {
    conds.push(
      "(title LIKE ? ESCAPE '\\' OR body LIKE ? ESCAPE '\\' \
       OR excerpt LIKE ? ESCAPE '\\')",
    );
    let pattern = contains_pattern(text.trim());
    values.extend(std::iter::repeat_n(Value::Text(pattern), 3));
  }

  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  (where_clause, values)
}

fn require_admin(actor: &Actor, what: &'static str) -> Result<()> {
  if actor.is_admin() {
    Ok(())
  } else {
    Err(CoreError::Forbidden(what).into())
  }
}

// ─── ContentStore impl ───────────────────────────────────────────────────────

impl ContentStore for SqliteStore {
  type Error = crate::Error;

  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn create_post(&self, actor: Actor, input: NewPost) -> Result<Post> {
    input.validate()?;

    let at = now();
    let publish = input.publish && actor.is_admin();
    let mut post = Post {
      post_id:       Uuid::new_v4(),
      author_id:     actor.id,
      title:         input.title,
      body:          input.body,
      excerpt:       input.excerpt,
      tags:          input.tags,
      categories:    input.categories,
      feature_image: input.feature_image,
      metadata:      input.metadata,
      slug:          String::new(),
      status:        if publish { PostStatus::Published } else { PostStatus::Draft },
      published_at:  publish.then_some(at),
      is_deleted:    false,
      view_count:    0,
      comment_count: 0,
      version:       1,
      created_at:    at,
      updated_at:    at,
    };

    let post = self
      .write(move |tx| {
        post.slug = slugs::allocate(tx, &post.title, post.post_id, at)?;
        insert_post(tx, &post)?;
        Ok(post)
      })
      .await?;

    tracing::info!(post_id = %post.post_id, slug = %post.slug, status = %post.status, "post created");
    Ok(post)
  }

  async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
    self.with_conn(move |conn| load_post(conn, id)).await
  }

  async fn get_post_by_slug(&self, slug: String) -> Result<Option<Post>> {
    self
      .with_conn(move |conn| {
        let raw = conn
          .query_row(
            &format!(
              "SELECT {POST_COLUMNS} FROM posts
               WHERE slug = ?1
                 AND EXISTS (SELECT 1 FROM slugs s
                             WHERE s.slug = posts.slug
                               AND s.post_id = posts.post_id
                               AND s.retired_at IS NULL)"
            ),
            params![slug],
            RawPost::from_row,
          )
          .optional()?;
        raw.map(RawPost::into_post).transpose()
      })
      .await
  }

  async fn update_post(
    &self,
    id: Uuid,
    actor: Actor,
    patch: PostPatch,
  ) -> Result<Post> {
    patch.validate()?;

    self
      .write(move |tx| {
        let at = now();
        let current = require_post(tx, id)?;

        if !actor.can_manage(current.author_id) {
          return Err(
            CoreError::Forbidden("only the author or an administrator may edit this post")
              .into(),
          );
        }
        if current.is_deleted {
          return Err(CoreError::PostDeleted(id).into());
        }
        if let Some(expected) = patch.expected_version
          && expected != current.version
        {
          return Err(
            CoreError::VersionMismatch {
              post_id: id,
              expected,
              actual: current.version,
            }
            .into(),
          );
        }

        let mut next = current.clone();

        if patch.changes_content(&current) {
          snapshot(
            tx,
            id,
            actor.id,
            &current.title,
            &current.body,
            patch.note.clone(),
            at,
          )?;
        }
        if let Some(title) = &patch.title
          && patch.changes_title(&current)
        {
          reslug(tx, &mut next, title, at)?;
        }
        if let Some(status) = patch.status {
          lifecycle::request_status(&current, status, &actor, at)?
            .apply_to(&mut next);
        }

        let PostPatch {
          title,
          body,
          excerpt,
          tags,
          categories,
          feature_image,
          metadata,
          ..
        } = patch;
        if let Some(title) = title {
          next.title = title;
        }
        if let Some(body) = body {
          next.body = body;
        }
        if let Some(excerpt) = excerpt {
          next.excerpt = excerpt;
        }
        if let Some(tags) = tags {
          next.tags = tags;
        }
        if let Some(categories) = categories {
          next.categories = categories;
        }
        if let Some(feature_image) = feature_image {
          next.feature_image = feature_image;
        }
        if let Some(metadata) = metadata {
          next.metadata = metadata;
        }

        bump(&mut next, at);
        save_post(tx, &next, current.version)?;
        Ok(next)
      })
      .await
  }

  async fn transition(
    &self,
    id: Uuid,
    actor: Actor,
    action: Action,
  ) -> Result<Post> {
    let post = self
      .write(move |tx| {
        let at = now();
        let current = require_post(tx, id)?;
        let state = lifecycle::transition(&current, action, &actor, at)?;
        if state == Lifecycle::of(&current) {
          return Ok(current);
        }

        let mut next = current.clone();
        state.apply_to(&mut next);
        match action {
          Action::Delete => slugs::retire(tx, &next.slug, at)?,
          Action::Restore => slugs::reclaim(tx, &next.slug)?,
          Action::Publish | Action::Unpublish => {}
        }
        bump(&mut next, at);
        save_post(tx, &next, current.version)?;
        Ok(next)
      })
      .await?;

    tracing::info!(post_id = %id, %action, status = %post.status, deleted = post.is_deleted, "lifecycle transition");
    Ok(post)
  }

  async fn soft_delete(&self, id: Uuid, actor: Actor) -> Result<()> {
    self.transition(id, actor, Action::Delete).await?;
    Ok(())
  }

  async fn restore(&self, id: Uuid, actor: Actor) -> Result<Post> {
    self.transition(id, actor, Action::Restore).await
  }

  async fn force_delete(&self, id: Uuid, actor: Actor) -> Result<()> {
    require_admin(&actor, "only administrators may permanently delete posts")?;

    let (revisions, comments) = self
      .write(move |tx| {
        let id_str = encode_uuid(id);
        let exists = tx
          .query_row(
            "SELECT 1 FROM posts WHERE post_id = ?1",
            params![id_str],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Err(CoreError::PostNotFound(id).into());
        }

        let revisions =
          tx.execute("DELETE FROM revisions WHERE post_id = ?1", params![id_str])?;
        let comments =
          tx.execute("DELETE FROM comments WHERE post_id = ?1", params![id_str])?;
        tx.execute(
          "UPDATE slugs SET retired_at = COALESCE(retired_at, ?2) WHERE post_id = ?1",
          params![id_str, encode_dt(now())],
        )?;
        tx.execute("DELETE FROM posts WHERE post_id = ?1", params![id_str])?;
        Ok((revisions, comments))
      })
      .await?;

    tracing::info!(post_id = %id, revisions, comments, "post permanently deleted");
    Ok(())
  }

  async fn bulk_set_published(
    &self,
    ids: Vec<String>,
    publish: bool,
    actor: Actor,
  ) -> Result<BulkOutcome> {
    require_admin(&actor, "only administrators may change posts in bulk")?;

    let ids: BTreeSet<Uuid> =
      ids.iter().filter_map(|raw| parse_id(raw).ok()).collect();
    let action = if publish { Action::Publish } else { Action::Unpublish };

    let outcome = self
      .write(move |tx| {
        let at = now();
        let mut outcome = BulkOutcome::default();

        for id in ids {
          let Some(current) = load_post(tx, id)? else {
            continue;
          };
          if current.is_deleted {
            continue;
          }
          outcome.matched += 1;

          let state = match lifecycle::transition(&current, action, &actor, at) {
            Ok(state) => state,
            Err(CoreError::IllegalTransition { .. }) => continue,
            Err(e) => return Err(e.into()),
          };
          if state == Lifecycle::of(&current) {
            continue;
          }

          let mut next = current.clone();
          state.apply_to(&mut next);
          bump(&mut next, at);
          save_post(tx, &next, current.version)?;
          outcome.modified += 1;
        }
        Ok(outcome)
      })
      .await?;

    tracing::info!(
      %action, matched = outcome.matched, modified = outcome.modified,
      "bulk lifecycle change"
    );
    Ok(outcome)
  }

  async fn list_posts(&self, query: PostQuery) -> Result<Page<Post>> {
    let page = query.page;

    let (total, raws) = self
      .with_conn(move |conn| {
        let (where_clause, mut values) = post_filter(&query);

        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM posts {where_clause}"),
          params_from_iter(values.iter()),
          |r| r.get(0),
        )?;

        values.push(Value::Integer(i64::from(page.limit())));
        values.push(Value::Integer(page.offset() as i64));
        let mut stmt = conn.prepare(&format!(
          "SELECT {POST_COLUMNS} FROM posts {where_clause}
           ORDER BY COALESCE(published_at, created_at) DESC, created_at DESC, post_id
           LIMIT ? OFFSET ?"
        ))?;
        let raws = stmt
          .query_map(params_from_iter(values.iter()), RawPost::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((total, raws))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawPost::into_post)
      .collect::<Result<Vec<_>>>()?;
    Ok(Page::new(page, total as u64, items))
  }

  async fn stats(&self) -> Result<PostStats> {
    self
      .with_conn(|conn| {
        let stats = conn.query_row(
          "SELECT
             COUNT(*),
             COALESCE(SUM(status = 'draft'     AND is_deleted = 0), 0),
             COALESCE(SUM(status = 'pending'   AND is_deleted = 0), 0),
             COALESCE(SUM(status = 'published' AND is_deleted = 0), 0),
             COALESCE(SUM(is_deleted), 0),
             COALESCE(SUM(view_count), 0),
             COALESCE(SUM(comment_count), 0)
           FROM posts",
          [],
          |r| {
            Ok(PostStats {
              total:          r.get::<_, i64>(0)? as u64,
              draft:          r.get::<_, i64>(1)? as u64,
              pending:        r.get::<_, i64>(2)? as u64,
              published:      r.get::<_, i64>(3)? as u64,
              deleted:        r.get::<_, i64>(4)? as u64,
              total_views:    r.get::<_, i64>(5)? as u64,
              total_comments: r.get::<_, i64>(6)? as u64,
            })
          },
        )?;
        Ok(stats)
      })
      .await
  }

  // ── Counters ──────────────────────────────────────────────────────────────

  async fn increment_view_count(&self, id: Uuid) -> Result<()> {
    let changed = self
      .with_conn(move |conn| {
        Ok(conn.execute(
          "UPDATE posts SET view_count = view_count + 1 WHERE post_id = ?1",
          params![encode_uuid(id)],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(CoreError::PostNotFound(id).into());
    }
    Ok(())
  }

  async fn adjust_comment_count(&self, id: Uuid, delta: i64) -> Result<u64> {
    self
      .write(move |tx| shift_comment_count(tx, id, delta))
      .await
  }

  // ── Revisions ─────────────────────────────────────────────────────────────

  async fn list_revisions(
    &self,
    post_id: Uuid,
    actor: Actor,
    page: PageRequest,
  ) -> Result<Page<Revision>> {
    let (total, raws) = self
      .with_conn(move |conn| {
        let post = require_post(conn, post_id)?;
        if !actor.can_manage(post.author_id) {
          return Err(
            CoreError::Forbidden(
              "only the author or an administrator may view revisions",
            )
            .into(),
          );
        }

        let id_str = encode_uuid(post_id);
        let total: i64 = conn.query_row(
          "SELECT COUNT(*) FROM revisions WHERE post_id = ?1",
          params![id_str],
          |r| r.get(0),
        )?;
        let mut stmt = conn.prepare(&format!(
          "SELECT {REVISION_COLUMNS} FROM revisions
           WHERE post_id = ?1
           ORDER BY seq DESC
           LIMIT ?2 OFFSET ?3"
        ))?;
        let raws = stmt
          .query_map(
            params![id_str, i64::from(page.limit()), page.offset() as i64],
            RawRevision::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((total, raws))
      })
      .await?;

    let items = raws
      .into_iter()
      .map(RawRevision::into_revision)
      .collect::<Result<Vec<_>>>()?;
    Ok(Page::new(page, total as u64, items))
  }

  async fn restore_revision(
    &self,
    post_id: Uuid,
    revision_id: Uuid,
    actor: Actor,
  ) -> Result<Post> {
    self
      .write(move |tx| {
        let at = now();
        let current = require_post(tx, post_id)?;
        if !actor.can_manage(current.author_id) {
          return Err(
            CoreError::Forbidden(
              "only the author or an administrator may restore revisions",
            )
            .into(),
          );
        }
        if current.is_deleted {
          return Err(CoreError::PostDeleted(post_id).into());
        }

        let target = tx
          .query_row(
            &format!(
              "SELECT {REVISION_COLUMNS} FROM revisions
               WHERE revision_id = ?1 AND post_id = ?2"
            ),
            params![encode_uuid(revision_id), encode_uuid(post_id)],
            RawRevision::from_row,
          )
          .optional()?
          .ok_or(CoreError::RevisionNotFound(revision_id))?
          .into_revision()?;

        snapshot(
          tx,
          post_id,
          actor.id,
          &current.title,
          &current.body,
          Some(format!("before restoring revision {revision_id}")),
          at,
        )?;

        let mut next = current.clone();
        if target.title != current.title {
          reslug(tx, &mut next, &target.title, at)?;
        }
        next.title = target.title;
        next.body = target.content;
        bump(&mut next, at);
        save_post(tx, &next, current.version)?;
        Ok(next)
      })
      .await
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn add_comment(&self, input: NewComment) -> Result<Comment> {
    if input.body.trim().is_empty() {
      return Err(CoreError::Validation("body is required".into()).into());
    }

    self
      .write(move |tx| {
        let post = require_post(tx, input.post_id)?;
        if post.is_deleted {
          return Err(CoreError::PostDeleted(post.post_id).into());
        }

        let at = now();
        let comment = Comment {
          comment_id: Uuid::new_v4(),
          post_id:    input.post_id,
          author_id:  input.author_id,
          body:       input.body,
          status:     CommentStatus::Pending,
          created_at: at,
          updated_at: at,
        };
        tx.execute(
          &format!(
            "INSERT INTO comments ({COMMENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
          ),
          params![
            encode_uuid(comment.comment_id),
            encode_uuid(comment.post_id),
            encode_uuid(comment.author_id),
            comment.body,
            comment.status.as_ref(),
            encode_dt(at),
            encode_dt(at),
          ],
        )?;
        Ok(comment)
      })
      .await
  }

  async fn set_comment_status(
    &self,
    comment_id: Uuid,
    status: CommentStatus,
  ) -> Result<Comment> {
    self
      .write(move |tx| {
        let mut comment = load_comment(tx, comment_id)?
          .ok_or(CoreError::CommentNotFound(comment_id))?;

        let delta = comment.status.count_delta(status);
        if delta != 0 {
          shift_comment_count(tx, comment.post_id, delta)?;
        }

        comment.status = status;
        comment.updated_at = now().max(comment.updated_at);
        tx.execute(
          "UPDATE comments SET status = ?2, updated_at = ?3 WHERE comment_id = ?1",
          params![
            encode_uuid(comment_id),
            status.as_ref(),
            encode_dt(comment.updated_at),
          ],
        )?;
        Ok(comment)
      })
      .await
  }

  async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
    let raws = self
      .with_conn(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS} FROM comments
           WHERE post_id = ?1
           ORDER BY created_at, comment_id"
        ))?;
        let raws = stmt
          .query_map(params![encode_uuid(post_id)], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(raws)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }
}
