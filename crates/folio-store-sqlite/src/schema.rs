//! SQL schema for the Folio SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE … IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS posts (
    post_id       TEXT PRIMARY KEY,
    author_id     TEXT NOT NULL,
    title         TEXT NOT NULL,
    body          TEXT NOT NULL,
    excerpt       TEXT,
    tags          TEXT NOT NULL DEFAULT '[]',   -- JSON array, sorted
    categories    TEXT NOT NULL DEFAULT '[]',   -- JSON array, sorted
    feature_image TEXT,                         -- JSON AssetDescriptor or NULL
    metadata      TEXT NOT NULL DEFAULT '{}',   -- JSON object
    slug          TEXT NOT NULL UNIQUE,
    status        TEXT NOT NULL,                -- 'draft' | 'pending' | 'published' | 'archived'
    published_at  TEXT,                         -- set once, never cleared
    is_deleted    INTEGER NOT NULL DEFAULT 0,
    view_count    INTEGER NOT NULL DEFAULT 0,
    comment_count INTEGER NOT NULL DEFAULT 0 CHECK (comment_count >= 0),
    version       INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- Every slug ever assigned. The primary key is the final arbiter of
-- uniqueness; rows are retired, never deleted, so old URLs stay unambiguous.
CREATE TABLE IF NOT EXISTS slugs (
    slug        TEXT PRIMARY KEY,
    post_id     TEXT NOT NULL,
    assigned_at TEXT NOT NULL,
    retired_at  TEXT
);

-- Revisions are strictly append-only; `seq` orders history.
CREATE TABLE IF NOT EXISTS revisions (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    revision_id TEXT NOT NULL UNIQUE,
    post_id     TEXT NOT NULL REFERENCES posts(post_id),
    editor_id   TEXT NOT NULL,
    title       TEXT NOT NULL,
    content     TEXT NOT NULL,
    note        TEXT,
    created_at  TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS revisions_immutable
BEFORE UPDATE ON revisions
BEGIN
    SELECT RAISE(ABORT, 'revisions are immutable');
END;

CREATE TABLE IF NOT EXISTS comments (
    comment_id TEXT PRIMARY KEY,
    post_id    TEXT NOT NULL REFERENCES posts(post_id),
    author_id  TEXT NOT NULL,
    body       TEXT NOT NULL,
    status     TEXT NOT NULL,   -- 'pending' | 'approved' | 'rejected'
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS posts_author_idx     ON posts(author_id);
CREATE INDEX IF NOT EXISTS posts_status_idx     ON posts(status, is_deleted);
CREATE INDEX IF NOT EXISTS slugs_post_idx       ON slugs(post_id);
CREATE INDEX IF NOT EXISTS revisions_post_idx   ON revisions(post_id, seq);
CREATE INDEX IF NOT EXISTS comments_post_idx    ON comments(post_id);

PRAGMA user_version = 1;
";
