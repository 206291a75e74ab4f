//! JSON REST API for Folio.
//!
//! Exposes an axum [`Router`] backed by any [`folio_core::store::ContentStore`].
//! Credential checks, TLS and transport concerns are the caller's
//! responsibility; see [`identity`] for how the resolved identity arrives.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", folio_api::api_router(store.clone()))
//! ```

pub mod admin;
pub mod comments;
pub mod error;
pub mod etag;
pub mod extract;
pub mod identity;
pub mod posts;
pub mod revisions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use folio_core::store::ContentStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ContentStore + 'static,
{
  Router::new()
    // Public & author
    .route("/posts", get(posts::list::<S>).post(posts::create::<S>))
    .route("/posts/slug/{slug}", get(posts::by_slug::<S>))
    .route(
      "/posts/{id}",
      get(posts::get_one::<S>)
        .patch(posts::update::<S>)
        .delete(posts::delete::<S>),
    )
    .route("/posts/{id}/publish", post(posts::publish::<S>))
    .route("/posts/{id}/unpublish", post(posts::unpublish::<S>))
    .route("/me/posts", get(posts::mine::<S>))
    // Revisions
    .route("/posts/{id}/revisions", get(revisions::list::<S>))
    .route(
      "/posts/{id}/revisions/{revision_id}/restore",
      post(revisions::restore::<S>),
    )
    // Comments
    .route(
      "/posts/{id}/comments",
      get(comments::list::<S>).post(comments::create::<S>),
    )
    // Admin
    .route("/admin/posts", get(admin::list::<S>))
    .route("/admin/posts/bulk-publish", post(admin::bulk_publish::<S>))
    .route(
      "/admin/posts/{id}",
      get(admin::get_one::<S>).delete(admin::soft_delete::<S>),
    )
    .route("/admin/posts/{id}/permanent", delete(admin::force_delete::<S>))
    .route("/admin/posts/{id}/restore", post(admin::restore::<S>))
    .route(
      "/admin/posts/{id}/comment-count",
      post(admin::adjust_comment_count::<S>),
    )
    .route("/admin/comments/{id}/status", put(admin::moderate_comment::<S>))
    .route("/admin/stats", get(admin::stats::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
  };
  use folio_core::{
    actor::Actor,
    post::{NewPost, PostStatus},
    store::ContentStore,
  };
  use folio_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;
  use crate::identity::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};

  async fn setup() -> (Router, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    (api_router(store.clone()), store)
  }

  async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    actor: Option<Actor>,
    headers: Vec<(header::HeaderName, String)>,
    body: Option<Value>,
  ) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
      builder = builder
        .header(ACTOR_ID_HEADER, actor.id.to_string())
        .header(ACTOR_ROLE_HEADER, actor.role.as_ref());
    }
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = match body {
      Some(json) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, value)
  }

  fn author() -> Actor { Actor::author(Uuid::new_v4()) }

  fn admin() -> Actor { Actor::admin(Uuid::new_v4()) }

  // ── Public reads ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn drafts_are_hidden_from_the_public() {
    let (app, store) = setup().await;
    let owner = author();
    let draft = store
      .create_post(owner, NewPost::new("Secret", "draft body"))
      .await
      .unwrap();
    let uri = format!("/posts/{}", draft.post_id);

    let (status, _, body) = send(&app, "GET", &uri, None, vec![], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "not_found");

    let (status, _, _) =
      send(&app, "GET", &uri, Some(author()), vec![], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, headers, body) =
      send(&app, "GET", &uri, Some(owner), vec![], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "secret");
    assert!(headers.contains_key(header::ETAG));

    let (_, _, page) = send(&app, "GET", "/posts", None, vec![], None).await;
    assert_eq!(page["total"], 0);
  }

  #[tokio::test]
  async fn public_reads_count_views() {
    let (app, store) = setup().await;
    let mut input = NewPost::new("Hello World", "body");
    input.publish = true;
    let post = store.create_post(admin(), input).await.unwrap();

    let (status, _, body) =
      send(&app, "GET", "/posts/slug/hello-world", None, vec![], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post_id"], post.post_id.to_string());

    let uri = format!("/posts/{}", post.post_id);
    send(&app, "GET", &uri, None, vec![], None).await;

    let stored = store.get_post(post.post_id).await.unwrap().unwrap();
    assert_eq!(stored.view_count, 2);
  }

  #[tokio::test]
  async fn list_reports_page_metadata() {
    let (app, store) = setup().await;
    let boss = admin();
    for i in 0..3 {
      let mut input = NewPost::new(format!("Post {i}"), "body");
      input.publish = true;
      store.create_post(boss, input).await.unwrap();
    }

    let (status, _, page) =
      send(&app, "GET", "/posts?page=2&limit=2", None, vec![], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["page"], 2);
    assert_eq!(page["limit"], 2);
    assert_eq!(page["total"], 3);
    assert_eq!(page["items"].as_array().unwrap().len(), 1);

    let (_, _, page) =
      send(&app, "GET", "/posts?limit=1000", None, vec![], None).await;
    assert_eq!(page["limit"], folio_core::page::MAX_LIMIT);
  }

  #[tokio::test]
  async fn malformed_id_is_a_validation_error() {
    let (app, _) = setup().await;
    let (status, _, body) =
      send(&app, "GET", "/posts/not-a-uuid", None, vec![], None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation");
  }

  #[tokio::test]
  async fn malformed_query_is_a_validation_error() {
    let (app, _) = setup().await;
    for (uri, actor) in [
      ("/posts?page=-1", None),
      ("/me/posts?status=bogus", Some(author())),
      ("/admin/posts?deleted=sometimes", Some(admin())),
    ] {
      let (status, _, body) = send(&app, "GET", uri, actor, vec![], None).await;
      assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
      assert_eq!(body["error"]["kind"], "validation", "{uri}");
    }
  }

  // ── Author writes ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn writes_require_identity() {
    let (app, _) = setup().await;
    let (status, _, body) = send(
      &app,
      "POST",
      "/posts",
      None,
      vec![],
      Some(json!({ "title": "T", "body": "B" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["kind"], "authorization");
  }

  #[tokio::test]
  async fn create_validates_input() {
    let (app, _) = setup().await;
    let (status, _, body) = send(
      &app,
      "POST",
      "/posts",
      Some(author()),
      vec![],
      Some(json!({ "body": "no title" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation");
  }

  #[tokio::test]
  async fn mistyped_bodies_are_validation_errors() {
    let (app, store) = setup().await;
    let writer = author();
    let post = store
      .create_post(writer, NewPost::new("Typed", "B"))
      .await
      .unwrap();
    let uri = format!("/posts/{}", post.post_id);

    let cases = [
      ("PATCH", uri.as_str(), writer, json!({ "title": 5 })),
      ("POST", "/posts", writer, json!(["not", "an", "object"])),
      ("POST", "/admin/posts/bulk-publish", admin(), json!({ "ids": "x" })),
    ];
    for (method, uri, actor, payload) in cases {
      let (status, _, body) =
        send(&app, method, uri, Some(actor), vec![], Some(payload)).await;
      assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
      assert_eq!(body["error"]["kind"], "validation", "{method} {uri}");
      assert!(body["error"]["message"].is_string());
    }

    let stored = store.get_post(post.post_id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Typed");
  }

  #[tokio::test]
  async fn null_clears_optional_fields() {
    let (app, store) = setup().await;
    let writer = author();
    let mut input = NewPost::new("Teaser", "B");
    input.excerpt = Some("short".into());
    let post = store.create_post(writer, input).await.unwrap();
    let uri = format!("/posts/{}", post.post_id);

    let (_, _, kept) = send(
      &app,
      "PATCH",
      &uri,
      Some(writer),
      vec![],
      Some(json!({ "body": "B2" })),
    )
    .await;
    assert_eq!(kept["excerpt"], "short");

    let (status, _, cleared) = send(
      &app,
      "PATCH",
      &uri,
      Some(writer),
      vec![],
      Some(json!({ "excerpt": null, "feature_image": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["excerpt"].is_null());
    assert!(cleared["feature_image"].is_null());
  }

  #[tokio::test]
  async fn author_publish_goes_through_review() {
    let (app, _) = setup().await;
    let writer = author();

    let (status, _, created) = send(
      &app,
      "POST",
      "/posts",
      Some(writer),
      vec![],
      Some(json!({ "title": "Review me", "body": "B", "publish": true })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "draft");
    let id = created["post_id"].as_str().unwrap().to_owned();

    let uri = format!("/posts/{id}/publish");
    let (status, _, post) =
      send(&app, "POST", &uri, Some(writer), vec![], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["status"], "pending");

    let (status, _, body) =
      send(&app, "POST", &uri, Some(writer), vec![], None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["kind"], "conflict");

    let (status, _, post) =
      send(&app, "POST", &uri, Some(admin()), vec![], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["status"], "published");
    assert!(post["published_at"].is_string());
  }

  #[tokio::test]
  async fn stale_if_match_is_rejected() {
    let (app, store) = setup().await;
    let writer = author();
    let post = store
      .create_post(writer, NewPost::new("T", "v1"))
      .await
      .unwrap();
    let uri = format!("/posts/{}", post.post_id);

    let (_, headers, _) =
      send(&app, "GET", &uri, Some(writer), vec![], None).await;
    let etag = headers[header::ETAG].to_str().unwrap().to_owned();

    let (status, headers, body) = send(
      &app,
      "PATCH",
      &uri,
      Some(writer),
      vec![(header::IF_MATCH, etag.clone())],
      Some(json!({ "body": "v2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"], "v2");
    assert_ne!(headers[header::ETAG].to_str().unwrap(), etag);

    let (status, _, _) = send(
      &app,
      "PATCH",
      &uri,
      Some(writer),
      vec![(header::IF_MATCH, etag)],
      Some(json!({ "body": "v3" })),
    )
    .await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);

    let stored = store.get_post(post.post_id).await.unwrap().unwrap();
    assert_eq!(stored.body, "v2");
  }

  #[tokio::test]
  async fn strangers_cannot_edit() {
    let (app, store) = setup().await;
    let post = store
      .create_post(author(), NewPost::new("T", "B"))
      .await
      .unwrap();
    let (status, _, body) = send(
      &app,
      "PATCH",
      &format!("/posts/{}", post.post_id),
      Some(author()),
      vec![],
      Some(json!({ "body": "mine now" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["kind"], "authorization");
  }

  #[tokio::test]
  async fn double_delete_conflicts() {
    let (app, store) = setup().await;
    let writer = author();
    let post = store
      .create_post(writer, NewPost::new("T", "B"))
      .await
      .unwrap();
    let uri = format!("/posts/{}", post.post_id);

    let (status, _, _) =
      send(&app, "DELETE", &uri, Some(writer), vec![], None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _, _) =
      send(&app, "DELETE", &uri, Some(writer), vec![], None).await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  // ── Revisions ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn revision_history_and_restore() {
    let (app, store) = setup().await;
    let writer = author();
    let post = store
      .create_post(writer, NewPost::new("T", "first"))
      .await
      .unwrap();
    let uri = format!("/posts/{}", post.post_id);
    send(
      &app,
      "PATCH",
      &uri,
      Some(writer),
      vec![],
      Some(json!({ "body": "second", "note": "rewrite" })),
    )
    .await;

    let (status, _, history) = send(
      &app,
      "GET",
      &format!("{uri}/revisions"),
      Some(writer),
      vec![],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["total"], 1);
    assert_eq!(history["items"][0]["content"], "first");
    assert_eq!(history["items"][0]["note"], "rewrite");
    let revision_id = history["items"][0]["revision_id"].as_str().unwrap();

    let (status, _, restored) = send(
      &app,
      "POST",
      &format!("{uri}/revisions/{revision_id}/restore"),
      Some(writer),
      vec![],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(restored["body"], "first");

    let (status, _, _) = send(
      &app,
      "GET",
      &format!("{uri}/revisions"),
      Some(author()),
      vec![],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  // ── Comments ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn comments_are_moderated() {
    let (app, store) = setup().await;
    let mut input = NewPost::new("Discuss", "B");
    input.publish = true;
    let post = store.create_post(admin(), input).await.unwrap();
    let uri = format!("/posts/{}/comments", post.post_id);

    let (status, _, comment) = send(
      &app,
      "POST",
      &uri,
      Some(author()),
      vec![],
      Some(json!({ "body": "great post" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["status"], "pending");

    let (_, _, visible) = send(&app, "GET", &uri, None, vec![], None).await;
    assert!(visible.as_array().unwrap().is_empty());

    let (status, _, _) = send(
      &app,
      "PUT",
      &format!("/admin/comments/{}/status", comment["comment_id"].as_str().unwrap()),
      Some(admin()),
      vec![],
      Some(json!({ "status": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, visible) = send(&app, "GET", &uri, None, vec![], None).await;
    assert_eq!(visible.as_array().unwrap().len(), 1);
    let stored = store.get_post(post.post_id).await.unwrap().unwrap();
    assert_eq!(stored.comment_count, 1);
  }

  // ── Admin ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn admin_routes_reject_authors() {
    let (app, _) = setup().await;
    for (method, uri) in [("GET", "/admin/posts"), ("GET", "/admin/stats")] {
      let (status, _, _) =
        send(&app, method, uri, Some(author()), vec![], None).await;
      assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
    }
  }

  #[tokio::test]
  async fn bulk_publish_skips_bad_ids() {
    let (app, store) = setup().await;
    let a = store
      .create_post(author(), NewPost::new("A", "B"))
      .await
      .unwrap();
    let b = store
      .create_post(author(), NewPost::new("B", "B"))
      .await
      .unwrap();

    let (status, _, outcome) = send(
      &app,
      "POST",
      "/admin/posts/bulk-publish",
      Some(admin()),
      vec![],
      Some(json!({
        "ids": [
          42,
          a.post_id.to_string(),
          null,
          b.post_id.to_string(),
          "junk",
          Uuid::new_v4().to_string(),
          { "id": a.post_id.to_string() },
        ],
      })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome, json!({ "matched": 2, "modified": 2 }));

    let (_, _, page) = send(&app, "GET", "/posts", None, vec![], None).await;
    assert_eq!(page["total"], 2);
  }

  #[tokio::test]
  async fn delete_restore_and_purge() {
    let (app, store) = setup().await;
    let boss = admin();
    let mut input = NewPost::new("Lifecycle", "B");
    input.publish = true;
    let post = store.create_post(boss, input).await.unwrap();
    let uri = format!("/admin/posts/{}", post.post_id);

    let (status, _, _) =
      send(&app, "DELETE", &uri, Some(boss), vec![], None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, _, deleted) = send(
      &app,
      "GET",
      "/admin/posts?deleted=only",
      Some(boss),
      vec![],
      None,
    )
    .await;
    assert_eq!(deleted["total"], 1);

    let (status, _, restored) = send(
      &app,
      "POST",
      &format!("{uri}/restore"),
      Some(boss),
      vec![],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(restored["status"], "published");

    let (status, _, _) = send(
      &app,
      "DELETE",
      &format!("{uri}/permanent"),
      Some(boss),
      vec![],
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) =
      send(&app, "GET", &uri, Some(boss), vec![], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn stats_and_comment_count_hook() {
    let (app, store) = setup().await;
    let boss = admin();
    let post = store
      .create_post(author(), NewPost::new("T", "B"))
      .await
      .unwrap();

    let (status, _, body) = send(
      &app,
      "POST",
      &format!("/admin/posts/{}/comment-count", post.post_id),
      Some(boss),
      vec![],
      Some(json!({ "delta": -3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["comment_count"], 0);

    let (status, _, stats) =
      send(&app, "GET", "/admin/stats", Some(boss), vec![], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["draft"], 1);
    assert_eq!(
      store.get_post(post.post_id).await.unwrap().unwrap().status,
      PostStatus::Draft
    );
  }
}
