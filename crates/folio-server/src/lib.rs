//! HTTP server assembly for Folio.
//!
//! Mounts the JSON API from `folio-api` under `/api` and wraps it in request
//! tracing. The binary in `main.rs` owns configuration and the store.

pub mod settings;

pub use settings::ServerConfig;

use std::sync::Arc;

use axum::Router;
use folio_core::store::ContentStore;
use tower_http::trace::TraceLayer;

/// Build the complete application router for `store`.
pub fn app<S>(store: Arc<S>) -> Router
where
  S: ContentStore + 'static,
{
  Router::new()
    .nest("/api", folio_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use folio_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let app = app(store);

    let resp = app
      .clone()
      .oneshot(Request::get("/api/posts").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
      .oneshot(Request::get("/posts").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
