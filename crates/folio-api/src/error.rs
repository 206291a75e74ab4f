//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body has the shape `{"error": {"kind": ..., "message": ...}}`
//! where `kind` is one of the [`ErrorKind`] names.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use folio_core::{Classify, ErrorKind};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No usable identity on a route that needs one.
  #[error("unauthenticated: {0}")]
  Unauthenticated(&'static str),

  #[error("forbidden: {0}")]
  Forbidden(&'static str),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  BadRequest(String),

  /// The `If-Match` tag no longer names the stored post.
  #[error("post has changed since it was read")]
  PreconditionFailed,

  #[error("{source}")]
  Store {
    kind:   ErrorKind,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  /// Wrap a store (or core) error, keeping its classification.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    Self::Store {
      kind:   e.kind(),
      source: Box::new(e),
    }
  }

  pub fn not_found(id: impl std::fmt::Display) -> Self {
    Self::NotFound(format!("post not found: {id}"))
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Unauthenticated(_) | Self::Forbidden(_) => ErrorKind::Authorization,
      Self::NotFound(_) => ErrorKind::NotFound,
      Self::BadRequest(_) => ErrorKind::Validation,
      Self::PreconditionFailed => ErrorKind::Conflict,
      Self::Store { kind, .. } => *kind,
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
      Self::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
      _ => match self.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Dependency => StatusCode::SERVICE_UNAVAILABLE,
      },
    }
  }
}

impl From<folio_core::Error> for ApiError {
  fn from(e: folio_core::Error) -> Self { Self::store(e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let kind = self.kind();
    let message = match kind {
      ErrorKind::Dependency => {
        tracing::error!(error = %self, "storage dependency failed");
        "a storage dependency is unavailable".to_owned()
      }
      _ => self.to_string(),
    };
    let body = json!({ "error": { "kind": kind, "message": message } });
    (self.status(), Json(body)).into_response()
  }
}
