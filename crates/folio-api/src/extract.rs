//! Request extractors whose rejections render as [`ApiError`].
//!
//! axum's own `Json` and `Query` answer malformed input with a plain-text
//! body. These wrappers route the rejection through [`ApiError::BadRequest`]
//! so every failure carries the structured `validation` kind.

use axum::extract::{
  FromRequest, FromRequestParts,
  rejection::{JsonRejection, QueryRejection},
};

use crate::error::ApiError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Deserialized query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    Self::BadRequest(rejection.body_text())
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    Self::BadRequest(rejection.body_text())
  }
}
