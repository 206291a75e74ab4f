//! Identity extractors.
//!
//! Credentials are verified upstream (a gateway or auth proxy); by the time a
//! request reaches this router it carries the resolved identity in two
//! trusted headers. A missing role header means author tier.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use folio_core::actor::{Actor, Role};
use uuid::Uuid;

use crate::error::ApiError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// The caller's identity. Rejects with 401 when absent.
pub struct Identity(pub Actor);

/// The caller's identity if one was supplied. Malformed headers still reject.
pub struct MaybeIdentity(pub Option<Actor>);

impl Identity {
  /// Reject with 403 unless the caller is an administrator.
  pub fn require_admin(&self) -> Result<Actor, ApiError> {
    if self.0.is_admin() {
      Ok(self.0)
    } else {
      Err(ApiError::Forbidden("administrator role required"))
    }
  }
}

pub fn resolve(headers: &HeaderMap) -> Result<Option<Actor>, ApiError> {
  let Some(raw_id) = headers.get(ACTOR_ID_HEADER) else {
    return Ok(None);
  };
  let id = raw_id
    .to_str()
    .ok()
    .and_then(|s| Uuid::parse_str(s.trim()).ok())
    .ok_or(ApiError::Unauthenticated("malformed actor id"))?;

  let role = match headers.get(ACTOR_ROLE_HEADER) {
    None => Role::Author,
    Some(v) => v
      .to_str()
      .ok()
      .and_then(|s| s.trim().parse::<Role>().ok())
      .ok_or(ApiError::Unauthenticated("unknown actor role"))?,
  };

  Ok(Some(Actor::new(id, role)))
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    resolve(&parts.headers)?
      .map(Identity)
      .ok_or(ApiError::Unauthenticated("missing actor identity"))
  }
}

impl<S: Send + Sync> FromRequestParts<S> for MaybeIdentity {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    Ok(MaybeIdentity(resolve(&parts.headers)?))
  }
}
