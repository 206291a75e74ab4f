//! Error types for `folio-core`.

use serde::Serialize;
use strum::{AsRefStr, Display};
use thiserror::Error;
use uuid::Uuid;

use crate::{lifecycle::Action, post::PostStatus};

/// The stable, machine-readable category of a failure.
///
/// Every error surfaced by a store or the API maps onto exactly one kind.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
  Validation,
  NotFound,
  Authorization,
  Conflict,
  Dependency,
}

/// Errors that can be classified into an [`ErrorKind`].
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  Validation(String),

  #[error("malformed id: {0:?}")]
  MalformedId(String),

  #[error("post not found: {0}")]
  PostNotFound(Uuid),

  #[error("revision not found: {0}")]
  RevisionNotFound(Uuid),

  #[error("comment not found: {0}")]
  CommentNotFound(Uuid),

  #[error("forbidden: {0}")]
  Forbidden(&'static str),

  #[error("cannot {action} a post that is {from}")]
  IllegalTransition { from: PostStatus, action: Action },

  #[error("post {0} is already deleted")]
  AlreadyDeleted(Uuid),

  #[error("post {0} is not deleted")]
  NotDeleted(Uuid),

  #[error("post {0} is deleted")]
  PostDeleted(Uuid),

  #[error("post {post_id} is at version {actual}, expected {expected}")]
  VersionMismatch {
    post_id:  Uuid,
    expected: i64,
    actual:   i64,
  },

  #[error("post {0} was modified concurrently")]
  ConcurrentModification(Uuid),

  #[error("could not allocate a unique slug for {0:?}")]
  SlugExhausted(String),
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) | Self::MalformedId(_) => ErrorKind::Validation,
      Self::PostNotFound(_)
      | Self::RevisionNotFound(_)
      | Self::CommentNotFound(_) => ErrorKind::NotFound,
      Self::Forbidden(_) => ErrorKind::Authorization,
      Self::IllegalTransition { .. }
      | Self::AlreadyDeleted(_)
      | Self::NotDeleted(_)
      | Self::PostDeleted(_)
      | Self::VersionMismatch { .. }
      | Self::ConcurrentModification(_)
      | Self::SlugExhausted(_) => ErrorKind::Conflict,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Parse a caller-supplied id, reporting a validation failure on garbage.
pub fn parse_id(raw: &str) -> Result<Uuid> {
  Uuid::parse_str(raw.trim()).map_err(|_| Error::MalformedId(raw.to_owned()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kinds_render_snake_case() {
    assert_eq!(ErrorKind::NotFound.as_ref(), "not_found");
    assert_eq!(
      serde_json::to_string(&ErrorKind::Authorization).unwrap(),
      "\"authorization\""
    );
  }

  #[test]
  fn lifecycle_failures_are_conflicts() {
    let id = Uuid::new_v4();
    assert_eq!(Error::AlreadyDeleted(id).kind(), ErrorKind::Conflict);
    assert_eq!(Error::NotDeleted(id).kind(), ErrorKind::Conflict);
    assert_eq!(
      Error::SlugExhausted("x".into()).kind(),
      ErrorKind::Conflict
    );
  }

  #[test]
  fn parse_id_rejects_garbage() {
    assert!(matches!(parse_id("not-a-uuid"), Err(Error::MalformedId(_))));
    let id = Uuid::new_v4();
    assert_eq!(parse_id(&id.to_string()).unwrap(), id);
  }
}
