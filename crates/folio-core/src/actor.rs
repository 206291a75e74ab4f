//! Actor: the already-authenticated identity performing an operation.
//!
//! Credential verification happens upstream; the engine only sees the
//! resolved `{id, role}` pair and enforces ownership and role checks.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// The role claim attached to an identity.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
  /// Author-tier: may manage their own posts and request publication.
  Author,
  /// May act on any post and bypass the publish-request step.
  Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub id:   Uuid,
  pub role: Role,
}

impl Actor {
  pub fn new(id: Uuid, role: Role) -> Self { Self { id, role } }

  pub fn author(id: Uuid) -> Self { Self::new(id, Role::Author) }

  pub fn admin(id: Uuid) -> Self { Self::new(id, Role::Admin) }

  pub fn is_admin(&self) -> bool { self.role == Role::Admin }

  /// Owners and administrators may modify a post.
  pub fn can_manage(&self, author_id: Uuid) -> bool {
    self.is_admin() || self.id == author_id
  }
}
