//! The lifecycle state machine.
//!
//! | From | Action | Actor | Result |
//! |------|--------|-------|--------|
//! | draft | publish | admin | published, `published_at` set if unset |
//! | draft | publish | author | pending |
//! | pending | publish | admin | published, `published_at` set if unset |
//! | published | publish | any | unchanged |
//! | published / pending | unpublish | any | draft |
//! | not deleted | delete | any | deleted, archived |
//! | deleted | restore | admin | published if ever published, else draft |
//!
//! "Any" means the owning author or an administrator. Transitions are pure:
//! callers persist the returned [`Lifecycle`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::{
  Error, Result,
  actor::{Actor, Role},
  post::{Post, PostStatus},
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Action {
  Publish,
  Unpublish,
  Delete,
  Restore,
}

/// The lifecycle-relevant slice of a post: `(status, deleted)` plus the
/// "ever published" marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
  pub status:       PostStatus,
  pub is_deleted:   bool,
  pub published_at: Option<DateTime<Utc>>,
}

impl Lifecycle {
  pub fn of(post: &Post) -> Self {
    Self {
      status:       post.status,
      is_deleted:   post.is_deleted,
      published_at: post.published_at,
    }
  }

  pub fn apply_to(self, post: &mut Post) {
    post.status = self.status;
    post.is_deleted = self.is_deleted;
    post.published_at = self.published_at;
  }

  fn with_status(self, status: PostStatus) -> Self { Self { status, ..self } }
}

/// Compute the result of `actor` performing `action` on `post`.
pub fn transition(
  post: &Post,
  action: Action,
  actor: &Actor,
  now: DateTime<Utc>,
) -> Result<Lifecycle> {
  if action == Action::Restore && !actor.is_admin() {
    return Err(Error::Forbidden("only administrators may restore posts"));
  }
  if !actor.can_manage(post.author_id) {
    return Err(Error::Forbidden(
      "only the author or an administrator may change this post",
    ));
  }

  let current = Lifecycle::of(post);

  if post.is_deleted {
    return match action {
      Action::Restore => {
        let status = if current.published_at.is_some() {
          PostStatus::Published
        } else {
          PostStatus::Draft
        };
        Ok(Lifecycle { status, is_deleted: false, ..current })
      }
      Action::Delete => Err(Error::AlreadyDeleted(post.post_id)),
      Action::Publish | Action::Unpublish => {
        Err(Error::PostDeleted(post.post_id))
      }
    };
  }

  match action {
    Action::Restore => Err(Error::NotDeleted(post.post_id)),
    Action::Delete => Ok(Lifecycle {
      status: PostStatus::Archived,
      is_deleted: true,
      ..current
    }),
    Action::Publish => match (post.status, actor.role) {
      (PostStatus::Published, _) => Ok(current),
      (PostStatus::Draft | PostStatus::Pending, Role::Admin) => {
        Ok(Lifecycle {
          status:       PostStatus::Published,
          published_at: Some(current.published_at.unwrap_or(now)),
          ..current
        })
      }
      (PostStatus::Draft, Role::Author) => {
        Ok(current.with_status(PostStatus::Pending))
      }
      (from, _) => Err(Error::IllegalTransition { from, action }),
    },
    Action::Unpublish => match post.status {
      PostStatus::Published | PostStatus::Pending => {
        Ok(current.with_status(PostStatus::Draft))
      }
      from => Err(Error::IllegalTransition { from, action }),
    },
  }
}

/// Route a directly requested status through [`transition`].
///
/// `published` and `pending` map to publish, `draft` to unpublish. An author
/// asking for `published` gets a publish request (`pending`); any other
/// mismatch between the requested and resulting status is rejected.
pub fn request_status(
  post: &Post,
  target: PostStatus,
  actor: &Actor,
  now: DateTime<Utc>,
) -> Result<Lifecycle> {
  if post.is_deleted {
    return Err(Error::PostDeleted(post.post_id));
  }
  if target == post.status {
    return Ok(Lifecycle::of(post));
  }

  let action = match target {
    PostStatus::Published | PostStatus::Pending => Action::Publish,
    PostStatus::Draft => Action::Unpublish,
    PostStatus::Archived => {
      return Err(Error::Validation(
        "posts are archived by deleting them".into(),
      ));
    }
  };

  let next = transition(post, action, actor, now)?;
  let accepted = next.status == target
    || (target == PostStatus::Published && next.status == PostStatus::Pending);
  if !accepted {
    return Err(Error::IllegalTransition { from: post.status, action });
  }
  Ok(next)
}

#[cfg(test)]
mod tests {
  use chrono::Duration;
  use uuid::Uuid;

  use super::*;
  use crate::post::test_support::post;

  fn run(p: &Post, action: Action, actor: &Actor) -> Result<Lifecycle> {
    transition(p, action, actor, Utc::now())
  }

  #[test]
  fn author_publish_becomes_request() {
    let owner = Uuid::new_v4();
    let p = post(owner, PostStatus::Draft);
    let next = run(&p, Action::Publish, &Actor::author(owner)).unwrap();
    assert_eq!(next.status, PostStatus::Pending);
    assert!(next.published_at.is_none());
  }

  #[test]
  fn admin_publish_sets_published_at_once() {
    let p = post(Uuid::new_v4(), PostStatus::Draft);
    let admin = Actor::admin(Uuid::new_v4());
    let now = Utc::now();

    let first = transition(&p, Action::Publish, &admin, now).unwrap();
    assert_eq!(first.status, PostStatus::Published);
    assert_eq!(first.published_at, Some(now));

    let mut p = p;
    first.apply_to(&mut p);
    let again =
      transition(&p, Action::Publish, &admin, now + Duration::hours(1))
        .unwrap();
    assert_eq!(again.published_at, Some(now));

    let unpublished = run(&p, Action::Unpublish, &admin).unwrap();
    assert_eq!(unpublished.status, PostStatus::Draft);
    assert_eq!(unpublished.published_at, Some(now));
  }

  #[test]
  fn admin_approves_pending() {
    let p = post(Uuid::new_v4(), PostStatus::Pending);
    let next = run(&p, Action::Publish, &Actor::admin(Uuid::new_v4())).unwrap();
    assert_eq!(next.status, PostStatus::Published);
    assert!(next.published_at.is_some());
  }

  #[test]
  fn repeated_author_request_conflicts() {
    let owner = Uuid::new_v4();
    let p = post(owner, PostStatus::Pending);
    let err = run(&p, Action::Publish, &Actor::author(owner)).unwrap_err();
    assert!(matches!(err, Error::IllegalTransition {
      from:   PostStatus::Pending,
      action: Action::Publish,
    }));
  }

  #[test]
  fn stranger_is_forbidden() {
    let p = post(Uuid::new_v4(), PostStatus::Draft);
    let err = run(&p, Action::Delete, &Actor::author(Uuid::new_v4()))
      .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
  }

  #[test]
  fn delete_and_restore() {
    let owner = Uuid::new_v4();
    let admin = Actor::admin(Uuid::new_v4());
    let mut p = post(owner, PostStatus::Published);

    run(&p, Action::Delete, &Actor::author(owner))
      .unwrap()
      .apply_to(&mut p);
    assert!(p.is_deleted);
    assert_eq!(p.status, PostStatus::Archived);

    let again = run(&p, Action::Delete, &Actor::author(owner)).unwrap_err();
    assert!(matches!(again, Error::AlreadyDeleted(_)));

    let by_author = run(&p, Action::Restore, &Actor::author(owner));
    assert!(matches!(by_author, Err(Error::Forbidden(_))));

    run(&p, Action::Restore, &admin).unwrap().apply_to(&mut p);
    assert!(!p.is_deleted);
    assert_eq!(p.status, PostStatus::Published);

    let not_deleted = run(&p, Action::Restore, &admin).unwrap_err();
    assert!(matches!(not_deleted, Error::NotDeleted(_)));
  }

  #[test]
  fn restore_of_never_published_lands_in_draft() {
    let owner = Uuid::new_v4();
    let mut p = post(owner, PostStatus::Pending);
    run(&p, Action::Delete, &Actor::author(owner))
      .unwrap()
      .apply_to(&mut p);
    let next = run(&p, Action::Restore, &Actor::admin(owner)).unwrap();
    assert_eq!(next.status, PostStatus::Draft);
  }

  #[test]
  fn restore_uses_ever_published_marker() {
    // Published, then unpublished, then deleted: still restores to published.
    let owner = Uuid::new_v4();
    let mut p = post(owner, PostStatus::Draft);
    p.published_at = Some(Utc::now());
    run(&p, Action::Delete, &Actor::author(owner))
      .unwrap()
      .apply_to(&mut p);
    let next = run(&p, Action::Restore, &Actor::admin(owner)).unwrap();
    assert_eq!(next.status, PostStatus::Published);
  }

  #[test]
  fn status_requests() {
    let owner = Uuid::new_v4();
    let author = Actor::author(owner);
    let admin = Actor::admin(Uuid::new_v4());
    let now = Utc::now();
    let draft = post(owner, PostStatus::Draft);

    let requested =
      request_status(&draft, PostStatus::Published, &author, now).unwrap();
    assert_eq!(requested.status, PostStatus::Pending);

    let pending_by_admin =
      request_status(&draft, PostStatus::Pending, &admin, now);
    assert!(matches!(
      pending_by_admin,
      Err(Error::IllegalTransition { .. })
    ));

    let archived = request_status(&draft, PostStatus::Archived, &admin, now);
    assert!(matches!(archived, Err(Error::Validation(_))));

    let same = request_status(&draft, PostStatus::Draft, &author, now).unwrap();
    assert_eq!(same, Lifecycle::of(&draft));
  }
}
