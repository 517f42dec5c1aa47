//! The declaration status machine.
//!
//! ```text
//! brouillon ──submit──▶ envoyee ──validate──▶ validee (terminal)
//!                          │  ▲
//!                   reject │  │ submit
//!                          ▼  │
//!                        rejetee
//! ```
//!
//! Content edits and deletion are only permitted in the editable states
//! (`brouillon`, `rejetee`) and never change the status themselves.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{Error, Result, policy::Action};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
  /// Draft; freely editable by the authoring hospital.
  #[default]
  Brouillon,
  /// Submitted to the mairie and awaiting a decision.
  Envoyee,
  /// Approved by the mairie.
  Validee,
  /// Rejected by the mairie; editable and resubmittable.
  Rejetee,
}

impl Status {
  /// States in which content may be edited and the declaration deleted.
  pub const EDITABLE: [Status; 2] = [Status::Brouillon, Status::Rejetee];

  pub fn is_editable(self) -> bool { Self::EDITABLE.contains(&self) }

  pub fn is_terminal(self) -> bool { matches!(self, Self::Validee) }

  pub fn as_str(self) -> &'static str { self.into() }

  /// The status reached by applying `transition`, or
  /// [`Error::InvalidTransition`] when no such edge exists.
  pub fn apply(self, transition: Transition) -> Result<Status> {
    use Status::*;
    use Transition::*;
    match (self, transition) {
      (Brouillon | Rejetee, Submit) => Ok(Envoyee),
      (Envoyee, Validate) => Ok(Validee),
      (Envoyee, Reject) => Ok(Rejetee),
      (status, t) => Err(Error::InvalidTransition {
        status,
        action: t.action(),
      }),
    }
  }

  /// Status guard for `action`, evaluated after the policy has allowed it.
  pub fn permits(self, action: Action) -> Result<()> {
    let blocked = || Error::InvalidTransition {
      status: self,
      action,
    };
    match action {
      Action::Create
      | Action::View
      | Action::Download
      | Action::PreviewDocument => Ok(()),
      Action::Update | Action::Delete => {
        if self.is_editable() {
          Ok(())
        } else {
          Err(blocked())
        }
      }
      Action::Submit => self.apply(Transition::Submit).map(|_| ()),
      Action::Validate => self.apply(Transition::Validate).map(|_| ()),
      Action::Reject => self.apply(Transition::Reject).map(|_| ()),
    }
  }
}

// ─── Transition ──────────────────────────────────────────────────────────────

/// An explicit status-changing action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Transition {
  /// Hospital author sends a draft (or a rejected declaration) to the mairie.
  Submit,
  Validate,
  Reject,
}

impl Transition {
  pub fn action(self) -> Action {
    match self {
      Self::Submit => Action::Submit,
      Self::Validate => Action::Validate,
      Self::Reject => Action::Reject,
    }
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn submit_from_draft_and_rejected() {
    assert_eq!(Status::Brouillon.apply(Transition::Submit).unwrap(), Status::Envoyee);
    assert_eq!(Status::Rejetee.apply(Transition::Submit).unwrap(), Status::Envoyee);
  }

  #[test]
  fn double_submission_is_rejected() {
    let err = Status::Envoyee.apply(Transition::Submit).unwrap_err();
    assert!(matches!(
      err,
      Error::InvalidTransition { status: Status::Envoyee, action: Action::Submit }
    ));
  }

  #[test]
  fn mairie_decisions_only_from_envoyee() {
    assert_eq!(Status::Envoyee.apply(Transition::Validate).unwrap(), Status::Validee);
    assert_eq!(Status::Envoyee.apply(Transition::Reject).unwrap(), Status::Rejetee);
    for status in [Status::Brouillon, Status::Validee, Status::Rejetee] {
      assert!(status.apply(Transition::Validate).is_err());
      assert!(status.apply(Transition::Reject).is_err());
    }
  }

  #[test]
  fn validee_is_terminal() {
    assert!(Status::Validee.is_terminal());
    for t in Transition::iter() {
      assert!(Status::Validee.apply(t).is_err(), "{t:?} left validee");
    }
  }

  #[test]
  fn edits_blocked_once_sent() {
    for status in Status::iter() {
      let update = status.permits(Action::Update);
      let delete = status.permits(Action::Delete);
      assert_eq!(update.is_ok(), status.is_editable());
      assert_eq!(delete.is_ok(), status.is_editable());
    }
    assert!(!Status::Envoyee.is_editable());
    assert!(!Status::Validee.is_editable());
  }

  #[test]
  fn reads_never_blocked() {
    for status in Status::iter() {
      assert!(status.permits(Action::View).is_ok());
      assert!(status.permits(Action::Download).is_ok());
    }
  }

  #[test]
  fn status_string_roundtrip() {
    assert_eq!(Status::Envoyee.to_string(), "envoyee");
    assert_eq!("rejetee".parse::<Status>().unwrap(), Status::Rejetee);
    assert!("sent".parse::<Status>().is_err());
  }
}
