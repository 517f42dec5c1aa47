//! Who may do what to which declaration.
//!
//! [`can`] looks only at the actor's role, tenant and authorship. [`authorize`]
//! runs it first and then the status guard, so a wrong-tenant actor always
//! sees [`Error::Unauthorized`] and a right-tenant actor attempting an illegal
//! move sees [`Error::InvalidTransition`].

use serde::Serialize;
use strum::{Display, EnumIter};

use crate::{Error, Result, actor::Actor, declaration::Declaration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
  Create,
  View,
  Update,
  Delete,
  Submit,
  Validate,
  Reject,
  Download,
  PreviewDocument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Allow,
  Deny,
}

impl Decision {
  pub fn is_allowed(self) -> bool { matches!(self, Self::Allow) }

  /// [`Error::Unauthorized`] on `Deny`.
  pub fn require(self) -> Result<()> {
    match self {
      Self::Allow => Ok(()),
      Self::Deny => Err(Error::Unauthorized),
    }
  }
}

impl From<bool> for Decision {
  fn from(allowed: bool) -> Self {
    if allowed { Self::Allow } else { Self::Deny }
  }
}

/// Whether `actor` may start a new declaration.
pub fn can_create(actor: &Actor) -> Decision {
  matches!(actor, Actor::HopitalAgent { .. }).into()
}

/// Role/tenant decision for `action` on an existing declaration.
pub fn can(actor: &Actor, action: Action, declaration: &Declaration) -> Decision {
  use Action::*;
  match *actor {
    Actor::Admin { .. } => Decision::Deny,

    Actor::HopitalAgent { id, hopital_id } => {
      let own_hospital = declaration.hopital_id == hopital_id;
      let authored = own_hospital && declaration.agent_hopital_id == id;
      match action {
        Create => Decision::Allow,
        View | Download | PreviewDocument | Update => own_hospital.into(),
        Submit | Delete => authored.into(),
        Validate | Reject => Decision::Deny,
      }
    }

    Actor::MairieAgent { mairie_id, .. } => {
      let own_mairie = declaration.mairie_id == mairie_id;
      match action {
        View | Download | PreviewDocument | Validate | Reject => own_mairie.into(),
        Create | Update | Delete | Submit => Decision::Deny,
      }
    }
  }
}

/// Policy first, then the status guard of the declaration's lifecycle.
pub fn authorize(actor: &Actor, action: Action, declaration: &Declaration) -> Result<()> {
  can(actor, action, declaration).require()?;
  declaration.status.permits(action)
}
