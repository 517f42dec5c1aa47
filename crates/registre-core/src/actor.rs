//! Actors: the users on whose behalf every registry action runs.
//!
//! The stored [`ActorRecord`] keeps the role and affiliation as loose columns;
//! [`Actor`] is the checked form handed to the policy, with the affiliation id
//! carried by the variant itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, ValidationErrors};

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
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  Mairie,
  Hopital,
}

/// An authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Actor {
  /// Manages mairies, hospitals and users; no declaration-level rights.
  Admin { id: Uuid },
  MairieAgent { id: Uuid, mairie_id: Uuid },
  HopitalAgent { id: Uuid, hopital_id: Uuid },
}

impl Actor {
  pub fn id(&self) -> Uuid {
    match *self {
      Self::Admin { id }
      | Self::MairieAgent { id, .. }
      | Self::HopitalAgent { id, .. } => id,
    }
  }

  pub fn role(&self) -> Role {
    match self {
      Self::Admin { .. } => Role::Admin,
      Self::MairieAgent { .. } => Role::Mairie,
      Self::HopitalAgent { .. } => Role::Hopital,
    }
  }

  pub fn mairie_id(&self) -> Option<Uuid> {
    match *self {
      Self::MairieAgent { mairie_id, .. } => Some(mairie_id),
      _ => None,
    }
  }

  pub fn hopital_id(&self) -> Option<Uuid> {
    match *self {
      Self::HopitalAgent { hopital_id, .. } => Some(hopital_id),
      _ => None,
    }
  }

  pub fn is_admin(&self) -> bool { matches!(self, Self::Admin { .. }) }
}

// ─── Stored form ─────────────────────────────────────────────────────────────

/// A user row as persisted by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorRecord {
  pub actor_id:      Uuid,
  pub name:          String,
  pub email:         String,
  pub role:          Role,
  pub mairie_id:     Option<Uuid>,
  pub hopital_id:    Option<Uuid>,
  /// PHC string produced by argon2; never serialised outward.
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

impl ActorRecord {
  /// The checked [`Actor`] for this record.
  pub fn actor(&self) -> Result<Actor> {
    check_affiliation(self.role, self.mairie_id, self.hopital_id)
      .into_result()?;
    let id = self.actor_id;
    Ok(match self.role {
      Role::Admin => Actor::Admin { id },
      // Presence checked above.
      Role::Mairie => Actor::MairieAgent {
        id,
        mairie_id: self.mairie_id.ok_or(Error::Unauthorized)?,
      },
      Role::Hopital => Actor::HopitalAgent {
        id,
        hopital_id: self.hopital_id.ok_or(Error::Unauthorized)?,
      },
    })
  }
}

/// Input to [`crate::store::RegistryStore::add_actor`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewActor {
  pub name:          String,
  pub email:         String,
  pub role:          Role,
  pub mairie_id:     Option<Uuid>,
  pub hopital_id:    Option<Uuid>,
  pub password_hash: String,
}

impl NewActor {
  pub fn validate(&self) -> ValidationErrors {
    let mut errors = check_affiliation(self.role, self.mairie_id, self.hopital_id);
    if self.name.trim().is_empty() {
      errors.push("name", "required");
    }
    if !looks_like_email(&self.email) {
      errors.push("email", "must be an email address");
    }
    if self.password_hash.is_empty() {
      errors.push("password_hash", "required");
    }
    errors
  }
}

/// A mairie agent carries only a mairie, a hospital agent only a hospital,
/// an admin neither.
fn check_affiliation(
  role: Role,
  mairie_id: Option<Uuid>,
  hopital_id: Option<Uuid>,
) -> ValidationErrors {
  let mut errors = ValidationErrors::new();
  match role {
    Role::Admin => {
      if mairie_id.is_some() {
        errors.push("mairie_id", "admins are not affiliated");
      }
      if hopital_id.is_some() {
        errors.push("hopital_id", "admins are not affiliated");
      }
    }
    Role::Mairie => {
      if mairie_id.is_none() {
        errors.push("mairie_id", "required for mairie agents");
      }
      if hopital_id.is_some() {
        errors.push("hopital_id", "mairie agents have no hospital");
      }
    }
    Role::Hopital => {
      if hopital_id.is_none() {
        errors.push("hopital_id", "required for hospital agents");
      }
      if mairie_id.is_some() {
        errors.push("mairie_id", "hospital agents have no mairie");
      }
    }
  }
  errors
}

pub(crate) fn looks_like_email(s: &str) -> bool {
  let s = s.trim();
  match s.split_once('@') {
    Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
    None => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(role: Role, mairie_id: Option<Uuid>, hopital_id: Option<Uuid>) -> ActorRecord {
    ActorRecord {
      actor_id: Uuid::new_v4(),
      name: "Agent".into(),
      email: "agent@example.org".into(),
      role,
      mairie_id,
      hopital_id,
      password_hash: "$argon2id$stub".into(),
      created_at: Utc::now(),
    }
  }

  #[test]
  fn hopital_record_becomes_hopital_agent() {
    let h = Uuid::new_v4();
    let r = record(Role::Hopital, None, Some(h));
    let actor = r.actor().unwrap();
    assert_eq!(actor, Actor::HopitalAgent { id: r.actor_id, hopital_id: h });
    assert_eq!(actor.role(), Role::Hopital);
    assert_eq!(actor.hopital_id(), Some(h));
    assert_eq!(actor.mairie_id(), None);
  }

  #[test]
  fn mairie_record_without_mairie_is_invalid() {
    let err = record(Role::Mairie, None, None).actor().unwrap_err();
    match err {
      Error::ValidationFailed(e) => assert!(e.contains("mairie_id")),
      other => panic!("unexpected {other:?}"),
    }
  }

  #[test]
  fn admin_with_affiliation_is_invalid() {
    assert!(record(Role::Admin, Some(Uuid::new_v4()), None).actor().is_err());
    assert!(record(Role::Admin, None, None).actor().unwrap().is_admin());
  }

  #[test]
  fn new_actor_validation() {
    let input = NewActor {
      name:          " ".into(),
      email:         "nope".into(),
      role:          Role::Hopital,
      mairie_id:     None,
      hopital_id:    None,
      password_hash: String::new(),
    };
    let errors = input.validate();
    for field in ["name", "email", "hopital_id", "password_hash"] {
      assert!(errors.contains(field), "missing {field}");
    }
  }

  #[test]
  fn password_hash_not_serialised() {
    let json = serde_json::to_value(record(Role::Admin, None, None)).unwrap();
    assert!(json.get("password_hash").is_none());
  }
}
