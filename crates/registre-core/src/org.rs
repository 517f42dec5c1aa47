//! Mairies, hospitals and the geographic hierarchy used for their addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ValidationErrors, actor::looks_like_email};

// ─── Geography ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
  pub province_id: Uuid,
  pub nom:         String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commune {
  pub commune_id:  Uuid,
  pub province_id: Uuid,
  pub nom:         String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrondissement {
  pub arrondissement_id: Uuid,
  pub commune_id:        Uuid,
  pub nom:               String,
}

// ─── Mairie ──────────────────────────────────────────────────────────────────

/// A municipal civil-registry office; receives and decides declarations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mairie {
  pub mairie_id:  Uuid,
  #[serde(flatten)]
  pub details:    NewMairie,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::RegistryStore::add_mairie`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMairie {
  pub nom:                 String,
  pub description_courte:  Option<String>,
  pub email:               String,
  pub telephone_principal: String,
  pub adresse_complete:    String,
  pub code_postal:         Option<String>,
  pub province_id:         Uuid,
  pub commune_id:          Uuid,
  pub arrondissement_id:   Uuid,
}

impl NewMairie {
  /// Field checks only; the geographic cascade is checked by the registry
  /// against the store.
  pub fn validate(&self) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    contact_checks(
      &mut errors,
      &self.nom,
      &self.email,
      &self.telephone_principal,
      &self.adresse_complete,
    );
    errors
  }
}

// ─── Hopital ─────────────────────────────────────────────────────────────────

/// A hospital; drafts and submits declarations to its mairie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hopital {
  pub hopital_id: Uuid,
  #[serde(flatten)]
  pub details:    NewHopital,
  pub created_at: DateTime<Utc>,
}

impl Hopital {
  pub fn mairie_id(&self) -> Uuid { self.details.mairie_id }
}

/// Input to [`crate::store::RegistryStore::add_hopital`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHopital {
  pub nom:                 String,
  pub description_courte:  Option<String>,
  pub type_etablissement:  Option<String>,
  pub email:               String,
  pub telephone_principal: String,
  pub adresse_complete:    String,
  pub code_postal:         Option<String>,
  pub mairie_id:           Uuid,
}

impl NewHopital {
  pub fn validate(&self) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    contact_checks(
      &mut errors,
      &self.nom,
      &self.email,
      &self.telephone_principal,
      &self.adresse_complete,
    );
    errors
  }
}

fn contact_checks(
  errors: &mut ValidationErrors,
  nom: &str,
  email: &str,
  telephone: &str,
  adresse: &str,
) {
  if nom.trim().is_empty() {
    errors.push("nom", "required");
  }
  if !looks_like_email(email) {
    errors.push("email", "must be an email address");
  }
  if telephone.trim().is_empty() {
    errors.push("telephone_principal", "required");
  }
  if adresse.trim().is_empty() {
    errors.push("adresse_complete", "required");
  }
}
