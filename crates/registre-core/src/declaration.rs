//! The birth declaration, central entity of the registry.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{
  ValidationErrors, actor::looks_like_email, blob::BlobRef, blob::Upload,
  lifecycle::Status,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sexe {
  Masculin,
  Feminin,
}

/// Which parent's birth certificate a document is.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DocumentKind {
  Mere,
  Pere,
}

impl DocumentKind {
  /// Field name used in requests and field errors.
  pub fn field(self) -> &'static str {
    match self {
      Self::Mere => "acte_naissance_mere",
      Self::Pere => "acte_naissance_pere",
    }
  }
}

// ─── Content ─────────────────────────────────────────────────────────────────

/// The editable body of a declaration: the child and both parents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationContent {
  pub nom_enfant:       String,
  pub prenom_enfant:    String,
  /// National unique identifier number; fixed once the draft exists.
  pub code_nuin:        String,
  pub date_naissance:   NaiveDate,
  pub sexe:             Sexe,
  pub lieu_naissance:   String,

  pub nom_pere:         String,
  pub prenom_pere:      String,
  pub profession_pere:  Option<String>,
  pub nationalite_pere: Option<String>,

  pub nom_mere:         String,
  pub prenom_mere:      String,
  pub profession_mere:  Option<String>,
  pub nationalite_mere: Option<String>,

  pub email_parent:     String,
}

impl DeclarationContent {
  pub fn validate(&self) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let required = [
      ("nom_enfant", &self.nom_enfant),
      ("prenom_enfant", &self.prenom_enfant),
      ("code_nuin", &self.code_nuin),
      ("lieu_naissance", &self.lieu_naissance),
      ("nom_pere", &self.nom_pere),
      ("prenom_pere", &self.prenom_pere),
      ("nom_mere", &self.nom_mere),
      ("prenom_mere", &self.prenom_mere),
    ];
    for (field, value) in required {
      if value.trim().is_empty() {
        errors.push(field, "required");
      }
    }
    if !looks_like_email(&self.email_parent) {
      errors.push("email_parent", "must be an email address");
    }
    if self.date_naissance > Utc::now().date_naive() {
      errors.push("date_naissance", "cannot be in the future");
    }
    errors
  }
}

// ─── Declaration ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
  pub declaration_id:      Uuid,
  #[serde(flatten)]
  pub content:             DeclarationContent,
  pub acte_naissance_mere: Option<BlobRef>,
  pub acte_naissance_pere: Option<BlobRef>,
  pub motif_rejet:         Option<String>,
  pub status:              Status,
  /// The hospital agent who drafted the declaration.
  pub agent_hopital_id:    Uuid,
  pub hopital_id:          Uuid,
  /// Copied from the hospital at creation; never rewritten.
  pub mairie_id:           Uuid,
  /// The mairie agent who last decided on the declaration.
  pub agent_mairie_id:     Option<Uuid>,
  pub created_at:          DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}

impl Declaration {
  pub fn document(&self, kind: DocumentKind) -> Option<&BlobRef> {
    match kind {
      DocumentKind::Mere => self.acte_naissance_mere.as_ref(),
      DocumentKind::Pere => self.acte_naissance_pere.as_ref(),
    }
  }

  /// All attached documents, mother's first.
  pub fn documents(&self) -> Vec<BlobRef> {
    [&self.acte_naissance_mere, &self.acte_naissance_pere]
      .into_iter()
      .flatten()
      .cloned()
      .collect()
  }
}

// ─── Patch ───────────────────────────────────────────────────────────────────

/// A partial content update. Absent fields are left untouched; for the
/// nullable parent details an explicit `null` clears the value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeclarationPatch {
  pub nom_enfant:       Option<String>,
  pub prenom_enfant:    Option<String>,
  pub date_naissance:   Option<NaiveDate>,
  pub sexe:             Option<Sexe>,
  pub lieu_naissance:   Option<String>,
  pub nom_pere:         Option<String>,
  pub prenom_pere:      Option<String>,
  #[serde(default, deserialize_with = "present")]
  pub profession_pere:  Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub nationalite_pere: Option<Option<String>>,
  pub nom_mere:         Option<String>,
  pub prenom_mere:      Option<String>,
  #[serde(default, deserialize_with = "present")]
  pub profession_mere:  Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub nationalite_mere: Option<Option<String>>,
  pub email_parent:     Option<String>,
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent key (`None`).
fn present<'de, T, D>(d: D) -> Result<Option<T>, D::Error>
where
  T: Deserialize<'de>,
  D: Deserializer<'de>,
{
  T::deserialize(d).map(Some)
}

impl DeclarationPatch {
  /// The content that results from applying this patch to `current`.
  pub fn apply_to(&self, current: &DeclarationContent) -> DeclarationContent {
    fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
      if let Some(v) = value {
        *slot = v.clone();
      }
    }

    let mut next = current.clone();
    set(&mut next.nom_enfant, &self.nom_enfant);
    set(&mut next.prenom_enfant, &self.prenom_enfant);
    set(&mut next.date_naissance, &self.date_naissance);
    set(&mut next.sexe, &self.sexe);
    set(&mut next.lieu_naissance, &self.lieu_naissance);
    set(&mut next.nom_pere, &self.nom_pere);
    set(&mut next.prenom_pere, &self.prenom_pere);
    set(&mut next.profession_pere, &self.profession_pere);
    set(&mut next.nationalite_pere, &self.nationalite_pere);
    set(&mut next.nom_mere, &self.nom_mere);
    set(&mut next.prenom_mere, &self.prenom_mere);
    set(&mut next.profession_mere, &self.profession_mere);
    set(&mut next.nationalite_mere, &self.nationalite_mere);
    set(&mut next.email_parent, &self.email_parent);
    next
  }
}

/// Documents accompanying a create or update request.
#[derive(Debug, Clone, Default)]
pub struct DocumentUploads {
  pub mere: Option<Upload>,
  pub pere: Option<Upload>,
}

impl DocumentUploads {
  pub fn get(&self, kind: DocumentKind) -> Option<&Upload> {
    match kind {
      DocumentKind::Mere => self.mere.as_ref(),
      DocumentKind::Pere => self.pere.as_ref(),
    }
  }
}
