//! Role-scoped listing of declarations, and the read-side view that joins a
//! declaration with its hospital and mairie.
//!
//! Every listing is restricted to a [`Scope`] derived from the actor; the
//! optional text search and status filter narrow it further.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result, ValidationErrors,
  actor::Actor,
  declaration::{Declaration, DeclarationContent},
  lifecycle::Status,
  org::{Hopital, Mairie},
};

// ─── Scope ───────────────────────────────────────────────────────────────────

/// The tenant a listing is restricted to. Never optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
  Hopital(Uuid),
  Mairie(Uuid),
}

impl Scope {
  /// Admins have no declaration scope.
  pub fn for_actor(actor: &Actor) -> Result<Self> {
    match *actor {
      Actor::HopitalAgent { hopital_id, .. } => Ok(Self::Hopital(hopital_id)),
      Actor::MairieAgent { mairie_id, .. } => Ok(Self::Mairie(mairie_id)),
      Actor::Admin { .. } => Err(Error::Unauthorized),
    }
  }

  pub fn contains(&self, declaration: &Declaration) -> bool {
    match *self {
      Self::Hopital(id) => declaration.hopital_id == id,
      Self::Mairie(id) => declaration.mairie_id == id,
    }
  }
}

// ─── Search field ────────────────────────────────────────────────────────────

/// Column a text search applies to.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SearchField {
  /// The child's name: matches `nom_enfant` or `prenom_enfant`.
  #[default]
  NomEnfant,
  PrenomEnfant,
  CodeNuin,
  LieuNaissance,
  NomPere,
  PrenomPere,
  NomMere,
  PrenomMere,
  EmailParent,
}

impl SearchField {
  /// The values this field searches within `content`.
  pub fn values<'a>(&self, content: &'a DeclarationContent) -> Vec<&'a str> {
    match self {
      Self::NomEnfant => vec![content.nom_enfant.as_str(), content.prenom_enfant.as_str()],
      Self::PrenomEnfant => vec![content.prenom_enfant.as_str()],
      Self::CodeNuin => vec![content.code_nuin.as_str()],
      Self::LieuNaissance => vec![content.lieu_naissance.as_str()],
      Self::NomPere => vec![content.nom_pere.as_str()],
      Self::PrenomPere => vec![content.prenom_pere.as_str()],
      Self::NomMere => vec![content.nom_mere.as_str()],
      Self::PrenomMere => vec![content.prenom_mere.as_str()],
      Self::EmailParent => vec![content.email_parent.as_str()],
    }
  }
}

// ─── Status filter ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
  #[default]
  All,
  Only(Status),
}

impl StatusFilter {
  pub fn status(self) -> Option<Status> {
    match self {
      Self::All => None,
      Self::Only(s) => Some(s),
    }
  }

  pub fn accepts(self, status: Status) -> bool {
    self.status().is_none_or(|s| s == status)
  }
}

impl FromStr for StatusFilter {
  type Err = strum::ParseError;

  /// `all`, `tous` and the empty string mean no restriction.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "" | "all" | "tous" => Ok(Self::All),
      other => other.parse().map(Self::Only),
    }
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Optional narrowing of a scoped listing.
#[derive(Debug, Clone, Default)]
pub struct DeclarationQuery {
  pub field:  SearchField,
  /// Case-insensitive substring; blank means no text filter.
  pub text:   Option<String>,
  pub status: StatusFilter,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

impl DeclarationQuery {
  /// Build a query from raw request parameters.
  pub fn parse(
    field: Option<&str>,
    text: Option<String>,
    status: Option<&str>,
  ) -> Result<Self> {
    let mut errors = ValidationErrors::new();
    let field = match field.map(str::trim).filter(|f| !f.is_empty()) {
      None => SearchField::default(),
      Some(f) => f.parse().unwrap_or_else(|_| {
        errors.push("field", format!("cannot search on {f:?}"));
        SearchField::default()
      }),
    };
    let status = match status {
      None => StatusFilter::All,
      Some(s) => s.parse().unwrap_or_else(|_| {
        errors.push("status", format!("unknown status {s:?}"));
        StatusFilter::All
      }),
    };
    errors.into_result()?;
    Ok(Self {
      field,
      text,
      status,
      limit: None,
      offset: None,
    })
  }

  /// The lower-cased search needle, if any.
  pub fn needle(&self) -> Option<String> {
    self
      .text
      .as_deref()
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(str::to_lowercase)
  }

  /// Whether the text search accepts `content`.
  pub fn matches_text(&self, content: &DeclarationContent) -> bool {
    match self.needle() {
      None => true,
      Some(needle) => self
        .field
        .values(content)
        .into_iter()
        .any(|v| v.to_lowercase().contains(&needle)),
    }
  }

  /// Status filter and text search together; scope is applied separately.
  pub fn matches(&self, declaration: &Declaration) -> bool {
    self.status.accepts(declaration.status) && self.matches_text(&declaration.content)
  }
}

// ─── Read-side view ──────────────────────────────────────────────────────────

/// A declaration joined with its hospital and mairie for display.
#[derive(Debug, Clone, Serialize)]
pub struct DeclarationView {
  pub declaration: Declaration,
  pub hopital:     Option<Hopital>,
  pub mairie:      Option<Mairie>,
}
