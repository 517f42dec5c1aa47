//! Error types for `registre-core`.
//!
//! Every registry action resolves to exactly one of these outcomes. None of
//! them is retried by the registry itself.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{declaration::DocumentKind, lifecycle::Status, policy::Action};

// ─── Field-level validation ──────────────────────────────────────────────────

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:   String,
  pub message: String,
}

/// The accumulated field errors of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
  pub fn new() -> Self { Self::default() }

  /// Shorthand for a one-field failure.
  pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
    let mut errors = Self::new();
    errors.push(field, message);
    errors
  }

  pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
    self.0.push(FieldError {
      field:   field.into(),
      message: message.into(),
    });
  }

  pub fn extend(&mut self, other: ValidationErrors) { self.0.extend(other.0); }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn fields(&self) -> &[FieldError] { &self.0 }

  pub fn contains(&self, field: &str) -> bool {
    self.0.iter().any(|e| e.field == field)
  }

  /// `Ok(())` when nothing was pushed, otherwise [`Error::ValidationFailed`].
  pub fn into_result(self) -> Result<()> {
    if self.is_empty() {
      Ok(())
    } else {
      Err(Error::ValidationFailed(self))
    }
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, e) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str("; ")?;
      }
      write!(f, "{}: {}", e.field, e.message)?;
    }
    Ok(())
  }
}

// ─── Error ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum Error {
  /// The actor's role or tenant does not allow the action.
  #[error("unauthorized")]
  Unauthorized,

  /// The actor may act on the declaration, but not in its current status.
  #[error("cannot {action} a declaration that is {status}")]
  InvalidTransition { status: Status, action: Action },

  #[error("validation failed: {0}")]
  ValidationFailed(ValidationErrors),

  /// Another request changed the declaration between read and write.
  #[error("declaration {0} was modified by another request")]
  Conflict(Uuid),

  #[error("declaration not found: {0}")]
  DeclarationNotFound(Uuid),

  #[error("hopital not found: {0}")]
  HopitalNotFound(Uuid),

  #[error("mairie not found: {0}")]
  MairieNotFound(Uuid),

  #[error("no {0} document attached")]
  DocumentNotFound(DocumentKind),

  /// The persistence or blob store failed; fatal to the request.
  #[error("storage failure: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(e))
  }

  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::DeclarationNotFound(_)
        | Self::HopitalNotFound(_)
        | Self::MairieNotFound(_)
        | Self::DocumentNotFound(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
