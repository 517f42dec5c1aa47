//! The `RegistryStore` trait and its write/count types.
//!
//! The trait is implemented by persistence backends (e.g.
//! `registre-store-sqlite`). Every status-sensitive write is conditional: the
//! backend applies it only when the row is still in the expected status and
//! reports whether it did.

use std::future::Future;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  actor::{ActorRecord, NewActor},
  blob::BlobRef,
  declaration::{Declaration, DeclarationContent},
  lifecycle::Status,
  org::{Arrondissement, Commune, Hopital, Mairie, NewHopital, NewMairie, Province},
  query::{DeclarationQuery, Scope},
};

// ─── Write types ─────────────────────────────────────────────────────────────

/// Replacement content for an editable declaration.
///
/// Applied only while the row's status is one of [`Status::EDITABLE`] and
/// its `updated_at` still equals `read_at`, the value the writer loaded.
#[derive(Debug, Clone)]
pub struct ContentUpdate {
  pub declaration_id:      Uuid,
  pub content:             DeclarationContent,
  pub acte_naissance_mere: Option<BlobRef>,
  pub acte_naissance_pere: Option<BlobRef>,
  pub read_at:             DateTime<Utc>,
  pub updated_at:          DateTime<Utc>,
}

/// The `updated_at` to write over a row last written at `previous`:
/// microsecond precision and strictly later, so it always differs from the
/// value a concurrent writer read.
pub fn next_revision(previous: DateTime<Utc>) -> DateTime<Utc> {
  let now = Utc::now().trunc_subsecs(6);
  now.max(previous + Duration::microseconds(1))
}

/// A check-and-set status change: applied only if the row is still `from`.
#[derive(Debug, Clone)]
pub struct StatusChange {
  pub declaration_id:  Uuid,
  pub from:            Status,
  pub to:              Status,
  /// Recorded when a mairie agent decides; `None` leaves the column as is.
  pub agent_mairie_id: Option<Uuid>,
  /// Recorded on rejection; `None` leaves the column as is.
  pub motif_rejet:     Option<String>,
  pub at:              DateTime<Utc>,
}

/// Number of declarations per status within a scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
  pub brouillon: u64,
  pub envoyee:   u64,
  pub validee:   u64,
  pub rejetee:   u64,
}

impl StatusCounts {
  pub fn total(&self) -> u64 { self.brouillon + self.envoyee + self.validee + self.rejetee }

  pub fn add(&mut self, status: Status, n: u64) {
    match status {
      Status::Brouillon => self.brouillon += n,
      Status::Envoyee => self.envoyee += n,
      Status::Validee => self.validee += n,
      Status::Rejetee => self.rejetee += n,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the registry's persistence backend.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait RegistryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Geography ─────────────────────────────────────────────────────────

  fn add_province(
    &self,
    nom: String,
  ) -> impl Future<Output = Result<Province, Self::Error>> + Send + '_;

  fn add_commune(
    &self,
    province_id: Uuid,
    nom: String,
  ) -> impl Future<Output = Result<Commune, Self::Error>> + Send + '_;

  fn add_arrondissement(
    &self,
    commune_id: Uuid,
    nom: String,
  ) -> impl Future<Output = Result<Arrondissement, Self::Error>> + Send + '_;

  fn list_provinces(
    &self,
  ) -> impl Future<Output = Result<Vec<Province>, Self::Error>> + Send + '_;

  /// Communes of one province, by name.
  fn list_communes(
    &self,
    province_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Commune>, Self::Error>> + Send + '_;

  /// Arrondissements of one commune, by name.
  fn list_arrondissements(
    &self,
    commune_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Arrondissement>, Self::Error>> + Send + '_;

  fn get_commune(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Commune>, Self::Error>> + Send + '_;

  fn get_arrondissement(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Arrondissement>, Self::Error>> + Send + '_;

  // ── Mairies and hospitals ─────────────────────────────────────────────

  fn add_mairie(
    &self,
    input: NewMairie,
  ) -> impl Future<Output = Result<Mairie, Self::Error>> + Send + '_;

  fn get_mairie(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Mairie>, Self::Error>> + Send + '_;

  fn list_mairies(
    &self,
  ) -> impl Future<Output = Result<Vec<Mairie>, Self::Error>> + Send + '_;

  /// The `limit` most recently created mairies, newest first.
  fn recent_mairies(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Mairie>, Self::Error>> + Send + '_;

  fn count_mairies(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn add_hopital(
    &self,
    input: NewHopital,
  ) -> impl Future<Output = Result<Hopital, Self::Error>> + Send + '_;

  fn get_hopital(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Hopital>, Self::Error>> + Send + '_;

  /// All hospitals, or only those affiliated with `mairie_id`.
  fn list_hopitaux(
    &self,
    mairie_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<Hopital>, Self::Error>> + Send + '_;

  /// The `limit` most recently created hospitals, newest first.
  fn recent_hopitaux(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Hopital>, Self::Error>> + Send + '_;

  fn count_hopitaux(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Change a hospital's mairie. Existing declarations keep theirs.
  /// Returns `false` if the hospital does not exist.
  fn reassign_hopital(
    &self,
    hopital_id: Uuid,
    mairie_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Actors ────────────────────────────────────────────────────────────

  fn add_actor(
    &self,
    input: NewActor,
  ) -> impl Future<Output = Result<ActorRecord, Self::Error>> + Send + '_;

  fn get_actor(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ActorRecord>, Self::Error>> + Send + '_;

  /// Case-insensitive lookup used for login.
  fn find_actor_by_email(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<ActorRecord>, Self::Error>> + Send + '_;

  fn list_actors(
    &self,
  ) -> impl Future<Output = Result<Vec<ActorRecord>, Self::Error>> + Send + '_;

  fn count_actors(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Declarations ──────────────────────────────────────────────────────

  /// Persist a fully built declaration.
  fn insert_declaration(
    &self,
    declaration: Declaration,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_declaration(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Declaration>, Self::Error>> + Send + '_;

  /// Conditional on an editable status and an unchanged `updated_at`;
  /// `false` when not applied.
  fn update_declaration(
    &self,
    update: ContentUpdate,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Check-and-set on `change.from`; `false` when another writer got there
  /// first or the row is gone.
  fn transition_declaration(
    &self,
    change: StatusChange,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Conditional on an editable status and `updated_at == read_at`;
  /// `false` when not applied.
  fn delete_declaration(
    &self,
    id: Uuid,
    read_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Declarations in `scope` matching `query`, newest first.
  fn list_declarations(
    &self,
    scope: Scope,
    query: DeclarationQuery,
  ) -> impl Future<Output = Result<Vec<Declaration>, Self::Error>> + Send + '_;

  fn status_counts(
    &self,
    scope: Scope,
  ) -> impl Future<Output = Result<StatusCounts, Self::Error>> + Send + '_;

  /// Declarations in `scope` created at or after `since`.
  fn count_created_since(
    &self,
    scope: Scope,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// All declarations across every tenant.
  fn count_declarations(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
