//! [`Registry`], the action boundary of the birth-declaration registry.
//!
//! Each public method is one action: it receives the calling [`Actor`]
//! explicitly, runs the policy, applies at most one conditional write and
//! resolves to a single outcome. Blob writes happen before the row is written
//! and are undone if the row write does not go through.

use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result, ValidationErrors,
  actor::{Actor, ActorRecord, NewActor, Role},
  blob::{Blob, BlobRef, BlobStore, DOCUMENTS, MediaType, StagedRemoval},
  declaration::{
    Declaration, DeclarationContent, DeclarationPatch, DocumentKind, DocumentUploads,
  },
  lifecycle::{Status, Transition},
  org::{Arrondissement, Commune, Hopital, Mairie, NewHopital, NewMairie, Province},
  policy::{self, Action},
  query::{DeclarationQuery, DeclarationView, Scope},
  render::{DocumentRenderer, PlainTextRenderer, RenderedDocument},
  store::{ContentUpdate, RegistryStore, StatusChange, next_revision},
};

/// Number of entries in a dashboard's "recent" list.
const RECENT: usize = 5;

/// Window for the hospital dashboard's "new declarations" counter.
const NEW_WINDOW_DAYS: i64 = 7;

// ─── Dashboard ───────────────────────────────────────────────────────────────

/// Per-role landing summary.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Dashboard {
  Hopital {
    total:               u64,
    created_last_7_days: u64,
    recent:              Vec<Declaration>,
  },
  Mairie {
    /// Received and awaiting a decision (`envoyee`).
    pending:   u64,
    validated: u64,
    rejected:  u64,
    recent:    Vec<Declaration>,
  },
  Admin {
    mairies:         u64,
    hopitaux:        u64,
    actors:          u64,
    declarations:    u64,
    /// Latest mairies and hospitals together, newest first.
    recent_entities: Vec<RecentEntity>,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
  Mairie,
  Hopital,
}

/// A recently created organisation on the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct RecentEntity {
  #[serde(rename = "type")]
  pub kind:               EntityKind,
  pub id:                 Uuid,
  pub nom:                String,
  pub adresse_complete:   String,
  pub type_etablissement: Option<String>,
  pub created_at:         DateTime<Utc>,
}

impl From<Mairie> for RecentEntity {
  fn from(m: Mairie) -> Self {
    Self {
      kind:               EntityKind::Mairie,
      id:                 m.mairie_id,
      nom:                m.details.nom,
      adresse_complete:   m.details.adresse_complete,
      type_etablissement: None,
      created_at:         m.created_at,
    }
  }
}

impl From<Hopital> for RecentEntity {
  fn from(h: Hopital) -> Self {
    Self {
      kind:               EntityKind::Hopital,
      id:                 h.hopital_id,
      nom:                h.details.nom,
      adresse_complete:   h.details.adresse_complete,
      type_etablissement: h.details.type_etablissement,
      created_at:         h.created_at,
    }
  }
}

// ─── Stored documents ────────────────────────────────────────────────────────

/// Blobs written by the current action, not yet referenced by any row.
#[derive(Debug, Default)]
struct StoredDocuments {
  mere: Option<BlobRef>,
  pere: Option<BlobRef>,
}

impl StoredDocuments {
  fn set(&mut self, kind: DocumentKind, reference: BlobRef) {
    match kind {
      DocumentKind::Mere => self.mere = Some(reference),
      DocumentKind::Pere => self.pere = Some(reference),
    }
  }

  fn all(&self) -> Vec<BlobRef> { self.mere.iter().chain(&self.pere).cloned().collect() }
}

/// Size/format checks for each provided upload, accumulated into `errors`.
fn check_uploads(
  uploads: &DocumentUploads,
  require_mere: bool,
  errors: &mut ValidationErrors,
) -> Vec<(DocumentKind, MediaType)> {
  let mut checked = Vec::new();
  for kind in [DocumentKind::Mere, DocumentKind::Pere] {
    match uploads.get(kind) {
      Some(upload) => match upload.check() {
        Ok(media_type) => checked.push((kind, media_type)),
        Err(message) => errors.push(kind.field(), message),
      },
      None if require_mere && kind == DocumentKind::Mere => {
        errors.push(kind.field(), "required");
      }
      None => {}
    }
  }
  checked
}

fn require_admin(actor: &Actor) -> Result<()> {
  if actor.is_admin() {
    Ok(())
  } else {
    Err(Error::Unauthorized)
  }
}

// ─── Registry ────────────────────────────────────────────────────────────────

pub struct Registry<S, B> {
  store:    Arc<S>,
  blobs:    Arc<B>,
  renderer: Arc<dyn DocumentRenderer>,
}

impl<S, B> Clone for Registry<S, B> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      blobs:    Arc::clone(&self.blobs),
      renderer: Arc::clone(&self.renderer),
    }
  }
}

impl<S, B> Registry<S, B>
where
  S: RegistryStore,
  B: BlobStore,
{
  /// A registry rendering downloads with [`PlainTextRenderer`].
  pub fn new(store: Arc<S>, blobs: Arc<B>) -> Self {
    Self {
      store,
      blobs,
      renderer: Arc::new(PlainTextRenderer),
    }
  }

  pub fn with_renderer(mut self, renderer: impl DocumentRenderer + 'static) -> Self {
    self.renderer = Arc::new(renderer);
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn blobs(&self) -> &B { &self.blobs }

  // ── Helpers ───────────────────────────────────────────────────────────────

  async fn load(&self, id: Uuid) -> Result<Declaration> {
    self
      .store
      .get_declaration(id)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::DeclarationNotFound(id))
  }

  /// Why a conditional write on `id` did not apply: the status now forbids
  /// `action`, the row is gone, or another request wrote it first.
  async fn blocked(&self, id: Uuid, action: Action) -> Error {
    match self.load(id).await {
      Ok(d) => match d.status.permits(action) {
        Err(e) => e,
        Ok(()) => Error::Conflict(id),
      },
      Err(e) => e,
    }
  }

  async fn view_of(&self, declaration: Declaration) -> Result<DeclarationView> {
    let hopital = self
      .store
      .get_hopital(declaration.hopital_id)
      .await
      .map_err(Error::storage)?;
    let mairie = self
      .store
      .get_mairie(declaration.mairie_id)
      .await
      .map_err(Error::storage)?;
    Ok(DeclarationView {
      declaration,
      hopital,
      mairie,
    })
  }

  /// Write the checked uploads; on failure nothing written here survives.
  async fn store_uploads(
    &self,
    uploads: &DocumentUploads,
    checked: &[(DocumentKind, MediaType)],
  ) -> Result<StoredDocuments> {
    let mut stored = StoredDocuments::default();
    for &(kind, media_type) in checked {
      let Some(upload) = uploads.get(kind) else {
        continue;
      };
      match self.blobs.store(DOCUMENTS, media_type, upload.data.clone()).await {
        Ok(reference) => stored.set(kind, reference),
        Err(e) => {
          self.discard(stored.all()).await;
          return Err(Error::storage(e));
        }
      }
    }
    Ok(stored)
  }

  /// Best-effort removal of blobs no row references.
  async fn discard(&self, references: Vec<BlobRef>) {
    for reference in references {
      let path = reference.path.clone();
      if let Err(e) = self.blobs.delete(reference).await {
        warn!(%path, error = %e, "failed to remove unreferenced blob");
      }
    }
  }

  async fn rollback(&self, staged: Vec<StagedRemoval>) {
    for s in staged {
      let path = s.reference.path.clone();
      if let Err(e) = self.blobs.rollback_removal(s).await {
        warn!(%path, error = %e, "failed to restore staged blob");
      }
    }
  }

  async fn commit(&self, staged: Vec<StagedRemoval>) {
    for s in staged {
      let path = s.reference.path.clone();
      if let Err(e) = self.blobs.commit_removal(s).await {
        warn!(%path, error = %e, "staged blob was not purged");
      }
    }
  }

  /// After a delete lost a race on `id`: restore the staged documents the
  /// row still references and purge the ones a concurrent update replaced.
  async fn settle(&self, id: Uuid, staged: Vec<StagedRemoval>) {
    let referenced = match self.store.get_declaration(id).await {
      Ok(row) => row.map(|d| d.documents()).unwrap_or_default(),
      Err(e) => {
        warn!(declaration_id = %id, error = %e, "cannot reload declaration; restoring documents");
        return self.rollback(staged).await;
      }
    };
    let (keep, purge): (Vec<_>, Vec<_>) = staged
      .into_iter()
      .partition(|s| referenced.contains(&s.reference));
    self.rollback(keep).await;
    self.commit(purge).await;
  }

  // ── Declarations ──────────────────────────────────────────────────────────

  /// Draft a new declaration for the actor's hospital.
  pub async fn create(
    &self,
    actor: &Actor,
    content: DeclarationContent,
    uploads: DocumentUploads,
  ) -> Result<Declaration> {
    policy::can_create(actor).require()?;
    let Actor::HopitalAgent { id: agent_id, hopital_id } = *actor else {
      return Err(Error::Unauthorized);
    };

    let mut errors = content.validate();
    let checked = check_uploads(&uploads, true, &mut errors);
    errors.into_result()?;

    let hopital = self
      .store
      .get_hopital(hopital_id)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::HopitalNotFound(hopital_id))?;

    let stored = self.store_uploads(&uploads, &checked).await?;
    let now = Utc::now().trunc_subsecs(6);
    let declaration = Declaration {
      declaration_id: Uuid::new_v4(),
      content,
      acte_naissance_mere: stored.mere.clone(),
      acte_naissance_pere: stored.pere.clone(),
      motif_rejet: None,
      status: Status::Brouillon,
      agent_hopital_id: agent_id,
      hopital_id,
      mairie_id: hopital.mairie_id(),
      agent_mairie_id: None,
      created_at: now,
      updated_at: now,
    };

    if let Err(e) = self.store.insert_declaration(declaration.clone()).await {
      self.discard(stored.all()).await;
      return Err(Error::storage(e));
    }

    info!(
      declaration_id = %declaration.declaration_id,
      %hopital_id,
      mairie_id = %declaration.mairie_id,
      "declaration drafted"
    );
    Ok(declaration)
  }

  pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<DeclarationView> {
    let declaration = self.load(id).await?;
    policy::authorize(actor, Action::View, &declaration)?;
    self.view_of(declaration).await
  }

  /// Edit content and optionally replace documents. Status is unchanged.
  pub async fn update(
    &self,
    actor: &Actor,
    id: Uuid,
    patch: DeclarationPatch,
    uploads: DocumentUploads,
  ) -> Result<Declaration> {
    let current = self.load(id).await?;
    policy::authorize(actor, Action::Update, &current)?;

    let content = patch.apply_to(&current.content);
    let mut errors = content.validate();
    let checked = check_uploads(&uploads, false, &mut errors);
    errors.into_result()?;

    let stored = self.store_uploads(&uploads, &checked).await?;
    let update = ContentUpdate {
      declaration_id:      id,
      content,
      acte_naissance_mere: stored
        .mere
        .clone()
        .or_else(|| current.acte_naissance_mere.clone()),
      acte_naissance_pere: stored
        .pere
        .clone()
        .or_else(|| current.acte_naissance_pere.clone()),
      read_at:             current.updated_at,
      updated_at:          next_revision(current.updated_at),
    };
    let written = Declaration {
      content: update.content.clone(),
      acte_naissance_mere: update.acte_naissance_mere.clone(),
      acte_naissance_pere: update.acte_naissance_pere.clone(),
      updated_at: update.updated_at,
      ..current.clone()
    };

    match self.store.update_declaration(update).await {
      Ok(true) => {}
      Ok(false) => {
        self.discard(stored.all()).await;
        return Err(self.blocked(id, Action::Update).await);
      }
      Err(e) => {
        self.discard(stored.all()).await;
        return Err(Error::storage(e));
      }
    }

    let mut replaced = Vec::new();
    if stored.mere.is_some() {
      replaced.extend(current.acte_naissance_mere.clone());
    }
    if stored.pere.is_some() {
      replaced.extend(current.acte_naissance_pere.clone());
    }
    self.discard(replaced).await;

    info!(declaration_id = %id, status = %current.status, "declaration updated");
    Ok(written)
  }

  /// Remove a declaration together with its documents, or nothing at all.
  pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<()> {
    let current = self.load(id).await?;
    policy::authorize(actor, Action::Delete, &current)?;

    let mut staged = Vec::new();
    for reference in current.documents() {
      match self.blobs.stage_removal(reference).await {
        Ok(s) => staged.push(s),
        Err(e) => {
          self.rollback(staged).await;
          // A concurrent update may already have released this document.
          return match self.load(id).await {
            Ok(now) if now.updated_at == current.updated_at => Err(Error::storage(e)),
            _ => Err(self.blocked(id, Action::Delete).await),
          };
        }
      }
    }

    match self.store.delete_declaration(id, current.updated_at).await {
      Ok(true) => {}
      Ok(false) => {
        self.settle(id, staged).await;
        return Err(self.blocked(id, Action::Delete).await);
      }
      Err(e) => {
        self.rollback(staged).await;
        return Err(Error::storage(e));
      }
    }

    self.commit(staged).await;

    info!(declaration_id = %id, "declaration deleted");
    Ok(())
  }

  /// Send a draft (or a rejected declaration) to the mairie.
  pub async fn submit(&self, actor: &Actor, id: Uuid) -> Result<Declaration> {
    self.transition(actor, id, Transition::Submit, None).await
  }

  pub async fn validate(&self, actor: &Actor, id: Uuid) -> Result<Declaration> {
    self.transition(actor, id, Transition::Validate, None).await
  }

  /// Reject with a mandatory, non-blank reason.
  pub async fn reject(&self, actor: &Actor, id: Uuid, reason: String) -> Result<Declaration> {
    self.transition(actor, id, Transition::Reject, Some(reason)).await
  }

  async fn transition(
    &self,
    actor: &Actor,
    id: Uuid,
    transition: Transition,
    reason: Option<String>,
  ) -> Result<Declaration> {
    let action = transition.action();
    let current = self.load(id).await?;
    policy::authorize(actor, action, &current)?;

    let motif_rejet = match transition {
      Transition::Reject => {
        let reason = reason
          .map(|r| r.trim().to_owned())
          .filter(|r| !r.is_empty())
          .ok_or_else(|| {
            Error::ValidationFailed(ValidationErrors::single("motif_rejet", "required"))
          })?;
        Some(reason)
      }
      Transition::Submit | Transition::Validate => None,
    };

    let to = current.status.apply(transition)?;
    let change = StatusChange {
      declaration_id: id,
      from: current.status,
      to,
      agent_mairie_id: actor.mairie_id().map(|_| actor.id()),
      motif_rejet,
      at: Utc::now(),
    };

    if !self
      .store
      .transition_declaration(change)
      .await
      .map_err(Error::storage)?
    {
      return Err(self.blocked(id, action).await);
    }

    info!(
      declaration_id = %id,
      from = %current.status,
      %to,
      actor = %actor.id(),
      "declaration status changed"
    );
    self.load(id).await
  }

  /// The actor's scoped listing, newest first.
  pub async fn list(&self, actor: &Actor, query: DeclarationQuery) -> Result<Vec<Declaration>> {
    let scope = Scope::for_actor(actor)?;
    self
      .store
      .list_declarations(scope, query)
      .await
      .map_err(Error::storage)
  }

  pub async fn download(&self, actor: &Actor, id: Uuid) -> Result<RenderedDocument> {
    let declaration = self.load(id).await?;
    policy::authorize(actor, Action::Download, &declaration)?;
    let view = self.view_of(declaration).await?;
    self.renderer.render(&view)
  }

  /// Inline content of one attached document.
  pub async fn preview(&self, actor: &Actor, id: Uuid, kind: DocumentKind) -> Result<Blob> {
    let declaration = self.load(id).await?;
    policy::authorize(actor, Action::PreviewDocument, &declaration)?;
    let reference = declaration
      .document(kind)
      .cloned()
      .ok_or(Error::DocumentNotFound(kind))?;
    self.blobs.open(reference).await.map_err(Error::storage)
  }

  pub async fn dashboard(&self, actor: &Actor) -> Result<Dashboard> {
    let recent_query = DeclarationQuery {
      limit: Some(RECENT),
      ..DeclarationQuery::default()
    };
    match *actor {
      Actor::HopitalAgent { hopital_id, .. } => {
        let scope = Scope::Hopital(hopital_id);
        let counts = self.store.status_counts(scope).await.map_err(Error::storage)?;
        let since = Utc::now() - Duration::days(NEW_WINDOW_DAYS);
        let created_last_7_days = self
          .store
          .count_created_since(scope, since)
          .await
          .map_err(Error::storage)?;
        let recent = self
          .store
          .list_declarations(scope, recent_query)
          .await
          .map_err(Error::storage)?;
        Ok(Dashboard::Hopital {
          total: counts.total(),
          created_last_7_days,
          recent,
        })
      }
      Actor::MairieAgent { mairie_id, .. } => {
        let scope = Scope::Mairie(mairie_id);
        let counts = self.store.status_counts(scope).await.map_err(Error::storage)?;
        let recent = self
          .store
          .list_declarations(scope, recent_query)
          .await
          .map_err(Error::storage)?;
        Ok(Dashboard::Mairie {
          pending: counts.envoyee,
          validated: counts.validee,
          rejected: counts.rejetee,
          recent,
        })
      }
      Actor::Admin { .. } => {
        let mairies = self.store.count_mairies().await.map_err(Error::storage)?;
        let hopitaux = self.store.count_hopitaux().await.map_err(Error::storage)?;
        let actors = self.store.count_actors().await.map_err(Error::storage)?;
        let declarations = self.store.count_declarations().await.map_err(Error::storage)?;

        let mut recent_entities: Vec<RecentEntity> = self
          .store
          .recent_mairies(RECENT)
          .await
          .map_err(Error::storage)?
          .into_iter()
          .map(RecentEntity::from)
          .collect();
        recent_entities.extend(
          self
            .store
            .recent_hopitaux(RECENT)
            .await
            .map_err(Error::storage)?
            .into_iter()
            .map(RecentEntity::from),
        );
        recent_entities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent_entities.truncate(RECENT);

        Ok(Dashboard::Admin {
          mairies,
          hopitaux,
          actors,
          declarations,
          recent_entities,
        })
      }
    }
  }

  // ── Administration ────────────────────────────────────────────────────────

  pub async fn create_mairie(&self, actor: &Actor, input: NewMairie) -> Result<Mairie> {
    require_admin(actor)?;
    let mut errors = input.validate();

    match self
      .store
      .get_commune(input.commune_id)
      .await
      .map_err(Error::storage)?
    {
      None => errors.push("commune_id", "unknown commune"),
      Some(c) if c.province_id != input.province_id => {
        errors.push("commune_id", "not in the selected province");
      }
      Some(_) => {}
    }
    match self
      .store
      .get_arrondissement(input.arrondissement_id)
      .await
      .map_err(Error::storage)?
    {
      None => errors.push("arrondissement_id", "unknown arrondissement"),
      Some(a) if a.commune_id != input.commune_id => {
        errors.push("arrondissement_id", "not in the selected commune");
      }
      Some(_) => {}
    }
    errors.into_result()?;

    let mairie = self.store.add_mairie(input).await.map_err(Error::storage)?;
    info!(mairie_id = %mairie.mairie_id, nom = %mairie.details.nom, "mairie created");
    Ok(mairie)
  }

  pub async fn create_hopital(&self, actor: &Actor, input: NewHopital) -> Result<Hopital> {
    require_admin(actor)?;
    let mut errors = input.validate();
    if self
      .store
      .get_mairie(input.mairie_id)
      .await
      .map_err(Error::storage)?
      .is_none()
    {
      errors.push("mairie_id", "unknown mairie");
    }
    errors.into_result()?;

    let hopital = self.store.add_hopital(input).await.map_err(Error::storage)?;
    info!(
      hopital_id = %hopital.hopital_id,
      mairie_id = %hopital.mairie_id(),
      "hopital created"
    );
    Ok(hopital)
  }

  /// Move a hospital to another mairie. Declarations already drafted keep the
  /// mairie they were created with.
  pub async fn reassign_hopital(
    &self,
    actor: &Actor,
    hopital_id: Uuid,
    mairie_id: Uuid,
  ) -> Result<Hopital> {
    require_admin(actor)?;
    self
      .store
      .get_mairie(mairie_id)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::MairieNotFound(mairie_id))?;
    if !self
      .store
      .reassign_hopital(hopital_id, mairie_id)
      .await
      .map_err(Error::storage)?
    {
      return Err(Error::HopitalNotFound(hopital_id));
    }
    info!(%hopital_id, %mairie_id, "hopital reassigned");
    self
      .store
      .get_hopital(hopital_id)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::HopitalNotFound(hopital_id))
  }

  /// Register a user. The password hash is produced by the caller.
  pub async fn create_actor(&self, actor: &Actor, input: NewActor) -> Result<ActorRecord> {
    require_admin(actor)?;
    self.register_actor(input).await
  }

  /// Register a user without an acting admin; used to bootstrap the first
  /// administrator.
  pub async fn register_actor(&self, input: NewActor) -> Result<ActorRecord> {
    let mut errors = input.validate();

    match (input.role, input.mairie_id, input.hopital_id) {
      (Role::Mairie, Some(id), _) => {
        if self.store.get_mairie(id).await.map_err(Error::storage)?.is_none() {
          errors.push("mairie_id", "unknown mairie");
        }
      }
      (Role::Hopital, _, Some(id)) => {
        if self.store.get_hopital(id).await.map_err(Error::storage)?.is_none() {
          errors.push("hopital_id", "unknown hopital");
        }
      }
      _ => {}
    }
    if self
      .store
      .find_actor_by_email(input.email.clone())
      .await
      .map_err(Error::storage)?
      .is_some()
    {
      errors.push("email", "already registered");
    }
    errors.into_result()?;

    let record = self.store.add_actor(input).await.map_err(Error::storage)?;
    info!(actor_id = %record.actor_id, role = %record.role, "actor registered");
    Ok(record)
  }

  pub async fn list_mairies(&self, actor: &Actor) -> Result<Vec<Mairie>> {
    require_admin(actor)?;
    self.store.list_mairies().await.map_err(Error::storage)
  }

  pub async fn list_hopitaux(
    &self,
    actor: &Actor,
    mairie_id: Option<Uuid>,
  ) -> Result<Vec<Hopital>> {
    require_admin(actor)?;
    self.store.list_hopitaux(mairie_id).await.map_err(Error::storage)
  }

  pub async fn list_actors(&self, actor: &Actor) -> Result<Vec<ActorRecord>> {
    require_admin(actor)?;
    self.store.list_actors().await.map_err(Error::storage)
  }

  // ── Geography ─────────────────────────────────────────────────────────────

  pub async fn provinces(&self) -> Result<Vec<Province>> {
    self.store.list_provinces().await.map_err(Error::storage)
  }

  pub async fn communes(&self, province_id: Uuid) -> Result<Vec<Commune>> {
    self.store.list_communes(province_id).await.map_err(Error::storage)
  }

  pub async fn arrondissements(&self, commune_id: Uuid) -> Result<Vec<Arrondissement>> {
    self
      .store
      .list_arrondissements(commune_id)
      .await
      .map_err(Error::storage)
  }
}
