//! Tests for `SqliteStore`, alone and driven through the `Registry` actions,
//! against an in-memory database.


use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
};

use bytes::Bytes;
use chrono::NaiveDate;
use registre_core::{
  actor::{Actor, NewActor, Role},
  blob::{Blob, BlobRef, BlobStore, MediaType, StagedRemoval, Upload, content_hash},
  declaration::{DeclarationContent, DocumentUploads, Sexe},
  org::{Arrondissement, Commune, Hopital, Mairie, NewHopital, NewMairie, Province},
  service::Registry,
  store::RegistryStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn content(nom: &str, prenom: &str) -> DeclarationContent {
  DeclarationContent {
    nom_enfant:       nom.into(),
    prenom_enfant:    prenom.into(),
    code_nuin:        format!("NUIN-{}", Uuid::new_v4().simple()),
    date_naissance:   NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
    sexe:             Sexe::Feminin,
    lieu_naissance:   "Libreville".into(),
    nom_pere:         "Obame".into(),
    prenom_pere:      "Jean".into(),
    profession_pere:  Some("Enseignant".into()),
    nationalite_pere: Some("Gabonaise".into()),
    nom_mere:         "Nze".into(),
    prenom_mere:      "Clarisse".into(),
    profession_mere:  None,
    nationalite_mere: Some("Gabonaise".into()),
    email_parent:     "parents@example.org".into(),
  }
}

fn pdf(tag: &str) -> Upload {
  Upload {
    file_name:  "acte.pdf".into(),
    media_type: "application/pdf".into(),
    data:       Bytes::from(format!("%PDF-1.7\n% {tag}\n")),
  }
}

fn with_mere() -> DocumentUploads {
  DocumentUploads {
    mere: Some(pdf("mere")),
    pere: None,
  }
}

fn with_both() -> DocumentUploads {
  DocumentUploads {
    mere: Some(pdf("mere")),
    pere: Some(pdf("pere")),
  }
}

struct Geo {
  province:       Province,
  commune:        Commune,
  arrondissement: Arrondissement,
}

async fn geo(s: &SqliteStore) -> Geo {
  let province = s.add_province("Estuaire".into()).await.unwrap();
  let commune = s
    .add_commune(province.province_id, "Libreville".into())
    .await
    .unwrap();
  let arrondissement = s
    .add_arrondissement(commune.commune_id, "1er arrondissement".into())
    .await
    .unwrap();
  Geo {
    province,
    commune,
    arrondissement,
  }
}

fn new_mairie(g: &Geo, nom: &str) -> NewMairie {
  NewMairie {
    nom:                 nom.into(),
    description_courte:  None,
    email:               "etat-civil@mairie.example.org".into(),
    telephone_principal: "+241 01 23 45 67".into(),
    adresse_complete:    "Boulevard Triomphal".into(),
    code_postal:         None,
    province_id:         g.province.province_id,
    commune_id:          g.commune.commune_id,
    arrondissement_id:   g.arrondissement.arrondissement_id,
  }
}

fn new_hopital(mairie_id: Uuid, nom: &str) -> NewHopital {
  NewHopital {
    nom:                 nom.into(),
    description_courte:  None,
    type_etablissement:  Some("CHU".into()),
    email:               "maternite@hopital.example.org".into(),
    telephone_principal: "+241 01 76 54 32".into(),
    adresse_complete:    "Avenue de l'Indépendance".into(),
    code_postal:         None,
    mairie_id,
  }
}

fn new_actor(role: Role, mairie_id: Option<Uuid>, hopital_id: Option<Uuid>) -> NewActor {
  NewActor {
    name: format!("{role} agent"),
    email: format!("{}@example.org", Uuid::new_v4().simple()),
    role,
    mairie_id,
    hopital_id,
    password_hash: "$argon2id$v=19$stub".into(),
  }
}

// ─── In-memory blob store ────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("blob store failure during {0}")]
struct BlobFailure(&'static str);

/// Blob store kept in memory, with injectable failures.
#[derive(Default)]
struct MemoryBlobs {
  live:         Mutex<HashMap<String, Bytes>>,
  staged:       Mutex<HashMap<String, Bytes>>,
  /// Successful `store` calls left before every further one fails.
  store_budget: Mutex<Option<usize>>,
  /// Successful `stage_removal` calls left before every further one fails.
  stage_budget: Mutex<Option<usize>>,
}

fn spend(budget: &Mutex<Option<usize>>) -> bool {
  let mut budget = budget.lock().unwrap();
  match budget.as_mut() {
    None => true,
    Some(0) => false,
    Some(n) => {
      *n -= 1;
      true
    }
  }
}

impl MemoryBlobs {
  fn live_count(&self) -> usize { self.live.lock().unwrap().len() }

  fn contains(&self, reference: &BlobRef) -> bool {
    self.live.lock().unwrap().contains_key(&reference.path)
  }

  fn fail_store_after(&self, n: usize) { *self.store_budget.lock().unwrap() = Some(n); }

  fn fail_stage_after(&self, n: usize) { *self.stage_budget.lock().unwrap() = Some(n); }
}

impl BlobStore for MemoryBlobs {
  type Error = BlobFailure;

  async fn store(
    &self,
    category: &'static str,
    media_type: MediaType,
    data: Bytes,
  ) -> Result<BlobRef, BlobFailure> {
    if !spend(&self.store_budget) {
      return Err(BlobFailure("store"));
    }
    let reference = BlobRef {
      path: format!("{category}/{}.{}", Uuid::new_v4(), media_type.extension()),
      content_hash: content_hash(&data),
      media_type,
      size: data.len() as u64,
    };
    self.live.lock().unwrap().insert(reference.path.clone(), data);
    Ok(reference)
  }

  async fn open(&self, reference: BlobRef) -> Result<Blob, BlobFailure> {
    let data = self
      .live
      .lock()
      .unwrap()
      .get(&reference.path)
      .cloned()
      .ok_or(BlobFailure("open"))?;
    Ok(Blob { reference, data })
  }

  async fn delete(&self, reference: BlobRef) -> Result<(), BlobFailure> {
    self.live.lock().unwrap().remove(&reference.path);
    Ok(())
  }

  async fn stage_removal(&self, reference: BlobRef) -> Result<StagedRemoval, BlobFailure> {
    if !spend(&self.stage_budget) {
      return Err(BlobFailure("stage"));
    }
    let data = self
      .live
      .lock()
      .unwrap()
      .remove(&reference.path)
      .ok_or(BlobFailure("stage"))?;
    let staged_path = format!("{}.removing", reference.path);
    self.staged.lock().unwrap().insert(staged_path.clone(), data);
    Ok(StagedRemoval {
      reference,
      staged_path,
    })
  }

  async fn commit_removal(&self, staged: StagedRemoval) -> Result<(), BlobFailure> {
    self.staged.lock().unwrap().remove(&staged.staged_path);
    Ok(())
  }

  async fn rollback_removal(&self, staged: StagedRemoval) -> Result<(), BlobFailure> {
    let data = self
      .staged
      .lock()
      .unwrap()
      .remove(&staged.staged_path)
      .ok_or(BlobFailure("rollback"))?;
    self
      .live
      .lock()
      .unwrap()
      .insert(staged.reference.path, data);
    Ok(())
  }
}

// ─── World ───────────────────────────────────────────────────────────────────

/// Two mairies, one hospital each, and agents on every side.
struct World {
  registry:      Registry<SqliteStore, MemoryBlobs>,
  blobs:         Arc<MemoryBlobs>,
  geo:           Geo,
  admin:         Actor,
  mairie:        Mairie,
  other_mairie:  Mairie,
  hopital:       Hopital,
  author:        Actor,
  colleague:     Actor,
  outsider:      Actor,
  agent:         Actor,
  foreign_agent: Actor,
}

async fn world() -> World {
  let s = Arc::new(store().await);
  let blobs = Arc::new(MemoryBlobs::default());
  let registry = Registry::new(Arc::clone(&s), Arc::clone(&blobs));
  let geo = geo(&s).await;

  let admin = registry
    .register_actor(new_actor(Role::Admin, None, None))
    .await
    .unwrap()
    .actor()
    .unwrap();

  let mairie = registry
    .create_mairie(&admin, new_mairie(&geo, "Mairie de Libreville"))
    .await
    .unwrap();
  let other_mairie = registry
    .create_mairie(&admin, new_mairie(&geo, "Mairie d'Owendo"))
    .await
    .unwrap();
  let hopital = registry
    .create_hopital(&admin, new_hopital(mairie.mairie_id, "CHU de Libreville"))
    .await
    .unwrap();
  let other_hopital = registry
    .create_hopital(&admin, new_hopital(other_mairie.mairie_id, "Hôpital d'Owendo"))
    .await
    .unwrap();

  let agent_in = |role: Role, mairie_id: Option<Uuid>, hopital_id: Option<Uuid>| {
    let registry = registry.clone();
    let admin = admin;
    async move {
      registry
        .create_actor(&admin, new_actor(role, mairie_id, hopital_id))
        .await
        .unwrap()
        .actor()
        .unwrap()
    }
  };

  let author = agent_in(Role::Hopital, None, Some(hopital.hopital_id)).await;
  let colleague = agent_in(Role::Hopital, None, Some(hopital.hopital_id)).await;
  let outsider = agent_in(Role::Hopital, None, Some(other_hopital.hopital_id)).await;
  let agent = agent_in(Role::Mairie, Some(mairie.mairie_id), None).await;
  let foreign_agent = agent_in(Role::Mairie, Some(other_mairie.mairie_id), None).await;

  World {
    registry,
    blobs,
    geo,
    admin,
    mairie,
    other_mairie,
    hopital,
    author,
    colleague,
    outsider,
    agent,
    foreign_agent,
  }
}
