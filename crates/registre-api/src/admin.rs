//! Administrator endpoints: mairies, hospitals and user accounts.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/admin/mairies` | |
//! | `POST`  | `/admin/mairies` | 201 |
//! | `GET`   | `/admin/hopitaux` | Optional `?mairie_id=` |
//! | `POST`  | `/admin/hopitaux` | 201 |
//! | `PATCH` | `/admin/hopitaux/{id}` | Body: `{"mairie_id":"…"}` |
//! | `GET`   | `/admin/actors` | |
//! | `POST`  | `/admin/actors` | Plain password in, argon2 hash stored; 201 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use registre_core::{
  ValidationErrors,
  actor::{ActorRecord, NewActor, Role},
  blob::BlobStore,
  org::{Hopital, Mairie, NewHopital, NewMairie},
  service::Registry,
  store::RegistryStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{CurrentActor, JsonBody, error::ApiError, password::hash_password};

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 8;

type Reg<S, B> = State<Arc<Registry<S, B>>>;

// ─── Mairies ─────────────────────────────────────────────────────────────────

/// `GET /admin/mairies`
pub async fn list_mairies<S, B>(
  State(registry): Reg<S, B>,
  CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<Mairie>>, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  Ok(Json(registry.list_mairies(&actor).await?))
}

/// `POST /admin/mairies`
pub async fn create_mairie<S, B>(
  State(registry): Reg<S, B>,
  CurrentActor(actor): CurrentActor,
  JsonBody(body): JsonBody<NewMairie>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  let mairie = registry.create_mairie(&actor, body).await?;
  Ok((StatusCode::CREATED, Json(mairie)))
}

// ─── Hospitals ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HopitauxParams {
  pub mairie_id: Option<Uuid>,
}

/// `GET /admin/hopitaux[?mairie_id=<uuid>]`
pub async fn list_hopitaux<S, B>(
  State(registry): Reg<S, B>,
  CurrentActor(actor): CurrentActor,
  Query(params): Query<HopitauxParams>,
) -> Result<Json<Vec<Hopital>>, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  Ok(Json(registry.list_hopitaux(&actor, params.mairie_id).await?))
}

/// `POST /admin/hopitaux`
pub async fn create_hopital<S, B>(
  State(registry): Reg<S, B>,
  CurrentActor(actor): CurrentActor,
  JsonBody(body): JsonBody<NewHopital>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  let hopital = registry.create_hopital(&actor, body).await?;
  Ok((StatusCode::CREATED, Json(hopital)))
}

#[derive(Debug, Deserialize)]
pub struct ReassignBody {
  pub mairie_id: Uuid,
}

/// `PATCH /admin/hopitaux/{id}`
pub async fn reassign_hopital<S, B>(
  State(registry): Reg<S, B>,
  CurrentActor(actor): CurrentActor,
  Path(hopital_id): Path<Uuid>,
  JsonBody(body): JsonBody<ReassignBody>,
) -> Result<Json<Hopital>, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  Ok(Json(
    registry
      .reassign_hopital(&actor, hopital_id, body.mairie_id)
      .await?,
  ))
}

// ─── Actors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateActorBody {
  pub name:       String,
  pub email:      String,
  pub role:       Role,
  pub mairie_id:  Option<Uuid>,
  pub hopital_id: Option<Uuid>,
  pub password:   String,
}

/// `GET /admin/actors`
pub async fn list_actors<S, B>(
  State(registry): Reg<S, B>,
  CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<ActorRecord>>, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  Ok(Json(registry.list_actors(&actor).await?))
}

/// `POST /admin/actors`
pub async fn create_actor<S, B>(
  State(registry): Reg<S, B>,
  CurrentActor(actor): CurrentActor,
  JsonBody(body): JsonBody<CreateActorBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  if !actor.is_admin() {
    return Err(registre_core::Error::Unauthorized.into());
  }
  if body.password.chars().count() < MIN_PASSWORD_LEN {
    let errors = ValidationErrors::single(
      "password",
      format!("must be at least {MIN_PASSWORD_LEN} characters"),
    );
    errors.into_result()?;
  }
  let password_hash = hash_password(&body.password)
    .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))?;

  let record = registry
    .create_actor(
      &actor,
      NewActor {
        name: body.name,
        email: body.email,
        role: body.role,
        mairie_id: body.mairie_id,
        hopital_id: body.hopital_id,
        password_hash,
      },
    )
    .await?;
  Ok((StatusCode::CREATED, Json(record)))
}
