//! Read-only geography lookups used to fill address forms.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/geo/provinces` | |
//! | `GET`  | `/geo/provinces/{id}/communes` | |
//! | `GET`  | `/geo/communes/{id}/arrondissements` | |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use registre_core::{
  blob::BlobStore,
  org::{Arrondissement, Commune, Province},
  service::Registry,
  store::RegistryStore,
};
use uuid::Uuid;

use crate::{CurrentActor, error::ApiError};

/// `GET /geo/provinces`
pub async fn provinces<S, B>(
  State(registry): State<Arc<Registry<S, B>>>,
  _: CurrentActor,
) -> Result<Json<Vec<Province>>, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  Ok(Json(registry.provinces().await?))
}

/// `GET /geo/provinces/{id}/communes`
pub async fn communes<S, B>(
  State(registry): State<Arc<Registry<S, B>>>,
  _: CurrentActor,
  Path(province_id): Path<Uuid>,
) -> Result<Json<Vec<Commune>>, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  Ok(Json(registry.communes(province_id).await?))
}

/// `GET /geo/communes/{id}/arrondissements`
pub async fn arrondissements<S, B>(
  State(registry): State<Arc<Registry<S, B>>>,
  _: CurrentActor,
  Path(commune_id): Path<Uuid>,
) -> Result<Json<Vec<Arrondissement>>, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  Ok(Json(registry.arrondissements(commune_id).await?))
}
