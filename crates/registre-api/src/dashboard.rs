//! `GET /dashboard`: the caller's role-specific summary.

use std::sync::Arc;

use axum::{Json, extract::State};
use registre_core::{
  blob::BlobStore,
  service::{Dashboard, Registry},
  store::RegistryStore,
};

use crate::{CurrentActor, error::ApiError};

pub async fn handler<S, B>(
  State(registry): State<Arc<Registry<S, B>>>,
  CurrentActor(actor): CurrentActor,
) -> Result<Json<Dashboard>, ApiError>
where
  S: RegistryStore,
  B: BlobStore,
{
  Ok(Json(registry.dashboard(&actor).await?))
}
