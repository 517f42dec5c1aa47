//! HTTP server assembly for the birth-declaration registry.
//!
//! Wraps the JSON API from `registre-api` with Basic authentication and
//! request tracing.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware};
use registre_core::{blob::BlobStore, service::Registry, store::RegistryStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  /// SQLite database file.
  pub store_path: PathBuf,
  /// Directory holding uploaded birth certificates.
  pub blob_dir:   PathBuf,
}

// ─── Application state ────────────────────────────────────────────────────────

pub struct AppState<S, B> {
  pub registry: Arc<Registry<S, B>>,
}

impl<S, B> Clone for AppState<S, B> {
  fn clone(&self) -> Self {
    Self {
      registry: Arc::clone(&self.registry),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API under `/api`, behind Basic authentication.
pub fn router<S, B>(state: AppState<S, B>) -> Router
where
  S: RegistryStore + 'static,
  B: BlobStore + 'static,
{
  let api = registre_api::api_router(Arc::clone(&state.registry))
    .layer(middleware::from_fn_with_state(state, auth::require_actor::<S, B>));

  Router::new()
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}
