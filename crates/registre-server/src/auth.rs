//! HTTP Basic authentication of registry users.
//!
//! The user name is the actor's e-mail address; the password is checked
//! against the stored argon2 hash. On success the resolved [`Actor`] is
//! inserted into the request extensions for the API layer to pick up.

use axum::{
  extract::{Request, State},
  http::HeaderMap,
  middleware::Next,
  response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use registre_api::password::verify_password;
use registre_core::{actor::Actor, blob::BlobStore, store::RegistryStore};
use tracing::{debug, warn};

use crate::{AppState, error::Error};

/// Decoded `Authorization: Basic` credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
  pub email:    String,
  pub password: String,
}

pub fn parse_basic(headers: &HeaderMap) -> Result<Credentials, Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded.trim()).map_err(|_| Error::Unauthorized)?;
  let creds = String::from_utf8(decoded).map_err(|_| Error::Unauthorized)?;

  let (email, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;
  if email.is_empty() {
    return Err(Error::Unauthorized);
  }
  Ok(Credentials {
    email:    email.to_owned(),
    password: password.to_owned(),
  })
}

/// Resolve the request's credentials to an [`Actor`].
pub async fn authenticate<S, B>(state: &AppState<S, B>, headers: &HeaderMap) -> Result<Actor, Error>
where
  S: RegistryStore,
  B: BlobStore,
{
  let creds = parse_basic(headers)?;
  let record = state
    .registry
    .store()
    .find_actor_by_email(creds.email.clone())
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;

  let Some(record) = record else {
    debug!(email = %creds.email, "unknown user");
    return Err(Error::Unauthorized);
  };
  if !verify_password(&creds.password, &record.password_hash) {
    debug!(email = %creds.email, "wrong password");
    return Err(Error::Unauthorized);
  }
  record.actor().map_err(|e| {
    warn!(actor_id = %record.actor_id, error = %e, "account has an invalid affiliation");
    Error::Unauthorized
  })
}

/// Middleware: reject unauthenticated requests, otherwise attach the
/// [`Actor`] as a request extension.
pub async fn require_actor<S, B>(
  State(state): State<AppState<S, B>>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error>
where
  S: RegistryStore + 'static,
  B: BlobStore + 'static,
{
  let actor = authenticate(&state, req.headers()).await?;
  req.extensions_mut().insert(actor);
  Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
  use axum::http::{HeaderValue, header};

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  #[test]
  fn basic_credentials_are_decoded() {
    let value = format!("Basic {}", B64.encode("agent@example.org:pa:ss"));
    let creds = parse_basic(&headers(&value)).unwrap();
    assert_eq!(creds.email, "agent@example.org");
    assert_eq!(creds.password, "pa:ss");
  }

  #[test]
  fn malformed_headers_are_rejected() {
    assert!(parse_basic(&HeaderMap::new()).is_err());
    assert!(parse_basic(&headers("Bearer abc")).is_err());
    assert!(parse_basic(&headers("Basic !!!")).is_err());
    let no_colon = format!("Basic {}", B64.encode("agent@example.org"));
    assert!(parse_basic(&headers(&no_colon)).is_err());
    let no_user = format!("Basic {}", B64.encode(":secret"));
    assert!(parse_basic(&headers(&no_user)).is_err());
  }
}
