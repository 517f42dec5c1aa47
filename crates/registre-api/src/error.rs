//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use registre_core::Error;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No authenticated actor on the request.
  #[error("authentication required")]
  Unauthenticated,

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The body is not the expected JSON; `status` comes from the rejection.
  #[error("invalid body: {message}")]
  Body { status: StatusCode, message: String },

  #[error("internal error: {0}")]
  Internal(String),

  #[error(transparent)]
  Registry(#[from] Error),
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::Body {
      status:  rejection.status(),
      message: rejection.body_text(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let registry = match self {
      ApiError::Unauthenticated => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "authentication required" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"registre\""),
        );
        return res;
      }
      ApiError::BadRequest(m) => {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response();
      }
      ApiError::Body { status, message } => {
        return (status, Json(json!({ "error": message }))).into_response();
      }
      ApiError::Internal(m) => {
        error!(error = %m, "internal error");
        return (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": "internal error" })),
        )
          .into_response();
      }
      ApiError::Registry(e) => e,
    };

    let status = match &registry {
      Error::Unauthorized => StatusCode::FORBIDDEN,
      Error::InvalidTransition { .. } | Error::Conflict(_) => StatusCode::CONFLICT,
      Error::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
      e if e.is_not_found() => StatusCode::NOT_FOUND,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = match registry {
      Error::ValidationFailed(fields) => json!({
        "error": "validation failed",
        "fields": fields,
      }),
      Error::InvalidTransition { status, action } => json!({
        "error": format!("cannot {action} a declaration that is {status}"),
        "status": status,
      }),
      Error::Storage(e) => {
        error!(error = %e, "storage failure");
        json!({ "error": "storage failure" })
      }
      other => json!({ "error": other.to_string() }),
    };
    (status, Json(body)).into_response()
  }
}
