//! Error type for `registre-store-fs`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("io error on {path}: {source}")]
  Io {
    path:   String,
    #[source]
    source: std::io::Error,
  },

  /// A reference that would resolve outside the store root.
  #[error("invalid blob path: {0:?}")]
  InvalidPath(String),

  #[error("blob {path} does not match its reference")]
  Corrupt { path: String },
}

impl Error {
  pub(crate) fn io(path: impl Into<String>) -> impl FnOnce(std::io::Error) -> Self {
    let path = path.into();
    move |source| Self::Io { path, source }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
