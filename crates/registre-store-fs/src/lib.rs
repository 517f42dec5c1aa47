//! Filesystem backend for declaration documents.
//!
//! Blobs live under a root directory as `<category>/<uuid>.<ext>`. Writes go
//! to a hidden temporary file first and are renamed into place, so a reader
//! never sees a partial document.

mod error;
mod store;

pub use error::{Error, Result};
pub use store::FsBlobStore;
