//! Document blobs (parents' birth certificates) and the `BlobStore` trait.
//!
//! No binary data lives in the persistence store; a declaration only holds a
//! [`BlobRef`]. Removal is two-phase so that a declaration and all of its
//! blobs disappear together or not at all.

use std::future::Future;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Upper bound for a single uploaded document (2048 KiB).
pub const MAX_DOCUMENT_BYTES: usize = 2 * 1024 * 1024;

/// Category under which declaration documents are stored.
pub const DOCUMENTS: &str = "documents";

// ─── Media types ─────────────────────────────────────────────────────────────

/// The accepted document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaType {
  #[serde(rename = "application/pdf")]
  Pdf,
  #[serde(rename = "image/jpeg")]
  Jpeg,
  #[serde(rename = "image/png")]
  Png,
}

impl MediaType {
  pub fn from_mime(mime: &str) -> Option<Self> {
    match mime.trim().to_ascii_lowercase().as_str() {
      "application/pdf" => Some(Self::Pdf),
      "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
      "image/png" => Some(Self::Png),
      _ => None,
    }
  }

  pub fn mime(self) -> &'static str {
    match self {
      Self::Pdf => "application/pdf",
      Self::Jpeg => "image/jpeg",
      Self::Png => "image/png",
    }
  }

  pub fn extension(self) -> &'static str {
    match self {
      Self::Pdf => "pdf",
      Self::Jpeg => "jpg",
      Self::Png => "png",
    }
  }

  /// Whether `data` starts with this format's signature.
  pub fn matches(self, data: &[u8]) -> bool {
    match self {
      Self::Pdf => data.starts_with(b"%PDF-"),
      Self::Jpeg => data.starts_with(&[0xFF, 0xD8, 0xFF]),
      Self::Png => data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
    }
  }
}

// ─── Upload ──────────────────────────────────────────────────────────────────

/// A document as received from a client, before any checks.
#[derive(Debug, Clone)]
pub struct Upload {
  pub file_name:  String,
  /// Media type declared by the client.
  pub media_type: String,
  pub data:       Bytes,
}

impl Upload {
  /// Check size and format; the message is suitable for a field error.
  pub fn check(&self) -> Result<MediaType, String> {
    if self.data.is_empty() {
      return Err("file is empty".into());
    }
    if self.data.len() > MAX_DOCUMENT_BYTES {
      return Err(format!(
        "must not exceed {} KiB",
        MAX_DOCUMENT_BYTES / 1024
      ));
    }
    let media_type = MediaType::from_mime(&self.media_type)
      .ok_or_else(|| "must be a PDF, JPEG or PNG file".to_string())?;
    if !media_type.matches(&self.data) {
      return Err(format!("content is not a valid {}", media_type.mime()));
    }
    Ok(media_type)
  }
}

// ─── References ──────────────────────────────────────────────────────────────

/// Pointer from a declaration to a stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
  /// Path relative to the blob store root, e.g. `documents/<uuid>.pdf`.
  pub path:         String,
  /// SHA-256 hex digest of the content.
  pub content_hash: String,
  pub media_type:   MediaType,
  pub size:         u64,
}

/// A document read back from the blob store.
#[derive(Debug, Clone)]
pub struct Blob {
  pub reference: BlobRef,
  pub data:      Bytes,
}

/// A removal that has been prepared but not yet made permanent.
#[derive(Debug, Clone)]
pub struct StagedRemoval {
  pub reference:   BlobRef,
  /// Backend-specific location of the set-aside content.
  pub staged_path: String,
}

pub fn content_hash(data: &[u8]) -> String { hex::encode(Sha256::digest(data)) }

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over document storage.
///
/// `store` must be complete (or fail with nothing left behind) before it
/// returns. `stage_removal` makes a blob unavailable but recoverable;
/// `commit_removal` and `rollback_removal` finish or undo it.
pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn store(
    &self,
    category: &'static str,
    media_type: MediaType,
    data: Bytes,
  ) -> impl Future<Output = Result<BlobRef, Self::Error>> + Send + '_;

  fn open(
    &self,
    reference: BlobRef,
  ) -> impl Future<Output = Result<Blob, Self::Error>> + Send + '_;

  fn delete(
    &self,
    reference: BlobRef,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn stage_removal(
    &self,
    reference: BlobRef,
  ) -> impl Future<Output = Result<StagedRemoval, Self::Error>> + Send + '_;

  fn commit_removal(
    &self,
    staged: StagedRemoval,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn rollback_removal(
    &self,
    staged: StagedRemoval,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use super::*;

  const PDF: &[u8] = b"%PDF-1.7\n%fake";

  fn upload(media_type: &str, data: &[u8]) -> Upload {
    Upload {
      file_name:  "acte.pdf".into(),
      media_type: media_type.into(),
      data:       Bytes::copy_from_slice(data),
    }
  }

  #[test]
  fn accepts_pdf() {
    assert_eq!(upload("application/pdf", PDF).check().unwrap(), MediaType::Pdf);
  }

  #[test]
  fn jpg_alias_accepted() {
    let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00];
    assert_eq!(upload("image/jpg", &jpeg).check().unwrap(), MediaType::Jpeg);
  }

  #[test]
  fn rejects_other_types() {
    assert!(upload("text/plain", b"hello").check().is_err());
  }

  #[test]
  fn rejects_mismatched_content() {
    assert!(upload("image/png", PDF).check().is_err());
  }

  #[test]
  fn rejects_oversized() {
    let mut data = PDF.to_vec();
    data.resize(MAX_DOCUMENT_BYTES + 1, b' ');
    let err = upload("application/pdf", &data).check().unwrap_err();
    assert!(err.contains("2048"));
  }

  #[test]
  fn exactly_max_size_is_fine() {
    let mut data = PDF.to_vec();
    data.resize(MAX_DOCUMENT_BYTES, b' ');
    assert!(upload("application/pdf", &data).check().is_ok());
  }

  #[test]
  fn hash_is_hex_sha256() {
    assert_eq!(
      content_hash(b""),
      "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
  }
}
