//! [`FsBlobStore`]: documents kept as files under a root directory.

use std::{
  io::ErrorKind,
  path::{Component, Path, PathBuf},
};

use bytes::Bytes;
use registre_core::blob::{Blob, BlobRef, BlobStore, MediaType, StagedRemoval, content_hash};
use tracing::debug;
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct FsBlobStore {
  root: PathBuf,
}

impl FsBlobStore {
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  pub fn root(&self) -> &Path { &self.root }

  /// Absolute location of a store-relative path. Only plain relative
  /// components are accepted.
  fn resolve(&self, relative: &str) -> Result<PathBuf> {
    let path = Path::new(relative);
    let plain = path
      .components()
      .all(|c| matches!(c, Component::Normal(_)));
    if relative.is_empty() || !plain {
      return Err(Error::InvalidPath(relative.to_owned()));
    }
    Ok(self.root.join(path))
  }
}

impl BlobStore for FsBlobStore {
  type Error = Error;

  async fn store(
    &self,
    category: &'static str,
    media_type: MediaType,
    data: Bytes,
  ) -> Result<BlobRef> {
    let relative = format!("{category}/{}.{}", Uuid::new_v4(), media_type.extension());
    let target = self.resolve(&relative)?;
    let dir = self.resolve(category)?;
    tokio::fs::create_dir_all(&dir)
      .await
      .map_err(Error::io(category))?;

    let tmp = dir.join(format!(".{}.part", Uuid::new_v4()));
    if let Err(e) = tokio::fs::write(&tmp, &data).await {
      let _ = tokio::fs::remove_file(&tmp).await;
      return Err(Error::io(relative)(e));
    }
    if let Err(e) = tokio::fs::rename(&tmp, &target).await {
      let _ = tokio::fs::remove_file(&tmp).await;
      return Err(Error::io(relative)(e));
    }

    debug!(path = %relative, size = data.len(), "blob stored");
    Ok(BlobRef {
      content_hash: content_hash(&data),
      size: data.len() as u64,
      path: relative,
      media_type,
    })
  }

  async fn open(&self, reference: BlobRef) -> Result<Blob> {
    let path = self.resolve(&reference.path)?;
    let data = tokio::fs::read(&path)
      .await
      .map_err(Error::io(reference.path.clone()))?;
    if data.len() as u64 != reference.size || content_hash(&data) != reference.content_hash {
      return Err(Error::Corrupt {
        path: reference.path,
      });
    }
    Ok(Blob {
      reference,
      data: Bytes::from(data),
    })
  }

  /// Missing files count as already deleted.
  async fn delete(&self, reference: BlobRef) -> Result<()> {
    let path = self.resolve(&reference.path)?;
    match tokio::fs::remove_file(&path).await {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(Error::io(reference.path)(e)),
    }
  }

  async fn stage_removal(&self, reference: BlobRef) -> Result<StagedRemoval> {
    let from = self.resolve(&reference.path)?;
    let staged_path = format!("{}.removing-{}", reference.path, Uuid::new_v4().simple());
    let to = self.resolve(&staged_path)?;
    tokio::fs::rename(&from, &to)
      .await
      .map_err(Error::io(reference.path.clone()))?;
    Ok(StagedRemoval {
      reference,
      staged_path,
    })
  }

  async fn commit_removal(&self, staged: StagedRemoval) -> Result<()> {
    let path = self.resolve(&staged.staged_path)?;
    match tokio::fs::remove_file(&path).await {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(Error::io(staged.staged_path)(e)),
    }
  }

  async fn rollback_removal(&self, staged: StagedRemoval) -> Result<()> {
    let from = self.resolve(&staged.staged_path)?;
    let to = self.resolve(&staged.reference.path)?;
    tokio::fs::rename(&from, &to)
      .await
      .map_err(Error::io(staged.staged_path))
  }
}

#[cfg(test)]
mod tests {
  use registre_core::blob::DOCUMENTS;

  use super::*;

  const PDF: &[u8] = b"%PDF-1.7\n% acte\n";

  /// A store under a fresh temp directory, removed on drop.
  struct TempStore(FsBlobStore);

  impl std::ops::Deref for TempStore {
    type Target = FsBlobStore;
    fn deref(&self) -> &FsBlobStore { &self.0 }
  }

  impl Drop for TempStore {
    fn drop(&mut self) { let _ = std::fs::remove_dir_all(self.0.root()); }
  }

  fn store() -> TempStore {
    let root = std::env::temp_dir().join(format!("registre-blobs-{}", Uuid::new_v4()));
    TempStore(FsBlobStore::new(root))
  }

  async fn put(s: &FsBlobStore) -> BlobRef {
    s.store(DOCUMENTS, MediaType::Pdf, Bytes::from_static(PDF))
      .await
      .unwrap()
  }

  #[tokio::test]
  async fn store_then_open() {
    let s = store();
    let r = put(&s).await;
    assert!(r.path.starts_with("documents/"));
    assert!(r.path.ends_with(".pdf"));
    assert_eq!(r.size, PDF.len() as u64);

    let blob = s.open(r.clone()).await.unwrap();
    assert_eq!(&blob.data[..], PDF);

    let leftovers: Vec<_> = std::fs::read_dir(s.root().join(DOCUMENTS))
      .unwrap()
      .filter_map(|e| e.ok())
      .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
      .collect();
    assert!(leftovers.is_empty());
  }

  #[tokio::test]
  async fn tampered_content_detected() {
    let s = store();
    let r = put(&s).await;
    std::fs::write(s.root().join(&r.path), b"%PDF-1.7\n% autre\n").unwrap();
    assert!(matches!(s.open(r).await, Err(Error::Corrupt { .. })));
  }

  #[tokio::test]
  async fn traversal_rejected() {
    let s = store();
    let mut r = put(&s).await;
    r.path = "../../etc/passwd".into();
    assert!(matches!(s.open(r.clone()).await, Err(Error::InvalidPath(_))));
    r.path = "/etc/passwd".into();
    assert!(matches!(s.delete(r).await, Err(Error::InvalidPath(_))));
  }

  #[tokio::test]
  async fn staged_removal_can_be_undone() {
    let s = store();
    let r = put(&s).await;

    let staged = s.stage_removal(r.clone()).await.unwrap();
    assert!(s.open(r.clone()).await.is_err());
    s.rollback_removal(staged).await.unwrap();
    assert!(s.open(r.clone()).await.is_ok());

    let staged = s.stage_removal(r.clone()).await.unwrap();
    let staged_file = s.root().join(&staged.staged_path);
    s.commit_removal(staged).await.unwrap();
    assert!(!staged_file.exists());
    assert!(s.open(r).await.is_err());
  }

  #[tokio::test]
  async fn delete_is_idempotent() {
    let s = store();
    let r = put(&s).await;
    s.delete(r.clone()).await.unwrap();
    s.delete(r).await.unwrap();
  }

  #[tokio::test]
  async fn test_directory_is_removed_on_drop() {
    let s = store();
    put(&s).await;
    let root = s.root().to_path_buf();
    assert!(root.exists());
    drop(s);
    assert!(!root.exists());
  }
}
