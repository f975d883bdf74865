use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config;

#[derive(Debug, thiserror::Error)]
pub enum MediaStoreError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("invalid storage path: {0}")]
    InvalidPath(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage backend for asset bytes. Metadata lives in `media_assets`; this
/// trait only moves bytes. The filesystem store is the default backend; the
/// trait is the seam for an object store.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store bytes under a new storage path derived from `file_name`; returns
    /// the relative path to record in the asset row.
    async fn put(&self, file_name: &str, bytes: &[u8]) -> Result<String, MediaStoreError>;

    async fn get(&self, storage_path: &str) -> Result<Vec<u8>, MediaStoreError>;

    async fn delete(&self, storage_path: &str) -> Result<(), MediaStoreError>;
}

/// Filesystem-backed store rooted at `config.media.root`.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config() -> Self {
        Self::new(&config::config().media.root)
    }

    fn resolve(&self, storage_path: &str) -> Result<PathBuf, MediaStoreError> {
        // Relative, normal components only; no escaping the root
        let rel = Path::new(storage_path);
        if rel.is_absolute()
            || rel
                .components()
                .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(MediaStoreError::InvalidPath(storage_path.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl MediaStore for FsStore {
    async fn put(&self, file_name: &str, bytes: &[u8]) -> Result<String, MediaStoreError> {
        // Unique prefix avoids collisions between same-named uploads
        let safe_name = sanitize_file_name(file_name);
        let storage_path = format!("{}/{}", Uuid::new_v4().simple(), safe_name);

        let full = self.resolve(&storage_path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full, bytes).await?;
        Ok(storage_path)
    }

    async fn get(&self, storage_path: &str) -> Result<Vec<u8>, MediaStoreError> {
        let full = self.resolve(storage_path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(MediaStoreError::NotFound(storage_path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, storage_path: &str) -> Result<(), MediaStoreError> {
        let full = self.resolve(storage_path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_file_names() {
        assert_eq!(sanitize_file_name("brake pad.png"), "brake_pad.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[test]
    fn rejects_escaping_paths() {
        let store = FsStore::new("/tmp/protek-media");
        assert!(store.resolve("../outside").is_err());
        assert!(store.resolve("/absolute").is_err());
        assert!(store.resolve("ab12/file.png").is_ok());
    }

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let dir = std::env::temp_dir().join(format!("protek-media-{}", Uuid::new_v4().simple()));
        let store = FsStore::new(&dir);

        let path = store.put("logo.png", b"png-bytes").await.unwrap();
        assert_eq!(store.get(&path).await.unwrap(), b"png-bytes");

        store.delete(&path).await.unwrap();
        assert!(matches!(
            store.get(&path).await,
            Err(MediaStoreError::NotFound(_))
        ));

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
