//! Blob storage for pet and behavior photos

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use crate::types::{PawError, Result, ResultExt};

/// Binary object storage addressed by slash-separated paths
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `path`, returning a URL for later retrieval
    fn upload(&self, path: &str, bytes: &[u8]) -> Result<String>;

    /// Remove the blob behind `url`. A missing blob is not an error.
    fn delete(&self, url: &str) -> Result<()>;
}

pub type SharedBlobStore = Arc<dyn BlobStore>;

/// Blob store rooted at a local directory, handing out `file://` URLs
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(root)
        };
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a blob path below the root, rejecting escapes
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));

        if !safe {
            return Err(PawError::Storage(format!("Invalid blob path: {}", path)));
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for LocalBlobStore {
    fn upload(&self, path: &str, bytes: &[u8]) -> Result<String> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context_fn(|| format!("Failed to create blob directory for {}", path))?;
        }
        std::fs::write(&target, bytes)
            .with_context_fn(|| format!("Failed to write blob {}", path))?;

        let url = Url::from_file_path(&target).map_err(|_| {
            PawError::Storage(format!("Blob path is not absolute: {}", target.display()))
        })?;

        debug!(path, size = bytes.len(), "Stored blob");
        Ok(url.to_string())
    }

    fn delete(&self, url: &str) -> Result<()> {
        let parsed = Url::parse(url).with_context_fn(|| format!("Invalid blob URL {}", url))?;
        let target = parsed
            .to_file_path()
            .map_err(|_| PawError::Storage(format!("Not a local blob URL: {}", url)))?;

        if !target.starts_with(&self.root) {
            return Err(PawError::Storage(format!(
                "Blob URL outside store root: {}",
                url
            )));
        }

        match std::fs::remove_file(&target) {
            Ok(()) => {
                debug!(url, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(url, "Blob already missing, nothing to delete");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();

        let url = store
            .upload("users/u1/pets/p1/photo.png", &[1, 2, 3])
            .unwrap();
        assert!(url.starts_with("file://"));

        let on_disk = dir.path().join("users/u1/pets/p1/photo.png");
        assert_eq!(std::fs::read(&on_disk).unwrap(), vec![1, 2, 3]);

        store.delete(&url).unwrap();
        assert!(!on_disk.exists());
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();

        let url = store.upload("a/b.jpg", b"x").unwrap();
        store.delete(&url).unwrap();
        store.delete(&url).unwrap();
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();

        assert!(store.upload("../outside.png", b"x").is_err());
        assert!(store.upload("/etc/passwd", b"x").is_err());
        assert!(store.upload("", b"x").is_err());
    }

    #[test]
    fn test_rejects_foreign_urls() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path()).unwrap();

        assert!(store.delete("https://example.com/a.png").is_err());
        assert!(store.delete("file:///tmp/elsewhere/a.png").is_err());
    }
}
