//! Filesystem-backed media storage.

use crate::{MediaStorage, MediaType, StoredObject};
use sha2::{Digest, Sha256};
use std::path::{Component, Path, PathBuf};
use storybook_error::{StorageError, StorageErrorKind, StorybookResult};

/// Stores objects as files under a root directory and serves them from a
/// public base URL that maps onto the same layout.
///
/// ```text
/// {root}/
/// └── {storybook_id}/
///     ├── 1.png
///     └── 2.png
/// ```
///
/// Writes go to a temp file that is renamed into place, so readers never
/// see a partially written object.
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    root: PathBuf,
    public_base_url: String,
}

impl FileSystemStorage {
    /// Create a storage backend rooted at `root`, creating the directory
    /// if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    #[tracing::instrument(skip(root, public_base_url))]
    pub fn new(
        root: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
    ) -> StorybookResult<Self> {
        let root = root.into();

        std::fs::create_dir_all(&root).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;

        tracing::info!(path = %root.display(), "Created filesystem storage");
        Ok(Self {
            root,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn compute_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    /// Resolve an object path under the root, rejecting anything that
    /// could escape it.
    fn resolve(&self, path: &str) -> StorybookResult<PathBuf> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(StorageError::new(StorageErrorKind::InvalidPath(path.to_string())).into());
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl MediaStorage for FileSystemStorage {
    #[tracing::instrument(skip(self, data), fields(size = data.len(), media_type = %media_type))]
    async fn put(
        &self,
        path: &str,
        data: &[u8],
        media_type: MediaType,
    ) -> StorybookResult<StoredObject> {
        let object_path = format!("{}.{}", path, media_type.extension());
        let target = self.resolve(&object_path)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let temp_path = target.with_extension("tmp");
        tokio::fs::write(&temp_path, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        tokio::fs::rename(&temp_path, &target).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                target.display(),
                e
            )))
        })?;

        let content_hash = Self::compute_hash(data);
        tracing::info!(
            hash = %content_hash,
            path = %target.display(),
            size = data.len(),
            "Stored media file"
        );

        Ok(StoredObject {
            url: self.public_url(&object_path),
            path: object_path,
            size_bytes: data.len() as u64,
            content_hash,
            mime_type: media_type.mime_type().to_string(),
        })
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, path: &str) -> StorybookResult<Vec<u8>> {
        let target = self.resolve(path)?;
        let data = tokio::fs::read(&target).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(path.to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    target.display(),
                    e
                )))
            }
        })?;
        tracing::debug!(size = data.len(), "Read media file");
        Ok(data)
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url, path.trim_start_matches('/'))
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, path: &str) -> StorybookResult<()> {
        let target = self.resolve(path)?;
        tokio::fs::remove_file(&target).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(path.to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileWrite(format!(
                    "delete {}: {}",
                    target.display(),
                    e
                )))
            }
        })?;
        tracing::info!(path = %target.display(), "Deleted media file");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn exists(&self, path: &str) -> StorybookResult<bool> {
        let target = self.resolve(path)?;
        Ok(tokio::fs::try_exists(&target).await.unwrap_or(false))
    }
}
