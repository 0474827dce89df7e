//! A filesystem store.

use thiserror::Error;
use walkdir::WalkDir;

use crate::storage::{
    AsyncListableStorageTraits, AsyncReadableStorageTraits, AsyncWritableStorageTraits, Bytes,
    MaybeBytes, StorageError, StoreKey, StoreKeys, StorePrefix,
};

use std::path::{Path, PathBuf};

/// An asynchronous filesystem store.
///
/// Store keys map directly to paths under the base directory. Writes create
/// missing parent directories.
#[derive(Debug)]
pub struct FilesystemStore {
    base_path: PathBuf,
    readonly: bool,
}

impl FilesystemStore {
    /// Create a new filesystem store at a given `base_path`.
    ///
    /// # Errors
    /// Returns a [`FilesystemStoreCreateError`] if `base_path`
    ///  - is not valid UTF-8, or
    ///  - points to an existing file rather than a directory.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, FilesystemStoreCreateError> {
        let base_path = base_path.as_ref().to_path_buf();
        if base_path.to_str().is_none() {
            return Err(FilesystemStoreCreateError::InvalidBasePath(base_path));
        }

        let readonly = if base_path.exists() {
            if base_path.is_file() {
                return Err(FilesystemStoreCreateError::BasePathIsFile(base_path));
            }
            base_path.metadata()?.permissions().readonly()
        } else {
            false
        };

        Ok(Self {
            base_path,
            readonly,
        })
    }

    /// Maps a [`StoreKey`] to a filesystem [`PathBuf`].
    #[must_use]
    pub fn key_to_fspath(&self, key: &StoreKey) -> PathBuf {
        let mut path = self.base_path.clone();
        if !key.as_str().is_empty() {
            path.push(key.as_str());
        }
        path
    }

    fn fspath_to_key(&self, path: &Path) -> Result<StoreKey, StorageError> {
        let relative = path
            .strip_prefix(&self.base_path)
            .map_err(|err| StorageError::Other(err.to_string()))?;
        let components: Vec<&str> = relative
            .components()
            .map(|component| component.as_os_str().to_str().unwrap_or_default())
            .collect();
        Ok(StoreKey::new(components.join("/"))?)
    }
}

#[async_trait::async_trait]
impl AsyncReadableStorageTraits for FilesystemStore {
    async fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        match tokio::fs::read(self.key_to_fspath(key)).await {
            Ok(bytes) => Ok(Some(bytes.into())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        match tokio::fs::metadata(self.key_to_fspath(key)).await {
            Ok(metadata) if metadata.is_file() => Ok(Some(metadata.len())),
            Ok(_) => Ok(None),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait::async_trait]
impl AsyncWritableStorageTraits for FilesystemStore {
    async fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        if self.readonly {
            return Err(StorageError::ReadOnly);
        }
        let path = self.key_to_fspath(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tracing::trace!(key = key.as_str(), len = value.len(), "filesystem set");
        tokio::fs::write(path, value).await?;
        Ok(())
    }

    async fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        if self.readonly {
            return Err(StorageError::ReadOnly);
        }
        match tokio::fs::remove_file(self.key_to_fspath(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait::async_trait]
impl AsyncListableStorageTraits for FilesystemStore {
    async fn list_prefix(&self, prefix: &StorePrefix) -> Result<StoreKeys, StorageError> {
        let base = self.base_path.join(prefix.as_str());
        if !base.exists() {
            return Ok(vec![]);
        }
        let mut keys: StoreKeys = WalkDir::new(&base)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| self.fspath_to_key(entry.path()))
            .collect::<Result<_, _>>()?;
        keys.sort();
        Ok(keys)
    }
}

/// A filesystem store creation error.
#[derive(Debug, Error)]
pub enum FilesystemStoreCreateError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// The base path is not valid.
    #[error("base path {0} is not valid")]
    InvalidBasePath(PathBuf),
    /// The base path is an existing file.
    #[error("base path {0} is an existing file")]
    BasePathIsFile(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn filesystem_store() -> Result<(), Box<dyn std::error::Error>> {
        let path = tempfile::TempDir::new()?;
        let store = FilesystemStore::new(path.path())?;
        let key = StoreKey::new("a/b")?;
        assert_eq!(store.get(&key).await?, None);
        store.set(&key, vec![0u8, 1, 2].into()).await?;
        assert!(store.exists(&key).await?);
        assert_eq!(store.get(&key).await?, Some(vec![0u8, 1, 2].into()));
        store.set(&StoreKey::new("a/c/d")?, vec![3u8].into()).await?;
        let keys = store.list_prefix(&StorePrefix::new("a/")?).await?;
        assert_eq!(
            keys,
            vec![StoreKey::new("a/b")?, StoreKey::new("a/c/d")?]
        );
        store.erase(&key).await?;
        assert!(!store.exists(&key).await?);
        store.erase(&key).await?;
        Ok(())
    }

    #[tokio::test]
    async fn filesystem_store_file_base() -> Result<(), Box<dyn std::error::Error>> {
        let file = tempfile::NamedTempFile::new()?;
        assert!(FilesystemStore::new(file.path()).is_err());
        Ok(())
    }
}
