//! The reader entry point.
//!
//! [`open`] dispatches a locator to the appropriate store and returns the
//! typed root [`Node`] of the hierarchy:
//!  - a bare path or `file://` URL opens a
//!    [`FilesystemStore`](crate::storage::store::FilesystemStore);
//!  - an `http://` or `https://` URL opens an
//!    [`HTTPStore`](crate::storage::store::HTTPStore).
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let node = omezarr::reader::open("/data/image.zarr")?.root().await?;
//! if let omezarr::node::Node::Image(image) = node {
//!     let bytes = image.read_physical_region(0, &[0.0, 0.0], &[50.0, 50.0]).await?;
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use thiserror::Error;

use crate::{
    node::{Node, NodeError},
    storage::{
        store::{FilesystemStore, FilesystemStoreCreateError, HTTPStore, HTTPStoreCreateError},
        AsyncReadableStorage,
    },
};

/// A reader creation error.
#[derive(Debug, Error)]
pub enum ReaderCreateError {
    /// A filesystem store creation error.
    #[error(transparent)]
    FilesystemStoreCreateError(#[from] FilesystemStoreCreateError),
    /// A HTTP store creation error.
    #[error(transparent)]
    HTTPStoreCreateError(#[from] HTTPStoreCreateError),
}

/// A reader over an OME-Zarr hierarchy.
#[derive(Clone)]
pub struct Reader {
    storage: AsyncReadableStorage,
}

impl Reader {
    /// Create a reader over `storage`.
    #[must_use]
    pub fn new(storage: AsyncReadableStorage) -> Self {
        Self { storage }
    }

    /// Get the underlying storage.
    #[must_use]
    pub fn storage(&self) -> AsyncReadableStorage {
        self.storage.clone()
    }

    /// Open and classify the root node of the hierarchy.
    ///
    /// # Errors
    /// Returns a [`NodeError`] if the root group cannot be opened or its
    /// overlay metadata is invalid.
    pub async fn root(&self) -> Result<Node<dyn crate::storage::AsyncReadableStorageTraits>, NodeError> {
        Node::open(self.storage.clone(), "/").await
    }

    /// Open and classify the node at `path` in the hierarchy.
    ///
    /// # Errors
    /// Returns a [`NodeError`] if the group cannot be opened or its overlay
    /// metadata is invalid.
    pub async fn node(
        &self,
        path: &str,
    ) -> Result<Node<dyn crate::storage::AsyncReadableStorageTraits>, NodeError> {
        Node::open(self.storage.clone(), path).await
    }
}

/// Open a reader over the store identified by `locator`.
///
/// Locator syntax:
///  - bare path → local filesystem store,
///  - `file://…` → local filesystem store (host-relative),
///  - `http://…`, `https://…` → HTTP store.
///
/// # Errors
/// Returns a [`ReaderCreateError`] if the store cannot be constructed.
pub fn open(locator: &str) -> Result<Reader, ReaderCreateError> {
    let storage: AsyncReadableStorage = if locator.starts_with("http://")
        || locator.starts_with("https://")
    {
        Arc::new(HTTPStore::new(locator)?)
    } else if let Some(path) = locator.strip_prefix("file://") {
        Arc::new(FilesystemStore::new(path)?)
    } else {
        Arc::new(FilesystemStore::new(locator)?)
    };
    Ok(Reader::new(storage))
}
