//! Zarr stores.
//!
//! A store is an abstract asynchronous byte-addressable map used to store and
//! retrieve data from a Zarr hierarchy, such as a filesystem directory or an
//! HTTP server. Keys are `/`-separated strings relative to the store root.
//!
//! A missing key is a *successful negative* result ([`MaybeBytes`] of
//! [`None`]), distinct from a store failure. The array engine relies on this
//! distinction for fill-value semantics.

mod storage_async;
pub mod store;
mod store_key;
mod store_prefix;

use thiserror::Error;

pub use store_key::{StoreKey, StoreKeyError, StoreKeys};
pub use store_prefix::{StorePrefix, StorePrefixError};

pub use storage_async::{
    AsyncListableStorageTraits, AsyncReadableListableStorageTraits, AsyncReadableStorageTraits,
    AsyncReadableWritableStorageTraits, AsyncWritableStorageTraits,
};

use std::sync::Arc;

use crate::node::NodePath;

/// The type for bytes used in store get and set methods.
///
/// An alias for [`bytes::Bytes`].
pub type Bytes = bytes::Bytes;

/// An alias for bytes which may or may not be available.
///
/// When a value is read from a store, it returns `MaybeBytes` which is
/// [`None`] if the key is not available.
pub type MaybeBytes = Option<Bytes>;

/// [`Arc`] wrapped asynchronous readable storage.
pub type AsyncReadableStorage = Arc<dyn AsyncReadableStorageTraits>;

/// [`Arc`] wrapped asynchronous readable and writable storage.
pub type AsyncReadableWritableStorage = Arc<dyn AsyncReadableWritableStorageTraits>;

/// [`Arc`] wrapped asynchronous readable and listable storage.
pub type AsyncReadableListableStorage = Arc<dyn AsyncReadableListableStorageTraits>;

/// A storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A write operation was attempted on a read only store.
    #[error("a write operation was attempted on a read only store")]
    ReadOnly,
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An error parsing the metadata for a key.
    #[error("error parsing metadata for {0}: {1}")]
    InvalidMetadata(StoreKey, String),
    /// An invalid store prefix.
    #[error("invalid store prefix {0}")]
    StorePrefixError(#[from] StorePrefixError),
    /// An invalid store key.
    #[error("invalid store key {0}")]
    InvalidStoreKey(#[from] StoreKeyError),
    /// The requested method is not supported by the store.
    #[error("{0}")]
    Unsupported(String),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<&str> for StorageError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for StorageError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// Return the Zarr V3 metadata key (`zarr.json`) for a node.
#[must_use]
pub fn meta_key(path: &NodePath) -> StoreKey {
    let path = path.as_str();
    if path.eq("/") {
        unsafe { StoreKey::new_unchecked("zarr.json".to_string()) }
    } else {
        let path = path.strip_prefix('/').unwrap_or(path);
        unsafe { StoreKey::new_unchecked(format!("{path}/zarr.json")) }
    }
}

/// Return the Zarr V2 array metadata key (`.zarray`) for a node.
#[must_use]
pub fn meta_key_v2_array(path: &NodePath) -> StoreKey {
    node_key(path, ".zarray")
}

/// Return the Zarr V2 group metadata key (`.zgroup`) for a node.
#[must_use]
pub fn meta_key_v2_group(path: &NodePath) -> StoreKey {
    node_key(path, ".zgroup")
}

/// Return the Zarr V2 attributes key (`.zattrs`) for a node.
#[must_use]
pub fn meta_key_v2_attributes(path: &NodePath) -> StoreKey {
    node_key(path, ".zattrs")
}

fn node_key(path: &NodePath, name: &str) -> StoreKey {
    let path = path.as_str();
    if path.eq("/") {
        unsafe { StoreKey::new_unchecked(name.to_string()) }
    } else {
        let path = path.strip_prefix('/').unwrap_or(path);
        unsafe { StoreKey::new_unchecked(format!("{path}/{name}")) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_keys() {
        let root = NodePath::root();
        assert_eq!(meta_key(&root), StoreKey::new("zarr.json").unwrap());
        assert_eq!(
            meta_key_v2_array(&root),
            StoreKey::new(".zarray").unwrap()
        );
        let node = NodePath::new("/a/b").unwrap();
        assert_eq!(meta_key(&node), StoreKey::new("a/b/zarr.json").unwrap());
        assert_eq!(
            meta_key_v2_group(&node),
            StoreKey::new("a/b/.zgroup").unwrap()
        );
        assert_eq!(
            meta_key_v2_attributes(&node),
            StoreKey::new("a/b/.zattrs").unwrap()
        );
    }
}
