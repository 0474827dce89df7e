//! Zarr groups.
//!
//! A group is a node in a Zarr hierarchy with attributes and child nodes
//! (groups or [`arrays`](crate::array)). [`Group::open`] decides whether a
//! node is Zarr V3 or V2 by probing for `zarr.json` first, then
//! `.zgroup`/`.zarray`.

use std::sync::Arc;

use derive_more::Display;
use thiserror::Error;

use crate::{
    array::{Array, ArrayCreateError},
    metadata::{
        v2::GroupMetadataV2,
        v3::GroupMetadataV3,
    },
    node::{NodePath, NodePathError},
    storage::{
        meta_key, meta_key_v2_attributes, meta_key_v2_group, AsyncReadableStorageTraits,
        AsyncWritableStorageTraits, StorageError,
    },
};

/// Group metadata, in either Zarr version.
#[derive(Clone, PartialEq, Debug)]
pub enum GroupMetadata {
    /// Zarr V3 group metadata.
    V3(GroupMetadataV3),
    /// Zarr V2 group metadata.
    V2(GroupMetadataV2),
}

/// A group.
#[derive(Clone, Debug, Display)]
#[display("group at {path}")]
pub struct Group<TStorage: ?Sized> {
    /// The storage.
    storage: Arc<TStorage>,
    /// The path of the group in the store.
    path: NodePath,
    /// The metadata.
    metadata: GroupMetadata,
}

/// A group creation error.
#[derive(Debug, Error)]
pub enum GroupCreateError {
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// There is no metadata at the group path.
    #[error("group metadata is missing")]
    MissingMetadata,
    /// The node is an array, not a group.
    #[error("the node at the group path is an array")]
    NodeIsAnArray,
    /// An error parsing the metadata.
    #[error("invalid group metadata: {_0}")]
    InvalidMetadata(String),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
}

impl<TStorage: ?Sized> Group<TStorage> {
    /// Create a group in `storage` at `path` with `metadata`.
    ///
    /// This does **not** write to the store; use
    /// [`store_metadata`](Group::store_metadata) to persist the metadata.
    ///
    /// # Errors
    /// Returns a [`GroupCreateError`] if the path is invalid.
    pub fn new_with_metadata(
        storage: Arc<TStorage>,
        path: &str,
        metadata: GroupMetadata,
    ) -> Result<Self, GroupCreateError> {
        let path = NodePath::new(path)?;
        Ok(Self {
            storage,
            path,
            metadata,
        })
    }

    /// Create a new empty Zarr V3 group in `storage` at `path`.
    ///
    /// # Errors
    /// Returns a [`GroupCreateError`] if the path is invalid.
    pub fn new(storage: Arc<TStorage>, path: &str) -> Result<Self, GroupCreateError> {
        Self::new_with_metadata(storage, path, GroupMetadata::V3(GroupMetadataV3::default()))
    }

    /// Get the node path.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Get the metadata.
    #[must_use]
    pub const fn metadata(&self) -> &GroupMetadata {
        &self.metadata
    }

    /// Get the attributes.
    #[must_use]
    pub const fn attributes(&self) -> &serde_json::Map<String, serde_json::Value> {
        match &self.metadata {
            GroupMetadata::V3(metadata) => &metadata.attributes,
            GroupMetadata::V2(metadata) => &metadata.attributes,
        }
    }

    /// Mutably borrow the attributes.
    pub fn attributes_mut(&mut self) -> &mut serde_json::Map<String, serde_json::Value> {
        match &mut self.metadata {
            GroupMetadata::V3(metadata) => &mut metadata.attributes,
            GroupMetadata::V2(metadata) => &mut metadata.attributes,
        }
    }
}

impl<TStorage: ?Sized + AsyncReadableStorageTraits> Group<TStorage> {
    /// Open a group in `storage` at `path`. The metadata is read from the
    /// store, probing `zarr.json` (V3) and then `.zgroup` (V2).
    ///
    /// # Errors
    /// Returns a [`GroupCreateError`] if neither metadata document exists,
    /// the node is an array, or the metadata is invalid.
    pub async fn open(storage: Arc<TStorage>, path: &str) -> Result<Self, GroupCreateError> {
        let node_path = NodePath::new(path)?;

        let v3_key = meta_key(&node_path);
        if let Some(metadata) = storage.get(&v3_key).await? {
            let metadata: GroupMetadataV3 = serde_json::from_slice(&metadata).map_err(|err| {
                // Distinguish an array document from malformed JSON.
                if serde_json::from_slice::<crate::metadata::v3::ArrayMetadataV3>(&metadata).is_ok()
                {
                    GroupCreateError::NodeIsAnArray
                } else {
                    GroupCreateError::InvalidMetadata(err.to_string())
                }
            })?;
            return Ok(Self {
                storage,
                path: node_path,
                metadata: GroupMetadata::V3(metadata),
            });
        }

        let v2_key = meta_key_v2_group(&node_path);
        if let Some(metadata) = storage.get(&v2_key).await? {
            let mut metadata: GroupMetadataV2 = serde_json::from_slice(&metadata)
                .map_err(|err| GroupCreateError::InvalidMetadata(err.to_string()))?;

            let attributes_key = meta_key_v2_attributes(&node_path);
            if let Some(attributes) = storage.get(&attributes_key).await? {
                metadata.attributes = serde_json::from_slice(&attributes)
                    .map_err(|err| GroupCreateError::InvalidMetadata(err.to_string()))?;
            }

            return Ok(Self {
                storage,
                path: node_path,
                metadata: GroupMetadata::V2(metadata),
            });
        }

        if storage
            .get(&crate::storage::meta_key_v2_array(&node_path))
            .await?
            .is_some()
        {
            return Err(GroupCreateError::NodeIsAnArray);
        }

        Err(GroupCreateError::MissingMetadata)
    }

    /// Open the child array named or pathed `name` (relative, `/`-separated).
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if the child does not exist or its
    /// metadata is invalid.
    pub async fn child_array(&self, name: &str) -> Result<Array<TStorage>, ArrayCreateError> {
        let path = self
            .path
            .descendant(name)
            .map_err(ArrayCreateError::NodePathError)?;
        Array::open(self.storage.clone(), path.as_str()).await
    }

    /// Open the child group named or pathed `name` (relative, `/`-separated).
    ///
    /// # Errors
    /// Returns a [`GroupCreateError`] if the child does not exist or its
    /// metadata is invalid.
    pub async fn child_group(&self, name: &str) -> Result<Self, GroupCreateError> {
        let path = self.path.descendant(name)?;
        Group::open(self.storage.clone(), path.as_str()).await
    }

    /// Returns true if a child node (array or group, either Zarr version)
    /// exists at the relative `name`.
    ///
    /// # Errors
    /// Returns a [`GroupCreateError`] on an underlying store error.
    pub async fn has_child(&self, name: &str) -> Result<bool, GroupCreateError> {
        let path = self.path.descendant(name)?;
        for key in [
            meta_key(&path),
            meta_key_v2_group(&path),
            crate::storage::meta_key_v2_array(&path),
        ] {
            if self.storage.exists(&key).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl<TStorage: ?Sized + AsyncWritableStorageTraits> Group<TStorage> {
    /// Store the Zarr V3 metadata of the group (`zarr.json`).
    ///
    /// Zarr V2 group metadata is converted to V3 on store.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on an underlying store error.
    ///
    /// # Panics
    /// Panics if the metadata does not serialize, which cannot happen.
    pub async fn store_metadata(&self) -> Result<(), StorageError> {
        let metadata = match &self.metadata {
            GroupMetadata::V3(metadata) => metadata.clone(),
            GroupMetadata::V2(metadata) => {
                crate::metadata::v2_to_v3::group_metadata_v2_to_v3(metadata)
            }
        };
        let json = serde_json::to_vec_pretty(&metadata).expect("group metadata is valid JSON");
        self.storage.set(&meta_key(&self.path), json.into()).await
    }
}
