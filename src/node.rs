//! Typed navigation of OME-Zarr hierarchies.
//!
//! A [`Node`] classifies a group by its overlay attributes: a multiscale
//! [`image`], a high-content-screening [`plate`] or well, a [`labels`]
//! group, or a collection of numbered sub-series. Unrecognised overlays
//! classify as [`Node::Unknown`] rather than erroring, so callers can
//! interrogate the raw group.
//!
//! [`image`]: MultiscaleImage
//! [`plate`]: Plate
//! [`labels`]: LabelGroup

pub mod image;
mod node_path;
pub mod ome;
pub mod plate;

mod labels;

pub use image::{MultiscaleImage, ResolutionLevel};
pub use labels::LabelGroup;
pub use node_path::{NodePath, NodePathError};
pub use plate::{Plate, Well};

use std::sync::Arc;

use thiserror::Error;

use crate::{
    array::{ArrayCreateError, ArrayError},
    coordinate::CoordinateTransformError,
    group::{Group, GroupCreateError},
    storage::AsyncReadableStorageTraits,
};

/// A node overlay error.
#[derive(Debug, Error)]
pub enum NodeError {
    /// A group error.
    #[error(transparent)]
    GroupCreateError(#[from] GroupCreateError),
    /// An array open error.
    #[error(transparent)]
    ArrayCreateError(#[from] ArrayCreateError),
    /// An array read error.
    #[error(transparent)]
    ArrayError(#[from] ArrayError),
    /// A coordinate transform error.
    #[error(transparent)]
    CoordinateTransformError(#[from] CoordinateTransformError),
    /// The overlay metadata is invalid.
    #[error("invalid overlay metadata: {_0}")]
    InvalidOverlay(String),
}

/// A typed OME-Zarr node.
#[derive(Debug)]
pub enum Node<TStorage: ?Sized> {
    /// A multiscale image.
    Image(MultiscaleImage<TStorage>),
    /// A high-content-screening plate.
    Plate(Plate<TStorage>),
    /// A well of a plate.
    Well(Well<TStorage>),
    /// A group of label images.
    Labels(LabelGroup<TStorage>),
    /// A collection of numbered sub-series.
    Collection(Collection<TStorage>),
    /// A group with an unrecognised overlay; the raw group can be
    /// interrogated.
    Unknown(Group<TStorage>),
}

impl<TStorage: ?Sized + AsyncReadableStorageTraits> Node<TStorage> {
    /// Open and classify the node at `path` in `storage`.
    ///
    /// # Errors
    /// Returns a [`NodeError`] if the group cannot be opened or a recognised
    /// overlay fails to parse.
    pub async fn open(storage: Arc<TStorage>, path: &str) -> Result<Self, NodeError> {
        let group = Group::open(storage, path).await?;
        Self::classify(group).await
    }

    /// Classify an open group by its overlay attributes.
    ///
    /// # Errors
    /// Returns a [`NodeError`] if a recognised overlay fails to parse.
    pub async fn classify(group: Group<TStorage>) -> Result<Self, NodeError> {
        let attributes = group.attributes();
        if attributes.contains_key("multiscales") {
            return Ok(Self::Image(MultiscaleImage::new(group)?));
        }
        if attributes.contains_key("plate") {
            return Ok(Self::Plate(Plate::new(group)?));
        }
        if attributes.contains_key("well") {
            return Ok(Self::Well(Well::new(group)?));
        }
        if attributes.contains_key("labels") {
            return Ok(Self::Labels(LabelGroup::new(group)?));
        }

        // Bioformats2raw-style collections hold numbered sub-series with no
        // overlay attributes of their own.
        if group.has_child("0").await? {
            return Ok(Self::Collection(Collection::discover(group).await?));
        }

        Ok(Self::Unknown(group))
    }

    /// Return the multiscale image if this node is one.
    #[must_use]
    pub fn as_image(&self) -> Option<&MultiscaleImage<TStorage>> {
        match self {
            Self::Image(image) => Some(image),
            _ => None,
        }
    }

    /// Return the plate if this node is one.
    #[must_use]
    pub fn as_plate(&self) -> Option<&Plate<TStorage>> {
        match self {
            Self::Plate(plate) => Some(plate),
            _ => None,
        }
    }
}

/// A collection of numbered sub-series (`0`, `1`, …), as produced by
/// converters that emit several images under one root.
#[derive(Debug)]
pub struct Collection<TStorage: ?Sized> {
    group: Group<TStorage>,
    num_series: usize,
}

impl<TStorage: ?Sized + AsyncReadableStorageTraits> Collection<TStorage> {
    /// Discover the numbered children of `group`.
    ///
    /// # Errors
    /// Returns a [`NodeError`] on an underlying store error.
    pub async fn discover(group: Group<TStorage>) -> Result<Self, NodeError> {
        let mut num_series = 0;
        while group.has_child(&num_series.to_string()).await? {
            num_series += 1;
        }
        Ok(Self { group, num_series })
    }

    /// The number of sub-series in the collection.
    #[must_use]
    pub fn num_series(&self) -> usize {
        self.num_series
    }

    /// Open and classify sub-series `index`.
    ///
    /// # Errors
    /// Returns a [`NodeError`] if `index` is out of range or the sub-series
    /// cannot be opened.
    pub async fn series(&self, index: usize) -> Result<Node<TStorage>, NodeError> {
        if index >= self.num_series {
            return Err(NodeError::InvalidOverlay(format!(
                "series {index} is out of range ({} series)",
                self.num_series
            )));
        }
        let child = self.group.child_group(&index.to_string()).await?;
        Node::classify(child).await
    }
}
