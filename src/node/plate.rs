//! High-content-screening plates and wells.

use crate::{group::Group, storage::AsyncReadableStorageTraits};

use super::{
    image::MultiscaleImage,
    ome::{PlateMetadata, WellMetadata},
    NodeError,
};

/// A high-content-screening plate: a grid of wells, each holding fields of
/// view.
#[derive(Debug, Clone)]
pub struct Plate<TStorage: ?Sized> {
    group: Group<TStorage>,
    metadata: PlateMetadata,
}

impl<TStorage: ?Sized> Plate<TStorage> {
    /// Create a plate over `group` from the `plate` object in its attributes.
    ///
    /// # Errors
    /// Returns a [`NodeError`] if the group has no valid `plate` attribute.
    pub fn new(group: Group<TStorage>) -> Result<Self, NodeError> {
        let plate = group
            .attributes()
            .get("plate")
            .ok_or_else(|| NodeError::InvalidOverlay("missing plate".to_string()))?;
        let metadata: PlateMetadata = serde_json::from_value(plate.clone())
            .map_err(|err| NodeError::InvalidOverlay(err.to_string()))?;
        Ok(Self { group, metadata })
    }

    /// Get the plate metadata.
    #[must_use]
    pub const fn metadata(&self) -> &PlateMetadata {
        &self.metadata
    }

    /// The relative paths of the wells in the plate.
    #[must_use]
    pub fn well_paths(&self) -> Vec<&str> {
        self.metadata
            .wells
            .iter()
            .map(|well| well.path.as_str())
            .collect()
    }
}

impl<TStorage: ?Sized + AsyncReadableStorageTraits> Plate<TStorage> {
    /// Open the well at the relative `path` (e.g. `A/1`).
    ///
    /// # Errors
    /// Returns a [`NodeError`] if the path is not a well of the plate or the
    /// well group cannot be opened.
    pub async fn well(&self, path: &str) -> Result<Well<TStorage>, NodeError> {
        if !self.metadata.wells.iter().any(|well| well.path == path) {
            return Err(NodeError::InvalidOverlay(format!(
                "the plate has no well at {path}"
            )));
        }
        let group = self.group.child_group(path).await?;
        Well::new(group)
    }

    /// Open the well at `row` and `column` names (e.g. `A`, `1`).
    ///
    /// # Errors
    /// See [`well`](Plate::well).
    pub async fn well_at(&self, row: &str, column: &str) -> Result<Well<TStorage>, NodeError> {
        self.well(&format!("{row}/{column}")).await
    }
}

/// A well of a plate: a collection of fields of view.
#[derive(Debug, Clone)]
pub struct Well<TStorage: ?Sized> {
    group: Group<TStorage>,
    metadata: WellMetadata,
}

impl<TStorage: ?Sized> Well<TStorage> {
    /// Create a well over `group` from the `well` object in its attributes.
    ///
    /// # Errors
    /// Returns a [`NodeError`] if the group has no valid `well` attribute.
    pub fn new(group: Group<TStorage>) -> Result<Self, NodeError> {
        let well = group
            .attributes()
            .get("well")
            .ok_or_else(|| NodeError::InvalidOverlay("missing well".to_string()))?;
        let metadata: WellMetadata = serde_json::from_value(well.clone())
            .map_err(|err| NodeError::InvalidOverlay(err.to_string()))?;
        Ok(Self { group, metadata })
    }

    /// Get the well metadata.
    #[must_use]
    pub const fn metadata(&self) -> &WellMetadata {
        &self.metadata
    }

    /// The number of fields of view in the well.
    #[must_use]
    pub fn num_fields(&self) -> usize {
        self.metadata.images.len()
    }
}

impl<TStorage: ?Sized + AsyncReadableStorageTraits> Well<TStorage> {
    /// Open the field of view at `index` as a multiscale image.
    ///
    /// # Errors
    /// Returns a [`NodeError`] if `index` is out of range or the field group
    /// cannot be opened.
    pub async fn field(&self, index: usize) -> Result<MultiscaleImage<TStorage>, NodeError> {
        let Some(image) = self.metadata.images.get(index) else {
            return Err(NodeError::InvalidOverlay(format!(
                "field {index} is out of range ({} fields)",
                self.num_fields()
            )));
        };
        let group = self.group.child_group(&image.path).await?;
        MultiscaleImage::new(group)
    }
}
