//! Multiscale images.

use crate::{
    array::{Array, ArrayError},
    array_subset::ArraySubset,
    coordinate::CoordinateMapping,
    group::Group,
    storage::AsyncReadableStorageTraits,
};

use super::{
    ome::{Axis, MultiscaleMetadata},
    NodeError,
};

/// The axis names inferred for overlays predating the axes field, by rank.
const INFERRED_AXIS_NAMES: [&str; 5] = ["t", "c", "z", "y", "x"];

/// Infer the axes of an image as the suffix of `(t, c, z, y, x)` matching
/// `rank`.
///
/// # Errors
/// Returns a [`NodeError`] if `rank` exceeds 5; axes are never guessed
/// beyond that.
pub fn infer_axes(rank: usize) -> Result<Vec<Axis>, NodeError> {
    if rank == 0 || rank > INFERRED_AXIS_NAMES.len() {
        return Err(NodeError::InvalidOverlay(format!(
            "cannot infer axes for an array of rank {rank}"
        )));
    }
    Ok(INFERRED_AXIS_NAMES[INFERRED_AXIS_NAMES.len() - rank..]
        .iter()
        .map(|name| Axis::new(name))
        .collect())
}

/// A multiscale image: a family of resolution levels describing the same
/// underlying image at different scales, related by coordinate transforms.
#[derive(Debug, Clone)]
pub struct MultiscaleImage<TStorage: ?Sized> {
    group: Group<TStorage>,
    metadata: MultiscaleMetadata,
}

/// One resolution level of a multiscale image: an array plus the composed
/// index to physical mapping.
#[derive(Debug, Clone)]
pub struct ResolutionLevel<TStorage: ?Sized> {
    /// The level's array.
    pub array: Array<TStorage>,
    /// The composed mapping between array indices and physical coordinates.
    pub mapping: CoordinateMapping,
}

impl<TStorage: ?Sized> MultiscaleImage<TStorage> {
    /// Create a multiscale image over `group` from the first `multiscales`
    /// entry in its attributes.
    ///
    /// # Errors
    /// Returns a [`NodeError`] if the group has no valid `multiscales`
    /// attribute or it declares no datasets.
    pub fn new(group: Group<TStorage>) -> Result<Self, NodeError> {
        let multiscales = group
            .attributes()
            .get("multiscales")
            .ok_or_else(|| NodeError::InvalidOverlay("missing multiscales".to_string()))?;
        let mut multiscales: Vec<MultiscaleMetadata> =
            serde_json::from_value(multiscales.clone())
                .map_err(|err| NodeError::InvalidOverlay(err.to_string()))?;
        if multiscales.is_empty() {
            return Err(NodeError::InvalidOverlay(
                "multiscales is empty".to_string(),
            ));
        }
        let metadata = multiscales.swap_remove(0);
        if metadata.datasets.is_empty() {
            return Err(NodeError::InvalidOverlay(
                "multiscales declares no datasets".to_string(),
            ));
        }
        Ok(Self { group, metadata })
    }

    /// Get the multiscale metadata.
    #[must_use]
    pub const fn metadata(&self) -> &MultiscaleMetadata {
        &self.metadata
    }

    /// Get the group backing the image.
    #[must_use]
    pub const fn group(&self) -> &Group<TStorage> {
        &self.group
    }

    /// The number of resolution levels, highest resolution first.
    #[must_use]
    pub fn num_levels(&self) -> usize {
        self.metadata.datasets.len()
    }

    /// The declared axes, or axes inferred from `rank` when the overlay
    /// predates the axes field.
    ///
    /// # Errors
    /// Returns a [`NodeError`] if axes are absent and `rank` exceeds 5.
    pub fn axes_for_rank(&self, rank: usize) -> Result<Vec<Axis>, NodeError> {
        match &self.metadata.axes {
            Some(axes) => Ok(axes.clone()),
            None => infer_axes(rank),
        }
    }
}

impl<TStorage: ?Sized + AsyncReadableStorageTraits> MultiscaleImage<TStorage> {
    /// Open resolution level `level`.
    ///
    /// # Errors
    /// Returns a [`NodeError`] if `level` is out of range, the level's array
    /// cannot be opened, or its transforms are invalid.
    pub async fn level(&self, level: usize) -> Result<ResolutionLevel<TStorage>, NodeError> {
        let Some(dataset) = self.metadata.datasets.get(level) else {
            return Err(NodeError::InvalidOverlay(format!(
                "resolution level {level} is out of range ({} levels)",
                self.num_levels()
            )));
        };
        let array = self.group.child_array(&dataset.path).await?;
        let mapping = CoordinateMapping::from_transforms(
            &dataset.coordinate_transformations,
            &self.metadata.coordinate_transformations,
            array.dimensionality(),
        )?;
        Ok(ResolutionLevel { array, mapping })
    }

    /// Read a physical region of resolution level `level` into a C-order
    /// byte buffer of the array's native element type.
    ///
    /// The physical region is converted to a pixel region by the level's
    /// composed coordinate mapping, clamped and snapped to the array bounds.
    /// Chunk fetches are bounded by the configured
    /// [chunk concurrent limit](crate::config::Config::chunk_concurrent_limit).
    ///
    /// # Errors
    /// Returns a [`NodeError`] if the level cannot be opened or the region
    /// read fails.
    pub async fn read_physical_region(
        &self,
        level: usize,
        origin: &[f64],
        size: &[f64],
    ) -> Result<Vec<u8>, NodeError> {
        let max_parallel = crate::config::global_config().chunk_concurrent_limit();
        let level = self.level(level).await?;
        let region = level.region_for_physical(origin, size)?;
        Ok(level.array.retrieve_region(&region, max_parallel).await?)
    }
}

impl<TStorage: ?Sized> ResolutionLevel<TStorage> {
    /// Convert a physical region to a pixel region of this level, clamped
    /// and snapped to the array bounds.
    ///
    /// # Errors
    /// Returns a [`NodeError`] if the region dimensionality does not match
    /// the array.
    pub fn region_for_physical(
        &self,
        origin: &[f64],
        size: &[f64],
    ) -> Result<ArraySubset, NodeError> {
        if origin.len() != self.array.dimensionality() || size.len() != self.array.dimensionality()
        {
            return Err(NodeError::ArrayError(ArrayError::InvalidArraySubset(
                ArraySubset::new_empty(origin.len()),
                self.array.shape().to_vec(),
            )));
        }
        Ok(self
            .mapping
            .physical_to_pixel(origin, size, self.array.shape()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inferred_axes() {
        let axes = infer_axes(2).unwrap();
        assert_eq!(axes.len(), 2);
        assert_eq!(axes[0].name, "y");
        assert_eq!(axes[1].name, "x");
        let axes = infer_axes(5).unwrap();
        assert_eq!(axes[0].name, "t");
        assert!(infer_axes(6).is_err());
        assert!(infer_axes(0).is_err());
    }
}
