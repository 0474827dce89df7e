//! Coordinate transforms between index and physical space.
//!
//! Multiscale metadata relates array indices to physical coordinates (e.g.
//! micrometers) through ordered lists of `scale` and `translation`
//! transforms. [`CoordinateMapping`] composes such a list into a single
//! per-axis `(scale, translation)` pair, so that
//! `physical = scale * index + translation`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::array_subset::ArraySubset;

/// A coordinate transform, as declared in multiscale metadata.
///
/// Transform types other than `identity`, `scale` and `translation` are
/// rejected.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CoordinateTransform {
    /// The identity transform.
    Identity,
    /// A per-axis scaling.
    Scale {
        /// The scale factor per axis.
        scale: Vec<f64>,
    },
    /// A per-axis translation.
    Translation {
        /// The offset per axis.
        translation: Vec<f64>,
    },
}

/// A coordinate transform error.
#[derive(Debug, Error)]
pub enum CoordinateTransformError {
    /// A transform vector does not match the expected dimensionality.
    #[error("transform has dimensionality {_0}, expected {_1}")]
    IncompatibleDimensionality(usize, usize),
    /// A scale component is zero or not finite.
    #[error("invalid scale component {_0}")]
    InvalidScale(f64),
}

/// A composed per-axis affine mapping between index and physical space:
/// `physical = scale * index + translation`.
#[derive(Clone, PartialEq, Debug)]
pub struct CoordinateMapping {
    scale: Vec<f64>,
    translation: Vec<f64>,
}

impl CoordinateMapping {
    /// The identity mapping of the given dimensionality.
    #[must_use]
    pub fn identity(dimensionality: usize) -> Self {
        Self {
            scale: vec![1.0; dimensionality],
            translation: vec![0.0; dimensionality],
        }
    }

    /// Compose an ordered list of transforms into the mapping.
    ///
    /// Applying a further `scale` multiplies both the accumulated scale and
    /// translation: if the mapping so far is `p = s*i + t`, a physical-side
    /// factor `v` yields `p' = v*s*i + v*t`. A further `translation` adds to
    /// the accumulated translation.
    ///
    /// # Errors
    /// Returns a [`CoordinateTransformError`] if a transform has the wrong
    /// dimensionality or a zero/non-finite scale component.
    pub fn apply(&mut self, transform: &CoordinateTransform) -> Result<(), CoordinateTransformError> {
        let dimensionality = self.scale.len();
        match transform {
            CoordinateTransform::Identity => {}
            CoordinateTransform::Scale { scale } => {
                if scale.len() != dimensionality {
                    return Err(CoordinateTransformError::IncompatibleDimensionality(
                        scale.len(),
                        dimensionality,
                    ));
                }
                for (&v, (s, t)) in std::iter::zip(
                    scale,
                    std::iter::zip(&mut self.scale, &mut self.translation),
                ) {
                    if v == 0.0 || !v.is_finite() {
                        return Err(CoordinateTransformError::InvalidScale(v));
                    }
                    *s *= v;
                    *t *= v;
                }
            }
            CoordinateTransform::Translation { translation } => {
                if translation.len() != dimensionality {
                    return Err(CoordinateTransformError::IncompatibleDimensionality(
                        translation.len(),
                        dimensionality,
                    ));
                }
                for (&v, t) in std::iter::zip(translation, &mut self.translation) {
                    *t += v;
                }
            }
        }
        Ok(())
    }

    /// Compose dataset-level transforms followed by multiscale-level
    /// transforms into a single mapping.
    ///
    /// # Errors
    /// See [`apply`](CoordinateMapping::apply).
    pub fn from_transforms(
        dataset_transforms: &[CoordinateTransform],
        multiscale_transforms: &[CoordinateTransform],
        dimensionality: usize,
    ) -> Result<Self, CoordinateTransformError> {
        let mut mapping = Self::identity(dimensionality);
        for transform in dataset_transforms.iter().chain(multiscale_transforms) {
            mapping.apply(transform)?;
        }
        Ok(mapping)
    }

    /// Get the composed per-axis scale.
    #[must_use]
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Get the composed per-axis translation.
    #[must_use]
    pub fn translation(&self) -> &[f64] {
        &self.translation
    }

    /// Map array indices to physical coordinates.
    #[must_use]
    pub fn index_to_physical(&self, index: &[f64]) -> Vec<f64> {
        itertools::izip!(index, &self.scale, &self.translation)
            .map(|(&i, &s, &t)| s * i + t)
            .collect()
    }

    /// Map physical coordinates to (fractional) array indices.
    #[must_use]
    pub fn physical_to_index(&self, physical: &[f64]) -> Vec<f64> {
        itertools::izip!(physical, &self.scale, &self.translation)
            .map(|(&p, &s, &t)| (p - t) / s)
            .collect()
    }

    /// Map a physical region to a pixel region, clamped and snapped to the
    /// array bounds.
    ///
    /// The start is floored and clamped to zero; the end is ceiled and
    /// clamped to the array shape. Axes left degenerate by clamping are
    /// widened to one pixel inside the bounds, so every returned region has
    /// positive extent on every axis.
    #[must_use]
    pub fn physical_to_pixel(
        &self,
        origin: &[f64],
        size: &[f64],
        array_shape: &[u64],
    ) -> ArraySubset {
        let end_physical: Vec<f64> = std::iter::zip(origin, size).map(|(&o, &s)| o + s).collect();
        let index_start = self.physical_to_index(origin);
        let index_end = self.physical_to_index(&end_physical);

        let mut start = Vec::with_capacity(array_shape.len());
        let mut end = Vec::with_capacity(array_shape.len());
        for (&i0, &i1, &shape) in itertools::izip!(&index_start, &index_end, array_shape) {
            // A negative scale reverses the interval.
            let (lo, hi) = if i0 <= i1 { (i0, i1) } else { (i1, i0) };
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let mut lo = lo.floor().max(0.0) as u64;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let mut hi = (hi.ceil().max(0.0) as u64).min(shape);
            if hi <= lo {
                // Degenerate after clamping; widen to one pixel inside bounds.
                lo = lo.min(shape.saturating_sub(1));
                hi = lo + 1;
            }
            start.push(lo);
            end.push(hi);
        }
        unsafe { ArraySubset::new_with_start_end_exc_unchecked(start, end) }
    }
}
