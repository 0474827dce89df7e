use std::{iter::FusedIterator, num::NonZeroU64};

use crate::{
    array::{chunk_shape_to_array_shape, ArrayIndices},
    array_subset::{ArraySubset, IncompatibleDimensionalityError},
};

use super::indices_iterator::{Indices, IndicesIterator};

/// Iterates over the regular sized chunks overlapping an array subset.
///
/// Iterates over the last dimension fastest (i.e. C-contiguous order).
/// All chunks have the same size, and may extend over the bounds of the array
/// subset since the start of the first chunk is aligned to the chunk size.
///
/// The iterator item is a ([`ArrayIndices`], [`ArraySubset`]) tuple
/// corresponding to the chunk indices and the chunk's subset of the array.
pub struct Chunks {
    indices: Indices,
    chunk_shape: Vec<u64>,
}

impl Chunks {
    /// Create a new chunks iterator.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `chunk_shape` does not
    /// match the dimensionality of `subset`.
    pub fn new(
        subset: &ArraySubset,
        chunk_shape: &[NonZeroU64],
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if subset.dimensionality() == chunk_shape.len() {
            Ok(unsafe { Self::new_unchecked(subset, chunk_shape) })
        } else {
            Err(IncompatibleDimensionalityError::new(
                chunk_shape.len(),
                subset.dimensionality(),
            ))
        }
    }

    /// Create a new chunks iterator.
    ///
    /// # Safety
    /// The dimensionality of `chunk_shape` must match the dimensionality of `subset`.
    #[must_use]
    pub unsafe fn new_unchecked(subset: &ArraySubset, chunk_shape: &[NonZeroU64]) -> Self {
        debug_assert_eq!(subset.dimensionality(), chunk_shape.len());
        let chunk_shape = chunk_shape_to_array_shape(chunk_shape);
        match subset.end_inc() {
            Some(end) => {
                let chunk_start: ArrayIndices = std::iter::zip(subset.start(), &chunk_shape)
                    .map(|(s, c)| s / c)
                    .collect();
                let chunk_end_exc: ArrayIndices = std::iter::zip(end, &chunk_shape)
                    .map(|(e, c)| e / c + 1)
                    .collect();
                let subset_chunks = unsafe {
                    ArraySubset::new_with_start_end_exc_unchecked(chunk_start, chunk_end_exc)
                };
                Self {
                    indices: subset_chunks.indices(),
                    chunk_shape,
                }
            }
            None => Self {
                indices: ArraySubset::new_empty(subset.dimensionality()).indices(),
                chunk_shape,
            },
        }
    }

    /// Return the number of chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if the number of chunks is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create a new serial iterator.
    #[must_use]
    pub fn iter(&self) -> ChunksIterator<'_> {
        <&Self as IntoIterator>::into_iter(self)
    }
}

impl<'a> IntoIterator for &'a Chunks {
    type Item = (ArrayIndices, ArraySubset);
    type IntoIter = ChunksIterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        ChunksIterator {
            inner: self.indices.into_iter(),
            chunk_shape: &self.chunk_shape,
        }
    }
}

/// Serial chunks iterator.
///
/// See [`Chunks`].
pub struct ChunksIterator<'a> {
    inner: IndicesIterator<'a>,
    chunk_shape: &'a [u64],
}

impl ChunksIterator<'_> {
    fn chunk_indices_with_subset(&self, chunk_indices: Vec<u64>) -> (Vec<u64>, ArraySubset) {
        let start = std::iter::zip(&chunk_indices, self.chunk_shape)
            .map(|(i, c)| i * c)
            .collect();
        let chunk_subset = unsafe {
            ArraySubset::new_with_start_shape_unchecked(start, self.chunk_shape.to_vec())
        };
        (chunk_indices, chunk_subset)
    }
}

impl Iterator for ChunksIterator<'_> {
    type Item = (ArrayIndices, ArraySubset);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|chunk_indices| self.chunk_indices_with_subset(chunk_indices))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ChunksIterator<'_> {}

impl FusedIterator for ChunksIterator<'_> {}
