use futures::{StreamExt, TryStreamExt};

use crate::{
    array_subset::ArraySubset,
    storage::AsyncReadableStorageTraits,
};

use super::{
    chunk_shape_to_array_shape, copy_region_bytes, transmute_from_bytes_vec, Array, ArrayError,
    UnsafeCellSlice,
};

impl<TStorage: ?Sized + AsyncReadableStorageTraits> Array<TStorage> {
    /// Read and decode the chunk at `chunk_indices` into its bytes.
    ///
    /// An absent chunk reads as zeros. An edge chunk stored at its truncated
    /// extent is expanded to the full chunk shape.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - there is a codec decoding error,
    ///  - the decoded size matches neither the full nor the truncated chunk
    ///    size, or
    ///  - an underlying store error occurs.
    pub async fn retrieve_chunk(&self, chunk_indices: &[u64]) -> Result<Vec<u8>, ArrayError> {
        Ok(self
            .retrieve_chunk_if_exists(chunk_indices)
            .await?
            .unwrap_or_else(|| vec![0; self.chunk_size_bytes()]))
    }

    /// Read and decode the chunk at `chunk_indices` if it exists.
    ///
    /// Returns [`None`] for an absent chunk.
    ///
    /// # Errors
    /// See [`retrieve_chunk`](Array::retrieve_chunk).
    pub async fn retrieve_chunk_if_exists(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Option<Vec<u8>>, ArrayError> {
        // Validates the chunk indices.
        let truncated_shape = self.truncated_chunk_shape(chunk_indices)?;

        let key = self.chunk_key(chunk_indices);
        let Some(chunk_encoded) = self.storage.get(&key).await? else {
            return Ok(None);
        };

        let chunk_decoded = self
            .codecs()
            .decode(chunk_encoded.to_vec(), self.data_type())?;

        let element_size = self.data_type().size() as u64;
        let full_size = self
            .chunk_shape()
            .iter()
            .map(|d| d.get())
            .product::<u64>()
            * element_size;
        let truncated_size = truncated_shape.iter().product::<u64>() * element_size;

        if chunk_decoded.len() as u64 == full_size {
            Ok(Some(chunk_decoded))
        } else if chunk_decoded.len() as u64 == truncated_size {
            Ok(Some(self.expand_truncated_chunk(&chunk_decoded, &truncated_shape)))
        } else {
            tracing::debug!(
                key = key.as_str(),
                decoded = chunk_decoded.len(),
                full_size,
                truncated_size,
                "chunk decoded to an unexpected size"
            );
            Err(ArrayError::UnexpectedChunkDecodedSize(
                chunk_indices.to_vec(),
                chunk_decoded.len(),
                full_size,
                truncated_size,
            ))
        }
    }

    /// Expand a chunk stored at its truncated edge extent to the full chunk
    /// shape, padding with zeros.
    ///
    /// A flat copy is only correct when just the last axis is clipped; the
    /// truncated rows are narrower than full chunk rows in general, so this
    /// always goes through the strided copy.
    fn expand_truncated_chunk(&self, truncated: &[u8], truncated_shape: &[u64]) -> Vec<u8> {
        let chunk_shape = chunk_shape_to_array_shape(self.chunk_shape());
        let origin = vec![0; chunk_shape.len()];
        let mut full = vec![0; self.chunk_size_bytes()];
        copy_region_bytes(
            truncated,
            truncated_shape,
            &origin,
            &mut full,
            &chunk_shape,
            &origin,
            truncated_shape,
            self.data_type().size(),
        );
        full
    }

    /// Read and decode the `region` of the array into its bytes.
    ///
    /// Chunks intersecting the region are fetched concurrently, bounded by
    /// `max_parallel` (clamped to a minimum of 1); each decoded chunk is
    /// scattered into a disjoint range of the C-order output buffer. Missing
    /// chunks contribute zeros.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the region is out of bounds of the array or empty on any axis,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error occurs.
    ///
    /// # Panics
    /// Panics if the region byte size exceeds [`usize::MAX`].
    pub async fn retrieve_region(
        &self,
        region: &ArraySubset,
        max_parallel: usize,
    ) -> Result<Vec<u8>, ArrayError> {
        if region.dimensionality() != self.dimensionality()
            || region.is_empty()
            || !region.inbounds(self.shape())
        {
            return Err(ArrayError::InvalidArraySubset(
                region.clone(),
                self.shape().to_vec(),
            ));
        }

        let chunks = region.chunks(self.chunk_shape())?;

        // Single chunk fast path if the region matches the chunk domain.
        if chunks.len() == 1 {
            let (chunk_indices, chunk_subset) = chunks.iter().next().expect("one chunk");
            if &chunk_subset == region {
                return self.retrieve_chunk(&chunk_indices).await;
            }
        }

        let element_size = self.data_type().size();
        let size_output = region.num_elements_usize() * element_size;
        let mut output = vec![0; size_output];
        let output_slice = UnsafeCellSlice::new(&mut output);

        let chunk_list: Vec<_> = chunks.iter().collect();
        futures::stream::iter(chunk_list)
            .map(Ok)
            .try_for_each_concurrent(Some(max_parallel.max(1)), |(chunk_indices, chunk_subset)| {
                async move {
                    let chunk_bytes = self.retrieve_chunk(&chunk_indices).await?;

                    let overlap = unsafe { region.overlap_unchecked(&chunk_subset) };
                    let overlap_in_chunk =
                        unsafe { overlap.relative_to_unchecked(chunk_subset.start()) };
                    let overlap_in_region = unsafe { overlap.relative_to_unchecked(region.start()) };

                    // Chunks map to disjoint ranges of the output buffer.
                    let output = unsafe { output_slice.get() };
                    copy_region_bytes(
                        &chunk_bytes,
                        &chunk_shape_to_array_shape(self.chunk_shape()),
                        overlap_in_chunk.start(),
                        output,
                        region.shape(),
                        overlap_in_region.start(),
                        overlap.shape(),
                        element_size,
                    );
                    Ok::<(), ArrayError>(())
                }
            })
            .await?;

        Ok(output)
    }

    /// Read and decode the `region` of the array into a vector of its elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size or a [`retrieve_region`](Array::retrieve_region) error
    /// condition is met.
    pub async fn retrieve_region_elements<T: bytemuck::Pod + Send + Sync>(
        &self,
        region: &ArraySubset,
        max_parallel: usize,
    ) -> Result<Vec<T>, ArrayError> {
        if self.data_type().size() != std::mem::size_of::<T>() {
            return Err(ArrayError::IncompatibleElementSize(
                std::mem::size_of::<T>(),
                self.data_type().size(),
            ));
        }
        let bytes = self.retrieve_region(region, max_parallel).await?;
        Ok(transmute_from_bytes_vec::<T>(bytes))
    }
}
