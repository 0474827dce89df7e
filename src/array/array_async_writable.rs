use crate::{
    array_subset::ArraySubset,
    storage::{
        meta_key, AsyncReadableWritableStorageTraits, AsyncWritableStorageTraits,
    },
};

use super::{
    chunk_shape_to_array_shape, copy_region_bytes, transmute_to_bytes_vec, Array, ArrayError,
};

impl<TStorage: ?Sized + AsyncWritableStorageTraits> Array<TStorage> {
    /// Store the Zarr V3 metadata of the array (`zarr.json`).
    ///
    /// # Errors
    /// Returns an [`ArrayError`] on an underlying store error.
    ///
    /// # Panics
    /// Panics if the metadata does not serialize, which cannot happen.
    pub async fn store_metadata(&self) -> Result<(), ArrayError> {
        let metadata = self.metadata();
        let json = serde_json::to_vec_pretty(&metadata).expect("array metadata is valid JSON");
        self.storage
            .set(&meta_key(self.path()), json.into())
            .await?;
        Ok(())
    }

    /// Encode `chunk_bytes` and store the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - the length of `chunk_bytes` does not match the full chunk size,
    ///  - there is a codec encoding error, or
    ///  - an underlying store error occurs.
    pub async fn store_chunk(
        &self,
        chunk_indices: &[u64],
        chunk_bytes: Vec<u8>,
    ) -> Result<(), ArrayError> {
        if chunk_indices.len() != self.dimensionality()
            || std::iter::zip(chunk_indices, &self.chunk_grid_shape()).any(|(i, s)| i >= s)
        {
            return Err(ArrayError::InvalidChunkGridIndicesError(
                chunk_indices.to_vec(),
            ));
        }
        let chunk_size = self.chunk_size_bytes();
        if chunk_bytes.len() != chunk_size {
            return Err(ArrayError::InvalidBytesInputSize(
                chunk_bytes.len(),
                chunk_size as u64,
            ));
        }

        let chunk_encoded = self.codecs().encode(chunk_bytes, self.data_type())?;
        self.storage
            .set(&self.chunk_key(chunk_indices), chunk_encoded.into())
            .await?;
        Ok(())
    }

    /// Erase the chunk at `chunk_indices`.
    ///
    /// Succeeds if the chunk does not exist.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] on an underlying store error.
    pub async fn erase_chunk(&self, chunk_indices: &[u64]) -> Result<(), ArrayError> {
        self.storage.erase(&self.chunk_key(chunk_indices)).await?;
        Ok(())
    }
}

impl<TStorage: ?Sized + AsyncReadableWritableStorageTraits> Array<TStorage> {
    /// Encode and store the `region` of the array from `bytes`.
    ///
    /// `bytes` must be a C-order buffer of the region in the array's native
    /// element type. Chunks partially covered by the region are read,
    /// modified and re-written; chunks are written sequentially.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the region is out of bounds of the array or empty on any axis,
    ///  - the length of `bytes` does not match the region size,
    ///  - there is a codec error, or
    ///  - an underlying store error occurs.
    pub async fn store_region(
        &self,
        region: &ArraySubset,
        bytes: &[u8],
    ) -> Result<(), ArrayError> {
        if region.dimensionality() != self.dimensionality()
            || region.is_empty()
            || !region.inbounds(self.shape())
        {
            return Err(ArrayError::InvalidArraySubset(
                region.clone(),
                self.shape().to_vec(),
            ));
        }
        let element_size = self.data_type().size();
        let region_size = region.num_elements() * element_size as u64;
        if bytes.len() as u64 != region_size {
            return Err(ArrayError::InvalidBytesInputSize(bytes.len(), region_size));
        }

        let chunk_shape = chunk_shape_to_array_shape(self.chunk_shape());
        for (chunk_indices, chunk_subset) in &region.chunks(self.chunk_shape())? {
            let overlap = unsafe { region.overlap_unchecked(&chunk_subset) };
            let overlap_in_chunk = unsafe { overlap.relative_to_unchecked(chunk_subset.start()) };
            let overlap_in_region = unsafe { overlap.relative_to_unchecked(region.start()) };

            // Fully covered chunks skip the read of the read-modify-write.
            let mut chunk_bytes = if overlap.shape() == chunk_subset.shape() {
                vec![0; self.chunk_size_bytes()]
            } else {
                self.retrieve_chunk(&chunk_indices).await?
            };

            copy_region_bytes(
                bytes,
                region.shape(),
                overlap_in_region.start(),
                &mut chunk_bytes,
                &chunk_shape,
                overlap_in_chunk.start(),
                overlap.shape(),
                element_size,
            );
            self.store_chunk(&chunk_indices, chunk_bytes).await?;
        }
        Ok(())
    }

    /// Encode and store the `region` of the array from a vector of elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data
    /// type size or a [`store_region`](Array::store_region) error condition
    /// is met.
    pub async fn store_region_elements<T: bytemuck::Pod + Send + Sync>(
        &self,
        region: &ArraySubset,
        elements: Vec<T>,
    ) -> Result<(), ArrayError> {
        if self.data_type().size() != std::mem::size_of::<T>() {
            return Err(ArrayError::IncompatibleElementSize(
                std::mem::size_of::<T>(),
                self.data_type().size(),
            ));
        }
        let bytes = transmute_to_bytes_vec(elements);
        self.store_region(region, &bytes).await
    }
}
