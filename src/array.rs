//! Zarr arrays.
//!
//! An [`Array`] is a chunked, compressed n-dimensional array backed by a
//! store. Use [`Array::open`] to read an existing array (Zarr V3 or V2), or
//! [`ArrayBuilder`] to create a new one.
//!
//! Regions are read with
//! [`retrieve_region`](Array::retrieve_region) and written with
//! [`store_region`](Array::store_region); both operate on C-order byte
//! buffers matching the array's native element type.

mod array_async_readable;
mod array_async_writable;
mod array_builder;
mod array_errors;
mod chunk_key_encoding;
pub mod codec;
mod data_type;
mod unsafe_cell_slice;

pub use array_builder::ArrayBuilder;
pub use array_errors::{ArrayCreateError, ArrayError, UnsupportedChunkKeyEncodingError};
pub use chunk_key_encoding::ChunkKeyEncoding;
pub use data_type::{DataType, UnsupportedDataTypeError};
pub(crate) use unsafe_cell_slice::UnsafeCellSlice;

use std::num::NonZeroU64;
use std::sync::Arc;

use codec::CodecChain;

use crate::{
    array_subset::ArraySubset,
    metadata::{
        v2::ArrayMetadataV2,
        v3::{ArrayMetadataV3, MetadataV3, RegularChunkGridConfiguration},
        ChunkKeySeparator,
    },
    node::NodePath,
    storage::{meta_key, meta_key_v2_array, meta_key_v2_attributes, StoreKey},
};

/// The shape of an array: the element count per axis.
pub type ArrayShape = Vec<u64>;

/// The indices of an element or chunk in an array.
pub type ArrayIndices = Vec<u64>;

/// The shape of a chunk: a non-zero element count per axis.
pub type ChunkShape = Vec<NonZeroU64>;

/// Convert a chunk shape to an array shape.
#[must_use]
pub fn chunk_shape_to_array_shape(chunk_shape: &[NonZeroU64]) -> ArrayShape {
    chunk_shape.iter().map(|d| d.get()).collect()
}

/// Unravel a linearised index into n-dimensional indices for `shape`.
#[must_use]
pub fn unravel_index(mut index: u64, shape: &[u64]) -> ArrayIndices {
    let mut indices: ArrayIndices = vec![0; shape.len()];
    for (indices_i, &dim) in std::iter::zip(indices.iter_mut().rev(), shape.iter().rev()) {
        if dim != 0 {
            *indices_i = index % dim;
            index /= dim;
        }
    }
    indices
}

/// Ravel n-dimensional `indices` for `shape` into a linearised index.
#[must_use]
pub fn ravel_indices(indices: &[u64], shape: &[u64]) -> u64 {
    let mut index = 0;
    for (&i, &dim) in std::iter::zip(indices, shape) {
        index = index * dim + i;
    }
    index
}

/// Convert a byte vector to a vector of elements of type `T`.
#[must_use]
pub fn transmute_from_bytes_vec<T: bytemuck::Pod>(from: Vec<u8>) -> Vec<T> {
    bytemuck::allocation::try_cast_vec::<u8, T>(from)
        .map_or_else(|(_err, from)| bytemuck::allocation::pod_collect_to_vec(&from), |v| v)
}

/// Convert a vector of elements of type `T` to a byte vector.
#[must_use]
pub fn transmute_to_bytes_vec<T: bytemuck::Pod>(from: Vec<T>) -> Vec<u8> {
    bytemuck::allocation::try_cast_vec::<T, u8>(from)
        .map_or_else(|(_err, from)| bytemuck::allocation::pod_collect_to_vec(&from), |v| v)
}

/// A chunked, compressed n-dimensional array.
///
/// The array descriptor is immutable after construction and shares no mutable
/// state with the store, so it is safe to use from multiple concurrent region
/// reads.
#[derive(Debug, Clone)]
pub struct Array<TStorage: ?Sized> {
    /// The storage backing the array.
    storage: Arc<TStorage>,
    /// The path of the array in the store.
    path: NodePath,
    /// The per-axis element count.
    shape: ArrayShape,
    /// The element type.
    data_type: DataType,
    /// The per-axis chunk element count.
    chunk_shape: ChunkShape,
    /// The chunk key encoding.
    chunk_key_encoding: ChunkKeyEncoding,
    /// The codec chain.
    codecs: CodecChain,
    /// Optional dimension names (Zarr V3 only).
    dimension_names: Option<Vec<Option<String>>>,
    /// Raw user attributes, forwarded to the overlay layer.
    attributes: serde_json::Map<String, serde_json::Value>,
}

impl<TStorage: ?Sized> Array<TStorage> {
    /// Create an array in `storage` at `path` with `metadata`.
    ///
    /// This does **not** write to the store; use
    /// [`store_metadata`](Array::store_metadata) to persist the metadata.
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if the metadata is invalid or uses
    /// unsupported features.
    pub fn new_with_metadata(
        storage: Arc<TStorage>,
        path: &str,
        metadata: ArrayMetadataV3,
    ) -> Result<Self, ArrayCreateError> {
        let path = NodePath::new(path)?;

        let data_type = DataType::from_metadata(&metadata.data_type)?;

        if metadata.chunk_grid.name() != "regular" {
            return Err(ArrayCreateError::UnsupportedChunkGridError(
                metadata.chunk_grid.name().to_string(),
            ));
        }
        let chunk_grid: RegularChunkGridConfiguration =
            metadata.chunk_grid.to_configuration().map_err(|err| {
                ArrayCreateError::UnsupportedChunkGridError(err.to_string())
            })?;
        if chunk_grid.chunk_shape.len() != metadata.shape.len() {
            return Err(ArrayCreateError::InvalidChunkShape(
                chunk_grid.chunk_shape,
                metadata.shape,
            ));
        }
        let chunk_shape: ChunkShape = chunk_grid
            .chunk_shape
            .iter()
            .map(|&d| NonZeroU64::new(d))
            .collect::<Option<_>>()
            .ok_or_else(|| {
                ArrayCreateError::InvalidChunkShape(
                    chunk_grid.chunk_shape.clone(),
                    metadata.shape.clone(),
                )
            })?;

        let chunk_key_encoding = ChunkKeyEncoding::from_metadata(&metadata.chunk_key_encoding)?;
        let codecs = CodecChain::from_metadata(&metadata.codecs)?;

        if !metadata.storage_transformers.is_empty() {
            return Err(ArrayCreateError::UnsupportedMetadata(
                "storage transformers".to_string(),
            ));
        }
        if let Some(dimension_names) = &metadata.dimension_names {
            if dimension_names.len() != metadata.shape.len() {
                return Err(ArrayCreateError::UnsupportedMetadata(format!(
                    "dimension_names has length {}, expected {}",
                    dimension_names.len(),
                    metadata.shape.len()
                )));
            }
        }

        Ok(Self {
            storage,
            path,
            shape: metadata.shape,
            data_type,
            chunk_shape,
            chunk_key_encoding,
            codecs,
            dimension_names: metadata.dimension_names,
            attributes: metadata.attributes,
        })
    }

    /// Get the node path.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Get the array shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Get the dimensionality of the array.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape.len()
    }

    /// Get the data type.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Get the chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &[NonZeroU64] {
        &self.chunk_shape
    }

    /// Get the chunk key encoding.
    #[must_use]
    pub const fn chunk_key_encoding(&self) -> &ChunkKeyEncoding {
        &self.chunk_key_encoding
    }

    /// Get the codec chain.
    #[must_use]
    pub const fn codecs(&self) -> &CodecChain {
        &self.codecs
    }

    /// Get the dimension names.
    #[must_use]
    pub const fn dimension_names(&self) -> &Option<Vec<Option<String>>> {
        &self.dimension_names
    }

    /// Get the user attributes.
    #[must_use]
    pub const fn attributes(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.attributes
    }

    /// Get the underlying storage.
    #[must_use]
    pub fn storage(&self) -> Arc<TStorage> {
        self.storage.clone()
    }

    /// Create the Zarr V3 metadata of the array.
    ///
    /// # Panics
    /// Panics if the chunk grid configuration does not serialize, which
    /// cannot happen.
    #[must_use]
    pub fn metadata(&self) -> ArrayMetadataV3 {
        let chunk_grid = MetadataV3::new_with_serializable_configuration(
            "regular",
            &RegularChunkGridConfiguration {
                chunk_shape: chunk_shape_to_array_shape(&self.chunk_shape),
            },
        )
        .expect("chunk grid configuration is valid JSON");
        ArrayMetadataV3::new(
            self.shape.clone(),
            self.data_type.metadata(),
            chunk_grid,
            self.chunk_key_encoding.metadata(),
            serde_json::Value::from(0),
            self.codecs.create_metadatas(),
        )
        .with_attributes(self.attributes.clone())
        .with_dimension_names(self.dimension_names.clone())
    }

    /// Return the shape of the chunk grid: the per-axis chunk count.
    #[must_use]
    pub fn chunk_grid_shape(&self) -> ArrayShape {
        std::iter::zip(&self.shape, &self.chunk_shape)
            .map(|(&shape, &chunk_shape)| shape.div_ceil(chunk_shape.get()))
            .collect()
    }

    /// Return the store key of the chunk at `chunk_indices`.
    #[must_use]
    pub fn chunk_key(&self, chunk_indices: &[u64]) -> StoreKey {
        let key = self.chunk_key_encoding.encode(chunk_indices);
        let path = self.path.as_str();
        if path.eq("/") {
            key
        } else {
            let path = path.strip_prefix('/').unwrap_or(path);
            unsafe { StoreKey::new_unchecked(format!("{path}/{}", key.as_str())) }
        }
    }

    /// Return the subset of the array covered by the chunk at `chunk_indices`.
    ///
    /// The subset of an edge chunk may extend beyond the array shape.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndicesError`] if `chunk_indices`
    /// is not within the chunk grid.
    pub fn chunk_subset(&self, chunk_indices: &[u64]) -> Result<ArraySubset, ArrayError> {
        let chunk_grid_shape = self.chunk_grid_shape();
        if chunk_indices.len() != chunk_grid_shape.len()
            || std::iter::zip(chunk_indices, &chunk_grid_shape).any(|(i, s)| i >= s)
        {
            return Err(ArrayError::InvalidChunkGridIndicesError(
                chunk_indices.to_vec(),
            ));
        }
        let start = std::iter::zip(chunk_indices, &self.chunk_shape)
            .map(|(&i, &c)| i * c.get())
            .collect();
        Ok(unsafe {
            ArraySubset::new_with_start_shape_unchecked(
                start,
                chunk_shape_to_array_shape(&self.chunk_shape),
            )
        })
    }

    /// Return the shape of the chunk at `chunk_indices`, truncated to the
    /// valid extent of the array on each axis.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndicesError`] if `chunk_indices`
    /// is not within the chunk grid.
    pub fn truncated_chunk_shape(&self, chunk_indices: &[u64]) -> Result<ArrayShape, ArrayError> {
        let chunk_subset = self.chunk_subset(chunk_indices)?;
        Ok(itertools::izip!(&self.shape, chunk_subset.start(), &self.chunk_shape)
            .map(|(&shape, &start, &chunk_shape)| {
                (shape.saturating_sub(start)).min(chunk_shape.get())
            })
            .collect())
    }

    /// Return the size in bytes of the chunk at `chunk_indices`, assuming the
    /// full chunk shape.
    #[must_use]
    pub fn chunk_size_bytes(&self) -> usize {
        let num_elements: u64 = self.chunk_shape.iter().map(|d| d.get()).product();
        usize::try_from(num_elements).unwrap() * self.data_type.size()
    }
}

/// Copy a box of elements between two C-order byte buffers.
///
/// Copies the `copy_shape` box at `src_start` in a buffer of shape
/// `src_shape` to `dst_start` in a buffer of shape `dst_shape`. The innermost
/// axis is copied as one contiguous run per row; outer axes are iterated with
/// a reused coordinate array. Rank 1 degenerates to a single copy.
///
/// # Panics
/// Panics if the boxes are out of bounds of their buffers or the shapes are
/// inconsistent with the buffer lengths.
pub(crate) fn copy_region_bytes(
    src: &[u8],
    src_shape: &[u64],
    src_start: &[u64],
    dst: &mut [u8],
    dst_shape: &[u64],
    dst_start: &[u64],
    copy_shape: &[u64],
    element_size: usize,
) {
    let rank = copy_shape.len();
    debug_assert_eq!(src_shape.len(), rank);
    debug_assert_eq!(dst_shape.len(), rank);
    if copy_shape.iter().any(|&d| d == 0) {
        return;
    }

    let row_len = usize::try_from(copy_shape[rank - 1]).unwrap() * element_size;
    let n_rows: u64 = copy_shape[..rank - 1].iter().product();

    let mut coords = vec![0u64; rank];
    let mut src_indices = src_start.to_vec();
    let mut dst_indices = dst_start.to_vec();
    for _ in 0..n_rows {
        let src_offset = usize::try_from(ravel_indices(&src_indices, src_shape)).unwrap()
            * element_size;
        let dst_offset = usize::try_from(ravel_indices(&dst_indices, dst_shape)).unwrap()
            * element_size;
        dst[dst_offset..dst_offset + row_len]
            .copy_from_slice(&src[src_offset..src_offset + row_len]);

        // Advance the outer coordinates, rightmost fastest.
        for axis in (0..rank.saturating_sub(1)).rev() {
            coords[axis] += 1;
            src_indices[axis] += 1;
            dst_indices[axis] += 1;
            if coords[axis] < copy_shape[axis] {
                break;
            }
            coords[axis] = 0;
            src_indices[axis] = src_start[axis];
            dst_indices[axis] = dst_start[axis];
        }
    }
}

/// Probe a Zarr V2 array for its chunk key separator.
///
/// Checks for a chunk at `0/0/…/0`; `/` is chosen if it exists, otherwise `.`.
async fn probe_v2_separator<TStorage: ?Sized + crate::storage::AsyncReadableStorageTraits>(
    storage: &Arc<TStorage>,
    path: &NodePath,
    dimensionality: usize,
) -> Result<ChunkKeySeparator, crate::storage::StorageError> {
    let zeros = vec!["0"; dimensionality.max(1)].join("/");
    let key = if path.as_str() == "/" {
        zeros
    } else {
        format!("{}/{zeros}", path.as_str().trim_start_matches('/'))
    };
    let key = unsafe { StoreKey::new_unchecked(key) };
    if storage.exists(&key).await? {
        Ok(ChunkKeySeparator::Slash)
    } else {
        Ok(ChunkKeySeparator::Dot)
    }
}

impl<TStorage: ?Sized + crate::storage::AsyncReadableStorageTraits> Array<TStorage> {
    /// Open an existing array in `storage` at `path`. The metadata is read
    /// from the store, probing `zarr.json` (V3) and then `.zarray` (V2).
    ///
    /// # Errors
    /// Returns [`ArrayCreateError::MissingMetadata`] if neither metadata
    /// document exists, or an [`ArrayCreateError`] if any metadata is
    /// invalid.
    pub async fn open(storage: Arc<TStorage>, path: &str) -> Result<Self, ArrayCreateError> {
        let node_path = NodePath::new(path)?;

        let v3_key = meta_key(&node_path);
        if let Some(metadata) = storage.get(&v3_key).await? {
            let metadata: ArrayMetadataV3 = serde_json::from_slice(&metadata).map_err(|err| {
                crate::storage::StorageError::InvalidMetadata(v3_key, err.to_string())
            })?;
            return Self::new_with_metadata(storage, path, metadata);
        }

        let v2_key = meta_key_v2_array(&node_path);
        if let Some(metadata) = storage.get(&v2_key).await? {
            let metadata: ArrayMetadataV2 = serde_json::from_slice(&metadata).map_err(|err| {
                crate::storage::StorageError::InvalidMetadata(v2_key, err.to_string())
            })?;

            let separator = match metadata.dimension_separator {
                Some(separator) => separator,
                None => {
                    probe_v2_separator(&storage, &node_path, metadata.shape.len()).await?
                }
            };

            let mut metadata_v3 = crate::metadata::array_metadata_v2_to_v3(&metadata, separator)?;

            let attributes_key = meta_key_v2_attributes(&node_path);
            if let Some(attributes) = storage.get(&attributes_key).await? {
                metadata_v3.attributes =
                    serde_json::from_slice(&attributes).map_err(|err| {
                        crate::storage::StorageError::InvalidMetadata(
                            attributes_key,
                            err.to_string(),
                        )
                    })?;
            }

            return Self::new_with_metadata(storage, path, metadata_v3);
        }

        Err(ArrayCreateError::MissingMetadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unravel_ravel() {
        let shape = [3, 4, 5];
        for index in 0..60 {
            let indices = unravel_index(index, &shape);
            assert_eq!(ravel_indices(&indices, &shape), index);
        }
        assert_eq!(unravel_index(0, &shape), vec![0, 0, 0]);
        assert_eq!(unravel_index(59, &shape), vec![2, 3, 4]);
        assert_eq!(unravel_index(5, &shape), vec![0, 1, 0]);
    }

    #[test]
    fn array_metadata_construct() {
        let json = r#"{
            "zarr_format": 3,
            "node_type": "array",
            "shape": [4, 4],
            "data_type": "uint8",
            "chunk_grid": {"name": "regular", "configuration": {"chunk_shape": [2, 2]}},
            "chunk_key_encoding": {"name": "default", "configuration": {"separator": "/"}},
            "codecs": [{"name": "bytes", "configuration": {"endian": "little"}}],
            "fill_value": 0
        }"#;
        let metadata: ArrayMetadataV3 = serde_json::from_str(json).unwrap();
        let storage = Arc::new(crate::storage::store::MemoryStore::new());
        let array = Array::new_with_metadata(storage, "/array", metadata).unwrap();
        assert_eq!(array.shape(), &[4, 4]);
        assert_eq!(array.chunk_grid_shape(), vec![2, 2]);
        assert_eq!(array.chunk_key(&[0, 1]), StoreKey::new("array/c/0/1").unwrap());
        assert_eq!(array.chunk_size_bytes(), 4);
        assert_eq!(
            array.chunk_subset(&[1, 1]).unwrap(),
            ArraySubset::new_with_ranges(&[2..4, 2..4])
        );
        assert!(array.chunk_subset(&[2, 0]).is_err());
    }

    #[test]
    fn copy_region_bytes_2d() {
        // 4x4 source, copy the central 2x2 into the corner of a 3x3 buffer.
        let src: Vec<u8> = (0..16).collect();
        let mut dst = vec![0u8; 9];
        copy_region_bytes(&src, &[4, 4], &[1, 1], &mut dst, &[3, 3], &[0, 0], &[2, 2], 1);
        assert_eq!(dst, vec![5, 6, 0, 9, 10, 0, 0, 0, 0]);
    }

    #[test]
    fn copy_region_bytes_rank1() {
        let src: Vec<u8> = (0..8).collect();
        let mut dst = vec![0u8; 4];
        copy_region_bytes(&src, &[8], &[2], &mut dst, &[4], &[1], &[3], 1);
        assert_eq!(dst, vec![0, 2, 3, 4]);
    }

    #[test]
    fn copy_region_bytes_multibyte_elements() {
        let src: Vec<u8> = (0..32).collect();
        let mut dst = vec![0u8; 8];
        // 4x4 u16 source, copy one 2x2 box into a 2x2 buffer.
        copy_region_bytes(&src, &[4, 4], &[0, 2], &mut dst, &[2, 2], &[0, 0], &[2, 2], 2);
        assert_eq!(dst, vec![4, 5, 6, 7, 12, 13, 14, 15]);
    }

    #[test]
    fn array_truncated_chunk_shape() {
        let json = r#"{
            "zarr_format": 3,
            "node_type": "array",
            "shape": [3, 3],
            "data_type": "uint8",
            "chunk_grid": {"name": "regular", "configuration": {"chunk_shape": [2, 2]}},
            "chunk_key_encoding": {"name": "default", "configuration": {"separator": "/"}},
            "codecs": [{"name": "bytes", "configuration": {"endian": "little"}}],
            "fill_value": 0
        }"#;
        let metadata: ArrayMetadataV3 = serde_json::from_str(json).unwrap();
        let storage = Arc::new(crate::storage::store::MemoryStore::new());
        let array = Array::new_with_metadata(storage, "/", metadata).unwrap();
        assert_eq!(array.truncated_chunk_shape(&[0, 0]).unwrap(), vec![2, 2]);
        assert_eq!(array.truncated_chunk_shape(&[0, 1]).unwrap(), vec![2, 1]);
        assert_eq!(array.truncated_chunk_shape(&[1, 1]).unwrap(), vec![1, 1]);
    }
}
