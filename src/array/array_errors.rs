use thiserror::Error;

use crate::{
    array_subset::{ArraySubset, IncompatibleDimensionalityError},
    metadata::ArrayMetadataV2ToV3ConversionError,
    node::NodePathError,
    storage::StorageError,
};

use super::{
    codec::CodecError, data_type::UnsupportedDataTypeError, ArrayIndices, ArrayShape,
};

/// An array creation error.
#[derive(Debug, Error)]
pub enum ArrayCreateError {
    /// Invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// Unsupported data type.
    #[error(transparent)]
    DataTypeCreateError(#[from] UnsupportedDataTypeError),
    /// Invalid codecs.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// Unsupported chunk key encoding.
    #[error("unsupported chunk key encoding: {_0}")]
    UnsupportedChunkKeyEncodingError(#[from] UnsupportedChunkKeyEncodingError),
    /// Unsupported chunk grid.
    #[error("unsupported chunk grid: {_0}")]
    UnsupportedChunkGridError(String),
    /// Unsupported additional metadata feature.
    #[error("unsupported array metadata: {_0}")]
    UnsupportedMetadata(String),
    /// The chunk shape is invalid for the array shape.
    #[error("invalid chunk shape {_0:?} for array shape {_1:?}")]
    InvalidChunkShape(Vec<u64>, ArrayShape),
    /// There is no metadata at the array path.
    #[error("array metadata is missing")]
    MissingMetadata,
    /// Invalid Zarr V2 metadata.
    #[error(transparent)]
    MetadataV2ConversionError(#[from] ArrayMetadataV2ToV3ConversionError),
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
}

/// An unsupported chunk key encoding error.
#[derive(Debug, Error, derive_more::From)]
#[error("{_0}")]
pub struct UnsupportedChunkKeyEncodingError(String);

/// An array error.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// A codec error.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// Invalid array subset for the array shape.
    #[error("invalid array subset {_0} for array shape {_1:?}")]
    InvalidArraySubset(ArraySubset, ArrayShape),
    /// Invalid chunk grid indices.
    #[error("invalid chunk grid indices {_0:?}")]
    InvalidChunkGridIndicesError(ArrayIndices),
    /// Incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionalityError(#[from] IncompatibleDimensionalityError),
    /// The decoded size of a chunk matched neither its full nor its
    /// truncated-edge size.
    #[error("the chunk at {_0:?} decoded to {_1} bytes, expected {_2} (full) or {_3} (truncated)")]
    UnexpectedChunkDecodedSize(ArrayIndices, usize, u64, u64),
    /// An incompatible element size for a typed view of the array bytes.
    #[error("incompatible element size {_0} with the array data type size {_1}")]
    IncompatibleElementSize(usize, usize),
    /// The bytes supplied to a store operation do not match the region size.
    #[error("the input has size {_0}, expected {_1}")]
    InvalidBytesInputSize(usize, u64),
}
