use std::sync::Arc;

use super::{
    codec::{BytesCodec, BytesToBytesCodec},
    Array, ArrayCreateError, ArrayShape, ChunkKeyEncoding, CodecChain, DataType,
};

/// An [`Array`] builder.
///
/// The array builder is initialised from an array shape, data type, and chunk
/// shape.
///  - The only codec enabled by default is `bytes` (with native endian
///    encoding), so the output is uncompressed.
///  - The default chunk key encoding is `default` with the `/` separator.
///  - Attributes and dimension names are empty.
///
/// Note that [`build`](ArrayBuilder::build) does not modify the store; the
/// array metadata has to be explicitly written with
/// [`Array::store_metadata`](Array::store_metadata).
///
/// For example:
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # use std::sync::Arc;
/// use omezarr::array::{ArrayBuilder, DataType};
/// # let store = Arc::new(omezarr::storage::store::MemoryStore::new());
/// let array = ArrayBuilder::new(
///     vec![8, 8], // array shape
///     DataType::Float32,
///     vec![4, 4], // regular chunk shape
/// )
/// .dimension_names(Some(vec!["y".to_string(), "x".to_string()]))
/// .build(store.clone(), "/group/array")?;
/// // array.store_metadata().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ArrayBuilder {
    shape: ArrayShape,
    data_type: DataType,
    chunk_shape: Vec<u64>,
    chunk_key_encoding: ChunkKeyEncoding,
    bytes_codec: BytesCodec,
    bytes_to_bytes_codecs: Vec<BytesToBytesCodec>,
    attributes: serde_json::Map<String, serde_json::Value>,
    dimension_names: Option<Vec<Option<String>>>,
}

impl ArrayBuilder {
    /// Create a new array builder.
    #[must_use]
    pub fn new(shape: ArrayShape, data_type: DataType, chunk_shape: Vec<u64>) -> Self {
        Self {
            shape,
            data_type,
            chunk_shape,
            chunk_key_encoding: ChunkKeyEncoding::default_slash(),
            bytes_codec: BytesCodec::default(),
            bytes_to_bytes_codecs: Vec::new(),
            attributes: serde_json::Map::new(),
            dimension_names: None,
        }
    }

    /// Set the chunk key encoding.
    #[must_use]
    pub fn chunk_key_encoding(mut self, chunk_key_encoding: ChunkKeyEncoding) -> Self {
        self.chunk_key_encoding = chunk_key_encoding;
        self
    }

    /// Set the `bytes` boundary codec (endianness).
    #[must_use]
    pub fn bytes_codec(mut self, bytes_codec: BytesCodec) -> Self {
        self.bytes_codec = bytes_codec;
        self
    }

    /// Set the bytes to bytes codecs.
    #[must_use]
    pub fn bytes_to_bytes_codecs(mut self, codecs: Vec<BytesToBytesCodec>) -> Self {
        self.bytes_to_bytes_codecs = codecs;
        self
    }

    /// Set the user attributes.
    #[must_use]
    pub fn attributes(mut self, attributes: serde_json::Map<String, serde_json::Value>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set the dimension names.
    #[must_use]
    pub fn dimension_names(mut self, dimension_names: Option<Vec<String>>) -> Self {
        self.dimension_names =
            dimension_names.map(|names| names.into_iter().map(Some).collect());
        self
    }

    /// Build the array at `path` in `storage`.
    ///
    /// # Errors
    /// Returns an [`ArrayCreateError`] if the configuration is invalid, such
    /// as a chunk shape not matching the array dimensionality.
    ///
    /// # Panics
    /// Panics if the chunk grid configuration does not serialize, which
    /// cannot happen.
    pub fn build<TStorage: ?Sized>(
        self,
        storage: Arc<TStorage>,
        path: &str,
    ) -> Result<Array<TStorage>, ArrayCreateError> {
        let codec_chain = CodecChain::new(self.bytes_codec, self.bytes_to_bytes_codecs);
        let chunk_grid = crate::metadata::v3::MetadataV3::new_with_serializable_configuration(
            "regular",
            &crate::metadata::v3::RegularChunkGridConfiguration {
                chunk_shape: self.chunk_shape,
            },
        )
        .expect("chunk grid configuration is valid JSON");
        let metadata = crate::metadata::v3::ArrayMetadataV3::new(
            self.shape,
            self.data_type.metadata(),
            chunk_grid,
            self.chunk_key_encoding.metadata(),
            serde_json::Value::from(0),
            codec_chain.create_metadatas(),
        )
        .with_attributes(self.attributes)
        .with_dimension_names(self.dimension_names);
        Array::new_with_metadata(storage, path, metadata)
    }
}
