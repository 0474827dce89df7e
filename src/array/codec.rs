//! Codecs for encoding and decoding chunk bytes.
//!
//! A chunk passes through an ordered codec chain: the `bytes` boundary codec
//! adjacent to raw array bytes (aware of the element size for endianness
//! handling) followed by zero or more bytes-to-bytes codecs. Encoding applies
//! codecs in forward order; decoding applies them in reverse.
//!
//! The codec set is closed and hot, so codecs are enum variants rather than
//! trait objects.

pub mod blosc;
mod bytes;
mod gzip;
mod zstd;

pub use blosc::{BloscCodec, BloscCodecConfiguration, BloscCompressor, BloscShuffleMode};
pub use bytes::BytesCodec;
pub use gzip::{GzipCodec, GzipCompressionLevel};
pub use zstd::{ZstdCodec, ZstdCompressionLevel};

use thiserror::Error;

use crate::metadata::v3::MetadataV3;

use super::DataType;

/// A codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An unsupported codec, or an unsupported option of a supported codec.
    #[error("unsupported codec: {_0}")]
    Unsupported(String),
    /// The codec configuration is invalid.
    #[error("invalid codec configuration for {_0}")]
    InvalidConfiguration(String),
    /// The decoded size of a chunk did not match the expected size.
    #[error("the decoded chunk has size {_0}, expected {_1}")]
    UnexpectedChunkDecodedSize(usize, u64),
    /// The encoded data is not valid for the codec.
    #[error("invalid encoded data: {_0}")]
    CorruptData(String),
    /// An endianness is required for the data type, but it was not defined.
    #[error("tried to encode an array with element size {_0} with endianness None")]
    EndiannessNotSpecified(usize),
}

/// A `bytes -> bytes` codec.
#[derive(Debug, Clone)]
pub enum BytesToBytesCodec {
    /// The `gzip` codec.
    Gzip(GzipCodec),
    /// The `zstd` codec.
    Zstd(ZstdCodec),
    /// The `blosc` codec.
    Blosc(BloscCodec),
}

impl BytesToBytesCodec {
    /// Create a bytes-to-bytes codec from metadata.
    ///
    /// # Errors
    /// Returns [`CodecError::Unsupported`] if the metadata does not name a
    /// supported codec, or [`CodecError::InvalidConfiguration`] if its
    /// configuration is invalid.
    pub fn from_metadata(metadata: &MetadataV3) -> Result<Self, CodecError> {
        match metadata.name() {
            gzip::IDENTIFIER => Ok(Self::Gzip(GzipCodec::new_with_metadata(metadata)?)),
            zstd::IDENTIFIER => Ok(Self::Zstd(ZstdCodec::new_with_metadata(metadata)?)),
            blosc::IDENTIFIER => Ok(Self::Blosc(BloscCodec::new_with_metadata(metadata)?)),
            name => Err(CodecError::Unsupported(name.to_string())),
        }
    }

    /// Create the metadata for the codec.
    #[must_use]
    pub fn metadata(&self) -> MetadataV3 {
        match self {
            Self::Gzip(codec) => codec.metadata(),
            Self::Zstd(codec) => codec.metadata(),
            Self::Blosc(codec) => codec.metadata(),
        }
    }

    /// Encode `decoded_value`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] on a compression failure.
    pub fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Gzip(codec) => codec.encode(&decoded_value),
            Self::Zstd(codec) => codec.encode(&decoded_value),
            Self::Blosc(codec) => codec.encode(&decoded_value),
        }
    }

    /// Decode `encoded_value`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the encoded data is invalid.
    pub fn decode(&self, encoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Gzip(codec) => codec.decode(&encoded_value),
            Self::Zstd(codec) => codec.decode(&encoded_value),
            Self::Blosc(codec) => codec.decode(&encoded_value),
        }
    }
}

/// An ordered sequence of codecs: the `bytes` boundary codec followed by
/// bytes-to-bytes codecs.
#[derive(Debug, Clone)]
pub struct CodecChain {
    array_to_bytes: BytesCodec,
    bytes_to_bytes: Vec<BytesToBytesCodec>,
}

impl CodecChain {
    /// Create a new codec chain.
    #[must_use]
    pub fn new(array_to_bytes: BytesCodec, bytes_to_bytes: Vec<BytesToBytesCodec>) -> Self {
        Self {
            array_to_bytes,
            bytes_to_bytes,
        }
    }

    /// Create a codec chain from a list of codec metadata.
    ///
    /// The first entry must be the `bytes` boundary codec; subsequent entries
    /// must be bytes-to-bytes codecs.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the first codec is not `bytes` or any
    /// codec is unsupported.
    pub fn from_metadata(metadatas: &[MetadataV3]) -> Result<Self, CodecError> {
        let Some((first, rest)) = metadatas.split_first() else {
            return Err(CodecError::Unsupported(
                "the codec list must not be empty".to_string(),
            ));
        };
        if first.name() != bytes::IDENTIFIER {
            return Err(CodecError::Unsupported(format!(
                "the first codec must be {}, got {}",
                bytes::IDENTIFIER,
                first.name()
            )));
        }
        let array_to_bytes = BytesCodec::new_with_metadata(first)?;
        let bytes_to_bytes = rest
            .iter()
            .map(BytesToBytesCodec::from_metadata)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            array_to_bytes,
            bytes_to_bytes,
        })
    }

    /// Create the codec metadata list of the chain.
    #[must_use]
    pub fn create_metadatas(&self) -> Vec<MetadataV3> {
        let mut metadatas = Vec::with_capacity(1 + self.bytes_to_bytes.len());
        metadatas.push(self.array_to_bytes.metadata());
        metadatas.extend(self.bytes_to_bytes.iter().map(BytesToBytesCodec::metadata));
        metadatas
    }

    /// Return the boundary `bytes` codec.
    #[must_use]
    pub fn array_to_bytes(&self) -> &BytesCodec {
        &self.array_to_bytes
    }

    /// Encode array bytes through the chain in forward order.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if any codec fails.
    pub fn encode(&self, bytes: Vec<u8>, data_type: DataType) -> Result<Vec<u8>, CodecError> {
        let mut bytes = self.array_to_bytes.encode(bytes, data_type)?;
        for codec in &self.bytes_to_bytes {
            bytes = codec.encode(bytes)?;
        }
        Ok(bytes)
    }

    /// Decode chunk bytes through the chain in reverse order.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if any codec fails.
    pub fn decode(&self, bytes: Vec<u8>, data_type: DataType) -> Result<Vec<u8>, CodecError> {
        let mut bytes = bytes;
        for codec in self.bytes_to_bytes.iter().rev() {
            bytes = codec.decode(bytes)?;
        }
        self.array_to_bytes.decode(bytes, data_type)
    }
}

impl Default for CodecChain {
    /// A codec chain with a native-endian `bytes` codec and no compression.
    fn default() -> Self {
        Self::new(BytesCodec::default(), vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_from_json(json: &str) -> Result<CodecChain, CodecError> {
        let metadatas: Vec<MetadataV3> = serde_json::from_str(json).unwrap();
        CodecChain::from_metadata(&metadatas)
    }

    #[test]
    fn codec_chain_round_trip() {
        let chain = chain_from_json(
            r#"[
                {"name": "bytes", "configuration": {"endian": "little"}},
                {"name": "gzip", "configuration": {"level": 5}},
                {"name": "zstd", "configuration": {"level": 3}}
            ]"#,
        )
        .unwrap();
        let bytes: Vec<u8> = (0u16..256).flat_map(u16::to_le_bytes).collect();
        let encoded = chain.encode(bytes.clone(), DataType::UInt16).unwrap();
        assert_ne!(encoded, bytes);
        let decoded = chain.decode(encoded, DataType::UInt16).unwrap();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn codec_chain_first_must_be_bytes() {
        assert!(chain_from_json(r#"[{"name": "gzip", "configuration": {"level": 5}}]"#).is_err());
        assert!(chain_from_json(r"[]").is_err());
    }

    #[test]
    fn codec_chain_unknown_codec() {
        assert!(chain_from_json(
            r#"[
                {"name": "bytes", "configuration": {"endian": "little"}},
                {"name": "sharding_indexed", "configuration": {}}
            ]"#
        )
        .is_err());
    }
}
