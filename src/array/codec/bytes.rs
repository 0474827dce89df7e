//! The `bytes` array to bytes boundary codec.
//!
//! Carries the declared endianness and reverses each element's bytes when it
//! differs from the host endianness.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/codecs/bytes/v1.0.html>.

use serde::{Deserialize, Serialize};

use crate::{
    array::DataType,
    metadata::{v3::MetadataV3, Endianness, NATIVE_ENDIAN},
};

use super::CodecError;

/// The identifier of the `bytes` codec.
pub const IDENTIFIER: &str = "bytes";

/// Configuration parameters for the `bytes` codec.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
pub struct BytesCodecConfiguration {
    /// The endianness of the data. Optional for single-byte data types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endian: Option<Endianness>,
}

/// A `bytes` codec implementation.
#[derive(Debug, Clone, Copy)]
pub struct BytesCodec {
    endian: Option<Endianness>,
}

impl Default for BytesCodec {
    fn default() -> Self {
        Self::new(Some(NATIVE_ENDIAN))
    }
}

impl BytesCodec {
    /// Create a new `bytes` codec.
    ///
    /// `endian` is optional because an 8-bit type has no endianness.
    #[must_use]
    pub const fn new(endian: Option<Endianness>) -> Self {
        Self { endian }
    }

    /// Create a new `bytes` codec for little endian data.
    #[must_use]
    pub const fn little() -> Self {
        Self::new(Some(Endianness::Little))
    }

    /// Create a new `bytes` codec for big endian data.
    #[must_use]
    pub const fn big() -> Self {
        Self::new(Some(Endianness::Big))
    }

    /// Create a new `bytes` codec from metadata.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the configuration is invalid.
    pub fn new_with_metadata(metadata: &MetadataV3) -> Result<Self, CodecError> {
        let configuration: BytesCodecConfiguration = metadata
            .to_configuration()
            .map_err(|_| CodecError::InvalidConfiguration(IDENTIFIER.to_string()))?;
        Ok(Self::new(configuration.endian))
    }

    /// Return the endianness of the codec.
    #[must_use]
    pub const fn endian(&self) -> Option<Endianness> {
        self.endian
    }

    /// Create the metadata for the codec.
    ///
    /// # Panics
    /// Panics if the configuration does not serialize, which cannot happen.
    #[must_use]
    pub fn metadata(&self) -> MetadataV3 {
        MetadataV3::new_with_serializable_configuration(
            IDENTIFIER,
            &BytesCodecConfiguration {
                endian: self.endian,
            },
        )
        .unwrap()
    }

    fn do_encode_or_decode(
        &self,
        mut value: Vec<u8>,
        data_type: DataType,
    ) -> Result<Vec<u8>, CodecError> {
        let element_size = data_type.size();
        if value.len() % element_size != 0 {
            return Err(CodecError::UnexpectedChunkDecodedSize(
                value.len(),
                (value.len() / element_size * element_size) as u64,
            ));
        }
        if element_size > 1 && self.endian.is_none() {
            return Err(CodecError::EndiannessNotSpecified(element_size));
        }

        if let Some(endian) = self.endian {
            if !endian.is_native() {
                reverse_endianness(&mut value, element_size);
            }
        }
        Ok(value)
    }

    /// Encode native-endian array bytes to the declared endianness.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the length is not a multiple of the
    /// element size, or a multi-byte data type has no declared endianness.
    pub fn encode(&self, bytes: Vec<u8>, data_type: DataType) -> Result<Vec<u8>, CodecError> {
        self.do_encode_or_decode(bytes, data_type)
    }

    /// Decode declared-endianness bytes to native-endian array bytes.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the length is not a multiple of the
    /// element size, or a multi-byte data type has no declared endianness.
    pub fn decode(&self, bytes: Vec<u8>, data_type: DataType) -> Result<Vec<u8>, CodecError> {
        self.do_encode_or_decode(bytes, data_type)
    }
}

/// Reverse the endianness of `bytes` in groups of `element_size` bytes.
fn reverse_endianness(bytes: &mut [u8], element_size: usize) {
    if element_size > 1 {
        for element in bytes.chunks_exact_mut(element_size) {
            element.reverse();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_codec_native_is_noop() {
        let codec = BytesCodec::default();
        let bytes = vec![0u8, 1, 2, 3];
        assert_eq!(
            codec.encode(bytes.clone(), DataType::UInt16).unwrap(),
            bytes
        );
    }

    #[test]
    fn bytes_codec_swaps_non_native() {
        let codec = if NATIVE_ENDIAN == Endianness::Little {
            BytesCodec::big()
        } else {
            BytesCodec::little()
        };
        let encoded = codec
            .encode(vec![0x02u8, 0x01, 0x04, 0x03], DataType::UInt16)
            .unwrap();
        assert_eq!(encoded, vec![0x01, 0x02, 0x03, 0x04]);
        let decoded = codec.decode(encoded, DataType::UInt16).unwrap();
        assert_eq!(decoded, vec![0x02, 0x01, 0x04, 0x03]);
    }

    #[test]
    fn bytes_codec_endianness_required() {
        let codec = BytesCodec::new(None);
        assert!(codec.encode(vec![0u8; 4], DataType::UInt16).is_err());
        assert!(codec.encode(vec![0u8; 4], DataType::UInt8).is_ok());
    }

    #[test]
    fn bytes_codec_invalid_length() {
        let codec = BytesCodec::little();
        assert!(codec.encode(vec![0u8; 3], DataType::UInt16).is_err());
    }

    #[test]
    fn bytes_codec_metadata_round_trip() {
        let metadata: MetadataV3 =
            serde_json::from_str(r#"{"name": "bytes", "configuration": {"endian": "big"}}"#)
                .unwrap();
        let codec = BytesCodec::new_with_metadata(&metadata).unwrap();
        assert_eq!(codec.endian(), Some(Endianness::Big));
        assert_eq!(codec.metadata(), metadata);
    }
}
