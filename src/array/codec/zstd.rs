//! The `zstd` bytes to bytes codec.
//!
//! See <https://github.com/zarr-developers/zarr-specs/pull/256>.

use serde::{Deserialize, Serialize};

use crate::metadata::v3::MetadataV3;

use super::CodecError;

/// The identifier of the `zstd` codec.
pub const IDENTIFIER: &str = "zstd";

/// Configuration parameters for the `zstd` codec.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Debug)]
pub struct ZstdCodecConfiguration {
    /// The compression level.
    pub level: ZstdCompressionLevel,
    /// Whether to store a frame checksum. Accepted and ignored on decode.
    #[serde(default)]
    pub checksum: bool,
}

/// A Zstd compression level, clamped to `[1, 22]`.
#[derive(Serialize, Clone, Copy, Eq, PartialEq, Debug)]
pub struct ZstdCompressionLevel(i32);

impl<'de> serde::Deserialize<'de> for ZstdCompressionLevel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let level = i32::deserialize(d)?;
        Ok(Self(level.clamp(1, 22)))
    }
}

impl From<i32> for ZstdCompressionLevel {
    fn from(level: i32) -> Self {
        Self(level.clamp(1, 22))
    }
}

impl ZstdCompressionLevel {
    /// Return the level as an [`i32`].
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

/// A `zstd` codec implementation.
#[derive(Clone, Copy, Debug)]
pub struct ZstdCodec {
    compression: ZstdCompressionLevel,
    checksum: bool,
}

impl ZstdCodec {
    /// Create a new `zstd` codec.
    #[must_use]
    pub fn new(compression: i32, checksum: bool) -> Self {
        Self {
            compression: compression.into(),
            checksum,
        }
    }

    /// Create a new `zstd` codec from metadata.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the configuration is invalid.
    pub fn new_with_metadata(metadata: &MetadataV3) -> Result<Self, CodecError> {
        let configuration: ZstdCodecConfiguration = metadata
            .to_configuration()
            .map_err(|_| CodecError::InvalidConfiguration(IDENTIFIER.to_string()))?;
        Ok(Self {
            compression: configuration.level,
            checksum: configuration.checksum,
        })
    }

    /// Create the metadata for the codec.
    ///
    /// # Panics
    /// Panics if the configuration does not serialize, which cannot happen.
    #[must_use]
    pub fn metadata(&self) -> MetadataV3 {
        MetadataV3::new_with_serializable_configuration(
            IDENTIFIER,
            &ZstdCodecConfiguration {
                level: self.compression,
                checksum: self.checksum,
            },
        )
        .unwrap()
    }

    /// Encode `decoded_value` as a zstd frame.
    ///
    /// # Errors
    /// Returns a [`CodecError`] on a compression failure.
    pub fn encode(&self, decoded_value: &[u8]) -> Result<Vec<u8>, CodecError> {
        zstd::encode_all(decoded_value, self.compression.as_i32()).map_err(CodecError::IOError)
    }

    /// Decode a zstd frame in `encoded_value`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the encoded data is not a valid zstd frame.
    pub fn decode(&self, encoded_value: &[u8]) -> Result<Vec<u8>, CodecError> {
        zstd::decode_all(encoded_value).map_err(CodecError::IOError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON_VALID: &str = r#"{ "level": 22, "checksum": false }"#;

    #[test]
    fn codec_zstd_round_trip() {
        let configuration: ZstdCodecConfiguration = serde_json::from_str(JSON_VALID).unwrap();
        let codec = ZstdCodec::new(configuration.level.as_i32(), configuration.checksum);
        let bytes: Vec<u8> = (0..255u8).cycle().take(1024).collect();
        let encoded = codec.encode(&bytes).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(bytes, decoded);
    }

    #[test]
    fn codec_zstd_level_clamp() {
        let level: ZstdCompressionLevel = serde_json::from_str("40").unwrap();
        assert_eq!(level.as_i32(), 22);
        let level: ZstdCompressionLevel = serde_json::from_str("-5").unwrap();
        assert_eq!(level.as_i32(), 1);
    }
}
