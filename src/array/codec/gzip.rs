//! The `gzip` bytes to bytes codec.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/codecs/gzip/v1.0.html>.

use std::io::{Cursor, Read};

use flate2::bufread::{GzDecoder, GzEncoder};
use serde::{Deserialize, Serialize};

use crate::metadata::v3::MetadataV3;

use super::CodecError;

/// The identifier of the `gzip` codec.
pub const IDENTIFIER: &str = "gzip";

/// Configuration parameters for the `gzip` codec.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
pub struct GzipCodecConfiguration {
    /// The compression level.
    pub level: GzipCompressionLevel,
}

/// A gzip compression level, an integer from 0 to 9.
///
/// The level maps to [`flate2::Compression`] as `0` → none, `1` → fastest,
/// `7` and above → best, anything else → default.
#[derive(Serialize, Clone, Copy, Eq, PartialEq, Debug)]
pub struct GzipCompressionLevel(u32);

impl<'de> serde::Deserialize<'de> for GzipCompressionLevel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let level = u32::deserialize(d)?;
        if level <= 9 {
            Ok(Self(level))
        } else {
            Err(serde::de::Error::custom(
                "gzip compression level must be an integer from 0 to 9",
            ))
        }
    }
}

impl GzipCompressionLevel {
    /// Return the level as a [`u32`].
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    fn as_flate2(self) -> flate2::Compression {
        match self.0 {
            0 => flate2::Compression::none(),
            1 => flate2::Compression::fast(),
            7..=9 => flate2::Compression::best(),
            _ => flate2::Compression::default(),
        }
    }
}

/// A gzip compression level error.
#[derive(Debug, thiserror::Error)]
#[error("invalid gzip compression level {0}, must be 0 to 9")]
pub struct GzipCompressionLevelError(u32);

/// A `gzip` codec implementation.
#[derive(Clone, Copy, Debug)]
pub struct GzipCodec {
    compression_level: GzipCompressionLevel,
}

impl GzipCodec {
    /// Create a new `gzip` codec.
    ///
    /// # Errors
    /// Returns [`GzipCompressionLevelError`] if `compression_level` is not valid.
    pub fn new(compression_level: u32) -> Result<Self, GzipCompressionLevelError> {
        if compression_level <= 9 {
            Ok(Self {
                compression_level: GzipCompressionLevel(compression_level),
            })
        } else {
            Err(GzipCompressionLevelError(compression_level))
        }
    }

    /// Create a new `gzip` codec from metadata.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the configuration is invalid.
    pub fn new_with_metadata(metadata: &MetadataV3) -> Result<Self, CodecError> {
        let configuration: GzipCodecConfiguration = metadata
            .to_configuration()
            .map_err(|_| CodecError::InvalidConfiguration(IDENTIFIER.to_string()))?;
        Ok(Self {
            compression_level: configuration.level,
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
            &GzipCodecConfiguration {
                level: self.compression_level,
            },
        )
        .unwrap()
    }

    /// Encode `decoded_value` with the gzip envelope.
    ///
    /// # Errors
    /// Returns a [`CodecError`] on an IO failure.
    pub fn encode(&self, decoded_value: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut encoder = GzEncoder::new(
            Cursor::new(decoded_value),
            self.compression_level.as_flate2(),
        );
        let mut out: Vec<u8> = Vec::new();
        encoder.read_to_end(&mut out)?;
        Ok(out)
    }

    /// Decode a gzip stream in `encoded_value`.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the encoded data is not a valid gzip stream.
    pub fn decode(&self, encoded_value: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut decoder = GzDecoder::new(Cursor::new(encoded_value));
        let mut out: Vec<u8> = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON_VALID: &str = r#"{ "level": 5 }"#;

    #[test]
    fn codec_gzip_round_trip() {
        let configuration: GzipCodecConfiguration = serde_json::from_str(JSON_VALID).unwrap();
        let codec = GzipCodec {
            compression_level: configuration.level,
        };
        let bytes: Vec<u8> = (0..255u8).cycle().take(1024).collect();
        let encoded = codec.encode(&bytes).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(bytes, decoded);
    }

    #[test]
    fn codec_gzip_levels() {
        for level in [0, 1, 5, 9] {
            let codec = GzipCodec::new(level).unwrap();
            let bytes = vec![7u8; 4096];
            assert_eq!(codec.decode(&codec.encode(&bytes).unwrap()).unwrap(), bytes);
        }
        assert!(GzipCodec::new(10).is_err());
    }

    #[test]
    fn codec_gzip_invalid_configuration() {
        assert!(serde_json::from_str::<GzipCodecConfiguration>(r#"{ "level": 10 }"#).is_err());
    }
}
