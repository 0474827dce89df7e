//! Chunk key encodings.
//!
//! A chunk key encoding maps chunk grid indices to keys in the underlying
//! store. The `default` encoding prefixes keys with `c` (Zarr V3); the `v2`
//! encoding joins the indices directly (Zarr V2, flat layout).
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/core/v3.0.html#chunk-key-encoding>.

use crate::{
    metadata::{
        v3::{ChunkKeyEncodingConfiguration, MetadataV3},
        ChunkKeySeparator,
    },
    storage::StoreKey,
};

use super::UnsupportedChunkKeyEncodingError;

/// A chunk key encoding.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ChunkKeyEncoding {
    /// The Zarr V3 `default` encoding: `c{sep}{i0}{sep}{i1}…`.
    Default {
        /// The separator between chunk grid indices.
        separator: ChunkKeySeparator,
    },
    /// The Zarr V2 encoding: `{i0}{sep}{i1}…`.
    V2 {
        /// The separator between chunk grid indices.
        separator: ChunkKeySeparator,
    },
}

impl ChunkKeyEncoding {
    /// Create a new `default` chunk key encoding with separator `/`.
    #[must_use]
    pub const fn default_slash() -> Self {
        Self::Default {
            separator: ChunkKeySeparator::Slash,
        }
    }

    /// Create a chunk key encoding from Zarr V3 metadata.
    ///
    /// # Errors
    /// Returns an [`UnsupportedChunkKeyEncodingError`] if the metadata does
    /// not name a supported chunk key encoding.
    pub fn from_metadata(
        metadata: &MetadataV3,
    ) -> Result<Self, UnsupportedChunkKeyEncodingError> {
        let separator = || -> Result<ChunkKeySeparator, UnsupportedChunkKeyEncodingError> {
            if metadata.configuration().is_none() {
                // The default encoding configuration is optional.
                return Ok(ChunkKeySeparator::Slash);
            }
            let configuration: ChunkKeyEncodingConfiguration = metadata
                .to_configuration()
                .map_err(|_| UnsupportedChunkKeyEncodingError::from(metadata.to_string()))?;
            Ok(configuration.separator)
        };
        match metadata.name() {
            "default" => Ok(Self::Default {
                separator: separator()?,
            }),
            "v2" => Ok(Self::V2 {
                separator: separator()?,
            }),
            _ => Err(UnsupportedChunkKeyEncodingError::from(
                metadata.to_string(),
            )),
        }
    }

    /// Create the Zarr V3 metadata for the chunk key encoding.
    ///
    /// # Panics
    /// Panics if the configuration does not serialize, which cannot happen.
    #[must_use]
    pub fn metadata(&self) -> MetadataV3 {
        let (name, separator) = match self {
            Self::Default { separator } => ("default", *separator),
            Self::V2 { separator } => ("v2", *separator),
        };
        MetadataV3::new_with_serializable_configuration(
            name,
            &ChunkKeyEncodingConfiguration { separator },
        )
        .unwrap()
    }

    /// Encode chunk grid indices into a store key relative to the array path.
    #[must_use]
    pub fn encode(&self, chunk_grid_indices: &[u64]) -> StoreKey {
        let indices = |separator: &ChunkKeySeparator| {
            chunk_grid_indices
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<String>>()
                .join(&separator.to_string())
        };
        let key = match self {
            Self::Default { separator } => {
                if chunk_grid_indices.is_empty() {
                    "c".to_string()
                } else {
                    format!("c{}{}", separator, indices(separator))
                }
            }
            Self::V2 { separator } => {
                if chunk_grid_indices.is_empty() {
                    "0".to_string()
                } else {
                    indices(separator)
                }
            }
        };
        unsafe { StoreKey::new_unchecked(key) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_slash_nd() {
        let key = ChunkKeyEncoding::default_slash().encode(&[1, 23, 45]);
        assert_eq!(key, StoreKey::new("c/1/23/45").unwrap());
    }

    #[test]
    fn default_dot_nd() {
        let key = ChunkKeyEncoding::Default {
            separator: ChunkKeySeparator::Dot,
        }
        .encode(&[1, 23, 45]);
        assert_eq!(key, StoreKey::new("c.1.23.45").unwrap());
    }

    #[test]
    fn v2_dot_nd() {
        let key = ChunkKeyEncoding::V2 {
            separator: ChunkKeySeparator::Dot,
        }
        .encode(&[1, 23, 45]);
        assert_eq!(key, StoreKey::new("1.23.45").unwrap());
    }

    #[test]
    fn v2_slash_nd() {
        let key = ChunkKeyEncoding::V2 {
            separator: ChunkKeySeparator::Slash,
        }
        .encode(&[1, 23, 45]);
        assert_eq!(key, StoreKey::new("1/23/45").unwrap());
    }

    #[test]
    fn from_metadata() {
        let metadata: MetadataV3 =
            serde_json::from_str(r#"{"name": "default", "configuration": {"separator": "/"}}"#)
                .unwrap();
        assert_eq!(
            ChunkKeyEncoding::from_metadata(&metadata).unwrap(),
            ChunkKeyEncoding::default_slash()
        );
        let metadata: MetadataV3 = serde_json::from_str(r#""default""#).unwrap();
        assert_eq!(
            ChunkKeyEncoding::from_metadata(&metadata).unwrap(),
            ChunkKeyEncoding::default_slash()
        );
        let metadata: MetadataV3 = serde_json::from_str(r#""unknown""#).unwrap();
        assert!(ChunkKeyEncoding::from_metadata(&metadata).is_err());
    }
}
