//! Zarr metadata documents.
//!
//! Covers the Zarr V3 `zarr.json` document and the Zarr V2
//! `.zarray`/`.zgroup`/`.zattrs` documents, plus the conversion that unifies
//! V2 array metadata into the V3 form consumed by
//! [`Array`](crate::array::Array).

pub mod v2;
pub mod v2_to_v3;
pub mod v3;

use derive_more::Display;
use serde::{Deserialize, Serialize};

pub use v2_to_v3::{array_metadata_v2_to_v3, ArrayMetadataV2ToV3ConversionError};

/// The separator placed between chunk grid indices in a chunk key.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Debug, Display)]
pub enum ChunkKeySeparator {
    /// The `/` character.
    #[serde(rename = "/")]
    #[display("/")]
    Slash,
    /// The `.` character.
    #[serde(rename = ".")]
    #[display(".")]
    Dot,
}

/// The endianness of each element in an array, either `big` or `little`.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Debug, Display)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    /// The least significant byte is stored first.
    #[display("little")]
    Little,
    /// The most significant byte is stored first.
    #[display("big")]
    Big,
}

impl Endianness {
    /// Return true if the endianness matches the host endianness.
    #[must_use]
    pub fn is_native(self) -> bool {
        self == NATIVE_ENDIAN
    }
}

/// The endianness of the host.
#[cfg(target_endian = "big")]
pub const NATIVE_ENDIAN: Endianness = Endianness::Big;
/// The endianness of the host.
#[cfg(target_endian = "little")]
pub const NATIVE_ENDIAN: Endianness = Endianness::Little;

/// Array or group metadata, in either Zarr version.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(untagged)]
pub enum NodeMetadata {
    /// Zarr V3 array metadata.
    ArrayV3(v3::ArrayMetadataV3),
    /// Zarr V3 group metadata.
    GroupV3(v3::GroupMetadataV3),
    /// Zarr V2 array metadata.
    ArrayV2(v2::ArrayMetadataV2),
    /// Zarr V2 group metadata.
    GroupV2(v2::GroupMetadataV2),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_key_separator_serde() {
        assert_eq!(
            serde_json::from_str::<ChunkKeySeparator>(r#""/""#).unwrap(),
            ChunkKeySeparator::Slash
        );
        assert_eq!(
            serde_json::from_str::<ChunkKeySeparator>(r#"".""#).unwrap(),
            ChunkKeySeparator::Dot
        );
        assert!(serde_json::from_str::<ChunkKeySeparator>(r#""-""#).is_err());
    }

    #[test]
    fn node_metadata_dispatch() {
        let group_v3: NodeMetadata =
            serde_json::from_str(r#"{"zarr_format": 3, "node_type": "group"}"#).unwrap();
        assert!(matches!(group_v3, NodeMetadata::GroupV3(_)));
        let group_v2: NodeMetadata = serde_json::from_str(r#"{"zarr_format": 2}"#).unwrap();
        assert!(matches!(group_v2, NodeMetadata::GroupV2(_)));
    }
}
