//! Zarr V2 metadata (`.zarray`, `.zgroup` and `.zattrs` documents).
//!
//! See <https://zarr.readthedocs.io/en/stable/spec/v2.html>.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::array::ArrayShape;

use super::{ChunkKeySeparator, Endianness};

/// Zarr V2 array metadata.
///
/// An example `JSON` document for a Zarr V2 array:
/// ```json
/// {
///     "chunks": [1000, 1000],
///     "compressor": {
///         "id": "blosc",
///         "cname": "lz4",
///         "clevel": 5,
///         "shuffle": 1
///     },
///     "dtype": "<f8",
///     "fill_value": "NaN",
///     "filters": null,
///     "order": "C",
///     "shape": [10000, 10000],
///     "zarr_format": 2
/// }
/// ```
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ArrayMetadataV2 {
    /// An integer defining the version of the storage specification to which the array adheres. Must be `2`.
    pub zarr_format: monostate::MustBe!(2u64),
    /// An array of integers providing the length of each dimension of the Zarr array.
    pub shape: ArrayShape,
    /// A list of integers defining the length of each dimension of a chunk of the array.
    pub chunks: Vec<u64>,
    /// The data type of the Zarr array, as a numpy dtype string.
    pub dtype: String,
    /// A JSON object identifying the primary compression codec, or null if no compressor is to be used.
    pub compressor: Option<CompressorMetadataV2>,
    /// A scalar value providing the default value to use for uninitialized portions of the array.
    pub fill_value: FillValueMetadataV2,
    /// Either `"C"` or `"F"`, defining the layout of bytes within each chunk of the array.
    pub order: ArrayMetadataV2Order,
    /// A list of JSON objects providing codec configurations, or null if no filters are to be applied.
    #[serde(default)]
    pub filters: Option<Vec<serde_json::Map<String, serde_json::Value>>>,
    /// If present, either the string "." or "/" defining the separator placed between the dimensions of a chunk.
    ///
    /// Kept as an [`Option`] so that an omitted field is distinguishable from
    /// an explicit "." — the group navigator probes the store for the
    /// separator when the field is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_separator: Option<ChunkKeySeparator>,
}

/// A Zarr V2 compressor: an `id` plus free-form configuration fields.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct CompressorMetadataV2 {
    /// The compressor identifier (e.g. `blosc`, `zstd`, `gzip`).
    pub id: String,
    /// The compressor configuration.
    #[serde(flatten)]
    pub configuration: serde_json::Map<String, serde_json::Value>,
}

/// Zarr V2 fill value metadata.
///
/// Parsed permissively; this implementation materialises zeros for absent
/// chunks regardless of the declared fill value.
#[derive(Clone, PartialEq, Debug)]
pub enum FillValueMetadataV2 {
    /// No fill value.
    Null,
    /// NaN (not-a-number).
    NaN,
    /// Positive infinity.
    Infinity,
    /// Negative infinity.
    NegInfinity,
    /// A number.
    Number(serde_json::Number),
    /// A string.
    String(String),
}

impl<'de> serde::Deserialize<'de> for FillValueMetadataV2 {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum FillValueMetadataV2Type {
            String(String),
            Number(serde_json::Number),
            Null,
        }
        let fill_value = FillValueMetadataV2Type::deserialize(d)?;
        match fill_value {
            FillValueMetadataV2Type::String(string) => match string.as_str() {
                "NaN" => Ok(Self::NaN),
                "Infinity" => Ok(Self::Infinity),
                "-Infinity" => Ok(Self::NegInfinity),
                _ => Ok(Self::String(string)),
            },
            FillValueMetadataV2Type::Number(number) => Ok(Self::Number(number)),
            FillValueMetadataV2Type::Null => Ok(Self::Null),
        }
    }
}

impl Serialize for FillValueMetadataV2 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::NaN => serializer.serialize_str("NaN"),
            Self::Infinity => serializer.serialize_str("Infinity"),
            Self::NegInfinity => serializer.serialize_str("-Infinity"),
            Self::Number(number) => number.serialize(serializer),
            Self::String(string) => string.serialize(serializer),
        }
    }
}

/// Zarr V2 order metadata. Indicates the layout of bytes within a chunk.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArrayMetadataV2Order {
    /// Row-major order. The last dimension varies fastest.
    C,
    /// Column-major order. The first dimension varies fastest.
    F,
}

/// Zarr V2 group metadata.
///
/// A `.zgroup` document:
/// ```json
/// { "zarr_format": 2 }
/// ```
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct GroupMetadataV2 {
    /// An integer defining the version of the storage specification to which the group adheres. Must be `2`.
    pub zarr_format: monostate::MustBe!(2u64),
    /// Optional user defined attributes from a sibling `.zattrs` document.
    #[serde(default, skip_serializing)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Default for GroupMetadataV2 {
    fn default() -> Self {
        Self {
            zarr_format: monostate::MustBe!(2u64),
            attributes: serde_json::Map::default(),
        }
    }
}

/// An invalid Zarr V2 data type error.
#[derive(Debug, From, Error)]
#[error("invalid Zarr V2 data type {0}")]
pub struct DataTypeMetadataV2Error(String);

/// Get the endianness of a Zarr V2 dtype string.
///
/// The first character must be one of `<` (little), `>` (big), `|` (not
/// applicable, mapped to little) or `=` (host native).
///
/// # Errors
/// Returns a [`DataTypeMetadataV2Error`] if the byte-order prefix is invalid.
pub fn data_type_v2_to_endianness(dtype: &str) -> Result<Endianness, DataTypeMetadataV2Error> {
    match dtype.chars().next() {
        Some('<' | '|') => Ok(Endianness::Little),
        Some('>') => Ok(Endianness::Big),
        Some('=') => Ok(super::NATIVE_ENDIAN),
        _ => Err(DataTypeMetadataV2Error(dtype.to_string())),
    }
}
