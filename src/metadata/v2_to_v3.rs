//! Conversion of Zarr V2 metadata documents to V3.
//!
//! The array engine consumes V3 metadata; V2 arrays are converted on open.

use thiserror::Error;

use super::{
    v2::{
        data_type_v2_to_endianness, ArrayMetadataV2, ArrayMetadataV2Order, CompressorMetadataV2,
        DataTypeMetadataV2Error, GroupMetadataV2,
    },
    v3::{
        ArrayMetadataV3, ChunkKeyEncodingConfiguration, GroupMetadataV3, MetadataV3,
        RegularChunkGridConfiguration,
    },
    ChunkKeySeparator,
};

/// Convert Zarr V2 group metadata to V3.
#[must_use]
pub fn group_metadata_v2_to_v3(group_metadata_v2: &GroupMetadataV2) -> GroupMetadataV3 {
    GroupMetadataV3::new(group_metadata_v2.attributes.clone())
}

/// An error converting Zarr V2 array metadata to V3.
#[derive(Debug, Error)]
pub enum ArrayMetadataV2ToV3ConversionError {
    /// Unsupported data type.
    #[error("unsupported data type {_0:?}")]
    UnsupportedDataType(String),
    /// Invalid data type endianness.
    #[error(transparent)]
    InvalidEndianness(#[from] DataTypeMetadataV2Error),
    /// An unsupported codec.
    #[error("unsupported codec {_0} with configuration {_1:?}")]
    UnsupportedCodec(String, serde_json::Map<String, serde_json::Value>),
    /// An unsupported array order.
    #[error("only C order arrays are supported")]
    UnsupportedOrder,
    /// Serialization/deserialization error.
    #[error("JSON serialization or deserialization error: {_0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Map a numpy dtype string to the size in bytes of its element type.
fn dtype_element_size(dtype: &str) -> Option<usize> {
    dtype.get(2..).and_then(|digits| digits.parse().ok())
}

/// Map a numpy dtype string (sans byte order) to a Zarr V3 data type name.
fn dtype_v2_to_v3_name(dtype: &str) -> Option<&'static str> {
    match dtype.get(1..) {
        Some("b1") => Some("bool"),
        Some("i1") => Some("int8"),
        Some("i2") => Some("int16"),
        Some("i4") => Some("int32"),
        Some("i8") => Some("int64"),
        Some("u1") => Some("uint8"),
        Some("u2") => Some("uint16"),
        Some("u4") => Some("uint32"),
        Some("u8") => Some("uint64"),
        Some("f4") => Some("float32"),
        Some("f8") => Some("float64"),
        _ => None,
    }
}

/// Convert a Zarr V2 compressor to a V3 codec metadata entry.
///
/// Supported compressors are `blosc`, `zstd` and `gzip`.
fn compressor_v2_to_v3(
    compressor: &CompressorMetadataV2,
    element_size: usize,
) -> Result<MetadataV3, ArrayMetadataV2ToV3ConversionError> {
    let unsupported = || {
        ArrayMetadataV2ToV3ConversionError::UnsupportedCodec(
            compressor.id.clone(),
            compressor.configuration.clone(),
        )
    };
    match compressor.id.as_str() {
        "blosc" => {
            let mut configuration = compressor.configuration.clone();
            // numcodecs blosc carries no typesize; take it from the dtype so
            // shuffled re-encoding writes the correct frame header.
            configuration
                .entry("typesize")
                .or_insert_with(|| element_size.into());
            // AUTOSHUFFLE (-1) resolves against the element size.
            if configuration.get("shuffle").and_then(serde_json::Value::as_i64) == Some(-1) {
                let shuffle = i64::from(element_size > 1);
                configuration.insert("shuffle".to_string(), shuffle.into());
            }
            Ok(MetadataV3::new_with_configuration("blosc", configuration))
        }
        "zstd" => {
            let level = compressor
                .configuration
                .get("level")
                .cloned()
                .unwrap_or_else(|| 0.into());
            let mut configuration = serde_json::Map::new();
            configuration.insert("level".to_string(), level);
            Ok(MetadataV3::new_with_configuration("zstd", configuration))
        }
        "gzip" => {
            let level = compressor
                .configuration
                .get("level")
                .cloned()
                .unwrap_or_else(|| 1.into());
            let mut configuration = serde_json::Map::new();
            configuration.insert("level".to_string(), level);
            Ok(MetadataV3::new_with_configuration("gzip", configuration))
        }
        _ => Err(unsupported()),
    }
}

/// Convert Zarr V2 array metadata to V3.
///
/// `separator` is the chunk key separator to record, which the caller may
/// have probed from the store when `dimension_separator` was absent.
///
/// # Errors
/// Returns an [`ArrayMetadataV2ToV3ConversionError`] if the metadata is
/// invalid or uses features without a V3 counterpart in this implementation.
pub fn array_metadata_v2_to_v3(
    array_metadata_v2: &ArrayMetadataV2,
    separator: ChunkKeySeparator,
) -> Result<ArrayMetadataV3, ArrayMetadataV2ToV3ConversionError> {
    if array_metadata_v2.order != ArrayMetadataV2Order::C {
        return Err(ArrayMetadataV2ToV3ConversionError::UnsupportedOrder);
    }
    if array_metadata_v2
        .filters
        .as_ref()
        .is_some_and(|filters| !filters.is_empty())
    {
        return Err(ArrayMetadataV2ToV3ConversionError::UnsupportedCodec(
            "filters".to_string(),
            serde_json::Map::default(),
        ));
    }

    let dtype = &array_metadata_v2.dtype;
    let endianness = data_type_v2_to_endianness(dtype)?;
    let data_type_name = dtype_v2_to_v3_name(dtype).ok_or_else(|| {
        ArrayMetadataV2ToV3ConversionError::UnsupportedDataType(dtype.clone())
    })?;
    let element_size = dtype_element_size(dtype).ok_or_else(|| {
        ArrayMetadataV2ToV3ConversionError::UnsupportedDataType(dtype.clone())
    })?;

    let chunk_grid = MetadataV3::new_with_serializable_configuration(
        "regular",
        &RegularChunkGridConfiguration {
            chunk_shape: array_metadata_v2.chunks.clone(),
        },
    )?;

    let chunk_key_encoding = MetadataV3::new_with_serializable_configuration(
        "v2",
        &ChunkKeyEncodingConfiguration { separator },
    )?;

    let mut codecs = vec![MetadataV3::new_with_serializable_configuration(
        "bytes",
        &serde_json::json!({ "endian": endianness })
            .as_object()
            .cloned()
            .unwrap_or_default(),
    )?];
    if let Some(compressor) = &array_metadata_v2.compressor {
        codecs.push(compressor_v2_to_v3(compressor, element_size)?);
    }

    let fill_value = serde_json::to_value(&array_metadata_v2.fill_value)?;

    Ok(ArrayMetadataV3::new(
        array_metadata_v2.shape.clone(),
        MetadataV3::new(data_type_name),
        chunk_grid,
        chunk_key_encoding,
        fill_value,
        codecs,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v2_metadata(dtype: &str, compressor: Option<&str>) -> ArrayMetadataV2 {
        let compressor: Option<CompressorMetadataV2> =
            compressor.map(|json| serde_json::from_str(json).unwrap());
        serde_json::from_value(serde_json::json!({
            "zarr_format": 2,
            "shape": [4, 4],
            "chunks": [2, 2],
            "dtype": dtype,
            "compressor": compressor,
            "fill_value": 0,
            "order": "C"
        }))
        .unwrap()
    }

    #[test]
    fn v2_to_v3_uncompressed() {
        let v3 =
            array_metadata_v2_to_v3(&v2_metadata(">u2", None), ChunkKeySeparator::Dot).unwrap();
        assert_eq!(v3.data_type.name(), "uint16");
        assert_eq!(v3.chunk_key_encoding.name(), "v2");
        assert_eq!(v3.codecs.len(), 1);
        assert_eq!(v3.codecs[0].name(), "bytes");
        assert_eq!(
            v3.codecs[0]
                .configuration()
                .unwrap()
                .get("endian")
                .unwrap(),
            "big"
        );
    }

    #[test]
    fn v2_to_v3_blosc_typesize() {
        let v3 = array_metadata_v2_to_v3(
            &v2_metadata(
                "<f4",
                Some(r#"{"id": "blosc", "cname": "lz4", "clevel": 5, "shuffle": 1, "blocksize": 0}"#),
            ),
            ChunkKeySeparator::Dot,
        )
        .unwrap();
        assert_eq!(v3.codecs.len(), 2);
        assert_eq!(v3.codecs[1].name(), "blosc");
        assert_eq!(
            v3.codecs[1]
                .configuration()
                .unwrap()
                .get("typesize")
                .and_then(serde_json::Value::as_u64),
            Some(4)
        );
    }

    #[test]
    fn v2_to_v3_unsupported() {
        assert!(array_metadata_v2_to_v3(
            &v2_metadata("<c8", None),
            ChunkKeySeparator::Dot
        )
        .is_err());
        assert!(array_metadata_v2_to_v3(
            &v2_metadata("<u2", Some(r#"{"id": "lzma"}"#)),
            ChunkKeySeparator::Dot
        )
        .is_err());
    }
}
