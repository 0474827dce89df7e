//! The `blosc` bytes to bytes codec.
//!
//! A native implementation of the blosc1 container format: a 16-byte frame
//! header, a table of absolute block offsets, and per-block streams that are
//! optionally byte-shuffled and split into one stream per byte position.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/codecs/blosc/v1.0.html>
//! and <https://github.com/Blosc/c-blosc/blob/main/README_CHUNK_FORMAT.rst>.

use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::metadata::v3::MetadataV3;

use super::CodecError;

/// The identifier of the `blosc` codec.
pub const IDENTIFIER: &str = "blosc";

/// The length of the frame header in bytes.
const HEADER_LENGTH: usize = 16;

/// Frame format version written by this implementation.
const FORMAT_VERSION: u8 = 0x01;
const FORMAT_VERSION_LZ: u8 = 0x01;

// Header flag bits.
const FLAG_SHUFFLE: u8 = 0x01;
const FLAG_MEMCPYED: u8 = 0x02;
const FLAG_BITSHUFFLE: u8 = 0x04;
const FLAG_DOSPLIT: u8 = 0x10;

// Inner compressor ids, stored in flag bits 5-7.
const COMPRESSOR_BLOSCLZ: u8 = 0;
const COMPRESSOR_LZ4: u8 = 1;
const COMPRESSOR_SNAPPY: u8 = 2;
const COMPRESSOR_ZLIB: u8 = 3;
const COMPRESSOR_ZSTD: u8 = 4;

/// The maximum automatic block size in bytes.
const MAX_AUTO_BLOCKSIZE: usize = 256 * 1024;

/// The maximum representable type size; larger elements saturate.
const MAX_TYPESIZE: usize = 255;

/// A blosc inner compressor.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum BloscCompressor {
    /// BloscLZ (not supported).
    BloscLZ,
    /// LZ4.
    LZ4,
    /// LZ4HC. Shares the LZ4 stream format.
    LZ4HC,
    /// Snappy (not supported).
    Snappy,
    /// Zlib (raw deflate streams).
    Zlib,
    /// Zstd.
    Zstd,
}

impl BloscCompressor {
    const fn id(self) -> u8 {
        match self {
            Self::BloscLZ => COMPRESSOR_BLOSCLZ,
            Self::LZ4 | Self::LZ4HC => COMPRESSOR_LZ4,
            Self::Snappy => COMPRESSOR_SNAPPY,
            Self::Zlib => COMPRESSOR_ZLIB,
            Self::Zstd => COMPRESSOR_ZSTD,
        }
    }
}

/// The blosc shuffle mode.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum BloscShuffleMode {
    /// No shuffling.
    NoShuffle,
    /// Byte-wise shuffling.
    ByteShuffle,
}

/// Configuration parameters for the `blosc` codec.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
pub struct BloscCodecConfiguration {
    /// The inner compressor.
    pub cname: BloscCompressor,
    /// The compression level, an integer from 0 to 9. Level 0 stores frames
    /// uncompressed (memcpy framing).
    pub clevel: u8,
    /// The shuffle mode: `"noshuffle"`, `"shuffle"`/`"byteshuffle"`, or the
    /// numcodecs integers `0`/`1`.
    pub shuffle: BloscShuffleModeMetadata,
    /// The element size in bytes used by shuffling. Optional; arrays supply
    /// it from their data type when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typesize: Option<usize>,
    /// The uncompressed block size in bytes. `0` selects an automatic size.
    #[serde(default)]
    pub blocksize: usize,
}

/// The shuffle mode as it appears in metadata.
///
/// Zarr V3 metadata uses strings; numcodecs (Zarr V2) uses integers.
/// Bit-shuffle (`"bitshuffle"`/`2`) parses but is rejected at codec
/// construction.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum BloscShuffleModeMetadata {
    /// No shuffling.
    NoShuffle,
    /// Byte-wise shuffling.
    ByteShuffle,
    /// Bit-wise shuffling (not supported).
    BitShuffle,
}

impl Serialize for BloscShuffleModeMetadata {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::NoShuffle => s.serialize_str("noshuffle"),
            Self::ByteShuffle => s.serialize_str("shuffle"),
            Self::BitShuffle => s.serialize_str("bitshuffle"),
        }
    }
}

impl<'de> serde::Deserialize<'de> for BloscShuffleModeMetadata {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Intermediate {
            Int(i64),
            Str(String),
        }
        match Intermediate::deserialize(d)? {
            Intermediate::Int(0) => Ok(Self::NoShuffle),
            Intermediate::Int(1) => Ok(Self::ByteShuffle),
            Intermediate::Int(2) => Ok(Self::BitShuffle),
            Intermediate::Str(s) => match s.as_str() {
                "noshuffle" => Ok(Self::NoShuffle),
                "shuffle" | "byteshuffle" => Ok(Self::ByteShuffle),
                "bitshuffle" => Ok(Self::BitShuffle),
                _ => Err(serde::de::Error::custom(format!(
                    "invalid blosc shuffle mode {s}"
                ))),
            },
            Intermediate::Int(i) => Err(serde::de::Error::custom(format!(
                "invalid blosc shuffle mode {i}"
            ))),
        }
    }
}

/// A `blosc` codec implementation.
#[derive(Clone, Debug)]
pub struct BloscCodec {
    cname: BloscCompressor,
    clevel: u8,
    shuffle: BloscShuffleMode,
    typesize: usize,
    blocksize: usize,
}

impl BloscCodec {
    /// Create a new `blosc` codec.
    ///
    /// The block size is chosen automatically if `blocksize` is zero.
    /// `typesize` must be a positive integer if shuffling is enabled.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if
    ///  - the compressor is `blosclz` or `snappy` (not supported),
    ///  - `clevel` exceeds 9, or
    ///  - shuffling is enabled without a positive `typesize`.
    pub fn new(
        cname: BloscCompressor,
        clevel: u8,
        shuffle: BloscShuffleMode,
        typesize: Option<usize>,
        blocksize: usize,
    ) -> Result<Self, CodecError> {
        if matches!(cname, BloscCompressor::BloscLZ | BloscCompressor::Snappy) {
            return Err(CodecError::Unsupported(format!(
                "blosc compressor {cname:?}"
            )));
        }
        if clevel > 9 {
            return Err(CodecError::InvalidConfiguration(format!(
                "{IDENTIFIER} clevel {clevel}"
            )));
        }
        let typesize = typesize.unwrap_or(1);
        if shuffle == BloscShuffleMode::ByteShuffle && typesize == 0 {
            return Err(CodecError::InvalidConfiguration(format!(
                "{IDENTIFIER} requires a positive typesize when shuffling"
            )));
        }
        Ok(Self {
            cname,
            clevel,
            shuffle,
            typesize: typesize.min(MAX_TYPESIZE).max(1),
            blocksize,
        })
    }

    /// Create a new `blosc` codec from metadata.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the configuration is invalid or uses an
    /// unsupported compressor or shuffle mode.
    pub fn new_with_metadata(metadata: &MetadataV3) -> Result<Self, CodecError> {
        let configuration: BloscCodecConfiguration = metadata
            .to_configuration()
            .map_err(|_| CodecError::InvalidConfiguration(IDENTIFIER.to_string()))?;
        let shuffle = match configuration.shuffle {
            BloscShuffleModeMetadata::NoShuffle => BloscShuffleMode::NoShuffle,
            BloscShuffleModeMetadata::ByteShuffle => BloscShuffleMode::ByteShuffle,
            BloscShuffleModeMetadata::BitShuffle => {
                return Err(CodecError::Unsupported("blosc bit-shuffle".to_string()));
            }
        };
        Self::new(
            configuration.cname,
            configuration.clevel,
            shuffle,
            configuration.typesize,
            configuration.blocksize,
        )
    }

    /// Create the metadata for the codec.
    ///
    /// # Panics
    /// Panics if the configuration does not serialize, which cannot happen.
    #[must_use]
    pub fn metadata(&self) -> MetadataV3 {
        let shuffle = match self.shuffle {
            BloscShuffleMode::NoShuffle => BloscShuffleModeMetadata::NoShuffle,
            BloscShuffleMode::ByteShuffle => BloscShuffleModeMetadata::ByteShuffle,
        };
        MetadataV3::new_with_serializable_configuration(
            IDENTIFIER,
            &BloscCodecConfiguration {
                cname: self.cname,
                clevel: self.clevel,
                shuffle,
                typesize: Some(self.typesize),
                blocksize: self.blocksize,
            },
        )
        .unwrap()
    }

    fn compress_stream(&self, stream: &[u8]) -> Result<Vec<u8>, CodecError> {
        match self.cname {
            BloscCompressor::LZ4 | BloscCompressor::LZ4HC => {
                Ok(lz4_flex::block::compress(stream))
            }
            BloscCompressor::Zlib => {
                let mut encoder = flate2::bufread::DeflateEncoder::new(
                    stream,
                    flate2::Compression::new(u32::from(self.clevel.clamp(1, 9))),
                );
                let mut out = Vec::new();
                encoder.read_to_end(&mut out)?;
                Ok(out)
            }
            BloscCompressor::Zstd => {
                zstd::encode_all(stream, i32::from(self.clevel.clamp(1, 9)))
                    .map_err(CodecError::IOError)
            }
            BloscCompressor::BloscLZ | BloscCompressor::Snappy => Err(CodecError::Unsupported(
                format!("blosc compressor {:?}", self.cname),
            )),
        }
    }

    /// Encode `decoded_value` as a blosc frame.
    ///
    /// Streams that a compressor would expand are stored raw; all-zero
    /// streams collapse to a zero `csize` marker. Compression level `0`
    /// writes a memcpy frame.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the input exceeds the format's 32-bit size
    /// limits or the compressor fails.
    #[allow(clippy::too_many_lines)]
    pub fn encode(&self, decoded_value: &[u8]) -> Result<Vec<u8>, CodecError> {
        let nbytes = decoded_value.len();
        let nbytes_u32 = u32::try_from(nbytes)
            .map_err(|_| CodecError::Unsupported("blosc input exceeds 2^32 bytes".to_string()))?;

        let typesize = self.typesize;
        let shuffle = self.shuffle == BloscShuffleMode::ByteShuffle && typesize > 1;
        let split = shuffle;

        if self.clevel == 0 {
            // Uncompressed framing: the payload follows the header verbatim.
            let mut frame = Vec::with_capacity(HEADER_LENGTH + nbytes);
            frame.extend(header(
                FLAG_MEMCPYED | (self.cname.id() << 5),
                typesize,
                nbytes_u32,
                nbytes_u32,
                u32::try_from(HEADER_LENGTH + nbytes).map_err(|_| {
                    CodecError::Unsupported("blosc frame exceeds 2^32 bytes".to_string())
                })?,
            ));
            frame.extend_from_slice(decoded_value);
            return Ok(frame);
        }

        let blocksize = self.select_blocksize(nbytes);
        let n_blocks = if nbytes == 0 {
            0
        } else {
            nbytes.div_ceil(blocksize)
        };

        let mut flags = self.cname.id() << 5;
        if shuffle {
            flags |= FLAG_SHUFFLE;
        }
        if split {
            flags |= FLAG_DOSPLIT;
        }

        let mut bstarts = Vec::with_capacity(n_blocks);
        let mut streams: Vec<u8> = Vec::new();
        let data_start = HEADER_LENGTH + 4 * n_blocks;

        let mut scratch = Vec::new();
        for block_index in 0..n_blocks {
            let block_start = block_index * blocksize;
            let block = &decoded_value[block_start..nbytes.min(block_start + blocksize)];
            bstarts.push(
                i32::try_from(data_start + streams.len()).map_err(|_| {
                    CodecError::Unsupported("blosc frame exceeds 2^31 bytes".to_string())
                })?,
            );

            let block = if shuffle {
                scratch.clear();
                shuffle_bytes(block, typesize, &mut scratch);
                scratch.as_slice()
            } else {
                block
            };

            for stream in split_streams(block, if split { typesize } else { 1 }) {
                if stream.iter().all(|&byte| byte == 0) {
                    streams.extend(0i32.to_le_bytes());
                    continue;
                }
                let compressed = self.compress_stream(stream)?;
                if compressed.len() >= stream.len() {
                    // Incompressible; store the stream verbatim.
                    let csize = i32::try_from(stream.len()).map_err(|_| {
                        CodecError::Unsupported("blosc stream exceeds 2^31 bytes".to_string())
                    })?;
                    streams.extend(csize.to_le_bytes());
                    streams.extend_from_slice(stream);
                } else {
                    let csize = i32::try_from(compressed.len()).map_err(|_| {
                        CodecError::Unsupported("blosc stream exceeds 2^31 bytes".to_string())
                    })?;
                    streams.extend(csize.to_le_bytes());
                    streams.extend_from_slice(&compressed);
                }
            }
        }

        let cbytes = u32::try_from(data_start + streams.len())
            .map_err(|_| CodecError::Unsupported("blosc frame exceeds 2^32 bytes".to_string()))?;
        let blocksize_u32 = u32::try_from(blocksize)
            .map_err(|_| CodecError::Unsupported("blosc block exceeds 2^32 bytes".to_string()))?;

        let mut frame = Vec::with_capacity(data_start + streams.len());
        frame.extend(header(flags, typesize, nbytes_u32, blocksize_u32, cbytes));
        for bstart in bstarts {
            frame.extend(bstart.to_le_bytes());
        }
        frame.extend_from_slice(&streams);
        Ok(frame)
    }

    fn select_blocksize(&self, nbytes: usize) -> usize {
        let typesize = self.typesize;
        let blocksize = if self.blocksize > 0 {
            self.blocksize
        } else {
            nbytes.clamp(typesize, MAX_AUTO_BLOCKSIZE)
        };
        // Whole elements per block so shuffling never splits an element.
        let blocksize = blocksize / typesize * typesize;
        blocksize.max(typesize)
    }

    /// Decode a blosc frame in `encoded_value`.
    ///
    /// Decoding is self-describing: the shuffle mode, inner compressor and
    /// block structure are taken from the frame header, not from the codec
    /// configuration.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the frame is malformed or uses an
    /// unsupported feature (bit-shuffle, blosclz, snappy).
    pub fn decode(&self, encoded_value: &[u8]) -> Result<Vec<u8>, CodecError> {
        decode_frame(encoded_value)
    }
}

fn header(flags: u8, typesize: usize, nbytes: u32, blocksize: u32, cbytes: u32) -> [u8; 16] {
    let mut header = [0u8; HEADER_LENGTH];
    header[0] = FORMAT_VERSION;
    header[1] = FORMAT_VERSION_LZ;
    header[2] = flags;
    header[3] = u8::try_from(typesize.min(MAX_TYPESIZE)).unwrap_or(u8::MAX);
    header[4..8].copy_from_slice(&nbytes.to_le_bytes());
    header[8..12].copy_from_slice(&blocksize.to_le_bytes());
    header[12..16].copy_from_slice(&cbytes.to_le_bytes());
    header
}

/// Split `block` into `n` streams: integer division to each stream, the
/// remainder to the last.
fn split_streams(block: &[u8], n: usize) -> impl Iterator<Item = &[u8]> {
    let stream_len = block.len() / n;
    (0..n).map(move |i| {
        if i + 1 == n {
            &block[i * stream_len..]
        } else {
            &block[i * stream_len..(i + 1) * stream_len]
        }
    })
}

/// Byte-shuffle `src` into `dst`: all position-0 bytes first, then all
/// position-1 bytes, and so on. Trailing bytes of a partial element are
/// copied verbatim.
fn shuffle_bytes(src: &[u8], typesize: usize, dst: &mut Vec<u8>) {
    let n_elements = src.len() / typesize;
    let tail = n_elements * typesize;
    dst.resize(src.len(), 0);
    for j in 0..typesize {
        for i in 0..n_elements {
            dst[j * n_elements + i] = src[i * typesize + j];
        }
    }
    dst[tail..].copy_from_slice(&src[tail..]);
}

/// The inverse of [`shuffle_bytes`].
fn unshuffle_bytes(src: &[u8], typesize: usize, dst: &mut Vec<u8>) {
    let n_elements = src.len() / typesize;
    let tail = n_elements * typesize;
    dst.resize(src.len(), 0);
    for j in 0..typesize {
        for i in 0..n_elements {
            dst[i * typesize + j] = src[j * n_elements + i];
        }
    }
    dst[tail..].copy_from_slice(&src[tail..]);
}

fn decompress_stream(
    compressor: u8,
    compressed: &[u8],
    uncompressed_len: usize,
) -> Result<Vec<u8>, CodecError> {
    let decompressed = match compressor {
        COMPRESSOR_LZ4 => lz4_flex::block::decompress(compressed, uncompressed_len)
            .map_err(|err| CodecError::CorruptData(err.to_string()))?,
        COMPRESSOR_ZLIB => {
            let mut decoder = flate2::bufread::DeflateDecoder::new(compressed);
            let mut out = Vec::with_capacity(uncompressed_len);
            decoder.read_to_end(&mut out)?;
            out
        }
        COMPRESSOR_ZSTD => zstd::decode_all(compressed)?,
        _ => {
            return Err(CodecError::Unsupported(format!(
                "blosc inner compressor id {compressor}"
            )));
        }
    };
    if decompressed.len() == uncompressed_len {
        Ok(decompressed)
    } else {
        Err(CodecError::CorruptData(format!(
            "blosc stream decompressed to {} bytes, expected {uncompressed_len}",
            decompressed.len()
        )))
    }
}

fn read_le_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

/// Decode a blosc frame.
#[allow(clippy::too_many_lines)]
fn decode_frame(frame: &[u8]) -> Result<Vec<u8>, CodecError> {
    if frame.len() < HEADER_LENGTH {
        return Err(CodecError::CorruptData(
            "blosc frame is shorter than its header".to_string(),
        ));
    }
    let flags = frame[2];
    let typesize = usize::from(frame[3]).max(1);
    let nbytes = read_le_u32(frame, 4) as usize;
    let blocksize = read_le_u32(frame, 8) as usize;
    let cbytes = read_le_u32(frame, 12) as usize;

    if cbytes != frame.len() {
        return Err(CodecError::CorruptData(format!(
            "blosc frame length {} does not match cbytes {cbytes}",
            frame.len()
        )));
    }
    if flags & FLAG_BITSHUFFLE != 0 {
        return Err(CodecError::Unsupported("blosc bit-shuffle".to_string()));
    }

    if nbytes == 0 {
        return Ok(Vec::new());
    }

    if flags & FLAG_MEMCPYED != 0 {
        if frame.len() < HEADER_LENGTH + nbytes {
            return Err(CodecError::CorruptData(
                "blosc memcpy frame is truncated".to_string(),
            ));
        }
        return Ok(frame[HEADER_LENGTH..HEADER_LENGTH + nbytes].to_vec());
    }

    if blocksize == 0 {
        return Err(CodecError::CorruptData(
            "blosc frame has a zero block size".to_string(),
        ));
    }

    let compressor = flags >> 5;
    let shuffle = flags & FLAG_SHUFFLE != 0;
    // Splitting is inferred from shuffle and typesize. Writers that use
    // DOSPLIT as an authoritative "blocks are split" marker are handled by
    // the global compatibility option.
    let split = if crate::config::global_config().blosc_dosplit_forces_split() {
        flags & FLAG_DOSPLIT != 0 && typesize > 1
    } else {
        shuffle && typesize > 1
    };

    let n_blocks = nbytes.div_ceil(blocksize);
    let bstarts_end = HEADER_LENGTH + 4 * n_blocks;
    if frame.len() < bstarts_end {
        return Err(CodecError::CorruptData(
            "blosc frame is too short for its block offset table".to_string(),
        ));
    }

    let mut out = Vec::with_capacity(nbytes);
    let mut block_scratch = Vec::new();
    let mut unshuffled_scratch = Vec::new();
    for block_index in 0..n_blocks {
        let block_len = blocksize.min(nbytes - block_index * blocksize);
        let bstart =
            usize::try_from(read_le_u32(frame, HEADER_LENGTH + 4 * block_index)).unwrap_or(0);
        let mut cursor = bstart;

        let n_streams = if split { typesize } else { 1 };
        block_scratch.clear();
        for stream_index in 0..n_streams {
            let stream_len = if stream_index + 1 == n_streams {
                block_len / n_streams + block_len % n_streams
            } else {
                block_len / n_streams
            };

            if cursor + 4 > frame.len() {
                return Err(CodecError::CorruptData(
                    "blosc stream size prefix is out of bounds".to_string(),
                ));
            }
            let csize = read_le_u32(frame, cursor) as usize;
            cursor += 4;

            if csize == 0 {
                // An all-zero stream, stored with no data bytes.
                block_scratch.resize(block_scratch.len() + stream_len, 0);
                continue;
            }
            if cursor + csize.min(stream_len) > frame.len() {
                return Err(CodecError::CorruptData(
                    "blosc stream data is out of bounds".to_string(),
                ));
            }
            if csize >= stream_len {
                // Stored raw; exactly stream_len bytes of data are present.
                block_scratch.extend_from_slice(&frame[cursor..cursor + stream_len]);
                cursor += stream_len;
            } else {
                if cursor + csize > frame.len() {
                    return Err(CodecError::CorruptData(
                        "blosc stream data is out of bounds".to_string(),
                    ));
                }
                let decompressed =
                    decompress_stream(compressor, &frame[cursor..cursor + csize], stream_len)?;
                block_scratch.extend_from_slice(&decompressed);
                cursor += csize;
            }
        }

        if shuffle && typesize > 1 {
            unshuffle_bytes(&block_scratch, typesize, &mut unshuffled_scratch);
            out.extend_from_slice(&unshuffled_scratch);
        } else {
            out.extend_from_slice(&block_scratch);
        }
    }

    if out.len() == nbytes {
        Ok(out)
    } else {
        Err(CodecError::CorruptData(format!(
            "blosc frame decoded to {} bytes, expected {nbytes}",
            out.len()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON_VALID1: &str = r#"
    {
        "cname": "lz4",
        "clevel": 5,
        "shuffle": "shuffle",
        "typesize": 4,
        "blocksize": 0
    }"#;

    fn codec_from_json(json: &str) -> Result<BloscCodec, CodecError> {
        let configuration: BloscCodecConfiguration = serde_json::from_str(json).unwrap();
        BloscCodec::new_with_metadata(
            &MetadataV3::new_with_serializable_configuration(IDENTIFIER, &configuration).unwrap(),
        )
    }

    fn test_data(len: usize) -> Vec<u8> {
        (0..len).map(|i| u8::try_from((i / 7) % 256).unwrap()).collect()
    }

    #[test]
    fn codec_blosc_round_trip_shuffle() {
        let codec = codec_from_json(JSON_VALID1).unwrap();
        let bytes = test_data(16384);
        let encoded = codec.encode(&bytes).unwrap();
        assert_eq!(codec.decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn codec_blosc_round_trip_all_compressors() {
        for cname in ["lz4", "lz4hc", "zlib", "zstd"] {
            for shuffle in ["\"noshuffle\"", "\"shuffle\"", "0", "1"] {
                for typesize in [1, 2, 4, 8] {
                    let codec = codec_from_json(&format!(
                        r#"{{"cname": "{cname}", "clevel": 5, "shuffle": {shuffle}, "typesize": {typesize}, "blocksize": 0}}"#
                    ))
                    .unwrap();
                    let bytes = test_data(4096);
                    let encoded = codec.encode(&bytes).unwrap();
                    assert_eq!(codec.decode(&encoded).unwrap(), bytes, "{cname} {shuffle} {typesize}");
                }
            }
        }
    }

    #[test]
    fn codec_blosc_round_trip_multiple_blocks() {
        let codec = codec_from_json(
            r#"{"cname": "zstd", "clevel": 5, "shuffle": "shuffle", "typesize": 2, "blocksize": 256}"#,
        )
        .unwrap();
        let bytes = test_data(10_000);
        let encoded = codec.encode(&bytes).unwrap();
        assert_eq!(codec.decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn codec_blosc_round_trip_incompressible() {
        // A pseudo-random buffer defeats LZ4, exercising raw stream storage.
        let mut state = 0x1234_5678_u32;
        let bytes: Vec<u8> = (0..4096)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                u8::try_from(state >> 24).unwrap()
            })
            .collect();
        let codec = codec_from_json(JSON_VALID1).unwrap();
        let encoded = codec.encode(&bytes).unwrap();
        assert_eq!(codec.decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn codec_blosc_round_trip_all_zeros() {
        let codec = codec_from_json(JSON_VALID1).unwrap();
        let bytes = vec![0u8; 8192];
        let encoded = codec.encode(&bytes).unwrap();
        // Zero streams collapse to a csize marker with no data bytes.
        assert!(encoded.len() < 128);
        assert_eq!(codec.decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn codec_blosc_round_trip_empty() {
        let codec = codec_from_json(JSON_VALID1).unwrap();
        let encoded = codec.encode(&[]).unwrap();
        assert_eq!(codec.decode(&encoded).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn codec_blosc_memcpy_frame() {
        let codec = codec_from_json(
            r#"{"cname": "lz4", "clevel": 0, "shuffle": "noshuffle", "typesize": 1, "blocksize": 0}"#,
        )
        .unwrap();
        let bytes = test_data(100);
        let encoded = codec.encode(&bytes).unwrap();
        assert_eq!(encoded.len(), HEADER_LENGTH + bytes.len());
        assert_eq!(encoded[2] & FLAG_MEMCPYED, FLAG_MEMCPYED);
        assert_eq!(codec.decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn codec_blosc_split_frame_layout() {
        // One block of 16 bytes with typesize 2 splits into two streams; the
        // first (all high bytes, zero) collapses to a zero-size stream.
        let codec = codec_from_json(
            r#"{"cname": "lz4", "clevel": 5, "shuffle": "shuffle", "typesize": 2, "blocksize": 0}"#,
        )
        .unwrap();
        let bytes: Vec<u8> = (1u8..=8).flat_map(|i| [0, i]).collect();
        let encoded = codec.encode(&bytes).unwrap();

        assert_eq!(encoded[0], FORMAT_VERSION);
        assert_eq!(encoded[2] & FLAG_SHUFFLE, FLAG_SHUFFLE);
        assert_eq!(encoded[2] & FLAG_DOSPLIT, FLAG_DOSPLIT);
        assert_eq!(encoded[3], 2);
        assert_eq!(read_le_u32(&encoded, 4), 16);
        // One block: one bstart pointing just past the offset table.
        assert_eq!(read_le_u32(&encoded, HEADER_LENGTH), 20);
        // First stream is the all-zero high bytes.
        assert_eq!(read_le_u32(&encoded, 20), 0);
        assert_eq!(codec.decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn codec_blosc_rejects_unsupported() {
        assert!(codec_from_json(
            r#"{"cname": "blosclz", "clevel": 5, "shuffle": "noshuffle", "blocksize": 0}"#
        )
        .is_err());
        assert!(codec_from_json(
            r#"{"cname": "snappy", "clevel": 5, "shuffle": "noshuffle", "blocksize": 0}"#
        )
        .is_err());
        assert!(codec_from_json(
            r#"{"cname": "lz4", "clevel": 5, "shuffle": "bitshuffle", "typesize": 4, "blocksize": 0}"#
        )
        .is_err());
        assert!(codec_from_json(
            r#"{"cname": "lz4", "clevel": 10, "shuffle": "noshuffle", "blocksize": 0}"#
        )
        .is_err());
    }

    #[test]
    fn codec_blosc_decode_rejects_bitshuffle_frame() {
        let codec = codec_from_json(JSON_VALID1).unwrap();
        let bytes = test_data(64);
        let mut encoded = codec.encode(&bytes).unwrap();
        encoded[2] |= FLAG_BITSHUFFLE;
        assert!(codec.decode(&encoded).is_err());
    }

    #[test]
    fn codec_blosc_decode_rejects_truncated_frame() {
        let codec = codec_from_json(JSON_VALID1).unwrap();
        let encoded = codec.encode(&test_data(64)).unwrap();
        assert!(codec.decode(&encoded[..encoded.len() - 1]).is_err());
        assert!(codec.decode(&encoded[..8]).is_err());
    }

    #[test]
    fn shuffle_round_trip() {
        let bytes: Vec<u8> = (0..25).collect();
        for typesize in [1, 2, 3, 4, 8] {
            let mut shuffled = Vec::new();
            shuffle_bytes(&bytes, typesize, &mut shuffled);
            let mut unshuffled = Vec::new();
            unshuffle_bytes(&shuffled, typesize, &mut unshuffled);
            assert_eq!(bytes, unshuffled, "typesize {typesize}");
        }
    }

    #[test]
    fn shuffle_groups_byte_positions() {
        let bytes: Vec<u8> = vec![0x00, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04];
        let mut shuffled = Vec::new();
        shuffle_bytes(&bytes, 2, &mut shuffled);
        assert_eq!(shuffled, vec![0, 0, 0, 0, 1, 2, 3, 4]);
    }
}
