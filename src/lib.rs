//! A rust library for reading (and, to a lesser extent, writing) chunked,
//! compressed n-dimensional arrays stored in the [Zarr](https://zarr.dev) V2
//! and V3 formats, together with the [OME-Zarr](https://ngff.openmicroscopy.org)
//! imaging overlay that describes such arrays as multiscale images, label
//! masks, or high-content-screening plates.
//!
//! The best places to start are [`reader::open`], [`array::Array`] and
//! [`node::Node`].
//!
//! ## Feature overview
//! - Stores: [`FilesystemStore`](crate::storage::store::FilesystemStore),
//!   [`HTTPStore`](crate::storage::store::HTTPStore) (read-only), and
//!   [`MemoryStore`](crate::storage::store::MemoryStore).
//! - Codecs: `bytes` (endianness), `gzip`, `zstd`, and a native
//!   implementation of the `blosc` container format (LZ4, Zstd and Zlib
//!   inner compressors; byte shuffling; split streams).
//! - Metadata: Zarr V3 `zarr.json` and Zarr V2 `.zarray`/`.zgroup`/`.zattrs`
//!   documents, unified into a single typed array descriptor.
//! - Overlay: OME-Zarr multiscale images, plates/wells, and labels, with
//!   physical-coordinate region reads via composed scale/translation
//!   transforms.
//!
//! Region reads fetch intersecting chunks concurrently with bounded
//! parallelism and scatter each decoded chunk into disjoint ranges of a
//! single C-order output buffer. Missing chunks materialise as zeros, and
//! edge chunks stored at their truncated extent are expanded transparently.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]

pub mod array;
pub mod array_subset;
pub mod config;
pub mod coordinate;
pub mod group;
pub mod metadata;
pub mod node;
pub mod reader;
pub mod storage;

/// Re-export [`bytes`].
pub use bytes;

/// Re-export [`serde_json`].
pub use serde_json;
