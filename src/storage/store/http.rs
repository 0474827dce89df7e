//! An asynchronous HTTP store.

use parking_lot::RwLock;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

use crate::storage::{AsyncReadableStorageTraits, MaybeBytes, StorageError, StoreKey};

use std::collections::HashMap;

/// Characters percent-encoded in URL path segments beyond the control set.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Metadata filenames worth caching between discovery reads.
const CACHED_SUFFIXES: [&str; 4] = ["zarr.json", ".zarray", ".zgroup", ".zattrs"];

/// An asynchronous read-only HTTP store.
///
/// Small metadata documents (recognised by filename) are cached so that the
/// repeated probing performed during hierarchy discovery does not re-fetch
/// them. Chunk data is never cached.
#[derive(Debug)]
pub struct HTTPStore {
    base_url: Url,
    client: reqwest::Client,
    metadata_cache: RwLock<HashMap<StoreKey, MaybeBytes>>,
}

fn handle_reqwest_error(err: &reqwest::Error) -> StorageError {
    StorageError::Other(err.to_string())
}

impl HTTPStore {
    /// Create a new HTTP store at a given `base_url`.
    ///
    /// # Errors
    /// Returns a [`HTTPStoreCreateError`] if `base_url` is not a valid URL or
    /// the HTTP client cannot be constructed.
    pub fn new(base_url: &str) -> Result<Self, HTTPStoreCreateError> {
        let base_url = Url::parse(base_url)
            .map_err(|_| HTTPStoreCreateError::InvalidBaseURL(base_url.into()))?;
        let client = reqwest::Client::builder()
            .timeout(crate::config::global_config().http_timeout())
            .build()
            .map_err(|err| HTTPStoreCreateError::Other(err.to_string()))?;
        Ok(Self {
            base_url,
            client,
            metadata_cache: RwLock::new(HashMap::new()),
        })
    }

    /// Maps a [`StoreKey`] to a HTTP [`Url`].
    ///
    /// Key segments are percent-encoded.
    ///
    /// # Errors
    /// Returns an error if the resulting URL is invalid.
    pub fn key_to_url(&self, key: &StoreKey) -> Result<Url, url::ParseError> {
        let mut url = self.base_url.as_str().trim_end_matches('/').to_string();
        for segment in key.as_str().split('/') {
            url.push('/');
            url.extend(utf8_percent_encode(segment, PATH_SEGMENT));
        }
        Url::parse(&url)
    }

    fn is_metadata_key(key: &StoreKey) -> bool {
        let last = key.last_segment();
        CACHED_SUFFIXES.iter().any(|suffix| last == *suffix)
    }

    async fn get_uncached(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        let url = self
            .key_to_url(key)
            .map_err(|err| StorageError::Other(err.to_string()))?;
        tracing::debug!(%url, "http get");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| handle_reqwest_error(&err))?;
        match response.status() {
            StatusCode::OK => Ok(Some(
                response
                    .bytes()
                    .await
                    .map_err(|err| handle_reqwest_error(&err))?,
            )),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(StorageError::from(format!(
                "http unexpected status code: {status}"
            ))),
        }
    }
}

#[async_trait::async_trait]
impl AsyncReadableStorageTraits for HTTPStore {
    async fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        if Self::is_metadata_key(key) {
            if let Some(cached) = self.metadata_cache.read().get(key) {
                return Ok(cached.clone());
            }
            let value = self.get_uncached(key).await?;
            self.metadata_cache
                .write()
                .insert(key.clone(), value.clone());
            Ok(value)
        } else {
            self.get_uncached(key).await
        }
    }

    async fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        let url = self
            .key_to_url(key)
            .map_err(|err| StorageError::Other(err.to_string()))?;
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|err| handle_reqwest_error(&err))?;
        match response.status() {
            StatusCode::OK => Ok(Some(response.content_length().unwrap_or(0))),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(StorageError::from(format!(
                "http size_key has status code {status}"
            ))),
        }
    }

    async fn exists(&self, key: &StoreKey) -> Result<bool, StorageError> {
        if let Some(cached) = self.metadata_cache.read().get(key) {
            return Ok(cached.is_some());
        }
        Ok(self.size_key(key).await?.is_some())
    }
}

/// A HTTP store creation error.
#[derive(Debug, Error)]
pub enum HTTPStoreCreateError {
    /// The URL is not valid.
    #[error("base URL {0} is not valid")]
    InvalidBaseURL(String),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}
