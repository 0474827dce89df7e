//! Global configuration options.

use std::sync::OnceLock;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the `omezarr` crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// ## Chunk Concurrent Limit
/// > default: `16`
///
/// The default bound on concurrent chunk fetches during a region read.
/// Clamped to a minimum of `1`.
///
/// ## HTTP Request Timeout
/// > default: 300 seconds
///
/// The per-request timeout applied by [`HTTPStore`](crate::storage::store::HTTPStore).
///
/// ## Blosc `DOSPLIT` Polarity
/// > default: [`false`]
///
/// By default, blosc frame decoding infers stream splitting from the shuffle
/// mode and type size, and the `DOSPLIT` header flag alone never forces a
/// split. Some external writers set the flag meaning "blocks are split";
/// enable this option to honour the flag for frames from such writers.
#[derive(Debug)]
pub struct Config {
    chunk_concurrent_limit: usize,
    http_timeout: std::time::Duration,
    blosc_dosplit_forces_split: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunk_concurrent_limit: 16,
            http_timeout: std::time::Duration::from_secs(300),
            blosc_dosplit_forces_split: false,
        }
    }
}

impl Config {
    /// Get the [chunk concurrent limit](#chunk-concurrent-limit) configuration.
    #[must_use]
    pub fn chunk_concurrent_limit(&self) -> usize {
        self.chunk_concurrent_limit
    }

    /// Set the [chunk concurrent limit](#chunk-concurrent-limit) configuration.
    pub fn set_chunk_concurrent_limit(&mut self, concurrent_limit: usize) {
        self.chunk_concurrent_limit = concurrent_limit.max(1);
    }

    /// Get the [HTTP request timeout](#http-request-timeout) configuration.
    #[must_use]
    pub fn http_timeout(&self) -> std::time::Duration {
        self.http_timeout
    }

    /// Set the [HTTP request timeout](#http-request-timeout) configuration.
    pub fn set_http_timeout(&mut self, timeout: std::time::Duration) {
        self.http_timeout = timeout;
    }

    /// Get the [blosc `DOSPLIT` polarity](#blosc-dosplit-polarity) configuration.
    #[must_use]
    pub fn blosc_dosplit_forces_split(&self) -> bool {
        self.blosc_dosplit_forces_split
    }

    /// Set the [blosc `DOSPLIT` polarity](#blosc-dosplit-polarity) configuration.
    pub fn set_blosc_dosplit_forces_split(&mut self, forces_split: bool) {
        self.blosc_dosplit_forces_split = forces_split;
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global configuration.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG.get_or_init(|| RwLock::new(Config::default())).read()
}

/// Returns a mutable reference to the global configuration.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .write()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_chunk_concurrent_limit() {
        assert_eq!(global_config().chunk_concurrent_limit(), 16);
        global_config_mut().set_chunk_concurrent_limit(0);
        assert_eq!(global_config().chunk_concurrent_limit(), 1);
        global_config_mut().set_chunk_concurrent_limit(16);
    }
}
