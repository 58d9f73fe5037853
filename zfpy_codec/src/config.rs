//! `zfpy_codec` global runtime configuration.
//!
//! The global configuration is read with [`global_config`] and changed with [`global_config_mut`].
//! It supplies defaults to codecs as they are created and to decoding calls as they are made.
//!
//! ## Zfpy Write Header
//! > default: [`true`]
//!
//! Whether newly created [`ZfpyCodec`](crate::ZfpyCodec)s embed a zfp header in encoded bytes.
//! A zfp header makes encoded bytes self-describing (element type, shape, and mode) and matches `numcodecs.zfpy`.
//! Without a header, decoding requires a destination array.
//! This can be overridden per codec with [`ZfpyCodec::with_write_header`](crate::ZfpyCodec::with_write_header).
//!
//! ## Decode Into Reshape
//! > default: [`true`]
//!
//! Whether [`ZfpyCodec::decode_into`](crate::ZfpyCodec::decode_into) accepts a destination with the same number of elements as the decoded array but a different shape.
//! Decoded elements are written in row-major order, like `numcodecs.compat.ndarray_copy`.
//! If [`false`], the destination shape must match exactly.

use std::sync::{LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for `zfpy_codec`.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
#[derive(Debug, Clone)]
pub struct Config {
    zfpy_write_header: bool,
    decode_into_reshape: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            zfpy_write_header: true,
            decode_into_reshape: true,
        }
    }
}

impl Config {
    /// Get the [zfpy write header](#zfpy-write-header) configuration.
    #[must_use]
    pub fn zfpy_write_header(&self) -> bool {
        self.zfpy_write_header
    }

    /// Set the [zfpy write header](#zfpy-write-header) configuration.
    pub fn set_zfpy_write_header(&mut self, zfpy_write_header: bool) -> &mut Self {
        self.zfpy_write_header = zfpy_write_header;
        self
    }

    /// Get the [decode into reshape](#decode-into-reshape) configuration.
    #[must_use]
    pub fn decode_into_reshape(&self) -> bool {
        self.decode_into_reshape
    }

    /// Set the [decode into reshape](#decode-into-reshape) configuration.
    pub fn set_decode_into_reshape(&mut self, decode_into_reshape: bool) -> &mut Self {
        self.decode_into_reshape = decode_into_reshape;
        self
    }
}

static CONFIG: LazyLock<RwLock<Config>> = LazyLock::new(|| RwLock::new(Config::default()));

/// Returns a reference to the global `zfpy_codec` configuration.
#[must_use]
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG.read().unwrap_or_else(PoisonError::into_inner)
}

/// Returns a mutable reference to the global `zfpy_codec` configuration.
///
/// The guard must be dropped before creating codecs or decoding, otherwise the calling thread deadlocks.
#[must_use]
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG.write().unwrap_or_else(PoisonError::into_inner)
}
