//! Configuration metadata for the [`zfpy_codec`](https://docs.rs/zfpy_codec) crate.
//!
//! This crate holds the serialisable side of the `zfpy` codec:
//! - [`ZfpyMode`]: the zfp compression modes understood by `numcodecs.zfpy`,
//! - [`ZfpyParams`]: the resolved parameter for the active mode, and
//! - [`ZfpyCodecConfiguration`]: the `numcodecs` JSON configuration.
//!
//! ## Licence
//! `zfpy_codec_metadata` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted for inclusion in the work by you, as defined in the Apache-2.0 license, shall be dual licensed as above, without any additional terms or conditions.

use thiserror::Error;

mod mode;
pub use mode::{MODE_FIXED_ACCURACY, MODE_FIXED_PRECISION, MODE_FIXED_RATE, ZfpyMode};

mod params;
pub use params::{ZFP_MAX_PRECISION, ZFP_MAX_RATE, ZfpyParams, resolve};

mod configuration;
pub use configuration::ZfpyCodecConfiguration;

/// The `numcodecs` identifier of the `zfpy` codec.
pub const ZFPY_CODEC_ID: &str = "zfpy";

/// An invalid `zfpy` codec configuration.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("zfpy configuration is invalid: {reason}")]
pub struct InvalidConfigError {
    reason: String,
}

impl InvalidConfigError {
    /// Create a new [`InvalidConfigError`].
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Returns the reason the configuration was rejected.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}
