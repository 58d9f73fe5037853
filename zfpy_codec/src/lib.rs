//! `zfpy_codec` is a Rust implementation of the `numcodecs.zfpy` codec.
//!
//! [zfp](https://zfp.io/) compresses 1D to 4D arrays of `int32`, `int64`, `float32`, or `float64` data in one of three modes:
//! - fixed accuracy: an absolute error tolerance per value,
//! - fixed rate: a fixed number of compressed bits per value, and
//! - fixed precision: a fixed number of uncompressed bit planes per value.
//!
//! A [`ZfpyCodec`] resolves a mode and its parameter, validates and normalises input arrays, and delegates compression to a [`ZfpCapability`].
//! With a zfp header (the default), encoded bytes are self-describing and interchangeable with `numcodecs.zfpy`.
//!
//! ## Crate Features
//! - `zfp`: the [`ZfpLibrary`] capability, backed by the zfp C library through `zfp-sys`. Disabled by default.
//!
//! ## Example
//! ```rust
//! # #[cfg(feature = "zfp")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use zfpy_codec::{ZfpyCodec, ZfpyCodecConfiguration, ndarray::ArrayD};
//!
//! let configuration = ZfpyCodecConfiguration::from_json(
//!     r#"{"id": "zfpy", "mode": 4, "tolerance": 0.001, "rate": -1, "precision": -1}"#,
//! )?;
//! let codec = ZfpyCodec::new_with_configuration(&configuration)?;
//! assert_eq!(codec.describe(), "ZfpyCodec(mode=4, tolerance=0.001)");
//!
//! let data = ArrayD::<f64>::from_shape_fn(vec![16, 16], |index| (index[0] + index[1]) as f64);
//! let encoded = codec.encode(data.view().into())?;
//! let decoded = codec.decode(&encoded)?;
//! assert_eq!(decoded.shape(), &[16, 16]);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "zfp"))]
//! # fn main() {}
//! ```
//!
//! ## Licence
//! `zfpy_codec` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted for inclusion in the work by you, as defined in the Apache-2.0 license, shall be dual licensed as above, without any additional terms or conditions.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod buffer;
pub use buffer::{
    AnyArray, AnyArrayView, AnyArrayViewMut, AnyCowArray, Element, ElementType, copy_into,
    ensure_contiguous,
};

mod capability;
pub use capability::{
    CapabilityError, DecompressContext, Serialized, StreamInfo, ZfpCapability, zfp_library,
};

pub mod config;

mod error;
pub use error::CodecError;

#[cfg(feature = "zfp")]
mod zfp;
#[cfg(feature = "zfp")]
pub use zfp::ZfpLibrary;

mod zfpy_codec;
pub use zfpy_codec::ZfpyCodec;

pub use zfpy_codec_metadata::{
    InvalidConfigError, MODE_FIXED_ACCURACY, MODE_FIXED_PRECISION, MODE_FIXED_RATE,
    ZFP_MAX_PRECISION, ZFP_MAX_RATE, ZfpyCodecConfiguration, ZfpyMode, ZfpyParams, resolve,
};

/// Re-export [`ndarray`].
pub use ndarray;

#[cfg(test)]
mod test_util;
