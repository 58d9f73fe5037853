use thiserror::Error;

use crate::{CapabilityError, ElementType, InvalidConfigError};

/// A codec error.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// The codec configuration is invalid.
    #[error(transparent)]
    InvalidConfig(#[from] InvalidConfigError),
    /// The input could not be encoded or the encoded bytes could not be decoded.
    #[error("invalid input: {_0}")]
    InvalidInput(String),
    /// Decoding requires a destination to supply the element type and shape.
    #[error(
        "the encoded bytes have no zfp header, a destination is required to supply the element type and shape"
    )]
    MissingContext,
    /// The destination is incompatible with the decoded array.
    #[error(
        "cannot decode a {decoded_type} array with shape {decoded_shape:?} into a {destination_type} destination with shape {destination_shape:?}"
    )]
    ShapeMismatch {
        /// The element type of the decoded array.
        decoded_type: ElementType,
        /// The shape of the decoded array.
        decoded_shape: Vec<usize>,
        /// The element type of the destination.
        destination_type: ElementType,
        /// The shape of the destination.
        destination_shape: Vec<usize>,
    },
    /// The zfp library is not available.
    #[error("the zfp library is unavailable, enable the `zfp` feature or supply a capability")]
    CapabilityUnavailable,
}

impl From<CapabilityError> for CodecError {
    fn from(err: CapabilityError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<&str> for CodecError {
    fn from(err_string: &str) -> Self {
        Self::InvalidInput(err_string.to_string())
    }
}

impl From<String> for CodecError {
    fn from(err_string: String) -> Self {
        Self::InvalidInput(err_string)
    }
}
