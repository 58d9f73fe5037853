//! The compression capability consumed by [`ZfpyCodec`](crate::ZfpyCodec).
//!
//! A [`ZfpCapability`] performs the actual zfp compression and decompression.
//! The `zfp` feature provides a capability backed by the zfp C library, see [`zfp_library`].

use std::{
    fmt::Debug,
    sync::{Arc, Mutex, PoisonError},
};

use thiserror::Error;

use crate::{AnyArray, AnyArrayViewMut, AnyCowArray, CodecError, ElementType, ZfpyParams};

/// The element type and shape of an array recorded in a zfp header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamInfo {
    /// The element type.
    pub element_type: ElementType,
    /// The shape.
    pub shape: Vec<usize>,
}

/// Context required to decompress a stream without a zfp header.
#[derive(Clone, Debug, PartialEq)]
pub struct DecompressContext {
    /// The parameters the stream was compressed with.
    pub params: ZfpyParams,
    /// The element type of the array.
    pub element_type: ElementType,
    /// The shape of the array.
    pub shape: Vec<usize>,
}

/// A compression capability error.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum CapabilityError {
    /// zfp does not support the element type.
    #[error("zfp does not support {_0} data")]
    UnsupportedElementType(ElementType),
    /// zfp does not support the dimensionality.
    #[error("zfp supports 1 to 4 dimensional arrays, got {_0} dimensions")]
    UnsupportedDimensionality(usize),
    /// zfp does not support arrays with zero-length dimensions.
    #[error("zfp does not support arrays with zero-length dimensions, got shape {_0:?}")]
    EmptyArray(Vec<usize>),
    /// Fixed accuracy mode only supports floating point data.
    #[error("fixed accuracy mode is not supported for {_0} data")]
    FixedAccuracyIntegerData(ElementType),
    /// The zfp header is invalid or could not be read.
    #[error("failed to read the zfp header")]
    InvalidHeader,
    /// Compression failed.
    #[error("zfp compression failed")]
    CompressFailed,
    /// Decompression failed.
    #[error("zfp decompression failed")]
    DecompressFailed,
    /// The destination does not match the stream.
    #[error(
        "the destination ({destination_type}, {destination_len} elements) does not match the stream ({stream_type}, {stream_len} elements)"
    )]
    DestinationMismatch {
        /// The element type of the stream.
        stream_type: ElementType,
        /// The number of elements in the stream.
        stream_len: usize,
        /// The element type of the destination.
        destination_type: ElementType,
        /// The number of elements in the destination.
        destination_len: usize,
    },
    /// Any other error.
    #[error("{_0}")]
    Other(String),
}

/// A zfp compression capability.
///
/// Implementations must be safe to call concurrently, wrap a backend that is not reentrant in [`Serialized`].
pub trait ZfpCapability: Debug + Send + Sync {
    /// Read the element type and shape from the zfp header of `encoded`.
    ///
    /// Returns [`None`] if `encoded` does not start with a zfp header.
    ///
    /// # Errors
    /// Returns a [`CapabilityError`] if the header is present but invalid.
    fn stream_info(&self, encoded: &[u8]) -> Result<Option<StreamInfo>, CapabilityError>;

    /// Compress a contiguous array.
    ///
    /// If `write_header` is true, a full zfp header (element type, shape, and mode) precedes the compressed data.
    ///
    /// # Errors
    /// Returns a [`CapabilityError`] if `data` is not supported by zfp with `params` or compression fails.
    fn compress(
        &self,
        data: &AnyCowArray<'_>,
        params: &ZfpyParams,
        write_header: bool,
    ) -> Result<Vec<u8>, CapabilityError>;

    /// Decompress `encoded` into a new array.
    ///
    /// `context` is required if `encoded` has no zfp header and ignored otherwise.
    ///
    /// # Errors
    /// Returns a [`CapabilityError`] if `encoded` cannot be decompressed.
    fn decompress(
        &self,
        encoded: &[u8],
        context: Option<&DecompressContext>,
    ) -> Result<AnyArray, CapabilityError>;

    /// Decompress `encoded` directly into `out`.
    ///
    /// `out` must be in standard layout with the element type and number of elements of the stream.
    /// `context` is required if `encoded` has no zfp header and ignored otherwise.
    ///
    /// # Errors
    /// Returns a [`CapabilityError`] if `encoded` cannot be decompressed or `out` does not match the stream.
    fn decompress_into(
        &self,
        encoded: &[u8],
        context: Option<&DecompressContext>,
        out: &mut AnyArrayViewMut<'_>,
    ) -> Result<(), CapabilityError>;
}

/// A capability that serialises all calls into the wrapped capability with a mutex.
#[derive(Debug, Default)]
pub struct Serialized<C> {
    inner: Mutex<C>,
}

impl<C> Serialized<C> {
    /// Wrap `capability`.
    #[must_use]
    pub fn new(capability: C) -> Self {
        Self {
            inner: Mutex::new(capability),
        }
    }

    /// Unwrap the capability.
    #[must_use]
    pub fn into_inner(self) -> C {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: ZfpCapability> ZfpCapability for Serialized<C> {
    fn stream_info(&self, encoded: &[u8]) -> Result<Option<StreamInfo>, CapabilityError> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stream_info(encoded)
    }

    fn compress(
        &self,
        data: &AnyCowArray<'_>,
        params: &ZfpyParams,
        write_header: bool,
    ) -> Result<Vec<u8>, CapabilityError> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .compress(data, params, write_header)
    }

    fn decompress(
        &self,
        encoded: &[u8],
        context: Option<&DecompressContext>,
    ) -> Result<AnyArray, CapabilityError> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .decompress(encoded, context)
    }

    fn decompress_into(
        &self,
        encoded: &[u8],
        context: Option<&DecompressContext>,
        out: &mut AnyArrayViewMut<'_>,
    ) -> Result<(), CapabilityError> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .decompress_into(encoded, context, out)
    }
}

/// Returns the zfp library capability.
///
/// # Errors
/// Returns [`CodecError::CapabilityUnavailable`] if the `zfp` feature is disabled.
#[cfg(feature = "zfp")]
#[allow(clippy::unnecessary_wraps)]
pub fn zfp_library() -> Result<Arc<dyn ZfpCapability>, CodecError> {
    Ok(Arc::new(crate::zfp::ZfpLibrary))
}

/// Returns the zfp library capability.
///
/// # Errors
/// Returns [`CodecError::CapabilityUnavailable`] if the `zfp` feature is disabled.
#[cfg(not(feature = "zfp"))]
pub fn zfp_library() -> Result<Arc<dyn ZfpCapability>, CodecError> {
    Err(CodecError::CapabilityUnavailable)
}
