use std::{fmt, sync::Arc};

use crate::{
    AnyArray, AnyArrayView, AnyArrayViewMut, CapabilityError, CodecError, DecompressContext,
    ElementType, StreamInfo, ZfpCapability, ZfpyCodecConfiguration, ZfpyMode, ZfpyParams,
    buffer::{copy_into, ensure_contiguous, shape_mismatch, shapes_compatible},
    config::global_config,
    zfp_library,
};

/// A `zfpy` codec implementation.
///
/// Encodes arrays with zfp in fixed accuracy, fixed rate, or fixed precision mode.
/// By default, the encoded bytes start with a full zfp header and are interchangeable with those of `numcodecs.zfpy`.
///
/// The codec holds no mutable state and may be shared between threads.
#[derive(Clone, Debug)]
pub struct ZfpyCodec {
    configuration: ZfpyCodecConfiguration,
    params: ZfpyParams,
    write_header: bool,
    capability: Arc<dyn ZfpCapability>,
}

impl ZfpyCodec {
    /// The `numcodecs` codec identifier.
    pub const CODEC_ID: &'static str = zfpy_codec_metadata::ZFPY_CODEC_ID;

    /// Create a new `zfpy` codec compressing with `capability`.
    ///
    /// Whether a zfp header is written defaults to the [zfpy write header](crate::config#zfpy-write-header) global configuration.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidConfig`] if `params` are invalid.
    pub fn new(params: ZfpyParams, capability: Arc<dyn ZfpCapability>) -> Result<Self, CodecError> {
        let params = params.validate()?;
        Ok(Self {
            configuration: params.into(),
            params,
            write_header: global_config().zfpy_write_header(),
            capability,
        })
    }

    /// Create a new `zfpy` codec in fixed accuracy mode.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidConfig`] if `tolerance` is negative or not finite.
    pub fn new_fixed_accuracy(
        tolerance: f64,
        capability: Arc<dyn ZfpCapability>,
    ) -> Result<Self, CodecError> {
        Self::new(ZfpyParams::FixedAccuracy { tolerance }, capability)
    }

    /// Create a new `zfpy` codec in fixed rate mode.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidConfig`] if `rate` is not between 0 and [`ZFP_MAX_RATE`](crate::ZFP_MAX_RATE).
    pub fn new_fixed_rate(
        rate: f64,
        capability: Arc<dyn ZfpCapability>,
    ) -> Result<Self, CodecError> {
        Self::new(ZfpyParams::FixedRate { rate }, capability)
    }

    /// Create a new `zfpy` codec in fixed precision mode.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidConfig`] if `precision` exceeds [`ZFP_MAX_PRECISION`](crate::ZFP_MAX_PRECISION).
    pub fn new_fixed_precision(
        precision: u32,
        capability: Arc<dyn ZfpCapability>,
    ) -> Result<Self, CodecError> {
        Self::new(ZfpyParams::FixedPrecision { precision }, capability)
    }

    /// Create a new `zfpy` codec from a configuration, compressing with the zfp library.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidConfig`] if the configuration is invalid, or
    /// [`CodecError::CapabilityUnavailable`] if the `zfp` feature is disabled.
    pub fn new_with_configuration(
        configuration: &ZfpyCodecConfiguration,
    ) -> Result<Self, CodecError> {
        Self::new_with_configuration_and_capability(configuration, zfp_library()?)
    }

    /// Create a new `zfpy` codec from a configuration, compressing with `capability`.
    ///
    /// The configuration is retained as given, including the values of unused parameters.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidConfig`] if the configuration is invalid.
    pub fn new_with_configuration_and_capability(
        configuration: &ZfpyCodecConfiguration,
        capability: Arc<dyn ZfpCapability>,
    ) -> Result<Self, CodecError> {
        let params = configuration.params()?;
        Ok(Self {
            configuration: *configuration,
            params,
            write_header: global_config().zfpy_write_header(),
            capability,
        })
    }

    /// Create a new `zfpy` codec from `numcodecs` JSON codec metadata, compressing with the zfp library.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidConfig`] if the metadata is invalid, or
    /// [`CodecError::CapabilityUnavailable`] if the `zfp` feature is disabled.
    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        Self::new_with_configuration(&ZfpyCodecConfiguration::from_json(json)?)
    }

    /// Set whether a full zfp header is written to encoded bytes.
    ///
    /// Bytes encoded without a header can only be decoded with [`decode_into`](ZfpyCodec::decode_into).
    #[must_use]
    pub fn with_write_header(mut self, write_header: bool) -> Self {
        self.write_header = write_header;
        self
    }

    /// Returns true if a full zfp header is written to encoded bytes.
    #[must_use]
    pub fn write_header(&self) -> bool {
        self.write_header
    }

    /// Returns the compression parameters.
    #[must_use]
    pub fn params(&self) -> &ZfpyParams {
        &self.params
    }

    /// Returns the compression mode.
    #[must_use]
    pub fn mode(&self) -> ZfpyMode {
        self.params.mode()
    }

    /// Returns the codec configuration (`numcodecs` `get_config`).
    #[must_use]
    pub fn configuration(&self) -> &ZfpyCodecConfiguration {
        &self.configuration
    }

    /// Returns the `numcodecs` JSON codec metadata.
    #[must_use]
    pub fn to_json(&self) -> String {
        self.configuration.to_json()
    }

    /// Returns a description of the codec naming the mode and its parameter, e.g. `ZfpyCodec(mode=4, tolerance=0.001)`.
    #[must_use]
    pub fn describe(&self) -> String {
        self.to_string()
    }

    /// Encode an array.
    ///
    /// Non-contiguous arrays are copied into row-major order first.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidInput`] if
    ///  - the element type is not `int32`, `int64`, `float32`, or `float64`,
    ///  - the array does not have 1 to 4 dimensions or has a zero-length dimension,
    ///  - integer data is encoded in fixed accuracy mode, or
    ///  - compression fails.
    pub fn encode(&self, data: AnyArrayView<'_>) -> Result<Vec<u8>, CodecError> {
        self.check_encodable(data.element_type(), data.shape())?;
        let data = ensure_contiguous(data);
        Ok(self
            .capability
            .compress(&data, &self.params, self.write_header)?)
    }

    /// Encode row-major native endian `bytes` holding an array of `element_type` with `shape`.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidInput`] if `bytes` does not match `element_type` and `shape`, or for any reason listed in [`encode`](ZfpyCodec::encode).
    pub fn encode_ne_bytes(
        &self,
        bytes: &[u8],
        element_type: ElementType,
        shape: &[usize],
    ) -> Result<Vec<u8>, CodecError> {
        self.check_encodable(element_type, shape)?;
        let data = crate::AnyCowArray::from_ne_bytes(element_type, shape, bytes)?;
        Ok(self
            .capability
            .compress(&data, &self.params, self.write_header)?)
    }

    fn check_encodable(
        &self,
        element_type: ElementType,
        shape: &[usize],
    ) -> Result<(), CodecError> {
        let err = if !element_type.is_zfp_native() {
            CapabilityError::UnsupportedElementType(element_type)
        } else if !(1..=4).contains(&shape.len()) {
            CapabilityError::UnsupportedDimensionality(shape.len())
        } else if shape.contains(&0) {
            CapabilityError::EmptyArray(shape.to_vec())
        } else if element_type.is_integer() && self.mode() == ZfpyMode::FixedAccuracy {
            CapabilityError::FixedAccuracyIntegerData(element_type)
        } else {
            return Ok(());
        };
        Err(err.into())
    }

    /// Decode bytes with a zfp header into a new array.
    ///
    /// # Errors
    /// Returns [`CodecError::MissingContext`] if `encoded` has no zfp header, or [`CodecError::InvalidInput`] if `encoded` cannot be decoded.
    pub fn decode(&self, encoded: &[u8]) -> Result<AnyArray, CodecError> {
        if self.capability.stream_info(encoded)?.is_none() {
            return Err(CodecError::MissingContext);
        }
        Ok(self.capability.decompress(encoded, None)?)
    }

    /// Decode bytes into `out` and return it.
    ///
    /// If `encoded` has no zfp header, `out` supplies the element type and shape of the encoded array.
    /// Destinations in standard layout are decoded into directly, otherwise the decoded array is copied element-wise.
    /// A destination with a different shape but the same number of elements is filled in row-major order,
    /// unless the [decode into reshape](crate::config#decode-into-reshape) global configuration is disabled.
    ///
    /// # Errors
    /// Returns [`CodecError::ShapeMismatch`] if `out` is incompatible with the decoded array, or [`CodecError::InvalidInput`] if `encoded` cannot be decoded.
    pub fn decode_into<'a>(
        &self,
        encoded: &[u8],
        mut out: AnyArrayViewMut<'a>,
    ) -> Result<AnyArrayViewMut<'a>, CodecError> {
        let allow_reshape = global_config().decode_into_reshape();

        let (info, context) = if let Some(info) = self.capability.stream_info(encoded)? {
            (info, None)
        } else {
            let context = DecompressContext {
                params: self.params,
                element_type: out.element_type(),
                shape: out.shape().to_vec(),
            };
            let info = StreamInfo {
                element_type: context.element_type,
                shape: context.shape.clone(),
            };
            (info, Some(context))
        };

        if info.element_type != out.element_type()
            || !shapes_compatible(&info.shape, out.shape(), allow_reshape)
        {
            return Err(shape_mismatch(
                info.element_type,
                &info.shape,
                out.element_type(),
                out.shape(),
            ));
        }

        if out.is_standard_layout() {
            log::debug!("zfpy decoding {} array directly into the destination", info.element_type);
            self
                .capability
                .decompress_into(encoded, context.as_ref(), &mut out)?;
        } else {
            log::debug!(
                "zfpy decoding {} array via a copy, the destination is not contiguous",
                info.element_type
            );
            let decoded = self.capability.decompress(encoded, context.as_ref())?;
            copy_into(&decoded, &mut out, allow_reshape)?;
        }
        Ok(out)
    }
}

impl fmt::Display for ZfpyCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZfpyCodec(mode={}, {})", self.mode().code(), self.params)
    }
}
