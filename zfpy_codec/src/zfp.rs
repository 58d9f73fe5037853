//! The zfp library capability.
//!
//! [zfp](https://zfp.io/) is a compressed number format for 1D to 4D arrays of 32/64-bit floating point or integer data.
//! Streams written with a header are byte-compatible with `zfpy.compress_numpy(..., write_header=True)`.
//!
//! This module requires the `zfp` feature, which is disabled by default.

mod zfp_bitstream;
mod zfp_field;
mod zfp_stream;

use std::ffi::c_void;

use self::zfp_bitstream::ZfpBitstream;
use self::zfp_field::ZfpField;
use self::zfp_stream::ZfpStream;
use crate::{
    AnyArray, AnyArrayViewMut, AnyCowArray, CapabilityError, DecompressContext, ElementType,
    StreamInfo, ZfpCapability, ZfpyParams, buffer::match_any,
};

/// The zfp header magic: `"zfp"` followed by the codec version.
const ZFP_MAGIC: &[u8; 3] = b"zfp";

/// A [`ZfpCapability`] backed by the zfp C library.
///
/// Every call allocates its own zfp stream, field, and bitstream, so calls may run concurrently.
#[derive(Clone, Copy, Debug, Default)]
pub struct ZfpLibrary;

fn element_type_to_zfp(element_type: ElementType) -> Option<zfp_sys::zfp_type> {
    match element_type {
        ElementType::I32 => Some(zfp_sys::zfp_type_zfp_type_int32),
        ElementType::I64 => Some(zfp_sys::zfp_type_zfp_type_int64),
        ElementType::F32 => Some(zfp_sys::zfp_type_zfp_type_float),
        ElementType::F64 => Some(zfp_sys::zfp_type_zfp_type_double),
        _ => None,
    }
}

#[allow(non_upper_case_globals)]
fn zfp_to_element_type(zfp_type: zfp_sys::zfp_type) -> Option<ElementType> {
    match zfp_type {
        zfp_sys::zfp_type_zfp_type_int32 => Some(ElementType::I32),
        zfp_sys::zfp_type_zfp_type_int64 => Some(ElementType::I64),
        zfp_sys::zfp_type_zfp_type_float => Some(ElementType::F32),
        zfp_sys::zfp_type_zfp_type_double => Some(ElementType::F64),
        _ => None,
    }
}

/// Check that zfp can compress an array of `element_type` and `shape` with `params`.
fn check_supported(
    element_type: ElementType,
    shape: &[usize],
    params: &ZfpyParams,
) -> Result<zfp_sys::zfp_type, CapabilityError> {
    let zfp_type = element_type_to_zfp(element_type)
        .ok_or(CapabilityError::UnsupportedElementType(element_type))?;
    if !(1..=4).contains(&shape.len()) {
        Err(CapabilityError::UnsupportedDimensionality(shape.len()))
    } else if shape.contains(&0) {
        Err(CapabilityError::EmptyArray(shape.to_vec()))
    } else if element_type.is_integer() && matches!(params, ZfpyParams::FixedAccuracy { .. }) {
        Err(CapabilityError::FixedAccuracyIntegerData(element_type))
    } else {
        Ok(zfp_type)
    }
}

/// A zfp stream positioned at the start of the compressed data, with a field describing the decoded array.
struct ZfpDecoder {
    stream: ZfpStream,
    field: ZfpField,
    // Must outlive the stream
    _bitstream: ZfpBitstream,
    info: StreamInfo,
}

impl ZfpDecoder {
    fn new(encoded: &[u8], context: Option<&DecompressContext>) -> Result<Self, CapabilityError> {
        if encoded.starts_with(ZFP_MAGIC) {
            Self::with_header(encoded)
        } else if let Some(context) = context {
            Self::without_header(encoded, context)
        } else {
            Err(CapabilityError::InvalidHeader)
        }
    }

    fn with_header(encoded: &[u8]) -> Result<Self, CapabilityError> {
        let (stream, field, bitstream) = read_header(encoded, encoded.len())?;

        let element_type =
            zfp_to_element_type(field.zfp_type()).ok_or(CapabilityError::InvalidHeader)?;
        let shape = field.shape();
        if shape.is_empty() || shape.contains(&0) {
            return Err(CapabilityError::InvalidHeader);
        }

        // Reopen with room for the largest stream the header permits, so zfp never reads past the buffer
        let maximum_size = stream.maximum_size(&field);
        let (stream, field, bitstream) = if maximum_size > encoded.len() {
            read_header(encoded, maximum_size)?
        } else {
            (stream, field, bitstream)
        };

        Ok(Self {
            stream,
            field,
            _bitstream: bitstream,
            info: StreamInfo {
                element_type,
                shape,
            },
        })
    }

    fn without_header(
        encoded: &[u8],
        context: &DecompressContext,
    ) -> Result<Self, CapabilityError> {
        let zfp_type = check_supported(context.element_type, &context.shape, &context.params)?;
        let field = unsafe {
            // SAFETY: the data pointer is set before decompressing
            ZfpField::new(std::ptr::null_mut(), zfp_type, &context.shape)
        }
        .ok_or(CapabilityError::DecompressFailed)?;
        let mut stream = ZfpStream::new(&context.params, zfp_type, context.shape.len())
            .ok_or(CapabilityError::DecompressFailed)?;
        let bitstream = ZfpBitstream::from_bytes(encoded, stream.maximum_size(&field))
            .ok_or(CapabilityError::DecompressFailed)?;
        stream.set_bit_stream(&bitstream);

        Ok(Self {
            stream,
            field,
            _bitstream: bitstream,
            info: StreamInfo {
                element_type: context.element_type,
                shape: context.shape.clone(),
            },
        })
    }

    /// Decompress into `out`, which must be contiguous with the element type and number of elements of the stream.
    fn decompress_into(mut self, out: &mut AnyArrayViewMut<'_>) -> Result<(), CapabilityError> {
        let stream_len = self.info.shape.iter().product::<usize>();
        if out.element_type() != self.info.element_type || out.len() != stream_len {
            return Err(CapabilityError::DestinationMismatch {
                stream_type: self.info.element_type,
                stream_len,
                destination_type: out.element_type(),
                destination_len: out.len(),
            });
        }
        let out = out
            .as_ne_bytes_mut()
            .ok_or_else(|| CapabilityError::Other("the destination is not contiguous".into()))?;
        let decompressed = unsafe {
            // SAFETY: out is a contiguous array matching the element type and number of elements of the field
            self.field.set_pointer(out.as_mut_ptr().cast::<c_void>());
            self.stream.decompress(&mut self.field)
        };
        decompressed.ok_or(CapabilityError::DecompressFailed)
    }
}

/// Open a stream over a copy of `encoded` with a capacity of at least `len` bytes and read its header.
fn read_header(
    encoded: &[u8],
    len: usize,
) -> Result<(ZfpStream, ZfpField, ZfpBitstream), CapabilityError> {
    let bitstream =
        ZfpBitstream::from_bytes(encoded, len).ok_or(CapabilityError::DecompressFailed)?;
    let mut stream = ZfpStream::open().ok_or(CapabilityError::DecompressFailed)?;
    let mut field = ZfpField::alloc().ok_or(CapabilityError::DecompressFailed)?;
    stream.set_bit_stream(&bitstream);
    stream
        .read_header(&mut field)
        .ok_or(CapabilityError::InvalidHeader)?;
    Ok((stream, field, bitstream))
}

impl ZfpCapability for ZfpLibrary {
    fn stream_info(&self, encoded: &[u8]) -> Result<Option<StreamInfo>, CapabilityError> {
        if encoded.starts_with(ZFP_MAGIC) {
            ZfpDecoder::with_header(encoded).map(|decoder| Some(decoder.info))
        } else {
            Ok(None)
        }
    }

    fn compress(
        &self,
        data: &AnyCowArray<'_>,
        params: &ZfpyParams,
        write_header: bool,
    ) -> Result<Vec<u8>, CapabilityError> {
        let zfp_type = check_supported(data.element_type(), data.shape(), params)?;
        let pointer = match_any!(data, AnyCowArray, array => {
            array
                .as_slice()
                .map(|elements| elements.as_ptr().cast::<c_void>().cast_mut())
        })
        .ok_or_else(|| CapabilityError::Other("the array is not contiguous".into()))?;

        let field = unsafe {
            // SAFETY: data is a contiguous array of the field type and shape, and outlives the field
            ZfpField::new(pointer, zfp_type, data.shape())
        }
        .ok_or(CapabilityError::CompressFailed)?;
        let mut stream = ZfpStream::new(params, zfp_type, data.shape().len())
            .ok_or(CapabilityError::CompressFailed)?;
        let bitstream = ZfpBitstream::new(stream.maximum_size(&field))
            .ok_or(CapabilityError::CompressFailed)?;
        stream.set_bit_stream(&bitstream);

        if write_header {
            stream
                .write_header(&field)
                .ok_or(CapabilityError::CompressFailed)?;
        }
        let size = unsafe {
            // SAFETY: the field data is valid
            stream.compress(&field)
        }
        .ok_or(CapabilityError::CompressFailed)?;
        drop(stream);
        Ok(bitstream.into_bytes(size))
    }

    fn decompress(
        &self,
        encoded: &[u8],
        context: Option<&DecompressContext>,
    ) -> Result<AnyArray, CapabilityError> {
        let decoder = ZfpDecoder::new(encoded, context)?;
        let mut decoded = AnyArray::try_zeros(decoder.info.element_type, &decoder.info.shape)
            .ok_or(CapabilityError::DecompressFailed)?;
        decoder.decompress_into(&mut decoded.view_mut())?;
        Ok(decoded)
    }

    fn decompress_into(
        &self,
        encoded: &[u8],
        context: Option<&DecompressContext>,
        out: &mut AnyArrayViewMut<'_>,
    ) -> Result<(), CapabilityError> {
        ZfpDecoder::new(encoded, context)?.decompress_into(out)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{ArrayD, IxDyn};

    use super::*;
    use crate::{Element, buffer::ensure_contiguous};

    fn ramp(shape: &[usize]) -> ArrayD<f64> {
        let mut i = 0.0;
        ArrayD::from_shape_simple_fn(IxDyn(shape), || {
            i += 1.0;
            i / 8.0
        })
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn zfp_stream_info() {
        let data = ramp(&[5, 7]);
        let contiguous = ensure_contiguous(data.view().into());
        let params = ZfpyParams::FixedPrecision { precision: 32 };

        let encoded = ZfpLibrary.compress(&contiguous, &params, true).unwrap();
        assert!(encoded.starts_with(ZFP_MAGIC));
        assert_eq!(
            ZfpLibrary.stream_info(&encoded).unwrap(),
            Some(StreamInfo {
                element_type: ElementType::F64,
                shape: vec![5, 7],
            })
        );

        let encoded = ZfpLibrary.compress(&contiguous, &params, false).unwrap();
        assert_eq!(ZfpLibrary.stream_info(&encoded).unwrap(), None);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn zfp_headerless_requires_context() {
        let data = ramp(&[16]);
        let contiguous = ensure_contiguous(data.view().into());
        let params = ZfpyParams::FixedRate { rate: 64.0 };
        let encoded = ZfpLibrary.compress(&contiguous, &params, false).unwrap();
        assert!(ZfpLibrary.decompress(&encoded, None).is_err());

        let context = DecompressContext {
            params,
            element_type: ElementType::F64,
            shape: vec![16],
        };
        let decoded = ZfpLibrary.decompress(&encoded, Some(&context)).unwrap();
        let decoded = f64::as_array(&decoded).unwrap();
        assert_eq!(decoded.shape(), &[16]);
        assert!(
            decoded
                .iter()
                .zip(data.iter())
                .all(|(decoded, original)| (decoded - original).abs() < 1e-9)
        );
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn zfp_reject_unsupported() {
        let params = ZfpyParams::FixedPrecision { precision: 16 };
        let data = ArrayD::<u8>::zeros(IxDyn(&[4, 4]));
        assert!(matches!(
            ZfpLibrary.compress(&ensure_contiguous(data.view().into()), &params, true),
            Err(CapabilityError::UnsupportedElementType(ElementType::U8))
        ));

        let data = ArrayD::<f32>::zeros(IxDyn(&[2, 2, 2, 2, 2]));
        assert!(matches!(
            ZfpLibrary.compress(&ensure_contiguous(data.view().into()), &params, true),
            Err(CapabilityError::UnsupportedDimensionality(5))
        ));

        let data = ArrayD::<i32>::zeros(IxDyn(&[4, 4]));
        assert!(matches!(
            ZfpLibrary.compress(
                &ensure_contiguous(data.view().into()),
                &ZfpyParams::FixedAccuracy { tolerance: 0.1 },
                true
            ),
            Err(CapabilityError::FixedAccuracyIntegerData(ElementType::I32))
        ));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn zfp_invalid_header() {
        assert!(matches!(
            ZfpLibrary.stream_info(b"zfp"),
            Err(CapabilityError::InvalidHeader)
        ));

        // Set the high bits of the 48-bit 1D extent (header bits 80..84) to claim ~2^48 elements
        let data = ramp(&[16]);
        let params = ZfpyParams::FixedPrecision { precision: 64 };
        let mut encoded = ZfpLibrary
            .compress(&ensure_contiguous(data.view().into()), &params, true)
            .unwrap();
        encoded[10] |= 0x0f;
        assert!(matches!(
            ZfpLibrary.stream_info(&encoded),
            Err(CapabilityError::DecompressFailed)
        ));
        assert!(matches!(
            ZfpLibrary.decompress(&encoded, None),
            Err(CapabilityError::DecompressFailed)
        ));
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn zfp_decompress_into_mismatch() {
        let data = ramp(&[4, 4]);
        let params = ZfpyParams::FixedPrecision { precision: 64 };
        let encoded = ZfpLibrary
            .compress(&ensure_contiguous(data.view().into()), &params, true)
            .unwrap();
        let mut out = ArrayD::<f32>::zeros(IxDyn(&[4, 4]));
        assert!(matches!(
            ZfpLibrary.decompress_into(&encoded, None, &mut out.view_mut().into()),
            Err(CapabilityError::DestinationMismatch { .. })
        ));
    }
}
