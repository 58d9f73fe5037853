//! A fake zfp capability for testing [`ZfpyCodec`](crate::ZfpyCodec) without the zfp library.
//!
//! Streams are the raw native endian elements, optionally preceded by a header holding the element type and shape.
//! Fixed accuracy mode rounds floating point elements to a multiple of the tolerance.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    AnyArray, AnyArrayViewMut, AnyCowArray, CapabilityError, DecompressContext, ElementType,
    StreamInfo, ZfpCapability, ZfpyParams,
};

const MAGIC: &[u8; 4] = b"fzfp";

const ELEMENT_TYPES: [ElementType; 4] = [
    ElementType::I32,
    ElementType::I64,
    ElementType::F32,
    ElementType::F64,
];

#[derive(Debug, Default)]
pub(crate) struct FakeZfp {
    decompress_calls: AtomicUsize,
    decompress_into_calls: AtomicUsize,
}

impl FakeZfp {
    pub(crate) fn decompress_calls(&self) -> usize {
        self.decompress_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn decompress_into_calls(&self) -> usize {
        self.decompress_into_calls.load(Ordering::SeqCst)
    }

    fn decompress_bytes<'a>(
        &self,
        encoded: &'a [u8],
        context: Option<&DecompressContext>,
    ) -> Result<AnyCowArray<'a>, CapabilityError> {
        let (info, payload) = match read_header(encoded)? {
            Some((info, header_len)) => (info, &encoded[header_len..]),
            None => {
                let context = context.ok_or(CapabilityError::InvalidHeader)?;
                let info = StreamInfo {
                    element_type: context.element_type,
                    shape: context.shape.clone(),
                };
                (info, encoded)
            }
        };
        check_supported(info.element_type, &info.shape)?;
        AnyCowArray::from_ne_bytes(info.element_type, &info.shape, payload)
            .map_err(|_| CapabilityError::DecompressFailed)
    }
}

fn element_type_code(element_type: ElementType) -> u8 {
    ELEMENT_TYPES
        .iter()
        .position(|supported| *supported == element_type)
        .and_then(|position| u8::try_from(position).ok())
        .unwrap_or(u8::MAX)
}

fn check_supported(element_type: ElementType, shape: &[usize]) -> Result<(), CapabilityError> {
    if !element_type.is_zfp_native() {
        Err(CapabilityError::UnsupportedElementType(element_type))
    } else if !(1..=4).contains(&shape.len()) {
        Err(CapabilityError::UnsupportedDimensionality(shape.len()))
    } else if shape.contains(&0) {
        Err(CapabilityError::EmptyArray(shape.to_vec()))
    } else {
        Ok(())
    }
}

fn read_header(encoded: &[u8]) -> Result<Option<(StreamInfo, usize)>, CapabilityError> {
    let Some(rest) = encoded.strip_prefix(MAGIC) else {
        return Ok(None);
    };
    let [type_code, ndim, rest @ ..] = rest else {
        return Err(CapabilityError::InvalidHeader);
    };
    let element_type = *ELEMENT_TYPES
        .get(usize::from(*type_code))
        .ok_or(CapabilityError::InvalidHeader)?;
    let ndim = usize::from(*ndim);
    if rest.len() < ndim * 8 {
        return Err(CapabilityError::InvalidHeader);
    }
    let shape = rest[..ndim * 8]
        .chunks_exact(8)
        .map(|dim| {
            let dim: [u8; 8] = dim.try_into().map_err(|_| CapabilityError::InvalidHeader)?;
            usize::try_from(u64::from_le_bytes(dim)).map_err(|_| CapabilityError::InvalidHeader)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some((
        StreamInfo {
            element_type,
            shape,
        },
        MAGIC.len() + 2 + ndim * 8,
    )))
}

impl ZfpCapability for FakeZfp {
    fn stream_info(&self, encoded: &[u8]) -> Result<Option<StreamInfo>, CapabilityError> {
        Ok(read_header(encoded)?.map(|(info, _)| info))
    }

    fn compress(
        &self,
        data: &AnyCowArray<'_>,
        params: &ZfpyParams,
        write_header: bool,
    ) -> Result<Vec<u8>, CapabilityError> {
        let element_type = data.element_type();
        check_supported(element_type, data.shape())?;
        let tolerance = match *params {
            ZfpyParams::FixedAccuracy { .. } if element_type.is_integer() => {
                return Err(CapabilityError::FixedAccuracyIntegerData(element_type));
            }
            ZfpyParams::FixedAccuracy { tolerance } if tolerance > 0.0 => Some(tolerance),
            _ => None,
        };

        let mut encoded = Vec::new();
        if write_header {
            encoded.extend_from_slice(MAGIC);
            encoded.push(element_type_code(element_type));
            encoded.push(u8::try_from(data.shape().len()).unwrap_or(u8::MAX));
            for dim in data.shape() {
                encoded.extend_from_slice(&(*dim as u64).to_le_bytes());
            }
        }
        match data {
            AnyCowArray::I32(array) => array
                .iter()
                .for_each(|value| encoded.extend_from_slice(&value.to_ne_bytes())),
            AnyCowArray::I64(array) => array
                .iter()
                .for_each(|value| encoded.extend_from_slice(&value.to_ne_bytes())),
            AnyCowArray::F32(array) => array.iter().for_each(|value| {
                let value = tolerance.map_or(*value, |tolerance| {
                    ((f64::from(*value) / tolerance).round() * tolerance) as f32
                });
                encoded.extend_from_slice(&value.to_ne_bytes());
            }),
            AnyCowArray::F64(array) => array.iter().for_each(|value| {
                let value = tolerance.map_or(*value, |tolerance| {
                    (value / tolerance).round() * tolerance
                });
                encoded.extend_from_slice(&value.to_ne_bytes());
            }),
            _ => return Err(CapabilityError::UnsupportedElementType(element_type)),
        }
        Ok(encoded)
    }

    fn decompress(
        &self,
        encoded: &[u8],
        context: Option<&DecompressContext>,
    ) -> Result<AnyArray, CapabilityError> {
        self.decompress_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.decompress_bytes(encoded, context)?.into_owned())
    }

    fn decompress_into(
        &self,
        encoded: &[u8],
        context: Option<&DecompressContext>,
        out: &mut AnyArrayViewMut<'_>,
    ) -> Result<(), CapabilityError> {
        self.decompress_into_calls.fetch_add(1, Ordering::SeqCst);
        let decoded = self.decompress_bytes(encoded, context)?;
        if decoded.element_type() != out.element_type() || decoded.len() != out.len() {
            return Err(CapabilityError::DestinationMismatch {
                stream_type: decoded.element_type(),
                stream_len: decoded.len(),
                destination_type: out.element_type(),
                destination_len: out.len(),
            });
        }
        let out = out
            .as_ne_bytes_mut()
            .ok_or_else(|| CapabilityError::Other("destination is not contiguous".to_string()))?;
        out.copy_from_slice(&decoded.into_owned().to_ne_bytes());
        Ok(())
    }
}
