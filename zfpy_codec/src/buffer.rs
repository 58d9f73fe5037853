//! Array buffers passed to and returned from the `zfpy` codec.
//!
//! Arrays are dynamically dimensioned [`ndarray`] arrays of one of the [`ElementType`]s:
//! - [`AnyArray`]: an owned array, returned by decoding without a destination,
//! - [`AnyArrayView`]: a borrowed (possibly non-contiguous) array to encode,
//! - [`AnyArrayViewMut`]: a caller-owned destination for decoding, and
//! - [`AnyCowArray`]: a contiguous array that is borrowed where possible.

use derive_more::Display;
use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, CowArray, IxDyn};

use crate::CodecError;

/// The element type of an array.
///
/// The display names match `numpy` dtype names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[allow(missing_docs)]
pub enum ElementType {
    #[display("int8")]
    I8,
    #[display("int16")]
    I16,
    #[display("int32")]
    I32,
    #[display("int64")]
    I64,
    #[display("uint8")]
    U8,
    #[display("uint16")]
    U16,
    #[display("uint32")]
    U32,
    #[display("uint64")]
    U64,
    #[display("float32")]
    F32,
    #[display("float64")]
    F64,
}

impl ElementType {
    /// Returns the size of an element in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }

    /// Returns true if the element type is an integer type.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::F32 | Self::F64)
    }

    /// Returns true if zfp compresses the element type natively (`int32`, `int64`, `float32`, or `float64`).
    #[must_use]
    pub const fn is_zfp_native(self) -> bool {
        matches!(self, Self::I32 | Self::I64 | Self::F32 | Self::F64)
    }
}

/// An array element.
pub trait Element: bytemuck::Pod + Default + Send + Sync + 'static {
    /// The element type.
    const ELEMENT_TYPE: ElementType;

    /// Borrow the typed array held by `array`, if it holds this element type.
    fn as_array(array: &AnyArray) -> Option<&ArrayD<Self>>;

    /// Take the typed array held by `array`, or return it unchanged if it holds another element type.
    ///
    /// # Errors
    /// Returns `array` if it does not hold this element type.
    fn into_array(array: AnyArray) -> Result<ArrayD<Self>, AnyArray>;
}

/// An owned array of any [`ElementType`].
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum AnyArray {
    I8(ArrayD<i8>),
    I16(ArrayD<i16>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    U32(ArrayD<u32>),
    U64(ArrayD<u64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

/// A borrowed array of any [`ElementType`].
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub enum AnyArrayView<'a> {
    I8(ArrayViewD<'a, i8>),
    I16(ArrayViewD<'a, i16>),
    I32(ArrayViewD<'a, i32>),
    I64(ArrayViewD<'a, i64>),
    U8(ArrayViewD<'a, u8>),
    U16(ArrayViewD<'a, u16>),
    U32(ArrayViewD<'a, u32>),
    U64(ArrayViewD<'a, u64>),
    F32(ArrayViewD<'a, f32>),
    F64(ArrayViewD<'a, f64>),
}

/// A mutably borrowed array of any [`ElementType`].
#[derive(Debug)]
#[allow(missing_docs)]
pub enum AnyArrayViewMut<'a> {
    I8(ArrayViewMutD<'a, i8>),
    I16(ArrayViewMutD<'a, i16>),
    I32(ArrayViewMutD<'a, i32>),
    I64(ArrayViewMutD<'a, i64>),
    U8(ArrayViewMutD<'a, u8>),
    U16(ArrayViewMutD<'a, u16>),
    U32(ArrayViewMutD<'a, u32>),
    U64(ArrayViewMutD<'a, u64>),
    F32(ArrayViewMutD<'a, f32>),
    F64(ArrayViewMutD<'a, f64>),
}

/// A contiguous (standard layout) array of any [`ElementType`] that is borrowed where possible.
#[derive(Clone, Debug)]
#[allow(missing_docs)]
pub enum AnyCowArray<'a> {
    I8(CowArray<'a, i8, IxDyn>),
    I16(CowArray<'a, i16, IxDyn>),
    I32(CowArray<'a, i32, IxDyn>),
    I64(CowArray<'a, i64, IxDyn>),
    U8(CowArray<'a, u8, IxDyn>),
    U16(CowArray<'a, u16, IxDyn>),
    U32(CowArray<'a, u32, IxDyn>),
    U64(CowArray<'a, u64, IxDyn>),
    F32(CowArray<'a, f32, IxDyn>),
    F64(CowArray<'a, f64, IxDyn>),
}

/// Apply `$body` to the array held by any variant of `$enum`.
macro_rules! match_any {
    ($value:expr, $enum:ident, $array:ident => $body:expr) => {
        match $value {
            $enum::I8($array) => $body,
            $enum::I16($array) => $body,
            $enum::I32($array) => $body,
            $enum::I64($array) => $body,
            $enum::U8($array) => $body,
            $enum::U16($array) => $body,
            $enum::U32($array) => $body,
            $enum::U64($array) => $body,
            $enum::F32($array) => $body,
            $enum::F64($array) => $body,
        }
    };
}

/// Apply `$body` to the arrays held by a pair of `$lhs` and `$rhs` variants with the same element type.
macro_rules! match_any_pair {
    (
        $value:expr, $lhs:ident, $rhs:ident,
        ($a:ident, $b:ident) => $body:expr,
        $other:pat => $fallback:expr
    ) => {
        match $value {
            ($lhs::I8($a), $rhs::I8($b)) => $body,
            ($lhs::I16($a), $rhs::I16($b)) => $body,
            ($lhs::I32($a), $rhs::I32($b)) => $body,
            ($lhs::I64($a), $rhs::I64($b)) => $body,
            ($lhs::U8($a), $rhs::U8($b)) => $body,
            ($lhs::U16($a), $rhs::U16($b)) => $body,
            ($lhs::U32($a), $rhs::U32($b)) => $body,
            ($lhs::U64($a), $rhs::U64($b)) => $body,
            ($lhs::F32($a), $rhs::F32($b)) => $body,
            ($lhs::F64($a), $rhs::F64($b)) => $body,
            $other => $fallback,
        }
    };
}

pub(crate) use match_any;

macro_rules! impl_element {
    ($type:ty, $variant:ident) => {
        impl Element for $type {
            const ELEMENT_TYPE: ElementType = ElementType::$variant;

            fn as_array(array: &AnyArray) -> Option<&ArrayD<Self>> {
                if let AnyArray::$variant(array) = array {
                    Some(array)
                } else {
                    None
                }
            }

            fn into_array(array: AnyArray) -> Result<ArrayD<Self>, AnyArray> {
                if let AnyArray::$variant(array) = array {
                    Ok(array)
                } else {
                    Err(array)
                }
            }
        }

        impl From<ArrayD<$type>> for AnyArray {
            fn from(array: ArrayD<$type>) -> Self {
                Self::$variant(array)
            }
        }

        impl<'a> From<ArrayViewD<'a, $type>> for AnyArrayView<'a> {
            fn from(array: ArrayViewD<'a, $type>) -> Self {
                Self::$variant(array)
            }
        }

        impl<'a> From<ArrayViewMutD<'a, $type>> for AnyArrayViewMut<'a> {
            fn from(array: ArrayViewMutD<'a, $type>) -> Self {
                Self::$variant(array)
            }
        }

        impl<'a> From<CowArray<'a, $type, IxDyn>> for AnyCowArray<'a> {
            fn from(array: CowArray<'a, $type, IxDyn>) -> Self {
                Self::$variant(array)
            }
        }
    };
}

impl_element!(i8, I8);
impl_element!(i16, I16);
impl_element!(i32, I32);
impl_element!(i64, I64);
impl_element!(u8, U8);
impl_element!(u16, U16);
impl_element!(u32, U32);
impl_element!(u64, U64);
impl_element!(f32, F32);
impl_element!(f64, F64);

impl AnyArray {
    /// Create a zero-initialised array.
    ///
    /// Returns [`None`] if the number of elements overflows or the allocation fails.
    #[must_use]
    pub fn try_zeros(element_type: ElementType, shape: &[usize]) -> Option<Self> {
        fn try_zeros<T: Element>(shape: &[usize]) -> Option<ArrayD<T>> {
            let len = shape
                .iter()
                .try_fold(1usize, |len, &dim| len.checked_mul(dim))?;
            let mut elements = Vec::new();
            elements.try_reserve_exact(len).ok()?;
            elements.resize(len, T::default());
            ArrayD::from_shape_vec(IxDyn(shape), elements).ok()
        }
        Some(match element_type {
            ElementType::I8 => Self::I8(try_zeros(shape)?),
            ElementType::I16 => Self::I16(try_zeros(shape)?),
            ElementType::I32 => Self::I32(try_zeros(shape)?),
            ElementType::I64 => Self::I64(try_zeros(shape)?),
            ElementType::U8 => Self::U8(try_zeros(shape)?),
            ElementType::U16 => Self::U16(try_zeros(shape)?),
            ElementType::U32 => Self::U32(try_zeros(shape)?),
            ElementType::U64 => Self::U64(try_zeros(shape)?),
            ElementType::F32 => Self::F32(try_zeros(shape)?),
            ElementType::F64 => Self::F64(try_zeros(shape)?),
        })
    }

    /// Returns the element type.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match_any!(self, AnyArray, array => element_type_of(array))
    }

    /// Returns the shape.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        match_any!(self, AnyArray, array => array.shape())
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match_any!(self, AnyArray, array => array.len())
    }

    /// Returns true if the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a view of the array.
    #[must_use]
    pub fn view(&self) -> AnyArrayView<'_> {
        match_any!(self, AnyArray, array => AnyArrayView::from(array.view()))
    }

    /// Returns a mutable view of the array.
    #[must_use]
    pub fn view_mut(&mut self) -> AnyArrayViewMut<'_> {
        match_any!(self, AnyArray, array => AnyArrayViewMut::from(array.view_mut()))
    }

    /// Returns the elements in row-major order as native endian bytes.
    #[must_use]
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        match_any!(self, AnyArray, array => {
            let array = array.as_standard_layout();
            array
                .as_slice()
                .map(|elements| bytemuck::cast_slice(elements).to_vec())
                .unwrap_or_default()
        })
    }
}

impl AnyArrayView<'_> {
    /// Returns the element type.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match_any!(self, AnyArrayView, array => element_type_of(array))
    }

    /// Returns the shape.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        match_any!(self, AnyArrayView, array => array.shape())
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match_any!(self, AnyArrayView, array => array.len())
    }

    /// Returns true if the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the array is contiguous in row-major order.
    #[must_use]
    pub fn is_standard_layout(&self) -> bool {
        match_any!(self, AnyArrayView, array => array.is_standard_layout())
    }
}

impl AnyArrayViewMut<'_> {
    /// Returns the element type.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match_any!(self, AnyArrayViewMut, array => element_type_of(array))
    }

    /// Returns the shape.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        match_any!(self, AnyArrayViewMut, array => array.shape())
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match_any!(self, AnyArrayViewMut, array => array.len())
    }

    /// Returns true if the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the array is contiguous in row-major order.
    #[must_use]
    pub fn is_standard_layout(&self) -> bool {
        match_any!(self, AnyArrayViewMut, array => array.is_standard_layout())
    }

    /// Returns a read-only view of the array.
    #[must_use]
    pub fn view(&self) -> AnyArrayView<'_> {
        match_any!(self, AnyArrayViewMut, array => AnyArrayView::from(array.view()))
    }

    /// Returns the elements as mutable native endian bytes if the array is in standard layout.
    #[must_use]
    pub fn as_ne_bytes_mut(&mut self) -> Option<&mut [u8]> {
        match_any!(self, AnyArrayViewMut, array => {
            array.as_slice_mut().map(bytemuck::cast_slice_mut)
        })
    }
}

impl<'a> AnyCowArray<'a> {
    /// Create an array from native endian bytes in row-major order.
    ///
    /// The bytes are borrowed if they are suitably aligned for `element_type`, otherwise they are copied.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidInput`] if the length of `bytes` does not match `element_type` and `shape`.
    pub fn from_ne_bytes(
        element_type: ElementType,
        shape: &[usize],
        bytes: &'a [u8],
    ) -> Result<Self, CodecError> {
        fn from_ne_bytes<'a, T: Element>(
            shape: &[usize],
            bytes: &'a [u8],
        ) -> Result<CowArray<'a, T, IxDyn>, CodecError> {
            match bytemuck::try_cast_slice::<u8, T>(bytes) {
                Ok(elements) => ArrayViewD::from_shape(IxDyn(shape), elements).map(CowArray::from),
                Err(_) => ArrayD::from_shape_vec(IxDyn(shape), bytemuck::pod_collect_to_vec(bytes))
                    .map(CowArray::from),
            }
            .map_err(|err| CodecError::InvalidInput(err.to_string()))
        }

        let expected_len = shape
            .iter()
            .try_fold(element_type.size(), |acc, &dim| acc.checked_mul(dim));
        if expected_len != Some(bytes.len()) {
            return Err(CodecError::InvalidInput(format!(
                "{} bytes cannot hold a {element_type} array with shape {shape:?}",
                bytes.len()
            )));
        }

        Ok(match element_type {
            ElementType::I8 => Self::I8(from_ne_bytes(shape, bytes)?),
            ElementType::I16 => Self::I16(from_ne_bytes(shape, bytes)?),
            ElementType::I32 => Self::I32(from_ne_bytes(shape, bytes)?),
            ElementType::I64 => Self::I64(from_ne_bytes(shape, bytes)?),
            ElementType::U8 => Self::U8(from_ne_bytes(shape, bytes)?),
            ElementType::U16 => Self::U16(from_ne_bytes(shape, bytes)?),
            ElementType::U32 => Self::U32(from_ne_bytes(shape, bytes)?),
            ElementType::U64 => Self::U64(from_ne_bytes(shape, bytes)?),
            ElementType::F32 => Self::F32(from_ne_bytes(shape, bytes)?),
            ElementType::F64 => Self::F64(from_ne_bytes(shape, bytes)?),
        })
    }

    /// Returns the element type.
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match_any!(self, AnyCowArray, array => element_type_of(array))
    }

    /// Returns the shape.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        match_any!(self, AnyCowArray, array => array.shape())
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match_any!(self, AnyCowArray, array => array.len())
    }

    /// Returns true if the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the array borrows its elements.
    #[must_use]
    pub fn is_view(&self) -> bool {
        match_any!(self, AnyCowArray, array => array.is_view())
    }

    /// Convert into an owned array, copying the elements if they are borrowed.
    #[must_use]
    pub fn into_owned(self) -> AnyArray {
        match_any!(self, AnyCowArray, array => AnyArray::from(array.into_owned()))
    }
}

fn element_type_of<S>(_array: &ndarray::ArrayBase<S, IxDyn>) -> ElementType
where
    S: ndarray::RawData,
    S::Elem: Element,
{
    <S::Elem as Element>::ELEMENT_TYPE
}

/// Return a contiguous (standard layout) version of `data`.
///
/// Arrays that are already contiguous are borrowed, otherwise the elements are copied in row-major order.
#[must_use]
pub fn ensure_contiguous(data: AnyArrayView<'_>) -> AnyCowArray<'_> {
    fn ensure_contiguous<T: Clone>(data: ArrayViewD<'_, T>) -> CowArray<'_, T, IxDyn> {
        if data.is_standard_layout() {
            CowArray::from(data)
        } else {
            CowArray::from(data.as_standard_layout().into_owned())
        }
    }
    match_any!(data, AnyArrayView, array => AnyCowArray::from(ensure_contiguous(array)))
}

/// Returns true if a decoded array with `decoded_shape` can be written to a destination with `destination_shape`.
pub(crate) fn shapes_compatible(
    decoded_shape: &[usize],
    destination_shape: &[usize],
    allow_reshape: bool,
) -> bool {
    decoded_shape == destination_shape
        || (allow_reshape
            && decoded_shape.iter().product::<usize>()
                == destination_shape.iter().product::<usize>())
}

/// Copy `source` into `destination`.
///
/// If `allow_reshape` is true, `destination` may have a different shape with the same number of elements.
/// Elements are then written in row-major order.
///
/// # Errors
/// Returns [`CodecError::ShapeMismatch`] if `destination` has a different element type or an incompatible shape.
pub fn copy_into(
    source: &AnyArray,
    destination: &mut AnyArrayViewMut<'_>,
    allow_reshape: bool,
) -> Result<(), CodecError> {
    match_any_pair!(
        (source, destination),
        AnyArray,
        AnyArrayViewMut,
        (source, destination) => copy_array_into(source, destination, allow_reshape),
        (source, destination) => Err(shape_mismatch(
            source.element_type(),
            source.shape(),
            destination.element_type(),
            destination.shape(),
        ))
    )
}

fn copy_array_into<T: Element>(
    source: &ArrayD<T>,
    destination: &mut ArrayViewMutD<'_, T>,
    allow_reshape: bool,
) -> Result<(), CodecError> {
    if source.shape() == destination.shape() {
        destination.assign(source);
        Ok(())
    } else if shapes_compatible(source.shape(), destination.shape(), allow_reshape) {
        let reshaped = source
            .to_shape(destination.shape().to_vec())
            .map_err(|err| CodecError::InvalidInput(err.to_string()))?;
        destination.assign(&reshaped);
        Ok(())
    } else {
        Err(shape_mismatch(
            T::ELEMENT_TYPE,
            source.shape(),
            T::ELEMENT_TYPE,
            destination.shape(),
        ))
    }
}

pub(crate) fn shape_mismatch(
    decoded_type: ElementType,
    decoded_shape: &[usize],
    destination_type: ElementType,
    destination_shape: &[usize],
) -> CodecError {
    CodecError::ShapeMismatch {
        decoded_type,
        decoded_shape: decoded_shape.to_vec(),
        destination_type,
        destination_shape: destination_shape.to_vec(),
    }
}
