//! Owned n-dimensional arrays with a typed payload
//!
//! `NdArray` is the in-memory form of one `.npy` file: a C-order shape and a
//! flat buffer whose element type is one of the [`NpyDType`]s the codec
//! understands. Operations are limited to what dataset conversion needs:
//! axis insertion, leading-axis truncation and sentinel comparison.

use std::fmt;

use half::f16;

use crate::error::{Error, Result};
use crate::format::npy::NpyDType;

/// Numeric element types that can be read from and written to raw bytes.
pub trait Element: bytemuck::Pod + PartialEq + fmt::Debug + Send + Sync {
    const DTYPE: NpyDType;

    /// Reverse the byte order of the stored value.
    fn swap_bytes(self) -> Self;

    fn to_f64(self) -> f64;

    /// Exact equality with `value`.
    fn eq_f64(self, value: f64) -> bool;

    fn into_data(values: Vec<Self>) -> ArrayData;

    fn slice_of(data: &ArrayData) -> Option<&[Self]>;
}

macro_rules! impl_int_element {
    ($($t:ty => $variant:ident),* $(,)?) => {$(
        impl Element for $t {
            const DTYPE: NpyDType = NpyDType::$variant;

            fn swap_bytes(self) -> Self {
                <$t>::swap_bytes(self)
            }

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn eq_f64(self, value: f64) -> bool {
                // i128 holds every 64-bit integer; `as` saturates out-of-range values
                value.fract() == 0.0 && i128::from(self) == value as i128
            }

            fn into_data(values: Vec<Self>) -> ArrayData {
                ArrayData::$variant(values)
            }

            fn slice_of(data: &ArrayData) -> Option<&[Self]> {
                match data {
                    ArrayData::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    )*};
}

macro_rules! impl_float_element {
    ($($t:ty => $variant:ident, $to_f64:expr),* $(,)?) => {$(
        impl Element for $t {
            const DTYPE: NpyDType = NpyDType::$variant;

            fn swap_bytes(self) -> Self {
                <$t>::from_bits(self.to_bits().swap_bytes())
            }

            fn to_f64(self) -> f64 {
                $to_f64(self)
            }

            fn eq_f64(self, value: f64) -> bool {
                $to_f64(self) == value
            }

            fn into_data(values: Vec<Self>) -> ArrayData {
                ArrayData::$variant(values)
            }

            fn slice_of(data: &ArrayData) -> Option<&[Self]> {
                match data {
                    ArrayData::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    )*};
}

impl_int_element!(
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
);

impl_float_element!(
    f16 => F16, |v: f16| v.to_f64(),
    f32 => F32, |v: f32| v as f64,
    f64 => F64, |v: f64| v,
);

/// Flat element buffer tagged with its type
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    Bool(Vec<bool>),
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    F16(Vec<f16>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Evaluate `$body` with `$v` bound to the inner `Vec` of any variant.
macro_rules! with_data {
    ($data:expr, |$v:ident| $body:expr) => {
        match $data {
            $crate::array::ArrayData::Bool($v) => $body,
            $crate::array::ArrayData::I8($v) => $body,
            $crate::array::ArrayData::U8($v) => $body,
            $crate::array::ArrayData::I16($v) => $body,
            $crate::array::ArrayData::U16($v) => $body,
            $crate::array::ArrayData::I32($v) => $body,
            $crate::array::ArrayData::U32($v) => $body,
            $crate::array::ArrayData::I64($v) => $body,
            $crate::array::ArrayData::U64($v) => $body,
            $crate::array::ArrayData::F16($v) => $body,
            $crate::array::ArrayData::F32($v) => $body,
            $crate::array::ArrayData::F64($v) => $body,
        }
    };
}

pub(crate) use with_data;

/// Like `with_data!`, but rewraps the result in the same variant.
macro_rules! map_data {
    ($data:expr, |$v:ident| $body:expr) => {
        match $data {
            ArrayData::Bool($v) => ArrayData::Bool($body),
            ArrayData::I8($v) => ArrayData::I8($body),
            ArrayData::U8($v) => ArrayData::U8($body),
            ArrayData::I16($v) => ArrayData::I16($body),
            ArrayData::U16($v) => ArrayData::U16($body),
            ArrayData::I32($v) => ArrayData::I32($body),
            ArrayData::U32($v) => ArrayData::U32($body),
            ArrayData::I64($v) => ArrayData::I64($body),
            ArrayData::U64($v) => ArrayData::U64($body),
            ArrayData::F16($v) => ArrayData::F16($body),
            ArrayData::F32($v) => ArrayData::F32($body),
            ArrayData::F64($v) => ArrayData::F64($body),
        }
    };
}

/// Comparison view of an element; bools compare as 0/1.
trait Scalar: Copy {
    fn as_f64(self) -> f64;

    fn eq_f64(self, value: f64) -> bool;
}

impl Scalar for bool {
    fn as_f64(self) -> f64 {
        f64::from(u8::from(self))
    }

    fn eq_f64(self, value: f64) -> bool {
        self.as_f64() == value
    }
}

impl<T: Element> Scalar for T {
    fn as_f64(self) -> f64 {
        self.to_f64()
    }

    fn eq_f64(self, value: f64) -> bool {
        Element::eq_f64(self, value)
    }
}

impl ArrayData {
    pub fn len(&self) -> usize {
        with_data!(self, |v| v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> NpyDType {
        match self {
            Self::Bool(_) => NpyDType::Bool,
            Self::I8(_) => NpyDType::I8,
            Self::U8(_) => NpyDType::U8,
            Self::I16(_) => NpyDType::I16,
            Self::U16(_) => NpyDType::U16,
            Self::I32(_) => NpyDType::I32,
            Self::U32(_) => NpyDType::U32,
            Self::I64(_) => NpyDType::I64,
            Self::U64(_) => NpyDType::U64,
            Self::F16(_) => NpyDType::F16,
            Self::F32(_) => NpyDType::F32,
            Self::F64(_) => NpyDType::F64,
        }
    }
}

/// Owned C-order array
#[derive(Debug, Clone, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    data: ArrayData,
}

impl NdArray {
    /// Wrap `data` with `shape`; the element count must match.
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self> {
        let numel: usize = shape.iter().product();
        if numel != data.len() {
            return Err(Error::ShapeMismatch {
                reason: format!(
                    "shape {shape:?} holds {numel} elements but data has {}",
                    data.len()
                ),
            });
        }
        Ok(Self { shape, data })
    }

    pub fn from_vec<T: Element>(shape: Vec<usize>, values: Vec<T>) -> Result<Self> {
        Self::new(shape, T::into_data(values))
    }

    pub fn from_bools(shape: Vec<usize>, values: Vec<bool>) -> Result<Self> {
        Self::new(shape, ArrayData::Bool(values))
    }

    /// All-false boolean array.
    pub fn falses(shape: &[usize]) -> Self {
        let numel = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            data: ArrayData::Bool(vec![false; numel]),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn dtype(&self) -> NpyDType {
        self.data.dtype()
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    /// Size of the leading axis (1 for a 0-d array).
    pub fn num_samples(&self) -> usize {
        self.shape.first().copied().unwrap_or(1)
    }

    /// Elements per leading-axis index.
    pub fn sample_len(&self) -> usize {
        self.shape.iter().skip(1).product()
    }

    pub fn as_slice<T: Element>(&self) -> Result<&[T]> {
        T::slice_of(&self.data).ok_or(Error::DTypeMismatch {
            expected: T::DTYPE,
            got: self.dtype(),
        })
    }

    pub fn as_bools(&self) -> Result<&[bool]> {
        match &self.data {
            ArrayData::Bool(v) => Ok(v),
            other => Err(Error::DTypeMismatch {
                expected: NpyDType::Bool,
                got: other.dtype(),
            }),
        }
    }

    /// Number of true elements, or `None` for non-boolean arrays.
    pub fn count_true(&self) -> Option<usize> {
        match &self.data {
            ArrayData::Bool(v) => Some(v.iter().filter(|&&b| b).count()),
            _ => None,
        }
    }

    /// Insert a length-1 axis at `axis` (`0..=ndim`).
    pub fn insert_axis(mut self, axis: usize) -> Result<Self> {
        if axis > self.shape.len() {
            return Err(Error::InvalidArgument {
                arg: "axis",
                reason: format!("axis {axis} out of range for {}-d array", self.ndim()),
            });
        }
        self.shape.insert(axis, 1);
        Ok(self)
    }

    /// Copy of the first `k` entries along the leading axis.
    ///
    /// Takes everything when `k` exceeds the axis length.
    pub fn take_leading(&self, k: usize) -> Self {
        if self.shape.is_empty() {
            return self.clone();
        }
        let k = k.min(self.shape[0]);
        let end = k * self.sample_len();
        let mut shape = self.shape.clone();
        shape[0] = k;
        Self {
            shape,
            data: map_data!(&self.data, |v| v[..end].to_vec()),
        }
    }

    /// Boolean mask of elements equal to `value`.
    ///
    /// Integer elements are compared exactly, so 64-bit codes above 2^53 do
    /// not collide with their neighbours. The sentinel itself is an `f64`
    /// and can only name integers it represents exactly.
    pub fn eq_scalar(&self, value: f64) -> Self {
        let mask: Vec<bool> = with_data!(&self.data, |v| v
            .iter()
            .map(|&x| Scalar::eq_f64(x, value))
            .collect());
        Self {
            shape: self.shape.clone(),
            data: ArrayData::Bool(mask),
        }
    }

    /// Slice of one leading-axis index as `f64`, mainly for inspection and tests.
    pub fn sample_f64(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.num_samples() {
            return None;
        }
        let len = self.sample_len();
        let range = index * len..(index + 1) * len;
        Some(with_data!(&self.data, |v| v[range]
            .iter()
            .map(|&x| Scalar::as_f64(x))
            .collect()))
    }
}
