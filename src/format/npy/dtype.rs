//! NPY element types and byte orders, mapped from `npyz` descriptors

use std::fmt;

use npyz::{DType, Endianness, TypeChar, TypeStr};

use crate::error::{Error, Result};

/// Byte order of stored elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
    /// Single-byte types, where order does not apply.
    NotApplicable,
}

impl ByteOrder {
    /// Whether elements stored in this order must be byte-swapped on this host.
    pub fn needs_swap(self) -> bool {
        match self {
            Self::Little => cfg!(target_endian = "big"),
            Self::Big => cfg!(target_endian = "little"),
            Self::NotApplicable => false,
        }
    }
}

impl From<Endianness> for ByteOrder {
    fn from(endianness: Endianness) -> Self {
        match endianness {
            Endianness::Little => Self::Little,
            Endianness::Big => Self::Big,
            Endianness::Irrelevant => Self::NotApplicable,
        }
    }
}

/// Element types supported by the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NpyDType {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F16,
    F32,
    F64,
}

impl NpyDType {
    /// Bytes per element
    pub fn item_size(self) -> usize {
        match self {
            Self::Bool | Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 | Self::F16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }

    /// Resolve an `npyz` dtype into an element type and its stored byte order.
    ///
    /// Structured records, sub-arrays, complex, string and time types are
    /// rejected.
    pub fn resolve(dtype: &DType) -> Result<(Self, ByteOrder)> {
        let unsupported = || Error::UnsupportedDType {
            descr: dtype.descr(),
        };
        let DType::Plain(type_str) = dtype else {
            return Err(unsupported());
        };

        let parsed = match (type_str.type_char(), type_str.size_field()) {
            (TypeChar::Bool, 1) => Self::Bool,
            (TypeChar::Int, 1) => Self::I8,
            (TypeChar::Int, 2) => Self::I16,
            (TypeChar::Int, 4) => Self::I32,
            (TypeChar::Int, 8) => Self::I64,
            (TypeChar::Uint, 1) => Self::U8,
            (TypeChar::Uint, 2) => Self::U16,
            (TypeChar::Uint, 4) => Self::U32,
            (TypeChar::Uint, 8) => Self::U64,
            (TypeChar::Float, 2) => Self::F16,
            (TypeChar::Float, 4) => Self::F32,
            (TypeChar::Float, 8) => Self::F64,
            _ => return Err(unsupported()),
        };
        Ok((parsed, type_str.endianness().into()))
    }

    /// Little-endian descriptor, e.g. `<f4` or `|b1`.
    pub fn descr(self) -> &'static str {
        match self {
            Self::Bool => "|b1",
            Self::I8 => "|i1",
            Self::U8 => "|u1",
            Self::I16 => "<i2",
            Self::U16 => "<u2",
            Self::I32 => "<i4",
            Self::U32 => "<u4",
            Self::I64 => "<i8",
            Self::U64 => "<u8",
            Self::F16 => "<f2",
            Self::F32 => "<f4",
            Self::F64 => "<f8",
        }
    }

    /// `npyz` dtype used when writing this element type.
    pub fn to_npyz(self) -> Result<DType> {
        let type_str: TypeStr = self
            .descr()
            .parse()
            .map_err(|e| Error::format(format!("descriptor {}: {e}", self.descr())))?;
        Ok(DType::Plain(type_str))
    }
}

impl fmt::Display for NpyDType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::I8 => "int8",
            Self::U8 => "uint8",
            Self::I16 => "int16",
            Self::U16 => "uint16",
            Self::I32 => "int32",
            Self::U32 => "uint32",
            Self::I64 => "int64",
            Self::U64 => "uint64",
            Self::F16 => "float16",
            Self::F32 => "float32",
            Self::F64 => "float64",
        };
        f.pad(name)
    }
}
