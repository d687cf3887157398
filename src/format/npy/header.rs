//! NPY header: element type, byte order and shape of a stored array
//!
//! Parsing of the magic, version and dict literal is delegated to `npyz`;
//! this type keeps only what the mapped reader needs to slice the payload.

use std::io::Cursor;

use npyz::Order;

use super::dtype::{ByteOrder, NpyDType};
use crate::error::{Error, Result};

/// `\x93NUMPY`
pub const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Parsed `.npy` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpyHeader {
    pub dtype: NpyDType,
    pub byte_order: ByteOrder,
    pub shape: Vec<usize>,
}

impl NpyHeader {
    /// Little-endian header.
    pub fn new(dtype: NpyDType, shape: Vec<usize>) -> Self {
        Self {
            dtype,
            byte_order: ByteOrder::Little,
            shape,
        }
    }

    /// Element count; `Format` if the shape product overflows.
    pub fn numel(&self) -> Result<usize> {
        self.shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            .ok_or_else(|| Error::format(format!("shape {:?} overflows usize", self.shape)))
    }

    /// Payload size in bytes
    pub fn data_len(&self) -> Result<usize> {
        self.numel()?
            .checked_mul(self.dtype.item_size())
            .ok_or_else(|| {
                Error::format(format!(
                    "shape {:?} of {} overflows usize bytes",
                    self.shape, self.dtype
                ))
            })
    }

    /// Parse the prefix of an `.npy` file.
    ///
    /// Returns the header and the byte offset where element data begins.
    /// Fortran-ordered arrays are rejected.
    pub fn read_prefix(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut cursor = Cursor::new(bytes);
        let npy = npyz::NpyFile::new(&mut cursor)
            .map_err(|e| Error::format(format!("invalid npy header: {e}")))?;

        if npy.order() == Order::Fortran {
            return Err(Error::format("fortran_order arrays are not supported"));
        }
        let (dtype, byte_order) = NpyDType::resolve(&npy.dtype())?;
        let shape = npy
            .shape()
            .iter()
            .map(|&dim| {
                usize::try_from(dim)
                    .map_err(|_| Error::format(format!("dimension {dim} overflows usize")))
            })
            .collect::<Result<Vec<_>>>()?;
        drop(npy);

        let header = Self {
            dtype,
            byte_order,
            shape,
        };
        header.data_len()?;

        let offset = usize::try_from(cursor.position())
            .map_err(|_| Error::format("header offset overflows usize"))?;
        Ok((header, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// v1 file prefix around `dict`, padded to a 64-byte boundary.
    fn prefix(dict: &str) -> Vec<u8> {
        let mut text = dict.to_string();
        while (NPY_MAGIC.len() + 4 + text.len() + 1) % 64 != 0 {
            text.push(' ');
        }
        text.push('\n');

        let mut bytes = Vec::new();
        bytes.extend_from_slice(NPY_MAGIC);
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(text.len() as u16).to_le_bytes());
        bytes.extend_from_slice(text.as_bytes());
        bytes
    }

    #[test]
    fn test_read_numpy_prefix() {
        let bytes = prefix("{'descr': '<f4', 'fortran_order': False, 'shape': (2, 3), }");
        let (h, offset) = NpyHeader::read_prefix(&bytes).unwrap();
        assert_eq!(h.dtype, NpyDType::F32);
        assert_eq!(h.byte_order, ByteOrder::Little);
        assert_eq!(h.shape, vec![2, 3]);
        assert_eq!(h.data_len().unwrap(), 24);
        assert_eq!(offset, bytes.len());
    }

    #[test]
    fn test_scalar_shape() {
        let bytes = prefix("{'descr': '|b1', 'fortran_order': False, 'shape': (), }");
        let (h, _) = NpyHeader::read_prefix(&bytes).unwrap();
        assert!(h.shape.is_empty());
        assert_eq!(h.numel().unwrap(), 1);
    }

    #[test]
    fn test_fortran_order_rejected() {
        let bytes = prefix("{'descr': '<i8', 'fortran_order': True, 'shape': (2, 2), }");
        assert!(matches!(
            NpyHeader::read_prefix(&bytes).unwrap_err(),
            Error::Format { .. }
        ));
    }

    #[test]
    fn test_payload_size_overflow_is_format_error() {
        let bytes = prefix("{'descr': '<f8', 'fortran_order': False, 'shape': (2305843009213693952,), }");
        let err = NpyHeader::read_prefix(&bytes).unwrap_err();
        assert!(matches!(err, Error::Format { .. }), "{err}");
    }

    #[test]
    fn test_shape_product_overflow() {
        let h = NpyHeader::new(NpyDType::Bool, vec![1 << 32, 1 << 32, 1 << 32]);
        assert!(matches!(h.numel().unwrap_err(), Error::Format { .. }));
        assert!(matches!(h.data_len().unwrap_err(), Error::Format { .. }));
    }

    #[test]
    fn test_structured_descr_rejected() {
        let bytes = prefix(
            "{'descr': [('a', '<i4'), ('b', '<f8')], 'fortran_order': False, 'shape': (3,), }",
        );
        assert!(matches!(
            NpyHeader::read_prefix(&bytes).unwrap_err(),
            Error::UnsupportedDType { .. }
        ));
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = prefix("{'descr': '|u1', 'fortran_order': False, 'shape': (1,), }");
        bytes[1] = b'X';
        assert!(matches!(
            NpyHeader::read_prefix(&bytes).unwrap_err(),
            Error::Format { .. }
        ));
    }
}
