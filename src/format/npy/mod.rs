//! NumPy `.npy` file format
//!
//! # Format
//!
//! ```text
//! [6 bytes] magic "\x93NUMPY"
//! [2 bytes] major, minor version
//! [2 bytes] header length, little-endian u16 (v1) -- or 4 bytes, u32 (v2/v3)
//! [header ] Python dict literal, space padded and '\n' terminated:
//!           {'descr': '<f4', 'fortran_order': False, 'shape': (N, H, W), }
//! [data   ] C-order element bytes
//! ```
//!
//! Headers are parsed and written by `npyz`. Payloads are read through a
//! memory map so channel and leading-axis slices only touch the pages they
//! need.

pub mod dtype;
pub mod header;
pub mod reader;
pub mod writer;

pub use dtype::{ByteOrder, NpyDType};
pub use header::{NPY_MAGIC, NpyHeader};
pub use reader::NpyFile;
pub use writer::write_npy;
