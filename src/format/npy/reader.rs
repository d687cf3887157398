//! Memory-mapped `.npy` reader
//!
//! The file is mapped copy-on-write and read-only, so only pages that a
//! channel or leading-axis slice actually touches are paged in. Decoding
//! produces owned [`NdArray`]s in host byte order.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapOptions};

use super::dtype::{ByteOrder, NpyDType};
use super::header::{NPY_MAGIC, NpyHeader};
use crate::array::{ArrayData, Element, NdArray};
use crate::error::{Error, Result};

/// An opened `.npy` file
pub struct NpyFile {
    path: PathBuf,
    mmap: Mmap,
    header: NpyHeader,
    data_offset: usize,
    data_len: usize,
}

impl NpyFile {
    /// Open and validate an `.npy` file.
    ///
    /// Fortran-ordered arrays are rejected; everything this crate writes or
    /// consumes is C-ordered.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let file_len = file.metadata().map_err(|e| Error::io(path, e))?.len();
        if file_len < NPY_MAGIC.len() as u64 {
            return Err(Error::format(format!(
                "{}: file size {file_len} is smaller than the npy magic",
                path.display()
            )));
        }

        // SAFETY: mapped read-only with private copy-on-write semantics; the
        // payload is only ever read through bounds-checked slices, and this
        // crate replaces files by rename rather than truncating them.
        let mmap = unsafe { MmapOptions::new().map_copy_read_only(&file) }
            .map_err(|e| Error::io(path, e))?;

        let (header, data_offset) = NpyHeader::read_prefix(&mmap)
            .map_err(|e| with_path(e, path))?;
        let data_len = header.data_len().map_err(|e| with_path(e, path))?;

        let available = mmap.len().saturating_sub(data_offset);
        if available < data_len {
            return Err(Error::format(format!(
                "{}: payload truncated, expected {data_len} bytes, found {available}",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            mmap,
            header,
            data_offset,
            data_len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &NpyHeader {
        &self.header
    }

    pub fn shape(&self) -> &[usize] {
        &self.header.shape
    }

    pub fn dtype(&self) -> NpyDType {
        self.header.dtype
    }

    /// Size of the leading axis (1 for a 0-d array).
    pub fn num_samples(&self) -> usize {
        self.header.shape.first().copied().unwrap_or(1)
    }

    /// Raw element bytes, exactly `header().data_len()` long.
    pub fn data(&self) -> &[u8] {
        &self.mmap[self.data_offset..self.data_offset + self.data_len]
    }

    /// Decode the whole array.
    pub fn read_all(&self) -> Result<NdArray> {
        let data = self.decode(0, 1, self.header.numel()?);
        NdArray::new(self.header.shape.clone(), data)
    }

    /// Decode index `channel` of the last axis, dropping that axis.
    ///
    /// `[N, H, W, C]` becomes `[N, H, W]`.
    pub fn read_channel(&self, channel: usize) -> Result<NdArray> {
        let (&channels, outer) = self.header.shape.split_last().ok_or_else(|| {
            Error::ShapeMismatch {
                reason: format!("{}: cannot take a channel of a 0-d array", self.path.display()),
            }
        })?;
        if channel >= channels {
            return Err(Error::MissingChannel {
                required: channel + 1,
                actual: channels,
            });
        }

        let count: usize = outer.iter().product();
        let data = self.decode(channel, channels, count);
        NdArray::new(outer.to_vec(), data)
    }

    /// Decode the first `k` entries of the leading axis (all of them if `k` is larger).
    ///
    /// Only the pages holding those entries are touched.
    pub fn read_leading(&self, k: usize) -> Result<NdArray> {
        let mut shape = self.header.shape.clone();
        if let Some(first) = shape.first_mut() {
            *first = k.min(*first);
        }
        let count: usize = shape.iter().product();
        NdArray::new(shape, self.decode(0, 1, count))
    }

    /// Number of nonzero elements of a boolean file, read straight from the map.
    pub fn count_true(&self) -> Option<usize> {
        (self.header.dtype == NpyDType::Bool)
            .then(|| self.data().iter().filter(|&&b| b != 0).count())
    }

    /// Decode `count` elements starting at element `start`, stepping by `stride`.
    fn decode(&self, start: usize, stride: usize, count: usize) -> ArrayData {
        let bytes = self.data();
        let order = self.header.byte_order;
        match self.header.dtype {
            NpyDType::Bool => {
                ArrayData::Bool((0..count).map(|i| bytes[start + i * stride] != 0).collect())
            }
            NpyDType::I8 => gather::<i8>(bytes, order, start, stride, count),
            NpyDType::U8 => gather::<u8>(bytes, order, start, stride, count),
            NpyDType::I16 => gather::<i16>(bytes, order, start, stride, count),
            NpyDType::U16 => gather::<u16>(bytes, order, start, stride, count),
            NpyDType::I32 => gather::<i32>(bytes, order, start, stride, count),
            NpyDType::U32 => gather::<u32>(bytes, order, start, stride, count),
            NpyDType::I64 => gather::<i64>(bytes, order, start, stride, count),
            NpyDType::U64 => gather::<u64>(bytes, order, start, stride, count),
            NpyDType::F16 => gather::<half::f16>(bytes, order, start, stride, count),
            NpyDType::F32 => gather::<f32>(bytes, order, start, stride, count),
            NpyDType::F64 => gather::<f64>(bytes, order, start, stride, count),
        }
    }
}

fn with_path(err: Error, path: &Path) -> Error {
    match err {
        Error::Format { reason } => Error::format(format!("{}: {reason}", path.display())),
        other => other,
    }
}

impl std::fmt::Debug for NpyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NpyFile")
            .field("path", &self.path)
            .field("header", &self.header)
            .finish()
    }
}

fn gather<T: Element>(
    bytes: &[u8],
    order: ByteOrder,
    start: usize,
    stride: usize,
    count: usize,
) -> ArrayData {
    let size = std::mem::size_of::<T>();
    let swap = order.needs_swap();
    let values = (0..count)
        .map(|i| {
            let offset = (start + i * stride) * size;
            let value: T = bytemuck::pod_read_unaligned(&bytes[offset..offset + size]);
            if swap { value.swap_bytes() } else { value }
        })
        .collect();
    T::into_data(values)
}
