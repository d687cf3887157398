//! `.npy` writer
//!
//! Arrays are written C-ordered and little-endian through `npyz`. Each file
//! is staged in a temporary file next to its destination and renamed into
//! place, so a file that is still memory-mapped elsewhere is replaced rather
//! than truncated.

use std::io::{self, BufWriter, Write};
use std::path::Path;

use npyz::{DType, WriterBuilder};
use tempfile::NamedTempFile;

use crate::array::{NdArray, with_data};
use crate::error::{Error, Result};

const WRITE_BUFFER: usize = 1 << 20;

/// Save `array` to `path`, replacing any existing file.
pub fn write_npy(path: impl AsRef<Path>, array: &NdArray) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let dtype = array.dtype().to_npyz()?;
    let shape: Vec<u64> = array.shape().iter().map(|&dim| dim as u64).collect();

    let staged = NamedTempFile::new_in(dir).map_err(|e| Error::io(path, e))?;
    let mut out = BufWriter::with_capacity(WRITE_BUFFER, staged.as_file());
    with_data!(array.data(), |values| write_values(&mut out, dtype, &shape, values))
        .and_then(|()| out.flush())
        .map_err(|e| Error::io(path, e))?;
    drop(out);

    staged.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

fn write_values<T, W>(out: W, dtype: DType, shape: &[u64], values: &[T]) -> io::Result<()>
where
    T: npyz::Serialize + Copy,
    W: Write,
{
    let mut writer = npyz::WriteOptions::new()
        .dtype(dtype)
        .shape(shape)
        .writer(out)
        .begin_nd()?;
    writer.extend(values.iter().copied())?;
    writer.finish()
}
