//! The six co-indexed arrays of one converted split

use std::path::Path;

use super::field::Field;
use crate::array::NdArray;
use crate::error::{Error, Result};
use crate::format::npy::{NpyFile, write_npy};

/// Converted split held in memory
///
/// Every array is `[N, 1, H, W]`; index `i` of each describes the same sample.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDataset {
    pub maps: NdArray,
    pub starts: NdArray,
    pub goals: NdArray,
    pub focal: NdArray,
    pub cf: NdArray,
    pub abs: NdArray,
}

impl OutputDataset {
    pub fn field(&self, field: Field) -> &NdArray {
        match field {
            Field::Maps => &self.maps,
            Field::Starts => &self.starts,
            Field::Goals => &self.goals,
            Field::Focal => &self.focal,
            Field::Cf => &self.cf,
            Field::Abs => &self.abs,
        }
    }

    /// Fields in write order.
    pub fn fields(&self) -> impl Iterator<Item = (Field, &NdArray)> {
        Field::ALL.into_iter().map(move |f| (f, self.field(f)))
    }

    pub fn num_samples(&self) -> usize {
        self.maps.num_samples()
    }

    /// First `k` samples of every field.
    pub fn take(&self, k: usize) -> Self {
        Self {
            maps: self.maps.take_leading(k),
            starts: self.starts.take_leading(k),
            goals: self.goals.take_leading(k),
            focal: self.focal.take_leading(k),
            cf: self.cf.take_leading(k),
            abs: self.abs.take_leading(k),
        }
    }

    /// Write each field to `<dir>/<field>.npy`, creating `dir` if needed.
    ///
    /// Fields are written one at a time; a failure leaves earlier fields on disk.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        for (field, array) in self.fields() {
            write_npy(field.path_in(dir), array)?;
            tracing::debug!(
                field = field.name(),
                shape = ?array.shape(),
                dtype = %array.dtype(),
                "saved field"
            );
        }
        Ok(())
    }

    /// Read a converted split back from `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let read = |field: Field| NpyFile::open(field.path_in(dir))?.read_all();
        let dataset = Self {
            maps: read(Field::Maps)?,
            starts: read(Field::Starts)?,
            goals: read(Field::Goals)?,
            focal: read(Field::Focal)?,
            cf: read(Field::Cf)?,
            abs: read(Field::Abs)?,
        };
        dataset.check_co_indexed()?;
        Ok(dataset)
    }

    /// Every field must share the leading dimension of `maps`.
    pub fn check_co_indexed(&self) -> Result<()> {
        let n = self.num_samples();
        for (field, array) in self.fields() {
            if array.num_samples() != n {
                return Err(Error::ShapeMismatch {
                    reason: format!(
                        "field '{field}' has {} samples, maps has {n}",
                        array.num_samples()
                    ),
                });
            }
        }
        Ok(())
    }
}
