//! Leading-sample subsets of converted splits

use std::path::Path;

use super::field::Field;
use crate::error::{Error, Result};
use crate::format::npy::{NpyFile, write_npy};

/// Copies the first `count` samples of each field into another directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsetExtractor {
    count: usize,
}

impl SubsetExtractor {
    pub fn new(count: usize) -> Self {
        Self { count }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Truncate every field of `src_dir` and write it under `dst_dir`.
    ///
    /// Only the leading samples are decoded from the source maps. Splits
    /// with fewer than `count` samples are copied whole. `dst_dir` must not
    /// resolve to `src_dir` under any spelling. Returns the number of
    /// samples written for `maps`.
    pub fn extract(&self, src_dir: impl AsRef<Path>, dst_dir: impl AsRef<Path>) -> Result<usize> {
        let (src_dir, dst_dir) = (src_dir.as_ref(), dst_dir.as_ref());
        std::fs::create_dir_all(dst_dir).map_err(|e| Error::io(dst_dir, e))?;
        if same_dir(src_dir, dst_dir) {
            return Err(Error::InvalidArgument {
                arg: "dst_dir",
                reason: format!(
                    "subset {} would overwrite its source {}",
                    dst_dir.display(),
                    src_dir.display()
                ),
            });
        }

        let mut taken = 0;
        for field in Field::ALL {
            let src = NpyFile::open(field.path_in(src_dir))?;
            let subset = src.read_leading(self.count)?;
            write_npy(field.path_in(dst_dir), &subset)?;

            let rows = subset.num_samples();
            if field == Field::Maps {
                taken = rows;
            }
            tracing::debug!(field = field.name(), rows, of = src.num_samples(), "subset field");
        }
        tracing::info!(
            src = %src_dir.display(),
            dst = %dst_dir.display(),
            samples = taken,
            "subset written"
        );
        Ok(taken)
    }
}

/// Whether `a` and `b` name the same directory, following `..` and symlinks.
///
/// Paths that do not exist yet can only match textually.
pub(crate) fn same_dir(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
