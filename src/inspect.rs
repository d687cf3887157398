//! Textual summary of a converted split

use std::fmt;
use std::path::Path;

use crate::convert::Field;
use crate::error::Result;
use crate::format::npy::{NpyDType, NpyFile};

/// Shape and content summary of one field file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSummary {
    pub field: Field,
    pub dtype: NpyDType,
    pub shape: Vec<usize>,
    /// Set for boolean fields only
    pub true_count: Option<usize>,
}

impl fmt::Display for FieldSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<7} {:<8} {:?}", self.field.name(), self.dtype, self.shape)?;
        if let Some(count) = self.true_count {
            write!(f, " true={count}")?;
        }
        Ok(())
    }
}

/// Summarize every field of `dir` without decoding the payloads.
pub fn summarize_split(dir: impl AsRef<Path>) -> Result<Vec<FieldSummary>> {
    let dir = dir.as_ref();
    Field::ALL
        .into_iter()
        .map(|field| {
            let npy = NpyFile::open(field.path_in(dir))?;
            Ok(FieldSummary {
                field,
                dtype: npy.dtype(),
                shape: npy.shape().to_vec(),
                true_count: npy.count_true(),
            })
        })
        .collect()
}
