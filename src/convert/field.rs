//! Output field names

use std::fmt;
use std::path::{Path, PathBuf};

/// One of the six co-indexed arrays of a converted split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// Free-space mask
    Maps,
    Starts,
    Goals,
    /// Search-region mask, always empty
    Focal,
    /// Cost-to-go field
    Cf,
    /// Absolute heuristic field
    Abs,
}

impl Field {
    /// All fields, in write order.
    pub const ALL: [Field; 6] = [
        Field::Maps,
        Field::Starts,
        Field::Goals,
        Field::Focal,
        Field::Cf,
        Field::Abs,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Maps => "maps",
            Field::Starts => "starts",
            Field::Goals => "goals",
            Field::Focal => "focal",
            Field::Cf => "cf",
            Field::Abs => "abs",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.npy", self.name())
    }

    /// `<dir>/<name>.npy`
    pub fn path_in(self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}
