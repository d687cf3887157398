//! gridprep error types

use std::path::PathBuf;

use crate::format::npy::NpyDType;

/// gridprep result type
pub type Result<T> = std::result::Result<T, Error>;

/// gridprep errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input arrays disagree in rank, leading dimension or grid size
    #[error("shape mismatch: {reason}")]
    ShapeMismatch {
        /// Description of the disagreement
        reason: String,
    },

    /// Source last axis is too small for the selected format
    #[error("missing channel: source has {actual} channel(s), {required} required")]
    MissingChannel {
        /// Channels the format needs
        required: usize,
        /// Channels present in the source
        actual: usize,
    },

    /// Read or write failure on a specific file or directory
    #[error("I/O error on {}", path.display())]
    Io {
        /// File or directory being accessed
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Malformed `.npy` header or payload
    #[error("npy format error: {reason}")]
    Format {
        /// Description of what went wrong
        reason: String,
    },

    /// `.npy` descriptor this crate cannot decode
    #[error("unsupported dtype: {descr}")]
    UnsupportedDType {
        /// The raw descriptor string
        descr: String,
    },

    /// Typed access with the wrong element type
    #[error("dtype mismatch: expected {expected}, got {got}")]
    DTypeMismatch {
        /// Requested dtype
        expected: NpyDType,
        /// Actual dtype
        got: NpyDType,
    },

    /// Invalid argument to an operation
    #[error("invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// Argument name
        arg: &'static str,
        /// Why it's invalid
        reason: String,
    },

    /// Configuration file could not be read or parsed
    #[error("config error: {reason}")]
    Config {
        /// Description of what went wrong
        reason: String,
    },
}

impl Error {
    /// Attach a path to an I/O error.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(reason: impl Into<String>) -> Self {
        Error::Format {
            reason: reason.into(),
        }
    }
}
