//! # gridprep
//!
//! **Turns multi-channel grid-map tensors into per-field `.npy` datasets.**
//!
//! A raw source is a `[N, H, W, C]` array whose last axis multiplexes an
//! obstacle layer, start and goal markers and optional heuristic fields.
//! gridprep splits that axis into six co-indexed `[N, 1, H, W]` arrays and
//! writes them under a fixed layout:
//!
//! ```text
//! <dataset_dir>/<split>/maps.npy     bool  free space
//!                       starts.npy   bool  start cell
//!                       goals.npy    bool  goal cell
//!                       focal.npy    bool  always empty
//!                       cf.npy       cost-to-go field (or empty)
//!                       abs.npy      heuristic field  (or empty)
//! ```
//!
//! ## Layers
//!
//! - [`format::npy`]: memory-mapped `.npy` reader and writer
//! - [`array`]: owned typed arrays with the few ops conversion needs
//! - [`convert`]: [`ChannelDecomposer`] per [`SourceFormat`], and
//!   [`SubsetExtractor`] for leading-sample subsets
//! - [`pipeline`]: runs a [`ConvertConfig`] over every split

pub mod array;
pub mod config;
pub mod convert;
pub mod error;
pub mod format;
pub mod inspect;
pub mod pipeline;

pub use array::{ArrayData, Element, NdArray};
pub use config::{ConvertConfig, SubsetConfig};
pub use convert::{
    ChannelDecomposer, Field, OutputDataset, Sentinels, SourceArrays, SourceFormat, SourceLayout,
    SubsetExtractor,
};
pub use error::{Error, Result};
pub use format::npy::{NpyDType, NpyFile, NpyHeader};
pub use pipeline::{SplitReport, run};
