//! Source decomposition and subsetting

pub mod dataset;
pub mod decompose;
pub mod field;
pub mod source;
pub mod subset;

pub use dataset::OutputDataset;
pub use decompose::ChannelDecomposer;
pub use field::Field;
pub use source::{Sentinels, SourceArrays, SourceFormat, SourceLayout};
pub use subset::SubsetExtractor;
