pub mod npy;

pub use npy::{ByteOrder, NpyDType, NpyFile, NpyHeader, write_npy};
