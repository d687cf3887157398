//! Channel decomposition: `[N, H, W, C]` source → six `[N, 1, H, W]` fields

use std::path::{Path, PathBuf};

use super::dataset::OutputDataset;
use super::source::{Sentinels, SourceArrays, SourceFormat};
use crate::array::NdArray;
use crate::error::{Error, Result};

/// Position of the inserted channel axis; spatial axes stay last.
const CHANNEL_AXIS: usize = 1;

/// Splits the channel axis of a source tensor into per-field arrays
#[derive(Debug, Clone, Copy)]
pub struct ChannelDecomposer {
    format: SourceFormat,
    sentinels: Sentinels,
}

impl ChannelDecomposer {
    /// Decomposer using the format's default sentinel values.
    pub fn new(format: SourceFormat) -> Self {
        Self {
            format,
            sentinels: format.default_sentinels(),
        }
    }

    pub fn with_sentinels(mut self, sentinels: Sentinels) -> Self {
        self.sentinels = sentinels;
        self
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    pub fn sentinels(&self) -> Sentinels {
        self.sentinels
    }

    /// Build the six output fields in memory.
    ///
    /// Shapes are validated before any channel is decoded.
    pub fn decompose(&self, sources: &SourceArrays) -> Result<OutputDataset> {
        let (n, h, w) = self.validate(sources)?;
        let map = &sources.map;
        let s = self.sentinels;
        let mask = |channel: usize, sentinel: f64| -> Result<NdArray> {
            map.read_channel(channel)?
                .eq_scalar(sentinel)
                .insert_axis(CHANNEL_AXIS)
        };

        let maps = mask(self.format.free_channel(), s.free)?;
        let starts = mask(self.format.start_channel(), s.start)?;
        let goals = mask(self.format.goal_channel(), s.goal)?;
        let placeholder = || NdArray::falses(&[n, 1, h, w]);
        let focal = placeholder();

        let cf = match &sources.cost_field {
            Some(cost_field) if self.format.has_cost_field() => {
                cost_field.read_all()?.insert_axis(CHANNEL_AXIS)?
            }
            _ => placeholder(),
        };
        let abs = match self.format.abs_channel() {
            Some(channel) => map.read_channel(channel)?.insert_axis(CHANNEL_AXIS)?,
            None => placeholder(),
        };

        Ok(OutputDataset {
            maps,
            starts,
            goals,
            focal,
            cf,
            abs,
        })
    }

    /// Decompose and write `<dataset_dir>/<split>/<field>.npy`.
    ///
    /// Returns the split directory. Overwrites any previous output there.
    pub fn decompose_to(
        &self,
        sources: &SourceArrays,
        dataset_dir: impl AsRef<Path>,
        split: &str,
    ) -> Result<PathBuf> {
        let out_dir = dataset_dir.as_ref().join(split);
        tracing::info!(split, format = self.format.name(), "start transforming");
        let dataset = self.decompose(sources)?;

        tracing::info!(split, dir = %out_dir.display(), "start saving");
        dataset.save(&out_dir)?;
        tracing::info!(split, samples = dataset.num_samples(), "finish saving");
        Ok(out_dir)
    }

    /// Returns `(N, H, W)` of the source.
    fn validate(&self, sources: &SourceArrays) -> Result<(usize, usize, usize)> {
        let map = &sources.map;
        let (n, h, w, c) = match *map.shape() {
            [n, h, w, c] => (n, h, w, c),
            ref other => {
                return Err(Error::ShapeMismatch {
                    reason: format!(
                        "{}: expected a 4-d [N, H, W, C] map, got shape {other:?}",
                        map.path().display()
                    ),
                });
            }
        };

        let required = self.format.required_channels();
        if c < required {
            return Err(Error::MissingChannel {
                required,
                actual: c,
            });
        }
        if c > required {
            tracing::debug!(
                channels = c,
                used = required,
                "source has extra channels, ignoring them"
            );
        }

        if self.format.has_cost_field() {
            let cost_field = sources
                .cost_field
                .as_ref()
                .ok_or_else(|| Error::InvalidArgument {
                    arg: "cost_field",
                    reason: format!("format '{}' requires a cost field", self.format.name()),
                })?;
            match *cost_field.shape() {
                [cn, _, _] if cn != n => {
                    return Err(Error::ShapeMismatch {
                        reason: format!(
                            "cost field has {cn} samples, map has {n} ({})",
                            cost_field.path().display()
                        ),
                    });
                }
                [_, ch, cw] if (ch, cw) != (h, w) => {
                    return Err(Error::ShapeMismatch {
                        reason: format!(
                            "cost field grid is {ch}x{cw}, map grid is {h}x{w} ({})",
                            cost_field.path().display()
                        ),
                    });
                }
                [_, _, _] => {}
                ref other => {
                    return Err(Error::ShapeMismatch {
                        reason: format!(
                            "{}: expected a 3-d [N, H, W] cost field, got shape {other:?}",
                            cost_field.path().display()
                        ),
                    });
                }
            }
        }

        Ok((n, h, w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::npy::{NpyDType, write_npy};
    use std::path::Path;

    fn save(path: &Path, array: &NdArray) -> PathBuf {
        write_npy(path, array).unwrap();
        path.to_path_buf()
    }

    /// `[n, 2, 2, 4]` f32 source. Channel 2 holds `sample * 10 + cell`.
    fn channels4_source(dir: &Path, n: usize) -> (PathBuf, PathBuf) {
        let mut values = Vec::new();
        for s in 0..n {
            for cell in 0..4 {
                let free = if cell == 3 { 1.0 } else { 0.0 };
                let goal = if cell == 1 { 1.0 } else { 0.0 };
                let start = if cell == 0 { 1.0 } else { 0.0 };
                values.extend([free, goal, (s * 10 + cell) as f32, start]);
            }
        }
        let map = NdArray::from_vec(vec![n, 2, 2, 4], values).unwrap();
        let cf: Vec<f64> = (0..n * 4).map(|i| i as f64 * 0.5).collect();
        let cf = NdArray::from_vec(vec![n, 2, 2], cf).unwrap();
        (
            save(&dir.join("maps.npy"), &map),
            save(&dir.join("cf.npy"), &cf),
        )
    }

    #[test]
    fn test_channels4_fields() {
        let dir = tempfile::tempdir().unwrap();
        let (map, cf) = channels4_source(dir.path(), 2);
        let sources = SourceArrays::open(&map, Some(&cf)).unwrap();
        let ds = ChannelDecomposer::new(SourceFormat::Channels4)
            .decompose(&sources)
            .unwrap();

        for (_, array) in ds.fields() {
            assert_eq!(array.shape(), &[2, 1, 2, 2]);
        }
        assert_eq!(
            ds.maps.as_bools().unwrap(),
            &[true, true, true, false, true, true, true, false]
        );
        assert_eq!(ds.starts.sample_f64(1), Some(vec![1.0, 0.0, 0.0, 0.0]));
        assert_eq!(ds.goals.sample_f64(0), Some(vec![0.0, 1.0, 0.0, 0.0]));
        assert_eq!(ds.focal.count_true(), Some(0));

        assert_eq!(ds.cf.dtype(), NpyDType::F64);
        assert_eq!(ds.cf.sample_f64(1), Some(vec![2.0, 2.5, 3.0, 3.5]));
        assert_eq!(ds.abs.dtype(), NpyDType::F32);
        assert_eq!(ds.abs.sample_f64(1), Some(vec![10.0, 11.0, 12.0, 13.0]));
    }

    #[test]
    fn test_coded_fields() {
        let dir = tempfile::tempdir().unwrap();
        let codes = vec![0u8, 2, 0, 8, 1, 0, 0, 0];
        let map = NdArray::from_vec(vec![1, 2, 2, 2], codes).unwrap();
        let path = save(&dir.path().join("eval.npy"), &map);

        let sources = SourceArrays::open(&path, None).unwrap();
        let ds = ChannelDecomposer::new(SourceFormat::Coded)
            .decompose(&sources)
            .unwrap();
        assert_eq!(ds.maps.as_bools().unwrap(), &[true, true, false, true]);
        assert_eq!(ds.starts.as_bools().unwrap(), &[true, false, false, false]);
        assert_eq!(ds.goals.as_bools().unwrap(), &[false, true, false, false]);
        assert_eq!(ds.cf, NdArray::falses(&[1, 1, 2, 2]));
        assert_eq!(ds.abs, NdArray::falses(&[1, 1, 2, 2]));
    }

    #[test]
    fn test_custom_sentinels() {
        let dir = tempfile::tempdir().unwrap();
        let map = NdArray::from_vec(vec![1, 1, 3, 2], vec![5i32, 3, 0, 4, 5, 9]).unwrap();
        let path = save(&dir.path().join("m.npy"), &map);
        let sources = SourceArrays::open(&path, None).unwrap();

        let ds = ChannelDecomposer::new(SourceFormat::Coded)
            .with_sentinels(Sentinels {
                free: 5.0,
                start: 3.0,
                goal: 9.0,
            })
            .decompose(&sources)
            .unwrap();
        assert_eq!(ds.maps.as_bools().unwrap(), &[true, false, true]);
        assert_eq!(ds.starts.as_bools().unwrap(), &[true, false, false]);
        assert_eq!(ds.goals.as_bools().unwrap(), &[false, false, true]);
    }

    #[test]
    fn test_cost_field_sample_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let (map, _) = channels4_source(dir.path(), 3);
        let cf = save(
            &dir.path().join("short_cf.npy"),
            &NdArray::falses(&[2, 2, 2]),
        );
        let sources = SourceArrays::open(&map, Some(&cf)).unwrap();
        let err = ChannelDecomposer::new(SourceFormat::Channels4)
            .decompose(&sources)
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_cost_field_grid_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let (map, _) = channels4_source(dir.path(), 2);
        let cf = save(&dir.path().join("wide_cf.npy"), &NdArray::falses(&[2, 2, 3]));
        let sources = SourceArrays::open(&map, Some(&cf)).unwrap();
        assert!(matches!(
            ChannelDecomposer::new(SourceFormat::Channels4)
                .decompose(&sources)
                .unwrap_err(),
            Error::ShapeMismatch { .. }
        ));
    }

    #[test]
    fn test_missing_channels() {
        let dir = tempfile::tempdir().unwrap();
        let three = save(&dir.path().join("m3.npy"), &NdArray::falses(&[1, 2, 2, 3]));
        let cf = save(&dir.path().join("cf.npy"), &NdArray::falses(&[1, 2, 2]));
        let sources = SourceArrays::open(&three, Some(&cf)).unwrap();
        assert!(matches!(
            ChannelDecomposer::new(SourceFormat::Channels4)
                .decompose(&sources)
                .unwrap_err(),
            Error::MissingChannel {
                required: 4,
                actual: 3
            }
        ));

        let one = save(&dir.path().join("m1.npy"), &NdArray::falses(&[1, 2, 2, 1]));
        let sources = SourceArrays::open(&one, None).unwrap();
        assert!(matches!(
            ChannelDecomposer::new(SourceFormat::Coded)
                .decompose(&sources)
                .unwrap_err(),
            Error::MissingChannel {
                required: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_wrong_rank() {
        let dir = tempfile::tempdir().unwrap();
        let path = save(&dir.path().join("m.npy"), &NdArray::falses(&[2, 2, 2]));
        let sources = SourceArrays::open(&path, None).unwrap();
        assert!(matches!(
            ChannelDecomposer::new(SourceFormat::Coded)
                .decompose(&sources)
                .unwrap_err(),
            Error::ShapeMismatch { .. }
        ));
    }

    #[test]
    fn test_missing_cost_field_is_invalid_argument() {
        let dir = tempfile::tempdir().unwrap();
        let (map, _) = channels4_source(dir.path(), 1);
        let sources = SourceArrays::open(&map, None).unwrap();
        assert!(matches!(
            ChannelDecomposer::new(SourceFormat::Channels4)
                .decompose(&sources)
                .unwrap_err(),
            Error::InvalidArgument {
                arg: "cost_field",
                ..
            }
        ));
    }

    #[test]
    fn test_decompose_to_writes_split_dir() {
        let dir = tempfile::tempdir().unwrap();
        let (map, cf) = channels4_source(dir.path(), 2);
        let sources = SourceArrays::open(&map, Some(&cf)).unwrap();
        let out = ChannelDecomposer::new(SourceFormat::Channels4)
            .decompose_to(&sources, dir.path().join("dataset"), "train")
            .unwrap();
        assert_eq!(out, dir.path().join("dataset").join("train"));
        let loaded = OutputDataset::load(&out).unwrap();
        assert_eq!(loaded.num_samples(), 2);
    }
}
