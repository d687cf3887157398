//! End-to-end run: decompose every split, then optionally subset it

use std::path::PathBuf;

use rayon::prelude::*;

use crate::config::ConvertConfig;
use crate::convert::{ChannelDecomposer, SourceArrays, SubsetExtractor};
use crate::error::Result;

/// Outcome of one split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReport {
    pub split: String,
    pub num_samples: usize,
    pub output_dir: PathBuf,
    /// Subset directory and the number of samples it holds
    pub subset: Option<(PathBuf, usize)>,
}

/// Convert every configured split.
///
/// A split's subset is only taken after its decomposition succeeded, and
/// fields already written by a failing split stay on disk.
///
/// Sequential runs stop at the first failing split. Parallel runs let every
/// split that already started finish its writes and subset, then return the
/// first error in configured split order.
pub fn run(config: &ConvertConfig) -> Result<Vec<SplitReport>> {
    config.validate()?;
    let splits = config.resolved_splits();
    let decomposer =
        ChannelDecomposer::new(config.format).with_sentinels(config.resolved_sentinels());

    tracing::info!(
        splits = ?splits,
        format = config.format.name(),
        dataset_dir = %config.dataset_dir.display(),
        parallel = config.parallel,
        "starting conversion"
    );

    if config.parallel {
        let results: Vec<Result<SplitReport>> = splits
            .par_iter()
            .map(|split| run_split(config, &decomposer, split))
            .collect();
        results.into_iter().collect()
    } else {
        splits
            .iter()
            .map(|split| run_split(config, &decomposer, split))
            .collect()
    }
}

fn run_split(
    config: &ConvertConfig,
    decomposer: &ChannelDecomposer,
    split: &str,
) -> Result<SplitReport> {
    let sources = SourceArrays::open_split(&config.source, config.format, split)?;
    let num_samples = sources.map.num_samples();
    let output_dir = decomposer.decompose_to(&sources, &config.dataset_dir, split)?;
    drop(sources);

    let subset = match &config.subset {
        Some(subset) => {
            let dst = subset.dataset_dir.join(split);
            let taken = SubsetExtractor::new(subset.size_for(split)).extract(&output_dir, &dst)?;
            Some((dst, taken))
        }
        None => None,
    };

    Ok(SplitReport {
        split: split.to_string(),
        num_samples,
        output_dir,
        subset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::NdArray;
    use crate::config::SubsetConfig;
    use crate::convert::{Field, SourceFormat, SourceLayout};
    use crate::error::Error;
    use crate::format::npy::write_npy;
    use std::path::Path;

    fn write_coded(path: &Path, n: usize) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut values = Vec::new();
        for s in 0..n {
            values.extend([0u8, 2, 0, 8, 1, s as u8, 0, 0]);
        }
        write_npy(path, &NdArray::from_vec(vec![n, 2, 2, 2], values).unwrap()).unwrap();
    }

    #[test]
    fn test_run_split_dirs_with_subset() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw");
        write_coded(&raw.join("train").join("maps.npy"), 5);
        write_coded(&raw.join("val").join("maps.npy"), 2);

        let config = ConvertConfig::new(
            SourceFormat::Coded,
            SourceLayout::SplitDirs { root: raw },
            dir.path().join("out"),
        )
        .with_splits(["train", "val"])
        .with_subset(
            SubsetConfig::new(dir.path().join("mini"))
                .with_train_size(3)
                .with_default_size(3),
        );

        let reports = run(&config).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].num_samples, 5);
        assert_eq!(reports[0].subset.as_ref().unwrap().1, 3);
        assert_eq!(reports[1].subset.as_ref().unwrap().1, 2);
        assert!(Field::Abs.path_in(&dir.path().join("mini").join("val")).is_file());
    }

    #[test]
    fn test_failed_split_is_not_subset() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw");
        write_coded(&raw.join("train").join("maps.npy"), 2);

        let config = ConvertConfig::new(
            SourceFormat::Coded,
            SourceLayout::SplitDirs { root: raw },
            dir.path().join("out"),
        )
        .with_splits(["train", "test"])
        .with_subset(SubsetConfig::new(dir.path().join("mini")));

        let err = run(&config).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(dir.path().join("mini").join("train").is_dir());
        assert!(!dir.path().join("mini").join("test").exists());
    }

    #[test]
    fn test_aliased_subset_dir_leaves_split_intact() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("raw").join("eval.npy");
        write_coded(&source, 3);

        let config = ConvertConfig::new(
            SourceFormat::Coded,
            SourceLayout::SingleFile { path: source },
            dir.path().join("out"),
        )
        .with_subset(SubsetConfig::new(dir.path().join("raw").join("..").join("out")));

        let err = run(&config).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        let split = dir.path().join("out").join("eval");
        for field in Field::ALL {
            let npy = crate::format::npy::NpyFile::open(field.path_in(&split)).unwrap();
            assert_eq!(npy.shape(), &[3, 1, 2, 2], "{field}");
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw");
        for split in ["train", "val", "test"] {
            write_coded(&raw.join(split).join("maps.npy"), 4);
        }
        let config = |out: &str, parallel| {
            ConvertConfig::new(
                SourceFormat::Coded,
                SourceLayout::SplitDirs { root: raw.clone() },
                dir.path().join(out),
            )
            .with_splits(["train", "val", "test"])
            .with_parallel(parallel)
        };

        let seq = run(&config("seq", false)).unwrap();
        let par = run(&config("par", true)).unwrap();
        assert_eq!(seq.len(), par.len());
        for (a, b) in seq.iter().zip(&par) {
            assert_eq!(a.split, b.split);
            for field in Field::ALL {
                let x = std::fs::read(field.path_in(&a.output_dir)).unwrap();
                let y = std::fs::read(field.path_in(&b.output_dir)).unwrap();
                assert_eq!(x, y, "{} {field}", a.split);
            }
        }
    }
}
