//! Conversion configuration
//!
//! A run is described by one [`ConvertConfig`], built in code with the
//! `with_*` methods or loaded from JSON:
//!
//! ```json
//! {
//!   "format": "channels4",
//!   "source": { "layout": "split_dirs", "root": "AlekSet" },
//!   "dataset_dir": "TransPath_AlekSet",
//!   "splits": ["train", "val", "test"],
//!   "subset": { "dataset_dir": "TransPath_AlekSet_mini" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::convert::subset::same_dir;
use crate::convert::{Sentinels, SourceFormat, SourceLayout};
use crate::error::{Error, Result};

pub const DEFAULT_TRAIN_SUBSET: usize = 64_000;
pub const DEFAULT_SUBSET: usize = 16_000;

/// Full description of a conversion run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertConfig {
    pub format: SourceFormat,
    pub source: SourceLayout,
    /// Root of the converted dataset; each split lands in `<dataset_dir>/<split>`.
    pub dataset_dir: PathBuf,
    /// Empty means the format's default splits.
    #[serde(default)]
    pub splits: Vec<String>,
    /// Overrides the format's default sentinel values.
    #[serde(default)]
    pub sentinels: Option<Sentinels>,
    #[serde(default)]
    pub subset: Option<SubsetConfig>,
    /// Convert splits concurrently.
    #[serde(default)]
    pub parallel: bool,
}

/// Where and how large the subset copies are
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubsetConfig {
    pub dataset_dir: PathBuf,
    /// Per-split sample counts; unlisted splits use the defaults below.
    #[serde(default)]
    pub sizes: BTreeMap<String, usize>,
    #[serde(default = "default_train_subset")]
    pub train_size: usize,
    #[serde(default = "default_subset")]
    pub default_size: usize,
}

fn default_train_subset() -> usize {
    DEFAULT_TRAIN_SUBSET
}

fn default_subset() -> usize {
    DEFAULT_SUBSET
}

impl SubsetConfig {
    pub fn new(dataset_dir: impl Into<PathBuf>) -> Self {
        Self {
            dataset_dir: dataset_dir.into(),
            sizes: BTreeMap::new(),
            train_size: DEFAULT_TRAIN_SUBSET,
            default_size: DEFAULT_SUBSET,
        }
    }

    pub fn with_size(mut self, split: impl Into<String>, size: usize) -> Self {
        self.sizes.insert(split.into(), size);
        self
    }

    pub fn with_train_size(mut self, size: usize) -> Self {
        self.train_size = size;
        self
    }

    pub fn with_default_size(mut self, size: usize) -> Self {
        self.default_size = size;
        self
    }

    /// Sample count for `split`.
    pub fn size_for(&self, split: &str) -> usize {
        match self.sizes.get(split) {
            Some(&size) => size,
            None if split == "train" => self.train_size,
            None => self.default_size,
        }
    }
}

impl ConvertConfig {
    pub fn new(
        format: SourceFormat,
        source: SourceLayout,
        dataset_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            format,
            source,
            dataset_dir: dataset_dir.into(),
            splits: Vec::new(),
            sentinels: None,
            subset: None,
            parallel: false,
        }
    }

    pub fn with_splits<S: Into<String>>(mut self, splits: impl IntoIterator<Item = S>) -> Self {
        self.splits = splits.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sentinels(mut self, sentinels: Sentinels) -> Self {
        self.sentinels = Some(sentinels);
        self
    }

    pub fn with_subset(mut self, subset: SubsetConfig) -> Self {
        self.subset = Some(subset);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Configured splits, or the format's defaults.
    pub fn resolved_splits(&self) -> Vec<String> {
        if self.splits.is_empty() {
            self.format.default_splits()
        } else {
            self.splits.clone()
        }
    }

    pub fn resolved_sentinels(&self) -> Sentinels {
        self.sentinels
            .unwrap_or_else(|| self.format.default_sentinels())
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| Error::Config {
            reason: format!("JSON parse error: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json_str(&text).map_err(|e| match e {
            Error::Config { reason } => Error::Config {
                reason: format!("{}: {reason}", path.display()),
            },
            other => other,
        })
    }

    /// Reject configurations that would collide on disk.
    pub fn validate(&self) -> Result<()> {
        let splits = self.resolved_splits();
        for (i, split) in splits.iter().enumerate() {
            if split.is_empty() || split.contains(['/', '\\']) || split == "." || split == ".." {
                return Err(Error::InvalidArgument {
                    arg: "splits",
                    reason: format!("'{split}' is not a valid split directory name"),
                });
            }
            if splits[..i].contains(split) {
                return Err(Error::InvalidArgument {
                    arg: "splits",
                    reason: format!("split '{split}' listed twice"),
                });
            }
        }

        if let Some(subset) = &self.subset {
            if same_dir(&subset.dataset_dir, &self.dataset_dir) {
                return Err(Error::InvalidArgument {
                    arg: "subset.dataset_dir",
                    reason: "subset output must differ from the dataset directory".into(),
                });
            }
        }
        Ok(())
    }
}
