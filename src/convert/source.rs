//! Source tensor formats and where to find them on disk

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::format::npy::NpyFile;

/// Layout of the raw `[N, H, W, C]` map tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Four channels (free, goal, heuristic, start) plus a sibling `cf.npy`
    /// cost field of shape `[N, H, W]`.
    Channels4,
    /// Channel 0 is free space, channel 1 holds integer cell categories with
    /// reserved start and goal codes. No cost or heuristic field.
    Coded,
}

impl SourceFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Channels4 => "channels4",
            Self::Coded => "coded",
        }
    }

    /// Minimum size of the last axis
    pub fn required_channels(self) -> usize {
        match self {
            Self::Channels4 => 4,
            Self::Coded => 2,
        }
    }

    pub fn free_channel(self) -> usize {
        0
    }

    pub fn start_channel(self) -> usize {
        match self {
            Self::Channels4 => 3,
            Self::Coded => 1,
        }
    }

    pub fn goal_channel(self) -> usize {
        1
    }

    /// Channel copied verbatim into `abs`, if any
    pub fn abs_channel(self) -> Option<usize> {
        match self {
            Self::Channels4 => Some(2),
            Self::Coded => None,
        }
    }

    pub fn has_cost_field(self) -> bool {
        matches!(self, Self::Channels4)
    }

    pub fn default_sentinels(self) -> Sentinels {
        match self {
            Self::Channels4 => Sentinels {
                free: 0.0,
                start: 1.0,
                goal: 1.0,
            },
            Self::Coded => Sentinels {
                free: 0.0,
                start: 2.0,
                goal: 8.0,
            },
        }
    }

    /// Splits converted when none are configured
    pub fn default_splits(self) -> Vec<String> {
        match self {
            Self::Channels4 => vec!["train".into(), "val".into(), "test".into()],
            Self::Coded => vec!["eval".into()],
        }
    }
}

impl std::str::FromStr for SourceFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "channels4" | "a" => Ok(Self::Channels4),
            "coded" | "b" => Ok(Self::Coded),
            _ => Err(Error::InvalidArgument {
                arg: "format",
                reason: format!("unknown source format '{s}' (expected channels4 or coded)"),
            }),
        }
    }
}

/// Values a channel must equal for a cell to be marked
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentinels {
    pub free: f64,
    pub start: f64,
    pub goal: f64,
}

/// Where the source arrays of each split live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum SourceLayout {
    /// `<root>/<split>/maps.npy`, plus `<root>/<split>/cf.npy` for formats
    /// with a cost field.
    SplitDirs { root: PathBuf },
    /// One map file shared by every split; a cost field, if needed, is the
    /// sibling `cf.npy`.
    SingleFile { path: PathBuf },
}

impl SourceLayout {
    /// Map and optional cost-field paths for `split`.
    pub fn paths(&self, format: SourceFormat, split: &str) -> (PathBuf, Option<PathBuf>) {
        let (map, dir) = match self {
            Self::SplitDirs { root } => {
                let dir = root.join(split);
                (dir.join("maps.npy"), dir)
            }
            Self::SingleFile { path } => (
                path.clone(),
                path.parent().map(Path::to_path_buf).unwrap_or_default(),
            ),
        };
        let cost_field = format.has_cost_field().then(|| dir.join("cf.npy"));
        (map, cost_field)
    }
}

/// Opened source arrays for one split
#[derive(Debug)]
pub struct SourceArrays {
    pub map: NpyFile,
    pub cost_field: Option<NpyFile>,
}

impl SourceArrays {
    pub fn open(map: impl AsRef<Path>, cost_field: Option<&Path>) -> Result<Self> {
        let map = NpyFile::open(map)?;
        let cost_field = cost_field.map(NpyFile::open).transpose()?;
        Ok(Self { map, cost_field })
    }

    /// Open the arrays of `split` as laid out by `layout`.
    pub fn open_split(layout: &SourceLayout, format: SourceFormat, split: &str) -> Result<Self> {
        let (map, cost_field) = layout.paths(format, split);
        Self::open(&map, cost_field.as_deref())
    }
}
