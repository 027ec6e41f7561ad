//! Explicit run configuration passed to every stage of the pipeline.

use std::path::{Path, PathBuf};

use crate::convert::split::SplitStrategy;
use crate::error::CocoYoloError;

/// Canonical height every image is rescaled to before normalization.
pub const DEFAULT_TARGET_HEIGHT: u32 = 1080;

/// Fraction of matched images assigned to the training split.
pub const DEFAULT_SPLIT_RATIO: f64 = 0.85;

/// Configuration for one dataset build.
#[derive(Clone, Debug)]
pub struct BuildConfig {
    /// Root of the generated dataset (`labels/`, `train.txt`, `val.txt`).
    pub data_dir: PathBuf,

    /// Directory image file names are resolved against.
    pub images_dir: PathBuf,

    /// Fraction of matched images assigned to train, in (0, 1).
    pub split_ratio: f64,

    /// Stop after this many matched images; 0 means no limit.
    pub limit: usize,

    /// Height in pixels the label geometry is computed for.
    pub target_height: u32,

    pub split_strategy: SplitStrategy,

    /// Treat out-of-range YOLO records as fatal instead of warning.
    pub strict: bool,

    /// Fall back to a file-name search of `images_dir` when the recorded
    /// path does not exist.
    pub recursive_lookup: bool,
}

impl BuildConfig {
    /// Creates a configuration with default numeric parameters.
    pub fn new(data_dir: impl Into<PathBuf>, images_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            images_dir: images_dir.into(),
            split_ratio: DEFAULT_SPLIT_RATIO,
            limit: 0,
            target_height: DEFAULT_TARGET_HEIGHT,
            split_strategy: SplitStrategy::Sequential,
            strict: false,
            recursive_lookup: true,
        }
    }

    pub fn with_split_ratio(mut self, ratio: f64) -> Self {
        self.split_ratio = ratio;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_target_height(mut self, target_height: u32) -> Self {
        self.target_height = target_height;
        self
    }

    pub fn with_split_strategy(mut self, strategy: SplitStrategy) -> Self {
        self.split_strategy = strategy;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_recursive_lookup(mut self, recursive_lookup: bool) -> Self {
        self.recursive_lookup = recursive_lookup;
        self
    }

    /// Directory label files are written to.
    pub fn labels_dir(&self) -> PathBuf {
        self.data_dir.join("labels")
    }

    /// Resolves `path` against the data directory unless it is absolute.
    pub fn resolve_in_data_dir(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    /// Rejects parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), CocoYoloError> {
        if !(self.split_ratio > 0.0 && self.split_ratio < 1.0) {
            return Err(CocoYoloError::Configuration(format!(
                "split ratio must be in the interval (0, 1), got {}",
                self.split_ratio
            )));
        }
        if self.target_height == 0 {
            return Err(CocoYoloError::Configuration(
                "target height must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
