//! Record sources.
//!
//! The conversion core depends only on [`RecordSet`]; where the records come
//! from is hidden behind [`RecordSource`]. File-based sources live here; a
//! database-backed source implements the same trait.

use std::path::PathBuf;

use super::model::RecordSet;
use super::{io_coco_json, io_csv};
use crate::error::CocoYoloError;

/// Something that can produce bounding-box and image records.
pub trait RecordSource {
    /// Short human-readable description used in log output.
    fn describe(&self) -> String;

    /// Loads all records from the source.
    fn load(&self) -> Result<RecordSet, CocoYoloError>;
}

/// A bounding-box CSV paired with an image CSV.
#[derive(Clone, Debug)]
pub struct CsvPairSource {
    pub bbox_path: PathBuf,
    pub images_path: PathBuf,
}

impl RecordSource for CsvPairSource {
    fn describe(&self) -> String {
        format!(
            "CSV pair ({}, {})",
            self.bbox_path.display(),
            self.images_path.display()
        )
    }

    fn load(&self) -> Result<RecordSet, CocoYoloError> {
        io_csv::read_csv_pair(&self.bbox_path, &self.images_path)
    }
}

/// A COCO instances JSON file.
#[derive(Clone, Debug)]
pub struct CocoJsonSource {
    pub path: PathBuf,
}

impl RecordSource for CocoJsonSource {
    fn describe(&self) -> String {
        format!("COCO JSON ({})", self.path.display())
    }

    fn load(&self) -> Result<RecordSet, CocoYoloError> {
        io_coco_json::read_coco_json(&self.path)
    }
}

/// Records that are already in memory.
impl RecordSource for RecordSet {
    fn describe(&self) -> String {
        format!(
            "in-memory records ({} images, {} annotations)",
            self.images.len(),
            self.annotations.len()
        )
    }

    fn load(&self) -> Result<RecordSet, CocoYoloError> {
        Ok(self.clone())
    }
}
