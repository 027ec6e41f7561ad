use std::path::PathBuf;
use thiserror::Error;

use crate::records::{AnnotationId, ImageId};

/// The main error type for cocoyolo operations.
///
/// Per-image problems (`MissingImageFile`, `UnreadableImage`) and rejected
/// rows (`MalformedAnnotation`) are logged and counted by the pipeline; the
/// remaining variants abort a run.
#[derive(Debug, Error)]
pub enum CocoYoloError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse CSV records from {path}: {source}")]
    CsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to parse COCO JSON from {path}: {source}")]
    CocoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Image {image_id} has no file at {path}")]
    MissingImageFile { image_id: ImageId, path: PathBuf },

    #[error("Malformed annotation {annotation_id}: {message}")]
    MalformedAnnotation {
        annotation_id: AnnotationId,
        message: String,
    },

    #[error("Failed to read image dimensions from {path}: {source}")]
    UnreadableImage {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize data.yaml for {path}: {source}")]
    DataYamlWrite {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize report: {0}")]
    ReportJson(#[source] serde_json::Error),

    #[error("Images {first} and {second} would share the label file {label}")]
    LabelCollision {
        label: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("YOLO record for {path} is outside [0, 1]: '{record}'")]
    OutOfRangeBox { path: PathBuf, record: String },
}
