//! COCO instances JSON reader.
//!
//! COCO bounding boxes use `[x, y, width, height]` where `(x, y)` is the
//! top-left corner in absolute pixels, which is exactly the
//! [`BoundingBox`] layout, so boxes are carried over unchanged.
//!
//! Only the detection-relevant parts of the file are read: `images`,
//! `annotations` and `categories`. Segmentation, `iscrowd`, `area` and the
//! `info`/`licenses` blocks are accepted and ignored.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use super::model::{Annotation, Category, ImageMetadata, ImageRecord, RecordSet};
use super::{accept_annotations, BoundingBox};
use crate::error::CocoYoloError;

#[derive(Debug, Deserialize)]
struct CocoInstances {
    images: Vec<CocoImage>,

    #[serde(default)]
    annotations: Vec<CocoAnnotation>,

    #[serde(default)]
    categories: Vec<CocoCategory>,
}

#[derive(Debug, Deserialize)]
struct CocoImage {
    id: u64,
    width: u32,
    height: u32,
    file_name: String,

    #[serde(default)]
    date_captured: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CocoCategory {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CocoAnnotation {
    id: u64,
    image_id: u64,
    category_id: u64,

    /// `[x, y, width, height]` with `(x, y)` as the top-left corner.
    bbox: [f64; 4],
}

/// Reads a [`RecordSet`] from a COCO instances JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed. Annotations that
/// parse but break annotation invariants are skipped and counted.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use cocoyolo::records::io_coco_json::read_coco_json;
///
/// let records = read_coco_json(Path::new("instances_default.json"))?;
/// # Ok::<(), cocoyolo::CocoYoloError>(())
/// ```
pub fn read_coco_json(path: &Path) -> Result<RecordSet, CocoYoloError> {
    let reader = BufReader::new(File::open(path)?);

    let coco: CocoInstances =
        serde_json::from_reader(reader).map_err(|source| CocoYoloError::CocoJsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(coco_to_records(coco))
}

/// Reads a [`RecordSet`] from a COCO JSON string.
pub fn from_coco_str(json: &str) -> Result<RecordSet, serde_json::Error> {
    let coco: CocoInstances = serde_json::from_str(json)?;
    Ok(coco_to_records(coco))
}

fn coco_to_records(coco: CocoInstances) -> RecordSet {
    let images = coco
        .images
        .into_iter()
        .map(|img| {
            ImageRecord::new(img.id, img.file_name, img.width, img.height).with_metadata(
                ImageMetadata {
                    date: img.date_captured,
                    ..Default::default()
                },
            )
        })
        .collect();

    let mut categories: Vec<Category> = coco
        .categories
        .into_iter()
        .map(|cat| Category::new(cat.id, cat.name))
        .collect();
    categories.sort_by_key(|cat| cat.id);

    let (annotations, rejected_annotations) =
        accept_annotations(coco.annotations.into_iter().map(|ann| {
            Annotation::new(
                ann.id,
                ann.image_id,
                ann.category_id,
                BoundingBox::from_coco(ann.bbox),
            )
        }));

    RecordSet {
        images,
        annotations,
        categories,
        rejected_annotations,
    }
}
