//! Flat-file record reader.
//!
//! Annotations arrive as two CSV exports of the labelling database: one with
//! bounding-box rows and one with image rows, joined on the image ID.
//!
//! # Bounding-box file
//!
//! | column        | type | notes                                 |
//! |---------------|------|---------------------------------------|
//! | `id`          | u64  | alias `annotation_id`                 |
//! | `image_id`    | u64  |                                       |
//! | `category_id` | u64  | 1-based                               |
//! | `x`, `y`      | f64  | top-left corner, pixels               |
//! | `w`, `h`      | f64  | size in pixels, must be positive      |
//!
//! # Image file
//!
//! `id`, `filename` (aliases `file_name`, `path`), `width`, `height`, and the
//! optional columns `date`, `view`, `image_quality` (alias `quality`),
//! `context`, `orientation` (EXIF tag value). Empty optional cells read as
//! absent.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use super::model::{Annotation, ImageMetadata, ImageRecord, Orientation, RecordSet};
use super::{accept_annotations, BoundingBox};
use crate::error::CocoYoloError;

#[derive(Debug, Deserialize)]
struct BboxRow {
    #[serde(alias = "annotation_id")]
    id: u64,
    image_id: u64,
    category_id: u64,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

#[derive(Debug, Deserialize)]
struct ImageRow {
    #[serde(alias = "image_id")]
    id: u64,
    #[serde(alias = "file_name", alias = "path")]
    filename: String,
    width: u32,
    height: u32,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    view: Option<String>,
    #[serde(default, alias = "quality")]
    image_quality: Option<String>,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    orientation: Option<u16>,
}

/// Reads a bounding-box CSV and an image CSV into a [`RecordSet`].
///
/// # Errors
/// Returns an error if either file cannot be opened or a row cannot be
/// deserialized. Rows that deserialize but break annotation invariants are
/// skipped and counted in [`RecordSet::rejected_annotations`].
pub fn read_csv_pair(bbox_path: &Path, images_path: &Path) -> Result<RecordSet, CocoYoloError> {
    let bbox_file = BufReader::new(File::open(bbox_path)?);
    let images_file = BufReader::new(File::open(images_path)?);

    let bbox_rows = read_rows::<BboxRow, _>(bbox_file, bbox_path)?;
    let image_rows = read_rows::<ImageRow, _>(images_file, images_path)?;

    Ok(rows_to_records(bbox_rows, image_rows))
}

/// Reads a [`RecordSet`] from in-memory CSV text.
///
/// Useful for testing without file I/O.
pub fn from_csv_strs(bbox_csv: &str, images_csv: &str) -> Result<RecordSet, CocoYoloError> {
    let bbox_rows = read_rows::<BboxRow, _>(bbox_csv.as_bytes(), Path::new("<bbox string>"))?;
    let image_rows = read_rows::<ImageRow, _>(images_csv.as_bytes(), Path::new("<images string>"))?;
    Ok(rows_to_records(bbox_rows, image_rows))
}

fn read_rows<T, R>(reader: R, path: &Path) -> Result<Vec<T>, CocoYoloError>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    csv_reader
        .deserialize()
        .map(|result| {
            result.map_err(|source| CocoYoloError::CsvParse {
                path: path.to_path_buf(),
                source,
            })
        })
        .collect()
}

fn rows_to_records(bbox_rows: Vec<BboxRow>, image_rows: Vec<ImageRow>) -> RecordSet {
    let (annotations, rejected_annotations) = accept_annotations(bbox_rows.into_iter().map(|row| {
        Annotation::new(
            row.id,
            row.image_id,
            row.category_id,
            BoundingBox::new(row.x, row.y, row.w, row.h),
        )
    }));

    let images = image_rows.into_iter().map(image_row_to_record).collect();

    RecordSet {
        images,
        annotations,
        categories: Vec::new(),
        rejected_annotations,
    }
}

fn image_row_to_record(row: ImageRow) -> ImageRecord {
    let orientation = row.orientation.and_then(|tag| {
        let parsed = Orientation::from_exif(tag);
        if parsed.is_none() {
            log::debug!("image {}: ignoring unknown EXIF orientation {tag}", row.id);
        }
        parsed
    });

    let mut record = ImageRecord::new(row.id, row.filename, row.width, row.height).with_metadata(
        ImageMetadata {
            date: row.date,
            view: row.view,
            quality: row.image_quality,
            context: row.context,
        },
    );
    record.orientation = orientation;
    record
}
