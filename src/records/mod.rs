//! Typed annotation records and the readers that produce them.
//!
//! This is the ingestion boundary: flat CSV pairs and COCO instance files
//! are parsed here into [`RecordSet`]s, and rows that break the invariants
//! of [`Annotation::check`] are rejected and counted rather than passed on.
//!
//! # Example
//!
//! ```
//! use cocoyolo::records::{Annotation, BoundingBox, ImageRecord, RecordSet};
//!
//! let records = RecordSet {
//!     images: vec![ImageRecord::new(1u64, "frame_0001.jpg", 1920, 1080)],
//!     annotations: vec![Annotation::new(
//!         1u64,
//!         1u64,
//!         3u64,
//!         BoundingBox::new(100.0, 100.0, 200.0, 300.0),
//!     )],
//!     ..Default::default()
//! };
//! assert_eq!(records.annotations[0].category_id.class_index(), Some(2));
//! ```

mod bbox;
mod ids;
pub mod io_coco_json;
pub mod io_csv;
mod model;
pub mod source;

pub use bbox::BoundingBox;
pub use ids::{AnnotationId, CategoryId, ImageId};
pub use model::{Annotation, Category, ImageMetadata, ImageRecord, Orientation, RecordSet};
pub use source::{CocoJsonSource, CsvPairSource, RecordSource};

/// Keeps annotations that pass [`Annotation::check`], logging the rest.
///
/// Returns the accepted annotations in input order and the rejected count.
pub(crate) fn accept_annotations(
    annotations: impl IntoIterator<Item = Annotation>,
) -> (Vec<Annotation>, usize) {
    let mut accepted = Vec::new();
    let mut rejected = 0;
    for annotation in annotations {
        match annotation.check() {
            Ok(()) => accepted.push(annotation),
            Err(err) => {
                log::warn!("{err}; row skipped");
                rejected += 1;
            }
        }
    }
    (accepted, rejected)
}
