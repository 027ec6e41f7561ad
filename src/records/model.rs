//! Typed records handed from the ingestion readers to the conversion core.
//!
//! Readers validate required fields at the boundary so that everything
//! downstream works with well-typed values instead of loosely-typed rows.

use serde::{Deserialize, Serialize};

use super::bbox::BoundingBox;
use super::ids::{AnnotationId, CategoryId, ImageId};
use crate::error::CocoYoloError;

/// Everything read from one annotation source.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RecordSet {
    /// Image metadata rows, in source order.
    pub images: Vec<ImageRecord>,

    /// Bounding-box rows that passed ingestion checks, in source order.
    pub annotations: Vec<Annotation>,

    /// Category names, when the source carries them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<Category>,

    /// Rows dropped at ingestion as malformed.
    #[serde(default)]
    pub rejected_annotations: usize,
}

/// One bounding box attached to one image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub image_id: ImageId,
    /// 1-based category ID; mapped to a 0-based class index on emission.
    pub category_id: CategoryId,
    pub bbox: BoundingBox,
}

impl Annotation {
    pub fn new(
        id: impl Into<AnnotationId>,
        image_id: impl Into<ImageId>,
        category_id: impl Into<CategoryId>,
        bbox: BoundingBox,
    ) -> Self {
        Self {
            id: id.into(),
            image_id: image_id.into(),
            category_id: category_id.into(),
            bbox,
        }
    }

    /// Checks the invariants the core relies on: finite geometry, positive
    /// width and height, and a 1-based category.
    pub fn check(&self) -> Result<(), CocoYoloError> {
        let reject = |message: String| CocoYoloError::MalformedAnnotation {
            annotation_id: self.id,
            message,
        };
        if !self.bbox.is_finite() {
            return Err(reject(format!("non-finite bbox {:?}", self.bbox)));
        }
        if !self.bbox.has_positive_size() {
            return Err(reject(format!(
                "non-positive size w={} h={}",
                self.bbox.w, self.bbox.h
            )));
        }
        if self.category_id.class_index().is_none() {
            return Err(reject("category_id 0 is outside the 1-based taxonomy".to_string()));
        }
        Ok(())
    }
}

/// Image metadata as recorded by the labelling source.
///
/// `width`/`height` are the values the source claims; the matcher always
/// re-reads the real dimensions from the file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,

    /// File name or relative path under the images directory.
    pub file_name: String,

    pub width: u32,
    pub height: u32,

    #[serde(default, skip_serializing_if = "ImageMetadata::is_empty")]
    pub metadata: ImageMetadata,

    /// EXIF orientation, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
}

impl ImageRecord {
    pub fn new(id: impl Into<ImageId>, file_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
            metadata: ImageMetadata::default(),
            orientation: None,
        }
    }

    pub fn with_metadata(mut self, metadata: ImageMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    /// Capture day as a `YYYYMMDD` integer, from a `YYYY-MM-DD...` date.
    pub fn day(&self) -> Option<u32> {
        let date = self.metadata.date.as_deref()?.trim();
        let prefix = date.get(..10)?;
        let mut parts = prefix.split('-');
        let (year, month, day) = (parts.next()?, parts.next()?, parts.next()?);
        if year.len() != 4 || month.len() != 2 || day.len() != 2 {
            return None;
        }
        let year: u32 = year.parse().ok()?;
        let month: u32 = month.parse().ok()?;
        let day: u32 = day.parse().ok()?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return None;
        }
        Some(year * 10_000 + month * 100 + day)
    }
}

/// Optional descriptive fields carried along with an image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ImageMetadata {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.view.is_none() && self.quality.is_none() && self.context.is_none()
    }
}

/// EXIF orientation of the stored pixels.
///
/// The tag comes from the image record (e.g. an `orientation` CSV column);
/// it is not read from the image file.
///
/// Absence of orientation data is the common case and is modelled as
/// `Option<Orientation>::None` on [`ImageRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Orientation {
    Normal,
    MirrorHorizontal,
    Rotate180,
    MirrorVertical,
    MirrorHorizontalRotate270,
    Rotate90,
    MirrorHorizontalRotate90,
    Rotate270,
}

impl Orientation {
    /// Parses an EXIF orientation tag value (1..=8).
    pub fn from_exif(value: u16) -> Option<Self> {
        Some(match value {
            1 => Self::Normal,
            2 => Self::MirrorHorizontal,
            3 => Self::Rotate180,
            4 => Self::MirrorVertical,
            5 => Self::MirrorHorizontalRotate270,
            6 => Self::Rotate90,
            7 => Self::MirrorHorizontalRotate90,
            8 => Self::Rotate270,
            _ => return None,
        })
    }

    pub fn to_exif(self) -> u16 {
        match self {
            Self::Normal => 1,
            Self::MirrorHorizontal => 2,
            Self::Rotate180 => 3,
            Self::MirrorVertical => 4,
            Self::MirrorHorizontalRotate270 => 5,
            Self::Rotate90 => 6,
            Self::MirrorHorizontalRotate90 => 7,
            Self::Rotate270 => 8,
        }
    }

    /// Returns true if displaying the image swaps its stored width and height.
    pub fn swaps_dimensions(self) -> bool {
        self.to_exif() >= 5
    }
}

impl TryFrom<u16> for Orientation {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::from_exif(value).ok_or_else(|| format!("invalid EXIF orientation {value}"))
    }
}

impl From<Orientation> for u16 {
    fn from(value: Orientation) -> Self {
        value.to_exif()
    }
}

/// A named category, when the source provides names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
