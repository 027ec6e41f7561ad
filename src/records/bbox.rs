//! Pixel-space bounding boxes in COCO `[x, y, w, h]` layout.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in absolute pixels, top-left origin.
///
/// Construction does not check `w > 0 && h > 0`; the ingestion readers
/// reject such boxes with [`MalformedAnnotation`](crate::CocoYoloError::MalformedAnnotation)
/// so the core only sees well-formed input. Boxes produced by
/// [`scaled_truncated`](Self::scaled_truncated) may legitimately collapse
/// to zero size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BoundingBox {
    #[inline]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Builds a box from a COCO `bbox` array.
    #[inline]
    pub fn from_coco(bbox: [f64; 4]) -> Self {
        Self::new(bbox[0], bbox[1], bbox[2], bbox[3])
    }

    /// Returns true if all four values are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.w.is_finite() && self.h.is_finite()
    }

    /// Returns true if both width and height are strictly positive.
    #[inline]
    pub fn has_positive_size(&self) -> bool {
        self.w > 0.0 && self.h > 0.0
    }

    /// Multiplies every component by `ratio` and truncates toward zero.
    ///
    /// This matches the integer pixel grid of an image resized by the same
    /// ratio, so label space and pixel space stay aligned.
    pub fn scaled_truncated(&self, ratio: f64) -> Self {
        Self::new(
            (self.x * ratio).trunc(),
            (self.y * ratio).trunc(),
            (self.w * ratio).trunc(),
            (self.h * ratio).trunc(),
        )
    }
}
