//! Pixel `[x, y, w, h]` to normalized, center-based YOLO geometry.

use std::fmt;

use serde::Serialize;

use crate::records::BoundingBox;

/// Normalized YOLO box geometry.
///
/// Every field lies in `[0, 1]` when the source box fits inside the image.
/// Values outside that range are kept as-is so callers can flag them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct YoloGeometry {
    pub x_center: f64,
    pub y_center: f64,
    pub w: f64,
    pub h: f64,
}

impl YoloGeometry {
    /// Returns true if all four values are finite and within `[0, 1]`.
    pub fn is_in_range(&self) -> bool {
        [self.x_center, self.y_center, self.w, self.h]
            .iter()
            .all(|v| v.is_finite() && (0.0..=1.0).contains(v))
    }

    /// Converts back to a top-left pixel box for an image of the given size.
    pub fn to_pixel_bbox(&self, image_height: f64, image_width: f64) -> BoundingBox {
        let w = self.w * image_width;
        let h = self.h * image_height;
        BoundingBox::new(
            self.x_center * image_width - w / 2.0,
            self.y_center * image_height - h / 2.0,
            w,
            h,
        )
    }
}

/// One line of a YOLO label file.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct YoloRecord {
    pub class_index: usize,
    pub geometry: YoloGeometry,
}

impl YoloRecord {
    pub fn is_in_range(&self) -> bool {
        self.geometry.is_in_range()
    }

    /// Returns true if the box has zero (or negative) width or height.
    pub fn is_degenerate(&self) -> bool {
        self.geometry.w <= 0.0 || self.geometry.h <= 0.0
    }
}

impl fmt::Display for YoloRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = &self.geometry;
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_index, g.x_center, g.y_center, g.w, g.h
        )
    }
}

/// Normalizes a pixel box against an image of `image_height` x `image_width`.
///
/// `x` and `w` are divided by the width, `y` and `h` by the height, then the
/// top-left corner is moved to the box center. Both dimensions must be
/// positive; the result is meaningless otherwise.
pub fn normalize(bbox: &BoundingBox, image_height: f64, image_width: f64) -> YoloGeometry {
    let x_left = bbox.x / image_width;
    let w = bbox.w / image_width;
    let y_top = bbox.y / image_height;
    let h = bbox.h / image_height;

    YoloGeometry {
        x_center: x_left + w / 2.0,
        y_center: y_top + h / 2.0,
        w,
        h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn normalize_moves_origin_to_center() {
        let g = normalize(&BoundingBox::new(100.0, 100.0, 200.0, 300.0), 1080.0, 1920.0);
        assert_close(g.x_center, 200.0 / 1920.0);
        assert_close(g.y_center, 250.0 / 1080.0);
        assert_close(g.w, 200.0 / 1920.0);
        assert_close(g.h, 300.0 / 1080.0);
        assert!(g.is_in_range());
    }

    #[test]
    fn full_image_box_is_centered_unit_box() {
        let g = normalize(&BoundingBox::new(0.0, 0.0, 640.0, 480.0), 480.0, 640.0);
        assert_eq!(
            g,
            YoloGeometry {
                x_center: 0.5,
                y_center: 0.5,
                w: 1.0,
                h: 1.0
            }
        );
    }

    #[test]
    fn boxes_past_the_edge_are_flagged_not_clamped() {
        let past_right = normalize(&BoundingBox::new(700.0, 0.0, 100.0, 10.0), 480.0, 640.0);
        assert!(!past_right.is_in_range());
        assert!((past_right.x_center - 750.0 / 640.0).abs() < 1e-9);

        let past_top = normalize(&BoundingBox::new(10.0, -40.0, 10.0, 20.0), 480.0, 640.0);
        assert!(!past_top.is_in_range());
        assert!(past_top.y_center < 0.0);
    }

    #[test]
    fn display_uses_six_decimals_class_first() {
        let record = YoloRecord {
            class_index: 2,
            geometry: normalize(&BoundingBox::new(100.0, 100.0, 200.0, 300.0), 1080.0, 1920.0),
        };
        assert_eq!(record.to_string(), "2 0.104167 0.231481 0.104167 0.277778");
    }

    #[test]
    fn to_pixel_bbox_inverts_normalize() {
        let bbox = BoundingBox::new(12.0, 34.0, 56.0, 78.0);
        let restored = normalize(&bbox, 480.0, 640.0).to_pixel_bbox(480.0, 640.0);
        assert_close(restored.x, bbox.x);
        assert_close(restored.y, bbox.y);
        assert_close(restored.w, bbox.w);
        assert_close(restored.h, bbox.h);
    }
}
