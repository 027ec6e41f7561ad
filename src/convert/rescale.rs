//! Rescaling annotations to the canonical image height.

use crate::error::CocoYoloError;
use crate::records::Annotation;

use super::transform::{normalize, YoloRecord};

/// Scales each annotation by `ratio`, truncates to whole pixels, and
/// normalizes against a `target_h` x `target_w` image.
///
/// `ratio` is `target_h / original_height`, the same factor the image itself
/// is resized by. Output order matches input order. Boxes that collapse to
/// zero width or height after truncation are kept; see
/// [`YoloRecord::is_degenerate`].
///
/// # Errors
/// Returns [`CocoYoloError::MalformedAnnotation`] for an annotation whose
/// category has no 0-based class index.
pub fn rescale_and_normalize(
    annotations: &[Annotation],
    ratio: f64,
    target_h: u32,
    target_w: u32,
) -> Result<Vec<YoloRecord>, CocoYoloError> {
    annotations
        .iter()
        .map(|ann| {
            let class_index =
                ann.category_id
                    .class_index()
                    .ok_or_else(|| CocoYoloError::MalformedAnnotation {
                        annotation_id: ann.id,
                        message: format!("category_id {} has no class index", ann.category_id),
                    })?;

            let scaled = ann.bbox.scaled_truncated(ratio);
            Ok(YoloRecord {
                class_index,
                geometry: normalize(&scaled, f64::from(target_h), f64::from(target_w)),
            })
        })
        .collect()
}

/// Renders records as label-file lines, class index first.
pub fn label_lines(records: &[YoloRecord]) -> Vec<String> {
    records.iter().map(YoloRecord::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::BoundingBox;

    fn ann(id: u64, category: u64, bbox: [f64; 4]) -> Annotation {
        Annotation::new(id, 1u64, category, BoundingBox::from_coco(bbox))
    }

    #[test]
    fn unit_ratio_keeps_pixels_and_shifts_class() {
        let records =
            rescale_and_normalize(&[ann(1, 3, [100.0, 100.0, 200.0, 300.0])], 1.0, 1080, 1920)
                .expect("rescale");
        assert_eq!(
            label_lines(&records),
            vec!["2 0.104167 0.231481 0.104167 0.277778".to_string()]
        );
    }

    #[test]
    fn scaling_truncates_before_normalizing() {
        // 2160p source scaled to 1080: ratio 0.5, 3840 wide becomes 1920.
        let records =
            rescale_and_normalize(&[ann(1, 1, [101.0, 51.0, 203.0, 99.0])], 0.5, 1080, 1920)
                .expect("rescale");
        let g = records[0].geometry;
        // Truncated box is [50, 25, 101, 49].
        assert!((g.w - 101.0 / 1920.0).abs() < 1e-12);
        assert!((g.h - 49.0 / 1080.0).abs() < 1e-12);
        assert!((g.x_center - (50.0 + 50.5) / 1920.0).abs() < 1e-12);
        assert!((g.y_center - (25.0 + 24.5) / 1080.0).abs() < 1e-12);
    }

    #[test]
    fn order_is_preserved_and_degenerate_boxes_are_kept() {
        let input = vec![
            ann(1, 2, [10.0, 10.0, 40.0, 40.0]),
            ann(2, 1, [10.0, 10.0, 1.0, 40.0]),
            ann(3, 5, [0.0, 0.0, 80.0, 80.0]),
        ];
        let records = rescale_and_normalize(&input, 0.5, 540, 960).expect("rescale");

        assert_eq!(records.len(), 3);
        let classes: Vec<usize> = records.iter().map(|r| r.class_index).collect();
        assert_eq!(classes, vec![1, 0, 4]);
        assert!(records[1].is_degenerate());
        assert!(!records[0].is_degenerate());
    }

    #[test]
    fn category_zero_is_an_error() {
        let err = rescale_and_normalize(&[ann(9, 0, [1.0, 1.0, 2.0, 2.0])], 1.0, 10, 10)
            .unwrap_err();
        assert!(matches!(err, CocoYoloError::MalformedAnnotation { .. }));
    }
}
