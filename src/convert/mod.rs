//! COCO-to-YOLO dataset build.
//!
//! The pipeline runs in four sequential passes:
//!
//! 1. [`matcher`] joins annotations to image records and files on disk.
//! 2. [`rescale`] scales each matched image's boxes to the canonical height
//!    and normalizes them with [`transform`].
//! 3. [`split`] partitions the labelled images into train and validation.
//! 4. [`emit`] writes label files, manifests and `data.yaml`.
//!
//! Per-image problems are counted in the [`BuildReport`]; only write
//! failures (and out-of-range records in strict mode) abort a build.

pub mod emit;
pub mod matcher;
pub mod report;
pub mod rescale;
pub mod split;
pub mod transform;

use std::collections::BTreeMap;

use crate::config::BuildConfig;
use crate::error::CocoYoloError;
use crate::records::{RecordSet, RecordSource};

pub use emit::LabelledImage;
pub use matcher::{MatchCounts, MatchOutcome, MatchedImage};
pub use report::{BuildReport, LabelCounts};
pub use split::SplitStrategy;
pub use transform::{YoloGeometry, YoloRecord};

/// Loads records from `source` and builds the dataset described by `config`.
pub fn build_dataset(
    source: &dyn RecordSource,
    config: &BuildConfig,
) -> Result<BuildReport, CocoYoloError> {
    config.validate()?;
    log::info!("loading records from {}", source.describe());
    let records = source.load()?;
    log::info!(
        "loaded {} image record(s) and {} annotation(s) ({} rejected)",
        records.images.len(),
        records.annotations.len(),
        records.rejected_annotations
    );

    let mut report = build_from_records(&records, config)?;
    report.source = source.describe();
    Ok(report)
}

/// Builds the dataset from records already in memory.
pub fn build_from_records(
    records: &RecordSet,
    config: &BuildConfig,
) -> Result<BuildReport, CocoYoloError> {
    config.validate()?;

    let outcome = matcher::match_records(&records.annotations, &records.images, config);
    log::info!(
        "matched {} image(s), {} unmatched",
        outcome.matched_count(),
        outcome.unmatched_count()
    );

    let mut label_counts = LabelCounts::default();
    let mut labelled = Vec::with_capacity(outcome.matched.len());
    for image in &outcome.matched {
        labelled.push(label_image(image, config, &mut label_counts)?);
    }

    let class_names = class_names(records, &labelled);

    let (train, val) = split::split(labelled, config.split_ratio, config.split_strategy);
    log::info!("split: {} train / {} val", train.len(), val.len());

    let emitted = emit::emit_dataset(config, &train, &val, &class_names)?;

    Ok(BuildReport {
        source: "in-memory records".to_string(),
        images_in_source: records.images.len(),
        annotations_in_source: records.annotations.len(),
        rejected_annotations: records.rejected_annotations,
        matching: outcome.counts,
        labels: label_counts,
        emitted,
        split_ratio: config.split_ratio,
        split_strategy: config.split_strategy,
        train_images: train.len(),
        val_images: val.len(),
    })
}

fn label_image(
    image: &MatchedImage,
    config: &BuildConfig,
    counts: &mut LabelCounts,
) -> Result<LabelledImage, CocoYoloError> {
    let records = rescale::rescale_and_normalize(
        &image.annotations,
        image.ratio,
        image.target_height,
        image.target_width,
    )?;

    for record in &records {
        counts.records += 1;
        if record.is_degenerate() {
            log::debug!("{}: degenerate box kept: '{}'", image.path.display(), record);
            counts.degenerate += 1;
        }
        if !record.is_in_range() {
            if config.strict {
                return Err(CocoYoloError::OutOfRangeBox {
                    path: image.path.clone(),
                    record: record.to_string(),
                });
            }
            log::warn!(
                "{}: YOLO record outside [0, 1]: '{}'",
                image.path.display(),
                record
            );
            counts.out_of_range += 1;
        }
    }

    Ok(LabelledImage {
        image_path: image.path.clone(),
        records,
    })
}

/// Class names indexed by YOLO class index.
///
/// Source category names are used where available; any class index that
/// appears in the labels without a name becomes `class_<index>`.
fn class_names(records: &RecordSet, labelled: &[LabelledImage]) -> Vec<String> {
    let mut names: BTreeMap<usize, String> = records
        .categories
        .iter()
        .filter_map(|cat| Some((cat.id.class_index()?, cat.name.clone())))
        .collect();

    let max_used = labelled
        .iter()
        .flat_map(|img| img.records.iter().map(|r| r.class_index))
        .max();
    let max_named = names.keys().next_back().copied();

    let Some(max_index) = max_used.max(max_named) else {
        return Vec::new();
    };
    (0..=max_index)
        .map(|idx| {
            names
                .remove(&idx)
                .unwrap_or_else(|| format!("class_{idx}"))
        })
        .collect()
}
