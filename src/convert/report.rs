//! Summary of a dataset build.
//!
//! Printed on every normal completion, either as text through `Display`
//! or as JSON through `Serialize`.

use serde::Serialize;
use std::fmt;

use super::emit::EmitCounts;
use super::matcher::MatchCounts;
use super::split::SplitStrategy;

/// Quality counters for the generated YOLO records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LabelCounts {
    pub records: usize,
    /// Boxes that truncated to zero width or height and were kept.
    pub degenerate: usize,
    /// Records with a value outside `[0, 1]`.
    pub out_of_range: usize,
}

/// Everything a caller needs to judge the data quality of one run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BuildReport {
    /// Description of the record source.
    pub source: String,
    pub images_in_source: usize,
    pub annotations_in_source: usize,
    /// Annotation rows rejected at ingestion as malformed.
    pub rejected_annotations: usize,
    pub matching: MatchCounts,
    pub labels: LabelCounts,
    pub emitted: EmitCounts,
    pub split_ratio: f64,
    pub split_strategy: SplitStrategy,
    pub train_images: usize,
    pub val_images: usize,
}

impl BuildReport {
    pub fn matched_count(&self) -> usize {
        self.matching.matched
    }

    pub fn unmatched_count(&self) -> usize {
        self.matching.unmatched()
    }

    /// Returns true if anything was dropped, rejected or flagged.
    pub fn has_data_issues(&self) -> bool {
        self.unmatched_count() > 0
            || self.rejected_annotations > 0
            || self.matching.orphan_annotations > 0
            || self.labels.degenerate > 0
            || self.labels.out_of_range > 0
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "found {} valid annotations with images and {} unmatched annotations",
            self.matched_count(),
            self.unmatched_count()
        )?;
        writeln!(f, "  source: {}", self.source)?;
        writeln!(
            f,
            "  {} images, {} annotations read; {} image(s) scanned",
            self.images_in_source, self.annotations_in_source, self.matching.scanned
        )?;
        writeln!(
            f,
            "  split: {} train / {} val (ratio {})",
            self.train_images, self.val_images, self.split_ratio
        )?;
        writeln!(
            f,
            "  wrote {} label file(s), {} record(s)",
            self.emitted.label_files, self.emitted.records
        )?;

        if self.has_data_issues() {
            writeln!(f)?;
            writeln!(f, "Data issues:")?;
            let lines = [
                (self.matching.missing_file, "image(s) with no file on disk"),
                (self.matching.no_annotations, "image(s) without annotations"),
                (self.matching.unreadable, "image(s) with unreadable headers"),
                (self.matching.too_small, "image(s) too narrow to rescale"),
                (
                    self.matching.duplicate_stem,
                    "image(s) skipped for sharing a label file name",
                ),
                (
                    self.matching.orphan_annotations,
                    "annotation(s) referencing unknown images",
                ),
                (self.rejected_annotations, "malformed annotation(s) rejected"),
                (self.labels.degenerate, "degenerate box(es) kept after rescaling"),
                (self.labels.out_of_range, "record(s) outside [0, 1]"),
            ];
            for (count, what) in lines.iter().filter(|(count, _)| *count > 0) {
                writeln!(f, "  - {} {}", count, what)?;
            }
        }

        Ok(())
    }
}
