//! Joins bounding-box records to image records and image files on disk.
//!
//! An image is *matched* when its file resolves under the images directory,
//! its real dimensions can be read from the file header, and at least one
//! annotation references it. Everything else is counted as unmatched and
//! logged; nothing here is fatal.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::config::BuildConfig;
use crate::error::CocoYoloError;
use crate::records::{Annotation, ImageId, ImageRecord};

use super::emit::label_file_name;

/// An image ready for label generation.
#[derive(Clone, Debug)]
pub struct MatchedImage {
    pub record: ImageRecord,

    /// Where the image file was found.
    pub path: PathBuf,

    /// Annotations for this image, in source order.
    pub annotations: Vec<Annotation>,

    /// `target_height / actual_height`.
    pub ratio: f64,

    pub target_height: u32,

    /// `round(ratio * actual_width)`.
    pub target_width: u32,
}

/// Bookkeeping for one matching pass.
///
/// `matched + unmatched() == scanned` always holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MatchCounts {
    /// Image records examined before the scan stopped.
    pub scanned: usize,
    pub matched: usize,
    pub missing_file: usize,
    pub no_annotations: usize,
    pub unreadable: usize,
    /// Images whose width rescales to zero pixels.
    pub too_small: usize,
    /// Images whose label file name is already taken by an earlier match.
    pub duplicate_stem: usize,
    /// Annotations whose `image_id` has no image record.
    pub orphan_annotations: usize,
}

impl MatchCounts {
    pub fn unmatched(&self) -> usize {
        self.missing_file
            + self.no_annotations
            + self.unreadable
            + self.too_small
            + self.duplicate_stem
    }
}

/// Result of [`match_records`].
#[derive(Clone, Debug, Default)]
pub struct MatchOutcome {
    pub matched: Vec<MatchedImage>,
    pub counts: MatchCounts,
}

impl MatchOutcome {
    pub fn matched_count(&self) -> usize {
        self.counts.matched
    }

    pub fn unmatched_count(&self) -> usize {
        self.counts.unmatched()
    }
}

/// Matches `images` against `annotations` and the files under
/// `config.images_dir`.
///
/// Images are scanned in input order. With a positive `config.limit` the
/// scan stops as soon as that many images have matched, and the counts
/// cover only the images examined so far.
pub fn match_records(
    annotations: &[Annotation],
    images: &[ImageRecord],
    config: &BuildConfig,
) -> MatchOutcome {
    let mut by_image: HashMap<ImageId, Vec<Annotation>> = HashMap::new();
    for ann in annotations {
        by_image.entry(ann.image_id).or_default().push(ann.clone());
    }

    let known_ids: HashSet<ImageId> = images.iter().map(|img| img.id).collect();
    let orphan_annotations = annotations
        .iter()
        .filter(|ann| !known_ids.contains(&ann.image_id))
        .count();
    if orphan_annotations > 0 {
        log::warn!("{orphan_annotations} annotation(s) reference images with no image record");
    }

    let mut resolver = PathResolver::new(&config.images_dir, config.recursive_lookup);
    let mut label_owners: HashMap<OsString, PathBuf> = HashMap::new();
    let mut outcome = MatchOutcome {
        matched: Vec::new(),
        counts: MatchCounts {
            orphan_annotations,
            ..Default::default()
        },
    };

    for image in images {
        if config.limit > 0 && outcome.matched.len() >= config.limit {
            log::info!("stopping after {} matched image(s) (limit)", config.limit);
            break;
        }
        outcome.counts.scanned += 1;

        let Some(image_annotations) = by_image.get(&image.id) else {
            log::debug!("image {} ({}) has no annotations", image.id, image.file_name);
            outcome.counts.no_annotations += 1;
            continue;
        };

        let Some(path) = resolver.resolve(&image.file_name) else {
            let err = CocoYoloError::MissingImageFile {
                image_id: image.id,
                path: config.images_dir.join(&image.file_name),
            };
            log::warn!("{err}");
            outcome.counts.missing_file += 1;
            continue;
        };

        let (width, height) = match read_oriented_dimensions(&path, image) {
            Ok(Some(dims)) => dims,
            Ok(None) => {
                log::warn!("image {} at {} reports a zero dimension", image.id, path.display());
                outcome.counts.unreadable += 1;
                continue;
            }
            Err(err) => {
                log::warn!("{err}");
                outcome.counts.unreadable += 1;
                continue;
            }
        };

        let ratio = f64::from(config.target_height) / f64::from(height);
        let target_width = (ratio * f64::from(width)).round() as u32;
        if target_width == 0 {
            log::warn!(
                "image {} at {} ({}x{}) rescales to zero width at height {}",
                image.id,
                path.display(),
                width,
                height,
                config.target_height
            );
            outcome.counts.too_small += 1;
            continue;
        }

        let label_name = label_file_name(&path);
        if let Some(first) = label_owners.get(&label_name) {
            log::warn!(
                "image {} at {} has the same label file name as {}; skipped",
                image.id,
                path.display(),
                first.display()
            );
            outcome.counts.duplicate_stem += 1;
            continue;
        }
        label_owners.insert(label_name, path.clone());
        log::debug!(
            "image {} matched at {} ({}x{}, ratio {:.4})",
            image.id,
            path.display(),
            width,
            height,
            ratio
        );

        outcome.matched.push(MatchedImage {
            record: image.clone(),
            path,
            annotations: image_annotations.clone(),
            ratio,
            target_height: config.target_height,
            target_width,
        });
        outcome.counts.matched += 1;
    }

    outcome
}

/// Reads `(width, height)` from the file header, as displayed.
///
/// Quarter-turn EXIF orientations swap the stored dimensions. `Ok(None)`
/// means the header declares a zero dimension.
pub fn read_oriented_dimensions(
    path: &Path,
    record: &ImageRecord,
) -> Result<Option<(u32, u32)>, CocoYoloError> {
    let size = imagesize::size(path).map_err(|source| CocoYoloError::UnreadableImage {
        path: path.to_path_buf(),
        source,
    })?;

    let (Ok(width), Ok(height)) = (u32::try_from(size.width), u32::try_from(size.height)) else {
        return Ok(None);
    };
    if width == 0 || height == 0 {
        return Ok(None);
    }

    match record.orientation {
        Some(orientation) if orientation.swaps_dimensions() => Ok(Some((height, width))),
        _ => Ok(Some((width, height))),
    }
}

/// Resolves image file names under the images directory.
///
/// Direct `images_dir/<file_name>` lookups come first. When enabled, a file
/// name index of the whole tree is built on the first miss and used as a
/// fallback, so records carrying a stale directory prefix still resolve.
struct PathResolver<'a> {
    images_dir: &'a Path,
    recursive: bool,
    index: Option<BTreeMap<OsString, PathBuf>>,
}

impl<'a> PathResolver<'a> {
    fn new(images_dir: &'a Path, recursive: bool) -> Self {
        Self {
            images_dir,
            recursive,
            index: None,
        }
    }

    fn resolve(&mut self, file_name: &str) -> Option<PathBuf> {
        let direct = self.images_dir.join(file_name);
        if direct.is_file() {
            return Some(direct);
        }
        if !self.recursive {
            return None;
        }

        let name = Path::new(file_name).file_name()?;
        let images_dir = self.images_dir;
        self.index
            .get_or_insert_with(|| build_file_index(images_dir))
            .get(name)
            .cloned()
    }
}

fn build_file_index(root: &Path) -> BTreeMap<OsString, PathBuf> {
    let mut index = BTreeMap::new();
    // Sorted traversal so the first of several same-named files wins deterministically.
    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::debug!("skipping unreadable entry under {}: {err}", root.display());
                None
            }
        })
    {
        if entry.file_type().is_file() {
            index
                .entry(entry.file_name().to_os_string())
                .or_insert_with(|| entry.path().to_path_buf());
        }
    }
    log::debug!("indexed {} file(s) under {}", index.len(), root.display());
    index
}
