//! YOLO label files, split manifests and `data.yaml`.
//!
//! Layout under the data directory:
//!
//! ```text
//! <data_dir>/labels/<image_stem>.txt   one "<class> <xc> <yc> <w> <h>" per line
//! <data_dir>/train.txt                 image paths, one per line
//! <data_dir>/val.txt
//! <data_dir>/data.yaml                 manifest paths, class count and names
//! ```
//!
//! Every file is rendered in memory and written through a temporary sibling
//! that is renamed into place, so an interrupted run never leaves a
//! half-written file behind. Output depends only on the inputs, so two runs
//! over the same split produce byte-identical files.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::BuildConfig;
use crate::error::CocoYoloError;

use super::transform::YoloRecord;

const LABEL_EXTENSION: &str = "txt";
pub const TRAIN_MANIFEST: &str = "train.txt";
pub const VAL_MANIFEST: &str = "val.txt";
pub const DATA_YAML: &str = "data.yaml";

/// Label records for one matched image.
#[derive(Clone, Debug)]
pub struct LabelledImage {
    pub image_path: PathBuf,
    pub records: Vec<YoloRecord>,
}

/// What [`emit_dataset`] wrote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EmitCounts {
    pub label_files: usize,
    pub records: usize,
}

#[derive(Debug, Serialize)]
struct DataYaml<'a> {
    train: String,
    val: String,
    nc: usize,
    names: &'a [String],
}

/// Writes label files for every image in `train` and `val`, both manifests,
/// and `data.yaml` under `config.data_dir`.
///
/// Label file names are checked for collisions before anything is written.
///
/// # Errors
/// Two images mapping to the same label file yield
/// [`CocoYoloError::LabelCollision`]. Any write failure aborts the run with
/// [`CocoYoloError::Write`].
pub fn emit_dataset(
    config: &BuildConfig,
    train: &[LabelledImage],
    val: &[LabelledImage],
    class_names: &[String],
) -> Result<EmitCounts, CocoYoloError> {
    let labels_dir = config.labels_dir();
    let label_paths = unique_label_paths(&labels_dir, train.iter().chain(val))?;
    create_dir(&labels_dir)?;

    let mut counts = EmitCounts::default();
    for (path, image) in label_paths.iter().zip(train.iter().chain(val)) {
        write_label_file(path, &image.records)?;
        counts.label_files += 1;
        counts.records += image.records.len();
    }

    let train_manifest = config.data_dir.join(TRAIN_MANIFEST);
    let val_manifest = config.data_dir.join(VAL_MANIFEST);
    write_manifest(&train_manifest, train.iter().map(|img| img.image_path.as_path()))?;
    write_manifest(&val_manifest, val.iter().map(|img| img.image_path.as_path()))?;
    write_data_yaml(&config.data_dir, &train_manifest, &val_manifest, class_names)?;

    log::info!(
        "wrote {} label file(s) with {} record(s) to {}",
        counts.label_files,
        counts.records,
        labels_dir.display()
    );
    Ok(counts)
}

fn unique_label_paths<'a>(
    labels_dir: &Path,
    images: impl Iterator<Item = &'a LabelledImage>,
) -> Result<Vec<PathBuf>, CocoYoloError> {
    let mut owners: HashMap<PathBuf, &Path> = HashMap::new();
    let mut paths = Vec::new();
    for image in images {
        let path = label_path(labels_dir, &image.image_path);
        if let Some(first) = owners.insert(path.clone(), image.image_path.as_path()) {
            return Err(CocoYoloError::LabelCollision {
                label: path,
                first: first.to_path_buf(),
                second: image.image_path.clone(),
            });
        }
        paths.push(path);
    }
    Ok(paths)
}

/// Label file name for an image: same stem, `.txt`.
pub fn label_file_name(image_path: &Path) -> OsString {
    let mut name = image_path
        .file_stem()
        .unwrap_or(image_path.as_os_str())
        .to_os_string();
    name.push(".");
    name.push(LABEL_EXTENSION);
    name
}

/// Label file path for an image, directly under `labels_dir`.
pub fn label_path(labels_dir: &Path, image_path: &Path) -> PathBuf {
    labels_dir.join(label_file_name(image_path))
}

/// Writes one label file, one newline-terminated record per line.
pub fn write_label_file(path: &Path, records: &[YoloRecord]) -> Result<(), CocoYoloError> {
    let mut contents = String::new();
    for record in records {
        contents.push_str(&record.to_string());
        contents.push('\n');
    }
    write_atomically(path, contents.as_bytes())
}

/// Writes a manifest listing one image path per line.
pub fn write_manifest<'a>(
    path: &Path,
    image_paths: impl IntoIterator<Item = &'a Path>,
) -> Result<(), CocoYoloError> {
    let mut contents = String::new();
    for image_path in image_paths {
        contents.push_str(&image_path.to_string_lossy());
        contents.push('\n');
    }
    write_atomically(path, contents.as_bytes())
}

fn write_data_yaml(
    data_dir: &Path,
    train_manifest: &Path,
    val_manifest: &Path,
    class_names: &[String],
) -> Result<(), CocoYoloError> {
    let path = data_dir.join(DATA_YAML);
    let data = DataYaml {
        train: display_absolute(train_manifest),
        val: display_absolute(val_manifest),
        nc: class_names.len(),
        names: class_names,
    };
    let yaml = serde_yaml::to_string(&data).map_err(|source| CocoYoloError::DataYamlWrite {
        path: path.clone(),
        source,
    })?;
    write_atomically(&path, yaml.as_bytes())
}

fn display_absolute(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .replace('\\', "/")
}

fn create_dir(path: &Path) -> Result<(), CocoYoloError> {
    fs::create_dir_all(path).map_err(|source| CocoYoloError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), CocoYoloError> {
    if let Some(parent) = path.parent() {
        create_dir(parent)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let to_write_error = |source: std::io::Error| CocoYoloError::Write {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&tmp_path, bytes).map_err(to_write_error)?;
    fs::rename(&tmp_path, path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        to_write_error(source)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::transform::YoloGeometry;

    fn record(class_index: usize, v: f64) -> YoloRecord {
        YoloRecord {
            class_index,
            geometry: YoloGeometry {
                x_center: v,
                y_center: v,
                w: v / 2.0,
                h: v / 2.0,
            },
        }
    }

    fn config_for(data_dir: &Path) -> BuildConfig {
        BuildConfig::new(data_dir, data_dir)
    }

    fn labelled(path: &str, records: Vec<YoloRecord>) -> LabelledImage {
        LabelledImage {
            image_path: PathBuf::from(path),
            records,
        }
    }

    #[test]
    fn label_path_keeps_stem_and_flattens_directories() {
        let labels = Path::new("/data/labels");
        assert_eq!(
            label_path(labels, Path::new("/images/2022/frame_01.jpg")),
            PathBuf::from("/data/labels/frame_01.txt")
        );
        assert_eq!(
            label_path(labels, Path::new("shot.v2.png")),
            PathBuf::from("/data/labels/shot.v2.txt")
        );
    }

    #[test]
    fn writes_labels_manifests_and_data_yaml() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let train = vec![labelled("/imgs/a.jpg", vec![record(0, 0.5), record(2, 0.25)])];
        let val = vec![labelled("/imgs/b.jpg", vec![record(1, 0.4)])];
        let names = vec!["bottle".to_string(), "can".to_string(), "bag".to_string()];

        let counts = emit_dataset(&config_for(temp.path()), &train, &val, &names).expect("emit");
        assert_eq!(
            counts,
            EmitCounts {
                label_files: 2,
                records: 3
            }
        );

        let label_a = fs::read_to_string(temp.path().join("labels/a.txt")).expect("read a");
        assert_eq!(
            label_a,
            "0 0.500000 0.500000 0.250000 0.250000\n2 0.250000 0.250000 0.125000 0.125000\n"
        );
        let train_txt = fs::read_to_string(temp.path().join("train.txt")).expect("read train");
        assert_eq!(train_txt, "/imgs/a.jpg\n");
        let val_txt = fs::read_to_string(temp.path().join("val.txt")).expect("read val");
        assert_eq!(val_txt, "/imgs/b.jpg\n");

        let yaml = fs::read_to_string(temp.path().join("data.yaml")).expect("read yaml");
        assert!(yaml.contains("nc: 3"));
        assert!(yaml.contains("- bottle"));
        assert!(yaml.contains("train.txt"));

        let leftovers: Vec<_> = fs::read_dir(temp.path().join("labels"))
            .expect("list labels")
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn emitting_twice_is_byte_identical() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let train = vec![labelled("/imgs/a.jpg", vec![record(0, 0.3)])];
        let val = vec![labelled("/imgs/b.jpg", vec![])];
        let names = vec!["class_0".to_string()];

        let outputs = ["labels/a.txt", "labels/b.txt", "train.txt", "val.txt", "data.yaml"];
        let snapshot = |name: &str| fs::read(temp.path().join(name)).expect("read output");

        emit_dataset(&config_for(temp.path()), &train, &val, &names).expect("first emit");
        let before: Vec<Vec<u8>> = outputs.iter().map(|name| snapshot(*name)).collect();

        emit_dataset(&config_for(temp.path()), &train, &val, &names).expect("second emit");
        let after: Vec<Vec<u8>> = outputs.iter().map(|name| snapshot(*name)).collect();
        assert_eq!(before, after);
        assert!(snapshot("labels/b.txt").is_empty());
    }

    #[test]
    fn unwritable_destination_is_a_write_error() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, b"file, not a directory").expect("write blocker");

        let err = emit_dataset(&config_for(&blocker), &[], &[], &[]).unwrap_err();
        assert!(matches!(err, CocoYoloError::Write { .. }));
    }

    #[test]
    fn same_stem_in_different_directories_is_rejected_before_writing() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let train = vec![labelled("/imgs/day1/a.bmp", vec![record(0, 0.3)])];
        let val = vec![labelled("/imgs/day2/a.bmp", vec![record(4, 0.7)])];

        let err = emit_dataset(&config_for(temp.path()), &train, &val, &[]).unwrap_err();
        match err {
            CocoYoloError::LabelCollision {
                label,
                first,
                second,
            } => {
                assert_eq!(label, temp.path().join("labels/a.txt"));
                assert_eq!(first, PathBuf::from("/imgs/day1/a.bmp"));
                assert_eq!(second, PathBuf::from("/imgs/day2/a.bmp"));
            }
            other => panic!("expected LabelCollision, got {other:?}"),
        }
        assert!(!temp.path().join("labels").exists());
        assert!(!temp.path().join("train.txt").exists());
    }
}
