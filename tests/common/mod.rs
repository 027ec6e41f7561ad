#![allow(dead_code)]

use std::fs;
use std::path::Path;

use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// BMP header (file + info header) declaring `width` x `height`.
///
/// Size probes only read the header, so large test images can be written
/// without their pixel array.
pub fn bmp_header(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(54);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_header(width, height)).expect("write bmp file");
}

/// Writes `bboxes.csv` and `images.csv` into `dir`.
pub fn write_csv_pair(dir: &Path, bbox_rows: &[&str], image_rows: &[&str]) {
    fs::create_dir_all(dir).expect("create csv dir");

    let mut bboxes = String::from("id,image_id,category_id,x,y,w,h\n");
    for row in bbox_rows {
        bboxes.push_str(row);
        bboxes.push('\n');
    }
    let mut images = String::from("id,filename,width,height,date\n");
    for row in image_rows {
        images.push_str(row);
        images.push('\n');
    }

    fs::write(dir.join("bboxes.csv"), bboxes).expect("write bboxes.csv");
    fs::write(dir.join("images.csv"), images).expect("write images.csv");
}

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}
