//! cocoyolo: build YOLO training sets from COCO-style annotations.
//!
//! Bounding boxes stored as absolute pixel `[x, y, w, h]` records are joined
//! to their image files, rescaled to a canonical image height, normalized to
//! center-based YOLO boxes, split into train and validation sets, and written
//! out as label files plus manifests.
//!
//! # Modules
//!
//! - [`records`]: typed records and the readers that produce them
//! - [`convert`]: matching, rescaling, splitting and emission
//! - [`config`]: the explicit configuration every stage receives
//! - [`error`]: error types for cocoyolo operations

pub mod config;
pub mod convert;
pub mod error;
pub mod records;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use config::{BuildConfig, DEFAULT_SPLIT_RATIO, DEFAULT_TARGET_HEIGHT};
use convert::SplitStrategy;
pub use error::CocoYoloError;
use records::{CocoJsonSource, CsvPairSource, RecordSource};

/// The cocoyolo CLI application.
#[derive(Debug, Parser)]
#[command(name = "cocoyolo")]
#[command(version, about)]
struct Cli {
    /// Main data folder; labels, manifests and data.yaml are written here.
    #[arg(long)]
    data_dir: PathBuf,

    /// Folder holding the images [default: <DATA_DIR>/images].
    #[arg(long)]
    images_dir: Option<PathBuf>,

    /// Password for the annotation database.
    #[arg(long, env = "COCOYOLO_DB_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Bounding-box CSV, relative to the data folder unless absolute.
    #[arg(long)]
    bbox_filename: Option<PathBuf>,

    /// Image CSV, relative to the data folder unless absolute.
    #[arg(long)]
    images_filename: Option<PathBuf>,

    /// COCO instances JSON, relative to the data folder unless absolute.
    #[arg(long, conflicts_with_all = ["bbox_filename", "images_filename"])]
    coco_file: Option<PathBuf>,

    /// Fraction of matched images assigned to the training split.
    #[arg(long, default_value_t = DEFAULT_SPLIT_RATIO, value_parser = parse_split)]
    split: f64,

    /// Stop after this many matched images (0 = no limit).
    #[arg(long, default_value_t = 0)]
    limit_data: usize,

    /// Shuffle before splitting, with this seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Canonical image height the labels are computed for.
    #[arg(long, default_value_t = DEFAULT_TARGET_HEIGHT)]
    target_height: u32,

    /// Fail on YOLO records outside [0, 1] instead of warning.
    #[arg(long)]
    strict: bool,

    /// Only resolve images at exactly <IMAGES_DIR>/<file name>.
    #[arg(long)]
    exact_paths: bool,

    /// Output format for the final summary.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

fn parse_split(raw: &str) -> Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(value) if value > 0.0 && value < 1.0 => Ok(value),
        _ => Err(format!("split must be a number in (0, 1), got '{raw}'")),
    }
}

/// Run the cocoyolo CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), CocoYoloError> {
    run_cli(Cli::parse())
}

fn run_cli(cli: Cli) -> Result<(), CocoYoloError> {
    let config = build_config(&cli);
    config.validate()?;
    let source = select_source(&cli, &config)?;

    let report = convert::build_dataset(source.as_ref(), &config)?;

    match cli.report {
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(CocoYoloError::ReportJson)?;
            println!("{json}");
        }
        ReportFormat::Text => print!("{report}"),
    }
    Ok(())
}

fn build_config(cli: &Cli) -> BuildConfig {
    let images_dir = cli
        .images_dir
        .clone()
        .unwrap_or_else(|| cli.data_dir.join("images"));
    let split_strategy = match cli.seed {
        Some(seed) => SplitStrategy::Shuffled { seed },
        None => SplitStrategy::Sequential,
    };

    BuildConfig::new(&cli.data_dir, images_dir)
        .with_split_ratio(cli.split)
        .with_limit(cli.limit_data)
        .with_target_height(cli.target_height)
        .with_split_strategy(split_strategy)
        .with_strict(cli.strict)
        .with_recursive_lookup(!cli.exact_paths)
}

/// Picks the record source: CSV pair, then COCO file, then database.
fn select_source(
    cli: &Cli,
    config: &BuildConfig,
) -> Result<Box<dyn RecordSource>, CocoYoloError> {
    match (&cli.bbox_filename, &cli.images_filename) {
        (Some(bbox), Some(images)) => {
            return Ok(Box::new(CsvPairSource {
                bbox_path: config.resolve_in_data_dir(bbox),
                images_path: config.resolve_in_data_dir(images),
            }));
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(CocoYoloError::Configuration(
                "--bbox-filename and --images-filename must be given together".to_string(),
            ));
        }
        (None, None) => {}
    }

    if let Some(coco_file) = &cli.coco_file {
        return Ok(Box::new(CocoJsonSource {
            path: config.resolve_in_data_dir(coco_file),
        }));
    }

    if cli.password.is_some() {
        return Err(CocoYoloError::Configuration(
            "reading annotations from the database is not supported by this binary; \
             export the bounding-box and image tables to CSV and pass \
             --bbox-filename/--images-filename"
                .to_string(),
        ));
    }

    eprintln!("Run 'cocoyolo --help' for usage information.");
    Err(CocoYoloError::Configuration(
        "either a password must be set, or bbox and images filenames".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["cocoyolo", "--data-dir", "/srv/data"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).expect("parse args")
    }

    #[test]
    fn defaults_follow_canonical_parameters() {
        let parsed = cli(&["--coco-file", "instances.json"]);
        let config = build_config(&parsed);
        assert_eq!(config.split_ratio, 0.85);
        assert_eq!(config.limit, 0);
        assert_eq!(config.target_height, 1080);
        assert_eq!(config.images_dir, PathBuf::from("/srv/data/images"));
        assert_eq!(config.split_strategy, SplitStrategy::Sequential);
        assert!(config.recursive_lookup);
    }

    #[test]
    fn seed_switches_to_shuffled_split() {
        let parsed = cli(&["--coco-file", "c.json", "--seed", "42", "--exact-paths"]);
        let config = build_config(&parsed);
        assert_eq!(config.split_strategy, SplitStrategy::Shuffled { seed: 42 });
        assert!(!config.recursive_lookup);
    }

    #[test]
    fn csv_pair_is_resolved_under_data_dir() {
        let parsed = cli(&["--bbox-filename", "bboxes.csv", "--images-filename", "images.csv"]);
        let config = build_config(&parsed);
        let source = select_source(&parsed, &config).expect("select source");
        assert_eq!(
            source.describe(),
            "CSV pair (/srv/data/bboxes.csv, /srv/data/images.csv)"
        );
    }

    #[test]
    fn half_a_csv_pair_is_a_configuration_error() {
        let parsed = cli(&["--bbox-filename", "bboxes.csv"]);
        let config = build_config(&parsed);
        assert!(matches!(
            select_source(&parsed, &config),
            Err(CocoYoloError::Configuration(_))
        ));
    }

    #[test]
    fn missing_source_is_a_configuration_error() {
        let parsed = Cli::try_parse_from(["cocoyolo", "--data-dir", "/srv/data"]).expect("parse");
        if parsed.password.is_some() {
            // COCOYOLO_DB_PASSWORD is set in this environment.
            return;
        }
        let config = build_config(&parsed);
        let err = select_source(&parsed, &config).err().expect("no source");
        assert!(err.to_string().contains("either a password must be set"));
    }

    #[test]
    fn split_outside_unit_interval_is_rejected_by_parser() {
        for bad in ["0", "1", "1.5", "-0.1", "abc"] {
            let result =
                Cli::try_parse_from(["cocoyolo", "--data-dir", "d", "--split", bad]);
            assert!(result.is_err(), "split {bad} should be rejected");
        }
    }

    #[test]
    fn coco_file_conflicts_with_csv_pair() {
        let result = Cli::try_parse_from([
            "cocoyolo",
            "--data-dir",
            "d",
            "--coco-file",
            "c.json",
            "--bbox-filename",
            "b.csv",
        ]);
        assert!(result.is_err());
    }
}
