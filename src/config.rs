//! YAML configuration.
//!
//! One file drives every subcommand. All sections are optional; missing
//! sections and keys fall back to the project's conventional `data/` layout.
//! Relative paths are taken relative to the working directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::BsortError;
use crate::relabel::ClassMap;
use crate::split::{SplitPaths, SplitPolicy};

/// Top-level configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BsortConfig {
    pub relabel: RelabelConfig,
    pub split: SplitConfig,
    pub train: TrainConfig,
    pub infer: InferConfig,
    pub detector: DetectorConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelabelConfig {
    pub label_dir: PathBuf,
    pub out_dir: PathBuf,
    /// `b<digit>` code to class index.
    pub class_map: ClassMap,
}

impl Default for RelabelConfig {
    fn default() -> Self {
        let class_map = [("b2", 2), ("b3", 2), ("b4", 0), ("b5", 1)]
            .into_iter()
            .filter_map(|(code, class)| Some((code.parse().ok()?, class)))
            .collect();

        Self {
            label_dir: PathBuf::from("data/labels_raw"),
            out_dir: PathBuf::from("data/relabels"),
            class_map,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub image_dir: PathBuf,
    pub label_dir: PathBuf,
    pub train_images: PathBuf,
    pub val_images: PathBuf,
    pub train_labels: PathBuf,
    pub val_labels: PathBuf,
    pub train_per_bucket: usize,
    pub expected_per_bucket: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        let policy = SplitPolicy::default();
        Self {
            image_dir: PathBuf::from("data/images_raw"),
            label_dir: PathBuf::from("data/relabels"),
            train_images: PathBuf::from("data/images/train"),
            val_images: PathBuf::from("data/images/val"),
            train_labels: PathBuf::from("data/labels/train"),
            val_labels: PathBuf::from("data/labels/val"),
            train_per_bucket: policy.train_per_bucket,
            expected_per_bucket: policy.expected_per_bucket,
        }
    }
}

impl SplitConfig {
    pub fn paths(&self) -> SplitPaths {
        SplitPaths {
            image_dir: self.image_dir.clone(),
            label_dir: self.label_dir.clone(),
            train_images: self.train_images.clone(),
            val_images: self.val_images.clone(),
            train_labels: self.train_labels.clone(),
            val_labels: self.val_labels.clone(),
        }
    }

    pub fn policy(&self) -> SplitPolicy {
        SplitPolicy {
            train_per_bucket: self.train_per_bucket,
            expected_per_bucket: self.expected_per_bucket,
        }
    }
}

/// Detector training options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub model: String,
    /// Dataset description consumed by the detector (its `data.yaml`).
    pub data: PathBuf,
    pub imgsz: u32,
    pub batch: u32,
    pub epochs: u32,
    pub project: PathBuf,
    pub name: String,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model: "yolov8n.pt".to_string(),
            data: PathBuf::from("data.yaml"),
            imgsz: 640,
            batch: 16,
            epochs: 50,
            project: PathBuf::from("runs/bsort"),
            name: "train".to_string(),
        }
    }
}

/// Detector prediction options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferConfig {
    pub model: String,
    pub project: PathBuf,
    pub name: String,
    pub save: bool,
}

impl Default for InferConfig {
    fn default() -> Self {
        Self {
            model: "runs/bsort/train/weights/best.pt".to_string(),
            project: PathBuf::from("runs/bsort"),
            name: "predictions".to_string(),
            save: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Executable invoked for training and prediction.
    pub program: String,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            program: "yolo".to_string(),
        }
    }
}

/// Parse configuration from a YAML string.
///
/// `path` is only used for error messages.
pub fn parse_config(yaml: &str, path: &Path) -> Result<BsortConfig, BsortError> {
    // An empty document means "all defaults".
    if yaml.trim().is_empty() {
        return Ok(BsortConfig::default());
    }

    let config: BsortConfig =
        serde_yaml::from_str(yaml).map_err(|source| BsortError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

    validate_config(&config, path)?;
    Ok(config)
}

/// Read and validate a configuration file.
pub fn load_config(path: &Path) -> Result<BsortConfig, BsortError> {
    let data = fs::read_to_string(path).map_err(BsortError::at(path))?;
    let config = parse_config(&data, path)?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn validate_config(config: &BsortConfig, path: &Path) -> Result<(), BsortError> {
    let invalid = |message: String| BsortError::ConfigInvalid {
        path: path.to_path_buf(),
        message,
    };

    let split = &config.split;
    if split.train_per_bucket == 0 {
        return Err(invalid("split.train_per_bucket must be at least 1".into()));
    }
    if split.train_per_bucket > split.expected_per_bucket {
        return Err(invalid(format!(
            "split.train_per_bucket ({}) exceeds split.expected_per_bucket ({})",
            split.train_per_bucket, split.expected_per_bucket
        )));
    }

    let train = &config.train;
    for (key, value) in [
        ("imgsz", train.imgsz),
        ("batch", train.batch),
        ("epochs", train.epochs),
    ] {
        if value == 0 {
            return Err(invalid(format!("train.{key} must be greater than 0")));
        }
    }

    if config.detector.program.trim().is_empty() {
        return Err(invalid("detector.program must not be empty".into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::BCode;

    fn code(raw: &str) -> BCode {
        raw.parse().expect("valid code")
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = parse_config("", Path::new("bsort.yaml")).expect("parse");
        assert_eq!(config, BsortConfig::default());
        assert_eq!(config.relabel.class_map.get(&code("b4")), Some(&0));
        assert_eq!(config.relabel.class_map.get(&code("b5")), Some(&1));
        assert_eq!(config.split.policy(), SplitPolicy::default());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let yaml = "\
relabel:
  class_map:
    b2: 7
split:
  image_dir: /data/raw
train:
  epochs: 5
";
        let config = parse_config(yaml, Path::new("bsort.yaml")).expect("parse");

        assert_eq!(config.relabel.class_map.len(), 1);
        assert_eq!(config.relabel.class_map.get(&code("b2")), Some(&7));
        assert_eq!(config.relabel.out_dir, PathBuf::from("data/relabels"));
        assert_eq!(config.split.paths().image_dir, PathBuf::from("/data/raw"));
        assert_eq!(config.split.train_images, PathBuf::from("data/images/train"));
        assert_eq!(config.train.epochs, 5);
        assert_eq!(config.train.imgsz, 640);
        assert_eq!(config.detector.program, "yolo");
    }

    #[test]
    fn invalid_class_map_key_is_a_parse_error() {
        let yaml = "relabel:\n  class_map:\n    blue: 1\n";
        let err = parse_config(yaml, Path::new("bsort.yaml")).unwrap_err();
        assert!(matches!(err, BsortError::ConfigParse { .. }));
    }

    #[test]
    fn train_count_above_expected_is_rejected() {
        let yaml = "split:\n  train_per_bucket: 4\n  expected_per_bucket: 3\n";
        let err = parse_config(yaml, Path::new("bsort.yaml")).unwrap_err();
        assert!(matches!(err, BsortError::ConfigInvalid { .. }));
        assert!(err.to_string().contains("train_per_bucket"));
    }

    #[test]
    fn zero_epochs_is_rejected() {
        let yaml = "train:\n  epochs: 0\n";
        let err = parse_config(yaml, Path::new("bsort.yaml")).unwrap_err();
        assert!(err.to_string().contains("train.epochs"));
    }

    #[test]
    fn load_config_reports_missing_file() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let err = load_config(&temp.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, BsortError::PathIo { .. }));
    }
}
