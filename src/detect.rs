//! Launching the external object detector.
//!
//! Training and prediction are delegated to an external program (the
//! Ultralytics `yolo` CLI by default). This module only renders its
//! `key=value` argument list and runs it; results land wherever the detector
//! writes them (`<project>/<name>`).

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{BsortConfig, InferConfig, TrainConfig};
use crate::error::BsortError;

/// A single detector invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DetectorJob {
    Train {
        model: String,
        data: PathBuf,
        imgsz: u32,
        batch: u32,
        epochs: u32,
        project: PathBuf,
        name: String,
    },
    Predict {
        model: String,
        source: PathBuf,
        save: bool,
        project: PathBuf,
        name: String,
    },
}

impl DetectorJob {
    pub fn train(config: &TrainConfig) -> Self {
        DetectorJob::Train {
            model: config.model.clone(),
            data: config.data.clone(),
            imgsz: config.imgsz,
            batch: config.batch,
            epochs: config.epochs,
            project: config.project.clone(),
            name: config.name.clone(),
        }
    }

    pub fn predict(config: &InferConfig, source: &Path) -> Self {
        DetectorJob::Predict {
            model: config.model.clone(),
            source: source.to_path_buf(),
            save: config.save,
            project: config.project.clone(),
            name: config.name.clone(),
        }
    }

    /// Directory the detector writes its artifacts into.
    pub fn output_dir(&self) -> PathBuf {
        match self {
            DetectorJob::Train { project, name, .. } | DetectorJob::Predict { project, name, .. } => {
                project.join(name)
            }
        }
    }

    /// Command-line arguments, excluding the program itself.
    pub fn args(&self) -> Vec<String> {
        match self {
            DetectorJob::Train {
                model,
                data,
                imgsz,
                batch,
                epochs,
                project,
                name,
            } => vec![
                "detect".to_string(),
                "train".to_string(),
                format!("model={model}"),
                format!("data={}", data.display()),
                format!("imgsz={imgsz}"),
                format!("batch={batch}"),
                format!("epochs={epochs}"),
                format!("project={}", project.display()),
                format!("name={name}"),
            ],
            DetectorJob::Predict {
                model,
                source,
                save,
                project,
                name,
            } => vec![
                "detect".to_string(),
                "predict".to_string(),
                format!("model={model}"),
                format!("source={}", source.display()),
                format!("save={}", if *save { "True" } else { "False" }),
                format!("project={}", project.display()),
                format!("name={name}"),
            ],
        }
    }
}

/// A job bound to the program that runs it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectorCommand {
    pub program: String,
    pub job: DetectorJob,
}

impl DetectorCommand {
    pub fn new(config: &BsortConfig, job: DetectorJob) -> Self {
        Self {
            program: config.detector.program.clone(),
            job,
        }
    }

    /// Run the detector to completion, inheriting stdio.
    pub fn run(&self) -> Result<(), BsortError> {
        tracing::info!(command = %self, "launching detector");

        let status = Command::new(&self.program)
            .args(self.job.args())
            .status()
            .map_err(|source| BsortError::DetectorLaunch {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(BsortError::DetectorFailed {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }

        tracing::info!(output = %self.job.output_dir().display(), "detector finished");
        Ok(())
    }
}

impl fmt::Display for DetectorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in self.job.args() {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn train_args_follow_config() {
        let job = DetectorJob::train(&TrainConfig::default());
        assert_eq!(
            job.args(),
            vec![
                "detect",
                "train",
                "model=yolov8n.pt",
                "data=data.yaml",
                "imgsz=640",
                "batch=16",
                "epochs=50",
                "project=runs/bsort",
                "name=train",
            ]
        );
        assert_eq!(job.output_dir(), PathBuf::from("runs/bsort/train"));
    }

    #[test]
    fn predict_args_include_source() {
        let job = DetectorJob::predict(&InferConfig::default(), Path::new("caps/img_b2_1.jpg"));
        let args = job.args();
        assert_eq!(args[0], "detect");
        assert_eq!(args[1], "predict");
        assert!(args.contains(&"source=caps/img_b2_1.jpg".to_string()));
        assert!(args.contains(&"save=True".to_string()));
        assert_eq!(job.output_dir(), PathBuf::from("runs/bsort/predictions"));
    }

    #[test]
    fn display_renders_full_command_line() {
        let config = BsortConfig::default();
        let command = DetectorCommand::new(&config, DetectorJob::train(&config.train));
        assert!(command.to_string().starts_with("yolo detect train model=yolov8n.pt"));
    }

    #[test]
    fn missing_program_fails_to_launch() {
        let mut config = BsortConfig::default();
        config.detector.program = "bsort-no-such-detector-binary".to_string();
        let command = DetectorCommand::new(&config, DetectorJob::train(&config.train));

        let err = command.run().unwrap_err();
        assert!(matches!(err, BsortError::DetectorLaunch { .. }));
    }
}
