//! Per-file relabeling outcomes.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::code::BCode;

/// What happened to a single label file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RelabelOutcome {
    /// The file was rewritten with a new class index.
    Relabeled {
        file: String,
        class: u32,
        lines: usize,
    },
    /// The filename carries no `_b<digit>_` code.
    MissingCode { file: String },
    /// The code has no entry in the class map.
    NoMapping { file: String, code: BCode },
    /// A line had no tokens to replace; the file was left alone.
    EmptyLine { file: String, line: usize },
    /// The file name is not valid UTF-8 and cannot be matched.
    UnreadableName { file: String },
}

impl RelabelOutcome {
    pub fn is_relabeled(&self) -> bool {
        matches!(self, RelabelOutcome::Relabeled { .. })
    }
}

impl fmt::Display for RelabelOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelabelOutcome::Relabeled { file, class, .. } => {
                write!(f, "Relabeled {} → class={}", file, class)
            }
            RelabelOutcome::MissingCode { file } => write!(f, "Skip: missing b-code in {}", file),
            RelabelOutcome::NoMapping { file, code } => {
                write!(f, "Skip: no mapping for {} in {}", code, file)
            }
            RelabelOutcome::EmptyLine { file, line } => {
                write!(f, "Skip: empty label line {} in {}", line, file)
            }
            RelabelOutcome::UnreadableName { file } => {
                write!(f, "Skip: file name is not valid UTF-8: {}", file)
            }
        }
    }
}

/// The result of relabeling a directory.
#[derive(Clone, Debug, Serialize)]
pub struct RelabelReport {
    pub label_dir: PathBuf,
    pub out_dir: PathBuf,
    pub outcomes: Vec<RelabelOutcome>,
}

impl RelabelReport {
    pub fn new(label_dir: &Path, out_dir: &Path) -> Self {
        Self {
            label_dir: label_dir.to_path_buf(),
            out_dir: out_dir.to_path_buf(),
            outcomes: Vec::new(),
        }
    }

    pub fn add(&mut self, outcome: RelabelOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn relabeled_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_relabeled()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.len() - self.relabeled_count()
    }
}

impl fmt::Display for RelabelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            writeln!(f, "{}", outcome)?;
        }
        writeln!(
            f,
            "Relabeling completed: {} relabeled, {} skipped ({} -> {}).",
            self.relabeled_count(),
            self.skipped_count(),
            self.label_dir.display(),
            self.out_dir.display()
        )
    }
}
