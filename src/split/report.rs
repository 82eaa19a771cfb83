//! Split events and the end-of-run summary.

use std::fmt;

use serde::Serialize;

use super::SplitPaths;
use crate::code::{BCode, Category};

/// Which side of the split a file was assigned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Train,
    Val,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Train => f.write_str("train"),
            Side::Val => f.write_str("val"),
        }
    }
}

/// Something that happened to a file or bucket during a split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SplitEvent {
    /// The image name carries no `_b<digit>_` code.
    MissingCode { file: String },
    /// The image name is not valid UTF-8 and cannot be matched.
    UnreadableName { file: String },
    /// The code does not belong to any category.
    UnknownCode { file: String, code: BCode },
    /// A bucket held a different number of files than expected.
    CountMismatch {
        category: Category,
        expected: usize,
        found: usize,
    },
    /// The image's label was absent; neither file was copied.
    MissingLabel { file: String, side: Side },
    /// Label and image were both copied.
    Copied {
        file: String,
        category: Category,
        side: Side,
    },
}

impl SplitEvent {
    /// Whether this event is worth showing to the user.
    pub fn is_diagnostic(&self) -> bool {
        !matches!(self, SplitEvent::Copied { .. })
    }
}

impl fmt::Display for SplitEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitEvent::MissingCode { file } => {
                write!(f, "Skip {}: missing b-code pattern.", file)
            }
            SplitEvent::UnreadableName { file } => {
                write!(f, "Skip {}: file name is not valid UTF-8.", file)
            }
            SplitEvent::UnknownCode { file, .. } => write!(f, "Unknown b-code in: {}", file),
            SplitEvent::CountMismatch {
                category,
                expected,
                found,
            } => write!(
                f,
                "Warning: {} expected {} files, got {}",
                category, expected, found
            ),
            SplitEvent::MissingLabel { file, .. } => {
                write!(f, "Missing label for {}, skipping", file)
            }
            SplitEvent::Copied {
                file,
                category,
                side,
            } => write!(f, "Copied {} ({}) to {}", file, category, side),
        }
    }
}

/// The result of a split.
#[derive(Clone, Debug, Serialize)]
pub struct SplitReport {
    pub paths: SplitPaths,
    pub events: Vec<SplitEvent>,
    /// Set by a full clean/categorize/split run.
    pub completed: bool,
}

impl SplitReport {
    pub fn new(paths: SplitPaths) -> Self {
        Self {
            paths,
            events: Vec::new(),
            completed: false,
        }
    }

    pub fn add(&mut self, event: SplitEvent) {
        self.events.push(event);
    }

    /// Number of image/label pairs copied to `side`.
    pub fn copied_count(&self, side: Side) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SplitEvent::Copied { side: s, .. } if *s == side))
            .count()
    }

    /// Names of the images copied to `side`, in copy order.
    pub fn copied_files(&self, side: Side) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SplitEvent::Copied { file, side: s, .. } if *s == side => Some(file.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn warning_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SplitEvent::CountMismatch { .. }))
            .count()
    }

    /// Files dropped before or during copying.
    pub fn skipped_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    SplitEvent::MissingCode { .. }
                        | SplitEvent::UnreadableName { .. }
                        | SplitEvent::UnknownCode { .. }
                        | SplitEvent::MissingLabel { .. }
                )
            })
            .count()
    }
}

impl fmt::Display for SplitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in self.events.iter().filter(|e| e.is_diagnostic()) {
            writeln!(f, "{}", event)?;
        }

        if !self.completed {
            return writeln!(
                f,
                "Stratified split completed: {} train, {} val.",
                self.copied_count(Side::Train),
                self.copied_count(Side::Val)
            );
        }

        let train = self.copied_count(Side::Train);
        let val = self.copied_count(Side::Val);

        writeln!(f)?;
        writeln!(f, "Dataset Split Completed Successfully!")?;
        writeln!(
            f,
            "  Training Images   : {} ({} files)",
            self.paths.train_images.display(),
            train
        )?;
        writeln!(
            f,
            "  Validation Images : {} ({} files)",
            self.paths.val_images.display(),
            val
        )?;
        writeln!(
            f,
            "  Training Labels   : {} ({} files)",
            self.paths.train_labels.display(),
            train
        )?;
        writeln!(
            f,
            "  Validation Labels : {} ({} files)",
            self.paths.val_labels.display(),
            val
        )?;

        if self.warning_count() > 0 || self.skipped_count() > 0 {
            writeln!(
                f,
                "  {} warning(s), {} file(s) skipped",
                self.warning_count(),
                self.skipped_count()
            )?;
        }

        Ok(())
    }
}
