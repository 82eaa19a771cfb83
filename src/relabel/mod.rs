//! Class-index rewriting for YOLO label files.
//!
//! The class of every box in a label file is decided by the cap group code in
//! the file's name, not by whatever the annotator wrote. [`Relabeler`] looks
//! the code up in a [`ClassMap`] and rewrites the leading token of each line,
//! leaving the geometry fields untouched.

mod report;

pub use report::{RelabelOutcome, RelabelReport};

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::code::{extract_code, BCode};
use crate::error::BsortError;
use crate::files::{list_files, LABEL_EXTENSION};

/// Code to class-index lookup table.
pub type ClassMap = BTreeMap<BCode, u32>;

/// Rewrites label files from `label_dir` into `out_dir`.
#[derive(Clone, Debug)]
pub struct Relabeler {
    label_dir: PathBuf,
    out_dir: PathBuf,
    class_map: ClassMap,
}

impl Relabeler {
    /// Creates a relabeler, creating `out_dir` if it does not exist yet.
    ///
    /// Existing contents of `out_dir` are left in place.
    pub fn new(
        label_dir: impl Into<PathBuf>,
        out_dir: impl Into<PathBuf>,
        class_map: ClassMap,
    ) -> Result<Self, BsortError> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir).map_err(BsortError::at(&out_dir))?;

        Ok(Self {
            label_dir: label_dir.into(),
            out_dir,
            class_map,
        })
    }

    /// Relabel a single file from the source directory.
    ///
    /// Nothing is written unless the outcome is [`RelabelOutcome::Relabeled`].
    pub fn relabel_file(&self, file_name: &str) -> Result<RelabelOutcome, BsortError> {
        let file = file_name.to_string();

        let Some(code) = extract_code(file_name) else {
            tracing::warn!(file = file_name, "no b-code in file name");
            return Ok(RelabelOutcome::MissingCode { file });
        };

        let Some(&class) = self.class_map.get(&code) else {
            tracing::warn!(file = file_name, %code, "b-code has no class mapping");
            return Ok(RelabelOutcome::NoMapping { file, code });
        };

        let in_path = self.label_dir.join(file_name);
        let content = fs::read_to_string(&in_path).map_err(BsortError::at(&in_path))?;

        let rewritten = match relabel_content(&content, class) {
            Ok(rewritten) => rewritten,
            Err(line) => {
                tracing::warn!(file = file_name, line, "label line has no tokens");
                return Ok(RelabelOutcome::EmptyLine { file, line });
            }
        };

        let out_path = self.out_dir.join(file_name);
        fs::write(&out_path, rewritten.text).map_err(BsortError::at(&out_path))?;
        tracing::debug!(file = file_name, class, lines = rewritten.lines, "relabeled");

        Ok(RelabelOutcome::Relabeled {
            file,
            class,
            lines: rewritten.lines,
        })
    }

    /// Relabel every label file in the source directory.
    pub fn run(&self) -> Result<RelabelReport, BsortError> {
        let listing = list_files(&self.label_dir, LABEL_EXTENSION)?;
        tracing::info!(
            dir = %self.label_dir.display(),
            files = listing.names.len(),
            "relabeling label files"
        );

        let mut report = RelabelReport::new(&self.label_dir, &self.out_dir);
        for name in &listing.names {
            report.add(self.relabel_file(name)?);
        }
        for file in listing.unreadable {
            report.add(RelabelOutcome::UnreadableName { file });
        }

        Ok(report)
    }
}

struct Rewritten {
    text: String,
    lines: usize,
}

/// Replace the class token of one label line.
///
/// Returns `None` for a line without any tokens.
pub fn relabel_line(line: &str, class: u32) -> Option<String> {
    let mut tokens = line.split_whitespace();
    tokens.next()?;

    let mut out = class.to_string();
    for token in tokens {
        out.push(' ');
        out.push_str(token);
    }
    Some(out)
}

/// Rewrite every line of a label file, or return the 1-based number of the
/// first line that has no tokens.
fn relabel_content(content: &str, class: u32) -> Result<Rewritten, usize> {
    let mut text = String::with_capacity(content.len());
    let mut lines = 0;

    for (idx, line) in content.lines().enumerate() {
        let relabeled = relabel_line(line, class).ok_or(idx + 1)?;
        text.push_str(&relabeled);
        text.push('\n');
        lines += 1;
    }

    Ok(Rewritten { text, lines })
}

/// Fuzz-only entrypoint for whole-file relabeling.
#[cfg(feature = "fuzzing")]
pub fn fuzz_relabel_content(input: &str) -> Option<usize> {
    relabel_content(input, 7).ok().map(|r| r.lines)
}
