use std::path::PathBuf;
use thiserror::Error;

/// The main error type for bsort operations.
///
/// Per-file irregularities (missing code, unmapped code, missing label) are
/// not errors; they are reported as outcomes. Everything here stops the run.
#[derive(Debug, Error)]
pub enum BsortError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IO error at {path}: {source}")]
    PathIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed while traversing directory {path}: {message}")]
    DirectoryWalk { path: PathBuf, message: String },

    #[error("Failed to parse config YAML from {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid config {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    #[error("Failed to serialize report as JSON: {0}")]
    ReportJson(#[from] serde_json::Error),

    #[error("Failed to launch detector '{program}': {source}")]
    DetectorLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Detector '{program}' exited with {status}")]
    DetectorFailed { program: String, status: String },

    #[error("Unsupported output format: {0}")]
    UnsupportedOutput(String),
}

impl BsortError {
    /// Attach a path to an IO error.
    pub(crate) fn at(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| BsortError::PathIo { path, source }
    }
}
