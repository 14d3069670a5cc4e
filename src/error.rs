//! Error types for loading and exporting dashboard data.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading source files or writing exports.
///
/// None of these abort the pipeline on their own: per-file failures are
/// logged and the file is skipped. They surface to the user only when an
/// output cannot be written.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Workbook could not be opened or has no readable worksheet.
    #[error("failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Sheet has fewer than the title and header rows.
    #[error("sheet has no header row: {path}")]
    EmptySheet { path: PathBuf },

    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl DashboardError {
    /// Map an I/O error on `path`, singling out a missing file.
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound { path }
        } else {
            Self::FileRead { path, source: err }
        }
    }

    /// True for the "source missing" case that callers degrade on.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::FileNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
