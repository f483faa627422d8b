use std::path::PathBuf;

use thiserror::Error;

use panel_model::PanelError;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("invalid intensity value '{value}' at row {row}, column {column} of {path}")]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: usize,
        value: String,
    },

    #[error("inconsistent table shapes: {0}")]
    Shape(String),

    #[error(transparent)]
    Model(#[from] PanelError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;
