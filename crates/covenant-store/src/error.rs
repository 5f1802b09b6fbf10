use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid record in {path}: {source}")]
    InvalidRecord {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("template not found: {0}")]
    TemplateNotFound(PathBuf),

    #[error("invalid document name: {0:?}")]
    InvalidStem(String),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
