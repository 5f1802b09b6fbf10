//! JSON record loading and template lookup.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use covenant_core::{NDA_TEMPLATE, TemplateName};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::StoreError;

/// Read a JSON file into an untyped value, for validation.
pub fn load_value(path: &Path) -> Result<Value, StoreError> {
    let text = read_text(path, StoreError::NotFound)?;
    let value = serde_json::from_str(&text).map_err(|source| StoreError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "loaded record");
    Ok(value)
}

/// Convert an already-loaded value into a typed record.
///
/// `path` is only used for error reporting. The JSON itself already parsed,
/// so a missing required field or a wrong-typed value is reported as
/// [`StoreError::InvalidRecord`].
pub fn decode<T: DeserializeOwned>(path: &Path, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|source| StoreError::InvalidRecord {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and decode a typed record in one step.
pub fn load_record<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let value = load_value(path)?;
    decode(path, value)
}

fn read_text(path: &Path, not_found: fn(PathBuf) -> StoreError) -> Result<String, StoreError> {
    std::fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => not_found(path.to_path_buf()),
        _ => StoreError::Read {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Template bodies read from a single directory.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load the body of the given contract template.
    pub fn contract(&self, name: TemplateName) -> Result<String, StoreError> {
        self.load(name.file_name())
    }

    /// Load the body of the NDA template.
    pub fn nda(&self) -> Result<String, StoreError> {
        self.load(NDA_TEMPLATE)
    }

    fn load(&self, file_name: &str) -> Result<String, StoreError> {
        let path = self.dir.join(file_name);
        let body = read_text(&path, StoreError::TemplateNotFound)?;
        info!(template = file_name, bytes = body.len(), "loaded template");
        Ok(body)
    }
}
