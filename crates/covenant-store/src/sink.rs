//! Destinations for rendered documents.
//!
//! Converting a document into a binary format (PDF and the like) is a
//! separate step behind the same trait; this crate only ships the Markdown
//! writer.

use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::StoreError;

/// Accepts finished text under a file stem and reports where it went.
pub trait ArtifactSink {
    fn write(&self, stem: &str, text: &str) -> Result<PathBuf, StoreError>;
}

/// Replace path separators in a stem built from record data, so the result
/// names a single file.
pub fn sanitize_stem(raw: &str) -> String {
    raw.chars()
        .map(|c| if matches!(c, '/' | '\\') || c.is_control() { '_' } else { c })
        .collect()
}

/// A stem must be one plain path component: no separators, no `.`/`..`.
fn check_stem(stem: &str) -> Result<(), StoreError> {
    let invalid = || StoreError::InvalidStem(stem.to_string());
    if stem.is_empty() || stem.contains(['/', '\\']) {
        return Err(invalid());
    }
    let mut components = Path::new(stem).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid()),
    }
}

/// Writes `<dir>/<stem>.md`, creating `dir` on first write.
#[derive(Debug, Clone)]
pub struct MarkdownSink {
    dir: PathBuf,
}

impl MarkdownSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ArtifactSink for MarkdownSink {
    fn write(&self, stem: &str, text: &str) -> Result<PathBuf, StoreError> {
        check_stem(stem)?;
        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Write {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.dir.join(format!("{stem}.md"));
        std::fs::write(&path, text).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), bytes = text.len(), "wrote document");
        Ok(path)
    }
}
