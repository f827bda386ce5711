//! Local filesystem backend.

use super::Document;
use crate::AppError;
use std::path::{Component, Path, PathBuf};

/// Reads and overwrites documents under a project root.
///
/// There is no locking: two saves of the same document race as
/// read-modify-write and the later write wins.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read the current document at `path`.
    ///
    /// # Returns
    /// The file text, versioned by its blake3 digest.
    ///
    /// # Errors
    /// Returns [`AppError::InvalidPath`] for paths escaping the root, or
    /// [`AppError::Persistence`] when the file cannot be read.
    pub async fn load(&self, path: &str) -> Result<Document, AppError> {
        let full_path = self.resolve(path)?;
        let text = tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|err| AppError::Persistence {
                path: path.to_string(),
                message: err.to_string(),
            })?;
        let version = blake3::hash(text.as_bytes()).to_hex().to_string();
        Ok(Document {
            path: path.to_string(),
            text,
            version: Some(version),
        })
    }

    /// Overwrite the document at `path` with `text`.
    ///
    /// # Errors
    /// Returns [`AppError::InvalidPath`] for paths escaping the root, or
    /// [`AppError::Persistence`] when the write fails.
    pub async fn save(&self, path: &str, text: &str) -> Result<(), AppError> {
        let full_path = self.resolve(path)?;
        tokio::fs::write(&full_path, text)
            .await
            .map_err(|err| AppError::Persistence {
                path: path.to_string(),
                message: err.to_string(),
            })?;
        tracing::info!("Wrote {} ({} bytes)", full_path.display(), text.len());
        Ok(())
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, AppError> {
        Ok(self.root.join(validate_relative_path(path)?))
    }
}

/// Accept only plain relative paths (no root, prefix or `..` components).
///
/// # Errors
/// Returns [`AppError::InvalidPath`] otherwise.
pub(crate) fn validate_relative_path(path: &str) -> Result<&Path, AppError> {
    let candidate = Path::new(path);
    let plain = !path.trim().is_empty()
        && candidate
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if plain {
        Ok(candidate)
    } else {
        Err(AppError::InvalidPath(path.to_string()))
    }
}
