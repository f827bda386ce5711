//! Persistence dispatch between the local filesystem and GitHub.
//!
//! The backend is chosen once from [`Config`]: the hosted flag selects
//! GitHub, otherwise documents live under the local project root. Exactly one
//! backend serves every request.

mod github;
mod local;

pub use github::{CommitInfo, GitHubStore};
pub use local::LocalStore;

use crate::constants::REMOTE_SUCCESS_MESSAGE;
use crate::{AppError, Config};

/// One source file as read from durable storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Project-relative path.
    pub path: String,
    pub text: String,
    /// Backend version id: GitHub blob sha, or blake3 digest for local files.
    pub version: Option<String>,
}

/// Which backend a [`Persistence`] dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Remote,
}

/// Backend selected for this process.
#[derive(Debug, Clone)]
pub enum Persistence {
    Local(LocalStore),
    Remote(GitHubStore),
    /// Hosted, but credentials are missing; every request fails.
    Unconfigured { missing: Vec<&'static str> },
}

/// What a successful save reports back to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    pub backend: BackendKind,
    pub message: Option<String>,
}

impl Persistence {
    /// Select the backend for `config`.
    ///
    /// # Errors
    /// Returns [`AppError::Remote`] when hosted credentials are present but
    /// malformed. Missing credentials do not fail here; they yield
    /// [`Persistence::Unconfigured`] so each request reports them.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        if !config.hosted {
            return Ok(Self::Local(LocalStore::new(config.project_root.clone())));
        }
        match GitHubStore::from_config(&config.github) {
            Ok(store) => Ok(Self::Remote(store)),
            Err(AppError::ConfigurationMissing(missing)) => {
                tracing::warn!(
                    "Hosted mode without GitHub credentials; saves will fail until {} set",
                    missing.join(" and ")
                );
                Ok(Self::Unconfigured { missing })
            }
            Err(err) => Err(err),
        }
    }

    /// Kind of backend this dispatcher uses.
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Local(_) => BackendKind::Local,
            Self::Remote(_) | Self::Unconfigured { .. } => BackendKind::Remote,
        }
    }

    /// Read the latest version of `path`.
    ///
    /// # Errors
    /// Propagates backend failures; [`AppError::ConfigurationMissing`] when
    /// unconfigured.
    pub async fn load(&self, path: &str) -> Result<Document, AppError> {
        match self {
            Self::Local(store) => store.load(path).await,
            Self::Remote(store) => store.load(path).await,
            Self::Unconfigured { missing } => Err(AppError::ConfigurationMissing(missing.clone())),
        }
    }

    /// Persist `text` as the new content of `document`.
    ///
    /// # Arguments
    /// - `document`: The document as loaded; its version guards remote commits.
    /// - `text`: Full new content.
    /// - `commit_message`: Used as the commit message by the remote backend.
    ///
    /// # Errors
    /// Propagates backend failures; [`AppError::ConfigurationMissing`] when
    /// unconfigured.
    pub async fn save(
        &self,
        document: &Document,
        text: &str,
        commit_message: &str,
    ) -> Result<SaveReceipt, AppError> {
        match self {
            Self::Local(store) => {
                store.save(&document.path, text).await?;
                Ok(SaveReceipt {
                    backend: BackendKind::Local,
                    message: None,
                })
            }
            Self::Remote(store) => {
                store
                    .save(
                        &document.path,
                        text,
                        document.version.as_deref(),
                        commit_message,
                    )
                    .await?;
                Ok(SaveReceipt {
                    backend: BackendKind::Remote,
                    message: Some(REMOTE_SUCCESS_MESSAGE.to_string()),
                })
            }
            Self::Unconfigured { missing } => Err(AppError::ConfigurationMissing(missing.clone())),
        }
    }
}
