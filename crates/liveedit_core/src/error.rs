//! Application error types for slot patching and persistence.
use thiserror::Error;

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Marker {marker} not found in {path}")]
    MarkerNotFound { marker: String, path: String },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    #[error("Storage error for {path}: {message}")]
    Persistence { path: String, message: String },

    #[error("GitHub sync failed: {0}")]
    Remote(String),

    #[error("{}", missing_configuration_message(.0))]
    ConfigurationMissing(Vec<&'static str>),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn missing_configuration_message(vars: &[&'static str]) -> String {
    let verb = if vars.len() == 1 { "is" } else { "are" };
    format!(
        "Remote persistence is not configured. Please ensure {} {} set.",
        vars.join(" and "),
        verb
    )
}

/// Coarse error class used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    MarkerNotFound,
    InvalidInput,
    Persistence,
    Remote,
    ConfigurationMissing,
}

impl AppError {
    /// Classify this error for transport mapping.
    ///
    /// # Returns
    /// The [`ErrorClass`] bucket this error belongs to.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::MarkerNotFound { .. } => ErrorClass::MarkerNotFound,
            Self::InvalidValue(_) | Self::InvalidPath(_) => ErrorClass::InvalidInput,
            Self::Persistence { .. } | Self::Io(_) => ErrorClass::Persistence,
            Self::Remote(_) => ErrorClass::Remote,
            Self::ConfigurationMissing(_) => ErrorClass::ConfigurationMissing,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        Self::Remote(value.to_string())
    }
}
