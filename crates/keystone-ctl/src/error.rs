//! Command errors.

use keystone_modules::{ManifestError, ModuleError};
use keystone_server::ConfigError;

pub(crate) type CtlResult<T> = Result<T, CtlError>;

#[derive(Debug, thiserror::Error)]
pub(crate) enum CtlError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Module(#[from] ModuleError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Manifest validation failed with {0} error(s)")]
    Validation(usize),

    #[error("Failed to sign token: {0}")]
    Token(String),
}
