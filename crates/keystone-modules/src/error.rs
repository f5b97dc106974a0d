//! # Module System Errors
//!
//! Failures local to one module (bad manifest, failed unit import) are logged
//! and never surface here. `ModuleError` covers the conditions a caller has to
//! handle: unknown ids, strict dependency failures, dependency cycles, and
//! persistence or top-level scan failures.

use std::path::PathBuf;

use crate::store::StoreError;

/// Module operation result type
pub type ModuleResult<T> = Result<T, ModuleError>;

#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("Module {module_id} not found")]
    NotFound { module_id: String },

    #[error("Module {module_id} has missing dependencies: {}", missing.join(", "))]
    MissingDependencies {
        module_id: String,
        missing: Vec<String>,
    },

    #[error("Circular dependency detected: {module_id}")]
    CircularDependency { module_id: String },

    #[error("Module root for {module_id} is not accessible at {path}: {source}")]
    ModuleRootMissing {
        module_id: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to scan module directory {path}: {source}")]
    Scan {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Module store error: {0}")]
    Store(#[from] StoreError),
}

impl ModuleError {
    pub fn not_found(module_id: impl Into<String>) -> Self {
        Self::NotFound {
            module_id: module_id.into(),
        }
    }

    /// Whether the error is caused by the caller (unknown id, unmet dependency)
    /// rather than by the system.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::MissingDependencies { .. }
                | Self::CircularDependency { .. }
        )
    }
}
