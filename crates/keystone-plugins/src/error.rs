//! Plugin registry errors.

pub type PluginResult<T> = Result<T, PluginError>;

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("Failed to fetch enabled modules: {0}")]
    Source(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Plugin '{id}' is invalid: {reason}")]
    InvalidPlugin { id: String, reason: String },

    #[error("Failed to import plugin for module '{module_id}': {reason}")]
    Import { module_id: String, reason: String },

    #[error("Plugin '{id}' hook failed: {reason}")]
    Hook { id: String, reason: String },
}

impl PluginError {
    pub fn import(module_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Import {
            module_id: module_id.into(),
            reason: reason.into(),
        }
    }

    pub fn hook(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Hook {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
