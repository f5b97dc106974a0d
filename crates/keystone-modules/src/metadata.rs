//! Discovery-time and runtime module records.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::manifest::ModuleManifest;
use crate::symbol::Symbol;

/// A module found on disk by the scanner.
///
/// `id` is the name of the directory holding the manifest. After discovery the
/// registry is the only authority on `enabled`/`installed`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleMetadata {
    pub id: String,
    pub path: PathBuf,
    pub manifest: ModuleManifest,
    pub enabled: bool,
    pub installed: bool,
    pub installed_at: Option<DateTime<Utc>>,
}

impl ModuleMetadata {
    /// A freshly discovered module: not enabled, not installed.
    pub fn discovered(id: impl Into<String>, path: PathBuf, manifest: ModuleManifest) -> Self {
        Self {
            id: id.into(),
            path,
            manifest,
            enabled: false,
            installed: false,
            installed_at: None,
        }
    }
}

/// A module whose units have been imported.
///
/// Only created for modules that are both discovered and enabled.
#[derive(Debug, Clone)]
pub struct LoadedModule {
    pub metadata: ModuleMetadata,
    pub controllers: Vec<Symbol>,
    pub services: Vec<Symbol>,
    pub frontend_plugins: Vec<Symbol>,
}

impl LoadedModule {
    pub fn new(metadata: ModuleMetadata) -> Self {
        Self {
            metadata,
            controllers: Vec::new(),
            services: Vec::new(),
            frontend_plugins: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }
}
