//! Persistence of per-module install/enable state.
//!
//! The store is keyed by module id and survives restarts. The module runtime
//! never reads it directly; [`crate::service::ModulesService`] merges it into
//! API views and writes through on enable/disable.

mod json_file;
mod memory;

pub use json_file::JsonFileModuleStore;
pub use memory::InMemoryModuleStore;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metadata::ModuleMetadata;

/// Persisted state of one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    pub module_id: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub category: Option<String>,
    pub enabled: bool,
    pub installed: bool,
    #[serde(default)]
    pub installed_at: Option<DateTime<Utc>>,
}

impl ModuleRecord {
    /// A record for a module that has just been enabled.
    pub fn enabled_now(module: &ModuleMetadata) -> Self {
        Self {
            module_id: module.id.clone(),
            name: module.manifest.name.clone(),
            version: module.manifest.version.clone(),
            category: module.manifest.category.clone(),
            enabled: true,
            installed: true,
            installed_at: Some(Utc::now()),
        }
    }
}

/// Backing store for module records.
#[async_trait]
pub trait ModuleStore: Send + Sync + std::fmt::Debug {
    /// All records, ordered by module id.
    async fn list(&self) -> Result<Vec<ModuleRecord>, StoreError>;

    async fn get(&self, module_id: &str) -> Result<Option<ModuleRecord>, StoreError>;

    /// Insert or replace a record as enabled + installed.
    ///
    /// An existing `installed_at` is preserved so re-enabling keeps the
    /// original install time.
    async fn upsert_enabled(&self, record: ModuleRecord) -> Result<ModuleRecord, StoreError>;

    /// Flip the enabled flag of an existing record. Returns `None` when the
    /// module has never been persisted.
    async fn set_enabled(
        &self,
        module_id: &str,
        enabled: bool,
    ) -> Result<Option<ModuleRecord>, StoreError>;

    /// Ids of all records currently marked enabled.
    async fn enabled_ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|r| r.enabled)
            .map(|r| r.module_id)
            .collect())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("module store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("module store at {path} is corrupt: {source}")]
    Serialization {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Shared upsert semantics for store implementations.
fn merge_enabled(existing: Option<&ModuleRecord>, mut record: ModuleRecord) -> ModuleRecord {
    record.enabled = true;
    record.installed = true;
    if let Some(previous) = existing.and_then(|r| r.installed_at) {
        record.installed_at = Some(previous);
    } else if record.installed_at.is_none() {
        record.installed_at = Some(Utc::now());
    }
    record
}

#[cfg(test)]
pub(crate) fn sample_record(module_id: &str) -> ModuleRecord {
    ModuleRecord {
        module_id: module_id.to_string(),
        name: format!("{module_id} module"),
        version: "1.0.0".to_string(),
        category: None,
        enabled: true,
        installed: true,
        installed_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_merge_preserves_first_install_time() {
        let first = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let mut existing = sample_record("sales");
        existing.enabled = false;
        existing.installed_at = Some(first);

        let merged = merge_enabled(Some(&existing), sample_record("sales"));
        assert!(merged.enabled);
        assert_eq!(merged.installed_at, Some(first));
    }

    #[test]
    fn test_merge_stamps_new_install() {
        let merged = merge_enabled(None, sample_record("sales"));
        assert!(merged.installed);
        assert!(merged.installed_at.is_some());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let json = serde_json::to_value(sample_record("sales")).unwrap();
        assert_eq!(json["moduleId"], "sales");
        assert!(json.get("installedAt").is_some());
    }
}
