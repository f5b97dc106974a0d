use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{merge_enabled, ModuleRecord, ModuleStore, StoreError};

type Records = BTreeMap<String, ModuleRecord>;

/// Store backed by a single JSON document keyed by module id.
///
/// A missing file reads as an empty store. Writes go to a sibling temp file
/// that is renamed over the target, so readers never observe a partial file.
#[derive(Debug)]
pub struct JsonFileModuleStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileModuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_records(&self) -> Result<Records, StoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Records::new()),
            Err(e) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        if contents.trim().is_empty() {
            return Ok(Records::new());
        }
        serde_json::from_str(&contents).map_err(|e| StoreError::Serialization {
            path: self.path.clone(),
            source: e,
        })
    }

    async fn write_records(&self, records: &Records) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let body = serde_json::to_vec_pretty(records).map_err(|e| StoreError::Serialization {
            path: self.path.clone(),
            source: e,
        })?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, body).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;

        tracing::debug!(path = ?self.path, records = records.len(), "Persisted module store");
        Ok(())
    }
}

#[async_trait]
impl ModuleStore for JsonFileModuleStore {
    async fn list(&self) -> Result<Vec<ModuleRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_records().await?.into_values().collect())
    }

    async fn get(&self, module_id: &str) -> Result<Option<ModuleRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_records().await?.remove(module_id))
    }

    async fn upsert_enabled(&self, record: ModuleRecord) -> Result<ModuleRecord, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_records().await?;
        let merged = merge_enabled(records.get(&record.module_id), record);
        records.insert(merged.module_id.clone(), merged.clone());
        self.write_records(&records).await?;
        Ok(merged)
    }

    async fn set_enabled(
        &self,
        module_id: &str,
        enabled: bool,
    ) -> Result<Option<ModuleRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_records().await?;
        let Some(record) = records.get_mut(module_id) else {
            return Ok(None);
        };
        record.enabled = enabled;
        let updated = record.clone();
        self.write_records(&records).await?;
        Ok(Some(updated))
    }
}
