use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{merge_enabled, ModuleRecord, ModuleStore, StoreError};

/// Process-local store. State is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryModuleStore {
    records: RwLock<BTreeMap<String, ModuleRecord>>,
}

impl InMemoryModuleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModuleStore for InMemoryModuleStore {
    async fn list(&self) -> Result<Vec<ModuleRecord>, StoreError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn get(&self, module_id: &str) -> Result<Option<ModuleRecord>, StoreError> {
        Ok(self.records.read().await.get(module_id).cloned())
    }

    async fn upsert_enabled(&self, record: ModuleRecord) -> Result<ModuleRecord, StoreError> {
        let mut records = self.records.write().await;
        let merged = merge_enabled(records.get(&record.module_id), record);
        records.insert(merged.module_id.clone(), merged.clone());
        Ok(merged)
    }

    async fn set_enabled(
        &self,
        module_id: &str,
        enabled: bool,
    ) -> Result<Option<ModuleRecord>, StoreError> {
        let mut records = self.records.write().await;
        Ok(records.get_mut(module_id).map(|record| {
            record.enabled = enabled;
            record.clone()
        }))
    }
}
