//! Module management service: the manager plus persisted state.
//!
//! This is what the HTTP layer and the admin CLI talk to. It seeds the
//! manager from the store at boot, merges persisted status into listings,
//! and writes enable/disable through to the store.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{ModuleError, ModuleResult};
use crate::manager::{InitReport, ModuleManager};
use crate::metadata::{LoadedModule, ModuleMetadata};
use crate::store::{ModuleRecord, ModuleStore};
use crate::symbol::{PluginDescriptor, Symbol};

/// A discovered module merged with its persisted status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleView {
    pub id: String,
    pub name: String,
    pub version: String,
    pub category: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub depends: Vec<String>,
    pub path: PathBuf,
    pub enabled: bool,
    pub installed: bool,
    pub installed_at: Option<DateTime<Utc>>,
    pub loaded: bool,
    /// Frontend plugins exported by the module; empty unless loaded.
    pub plugins: Vec<PluginDescriptor>,
}

impl ModuleView {
    fn merge(
        module: &ModuleMetadata,
        record: Option<&ModuleRecord>,
        loaded: Option<&LoadedModule>,
    ) -> Self {
        let plugins = loaded.map_or_else(Vec::new, |loaded| {
            loaded
                .frontend_plugins
                .iter()
                .filter_map(Symbol::as_plugin)
                .cloned()
                .collect()
        });
        Self {
            id: module.id.clone(),
            name: module.manifest.name.clone(),
            version: module.manifest.version.clone(),
            category: module.manifest.category.clone(),
            author: module.manifest.author.clone(),
            description: module.manifest.description.clone(),
            depends: module.manifest.depends.clone(),
            path: module.path.clone(),
            enabled: record.map_or(module.enabled, |r| r.enabled),
            installed: record.is_some_and(|r| r.installed),
            installed_at: record.and_then(|r| r.installed_at),
            loaded: loaded.is_some(),
            plugins,
        }
    }
}

/// Result of [`ModulesService::bootstrap`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct BootstrapReport {
    #[serde(flatten)]
    pub init: InitReport,
    pub auto_enabled: Vec<String>,
}

/// Confirmation returned by enable/disable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleAction {
    pub message: String,
}

#[derive(Debug)]
pub struct ModulesService {
    manager: Mutex<ModuleManager>,
    store: Arc<dyn ModuleStore>,
    auto_enable: bool,
}

impl ModulesService {
    pub fn new(manager: ModuleManager, store: Arc<dyn ModuleStore>, auto_enable: bool) -> Self {
        Self {
            manager: Mutex::new(manager),
            store,
            auto_enable,
        }
    }

    pub fn auto_enable(&self) -> bool {
        self.auto_enable
    }

    /// Initialize the manager from persisted enabled ids.
    ///
    /// With auto-enable on, every discovered module that is not yet enabled
    /// is then enabled through the strict path and persisted. Modules that
    /// fail that path are logged and left disabled.
    pub async fn bootstrap(&self) -> ModuleResult<BootstrapReport> {
        let enabled_ids = self.store.enabled_ids().await?;
        tracing::info!(persisted = enabled_ids.len(), "Bootstrapping module system");

        let mut manager = self.manager.lock().await;
        let init = manager.initialize(&enabled_ids).await?;
        let mut report = BootstrapReport {
            init,
            auto_enabled: Vec::new(),
        };

        if !self.auto_enable {
            return Ok(report);
        }

        for module_id in manager.load_order()? {
            if manager.registry().is_enabled(&module_id) {
                continue;
            }
            match manager.enable_module(&module_id).await {
                Ok(true) => {
                    if let Some(module) = manager.registry().discovered(&module_id) {
                        self.store
                            .upsert_enabled(ModuleRecord::enabled_now(module))
                            .await?;
                    }
                    tracing::info!(module_id = %module_id, "Auto-enabled module");
                    report.auto_enabled.push(module_id);
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(module_id = %module_id, error = %e, "Failed to auto-enable module");
                }
            }
        }

        Ok(report)
    }

    /// All discovered modules with their persisted status.
    pub async fn find_all(&self) -> ModuleResult<Vec<ModuleView>> {
        let records = self.store.list().await?;
        let manager = self.manager.lock().await;
        let registry = manager.registry();

        Ok(manager
            .all_modules()
            .into_iter()
            .map(|module| {
                let record = records.iter().find(|r| r.module_id == module.id);
                ModuleView::merge(module, record, registry.loaded(&module.id))
            })
            .collect())
    }

    pub async fn find_one(&self, module_id: &str) -> ModuleResult<Option<ModuleView>> {
        let record = self.store.get(module_id).await?;
        let manager = self.manager.lock().await;
        let registry = manager.registry();

        Ok(registry.discovered(module_id).map(|module| {
            ModuleView::merge(module, record.as_ref(), registry.loaded(module_id))
        }))
    }

    /// Enable and load a module, then persist it as enabled + installed.
    pub async fn enable(&self, module_id: &str) -> ModuleResult<ModuleAction> {
        let mut manager = self.manager.lock().await;
        if !manager.enable_module(module_id).await? {
            return Err(ModuleError::not_found(module_id));
        }

        let module = manager
            .registry()
            .discovered(module_id)
            .ok_or_else(|| ModuleError::not_found(module_id))?;
        self.store
            .upsert_enabled(ModuleRecord::enabled_now(module))
            .await?;

        Ok(ModuleAction {
            message: format!("Module {module_id} enabled successfully"),
        })
    }

    /// Disable a module. Succeeds for unknown ids; only an existing
    /// persisted record is updated.
    pub async fn disable(&self, module_id: &str) -> ModuleResult<ModuleAction> {
        let mut manager = self.manager.lock().await;
        manager.disable_module(module_id);
        if self.store.set_enabled(module_id, false).await?.is_none() {
            tracing::debug!(module_id, "No persisted record to disable");
        }

        Ok(ModuleAction {
            message: format!("Module {module_id} disabled successfully"),
        })
    }

    /// Snapshot of the loaded modules in discovery order.
    pub async fn loaded_modules(&self) -> Vec<LoadedModule> {
        let manager = self.manager.lock().await;
        manager.loaded_modules().into_iter().cloned().collect()
    }

    pub async fn enabled_ids(&self) -> Vec<String> {
        self.manager.lock().await.registry().enabled_ids()
    }

    pub async fn load_order(&self) -> ModuleResult<Vec<String>> {
        self.manager.lock().await.load_order()
    }
}
