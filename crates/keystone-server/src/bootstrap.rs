//! Composition root: builds the module system from configuration.

use std::sync::Arc;

use keystone_modules::{
    BootstrapReport, InMemoryModuleStore, JsonFileModuleStore, ModuleCatalog, ModuleLoader,
    ModuleManager, ModuleRegistry, ModuleResult, ModuleScanner, ModuleStore, ModulesConfig,
    ModulesService,
};
use keystone_sales_order::SalesOrderModule;

use crate::api::AppState;
use crate::auth::JwtAuth;
use crate::config::KeystoneConfig;

/// Every feature module compiled into this binary.
pub fn builtin_catalog() -> ModuleCatalog {
    let mut catalog = ModuleCatalog::new();
    catalog.install(&SalesOrderModule::new());
    catalog
}

/// Persisted module state: a JSON file when configured, memory otherwise.
pub fn module_store(config: &ModulesConfig) -> Arc<dyn ModuleStore> {
    match config.store_path() {
        Some(path) => {
            tracing::info!(?path, "Using JSON module store");
            Arc::new(JsonFileModuleStore::new(path))
        }
        None => {
            tracing::info!("Using in-memory module store");
            Arc::new(InMemoryModuleStore::new())
        }
    }
}

/// Module management service over `catalog` for the configured roots.
pub fn modules_service(
    config: &KeystoneConfig,
    catalog: ModuleCatalog,
    store: Arc<dyn ModuleStore>,
) -> ModulesService {
    let manager = ModuleManager::new(
        ModuleScanner::new(config.modules.roots()),
        ModuleRegistry::new(),
        ModuleLoader::new(Arc::new(catalog)),
    );
    ModulesService::new(manager, store, config.auto_enable())
}

/// A bootstrapped server ready to be served.
#[derive(Debug)]
pub struct ServerHandle {
    pub state: AppState,
    pub report: BootstrapReport,
}

/// Discover, enable, and load modules, then mount their routes.
pub async fn bootstrap(config: &KeystoneConfig, catalog: ModuleCatalog) -> ModuleResult<ServerHandle> {
    let store = module_store(&config.modules);
    let modules = Arc::new(modules_service(config, catalog, store));
    let report = modules.bootstrap().await?;

    let auth = match config.jwt_secret() {
        Some(secret) if config.auth.enabled => Some(Arc::new(JwtAuth::new(secret))),
        _ => {
            tracing::warn!("API authentication is disabled");
            None
        }
    };

    let state = AppState::new(modules, auth);
    state.refresh_routes().await;

    tracing::info!(
        discovered = report.init.discovered.len(),
        loaded = report.init.loaded.len(),
        auto_enabled = report.auto_enabled.len(),
        "Module system ready"
    );
    Ok(ServerHandle { state, report })
}
