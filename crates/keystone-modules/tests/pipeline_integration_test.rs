//! Integration tests for the module pipeline.
//!
//! Builds module directory layouts in temp directories and runs the full
//! pipeline against a catalog of test feature modules:
//! discovery → registration → dependency validation → enabling → loading.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use keystone_modules::{
    CatalogScope, ControllerRoutes, FeatureModule, ImportError, JsonFileModuleStore, ModuleCatalog, ModuleController,
    ModuleError, ModuleExports, ModuleLoader, ModuleManager, ModuleManifest, ModuleRegistry,
    ModuleScanner, ModuleService, ModulesService, MountError, ServiceContainer, Symbol,
    MANIFEST_FILENAME,
};
use serde_json::json;
use tempfile::TempDir;

struct LedgerService;

impl ModuleService for LedgerService {
    fn name(&self) -> &str {
        "LedgerService"
    }

    fn register(self: Arc<Self>, container: &mut ServiceContainer) {
        container.provide(self);
    }
}

struct ReportsController;

impl ModuleController for ReportsController {
    fn name(&self) -> &str {
        "ReportsController"
    }

    fn routes(&self, _services: &ServiceContainer) -> Result<ControllerRoutes, MountError> {
        Ok(ControllerRoutes::default())
    }
}

/// `core-extras`: one service unit.
struct CoreExtras;

impl FeatureModule for CoreExtras {
    fn id(&self) -> &'static str {
        "core-extras"
    }

    fn describe(&self) -> ModuleManifest {
        ModuleManifest::parse(&manifest("core-extras", &[]).to_string(), Path::new("core-extras"))
            .unwrap()
    }

    fn register_units(&self, scope: &mut CatalogScope<'_>) {
        scope.unit("backend/services/ledger.rs", || {
            Ok(ModuleExports::new().with_default(Symbol::service(LedgerService)))
        });
    }
}

/// `reporting`: a controller unit, plus a broken controller unit.
struct Reporting;

impl FeatureModule for Reporting {
    fn id(&self) -> &'static str {
        "reporting"
    }

    fn describe(&self) -> ModuleManifest {
        ModuleManifest::parse(
            &manifest("reporting", &["core-extras"]).to_string(),
            Path::new("reporting"),
        )
        .unwrap()
    }

    fn register_units(&self, scope: &mut CatalogScope<'_>) {
        scope
            .unit("backend/controllers/reports.rs", || {
                Ok(ModuleExports::new().with_default(Symbol::controller(ReportsController)))
            })
            .unit("backend/controllers/broken.rs", || {
                Err(ImportError::initialization(
                    "backend/controllers/broken.rs",
                    "unexpected token",
                ))
            });
    }
}

fn manifest(id: &str, depends: &[&str]) -> serde_json::Value {
    let (controllers, services): (Vec<&str>, Vec<&str>) = match id {
        "core-extras" => (vec![], vec!["./backend/services/ledger.rs"]),
        "reporting" => (vec!["./backend/controllers/reports.rs"], vec![]),
        _ => (vec![], vec![]),
    };
    json!({
        "name": id,
        "version": "1.0.0",
        "installable": true,
        "depends": depends,
        "backend": { "controllers": controllers, "services": services },
    })
}

fn write_manifest(root: &Path, id: &str, manifest: &serde_json::Value) {
    let dir = root.join(id);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(MANIFEST_FILENAME), manifest.to_string()).unwrap();
}

fn catalog() -> Arc<ModuleCatalog> {
    let mut catalog = ModuleCatalog::new();
    catalog.install(&CoreExtras).install(&Reporting);
    Arc::new(catalog)
}

fn manager(root: &Path) -> ModuleManager {
    ModuleManager::new(
        ModuleScanner::new(vec![root.to_path_buf()]),
        ModuleRegistry::new(),
        ModuleLoader::new(catalog()),
    )
}

fn standard_layout() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_manifest(dir.path(), "core-extras", &manifest("core-extras", &[]));
    write_manifest(dir.path(), "reporting", &manifest("reporting", &["core-extras"]));
    dir
}

#[tokio::test]
async fn test_auto_enable_loads_in_dependency_order() {
    let dir = standard_layout();
    let store = Arc::new(JsonFileModuleStore::new(dir.path().join("state.json")));
    let service = ModulesService::new(manager(dir.path()), store, true);

    let report = service.bootstrap().await.unwrap();
    assert!(report.init.enabled.is_empty());
    assert_eq!(report.auto_enabled, vec!["core-extras", "reporting"]);
    assert_eq!(
        service.load_order().await.unwrap(),
        vec!["core-extras", "reporting"]
    );

    let loaded = service.loaded_modules().await;
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].services[0].name(), "LedgerService");
    assert_eq!(loaded[1].controllers[0].name(), "ReportsController");
}

#[tokio::test]
async fn test_strict_enable_names_missing_dependency() {
    let dir = TempDir::new().unwrap();
    write_manifest(dir.path(), "reporting", &manifest("reporting", &["core-extras"]));

    let mut manager = manager(dir.path());
    manager.initialize(&[]).await.unwrap();

    let err = manager.enable_module("reporting").await.unwrap_err();
    assert!(matches!(err, ModuleError::MissingDependencies { .. }));
    assert!(err.to_string().contains("core-extras"));
}

#[tokio::test]
async fn test_broken_controller_degrades_to_empty_list() {
    let dir = TempDir::new().unwrap();
    let mut reporting = manifest("reporting", &[]);
    reporting["backend"]["controllers"] = json!(["./backend/controllers/broken.rs"]);
    write_manifest(dir.path(), "reporting", &reporting);
    write_manifest(dir.path(), "zz-other", &manifest("zz-other", &[]));

    let mut manager = manager(dir.path());
    let report = manager
        .initialize(&["reporting".to_string(), "zz-other".to_string()])
        .await
        .unwrap();

    assert_eq!(report.loaded, vec!["reporting", "zz-other"]);
    let reporting = manager.registry().loaded("reporting").unwrap();
    assert!(reporting.controllers.is_empty());
}

#[tokio::test]
async fn test_cycle_aborts_initialization() {
    let dir = TempDir::new().unwrap();
    write_manifest(dir.path(), "a", &manifest("a", &["b"]));
    write_manifest(dir.path(), "b", &manifest("b", &["a"]));

    let mut manager = manager(dir.path());
    let err = manager.initialize(&[]).await.unwrap_err();
    let ModuleError::CircularDependency { module_id } = err else {
        panic!("expected a cycle error");
    };
    assert!(["a", "b"].contains(&module_id.as_str()));
}

#[tokio::test]
async fn test_invalid_and_non_installable_modules_are_never_enabled() {
    let dir = standard_layout();
    write_manifest(dir.path(), "no-name", &json!({"version": "1.0.0", "installable": true}));
    write_manifest(dir.path(), "no-version", &json!({"name": "x", "installable": true}));
    write_manifest(
        dir.path(),
        "hidden",
        &json!({"name": "hidden", "version": "1.0.0", "installable": false}),
    );

    let mut manager = manager(dir.path());
    let report = manager
        .initialize(&["no-name".to_string(), "hidden".to_string()])
        .await
        .unwrap();

    assert_eq!(report.discovered, vec!["core-extras", "reporting"]);
    assert_eq!(report.unknown, vec!["no-name", "hidden"]);
    assert!(!manager.enable_module("hidden").await.unwrap());
    assert!(manager.enabled_modules().is_empty());
}

#[tokio::test]
async fn test_enabled_set_survives_restart() {
    let dir = standard_layout();
    let state = dir.path().join("data/modules.json");

    let first = ModulesService::new(
        manager(dir.path()),
        Arc::new(JsonFileModuleStore::new(&state)),
        false,
    );
    first.bootstrap().await.unwrap();
    first.enable("core-extras").await.unwrap();
    first.enable("reporting").await.unwrap();
    first.disable("core-extras").await.unwrap();
    let before = first.enabled_ids().await;
    drop(first);

    let second = ModulesService::new(
        manager(dir.path()),
        Arc::new(JsonFileModuleStore::new(&state)),
        false,
    );
    let report = second.bootstrap().await.unwrap();

    assert_eq!(before, vec!["reporting"]);
    assert_eq!(second.enabled_ids().await, before);
    assert_eq!(report.init.loaded, vec!["reporting"]);
}

#[tokio::test]
async fn test_unknown_ids_leave_enabled_set_unchanged() {
    let dir = standard_layout();
    let mut manager = manager(dir.path());
    manager.initialize(&["core-extras".to_string()]).await.unwrap();

    assert!(!manager.enable_module("ghost").await.unwrap());
    assert!(manager.disable_module("ghost"));
    let enabled: Vec<_> = manager.enabled_modules().iter().map(|m| m.id.clone()).collect();
    assert_eq!(enabled, vec!["core-extras"]);
}
