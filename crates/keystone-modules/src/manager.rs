//! Orchestrates discovery, registration, dependency validation, enabling and
//! loading.
//!
//! `initialize` is lenient about unmet dependencies (warn and enable anyway);
//! `enable_module` is strict and refuses. Both go through
//! [`ModuleManager::enable_checked`].
//!
//! The manager takes `&mut self` for every mutation, so callers that share it
//! across tasks serialize access (see [`crate::service::ModulesService`]).

use std::fmt;

use serde::Serialize;

use crate::discovery::{DependencyCheck, ModuleScanner};
use crate::error::{ModuleError, ModuleResult};
use crate::loader::ModuleLoader;
use crate::metadata::{LoadedModule, ModuleMetadata};
use crate::registry::ModuleRegistry;

/// Initialization stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerState {
    Idle,
    Discovering,
    Registering,
    ValidatingDependencies,
    Enabling,
    Loading,
    Ready,
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Discovering => "discovering",
            Self::Registering => "registering",
            Self::ValidatingDependencies => "validating_dependencies",
            Self::Enabling => "enabling",
            Self::Loading => "loading",
            Self::Ready => "ready",
        };
        f.write_str(s)
    }
}

/// Summary of one `initialize` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub discovered: Vec<String>,
    pub dependency_warnings: Vec<DependencyCheck>,
    pub enabled: Vec<String>,
    /// Requested ids that were not discovered.
    pub unknown: Vec<String>,
    pub loaded: Vec<String>,
}

#[derive(Debug)]
pub struct ModuleManager {
    scanner: ModuleScanner,
    registry: ModuleRegistry,
    loader: ModuleLoader,
    state: ManagerState,
}

impl ModuleManager {
    pub fn new(scanner: ModuleScanner, registry: ModuleRegistry, loader: ModuleLoader) -> Self {
        Self {
            scanner,
            registry,
            loader,
            state: ManagerState::Idle,
        }
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn loader(&self) -> &ModuleLoader {
        &self.loader
    }

    /// Run discovery through loading once.
    ///
    /// The registry is cleared first, so a second run starts from a fresh
    /// scan. Unknown ids in `enabled_ids` are reported and ignored. Fails
    /// only when a root cannot be listed or the dependency graph has a cycle;
    /// the state is left at the failing stage.
    pub async fn initialize(&mut self, enabled_ids: &[String]) -> ModuleResult<InitReport> {
        let mut report = InitReport::default();
        self.registry.clear();

        self.transition(ManagerState::Discovering);
        let modules = self.scanner.discover().await?;

        self.transition(ManagerState::Registering);
        for module in modules {
            report.discovered.push(module.id.clone());
            self.registry.register_discovered(module);
        }

        self.transition(ManagerState::ValidatingDependencies);
        for module in self.registry.all_discovered() {
            let check = ModuleScanner::validate_dependencies(module, self.registry.all_discovered());
            if !check.is_valid() {
                tracing::warn!(
                    module_id = %check.module_id,
                    missing = ?check.missing,
                    "Module has missing dependencies"
                );
                report.dependency_warnings.push(check);
            }
        }

        self.transition(ManagerState::Enabling);
        for module_id in enabled_ids {
            if self.enable_checked(module_id, false)? {
                report.enabled.push(module_id.clone());
            } else {
                tracing::warn!(module_id = %module_id, "Cannot enable undiscovered module");
                report.unknown.push(module_id.clone());
            }
        }

        self.transition(ManagerState::Loading);
        let loaded = self.loader.load_modules(&mut self.registry).await?;
        report.loaded = loaded.into_iter().map(|m| m.metadata.id).collect();

        self.transition(ManagerState::Ready);
        tracing::info!(
            discovered = report.discovered.len(),
            enabled = report.enabled.len(),
            loaded = report.loaded.len(),
            "Module system initialized"
        );
        Ok(report)
    }

    /// Enable one module after startup and load it.
    ///
    /// Returns `Ok(false)` for an undiscovered id. Fails with
    /// [`ModuleError::MissingDependencies`] when a direct dependency is not
    /// discovered. If loading fails the module is disabled again.
    pub async fn enable_module(&mut self, module_id: &str) -> ModuleResult<bool> {
        if !self.enable_checked(module_id, true)? {
            return Ok(false);
        }

        let Some(metadata) = self.registry.discovered(module_id).cloned() else {
            return Ok(false);
        };
        match self.loader.load_module(&metadata).await {
            Ok(module) => {
                self.registry.register_loaded(module)?;
                tracing::info!(module_id, "Module enabled");
                Ok(true)
            }
            Err(e) => {
                self.registry.disable(module_id);
                Err(e)
            }
        }
    }

    /// Disable a module. Always succeeds, including for unknown ids.
    pub fn disable_module(&mut self, module_id: &str) -> bool {
        self.loader.unload_module(&mut self.registry, module_id)
    }

    /// Shared enable path. `strict` turns missing direct dependencies into
    /// an error instead of a warning.
    pub fn enable_checked(&mut self, module_id: &str, strict: bool) -> ModuleResult<bool> {
        let Some(module) = self.registry.discovered(module_id) else {
            return Ok(false);
        };

        let check = ModuleScanner::validate_dependencies(module, self.registry.all_discovered());
        if !check.is_valid() {
            if strict {
                return Err(ModuleError::MissingDependencies {
                    module_id: module_id.to_string(),
                    missing: check.missing,
                });
            }
            tracing::warn!(
                module_id,
                missing = ?check.missing,
                "Enabling module with missing dependencies"
            );
        }

        Ok(self.registry.enable(module_id))
    }

    pub fn all_modules(&self) -> Vec<&ModuleMetadata> {
        self.registry.all_discovered()
    }

    pub fn enabled_modules(&self) -> Vec<&ModuleMetadata> {
        self.registry.enabled()
    }

    pub fn loaded_modules(&self) -> Vec<&LoadedModule> {
        self.registry.all_loaded()
    }

    pub fn load_order(&self) -> ModuleResult<Vec<String>> {
        self.registry.load_order()
    }

    fn transition(&mut self, next: ManagerState) {
        tracing::debug!(from = %self.state, to = %next, "Module manager stage");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModuleCatalog;
    use crate::manifest::MANIFEST_FILENAME;
    use std::path::Path;
    use std::sync::Arc;

    fn write_module(root: &Path, id: &str, depends: &[&str]) {
        let dir = root.join(id);
        std::fs::create_dir_all(&dir).unwrap();
        let manifest = serde_json::json!({
            "name": id,
            "version": "1.0.0",
            "installable": true,
            "depends": depends,
        });
        std::fs::write(dir.join(MANIFEST_FILENAME), manifest.to_string()).unwrap();
    }

    fn manager(root: &Path) -> ModuleManager {
        ModuleManager::new(
            ModuleScanner::new(vec![root.to_path_buf()]),
            ModuleRegistry::new(),
            ModuleLoader::new(Arc::new(ModuleCatalog::new())),
        )
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ManagerState::ValidatingDependencies.to_string(), "validating_dependencies");
        assert_eq!(ManagerState::Idle.to_string(), "idle");
    }

    #[tokio::test]
    async fn test_initialize_is_lenient_on_missing_dependencies() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "reporting", &["core-extras"]);

        let mut manager = manager(dir.path());
        assert_eq!(manager.state(), ManagerState::Idle);
        let report = manager.initialize(&["reporting".to_string()]).await.unwrap();

        assert_eq!(manager.state(), ManagerState::Ready);
        assert_eq!(report.enabled, vec!["reporting"]);
        assert_eq!(report.dependency_warnings[0].missing, vec!["core-extras"]);
        assert_eq!(report.loaded, vec!["reporting"]);
    }

    #[tokio::test]
    async fn test_initialize_reports_unknown_ids() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "a", &[]);

        let mut manager = manager(dir.path());
        let report = manager
            .initialize(&["ghost".to_string(), "a".to_string()])
            .await
            .unwrap();
        assert_eq!(report.unknown, vec!["ghost"]);
        assert_eq!(report.enabled, vec!["a"]);
    }

    #[tokio::test]
    async fn test_enable_module_is_strict() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "reporting", &["core", "core-extras"]);

        let mut manager = manager(dir.path());
        manager.initialize(&[]).await.unwrap();

        let err = manager.enable_module("reporting").await.unwrap_err();
        match err {
            ModuleError::MissingDependencies { module_id, missing } => {
                assert_eq!(module_id, "reporting");
                assert_eq!(missing, vec!["core-extras"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!manager.registry().is_enabled("reporting"));
    }

    #[tokio::test]
    async fn test_enable_unknown_module_is_false() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "a", &[]);
        let mut manager = manager(dir.path());
        manager.initialize(&[]).await.unwrap();

        assert!(!manager.enable_module("ghost").await.unwrap());
        assert!(manager.enabled_modules().is_empty());
    }

    #[tokio::test]
    async fn test_enable_then_disable() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "a", &[]);
        let mut manager = manager(dir.path());
        manager.initialize(&[]).await.unwrap();

        assert!(manager.enable_module("a").await.unwrap());
        assert_eq!(manager.loaded_modules().len(), 1);

        assert!(manager.disable_module("a"));
        assert!(manager.loaded_modules().is_empty());
        assert!(manager.enabled_modules().is_empty());
        assert!(manager.disable_module("ghost"));
    }

    #[tokio::test]
    async fn test_initialize_fails_on_cycle() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "a", &["b"]);
        write_module(dir.path(), "b", &["a"]);

        let mut manager = manager(dir.path());
        let err = manager.initialize(&["a".to_string()]).await.unwrap_err();
        assert!(matches!(err, ModuleError::CircularDependency { .. }));
        assert_eq!(manager.state(), ManagerState::Loading);
    }
}
