//! Imports the declared units of enabled modules from the compiled catalog.
//!
//! A failure to import one unit is logged and that unit's exports are left
//! out; the module still loads with whatever the other units produced. A
//! failure of a whole module (its root is gone) skips that module for the
//! pass. Only a dependency cycle aborts [`ModuleLoader::load_modules`].

use std::path::{Component, Path};
use std::sync::Arc;

use crate::catalog::{ImportError, ModuleCatalog};
use crate::error::{ModuleError, ModuleResult};
use crate::metadata::{LoadedModule, ModuleMetadata};
use crate::registry::ModuleRegistry;
use crate::symbol::{ModuleExports, Symbol};

#[derive(Debug, Clone)]
pub struct ModuleLoader {
    catalog: Arc<ModuleCatalog>,
}

impl ModuleLoader {
    pub fn new(catalog: Arc<ModuleCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    /// Load every enabled module in dependency order and register the
    /// results. Returns the modules loaded by this pass.
    pub async fn load_modules(&self, registry: &mut ModuleRegistry) -> ModuleResult<Vec<LoadedModule>> {
        let order = registry.load_order()?;
        let mut loaded = Vec::new();

        for module_id in order {
            if !registry.is_enabled(&module_id) {
                continue;
            }
            let Some(metadata) = registry.discovered(&module_id).cloned() else {
                continue;
            };

            match self.load_module(&metadata).await {
                Ok(module) => {
                    registry.register_loaded(module.clone())?;
                    loaded.push(module);
                }
                Err(e) => {
                    tracing::error!(module_id = %module_id, error = %e, "Failed to load module, skipping");
                }
            }
        }

        tracing::info!(count = loaded.len(), "Loaded enabled modules");
        Ok(loaded)
    }

    /// Import the controllers, services, models, and frontend plugins of one
    /// module.
    pub async fn load_module(&self, metadata: &ModuleMetadata) -> ModuleResult<LoadedModule> {
        tokio::fs::metadata(&metadata.path)
            .await
            .map_err(|e| ModuleError::ModuleRootMissing {
                module_id: metadata.id.clone(),
                path: metadata.path.clone(),
                source: e,
            })?;

        match self.catalog.compiled_manifest(&metadata.id) {
            Some(compiled) if compiled.version != metadata.manifest.version => {
                tracing::warn!(
                    module_id = %metadata.id,
                    on_disk = %metadata.manifest.version,
                    compiled = %compiled.version,
                    "Module manifest version differs from compiled module"
                );
            }
            Some(_) => {}
            None => {
                tracing::warn!(module_id = %metadata.id, "No compiled module registered for this id");
            }
        }

        let manifest = &metadata.manifest;
        let mut module = LoadedModule::new(metadata.clone());
        module.controllers = self.import_units(metadata, "controller", manifest.controllers());
        module.services = self.import_units(metadata, "service", manifest.services());
        // Models are imported for their side effects only.
        let _ = self.import_units(metadata, "model", manifest.models());
        module.frontend_plugins =
            self.import_units(metadata, "frontend plugin", manifest.frontend_plugins());

        tracing::info!(
            module_id = %metadata.id,
            controllers = module.controllers.len(),
            services = module.services.len(),
            frontend_plugins = module.frontend_plugins.len(),
            "Loaded module"
        );
        Ok(module)
    }

    /// Disable a module. Symbols already handed out stay alive until their
    /// holders drop them.
    pub fn unload_module(&self, registry: &mut ModuleRegistry, module_id: &str) -> bool {
        tracing::info!(module_id, "Unloading module");
        registry.disable(module_id)
    }

    fn import_units(&self, module: &ModuleMetadata, kind: &'static str, declared: &[String]) -> Vec<Symbol> {
        let mut symbols = Vec::new();
        for unit in declared {
            match self.import_unit(module, unit) {
                Ok(exports) => exports.collect_into(&mut symbols),
                Err(e) => {
                    tracing::warn!(
                        module_id = %module.id,
                        unit = %unit,
                        kind,
                        error = %e,
                        "Failed to import module unit"
                    );
                }
            }
        }
        symbols
    }

    fn import_unit(&self, module: &ModuleMetadata, declared: &str) -> Result<ModuleExports, ImportError> {
        let unit = resolve_unit_path(&module.path, declared)?.ok_or_else(|| {
            ImportError::Unresolved {
                module_id: module.id.clone(),
                path: declared.to_string(),
            }
        })?;
        self.catalog.import(&module.id, &unit)
    }
}

/// Resolve a manifest-declared path against the module root, lexically.
///
/// Returns the normalized path relative to the root, or `None` when the path
/// names the root itself. Paths that climb out of the root, and absolute paths
/// outside it, are rejected.
fn resolve_unit_path(root: &Path, declared: &str) -> Result<Option<String>, ImportError> {
    let normalized = declared.replace('\\', "/");
    let declared_path = Path::new(&normalized);

    let relative = if declared_path.is_absolute() {
        declared_path
            .strip_prefix(root)
            .map_err(|_| ImportError::OutsideModuleRoot {
                path: declared.to_string(),
            })?
    } else {
        declared_path
    };

    let mut parts: Vec<String> = Vec::new();
    for component in relative.components() {
        match component {
            Component::CurDir => {}
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(ImportError::OutsideModuleRoot {
                        path: declared.to_string(),
                    });
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(ImportError::OutsideModuleRoot {
                    path: declared.to_string(),
                })
            }
        }
    }

    if parts.is_empty() {
        return Ok(None);
    }
    Ok(Some(parts.join("/")))
}
