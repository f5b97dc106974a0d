//! Link-time registration table of compiled feature modules.
//!
//! Every feature module is compiled into the host and implements
//! [`FeatureModule`]. During registration it binds each file path declared in
//! its manifest to a unit loader. The loader later "imports" a declared file by
//! looking it up here instead of evaluating code found on disk.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::manifest::ModuleManifest;
use crate::symbol::ModuleExports;

/// Produces the exports of one compiled unit.
pub type UnitLoader = Arc<dyn Fn() -> Result<ModuleExports, ImportError> + Send + Sync>;

/// Capability interface implemented by every compiled feature module.
pub trait FeatureModule: Send + Sync {
    /// Module id; must match the directory name of its on-disk manifest.
    fn id(&self) -> &'static str;

    /// The manifest the module was compiled against.
    fn describe(&self) -> ModuleManifest;

    /// Bind the module's declared unit paths to loaders.
    fn register_units(&self, scope: &mut CatalogScope<'_>);
}

/// Per-module view of the catalog used during registration.
#[derive(Debug)]
pub struct CatalogScope<'a> {
    catalog: &'a mut ModuleCatalog,
    module_id: String,
}

impl CatalogScope<'_> {
    /// Register a unit under a path relative to the module root.
    pub fn unit<F>(&mut self, path: &str, loader: F) -> &mut Self
    where
        F: Fn() -> Result<ModuleExports, ImportError> + Send + Sync + 'static,
    {
        self.catalog
            .register_unit(&self.module_id, path, Arc::new(loader));
        self
    }
}

/// The table of compiled modules and their units.
#[derive(Default)]
pub struct ModuleCatalog {
    units: HashMap<(String, String), UnitLoader>,
    manifests: HashMap<String, ModuleManifest>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a compiled feature module.
    pub fn install(&mut self, module: &dyn FeatureModule) -> &mut Self {
        let module_id = module.id().to_string();
        tracing::debug!(module_id = %module_id, "Installing compiled module into catalog");
        self.manifests.insert(module_id.clone(), module.describe());
        let mut scope = CatalogScope {
            catalog: &mut *self,
            module_id,
        };
        module.register_units(&mut scope);
        self
    }

    /// Register a single unit. `path` is normalized the same way the loader
    /// normalizes manifest paths.
    pub fn register_unit(&mut self, module_id: &str, path: &str, loader: UnitLoader) {
        self.units
            .insert((module_id.to_string(), unit_key(path)), loader);
    }

    /// Import a unit, returning its exports.
    pub fn import(&self, module_id: &str, unit_path: &str) -> Result<ModuleExports, ImportError> {
        let key = (module_id.to_string(), unit_key(unit_path));
        let loader = self
            .units
            .get(&key)
            .ok_or_else(|| ImportError::Unresolved {
                module_id: module_id.to_string(),
                path: unit_path.to_string(),
            })?;
        loader()
    }

    /// The compiled-in manifest of a module, if it was installed.
    pub fn compiled_manifest(&self, module_id: &str) -> Option<&ModuleManifest> {
        self.manifests.get(module_id)
    }

    pub fn contains_module(&self, module_id: &str) -> bool {
        self.manifests.contains_key(module_id)
            || self.units.keys().any(|(id, _)| id == module_id)
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }
}

impl fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.units.keys().collect();
        keys.sort();
        f.debug_struct("ModuleCatalog")
            .field("modules", &self.manifests.keys().collect::<Vec<_>>())
            .field("units", &keys)
            .finish()
    }
}

/// Strip leading `./` segments and normalize separators.
fn unit_key(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let mut rest = normalized.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.to_string()
}

/// Per-unit import failure. Never fatal to the module being loaded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    #[error("no compiled unit registered for '{path}' in module '{module_id}'")]
    Unresolved { module_id: String, path: String },

    #[error("unit path '{path}' escapes the module root")]
    OutsideModuleRoot { path: String },

    #[error("unit '{path}' failed to initialize: {reason}")]
    Initialization { path: String, reason: String },
}

impl ImportError {
    pub fn initialization(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Initialization {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
