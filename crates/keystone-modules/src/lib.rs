//! # Keystone Modules
//!
//! Discovery, dependency ordering, and loading of optional feature modules.
//!
//! Pipeline, leaf first:
//!
//! - [`manifest`]: `manifest.json` per module directory
//! - [`discovery`]: scans module roots into [`ModuleMetadata`]
//! - [`registry`]: discovered / enabled / loaded bookkeeping and load order
//! - [`catalog`]: compiled-in feature modules and their units
//! - [`endpoint`]: endpoint tables controllers hand to the host router
//! - [`loader`]: imports declared units of enabled modules from the catalog
//! - [`manager`]: runs the stages and exposes enable/disable
//! - [`service`]: the manager plus persisted state, used by the API and CLI
//!
//! ```no_run
//! use std::sync::Arc;
//! use keystone_modules::{
//!     InMemoryModuleStore, ModuleCatalog, ModuleLoader, ModuleManager, ModuleRegistry,
//!     ModuleScanner, ModulesService,
//! };
//!
//! # async fn run() -> keystone_modules::ModuleResult<()> {
//! let manager = ModuleManager::new(
//!     ModuleScanner::new(vec!["./modules".into()]),
//!     ModuleRegistry::new(),
//!     ModuleLoader::new(Arc::new(ModuleCatalog::new())),
//! );
//! let service = ModulesService::new(manager, Arc::new(InMemoryModuleStore::new()), true);
//! let report = service.bootstrap().await?;
//! println!("loaded: {:?}", report.init.loaded);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod discovery;
pub mod endpoint;
pub mod error;
pub mod loader;
pub mod manager;
pub mod manifest;
pub mod metadata;
pub mod registry;
pub mod service;
pub mod store;
pub mod symbol;

pub use catalog::{CatalogScope, FeatureModule, ImportError, ModuleCatalog, UnitLoader};
pub use config::ModulesConfig;
pub use discovery::{DependencyCheck, ModuleScanner};
pub use endpoint::{ControllerRoute, ControllerRoutes, EndpointKey, RoutesBuilder};
pub use error::{ModuleError, ModuleResult};
pub use loader::ModuleLoader;
pub use manager::{InitReport, ManagerState, ModuleManager};
pub use manifest::{
    ManifestError, ModuleManifest, RouteMethod, CORE_MODULE_ID, MANIFEST_FILENAME,
};
pub use metadata::{LoadedModule, ModuleMetadata};
pub use registry::ModuleRegistry;
pub use service::{BootstrapReport, ModuleAction, ModuleView, ModulesService};
pub use store::{InMemoryModuleStore, JsonFileModuleStore, ModuleRecord, ModuleStore, StoreError};
pub use symbol::{
    ModelDefinition, ModuleController, ModuleExports, ModuleService, MountError,
    PluginDescriptor, ServiceContainer, Symbol,
};
