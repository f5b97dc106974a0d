//! # Keystone Plugins
//!
//! Client-side registry for the frontend half of feature modules. The server
//! reports which modules are enabled; the registry imports the matching
//! plugins, resolves workspace URLs to them, and builds the sidebar.
//!
//! ```no_run
//! use std::sync::Arc;
//! use keystone_plugins::{create_nav_data, HttpModulesSource, PluginRegistry};
//!
//! # async fn run() -> keystone_plugins::PluginResult<()> {
//! let source = HttpModulesSource::new("http://localhost:3001/api")?;
//! let mut registry = PluginRegistry::new(Arc::new(source));
//! registry.load_plugins().await?;
//! let nav = create_nav_data(&registry.nav_items());
//! # let _ = nav;
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod error;
pub mod nav;
pub mod plugin;
pub mod registry;
pub mod source;

pub use context::{EventBus, MemberRole, PluginEvent, User, Workspace, WorkspaceContext, WorkspaceMember};
pub use error::{PluginError, PluginResult};
pub use nav::{create_nav_data, generate_nav_url, NavData, NavItem, NavSubItem};
pub use plugin::{
    pattern_matcher, Component, PluginHooks, PluginMetadata, PluginModule, RouteMatcher,
    RouteParams,
};
pub use registry::{PluginImport, PluginNavItem, PluginRegistry, RouteMatch};
pub use source::{
    EnabledModule, EnabledModulesSource, HttpModulesSource, PluginSummary, StaticModulesSource,
};
