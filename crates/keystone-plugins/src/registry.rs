//! Client-side registry of frontend plugins.
//!
//! Plugins are registered from an import table keyed by module id, for the
//! modules the server reports as enabled. Route lookup tries, in order:
//!
//! 1. exact match on the plugin route,
//! 2. prefix match (`route/...`),
//! 3. each plugin's route matcher,
//! 4. the same exact/prefix match with leading segments stripped, for links
//!    generated with an extra parent segment (`sales-order/sales/orders`).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::context::WorkspaceContext;
use crate::error::{PluginError, PluginResult};
use crate::plugin::{Component, PluginModule, RouteParams};
use crate::source::{EnabledModule, EnabledModulesSource};

/// How the frontend half of one module is produced.
#[derive(Clone)]
pub enum PluginImport {
    /// A complete plugin built on the client.
    Plugin(Arc<dyn Fn() -> PluginResult<PluginModule> + Send + Sync>),
    /// Only the UI component; id, route, icon and permissions come from the
    /// plugin summaries the server reports for the module.
    Component(Arc<dyn Fn() -> PluginResult<Arc<dyn Component>> + Send + Sync>),
}

impl fmt::Debug for PluginImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plugin(_) => f.write_str("PluginImport::Plugin"),
            Self::Component(_) => f.write_str("PluginImport::Component"),
        }
    }
}

/// Navigation entry derived from a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginNavItem {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    pub route: String,
}

/// A resolved route.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub plugin: &'a PluginModule,
    pub params: RouteParams,
}

pub struct PluginRegistry {
    // Registration order; route lookups walk it newest first.
    plugins: Vec<PluginModule>,
    imports: HashMap<String, PluginImport>,
    source: Arc<dyn EnabledModulesSource>,
    initialized: bool,
}

impl PluginRegistry {
    pub fn new(source: Arc<dyn EnabledModulesSource>) -> Self {
        Self {
            plugins: Vec::new(),
            imports: HashMap::new(),
            source,
            initialized: false,
        }
    }

    /// Map a module id to the import producing its plugin.
    pub fn with_import<F>(mut self, module_id: impl Into<String>, import: F) -> Self
    where
        F: Fn() -> PluginResult<PluginModule> + Send + Sync + 'static,
    {
        self.imports
            .insert(module_id.into(), PluginImport::Plugin(Arc::new(import)));
        self
    }

    /// Map a module id to its UI component; the rest of the plugin is taken
    /// from what the server reports.
    pub fn with_component<F>(mut self, module_id: impl Into<String>, import: F) -> Self
    where
        F: Fn() -> PluginResult<Arc<dyn Component>> + Send + Sync + 'static,
    {
        self.imports
            .insert(module_id.into(), PluginImport::Component(Arc::new(import)));
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Import and register the plugins of all enabled modules.
    ///
    /// Runs once; later calls are no-ops until [`PluginRegistry::clear`].
    /// A failing source is returned as an error and leaves the registry
    /// uninitialized. Per-module import failures are logged and skipped.
    /// Returns the number of plugins registered by this call.
    pub async fn load_plugins(&mut self) -> PluginResult<usize> {
        if self.initialized {
            tracing::debug!("Plugin registry already initialized, skipping load");
            return Ok(0);
        }

        let enabled = self.source.enabled_modules().await?;
        tracing::info!(count = enabled.len(), "Loading plugins for enabled modules");

        let mut registered = 0;
        for module in enabled {
            let Some(import) = self.imports.get(&module.id).cloned() else {
                tracing::warn!(module_id = %module.id, "No plugin import registered for module");
                continue;
            };

            for plugin in Self::import_plugins(&import, &module) {
                match plugin.and_then(|plugin| plugin.validate().map(|()| plugin)) {
                    Ok(plugin) => {
                        tracing::info!(plugin_id = %plugin.id, route = %plugin.route, "Registered plugin");
                        self.register(plugin);
                        registered += 1;
                    }
                    Err(e) => {
                        tracing::error!(module_id = %module.id, error = %e, "Failed to load plugin");
                    }
                }
            }
        }

        if self.plugins.is_empty() {
            tracing::warn!(
                imports = self.imports.len(),
                "No plugins registered; check that enabled module ids match the import table"
            );
        }
        self.initialized = true;
        Ok(registered)
    }

    /// Register or replace a plugin by id. A route already served by another
    /// plugin is overridden with a warning: lookups prefer the plugin
    /// registered last.
    pub fn register(&mut self, plugin: PluginModule) {
        if let Some(existing) = self
            .plugins
            .iter()
            .find(|p| p.id != plugin.id && !p.route.is_empty() && p.route == plugin.route)
        {
            tracing::warn!(
                route = %plugin.route,
                existing = %existing.id,
                plugin_id = %plugin.id,
                "Plugin route conflict, new plugin overrides"
            );
        }

        self.plugins.retain(|p| p.id != plugin.id);
        self.plugins.push(plugin);
    }

    /// Remove a plugin, running its destroy hook.
    pub async fn unregister(&mut self, plugin_id: &str) -> bool {
        let Some(index) = self.plugins.iter().position(|p| p.id == plugin_id) else {
            return false;
        };
        let plugin = self.plugins.remove(index);
        plugin.destroy().await;
        true
    }

    /// Run every plugin's init hook. Failures are logged and returned.
    pub async fn init_all(&self, context: &WorkspaceContext) -> Vec<PluginError> {
        let mut failures = Vec::new();
        for plugin in &self.plugins {
            if let Err(e) = plugin.init(context).await {
                tracing::error!(plugin_id = %plugin.id, error = %e, "Plugin init failed");
                failures.push(e);
            }
        }
        failures
    }

    pub fn all(&self) -> &[PluginModule] {
        &self.plugins
    }

    pub fn get(&self, plugin_id: &str) -> Option<&PluginModule> {
        self.plugins.iter().find(|p| p.id == plugin_id)
    }

    /// Route table for navigation.
    pub fn routes(&self) -> Vec<(&str, &PluginModule)> {
        self.plugins
            .iter()
            .filter(|p| !p.route.is_empty())
            .map(|p| (p.route.as_str(), p))
            .collect()
    }

    /// Resolve a route to a plugin. See the module docs for the order.
    pub fn get_by_route(&self, route: &str) -> Option<&PluginModule> {
        self.resolve(route).map(|m| m.plugin)
    }

    /// Resolve a route to a plugin plus any matcher parameters.
    pub fn resolve(&self, route: &str) -> Option<RouteMatch<'_>> {
        let route = route.trim_matches('/');

        if let Some(plugin) = self.find_by_route(route) {
            return Some(RouteMatch {
                plugin,
                params: plugin.match_params(route).unwrap_or_default(),
            });
        }

        for plugin in self.plugins.iter().rev() {
            if let Some(params) = plugin.match_params(route) {
                return Some(RouteMatch { plugin, params });
            }
        }

        let segments: Vec<&str> = route.split('/').collect();
        for start in 1..segments.len() {
            let candidate = segments[start..].join("/");
            if let Some(plugin) = self.find_by_route(&candidate) {
                tracing::debug!(route, candidate = %candidate, plugin_id = %plugin.id, "Resolved plugin by stripping parent prefix");
                return Some(RouteMatch {
                    plugin,
                    params: RouteParams::new(),
                });
            }
        }

        tracing::debug!(route, "No plugin found for route");
        None
    }

    pub fn nav_items(&self) -> Vec<PluginNavItem> {
        self.plugins
            .iter()
            .map(|p| PluginNavItem {
                id: p.id.clone(),
                name: p.name.clone(),
                icon: p.icon.clone(),
                route: p.route.clone(),
            })
            .collect()
    }

    /// Plugins visible to a caller holding `granted` permissions.
    ///
    /// With no granted permissions every plugin is returned. Otherwise a
    /// plugin is visible when it requires nothing or shares at least one
    /// permission with `granted`.
    pub fn enabled_for(&self, granted: &[String]) -> Vec<&PluginModule> {
        if granted.is_empty() {
            return self.plugins.iter().collect();
        }
        self.plugins
            .iter()
            .filter(|p| p.permissions.is_empty() || p.permissions.iter().any(|perm| granted.contains(perm)))
            .collect()
    }

    /// Destroy and remove every plugin; the next load starts over.
    pub async fn clear(&mut self) {
        for plugin in self.plugins.drain(..) {
            plugin.destroy().await;
        }
        self.initialized = false;
    }

    /// Clear, then load again from the source.
    pub async fn reload(&mut self) -> PluginResult<usize> {
        self.clear().await;
        self.load_plugins().await
    }

    fn import_plugins(
        import: &PluginImport,
        module: &EnabledModule,
    ) -> Vec<PluginResult<PluginModule>> {
        match import {
            PluginImport::Plugin(import) => vec![import()],
            PluginImport::Component(import) => {
                if module.plugins.is_empty() {
                    tracing::warn!(module_id = %module.id, "Server reported no frontend plugin for module");
                }
                module
                    .plugins
                    .iter()
                    .map(|summary| {
                        import().map(|component| {
                            PluginModule::from_summary(summary).with_shared_component(component)
                        })
                    })
                    .collect()
            }
        }
    }

    /// Exact match first, then the longest matching prefix. Among equal
    /// candidates the plugin registered last wins.
    fn find_by_route(&self, route: &str) -> Option<&PluginModule> {
        if let Some(plugin) = self.plugins.iter().rev().find(|p| p.route == route) {
            return Some(plugin);
        }
        self.plugins
            .iter()
            .rev()
            .filter(|p| p.matches_route(route))
            .fold(None, |best: Option<&PluginModule>, p| match best {
                Some(b) if b.route.len() >= p.route.len() => Some(b),
                _ => Some(p),
            })
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut imports: Vec<_> = self.imports.keys().collect();
        imports.sort();
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugins)
            .field("imports", &imports)
            .field("source", &self.source)
            .field("initialized", &self.initialized)
            .finish()
    }
}
