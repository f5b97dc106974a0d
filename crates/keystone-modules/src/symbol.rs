//! Exported symbols of compiled module units.
//!
//! A unit (one manifest-declared file) exports an optional default symbol plus
//! any number of named symbols. Controllers, services, models and frontend
//! plugin descriptors are "callable" symbols and are collected by name; plain
//! values are only collected when they are the default export.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::endpoint::ControllerRoutes;

/// A backend controller contributing HTTP routes.
pub trait ModuleController: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Build the endpoints served by this controller, relative to `/api`.
    fn routes(&self, services: &ServiceContainer) -> Result<ControllerRoutes, MountError>;
}

/// A backend service made available to controllers through the container.
pub trait ModuleService: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn register(self: Arc<Self>, container: &mut ServiceContainer);
}

/// A persistent model declared by a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelDefinition {
    pub name: String,
    pub table: String,
}

/// Server-side description of a module's frontend plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginDescriptor {
    pub id: String,
    pub name: String,
    pub version: String,
    pub route: String,
    pub icon: Option<String>,
    pub permissions: Vec<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

/// An opaque exported symbol.
#[derive(Clone)]
pub enum Symbol {
    Controller(Arc<dyn ModuleController>),
    Service(Arc<dyn ModuleService>),
    Model(Arc<ModelDefinition>),
    Plugin(Arc<PluginDescriptor>),
    Value {
        name: String,
        value: Arc<serde_json::Value>,
    },
}

impl Symbol {
    pub fn controller<C: ModuleController>(controller: C) -> Self {
        Self::Controller(Arc::new(controller))
    }

    pub fn service<S: ModuleService>(service: S) -> Self {
        Self::Service(Arc::new(service))
    }

    pub fn model(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self::Model(Arc::new(ModelDefinition {
            name: name.into(),
            table: table.into(),
        }))
    }

    pub fn plugin(descriptor: PluginDescriptor) -> Self {
        Self::Plugin(Arc::new(descriptor))
    }

    pub fn value(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self::Value {
            name: name.into(),
            value: Arc::new(value),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Controller(c) => c.name(),
            Self::Service(s) => s.name(),
            Self::Model(m) => &m.name,
            Self::Plugin(p) => &p.id,
            Self::Value { name, .. } => name,
        }
    }

    /// Whether the symbol is callable/class-like (everything except plain values).
    pub fn is_callable(&self) -> bool {
        !matches!(self, Self::Value { .. })
    }

    /// Identity comparison: both symbols share the same allocation.
    pub fn same_as(&self, other: &Symbol) -> bool {
        self.address() == other.address()
    }

    fn address(&self) -> *const () {
        match self {
            Self::Controller(c) => Arc::as_ptr(c) as *const (),
            Self::Service(s) => Arc::as_ptr(s) as *const (),
            Self::Model(m) => Arc::as_ptr(m) as *const (),
            Self::Plugin(p) => Arc::as_ptr(p) as *const (),
            Self::Value { value, .. } => Arc::as_ptr(value) as *const (),
        }
    }

    pub fn as_controller(&self) -> Option<&Arc<dyn ModuleController>> {
        match self {
            Self::Controller(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_service(&self) -> Option<&Arc<dyn ModuleService>> {
        match self {
            Self::Service(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_plugin(&self) -> Option<&PluginDescriptor> {
        match self {
            Self::Plugin(p) => Some(p),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Controller(_) => "controller",
            Self::Service(_) => "service",
            Self::Model(_) => "model",
            Self::Plugin(_) => "plugin",
            Self::Value { .. } => "value",
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol::{}({})", self.kind(), self.name())
    }
}

/// Everything one unit exports.
#[derive(Debug, Clone, Default)]
pub struct ModuleExports {
    pub default: Option<Symbol>,
    pub named: Vec<Symbol>,
}

impl ModuleExports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, symbol: Symbol) -> Self {
        self.default = Some(symbol);
        self
    }

    pub fn with_named(mut self, symbol: Symbol) -> Self {
        self.named.push(symbol);
        self
    }

    /// Append this unit's collectable symbols to `into`, skipping symbols
    /// already present by identity.
    ///
    /// The default export is always eligible; named exports must be callable
    /// and carry a non-empty name.
    pub fn collect_into(self, into: &mut Vec<Symbol>) {
        let candidates = self.default.into_iter().chain(
            self.named
                .into_iter()
                .filter(|s| s.is_callable() && !s.name().is_empty()),
        );
        for symbol in candidates {
            if !into.iter().any(|existing| existing.same_as(&symbol)) {
                into.push(symbol);
            }
        }
    }
}

/// Typed service container handed to controllers when they build routes.
#[derive(Default)]
pub struct ServiceContainer {
    services: HashMap<TypeId, (&'static str, Arc<dyn Any + Send + Sync>)>,
}

impl ServiceContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service instance, replacing any previous one of the same type.
    pub fn provide<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.services.insert(
            TypeId::of::<T>(),
            (std::any::type_name::<T>(), service as Arc<dyn Any + Send + Sync>),
        );
    }

    pub fn resolve<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|(_, svc)| Arc::clone(svc).downcast::<T>().ok())
    }

    /// Resolve a service or fail with [`MountError::MissingService`].
    pub fn require<T: Send + Sync + 'static>(&self, controller: &str) -> Result<Arc<T>, MountError> {
        self.resolve::<T>().ok_or_else(|| MountError::MissingService {
            controller: controller.to_string(),
            service: std::any::type_name::<T>().to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.services.values().map(|(name, _)| name))
            .finish()
    }
}

/// Failure to mount a controller into the host router.
#[derive(Debug, thiserror::Error)]
pub enum MountError {
    #[error("controller '{controller}' requires service '{service}' which is not registered")]
    MissingService { controller: String, service: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping;

    impl ModuleController for Ping {
        fn name(&self) -> &str {
            "PingController"
        }

        fn routes(&self, _services: &ServiceContainer) -> Result<ControllerRoutes, MountError> {
            Ok(ControllerRoutes::default())
        }
    }

    #[derive(Debug)]
    struct Counter(u32);

    #[test]
    fn test_collect_default_and_callable_named() {
        let exports = ModuleExports::new()
            .with_default(Symbol::value("config", serde_json::json!({"a": 1})))
            .with_named(Symbol::controller(Ping))
            .with_named(Symbol::value("VERSION", serde_json::json!("1.0")));

        let mut collected = Vec::new();
        exports.collect_into(&mut collected);
        let names: Vec<_> = collected.iter().map(Symbol::name).collect();
        assert_eq!(names, vec!["config", "PingController"]);
    }

    #[test]
    fn test_collect_skips_identical_symbols() {
        let ping = Symbol::controller(Ping);
        let exports = ModuleExports::new()
            .with_default(ping.clone())
            .with_named(ping.clone())
            .with_named(Symbol::controller(Ping));

        let mut collected = Vec::new();
        exports.collect_into(&mut collected);
        // Same allocation collapses, a second instance with the same name does not.
        assert_eq!(collected.len(), 2);
        assert!(collected[0].same_as(&ping));
        assert!(!collected[1].same_as(&ping));
    }

    #[test]
    fn test_collect_skips_unnamed_named_exports() {
        let exports = ModuleExports::new().with_named(Symbol::model("", "orders"));
        let mut collected = Vec::new();
        exports.collect_into(&mut collected);
        assert!(collected.is_empty());
    }

    #[test]
    fn test_service_container_resolve() {
        let mut container = ServiceContainer::new();
        container.provide(Arc::new(Counter(7)));

        assert_eq!(container.resolve::<Counter>().unwrap().0, 7);
        assert!(container.resolve::<String>().is_none());
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_service_container_require_reports_missing() {
        let container = ServiceContainer::new();
        let err = container.require::<Counter>("OrdersController").unwrap_err();
        assert!(err.to_string().contains("OrdersController"));
        assert!(err.to_string().contains("Counter"));
    }
}
