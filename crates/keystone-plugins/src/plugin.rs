//! Client-side plugin records.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::context::WorkspaceContext;
use crate::error::{PluginError, PluginResult};
use crate::source::PluginSummary;

/// Parameters extracted from a matched route.
pub type RouteParams = HashMap<String, String>;

/// Matches a path against a parameterized route, returning its parameters.
pub type RouteMatcher = Arc<dyn Fn(&str) -> Option<RouteParams> + Send + Sync>;

/// The UI entry point of a plugin.
pub trait Component: Send + Sync {
    fn name(&self) -> &str;
}

/// Optional lifecycle hooks.
#[async_trait]
pub trait PluginHooks: Send + Sync {
    async fn init(&self, _context: &WorkspaceContext) -> PluginResult<()> {
        Ok(())
    }

    async fn destroy(&self) {}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PluginMetadata {
    pub description: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
}

/// A registered frontend plugin.
#[derive(Clone)]
pub struct PluginModule {
    pub id: String,
    pub name: String,
    pub version: String,
    /// Path segment(s) used for URL matching, e.g. `sales/orders`.
    pub route: String,
    pub icon: Option<String>,
    pub component: Option<Arc<dyn Component>>,
    pub route_matcher: Option<RouteMatcher>,
    pub permissions: Vec<String>,
    pub metadata: PluginMetadata,
    pub hooks: Option<Arc<dyn PluginHooks>>,
}

impl PluginModule {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        route: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            route: route.into(),
            icon: None,
            component: None,
            route_matcher: None,
            permissions: Vec::new(),
            metadata: PluginMetadata::default(),
            hooks: None,
        }
    }

    /// A plugin described by the server. The component is supplied locally.
    pub fn from_summary(summary: &PluginSummary) -> Self {
        Self {
            icon: summary.icon.clone(),
            permissions: summary.permissions.clone(),
            metadata: PluginMetadata {
                description: summary.description.clone(),
                author: None,
                category: summary.category.clone(),
            },
            ..Self::new(
                summary.id.clone(),
                summary.name.clone(),
                summary.version.clone(),
                summary.route.clone(),
            )
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_component<C: Component + 'static>(mut self, component: C) -> Self {
        self.component = Some(Arc::new(component));
        self
    }

    pub fn with_shared_component(mut self, component: Arc<dyn Component>) -> Self {
        self.component = Some(component);
        self
    }

    pub fn with_route_matcher<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&str) -> Option<RouteParams> + Send + Sync + 'static,
    {
        self.route_matcher = Some(Arc::new(matcher));
        self
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, metadata: PluginMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_hooks<H: PluginHooks + 'static>(mut self, hooks: H) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }

    /// A plugin needs an id and a component to be registered from an import.
    pub fn validate(&self) -> PluginResult<()> {
        if self.id.trim().is_empty() {
            return Err(PluginError::InvalidPlugin {
                id: self.id.clone(),
                reason: "missing id".to_string(),
            });
        }
        if self.component.is_none() {
            return Err(PluginError::InvalidPlugin {
                id: self.id.clone(),
                reason: "missing component".to_string(),
            });
        }
        Ok(())
    }

    /// Whether `path` is this plugin's route or lies below it.
    pub fn matches_route(&self, path: &str) -> bool {
        path == self.route
            || path
                .strip_prefix(self.route.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    pub fn match_params(&self, path: &str) -> Option<RouteParams> {
        self.route_matcher.as_ref().and_then(|m| m(path))
    }

    pub async fn init(&self, context: &WorkspaceContext) -> PluginResult<()> {
        match &self.hooks {
            Some(hooks) => hooks.init(context).await,
            None => Ok(()),
        }
    }

    pub async fn destroy(&self) {
        if let Some(hooks) = &self.hooks {
            hooks.destroy().await;
        }
    }
}

impl fmt::Debug for PluginModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginModule")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("route", &self.route)
            .field("component", &self.component.as_ref().map(|c| c.name().to_string()))
            .field("route_matcher", &self.route_matcher.is_some())
            .field("permissions", &self.permissions)
            .finish()
    }
}

/// Build a matcher from a pattern such as `projects/[id]/tasks/[task]`.
///
/// Static segments must match exactly and bracketed segments capture one
/// path segment each. The segment count must be equal.
pub fn pattern_matcher(pattern: &str) -> impl Fn(&str) -> Option<RouteParams> + Send + Sync + 'static {
    let segments: Vec<String> = split_segments(pattern).map(str::to_string).collect();
    move |path: &str| {
        let parts: Vec<&str> = split_segments(path).collect();
        if parts.len() != segments.len() {
            return None;
        }
        let mut params = RouteParams::new();
        for (segment, part) in segments.iter().zip(parts) {
            match segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                Some(name) => {
                    params.insert(name.to_string(), part.to_string());
                }
                None if segment == part => {}
                None => return None,
            }
        }
        Some(params)
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
