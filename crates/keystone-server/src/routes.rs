//! Routes contributed by loaded modules.
//!
//! Services of every loaded module are registered into one container first,
//! then each controller builds its router against that container. The merged
//! router is swapped in atomically and requests under `/api` that match no
//! management route are dispatched to it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Router;
use keystone_modules::{ControllerRoutes, EndpointKey, LoadedModule, ServiceContainer};
use serde::Serialize;
use tokio::sync::RwLock;
use tower::ServiceExt;

use crate::error::json_error;

/// Outcome of a rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MountReport {
    pub services: usize,
    pub controllers: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ModuleRoutes {
    router: Arc<RwLock<Router>>,
}

impl Default for ModuleRoutes {
    fn default() -> Self {
        Self {
            router: Arc::new(RwLock::new(empty_router())),
        }
    }
}

impl ModuleRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the module router with one built from `modules`.
    ///
    /// A controller whose services are missing, or that declares an endpoint
    /// already mounted by an earlier controller, is skipped; the rest still
    /// mount.
    pub async fn rebuild(&self, modules: &[LoadedModule]) -> MountReport {
        let mut container = ServiceContainer::new();
        for module in modules {
            for symbol in &module.services {
                if let Some(service) = symbol.as_service() {
                    Arc::clone(service).register(&mut container);
                }
            }
        }

        let mut report = MountReport {
            services: container.len(),
            ..Default::default()
        };
        let mut mounted = MountedEndpoints::default();
        let mut router = Router::new();
        for module in modules {
            for symbol in &module.controllers {
                let Some(controller) = symbol.as_controller() else {
                    continue;
                };
                let routes = match controller.routes(&container) {
                    Ok(routes) => routes,
                    Err(e) => {
                        tracing::warn!(
                            module_id = %module.id(),
                            controller = %controller.name(),
                            error = %e,
                            "Failed to mount controller"
                        );
                        report.failed.push(controller.name().to_string());
                        continue;
                    }
                };
                if let Err(conflict) = mounted.claim(&routes) {
                    tracing::warn!(
                        module_id = %module.id(),
                        controller = %controller.name(),
                        endpoint = %conflict,
                        "Controller endpoint already mounted, skipping controller"
                    );
                    report.failed.push(controller.name().to_string());
                    continue;
                }
                tracing::info!(
                    module_id = %module.id(),
                    controller = %controller.name(),
                    endpoints = routes.len(),
                    "Mounted controller"
                );
                router = routes.mount(router);
                report.controllers.push(controller.name().to_string());
            }
        }

        *self.router.write().await = router.fallback(not_found);
        tracing::debug!(
            services = report.services,
            controllers = report.controllers.len(),
            "Module routes rebuilt"
        );
        report
    }

    pub async fn dispatch(&self, request: Request) -> Response {
        let router = self.router.read().await.clone();
        match router.oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}

/// Endpoints claimed so far during one rebuild.
///
/// The router matches on path shape, so two paths that differ only in
/// parameter names collide even for different methods.
#[derive(Debug, Default)]
struct MountedEndpoints {
    keys: HashSet<EndpointKey>,
    paths: HashMap<String, String>,
}

impl MountedEndpoints {
    /// Claim every endpoint of `routes`, or none of them.
    fn claim(&mut self, routes: &ControllerRoutes) -> Result<(), String> {
        let mut keys = self.keys.clone();
        let mut paths = self.paths.clone();
        for route in routes.routes() {
            let key = route.key();
            match paths.get(&key.shape) {
                Some(existing) if existing != route.path() => {
                    return Err(format!("{} conflicts with {existing}", route.path()));
                }
                _ => {}
            }
            if !keys.insert(key.clone()) {
                return Err(key.to_string());
            }
            paths.insert(key.shape, route.path().to_string());
        }
        self.keys = keys;
        self.paths = paths;
        Ok(())
    }
}

/// Fallback handler forwarding to the current module router.
pub async fn dispatch_to_modules(State(routes): State<ModuleRoutes>, request: Request) -> Response {
    routes.dispatch(request).await
}

fn empty_router() -> Router {
    Router::new().fallback(not_found)
}

async fn not_found() -> Response {
    json_error("Not found", StatusCode::NOT_FOUND)
}
