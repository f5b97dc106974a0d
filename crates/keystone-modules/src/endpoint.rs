//! Route tables contributed by module controllers.
//!
//! Controllers do not hand the host an opaque `Router`. They return a
//! [`ControllerRoutes`] table that records every `(method, path)` pair next to
//! its handler, so the host can refuse a controller whose endpoints collide
//! with ones already mounted instead of letting the router panic.

use std::fmt;

use axum::handler::Handler;
use axum::routing::{on, MethodFilter, MethodRouter};
use axum::Router;

use crate::manifest::RouteMethod;

/// One endpoint: a single method on a single path.
pub struct ControllerRoute {
    method: RouteMethod,
    path: String,
    handler: MethodRouter,
}

impl ControllerRoute {
    pub fn method(&self) -> RouteMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Key under which two endpoints collide in the router.
    ///
    /// Parameter names do not matter to the matcher, so `/orders/{id}` and
    /// `/orders/{order_id}` share a key.
    pub fn key(&self) -> EndpointKey {
        EndpointKey {
            method: self.method,
            shape: path_shape(&self.path),
        }
    }
}

impl fmt::Debug for ControllerRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Collision key of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointKey {
    pub method: RouteMethod,
    pub shape: String,
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.shape)
    }
}

/// All endpoints of one controller, in declaration order.
#[derive(Debug, Default)]
pub struct ControllerRoutes {
    routes: Vec<ControllerRoute>,
}

impl ControllerRoutes {
    /// Start a table whose handlers extract `state`.
    pub fn with_state<S>(state: S) -> RoutesBuilder<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        RoutesBuilder {
            state,
            routes: Vec::new(),
        }
    }

    /// Start a table whose handlers need no state.
    pub fn stateless() -> RoutesBuilder<()> {
        Self::with_state(())
    }

    pub fn routes(&self) -> &[ControllerRoute] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Add every endpoint to `router`.
    ///
    /// Endpoints on a path that already exists in `router` are merged into it;
    /// callers must make sure no key is mounted twice.
    pub fn mount(self, mut router: Router) -> Router {
        for route in self.routes {
            router = router.route(&route.path, route.handler);
        }
        router
    }

    /// A router holding only this table's endpoints.
    pub fn into_router(self) -> Router {
        self.mount(Router::new())
    }
}

/// Builder returned by [`ControllerRoutes::with_state`].
#[derive(Debug)]
pub struct RoutesBuilder<S> {
    state: S,
    routes: Vec<ControllerRoute>,
}

impl<S> RoutesBuilder<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn get<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.endpoint(RouteMethod::Get, path, handler)
    }

    pub fn post<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.endpoint(RouteMethod::Post, path, handler)
    }

    pub fn put<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.endpoint(RouteMethod::Put, path, handler)
    }

    pub fn patch<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.endpoint(RouteMethod::Patch, path, handler)
    }

    pub fn delete<H, T>(self, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        self.endpoint(RouteMethod::Delete, path, handler)
    }

    pub fn endpoint<H, T>(mut self, method: RouteMethod, path: &str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        let handler = on(method_filter(method), handler).with_state(self.state.clone());
        self.routes.push(ControllerRoute {
            method,
            path: path.to_string(),
            handler,
        });
        self
    }

    pub fn build(self) -> ControllerRoutes {
        ControllerRoutes {
            routes: self.routes,
        }
    }
}

fn method_filter(method: RouteMethod) -> MethodFilter {
    match method {
        RouteMethod::Get => MethodFilter::GET,
        RouteMethod::Post => MethodFilter::POST,
        RouteMethod::Put => MethodFilter::PUT,
        RouteMethod::Patch => MethodFilter::PATCH,
        RouteMethod::Delete => MethodFilter::DELETE,
    }
}

/// `/orders/{id}/lines` → `/orders/{}/lines`; wildcards become `{*}`.
fn path_shape(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    let segments: Vec<&str> = trimmed
        .split('/')
        .map(|segment| {
            if segment.starts_with("{*") {
                "{*}"
            } else if segment.starts_with('{') && segment.ends_with('}') {
                "{}"
            } else {
                segment
            }
        })
        .collect();
    let shape = segments.join("/");
    if shape.is_empty() {
        "/".to_string()
    } else {
        shape
    }
}
