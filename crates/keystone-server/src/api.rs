//! Module management API and router assembly.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use keystone_modules::{ModuleAction, ModuleError, ModuleView, ModulesService};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::auth::{require_bearer, JwtAuth};
use crate::error::ApiError;
use crate::routes::{dispatch_to_modules, ModuleRoutes};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub modules: Arc<ModulesService>,
    pub routes: ModuleRoutes,
    pub auth: Option<Arc<JwtAuth>>,
    /// Held across a module state change and the route rebuild that follows,
    /// so rebuilds land in the same order as the changes.
    admin: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(modules: Arc<ModulesService>, auth: Option<Arc<JwtAuth>>) -> Self {
        Self {
            modules,
            routes: ModuleRoutes::new(),
            auth,
            admin: Arc::new(Mutex::new(())),
        }
    }

    /// Remount module routes from the currently loaded modules.
    pub async fn refresh_routes(&self) {
        let loaded = self.modules.loaded_modules().await;
        self.routes.rebuild(&loaded).await;
    }
}

/// The full application: `/health` plus the guarded `/api` tree. Requests
/// under `/api` that match no management route go to module routes.
pub fn app(state: AppState) -> Router {
    let modules_fallback = Router::new()
        .fallback(dispatch_to_modules)
        .with_state(state.routes.clone());

    let api = Router::new()
        .route("/modules", get(list_modules))
        .route("/modules/{id}", get(get_module))
        .route("/modules/{id}/enable", post(enable_module))
        .route("/modules/{id}/disable", post(disable_module))
        .with_state(state.clone())
        .merge(modules_fallback)
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            require_bearer,
        ));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Response {
    Json(serde_json::json!({ "status": "ok" })).into_response()
}

async fn list_modules(State(state): State<AppState>) -> Result<Json<Vec<ModuleView>>, ApiError> {
    Ok(Json(state.modules.find_all().await?))
}

async fn get_module(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ModuleView>, ApiError> {
    state
        .modules
        .find_one(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ModuleError::not_found(id).into())
}

async fn enable_module(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ModuleAction>), ApiError> {
    let _admin = state.admin.lock().await;
    let action = state.modules.enable(&id).await?;
    state.refresh_routes().await;
    Ok((StatusCode::OK, Json(action)))
}

async fn disable_module(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ModuleAction>), ApiError> {
    let _admin = state.admin.lock().await;
    let action = state.modules.disable(&id).await?;
    state.refresh_routes().await;
    Ok((StatusCode::OK, Json(action)))
}
