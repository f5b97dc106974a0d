//! HTTP routes for sales orders, mounted by the host under `/api`.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use keystone_modules::{ControllerRoutes, ModuleController, MountError, ServiceContainer};
use serde::Deserialize;
use uuid::Uuid;

use crate::model::{CreateSalesOrder, UpdateSalesOrder};
use crate::service::{SalesOrderError, SalesOrderService};

#[derive(Debug, Default, Clone, Copy)]
pub struct SalesOrderController;

impl SalesOrderController {
    pub const NAME: &'static str = "SalesOrderController";
}

impl ModuleController for SalesOrderController {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn routes(&self, services: &ServiceContainer) -> Result<ControllerRoutes, MountError> {
        let service = services.require::<SalesOrderService>(Self::NAME)?;
        Ok(endpoints(service))
    }
}

/// Endpoints served against `service`.
pub fn endpoints(service: Arc<SalesOrderService>) -> ControllerRoutes {
    ControllerRoutes::with_state(service)
        .get("/sales/orders", find_all)
        .post("/sales/orders", create)
        .get("/sales/orders/{id}", find_one)
        .patch("/sales/orders/{id}", update)
        .delete("/sales/orders/{id}", remove)
        .build()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    workspace_id: Option<String>,
}

impl IntoResponse for SalesOrderError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

async fn find_all(
    State(service): State<Arc<SalesOrderService>>,
    Query(query): Query<ListQuery>,
) -> Response {
    Json(service.find_all(query.workspace_id.as_deref()).await).into_response()
}

async fn find_one(State(service): State<Arc<SalesOrderService>>, Path(id): Path<Uuid>) -> Response {
    match service.find_one(id).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn create(
    State(service): State<Arc<SalesOrderService>>,
    Json(input): Json<CreateSalesOrder>,
) -> Response {
    match service.create(input).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn update(
    State(service): State<Arc<SalesOrderService>>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateSalesOrder>,
) -> Response {
    match service.update(id, input).await {
        Ok(order) => Json(order).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn remove(State(service): State<Arc<SalesOrderService>>, Path(id): Path<Uuid>) -> Response {
    match service.delete(id).await {
        Ok(()) => Json(true).into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use axum::Router;
    use tower::ServiceExt;

    fn router(service: Arc<SalesOrderService>) -> Router {
        endpoints(service).into_router()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
    }

    #[test]
    fn test_endpoints_are_declared() {
        let routes = endpoints(Arc::new(SalesOrderService::new()));
        let declared: Vec<_> = routes.routes().iter().map(|r| r.key().to_string()).collect();
        assert_eq!(
            declared,
            vec![
                "GET /sales/orders",
                "POST /sales/orders",
                "GET /sales/orders/{}",
                "PATCH /sales/orders/{}",
                "DELETE /sales/orders/{}",
            ]
        );
    }

    #[test]
    fn test_routes_require_service() {
        let err = SalesOrderController.routes(&ServiceContainer::new()).unwrap_err();
        assert!(err.to_string().contains(SalesOrderController::NAME));
    }

    #[tokio::test]
    async fn test_create_then_fetch() {
        let app = router(Arc::new(SalesOrderService::new()));
        let payload = serde_json::json!({
            "orderNumber": "SO-42",
            "customer": "Globex",
            "amount": "10.50",
            "workspaceId": "ws-1"
        });
        let (status, created) = send(
            app.clone(),
            Request::builder()
                .method("POST")
                .uri("/sales/orders")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "pending");

        let id = created["id"].as_str().unwrap();
        let (status, fetched) = send(
            app.clone(),
            Request::get(format!("/sales/orders/{id}")).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["orderNumber"], "SO-42");

        let (status, listed) = send(
            app,
            Request::get("/sales/orders?workspaceId=ws-2").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_missing_order_is_404() {
        let app = router(Arc::new(SalesOrderService::new()));
        let (status, body) = send(
            app,
            Request::delete(format!("/sales/orders/{}", Uuid::nil()))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }
}
