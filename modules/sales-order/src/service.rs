//! In-process sales order store.

use std::sync::Arc;

use chrono::Utc;
use keystone_modules::{ModuleService, ServiceContainer};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::{CreateSalesOrder, SalesOrder, UpdateSalesOrder};

#[derive(Debug, thiserror::Error)]
pub enum SalesOrderError {
    #[error("Sales order with ID {0} not found")]
    NotFound(Uuid),

    #[error("{0}")]
    Validation(String),
}

pub type SalesOrderResult<T> = Result<T, SalesOrderError>;

#[derive(Debug, Default)]
pub struct SalesOrderService {
    orders: RwLock<Vec<SalesOrder>>,
}

impl SalesOrderService {
    pub const NAME: &'static str = "SalesOrderService";

    pub fn new() -> Self {
        Self::default()
    }

    /// Orders newest first, optionally restricted to one workspace.
    pub async fn find_all(&self, workspace_id: Option<&str>) -> Vec<SalesOrder> {
        let orders = self.orders.read().await;
        let mut found: Vec<SalesOrder> = orders
            .iter()
            .filter(|o| workspace_id.is_none_or(|ws| o.workspace_id == ws))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found
    }

    pub async fn find_one(&self, id: Uuid) -> SalesOrderResult<SalesOrder> {
        self.orders
            .read()
            .await
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or(SalesOrderError::NotFound(id))
    }

    /// Create an order. Status defaults to pending and date to now.
    pub async fn create(&self, input: CreateSalesOrder) -> SalesOrderResult<SalesOrder> {
        if input.workspace_id.trim().is_empty() {
            return Err(SalesOrderError::Validation("workspaceId is required".to_string()));
        }

        let now = Utc::now();
        let order = SalesOrder {
            id: Uuid::now_v7(),
            order_number: input.order_number,
            customer: input.customer,
            amount: input.amount,
            status: input.status.unwrap_or_default(),
            date: input.date.unwrap_or(now),
            workspace_id: input.workspace_id,
            created_at: now,
            updated_at: now,
        };

        tracing::debug!(order_id = %order.id, workspace_id = %order.workspace_id, "Created sales order");
        self.orders.write().await.push(order.clone());
        Ok(order)
    }

    pub async fn update(&self, id: Uuid, update: UpdateSalesOrder) -> SalesOrderResult<SalesOrder> {
        let mut orders = self.orders.write().await;
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(SalesOrderError::NotFound(id))?;
        order.apply(update);
        Ok(order.clone())
    }

    pub async fn delete(&self, id: Uuid) -> SalesOrderResult<()> {
        let mut orders = self.orders.write().await;
        let before = orders.len();
        orders.retain(|o| o.id != id);
        if orders.len() == before {
            return Err(SalesOrderError::NotFound(id));
        }
        Ok(())
    }
}

impl ModuleService for SalesOrderService {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn register(self: Arc<Self>, container: &mut ServiceContainer) {
        container.provide(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SalesOrderStatus;
    use rust_decimal::Decimal;

    fn input(order_number: &str, workspace_id: &str) -> CreateSalesOrder {
        CreateSalesOrder {
            order_number: order_number.to_string(),
            customer: "Acme".to_string(),
            amount: Decimal::new(12_500, 2),
            status: None,
            date: None,
            workspace_id: workspace_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_defaults_status_and_date() {
        let service = SalesOrderService::new();
        let order = service.create(input("SO-1", "ws-1")).await.unwrap();
        assert_eq!(order.status, SalesOrderStatus::Pending);
        assert_eq!(order.date, order.created_at);
    }

    #[tokio::test]
    async fn test_create_requires_workspace() {
        let service = SalesOrderService::new();
        let err = service.create(input("SO-1", " ")).await.unwrap_err();
        assert_eq!(err.to_string(), "workspaceId is required");
    }

    #[tokio::test]
    async fn test_find_all_filters_by_workspace_newest_first() {
        let service = SalesOrderService::new();
        let first = service.create(input("SO-1", "ws-1")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = service.create(input("SO-2", "ws-1")).await.unwrap();
        service.create(input("SO-3", "ws-2")).await.unwrap();

        let orders = service.find_all(Some("ws-1")).await;
        let ids: Vec<_> = orders.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(service.find_all(None).await.len(), 3);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let service = SalesOrderService::new();
        let order = service.create(input("SO-1", "ws-1")).await.unwrap();

        let updated = service
            .update(
                order.id,
                UpdateSalesOrder {
                    status: Some(SalesOrderStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, SalesOrderStatus::Completed);
        assert_eq!(updated.customer, "Acme");

        service.delete(order.id).await.unwrap();
        assert!(matches!(
            service.find_one(order.id).await,
            Err(SalesOrderError::NotFound(_))
        ));
        assert!(service.delete(order.id).await.is_err());
    }
}
