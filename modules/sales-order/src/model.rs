//! Sales order records and request payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Table backing [`SalesOrder`].
pub const TABLE_NAME: &str = "sales_orders";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesOrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrder {
    pub id: Uuid,
    pub order_number: String,
    pub customer: String,
    pub amount: Decimal,
    pub status: SalesOrderStatus,
    pub date: DateTime<Utc>,
    pub workspace_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSalesOrder {
    pub order_number: String,
    pub customer: String,
    pub amount: Decimal,
    pub status: Option<SalesOrderStatus>,
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub workspace_id: String,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSalesOrder {
    pub order_number: Option<String>,
    pub customer: Option<String>,
    pub amount: Option<Decimal>,
    pub status: Option<SalesOrderStatus>,
    pub date: Option<DateTime<Utc>>,
}

impl SalesOrder {
    pub(crate) fn apply(&mut self, update: UpdateSalesOrder) {
        if let Some(order_number) = update.order_number {
            self.order_number = order_number;
        }
        if let Some(customer) = update.customer {
            self.customer = customer;
        }
        if let Some(amount) = update.amount {
            self.amount = amount;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(date) = update.date {
            self.date = date;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_create_payload_accepts_string_amount() {
        let payload: CreateSalesOrder = serde_json::from_str(
            r#"{"orderNumber": "SO-1", "customer": "Acme", "amount": "199.90", "workspaceId": "ws-1"}"#,
        )
        .unwrap();
        assert_eq!(payload.amount, Decimal::from_str("199.90").unwrap());
        assert!(payload.status.is_none());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(SalesOrderStatus::Processing).unwrap(),
            serde_json::json!("processing")
        );
        assert_eq!(SalesOrderStatus::default(), SalesOrderStatus::Pending);
    }
}
