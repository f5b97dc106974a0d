//! Tenant context handed to plugins at initialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
}

impl MemberRole {
    /// Owners and admins manage the workspace.
    pub fn can_manage(self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceMember {
    pub id: String,
    pub user_id: String,
    pub workspace_id: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// A message published between plugins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginEvent {
    pub name: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Broadcast channel shared by plugins. Dropping a receiver unsubscribes it.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PluginEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Returns the number of subscribers that received it.
    pub fn emit(&self, name: impl Into<String>, data: serde_json::Value) -> usize {
        let event = PluginEvent {
            name: name.into(),
            data,
        };
        // No subscribers is not an error.
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PluginEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Current workspace, user, and membership.
#[derive(Debug, Clone)]
pub struct WorkspaceContext {
    pub workspace: Workspace,
    pub user: User,
    pub member: WorkspaceMember,
    pub event_bus: Option<EventBus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_role_parsing() {
        let role: MemberRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, MemberRole::Admin);
        assert!(role.can_manage());
        assert!(!MemberRole::Member.can_manage());
    }

    #[tokio::test]
    async fn test_event_bus_delivers_to_subscribers() {
        let bus = EventBus::default();
        assert_eq!(bus.emit("ignored", serde_json::Value::Null), 0);

        let mut rx = bus.subscribe();
        assert_eq!(bus.emit("order.created", serde_json::json!({"id": "1"})), 1);
        let event = rx.recv().await.unwrap();
        assert_eq!(event.name, "order.created");
        assert_eq!(event.data["id"], "1");
    }
}
