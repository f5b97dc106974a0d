//! Frontend plugin descriptor for the sales order pages.

use keystone_modules::PluginDescriptor;

pub const PLUGIN_ROUTE: &str = "sales/orders";

pub fn descriptor() -> PluginDescriptor {
    PluginDescriptor {
        id: crate::MODULE_ID.to_string(),
        name: "Sales Orders".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        route: PLUGIN_ROUTE.to_string(),
        icon: Some("ShoppingCart".to_string()),
        permissions: vec!["sales:read".to_string()],
        description: Some("Manage sales orders and transactions".to_string()),
        category: Some("sales".to_string()),
    }
}
