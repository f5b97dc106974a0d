//! # Keystone Sales Order Module
//!
//! Compiled-in feature module. The directory holding this crate is also the
//! module directory the scanner discovers: `manifest.json` sits next to
//! `Cargo.toml`, and the unit paths it declares are this crate's sources.

use std::path::Path;
use std::sync::Arc;

use keystone_modules::{CatalogScope, FeatureModule, ModuleExports, ModuleManifest, Symbol};

pub mod controller;
pub mod model;
pub mod plugin;
pub mod service;

pub use controller::SalesOrderController;
pub use model::{CreateSalesOrder, SalesOrder, SalesOrderStatus, UpdateSalesOrder};
pub use service::{SalesOrderError, SalesOrderService};

pub const MODULE_ID: &str = "sales-order";

const MANIFEST: &str = include_str!("../manifest.json");

/// The sales order feature module.
///
/// One service instance is shared by every import of the service unit, so
/// orders survive a disable/enable cycle.
#[derive(Debug, Default)]
pub struct SalesOrderModule {
    service: Arc<SalesOrderService>,
}

impl SalesOrderModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn service(&self) -> &Arc<SalesOrderService> {
        &self.service
    }
}

impl FeatureModule for SalesOrderModule {
    fn id(&self) -> &'static str {
        MODULE_ID
    }

    fn describe(&self) -> ModuleManifest {
        ModuleManifest::parse(MANIFEST, Path::new("sales-order/manifest.json")).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Embedded sales-order manifest is invalid");
            ModuleManifest {
                name: "Sales Orders".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                installable: true,
                ..Default::default()
            }
        })
    }

    fn register_units(&self, scope: &mut CatalogScope<'_>) {
        let service = Arc::clone(&self.service);
        scope
            .unit("src/controller.rs", || {
                Ok(ModuleExports::new().with_default(Symbol::controller(SalesOrderController)))
            })
            .unit("src/service.rs", move || {
                Ok(ModuleExports::new().with_default(Symbol::Service(service.clone())))
            })
            .unit("src/model.rs", || {
                Ok(ModuleExports::new()
                    .with_default(Symbol::model("SalesOrder", model::TABLE_NAME)))
            })
            .unit("src/plugin.rs", || {
                Ok(ModuleExports::new().with_default(Symbol::plugin(plugin::descriptor())))
            });
    }
}
