//! # Keystone Server
//!
//! HTTP host for feature modules. Serves the module management API under
//! `/api/modules` and mounts the routes contributed by enabled modules under
//! `/api`, rebuilding them whenever a module is enabled or disabled.
//!
//! ```no_run
//! use keystone_server::{app, bootstrap, builtin_catalog, KeystoneConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = KeystoneConfig::load()?;
//! let handle = bootstrap(&config, builtin_catalog()).await?;
//! let listener = tokio::net::TcpListener::bind(config.socket_addr()?).await?;
//! axum::serve(listener, app(handle.state)).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;

pub use api::{app, AppState};
pub use auth::{AuthenticatedUser, Claims, JwtAuth};
pub use bootstrap::{bootstrap, builtin_catalog, ServerHandle};
pub use config::{ConfigError, KeystoneConfig};
pub use error::ApiError;
pub use routes::{ModuleRoutes, MountReport};
