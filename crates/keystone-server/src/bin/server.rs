//! # Keystone Server
//!
//! ```bash
//! # Development: modules under ./modules are auto-enabled
//! cargo run --bin keystone-server
//!
//! # Production with persisted module state and API auth
//! KEYSTONE_ENV=production KEYSTONE_STORE_PATH=./data/modules.json \
//!   KEYSTONE_JWT_SECRET=change-me cargo run --release --bin keystone-server
//! ```

use tokio::signal;
use tracing::{error, info};

use keystone_server::{app, bootstrap, builtin_catalog, logging, KeystoneConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to load .env: {e}");
        }
    }
    logging::init_tracing();

    info!("Starting Keystone Server...");
    info!("   Version: {}", env!("CARGO_PKG_VERSION"));
    info!(
        "   Build Mode: {}",
        if cfg!(debug_assertions) {
            "Debug"
        } else {
            "Release"
        }
    );

    let config = KeystoneConfig::load()?;
    let address = config.socket_addr()?;
    info!(
        "   Environment: {}",
        config.environment.as_deref().unwrap_or("development")
    );

    let handle = bootstrap(&config, builtin_catalog())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bootstrap module system: {e}"))?;

    let listener = tokio::net::TcpListener::bind(address).await?;
    info!("   Listening on {}", listener.local_addr()?);
    info!("   Press Ctrl+C to shutdown gracefully");

    axum::serve(listener, app(handle.state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Keystone Server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received SIGTERM");
        },
    }
    info!("Shutdown signal received, draining connections...");
}
