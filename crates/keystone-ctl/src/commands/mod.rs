//! Command dispatch.

mod auth;
mod modules;

use keystone_server::KeystoneConfig;

use crate::error::CtlResult;
use crate::{Cli, Commands};

pub(crate) async fn run(cli: Cli) -> CtlResult<()> {
    let mut config = KeystoneConfig::load()?;
    if !cli.module_paths.is_empty() {
        config.modules.module_paths = cli.module_paths;
    }
    if let Some(store) = cli.store {
        config.modules.store_path = Some(store);
    }
    tracing::debug!(roots = ?config.modules.roots(), store = ?config.modules.store_path, "Resolved configuration");

    match cli.command {
        Commands::Modules(cmd) => modules::handle_modules_command(cmd, &config).await,
        Commands::Auth(cmd) => auth::handle_auth_command(cmd, &config),
    }
}
