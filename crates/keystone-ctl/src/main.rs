//! # keystone-ctl
//!
//! Administration of feature modules without a running server. State changes
//! go to the configured module store and take effect on the next server
//! start.
//!
//! ```bash
//! keystone-ctl modules list
//! keystone-ctl modules validate ./modules/sales-order
//! keystone-ctl modules enable sales-order
//! keystone-ctl auth token --subject admin
//! ```

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "keystone-ctl", version, about = "Keystone module administration")]
#[command(styles = output::clap_styles())]
pub(crate) struct Cli {
    /// Module root to scan; repeat for several. Overrides config and
    /// KEYSTONE_MODULES_PATH.
    #[arg(long = "module-path", global = true)]
    module_paths: Vec<String>,

    /// JSON file holding persisted module state.
    #[arg(long, global = true, env = "KEYSTONE_STORE_PATH")]
    store: Option<String>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Inspect and change module state
    #[command(subcommand)]
    Modules(ModuleCommands),

    /// API credentials
    #[command(subcommand)]
    Auth(AuthCommands),
}

#[derive(Debug, Subcommand)]
pub(crate) enum ModuleCommands {
    /// List discovered modules with their persisted status
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Check a module directory's manifest and declared files
    Validate {
        /// Module directory containing manifest.json
        path: String,
    },
    /// Print the dependency-respecting load order
    Order,
    /// Enable a module and persist the change
    Enable { id: String },
    /// Disable a module and persist the change
    Disable { id: String },
}

#[derive(Debug, Subcommand)]
pub(crate) enum AuthCommands {
    /// Mint an HS256 bearer token for the module API
    Token {
        /// Token subject
        #[arg(long, default_value = "admin")]
        subject: String,

        /// Signing secret; defaults to the configured secret
        #[arg(long, env = "KEYSTONE_JWT_SECRET", hide_env_values = true)]
        secret: Option<String>,

        /// Hours until the token expires
        #[arg(long, default_value_t = 24)]
        expiry_hours: i64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = commands::run(cli).await {
        output::error(&e);
        std::process::exit(1);
    }
}
