//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

pub const ENV_LOG_FORMAT: &str = "KEYSTONE_LOG_FORMAT";

const DEFAULT_DIRECTIVES: &str = "info,keystone_server=info,keystone_modules=info";

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` overrides the default filter. `KEYSTONE_LOG_FORMAT=json`
/// switches to JSON lines. Calling this twice is harmless.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let json = std::env::var(ENV_LOG_FORMAT).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Tracing subscriber already installed");
    }
}
