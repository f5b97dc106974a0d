//! Server configuration.
//!
//! Looked up in precedence order:
//! 1. `./keystone.toml` (project-local)
//! 2. `~/.config/keystone.toml` (user-global)
//!
//! Defaults apply when neither exists. `KEYSTONE_*` environment variables are
//! applied on top.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use keystone_modules::ModulesConfig;
use serde::Deserialize;

const CONFIG_FILENAME: &str = "keystone.toml";
const GLOBAL_CONFIG_DIR: &str = ".config";

pub const ENV_MODULES_PATH: &str = "KEYSTONE_MODULES_PATH";
pub const ENV_ENVIRONMENT: &str = "KEYSTONE_ENV";
pub const ENV_JWT_SECRET: &str = "KEYSTONE_JWT_SECRET";
pub const ENV_BIND_ADDRESS: &str = "KEYSTONE_BIND_ADDRESS";
pub const ENV_STORE_PATH: &str = "KEYSTONE_STORE_PATH";

fn default_bind_address() -> String {
    "0.0.0.0:3001".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid bind address '{0}'")]
    BindAddress(String),

    #[error("Authentication is enabled but no JWT secret is configured (set {ENV_JWT_SECRET})")]
    MissingJwtSecret,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AuthConfig {
    /// Require a bearer token on `/api` routes.
    #[serde(default)]
    pub enabled: bool,

    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KeystoneConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Deployment environment, e.g. `development` or `production`.
    pub environment: Option<String>,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub modules: ModulesConfig,
}

impl Default for KeystoneConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            environment: None,
            auth: AuthConfig::default(),
            modules: ModulesConfig::default(),
        }
    }
}

impl KeystoneConfig {
    /// Discover, parse, apply process environment overrides, and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match find_config_file() {
            Some(path) => Self::from_file(&path)?,
            None => {
                tracing::debug!("No config file found, using defaults");
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(?path, "Loaded server config");
        Ok(config)
    }

    /// Apply `KEYSTONE_*` overrides read through `lookup`. Empty values are
    /// ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(paths) = var(ENV_MODULES_PATH) {
            self.modules.set_module_path_list(&paths);
        }
        if let Some(environment) = var(ENV_ENVIRONMENT) {
            self.environment = Some(environment);
        }
        if let Some(secret) = var(ENV_JWT_SECRET) {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(address) = var(ENV_BIND_ADDRESS) {
            self.bind_address = address;
        }
        if let Some(store) = var(ENV_STORE_PATH) {
            self.modules.store_path = Some(store);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if self.auth.enabled && self.jwt_secret().is_none() {
            return Err(ConfigError::MissingJwtSecret);
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address
            .parse()
            .map_err(|_| ConfigError::BindAddress(self.bind_address.clone()))
    }

    /// The secret used to verify bearer tokens, when authentication is on.
    pub fn jwt_secret(&self) -> Option<&str> {
        self.auth
            .jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
    }

    pub fn auto_enable(&self) -> bool {
        self.modules.auto_enable_for(self.environment.as_deref())
    }
}

fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.is_file() {
        return Some(local);
    }

    let home = std::env::var("HOME").ok().map(PathBuf::from)?;
    let global = home.join(GLOBAL_CONFIG_DIR).join(CONFIG_FILENAME);
    global.is_file().then_some(global)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = KeystoneConfig::default();
        assert_eq!(config.bind_address, "0.0.0.0:3001");
        assert!(!config.auth.enabled);
        assert!(config.auto_enable());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let config: KeystoneConfig = toml::from_str(
            r#"
bind-address = "127.0.0.1:8080"
environment = "production"

[auth]
enabled = true
jwt-secret = "s3cret"

[modules]
module-paths = ["./modules"]
store-path = "./data/modules.json"
"#,
        )
        .unwrap();

        assert_eq!(config.socket_addr().unwrap().port(), 8080);
        assert_eq!(config.jwt_secret(), Some("s3cret"));
        assert_eq!(config.modules.module_paths, vec!["./modules"]);
        assert!(!config.auto_enable());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_MODULES_PATH, "/opt/modules"),
            (ENV_ENVIRONMENT, "staging"),
            (ENV_JWT_SECRET, "from-env"),
            (ENV_BIND_ADDRESS, "127.0.0.1:9000"),
            (ENV_STORE_PATH, ""),
        ]);
        let mut config = KeystoneConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.modules.module_paths, vec!["/opt/modules"]);
        assert_eq!(config.environment.as_deref(), Some("staging"));
        assert_eq!(config.jwt_secret(), Some("from-env"));
        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert!(config.modules.store_path.is_none());
    }

    #[test]
    fn test_auth_without_secret_is_invalid() {
        let mut config = KeystoneConfig::default();
        config.auth.enabled = true;
        assert!(matches!(config.validate(), Err(ConfigError::MissingJwtSecret)));
    }

    #[test]
    fn test_invalid_bind_address() {
        let config = KeystoneConfig {
            bind_address: "not-an-address".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::BindAddress(_))));
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "bind-address = [").unwrap();
        assert!(matches!(
            KeystoneConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    #[serial_test::serial]
    fn test_load_reads_process_environment() {
        std::env::set_var(ENV_BIND_ADDRESS, "127.0.0.1:7001");
        let config = KeystoneConfig::load();
        std::env::remove_var(ENV_BIND_ADDRESS);

        assert_eq!(config.unwrap().bind_address, "127.0.0.1:7001");
    }
}
