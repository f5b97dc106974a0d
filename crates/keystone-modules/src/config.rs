//! `[modules]` configuration section.

use std::path::PathBuf;

use serde::Deserialize;

/// Environment value that turns on development behavior.
pub const DEVELOPMENT_ENV: &str = "development";

fn default_module_paths() -> Vec<String> {
    vec!["./modules".to_string(), "./packages".to_string()]
}

/// Where modules are discovered and how their state is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModulesConfig {
    /// Roots scanned for module directories, in precedence order.
    #[serde(default = "default_module_paths")]
    pub module_paths: Vec<String>,

    /// Enable every discovered installable module at boot. When unset this
    /// follows the environment: on in development, off otherwise.
    pub auto_enable: Option<bool>,

    /// JSON file holding persisted module state. In-memory when unset.
    pub store_path: Option<String>,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            module_paths: default_module_paths(),
            auto_enable: None,
            store_path: None,
        }
    }
}

impl ModulesConfig {
    /// Scan roots with `~` expanded.
    pub fn roots(&self) -> Vec<PathBuf> {
        self.module_paths.iter().map(|p| expand_path(p)).collect()
    }

    pub fn store_path(&self) -> Option<PathBuf> {
        self.store_path.as_deref().map(expand_path)
    }

    /// Whether bootstrap should auto-enable modules in `environment`.
    ///
    /// An unset environment counts as development.
    pub fn auto_enable_for(&self, environment: Option<&str>) -> bool {
        self.auto_enable
            .unwrap_or_else(|| environment.is_none_or(|env| env == DEVELOPMENT_ENV))
    }

    /// Replace the scan roots with a platform path list, e.g. the value of
    /// `KEYSTONE_MODULES_PATH`. Empty entries are ignored.
    pub fn set_module_path_list(&mut self, list: &str) {
        let paths: Vec<String> = std::env::split_paths(list)
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        if !paths.is_empty() {
            self.module_paths = paths;
        }
    }
}

/// Expand a configured path, resolving `~/` to the home directory.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modules_section() {
        let config: ModulesConfig = toml::from_str(
            r#"
module-paths = ["./modules", "~/keystone/modules"]
auto-enable = false
store-path = "./data/modules.json"
"#,
        )
        .unwrap();
        assert_eq!(config.module_paths.len(), 2);
        assert_eq!(config.auto_enable, Some(false));
        assert!(!config.roots()[1].to_str().unwrap().starts_with('~'));
        assert_eq!(config.store_path(), Some(PathBuf::from("./data/modules.json")));
    }

    #[test]
    fn test_defaults() {
        let config: ModulesConfig = toml::from_str("").unwrap();
        assert_eq!(config, ModulesConfig::default());
        assert_eq!(
            config.roots(),
            vec![PathBuf::from("./modules"), PathBuf::from("./packages")]
        );
        assert!(config.store_path().is_none());
    }

    #[test]
    fn test_auto_enable_follows_environment() {
        let config = ModulesConfig::default();
        assert!(config.auto_enable_for(None));
        assert!(config.auto_enable_for(Some("development")));
        assert!(!config.auto_enable_for(Some("production")));

        let forced = ModulesConfig {
            auto_enable: Some(true),
            ..Default::default()
        };
        assert!(forced.auto_enable_for(Some("production")));
    }

    #[test]
    fn test_set_module_path_list() {
        let mut config = ModulesConfig::default();
        let list = std::env::join_paths(["/srv/a", "/srv/b"]).unwrap();
        config.set_module_path_list(list.to_str().unwrap());
        assert_eq!(config.module_paths, vec!["/srv/a", "/srv/b"]);

        config.set_module_path_list("");
        assert_eq!(config.module_paths, vec!["/srv/a", "/srv/b"]);
    }

    #[test]
    fn test_expand_path_absolute() {
        assert_eq!(expand_path("/usr/local/modules"), PathBuf::from("/usr/local/modules"));
    }
}
