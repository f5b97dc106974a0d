//! Where the registry learns which modules are enabled.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{PluginError, PluginResult};

/// A module as reported by the module management API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnabledModule {
    #[serde(alias = "moduleId")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    /// Frontend plugins the server loaded for this module.
    #[serde(default)]
    pub plugins: Vec<PluginSummary>,
}

/// Server-side description of a frontend plugin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSummary {
    pub id: String,
    pub name: String,
    pub version: String,
    pub route: String,
    pub icon: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[async_trait]
pub trait EnabledModulesSource: Send + Sync + fmt::Debug {
    /// Modules that are currently enabled on the server.
    async fn enabled_modules(&self) -> PluginResult<Vec<EnabledModule>>;
}

/// Fetches `GET {base_url}/modules` and keeps the enabled entries.
#[derive(Debug, Clone)]
pub struct HttpModulesSource {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpModulesSource {
    /// `base_url` is the API root, e.g. `http://localhost:3001/api`.
    pub fn new(base_url: impl Into<String>) -> PluginResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

#[async_trait]
impl EnabledModulesSource for HttpModulesSource {
    async fn enabled_modules(&self) -> PluginResult<Vec<EnabledModule>> {
        let url = format!("{}/modules", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PluginError::Source(format!("{url} returned {status}")));
        }

        let modules: Vec<EnabledModule> = response.json().await?;
        tracing::debug!(url = %url, total = modules.len(), "Fetched module list");
        Ok(modules.into_iter().filter(|m| m.enabled).collect())
    }
}

/// A fixed list of enabled modules.
#[derive(Debug, Clone, Default)]
pub struct StaticModulesSource {
    modules: Vec<EnabledModule>,
}

impl StaticModulesSource {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            modules: ids
                .into_iter()
                .map(|id| EnabledModule {
                    id: id.into(),
                    name: None,
                    enabled: true,
                    plugins: Vec::new(),
                })
                .collect(),
        }
    }

    /// Attach a plugin summary to an already listed module.
    pub fn with_plugin(mut self, module_id: &str, plugin: PluginSummary) -> Self {
        if let Some(module) = self.modules.iter_mut().find(|m| m.id == module_id) {
            module.plugins.push(plugin);
        }
        self
    }
}

#[async_trait]
impl EnabledModulesSource for StaticModulesSource {
    async fn enabled_modules(&self) -> PluginResult<Vec<EnabledModule>> {
        Ok(self.modules.clone())
    }
}
