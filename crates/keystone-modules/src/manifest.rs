//! Module manifest parsing (`manifest.json`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File name of the manifest inside every module directory.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Reserved dependency id for the core platform. Always considered present.
pub const CORE_MODULE_ID: &str = "core";

/// Static descriptor of a feature module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleManifest {
    /// Display name. Required.
    #[serde(default)]
    pub name: String,

    /// Module version. Required.
    #[serde(default)]
    pub version: String,

    pub category: Option<String>,

    pub author: Option<String>,

    pub description: Option<String>,

    /// Ids of modules that must be loaded before this one.
    #[serde(default, rename = "depends", alias = "dependsOn")]
    pub depends: Vec<String>,

    /// Only installable modules are eligible for enabling.
    #[serde(default)]
    pub installable: bool,

    pub backend: Option<BackendManifest>,

    pub frontend: Option<FrontendManifest>,
}

/// Backend files contributed by a module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendManifest {
    #[serde(default)]
    pub controllers: Vec<String>,

    #[serde(default)]
    pub services: Vec<String>,

    #[serde(default)]
    pub models: Vec<String>,

    /// Route declarations. Informational; routes are served by controllers.
    #[serde(default)]
    pub routes: Vec<RouteDeclaration>,

    /// Provider names the module expects the host to expose.
    #[serde(default)]
    pub providers: Vec<String>,
}

/// Frontend files contributed by a module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendManifest {
    #[serde(default)]
    pub plugins: Vec<String>,

    #[serde(default)]
    pub components: Vec<String>,
}

/// A declared backend route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDeclaration {
    pub path: String,
    pub method: RouteMethod,
    pub controller: String,
    pub action: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl std::fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let method = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        };
        f.write_str(method)
    }
}

impl ModuleManifest {
    /// Load a manifest from a directory containing `manifest.json`.
    ///
    /// Fails when the file cannot be read, is not valid JSON, or lacks
    /// `name`/`version`.
    pub fn load(dir: &Path) -> Result<Self, ManifestError> {
        let manifest_path = dir.join(MANIFEST_FILENAME);
        let contents = std::fs::read_to_string(&manifest_path).map_err(|e| ManifestError::Io {
            path: manifest_path.clone(),
            source: e,
        })?;
        Self::parse(&contents, &manifest_path)
    }

    /// Async variant of [`ModuleManifest::load`] used by the scanner.
    pub async fn load_async(dir: &Path) -> Result<Self, ManifestError> {
        let manifest_path = dir.join(MANIFEST_FILENAME);
        let contents = tokio::fs::read_to_string(&manifest_path)
            .await
            .map_err(|e| ManifestError::Io {
                path: manifest_path.clone(),
                source: e,
            })?;
        Self::parse(&contents, &manifest_path)
    }

    /// Parse manifest JSON. `origin` is only used for error messages.
    pub fn parse(contents: &str, origin: &Path) -> Result<Self, ManifestError> {
        let mut manifest: Self =
            serde_json::from_str(contents).map_err(|e| ManifestError::Parse {
                path: origin.to_path_buf(),
                source: e,
            })?;

        for (field, value) in [("name", &manifest.name), ("version", &manifest.version)] {
            if value.trim().is_empty() {
                return Err(ManifestError::MissingField {
                    path: origin.to_path_buf(),
                    field,
                });
            }
        }

        manifest.dedup_depends();
        Ok(manifest)
    }

    /// Declared dependencies excluding the reserved core id.
    pub fn module_dependencies(&self) -> impl Iterator<Item = &str> {
        self.depends
            .iter()
            .map(String::as_str)
            .filter(|dep| *dep != CORE_MODULE_ID)
    }

    pub fn controllers(&self) -> &[String] {
        self.backend.as_ref().map_or(&[], |b| &b.controllers)
    }

    pub fn services(&self) -> &[String] {
        self.backend.as_ref().map_or(&[], |b| &b.services)
    }

    pub fn models(&self) -> &[String] {
        self.backend.as_ref().map_or(&[], |b| &b.models)
    }

    pub fn frontend_plugins(&self) -> &[String] {
        self.frontend.as_ref().map_or(&[], |f| &f.plugins)
    }

    /// Problems a module author should fix. Empty when the manifest is sound.
    ///
    /// Checks that declared unit files exist under `base_dir` and that the
    /// module does not depend on itself.
    pub fn validate(&self, base_dir: &Path) -> Vec<String> {
        let mut errors = Vec::new();
        let module_id = base_dir.file_name().map(|n| n.to_string_lossy().into_owned());

        if let Some(id) = &module_id {
            if self.depends.iter().any(|dep| dep == id) {
                errors.push(format!("module '{id}' depends on itself"));
            }
        }

        let units = [
            ("controller", self.controllers()),
            ("service", self.services()),
            ("model", self.models()),
            ("frontend plugin", self.frontend_plugins()),
        ];
        for (kind, paths) in units {
            for path in paths {
                if !base_dir.join(path).is_file() {
                    errors.push(format!("{kind} '{path}' does not exist"));
                }
            }
        }

        errors
    }

    /// `depends` is an ordered set: keep the first occurrence of each id.
    fn dedup_depends(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.depends.retain(|dep| seen.insert(dep.clone()));
    }
}

/// Errors that can occur during manifest loading.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{path} is missing required field '{field}'")]
    MissingField { path: PathBuf, field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_manifest() {
        let json = r#"{
            "name": "Sales Orders",
            "version": "1.0.0",
            "category": "sales",
            "depends": ["core", "contacts"],
            "installable": true,
            "backend": {
                "controllers": ["./backend/controllers/sales_order.rs"],
                "services": ["./backend/services/sales_order.rs"],
                "routes": [
                    {"path": "/sales-orders", "method": "get", "controller": "SalesOrderController", "action": "findAll"}
                ]
            },
            "frontend": { "plugins": ["./frontend/plugin.rs"] }
        }"#;
        let manifest = ModuleManifest::parse(json, Path::new("manifest.json")).unwrap();
        assert_eq!(manifest.name, "Sales Orders");
        assert_eq!(manifest.category.as_deref(), Some("sales"));
        assert!(manifest.installable);
        assert_eq!(manifest.controllers().len(), 1);
        assert_eq!(manifest.services().len(), 1);
        assert!(manifest.models().is_empty());
        assert_eq!(manifest.frontend_plugins().len(), 1);
        let backend = manifest.backend.as_ref().unwrap();
        assert_eq!(backend.routes[0].method, RouteMethod::Get);
        let deps: Vec<_> = manifest.module_dependencies().collect();
        assert_eq!(deps, vec!["contacts"]);
    }

    #[test]
    fn test_depends_on_alias_and_dedup() {
        let json = r#"{"name": "a", "version": "1", "dependsOn": ["b", "c", "b"]}"#;
        let manifest = ModuleManifest::parse(json, Path::new("manifest.json")).unwrap();
        assert_eq!(manifest.depends, vec!["b", "c"]);
        assert!(!manifest.installable);
    }

    #[test]
    fn test_missing_version_is_rejected() {
        let json = r#"{"name": "a", "installable": true}"#;
        let err = ModuleManifest::parse(json, Path::new("manifest.json")).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::MissingField {
                field: "version",
                ..
            }
        ));
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let json = r#"{"name": "  ", "version": "1.0.0"}"#;
        let err = ModuleManifest::parse(json, Path::new("manifest.json")).unwrap_err();
        assert!(err.to_string().contains("'name'"));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = ModuleManifest::parse("{ not json", Path::new("x/manifest.json")).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
        assert!(err.to_string().contains("x/manifest.json"));
    }

    #[test]
    fn test_load_manifest_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(MANIFEST_FILENAME),
            r#"{"name": "reporting", "version": "0.2.0", "installable": true}"#,
        )
        .unwrap();

        let manifest = ModuleManifest::load(dir.path()).unwrap();
        assert_eq!(manifest.name, "reporting");
    }

    #[test]
    fn test_load_missing_manifest_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModuleManifest::load(dir.path()).unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }

    #[test]
    fn test_validate_reports_missing_units() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("reporting");
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::write(dir.join("src/controller.rs"), "").unwrap();

        let manifest: ModuleManifest = serde_json::from_value(serde_json::json!({
            "name": "Reporting",
            "version": "1.0.0",
            "depends": ["reporting"],
            "backend": {
                "controllers": ["./src/controller.rs"],
                "services": ["./src/service.rs"]
            }
        }))
        .unwrap();

        let errors = manifest.validate(&dir);
        assert_eq!(
            errors,
            vec![
                "module 'reporting' depends on itself".to_string(),
                "service './src/service.rs' does not exist".to_string(),
            ]
        );
    }
}
