//! Module discovery by scanning module roots.
//!
//! Every immediate subdirectory of a root that contains a valid
//! `manifest.json` with `installable: true` becomes a discovered module whose
//! id is the directory name. Broken or non-installable modules are skipped
//! with a log line; a missing root yields nothing.

use std::collections::{HashMap, HashSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ModuleError, ModuleResult};
use crate::manifest::ModuleManifest;
use crate::metadata::ModuleMetadata;

/// Walks module roots and produces discovered modules.
#[derive(Debug, Clone)]
pub struct ModuleScanner {
    roots: Vec<PathBuf>,
}

/// Result of a first-level dependency check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyCheck {
    pub module_id: String,
    pub missing: Vec<String>,
}

impl DependencyCheck {
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
    }
}

impl ModuleScanner {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Discover modules under every root, in root order.
    ///
    /// Ids must be unique across roots: the first root that provides an id
    /// wins and later duplicates are skipped with a warning. Only an
    /// unexpected failure to list a root aborts discovery.
    pub async fn discover(&self) -> ModuleResult<Vec<ModuleMetadata>> {
        let mut modules = Vec::new();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        for root in &self.roots {
            let found = scan_root(root).await?;
            tracing::debug!(?root, count = found.len(), "Scanned module root");

            for module in found {
                if let Some(first) = seen.get(&module.id) {
                    tracing::warn!(
                        module_id = %module.id,
                        kept = ?first,
                        skipped = ?module.path,
                        "Duplicate module id, keeping the first discovered"
                    );
                    continue;
                }
                seen.insert(module.id.clone(), module.path.clone());
                modules.push(module);
            }
        }

        tracing::info!(
            count = modules.len(),
            roots = self.roots.len(),
            "Module discovery complete"
        );
        Ok(modules)
    }

    /// Check a module's declared dependencies against `available`.
    ///
    /// Only first-level dependencies are checked; the reserved core id is
    /// always present.
    pub fn validate_dependencies<'a>(
        module: &ModuleMetadata,
        available: impl IntoIterator<Item = &'a ModuleMetadata>,
    ) -> DependencyCheck {
        let available: HashSet<&str> = available.into_iter().map(|m| m.id.as_str()).collect();
        let missing = module
            .manifest
            .module_dependencies()
            .filter(|dep| !available.contains(dep))
            .map(str::to_string)
            .collect();

        DependencyCheck {
            module_id: module.id.clone(),
            missing,
        }
    }
}

async fn scan_root(root: &Path) -> ModuleResult<Vec<ModuleMetadata>> {
    match tokio::fs::metadata(root).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            tracing::debug!(?root, "Module root is not a directory, skipping");
            return Ok(Vec::new());
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(?root, "Module root does not exist, skipping");
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(ModuleError::Scan {
                path: root.to_path_buf(),
                source: e,
            })
        }
    }

    let mut entries = tokio::fs::read_dir(root)
        .await
        .map_err(|e| ModuleError::Scan {
            path: root.to_path_buf(),
            source: e,
        })?;

    let mut candidates = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                return Err(ModuleError::Scan {
                    path: root.to_path_buf(),
                    source: e,
                })
            }
        };

        let path = entry.path();
        // Follows symlinks so linked workspace packages are picked up.
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => {
                candidates.push((entry.file_name().to_string_lossy().into_owned(), path));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(?path, error = %e, "Skipping unreadable module directory");
            }
        }
    }

    // Directory listing order is platform dependent.
    candidates.sort_by(|a, b| a.0.cmp(&b.0));

    let mut modules = Vec::new();
    for (module_id, dir) in candidates {
        let manifest = match ModuleManifest::load_async(&dir).await {
            Ok(manifest) => manifest,
            Err(e) => {
                tracing::warn!(module_id = %module_id, error = %e, "Skipping module: invalid manifest");
                continue;
            }
        };

        if !manifest.installable {
            tracing::info!(module_id = %module_id, "Skipping module: not installable");
            continue;
        }

        let path = tokio::fs::canonicalize(&dir).await.unwrap_or(dir);
        tracing::debug!(
            module_id = %module_id,
            version = %manifest.version,
            ?path,
            "Discovered module"
        );
        modules.push(ModuleMetadata::discovered(module_id, path, manifest));
    }

    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MANIFEST_FILENAME;
    use std::fs;

    fn write_module(root: &Path, id: &str, manifest: &str) -> PathBuf {
        let dir = root.join(id);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILENAME), manifest).unwrap();
        dir
    }

    fn installable(name: &str, depends: &[&str]) -> String {
        let deps: Vec<String> = depends.iter().map(|d| format!("\"{d}\"")).collect();
        format!(
            r#"{{"name": "{name}", "version": "1.0.0", "installable": true, "depends": [{}]}}"#,
            deps.join(", ")
        )
    }

    #[tokio::test]
    async fn test_discover_installable_modules() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "reporting", &installable("Reporting", &[]));
        write_module(dir.path(), "core-extras", &installable("Extras", &[]));

        let scanner = ModuleScanner::new(vec![dir.path().to_path_buf()]);
        let modules = scanner.discover().await.unwrap();

        let ids: Vec<_> = modules.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["core-extras", "reporting"]);
        assert!(modules.iter().all(|m| !m.enabled && !m.installed));
        assert!(modules[0].path.is_absolute());
    }

    #[tokio::test]
    async fn test_discover_missing_root_is_empty() {
        let scanner = ModuleScanner::new(vec![PathBuf::from("/nonexistent/modules")]);
        assert!(scanner.discover().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_discover_skips_files_and_broken_manifests() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), "not a module").unwrap();
        write_module(dir.path(), "broken", "{ nope");
        write_module(dir.path(), "no-version", r#"{"name": "x", "installable": true}"#);
        fs::create_dir(dir.path().join("empty")).unwrap();
        write_module(dir.path(), "good", &installable("Good", &[]));

        let scanner = ModuleScanner::new(vec![dir.path().to_path_buf()]);
        let modules = scanner.discover().await.unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].id, "good");
    }

    #[tokio::test]
    async fn test_discover_excludes_non_installable() {
        let dir = tempfile::tempdir().unwrap();
        write_module(
            dir.path(),
            "draft",
            r#"{"name": "Draft", "version": "0.1.0", "installable": false}"#,
        );
        write_module(dir.path(), "implicit", r#"{"name": "Implicit", "version": "0.1.0"}"#);

        let scanner = ModuleScanner::new(vec![dir.path().to_path_buf()]);
        assert!(scanner.discover().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_discover_first_root_wins_on_duplicate_id() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write_module(first.path(), "sales", &installable("First", &[]));
        write_module(second.path(), "sales", &installable("Second", &[]));
        write_module(second.path(), "stock", &installable("Stock", &[]));

        let scanner = ModuleScanner::new(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        let modules = scanner.discover().await.unwrap();

        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].manifest.name, "First");
        assert_eq!(modules[1].id, "stock");
    }

    #[tokio::test]
    async fn test_validate_dependencies() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "a", &installable("A", &["core", "b", "missing"]));
        write_module(dir.path(), "b", &installable("B", &[]));

        let scanner = ModuleScanner::new(vec![dir.path().to_path_buf()]);
        let modules = scanner.discover().await.unwrap();

        let check = ModuleScanner::validate_dependencies(&modules[0], &modules);
        assert!(!check.is_valid());
        assert_eq!(check.missing, vec!["missing"]);

        let check = ModuleScanner::validate_dependencies(&modules[1], &modules);
        assert!(check.is_valid());
    }
}
