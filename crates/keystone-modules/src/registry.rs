//! In-memory registry of discovered, enabled, and loaded modules.
//!
//! The registry is owned by the composition root and handed to the manager;
//! there is no global instance. Discovery order is remembered so listings and
//! the dependency-free tail of the load order are deterministic.

use std::collections::{HashMap, HashSet};

use crate::error::{ModuleError, ModuleResult};
use crate::metadata::{LoadedModule, ModuleMetadata};

#[derive(Debug, Default)]
pub struct ModuleRegistry {
    discovered: HashMap<String, ModuleMetadata>,
    discovery_order: Vec<String>,
    enabled: HashSet<String>,
    loaded: HashMap<String, LoadedModule>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a discovered module. A replaced module keeps its
    /// original position in discovery order.
    pub fn register_discovered(&mut self, module: ModuleMetadata) {
        let id = module.id.clone();
        if self.discovered.insert(id.clone(), module).is_some() {
            tracing::debug!(module_id = %id, "Replacing discovered module");
        } else {
            self.discovery_order.push(id);
        }
    }

    /// Insert or replace a loaded module record.
    ///
    /// A loaded record can only exist for a discovered module.
    pub fn register_loaded(&mut self, module: LoadedModule) -> ModuleResult<()> {
        if !self.discovered.contains_key(module.id()) {
            return Err(ModuleError::not_found(module.id()));
        }
        self.loaded.insert(module.id().to_string(), module);
        Ok(())
    }

    /// Mark a discovered module enabled. Unknown ids are rejected with
    /// `false` and leave the enabled set untouched.
    pub fn enable(&mut self, module_id: &str) -> bool {
        let Some(module) = self.discovered.get_mut(module_id) else {
            return false;
        };
        module.enabled = true;
        self.enabled.insert(module_id.to_string());
        true
    }

    /// Remove a module from the enabled set and drop its loaded record.
    /// Idempotent; always succeeds.
    pub fn disable(&mut self, module_id: &str) -> bool {
        self.enabled.remove(module_id);
        self.loaded.remove(module_id);
        if let Some(module) = self.discovered.get_mut(module_id) {
            module.enabled = false;
        }
        true
    }

    pub fn is_enabled(&self, module_id: &str) -> bool {
        self.enabled.contains(module_id)
    }

    pub fn discovered(&self, module_id: &str) -> Option<&ModuleMetadata> {
        self.discovered.get(module_id)
    }

    /// All discovered modules in discovery order.
    pub fn all_discovered(&self) -> Vec<&ModuleMetadata> {
        self.discovery_order
            .iter()
            .filter_map(|id| self.discovered.get(id))
            .collect()
    }

    /// Enabled modules in discovery order.
    pub fn enabled(&self) -> Vec<&ModuleMetadata> {
        self.all_discovered()
            .into_iter()
            .filter(|m| self.enabled.contains(&m.id))
            .collect()
    }

    pub fn enabled_ids(&self) -> Vec<String> {
        self.enabled().into_iter().map(|m| m.id.clone()).collect()
    }

    pub fn loaded(&self, module_id: &str) -> Option<&LoadedModule> {
        self.loaded.get(module_id)
    }

    /// Loaded modules in discovery order.
    pub fn all_loaded(&self) -> Vec<&LoadedModule> {
        self.discovery_order
            .iter()
            .filter_map(|id| self.loaded.get(id))
            .collect()
    }

    pub fn discovered_count(&self) -> usize {
        self.discovered.len()
    }

    pub fn clear(&mut self) {
        self.discovered.clear();
        self.discovery_order.clear();
        self.enabled.clear();
        self.loaded.clear();
    }

    /// Dependency-respecting order over all discovered modules.
    ///
    /// Depth-first: each module's discovered dependencies are placed before
    /// it. The core id and undiscovered dependencies are skipped. Revisiting
    /// a module that is still being visited is a cycle and fails with
    /// [`ModuleError::CircularDependency`] naming that module.
    pub fn load_order(&self) -> ModuleResult<Vec<String>> {
        let mut order = Vec::with_capacity(self.discovered.len());
        let mut placed = HashSet::new();
        let mut visiting = HashSet::new();

        for id in &self.discovery_order {
            self.visit(id, &mut visiting, &mut placed, &mut order)?;
        }

        Ok(order)
    }

    fn visit(
        &self,
        module_id: &str,
        visiting: &mut HashSet<String>,
        placed: &mut HashSet<String>,
        order: &mut Vec<String>,
    ) -> ModuleResult<()> {
        if placed.contains(module_id) {
            return Ok(());
        }
        if !visiting.insert(module_id.to_string()) {
            return Err(ModuleError::CircularDependency {
                module_id: module_id.to_string(),
            });
        }

        let Some(module) = self.discovered.get(module_id) else {
            visiting.remove(module_id);
            return Ok(());
        };

        for dep in module.manifest.module_dependencies() {
            if self.discovered.contains_key(dep) {
                self.visit(dep, visiting, placed, order)?;
            } else {
                tracing::debug!(module_id, dependency = dep, "Dependency not discovered, not ordered");
            }
        }

        visiting.remove(module_id);
        placed.insert(module_id.to_string());
        order.push(module_id.to_string());
        Ok(())
    }
}
