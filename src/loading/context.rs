//! Per-resolver load context.
//!
//! Holds every module loaded for one host. Modules compile against this
//! crate, so the configuration types and [`ModuleManifest`] they see are the
//! host's own; there is no second copy to reconcile.
//!
//! [`ModuleManifest`]: crate::loading::ModuleManifest

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;

use crate::loading::catalog::ModuleCatalog;
use crate::loading::module::{BareModule, LoadedModule, ModuleLoader};

/// The set of modules loaded by one resolver.
#[derive(Debug)]
pub struct LoadContext {
    catalog: ModuleCatalog,
    loaded: DashMap<String, LoadedModule>,
}

impl LoadContext {
    pub fn new(catalog: ModuleCatalog) -> Self {
        Self {
            catalog,
            loaded: DashMap::new(),
        }
    }

    /// Load `name` from `path`, or return the module already loaded under
    /// that name.
    pub fn load(&self, name: &str, path: &Path) -> LoadedModule {
        let key = name.to_lowercase();
        let entry = self.loaded.entry(key.clone()).or_insert_with(|| {
            let module = match self.catalog.get(&key) {
                Some(module) => {
                    tracing::debug!(module = %key, path = %path.display(), "Loaded module");
                    module
                }
                None => {
                    tracing::debug!(module = %key, path = %path.display(), "Loaded bare module");
                    Arc::new(BareModule)
                }
            };
            LoadedModule::new(&key, path, module)
        });

        if entry.path() != path {
            tracing::debug!(
                module = %key,
                requested = %path.display(),
                loaded = %entry.path().display(),
                "Module already loaded from another path"
            );
        }
        entry.value().clone()
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}

impl ModuleLoader for LoadContext {
    fn module(&self, name: &str) -> Option<LoadedModule> {
        self.loaded.get(&name.to_lowercase()).map(|m| m.value().clone())
    }

    fn module_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.loaded.iter().map(|m| m.key().clone()).collect();
        names.sort();
        names
    }
}
