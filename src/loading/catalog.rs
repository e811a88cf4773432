//! Link-time module registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::loading::module::HostModule;

/// Maps module names to their implementations.
///
/// The host binary builds the catalog from the modules it links; the files
/// on disk decide which of them take part in a deployment.
#[derive(Clone, Default)]
pub struct ModuleCatalog {
    modules: HashMap<String, Arc<dyn HostModule>>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ModuleCatalog::register`].
    pub fn with_module(mut self, name: &str, module: impl HostModule + 'static) -> Self {
        self.register(name, Arc::new(module));
        self
    }

    /// Register a module under a case-insensitive name, replacing any
    /// previous registration.
    pub fn register(&mut self, name: &str, module: Arc<dyn HostModule>) {
        if self.modules.insert(name.to_lowercase(), module).is_some() {
            tracing::warn!(module = %name, "Module registered twice; keeping the last registration");
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn HostModule>> {
        self.modules.get(&name.to_lowercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(&name.to_lowercase())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.modules.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleCatalog").field("modules", &self.names()).finish()
    }
}
