//! Module capabilities.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::component::ComponentFactory;
use crate::config::ConfigurationProvider;
use crate::hosting::web::HostingStartup;

/// The registration protocol every module implements.
///
/// Each capability is optional. A shared library usually exposes only a
/// [`ConfigurationProvider`]; a component module exposes factories; the
/// entry module of a web deployment exposes a [`HostingStartup`].
pub trait HostModule: Send + Sync {
    /// Factories exported by this module, in declaration order.
    fn component_factories(&self) -> Vec<Box<dyn ComponentFactory>> {
        Vec::new()
    }

    fn configuration_provider(&self) -> Option<&dyn ConfigurationProvider> {
        None
    }

    fn hosting_startup(&self) -> Option<Arc<dyn HostingStartup>> {
        None
    }
}

/// A module file whose name is not in the catalog.
#[derive(Debug, Default)]
pub struct BareModule;

impl HostModule for BareModule {}

/// A module loaded through a [`LoadContext`](crate::loading::LoadContext).
#[derive(Clone)]
pub struct LoadedModule {
    name: String,
    path: PathBuf,
    module: Arc<dyn HostModule>,
}

impl LoadedModule {
    pub fn new(name: &str, path: impl Into<PathBuf>, module: Arc<dyn HostModule>) -> Self {
        Self {
            name: name.to_lowercase(),
            path: path.into(),
            module,
        }
    }

    /// Lower-cased module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn module(&self) -> &dyn HostModule {
        self.module.as_ref()
    }

    pub fn handle(&self) -> Arc<dyn HostModule> {
        self.module.clone()
    }
}

impl fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModule")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Read-only module lookups handed to components.
pub trait ModuleLoader: Send + Sync {
    /// A module already loaded for this host, by case-insensitive name.
    fn module(&self, name: &str) -> Option<LoadedModule>;

    /// Names of every loaded module, sorted.
    fn module_names(&self) -> Vec<String>;
}
