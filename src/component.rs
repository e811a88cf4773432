//! Component capabilities.
//!
//! # Lifecycle
//!
//! 1. The host asks each [`ComponentFactory`] for one component, passing
//!    the module loader and the assembled configuration
//! 2. `start()` is called once, on the host's start thread
//! 3. The component runs; internal concurrency is its own concern
//! 4. `stop()` is called once, on the host's stop thread, during shutdown

use std::sync::Arc;

use crate::config::ConfigTree;
use crate::error::BoxError;
use crate::loading::ModuleLoader;

/// A long-lived unit of work managed by the host.
///
/// Both operations are synchronous from the host's point of view. A
/// component that needs to keep running after `start()` returns spawns its
/// own threads or tasks; one that blocks in `start()` delays the components
/// after it.
pub trait Component: Send + Sync {
    fn start(&self) -> Result<(), BoxError>;

    /// Must return on its own; the host does not enforce a timeout.
    fn stop(&self) -> Result<(), BoxError>;
}

/// Produces exactly one [`Component`].
pub trait ComponentFactory: Send + Sync {
    /// Name used in logs and fault reports.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    fn create_component(
        &self,
        loader: Arc<dyn ModuleLoader>,
        configuration: Arc<ConfigTree>,
    ) -> Result<Arc<dyn Component>, BoxError>;
}

fn short_type_name(full: &'static str) -> &'static str {
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}
