//! Component discovery.

use std::fmt;

use crate::component::ComponentFactory;
use crate::loading::module::LoadedModule;

/// A factory together with the module that exported it.
pub struct DiscoveredFactory {
    pub module: String,
    pub factory: Box<dyn ComponentFactory>,
}

impl DiscoveredFactory {
    /// `module/factory`, used in logs and fault reports.
    pub fn label(&self) -> String {
        format!("{}/{}", self.module, self.factory.name())
    }
}

impl fmt::Debug for DiscoveredFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DiscoveredFactory").field(&self.label()).finish()
    }
}

/// Collect every factory exported by `modules`, in module order and then
/// declaration order. That order is the start order.
pub fn discover(modules: &[LoadedModule]) -> Vec<DiscoveredFactory> {
    let mut discovered = Vec::new();
    for module in modules {
        let factories = module.module().component_factories();
        if factories.is_empty() {
            tracing::debug!(module = %module.name(), "Module exports no component factories");
            continue;
        }
        for factory in factories {
            tracing::debug!(module = %module.name(), factory = %factory.name(), "Discovered component factory");
            discovered.push(DiscoveredFactory {
                module: module.name().to_string(),
                factory,
            });
        }
    }
    discovered
}
