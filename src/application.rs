//! The hosted application.
//!
//! Glues the phases together once modules are resolved and configuration
//! is assembled: shared-library configuration, then component start, and
//! later component stop.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::shared::apply_shared_library_configuration;
use crate::config::ConfigTree;
use crate::error::{error_chain, HostError};
use crate::lifecycle::{LifecycleCoordinator, StartOutcome, StopOutcome};
use crate::loading::{discover, DiscoveredFactory, LoadedModules, ModuleLoader};

pub struct Application {
    modules: LoadedModules,
    factories: Vec<DiscoveredFactory>,
    configuration: Arc<ConfigTree>,
    coordinator: LifecycleCoordinator,
}

impl Application {
    /// Discover factories in `modules`' dependencies.
    pub fn new(modules: LoadedModules, configuration: ConfigTree) -> Self {
        let factories = discover(&modules.dependencies);
        tracing::info!(
            module = %modules.entry.name(),
            factories = factories.len(),
            "Discovered component factories"
        );
        Self {
            modules,
            factories,
            configuration: Arc::new(configuration),
            coordinator: LifecycleCoordinator::new(),
        }
    }

    pub fn modules(&self) -> &LoadedModules {
        &self.modules
    }

    pub fn factories(&self) -> &[DiscoveredFactory] {
        &self.factories
    }

    pub fn configuration(&self) -> Arc<ConfigTree> {
        self.configuration.clone()
    }

    /// Configure shared libraries, then create and start every component.
    pub async fn start(&self, cancel: &CancellationToken) -> Result<(), HostError> {
        apply_shared_library_configuration(&self.modules.dependencies, &self.configuration)?;

        let loader: Arc<dyn ModuleLoader> = self.modules.context.clone();
        let outcome = self
            .coordinator
            .start(&self.factories, self.configuration.clone(), loader, cancel)
            .await?;

        match outcome {
            StartOutcome::AllStarted => {
                tracing::trace!("Application started.");
                Ok(())
            }
            StartOutcome::Failed(fault) => Err(HostError::ComponentStart(fault)),
            StartOutcome::Cancelled => Err(HostError::StartCancelled),
        }
    }

    /// Stop every component. Faults are logged, never returned.
    pub async fn stop(&self, cancel: &CancellationToken) -> StopOutcome {
        tracing::trace!("Application stopping.");
        let outcome = self.coordinator.stop(cancel).await;
        match &outcome {
            StopOutcome::Stopped => {}
            StopOutcome::Failed(faults) => {
                for fault in faults {
                    tracing::error!(error = %error_chain(fault), "Component stop faulted");
                }
            }
            StopOutcome::Cancelled => tracing::warn!("Component stop was cancelled"),
        }
        tracing::trace!("Application stopped.");
        outcome
    }
}
