//! Component start/stop coordination.
//!
//! # Start
//! ```text
//! factories ──create (caller thread, in order)──▶ components
//!     → hostbox-start thread: start() each, in order
//!     → first fault or panic resolves Failed, finishing resolves AllStarted
//!     → cancel token resolves Cancelled if nothing else did
//! ```
//!
//! # Stop
//! ```text
//! take components (second stop is a no-op)
//!     → hostbox-stop thread: stop() each, in order, never skipping
//!     → Stopped, or Failed with every fault
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::component::Component;
use crate::config::ConfigTree;
use crate::error::{ComponentFault, HostError};
use crate::lifecycle::outcome::{self, StartOutcome, StopOutcome};
use crate::loading::{DiscoveredFactory, ModuleLoader};
use crate::observability::metrics;

const START_THREAD_NAME: &str = "hostbox-start";
const STOP_THREAD_NAME: &str = "hostbox-stop";

struct ManagedComponent {
    label: String,
    component: Arc<dyn Component>,
}

/// Creates, starts and stops the components of one host.
#[derive(Default)]
pub struct LifecycleCoordinator {
    components: Mutex<Vec<ManagedComponent>>,
}

impl LifecycleCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of components created and not yet stopped.
    pub fn component_count(&self) -> usize {
        self.lock_components().len()
    }

    pub async fn start(
        &self,
        factories: &[DiscoveredFactory],
        configuration: Arc<ConfigTree>,
        loader: Arc<dyn ModuleLoader>,
        cancel: &CancellationToken,
    ) -> Result<StartOutcome, HostError> {
        let mut created = Vec::with_capacity(factories.len());
        for discovered in factories {
            let label = discovered.label();
            let component = discovered
                .factory
                .create_component(loader.clone(), configuration.clone())
                .map_err(|source| HostError::ComponentConstruction {
                    factory: label.clone(),
                    source,
                })?;
            tracing::debug!(component = %label, "Created component");
            created.push(ManagedComponent { label, component });
        }

        if created.is_empty() {
            tracing::info!("No components to start");
            return Ok(StartOutcome::AllStarted);
        }

        let batch: Vec<_> = created
            .iter()
            .map(|m| (m.label.clone(), m.component.clone()))
            .collect();
        *self.lock_components() = created;

        let (resolver, waiter) = outcome::channel();
        let started_at = Instant::now();
        thread::Builder::new()
            .name(START_THREAD_NAME.to_string())
            .spawn(move || {
                for (label, component) in batch {
                    tracing::debug!(component = %label, "Starting component");
                    let fault = match panic::catch_unwind(AssertUnwindSafe(|| component.start())) {
                        Ok(Ok(())) => {
                            metrics::record_component_start();
                            continue;
                        }
                        Ok(Err(error)) => ComponentFault::new(label, error),
                        Err(payload) => ComponentFault::from_panic(label, payload),
                    };
                    metrics::record_component_fault("start");
                    tracing::error!(component = %fault.component, error = %fault.error, "Component failed to start");
                    resolver.resolve(StartOutcome::Failed(fault));
                    return;
                }
                resolver.resolve(StartOutcome::AllStarted);
            })
            .map_err(HostError::Dispatch)?;

        let outcome = waiter
            .wait(cancel, || StartOutcome::Cancelled)
            .await
            .unwrap_or(StartOutcome::Cancelled);
        metrics::record_phase_duration("start", started_at.elapsed());
        Ok(outcome)
    }

    pub async fn stop(&self, cancel: &CancellationToken) -> StopOutcome {
        let components = std::mem::take(&mut *self.lock_components());
        if components.is_empty() {
            return StopOutcome::Stopped;
        }

        let (resolver, waiter) = outcome::channel();
        let started_at = Instant::now();
        let spawned = thread::Builder::new()
            .name(STOP_THREAD_NAME.to_string())
            .spawn(move || {
                let mut faults = Vec::new();
                for managed in components {
                    tracing::debug!(component = %managed.label, "Stopping component");
                    let fault = match panic::catch_unwind(AssertUnwindSafe(|| managed.component.stop())) {
                        Ok(Ok(())) => continue,
                        Ok(Err(error)) => ComponentFault::new(managed.label, error),
                        Err(payload) => ComponentFault::from_panic(managed.label, payload),
                    };
                    metrics::record_component_fault("stop");
                    tracing::warn!(component = %fault.component, error = %fault.error, "Component failed to stop");
                    faults.push(fault);
                }
                if faults.is_empty() {
                    resolver.resolve(StopOutcome::Stopped);
                } else {
                    resolver.resolve(StopOutcome::Failed(faults));
                }
            });

        if let Err(error) = spawned {
            let fault = ComponentFault::new(STOP_THREAD_NAME, Box::new(error));
            return StopOutcome::Failed(vec![fault]);
        }

        let outcome = waiter
            .wait(cancel, || StopOutcome::Cancelled)
            .await
            .unwrap_or(StopOutcome::Cancelled);
        metrics::record_phase_duration("stop", started_at.elapsed());
        outcome
    }

    fn lock_components(&self) -> std::sync::MutexGuard<'_, Vec<ManagedComponent>> {
        match self.components.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
