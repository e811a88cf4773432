//! Heartbeat module: one component that logs at a fixed interval.
//!
//! Configuration (`heartbeat` section):
//!
//! ```json
//! { "heartbeat": { "interval_ms": 1000, "message": "alive" } }
//! ```

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::Deserialize;

use crate::component::{Component, ComponentFactory};
use crate::config::ConfigTree;
use crate::error::BoxError;
use crate::loading::{HostModule, ModuleLoader};

pub const MODULE_NAME: &str = "heartbeat";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeartbeatSettings {
    pub interval_ms: u64,
    pub message: String,
}

impl Default for HeartbeatSettings {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            message: "alive".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct HeartbeatModule;

impl HostModule for HeartbeatModule {
    fn component_factories(&self) -> Vec<Box<dyn ComponentFactory>> {
        vec![Box::new(HeartbeatFactory)]
    }
}

pub struct HeartbeatFactory;

impl ComponentFactory for HeartbeatFactory {
    fn create_component(
        &self,
        loader: Arc<dyn ModuleLoader>,
        configuration: Arc<ConfigTree>,
    ) -> Result<Arc<dyn Component>, BoxError> {
        let settings: HeartbeatSettings = configuration.section("heartbeat").bind_or_default()?;
        if settings.interval_ms == 0 {
            return Err("heartbeat:interval_ms must be greater than zero".into());
        }
        tracing::debug!(modules = ?loader.module_names(), "Heartbeat sees loaded modules");
        Ok(Arc::new(Heartbeat::new(settings)))
    }
}

struct Running {
    stop: Sender<()>,
    worker: JoinHandle<u64>,
}

/// Logs `message` every `interval_ms` on its own thread until stopped.
pub struct Heartbeat {
    settings: HeartbeatSettings,
    running: Mutex<Option<Running>>,
}

impl Heartbeat {
    pub fn new(settings: HeartbeatSettings) -> Self {
        Self {
            settings,
            running: Mutex::new(None),
        }
    }
}

impl Component for Heartbeat {
    fn start(&self) -> Result<(), BoxError> {
        let mut running = self.running.lock().map_err(|_| "heartbeat state poisoned")?;
        if running.is_some() {
            return Err("heartbeat already started".into());
        }

        let (stop, stopped) = mpsc::channel::<()>();
        let interval = Duration::from_millis(self.settings.interval_ms);
        let message = self.settings.message.clone();
        let worker = thread::Builder::new()
            .name("heartbeat".to_string())
            .spawn(move || {
                let mut beats = 0;
                loop {
                    match stopped.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            beats += 1;
                            tracing::info!(beat = beats, "{}", message);
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => return beats,
                    }
                }
            })?;

        *running = Some(Running { stop, worker });
        Ok(())
    }

    fn stop(&self) -> Result<(), BoxError> {
        let running = self.running.lock().map_err(|_| "heartbeat state poisoned")?.take();
        let Some(running) = running else {
            return Ok(());
        };
        let _ = running.stop.send(());
        let beats = running.worker.join().map_err(|_| "heartbeat worker panicked")?;
        tracing::info!(beats, "Heartbeat stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loading::{LoadContext, ModuleCatalog};
    use serde_json::json;

    fn loader() -> Arc<dyn ModuleLoader> {
        Arc::new(LoadContext::new(ModuleCatalog::new()))
    }

    #[test]
    fn test_start_then_stop() {
        let component = Heartbeat::new(HeartbeatSettings {
            interval_ms: 5,
            message: "tick".to_string(),
        });
        component.start().unwrap();
        assert!(component.start().is_err());
        thread::sleep(Duration::from_millis(20));
        component.stop().unwrap();
        component.stop().unwrap();
    }

    #[test]
    fn test_factory_rejects_zero_interval() {
        let tree = ConfigTree::from_value(json!({"heartbeat": {"interval_ms": 0}})).unwrap();
        let result = HeartbeatFactory.create_component(loader(), Arc::new(tree));
        assert!(result.is_err());
    }

    #[test]
    fn test_factory_uses_defaults() {
        let result = HeartbeatFactory.create_component(loader(), Arc::new(ConfigTree::new()));
        assert!(result.is_ok());
        assert_eq!(HeartbeatFactory.name(), "HeartbeatFactory");
    }
}
