//! Host error taxonomy.
//!
//! Loading and configuration errors abort startup before any component
//! runs. Component start faults fail the whole host. Stop faults are only
//! reported (see [`crate::lifecycle::StopOutcome`]).

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::ConfigError;
use crate::loading::ModuleLoadError;

/// Error type reported by component and module code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A fault raised by one component during start or stop.
#[derive(Debug, Clone)]
pub struct ComponentFault {
    /// Label of the component (`<module>/<factory>`).
    pub component: String,
    /// The underlying error, shared so the fault can be cloned.
    pub error: Arc<dyn std::error::Error + Send + Sync + 'static>,
}

impl ComponentFault {
    pub fn new(component: impl Into<String>, error: BoxError) -> Self {
        Self {
            component: component.into(),
            error: Arc::from(error),
        }
    }

    /// Build a fault from a panic payload caught around component code.
    pub fn from_panic(component: impl Into<String>, payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::new(component, format!("component panicked: {}", message).into())
    }
}

impl fmt::Display for ComponentFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component {} faulted", self.component)
    }
}

impl std::error::Error for ComponentFault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error.as_ref())
    }
}

/// Errors that terminate the host.
#[derive(Debug, Error)]
pub enum HostError {
    /// Module path missing or invalid, or a dependency could not be resolved.
    #[error("module loading failed")]
    ModuleLoad(#[from] ModuleLoadError),

    /// Configuration file set could not be assembled.
    #[error("configuration failed")]
    Configuration(#[from] ConfigError),

    /// A factory failed while building its component.
    #[error("factory {factory} failed to create its component")]
    ComponentConstruction {
        factory: String,
        #[source]
        source: BoxError,
    },

    /// A component faulted while starting.
    #[error("component start failed")]
    ComponentStart(#[source] ComponentFault),

    /// The start wait was cancelled before every component was dispatched.
    #[error("component start was cancelled")]
    StartCancelled,

    /// A shared library rejected its configuration section.
    #[error("shared library {module} rejected its configuration")]
    SharedLibraryConfiguration {
        module: String,
        #[source]
        source: BoxError,
    },

    /// The dedicated lifecycle thread could not be spawned.
    #[error("failed to spawn lifecycle thread")]
    Dispatch(#[source] std::io::Error),

    /// The web host could not bind or serve.
    #[error("web host failed")]
    Web(#[source] std::io::Error),

    /// The logging subsystem could not be initialised.
    #[error("logging initialisation failed: {0}")]
    Logging(String),
}

/// Render an error and every source below it as `a: b: c`.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut current = error.source();
    while let Some(cause) = current {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        current = cause.source();
    }
    rendered
}
