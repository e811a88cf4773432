//! hostbox: a generic process host for component modules.

// Core subsystems
pub mod component;
pub mod config;
pub mod loading;

// Hosting
pub mod application;
pub mod cli;
pub mod hosting;
pub mod modules;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use application::Application;
pub use component::{Component, ComponentFactory};
pub use config::{ConfigSection, ConfigTree, ConfigurationProvider};
pub use error::{BoxError, HostError};
pub use hosting::{HostingStartup, WebHostBuilder};
pub use lifecycle::Shutdown;
pub use loading::{HostModule, ModuleCatalog, ModuleLoader};
