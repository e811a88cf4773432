//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! hostsettings.json + environment variables
//!     → host.rs (host layer, HostSettings for logging/metrics)
//!     → loader.rs (ConfigAssembler)
//!         files.rs     appsettings.json, appsettings.<env>.json, ...
//!         template.rs  values.json + placeholder substitution
//!         tree.rs      deep merge, later layers win
//!     → ConfigTree (read-only, shared via Arc with every component)
//!     → shared.rs (shared-libraries:<name> sections handed to libraries)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once assembled; no reload
//! - Every file is optional; a malformed file aborts startup
//! - Keys keep their spelling; lookups, merges and binding ignore case
//! - Unresolved placeholders pass through untouched

pub mod files;
pub mod host;
pub mod loader;
pub mod shared;
pub mod template;
pub mod tree;

pub use host::{HostSettings, LogFormat, LoggingSettings, MetricsSettings, WebSettings};
pub use loader::{ConfigAssembler, ConfigError};
pub use shared::{ConfigurationProvider, TypedConfigurationProvider};
pub use template::{PlaceholderPattern, TemplateValues};
pub use tree::{ConfigSection, ConfigTree};
