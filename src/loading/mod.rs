//! Module loading subsystem.
//!
//! # Data Flow
//! ```text
//! --path app/entry.bin
//!     → resolver.rs (check the file, read app/entry.deps.json)
//!     → manifest.rs (dependencies for the current runtime identifier)
//!     → context.rs (load each module once, from the catalog)
//!     → discovery.rs (ask every dependency module for its factories)
//!     → Vec<DiscoveredFactory> in start order
//! ```
//!
//! # Design Decisions
//! - Modules register explicitly in a link-time [`ModuleCatalog`]; a file
//!   whose name is not registered loads as a bare module
//! - Loading is two-phase: every module is resolved before any component
//!   is created
//! - The [`LoadContext`] belongs to one resolver; there is no global state
//! - Factories come from dependency modules only, never the entry module

pub mod catalog;
pub mod context;
pub mod discovery;
pub mod manifest;
pub mod module;
pub mod resolver;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use catalog::ModuleCatalog;
pub use context::LoadContext;
pub use discovery::{discover, DiscoveredFactory};
pub use manifest::{DependencyEntry, ModuleManifest, RuntimeIdentifier};
pub use module::{HostModule, LoadedModule, ModuleLoader};
pub use resolver::{LoadedModules, ModuleResolver};

/// Errors raised while resolving modules.
#[derive(Debug, Error)]
pub enum ModuleLoadError {
    #[error("module path {} does not exist", .path.display())]
    NotFound { path: PathBuf },

    #[error("module path {} is not a loadable module file", .path.display())]
    NotAFile { path: PathBuf },

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed dependency manifest {}", .path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("module {module} depends on {dependency}, which was not found (searched {})", display_paths(.searched))]
    UnresolvedDependency {
        module: String,
        dependency: String,
        searched: Vec<PathBuf>,
    },

    #[error("entry module {module} does not provide a hosting startup")]
    MissingHostingStartup { module: String },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
