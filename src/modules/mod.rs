//! Modules linked into the `hostbox` binary.

pub mod heartbeat;
pub mod status;

use crate::loading::ModuleCatalog;

/// Catalog of every module the binary ships with.
pub fn builtin_catalog() -> ModuleCatalog {
    ModuleCatalog::new()
        .with_module(heartbeat::MODULE_NAME, heartbeat::HeartbeatModule)
        .with_module(status::MODULE_NAME, status::StatusModule)
}
