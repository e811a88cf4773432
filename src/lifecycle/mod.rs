//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Start (coordinator.rs):
//!     Create components → start on hostbox-start → StartOutcome (outcome.rs)
//!
//! Stop (coordinator.rs):
//!     Stop on hostbox-stop → StopOutcome (outcome.rs)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger (shutdown.rs)
//!     second signal  → forced shutdown, stop wait cancelled
//! ```
//!
//! # Design Decisions
//! - Components start in discovery order on one dedicated thread
//! - The first start fault fails the whole host
//! - Stop faults are collected, never skipped, never fatal
//! - Cancelling the start wait does not stop components already started

pub mod coordinator;
pub mod outcome;
pub mod shutdown;
pub mod signals;

pub use coordinator::LifecycleCoordinator;
pub use outcome::{StartOutcome, StopOutcome};
pub use shutdown::Shutdown;
