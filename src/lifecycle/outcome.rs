//! Single-resolution outcome channel.
//!
//! The start and stop threads, and the cancellation path, race to resolve
//! one outcome. The first `resolve` wins; later ones are ignored.

use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::ComponentFault;

/// Aggregated result of starting every component.
#[derive(Debug, Clone)]
pub enum StartOutcome {
    AllStarted,
    Failed(ComponentFault),
    Cancelled,
}

/// Aggregated result of stopping every component.
#[derive(Debug, Clone)]
pub enum StopOutcome {
    Stopped,
    /// Every stop ran; these are the ones that faulted, in stop order.
    Failed(Vec<ComponentFault>),
    Cancelled,
}

/// Create a linked resolver and waiter.
pub fn channel<T>() -> (Resolver<T>, Waiter<T>) {
    let (tx, rx) = oneshot::channel();
    let resolver = Resolver {
        slot: Arc::new(Mutex::new(Some(tx))),
    };
    let waiter = Waiter {
        rx,
        resolver: resolver.clone(),
    };
    (resolver, waiter)
}

/// Write side. Cheap to clone; every clone shares the same slot.
pub struct Resolver<T> {
    slot: Arc<Mutex<Option<oneshot::Sender<T>>>>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T> Resolver<T> {
    /// Resolve the outcome. Returns false if it was already resolved.
    pub fn resolve(&self, value: T) -> bool {
        let sender = match self.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        match sender {
            Some(tx) => {
                let _ = tx.send(value);
                true
            }
            None => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        match self.slot.lock() {
            Ok(slot) => slot.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }
}

/// Read side.
pub struct Waiter<T> {
    rx: oneshot::Receiver<T>,
    resolver: Resolver<T>,
}

impl<T> Waiter<T> {
    /// Wait for the outcome. If `cancel` fires first, resolve with
    /// `on_cancel()`; the value returned is whichever resolution won.
    pub async fn wait(mut self, cancel: &CancellationToken, on_cancel: impl FnOnce() -> T) -> Option<T> {
        tokio::select! {
            result = &mut self.rx => return result.ok(),
            _ = cancel.cancelled() => {}
        }
        self.resolver.resolve(on_cancel());
        self.rx.await.ok()
    }
}
