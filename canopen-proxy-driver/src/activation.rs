//! Activation gating.
//!
//! Whether the proxy may touch the bus is decided by the lifecycle owner of
//! the device session. The proxy only ever reads the decision.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Read-only view of the device session's activation state.
pub trait ActivationGate: Send + Sync {
    fn is_activated(&self) -> bool;
}

impl ActivationGate for AtomicBool {
    fn is_activated(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

/// Shared activation flag, held by whoever drives the device lifecycle.
///
/// Clones share the same flag, so the owner keeps one handle to flip it and
/// passes another to the proxy as its [`ActivationGate`].
#[derive(Debug, Clone, Default)]
pub struct ActivationFlag(Arc<AtomicBool>);

impl ActivationFlag {
    pub fn new(activated: bool) -> Self {
        Self(Arc::new(AtomicBool::new(activated)))
    }

    pub fn activate(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn deactivate(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ActivationGate for ActivationFlag {
    fn is_activated(&self) -> bool {
        self.0.is_activated()
    }
}
