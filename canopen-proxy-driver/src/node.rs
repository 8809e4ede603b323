//! Capabilities the proxy needs from the node hosting it.
//!
//! The proxy wires its topics and services through [`NodeInterface`] only, so
//! a host framework plugs in by implementing these few methods once.
//! [`crate::communication::LocalNode`] is the in-process implementation.

use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("topic {topic} already carries {existing}")]
    TypeMismatch { topic: String, existing: &'static str },
    #[error("service {0} already exists")]
    ServiceExists(String),
    #[error("service {0} not found")]
    ServiceNotFound(String),
    #[error("service {service} failed: {reason}")]
    HandlerFailed { service: String, reason: String },
}

/// Sending end of a topic.
pub trait Publisher<T>: Send + Sync {
    fn publish(&self, message: T) -> Result<(), TransportError>;
}

/// Publish/subscribe and request/response primitives of a host node.
pub trait NodeInterface {
    /// Node name, used as the namespace of every topic and service.
    fn name(&self) -> &str;

    fn create_publisher<T>(
        &self,
        topic: &str,
        depth: usize,
    ) -> Result<Arc<dyn Publisher<T>>, TransportError>
    where
        T: Clone + Send + Sync + 'static;

    /// Deliver every message published on `topic` to `callback`.
    fn create_subscription<T, F>(
        &self,
        topic: &str,
        depth: usize,
        callback: F,
    ) -> Result<(), TransportError>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(T) + Send + Sync + 'static;

    /// Serve requests on `name`. The handler may block the calling thread.
    fn create_service<Req, Resp, F>(&self, name: &str, handler: F) -> Result<(), TransportError>
    where
        Req: Send + 'static,
        Resp: Send + 'static,
        F: Fn(Req) -> Resp + Send + Sync + 'static;
}
