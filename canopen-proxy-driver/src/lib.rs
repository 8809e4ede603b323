//! # CANopen Proxy Driver
//!
//! Exposes a CANopen slave through topics and services while a
//! [`canopen_common::CanopenDriver`] does the actual bus work:
//!
//! - SDO reads and writes, one transaction in flight at a time
//! - NMT state labels plus diagnostic entries
//! - PDO values relayed in both directions
//! - NMT start / reset commands
//!
//! Every operation is gated on the session's [`activation::ActivationGate`].

pub mod activation;
pub mod communication;
pub mod config;
pub mod diagnostics;
pub mod logging;
pub mod node;
pub mod proxy;

pub use activation::{ActivationFlag, ActivationGate};
pub use communication::LocalNode;
pub use config::{ConfigError, ProxyConfig};
pub use diagnostics::{DiagnosticCollector, DiagnosticLevel, DiagnosticSnapshot, DiagnosticsCollector};
pub use node::{NodeInterface, Publisher, TransportError};
pub use proxy::{NmtStateReport, ProxyDriver, ProxyError};
