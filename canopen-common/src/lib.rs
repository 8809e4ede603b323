//! # CANopen Common Library
//!
//! Shared CANopen types used by the proxy driver and by the mock CANopen
//! node that stands in for a real master driver during testing.
//!
//! This library provides:
//! - Object dictionary addressing and (address, value) payloads
//! - NMT states and commands
//! - SDO error kinds with abort code descriptions
//! - Message payloads exchanged over the proxy's topics and services
//! - The `CanopenDriver` trait the proxy delegates bus work to

pub mod co_data;
pub mod driver;
pub mod messages;
pub mod nmt;
pub mod sdo;

// Re-export commonly used types for convenience
pub use co_data::{CoData, RegisterAddress};
pub use driver::{CanopenDriver, NmtCallback, RpdoCallback};
pub use messages::{
    CoReadRequest, CoReadResponse, CoWriteRequest, CoWriteResponse, TriggerRequest,
    TriggerResponse,
};
pub use nmt::{NmtCommand, NmtState};
pub use sdo::{abort_code_description, completion, SdoCompletion, SdoError, SdoResolver};
