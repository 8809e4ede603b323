//! # Mock CANopen Node
//!
//! An in-memory CANopen slave for exercising the proxy driver without a bus.
//!
//! The slave keeps a small object dictionary with identity and simulated
//! sensor objects, runs the NMT slave state machine, and answers SDO
//! transactions through the `CanopenDriver` interface.

pub mod driver;
pub mod nmt_slave;
pub mod object_dictionary;

pub use driver::{MockDriver, TPDO1_MAPPING};
pub use nmt_slave::NmtSlave;
pub use object_dictionary::{Access, ObjectDictionary, ObjectEntry};
