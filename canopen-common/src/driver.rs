//! Interface of the CANopen master driver that performs the actual bus work.

use crate::co_data::{CoData, RegisterAddress};
use crate::nmt::{NmtCommand, NmtState};
use crate::sdo::SdoCompletion;

/// Invoked by the driver whenever the slave reports a new NMT state.
pub type NmtCallback = Box<dyn Fn(NmtState) + Send + Sync>;

/// Invoked by the driver for every value received through an RPDO.
pub type RpdoCallback = Box<dyn Fn(CoData) + Send + Sync>;

/// Master-side driver of one CANopen slave.
///
/// SDO transactions are started asynchronously and resolve through the
/// returned [`SdoCompletion`]. Implementations own framing, bus access and
/// any latency bound; callers may wait on a completion indefinitely.
pub trait CanopenDriver: Send + Sync {
    /// Node id of the slave handled by this driver.
    fn node_id(&self) -> u8;

    /// Start an expedited SDO upload of `address`.
    fn async_sdo_read(&self, address: RegisterAddress) -> SdoCompletion<u32>;

    /// Start an SDO download of `data`, resolving to whether the slave accepted it.
    fn async_sdo_write(&self, data: CoData) -> SdoCompletion<bool>;

    fn nmt_command(&self, command: NmtCommand);

    /// Queue `data` for transmission in the matching TPDO.
    fn tpdo_transmit(&self, data: CoData);

    /// Register the NMT state listener, replacing any previous one.
    fn set_nmt_callback(&self, callback: NmtCallback);

    /// Register the RPDO listener, replacing any previous one.
    fn set_rpdo_callback(&self, callback: RpdoCallback);
}
