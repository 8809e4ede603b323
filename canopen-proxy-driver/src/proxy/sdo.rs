use std::sync::{MutexGuard, PoisonError};

use log::{error, info};
use tokio::runtime::{Handle, RuntimeFlavor};

use canopen_common::{
    CoData, CoReadRequest, CoReadResponse, CoWriteRequest, CoWriteResponse, RegisterAddress,
    SdoCompletion, SdoError,
};

use super::{ProxyDriver, ProxyError};

impl ProxyDriver {
    /// Read one object dictionary entry over SDO.
    ///
    /// Blocks the calling thread until the driver resolves the transaction;
    /// concurrent callers queue on the SDO slot in no particular order. No
    /// timeout is applied here, bounding latency is up to the driver.
    ///
    /// Safe to call from anywhere. On a multi-thread runtime worker the wait
    /// hands the worker's other tasks off first; on a current-thread runtime
    /// it stalls that runtime until the driver answers, so drivers must not
    /// resolve transactions from tasks of the calling runtime.
    pub fn sdo_read(&self, address: RegisterAddress) -> Result<u32, ProxyError> {
        if !self.is_activated() {
            error!("Could not read from SDO because driver not activated.");
            return Err(ProxyError::NotActivated);
        }
        info!(
            "Slave 0x{:X}: SDO Read Call index=0x{:X} subindex={}",
            self.node_id(),
            address.index,
            address.subindex
        );

        let _slot = self.sdo_slot();
        let pending = self.driver.async_sdo_read(address);
        wait_for(pending).map_err(|e| {
            error!("Slave 0x{:X}: SDO read of {} failed: {}", self.node_id(), address, e);
            ProxyError::Transaction(e)
        })
    }

    /// Write one object dictionary entry over SDO.
    ///
    /// Returns whether the driver reports the download as accepted. Same
    /// blocking behavior as [`ProxyDriver::sdo_read`].
    pub fn sdo_write(&self, data: CoData) -> Result<bool, ProxyError> {
        if !self.is_activated() {
            error!("Could not write to SDO because driver not activated.");
            return Err(ProxyError::NotActivated);
        }
        info!(
            "Slave 0x{:X}: SDO Write Call index=0x{:X} subindex={} data={}",
            self.node_id(),
            data.index,
            data.subindex,
            data.data
        );

        let _slot = self.sdo_slot();
        let pending = self.driver.async_sdo_write(data);
        wait_for(pending).map_err(|e| {
            error!("Slave 0x{:X}: SDO write of {} failed: {}", self.node_id(), data.address(), e);
            ProxyError::Transaction(e)
        })
    }

    pub fn on_sdo_read(&self, request: CoReadRequest) -> CoReadResponse {
        match self.sdo_read(request.address()) {
            Ok(data) => CoReadResponse { success: true, data },
            Err(_) => CoReadResponse::default(),
        }
    }

    pub fn on_sdo_write(&self, request: CoWriteRequest) -> CoWriteResponse {
        CoWriteResponse {
            success: matches!(self.sdo_write(request.into()), Ok(true)),
        }
    }

    // A transaction that panicked still released the bus, keep going
    fn sdo_slot(&self) -> MutexGuard<'_, ()> {
        self.sdo_mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Wait for the driver to resolve a transaction.
///
/// A completion dropped by the driver without an answer means the link to
/// the device is gone.
fn wait_for<T>(pending: SdoCompletion<T>) -> Result<T, SdoError> {
    let answer = match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => {
            tokio::task::block_in_place(|| futures::executor::block_on(pending))
        }
        _ => futures::executor::block_on(pending),
    };
    answer.unwrap_or(Err(SdoError::Disconnected))
}
