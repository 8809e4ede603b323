use log::error;

use canopen_common::CoData;

use super::{ProxyDriver, ProxyError};

impl ProxyDriver {
    /// Hand `data` to the driver for transmission in a TPDO.
    pub fn tpdo_transmit(&self, data: CoData) -> Result<(), ProxyError> {
        if !self.is_activated() {
            return Err(ProxyError::NotActivated);
        }
        self.driver.tpdo_transmit(data);
        Ok(())
    }

    /// Value published on the `tpdo` topic.
    pub fn on_tpdo(&self, data: CoData) {
        if self.tpdo_transmit(data).is_err() {
            error!("Could not transmit PDO because driver not activated.");
        }
    }

    /// Value received from the device, republished on `rpdo` as is.
    pub fn on_rpdo(&self, data: CoData) {
        if self.is_activated() {
            Self::publish(&self.rpdo_publisher, "rpdo", data);
        }
    }
}
