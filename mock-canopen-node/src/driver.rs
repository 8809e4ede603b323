//! In-memory master driver talking to the simulated slave.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use canopen_common::{
    completion, CanopenDriver, CoData, NmtCallback, NmtCommand, NmtState, RegisterAddress,
    RpdoCallback, SdoCompletion, SdoError,
};
use log::{debug, info, warn};
use tokio::task::JoinHandle;

use crate::nmt_slave::NmtSlave;
use crate::object_dictionary::ObjectDictionary;

/// Objects mapped into the simulated TPDO1 of the slave.
pub const TPDO1_MAPPING: [RegisterAddress; 3] = [
    RegisterAddress::new(0x2000, 0x01),
    RegisterAddress::new(0x2000, 0x02),
    RegisterAddress::new(0x6041, 0x00),
];

/// Simulated slave behind a [`CanopenDriver`].
///
/// SDO transactions are answered from the object dictionary after the
/// configured latency, on a separate thread so that they complete
/// asynchronously like on a real bus. A stopped slave does not answer SDOs,
/// which surfaces as a timeout.
pub struct MockDriver {
    node_id: u8,
    latency: Duration,
    dictionary: Arc<Mutex<ObjectDictionary>>,
    nmt: Mutex<NmtSlave>,
    nmt_callback: Mutex<Option<NmtCallback>>,
    rpdo_callback: Mutex<Option<RpdoCallback>>,
    transmitted: Mutex<Vec<CoData>>,
}

impl MockDriver {
    pub fn new(node_id: u8, dictionary: ObjectDictionary) -> Self {
        Self {
            node_id,
            latency: Duration::ZERO,
            dictionary: Arc::new(Mutex::new(dictionary)),
            nmt: Mutex::new(NmtSlave::new()),
            nmt_callback: Mutex::new(None),
            rpdo_callback: Mutex::new(None),
            transmitted: Mutex::new(Vec::new()),
        }
    }

    /// Slave populated with the standard test objects.
    pub fn with_test_objects(node_id: u8) -> Self {
        let mut dictionary = ObjectDictionary::new();
        dictionary.add_test_objects_for_node(node_id);
        Self::new(node_id, dictionary)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Power the slave on, reporting boot-up and pre-operational.
    pub fn boot(&self) {
        let states = lock(&self.nmt).boot();
        self.notify_nmt(&states);
    }

    pub fn nmt_state(&self) -> NmtState {
        lock(&self.nmt).state()
    }

    /// Values received by the slave through its RPDOs, oldest first.
    pub fn transmitted(&self) -> Vec<CoData> {
        lock(&self.transmitted).clone()
    }

    pub fn dictionary_summary(&self) -> Vec<String> {
        lock(&self.dictionary).summary()
    }

    /// Deliver a value as if the slave had sent it in a TPDO.
    pub fn emit_rpdo(&self, data: CoData) {
        if let Some(callback) = lock(&self.rpdo_callback).as_ref() {
            callback(data);
        }
    }

    /// Broadcast [`TPDO1_MAPPING`] every `interval` on the current runtime.
    pub fn spawn_tpdo_broadcaster(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(self.clone().broadcast_tpdos(interval, TPDO1_MAPPING.to_vec()))
    }

    /// Periodically send the mapped objects while the slave is operational.
    pub async fn broadcast_tpdos(self: Arc<Self>, period: Duration, mapping: Vec<RegisterAddress>) {
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;
            if !lock(&self.nmt).is_operational() {
                continue;
            }

            let values: Vec<CoData> = {
                let dictionary = lock(&self.dictionary);
                mapping
                    .iter()
                    .filter_map(|address| {
                        dictionary
                            .read(*address)
                            .ok()
                            .map(|value| CoData::from_address(*address, value))
                    })
                    .collect()
            };
            for data in values {
                self.emit_rpdo(data);
            }
        }
    }

    fn notify_nmt(&self, states: &[NmtState]) {
        let callback = lock(&self.nmt_callback);
        for state in states {
            debug!("Node 0x{:X}: NMT state {:?}", self.node_id, state);
            if let Some(callback) = callback.as_ref() {
                callback(*state);
            }
        }
    }

    fn transact<T, F>(&self, job: F) -> SdoCompletion<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut ObjectDictionary) -> Result<T, SdoError> + Send + 'static,
    {
        let (resolver, pending) = completion();

        if lock(&self.nmt).state() == NmtState::Stop {
            // Dropping the resolver would read as a lost link; a silent slave times out
            let _ = resolver.send(Err(SdoError::Timeout));
            return pending;
        }

        if self.latency.is_zero() {
            let _ = resolver.send(job(&mut lock(&self.dictionary)));
            return pending;
        }

        let dictionary = self.dictionary.clone();
        let latency = self.latency;
        thread::spawn(move || {
            thread::sleep(latency);
            let result = job(&mut lock(&dictionary));
            if resolver.send(result).is_err() {
                warn!("SDO answer dropped, requester went away");
            }
        });
        pending
    }
}

impl CanopenDriver for MockDriver {
    fn node_id(&self) -> u8 {
        self.node_id
    }

    fn async_sdo_read(&self, address: RegisterAddress) -> SdoCompletion<u32> {
        self.transact(move |dictionary| dictionary.read(address))
    }

    fn async_sdo_write(&self, data: CoData) -> SdoCompletion<bool> {
        self.transact(move |dictionary| dictionary.write(data.address(), data.data).map(|()| true))
    }

    fn nmt_command(&self, command: NmtCommand) {
        info!("Node 0x{:X}: NMT command {:?}", self.node_id, command);
        let states = lock(&self.nmt).apply(command);
        self.notify_nmt(&states);
    }

    fn tpdo_transmit(&self, data: CoData) {
        if !lock(&self.dictionary).store(data.address(), data.data) {
            debug!(
                "Node 0x{:X}: {} is generated by the slave, PDO value ignored",
                self.node_id,
                data.address()
            );
        }
        lock(&self.transmitted).push(data);
    }

    fn set_nmt_callback(&self, callback: NmtCallback) {
        *lock(&self.nmt_callback) = Some(callback);
    }

    fn set_rpdo_callback(&self, callback: RpdoCallback) {
        *lock(&self.rpdo_callback) = Some(callback);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdo_read_answers_from_dictionary() {
        let driver = MockDriver::with_test_objects(5).with_latency(Duration::from_millis(2));

        let value = driver.async_sdo_read(RegisterAddress::new(0x1018, 0x04)).blocking_recv();
        assert_eq!(value, Ok(Ok(5)));

        let missing = driver.async_sdo_read(RegisterAddress::new(0x5000, 0x00)).blocking_recv();
        assert_eq!(missing, Ok(Err(SdoError::aborted(0x0602_0000))));
    }

    #[test]
    fn sdo_write_updates_dictionary() {
        let driver = MockDriver::with_test_objects(5);

        let accepted = driver.async_sdo_write(CoData::new(0x2003, 0x01, 7)).blocking_recv();
        assert_eq!(accepted, Ok(Ok(true)));
        assert_eq!(
            driver.async_sdo_read(RegisterAddress::new(0x2003, 0x01)).blocking_recv(),
            Ok(Ok(7))
        );
    }

    #[test]
    fn stopped_slave_times_out() {
        let driver = MockDriver::with_test_objects(5);
        driver.nmt_command(NmtCommand::Stop);

        let result = driver.async_sdo_read(RegisterAddress::new(0x1000, 0x00)).blocking_recv();
        assert_eq!(result, Ok(Err(SdoError::Timeout)));
    }

    #[test]
    fn nmt_commands_notify_every_state() {
        let driver = MockDriver::with_test_objects(5);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        driver.set_nmt_callback(Box::new(move |state| sink.lock().unwrap().push(state)));

        driver.boot();
        driver.nmt_command(NmtCommand::Start);
        driver.nmt_command(NmtCommand::ResetNode);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                NmtState::Bootup,
                NmtState::PreOp,
                NmtState::Start,
                NmtState::ResetNode,
                NmtState::Bootup,
                NmtState::PreOp,
            ]
        );
        assert_eq!(driver.nmt_state(), NmtState::PreOp);
    }

    #[test]
    fn tpdo_values_land_in_the_dictionary() {
        let driver = MockDriver::with_test_objects(5);
        driver.tpdo_transmit(CoData::new(0x6040, 0x00, 0x000F));

        assert_eq!(driver.transmitted(), vec![CoData::new(0x6040, 0x00, 0x000F)]);
        assert_eq!(
            driver.async_sdo_read(RegisterAddress::new(0x6040, 0x00)).blocking_recv(),
            Ok(Ok(0x000F))
        );
    }

    #[tokio::test]
    async fn tpdos_are_broadcast_only_when_operational() {
        let driver = Arc::new(MockDriver::with_test_objects(5));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        driver.set_rpdo_callback(Box::new(move |data| {
            let _ = tx.send(data);
        }));

        let task = tokio::spawn(
            driver
                .clone()
                .broadcast_tpdos(Duration::from_millis(5), vec![RegisterAddress::new(0x6041, 0x00)]),
        );

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(rx.try_recv().is_err());

        driver.nmt_command(NmtCommand::Start);
        let data = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        assert_eq!(data, Some(CoData::new(0x6041, 0x00, 0x0250)));

        task.abort();
    }
}
