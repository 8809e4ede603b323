//! Instrumented stand-in for a CANopen master driver.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use canopen_common::{
    completion, CanopenDriver, CoData, NmtCallback, NmtCommand, NmtState, RegisterAddress,
    RpdoCallback, SdoCompletion, SdoError,
};
use canopen_proxy_driver::{ActivationFlag, DiagnosticsCollector, LocalNode, ProxyDriver};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Read(RegisterAddress),
    Write(CoData),
    Nmt(NmtCommand),
    Tpdo(CoData),
}

/// What the next SDO transactions resolve to.
#[derive(Debug, Clone)]
pub enum Outcome {
    Value(u32),
    Fail(SdoError),
    /// Drop the completion without answering.
    Hangup,
    /// Panic while starting the transaction.
    Panic,
}

pub struct StubDriver {
    node_id: u8,
    latency: Duration,
    outcome: Mutex<Outcome>,
    write_accepted: Mutex<bool>,
    calls: Mutex<Vec<Call>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    nmt_callback: Mutex<Option<NmtCallback>>,
    rpdo_callback: Mutex<Option<RpdoCallback>>,
}

impl StubDriver {
    pub fn new(latency: Duration) -> Self {
        Self {
            node_id: 0x04,
            latency,
            outcome: Mutex::new(Outcome::Value(0)),
            write_accepted: Mutex::new(true),
            calls: Mutex::new(Vec::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            nmt_callback: Mutex::new(None),
            rpdo_callback: Mutex::new(None),
        }
    }

    pub fn set_outcome(&self, outcome: Outcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn set_write_accepted(&self, accepted: bool) {
        *self.write_accepted.lock().unwrap() = accepted;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Highest number of SDO transactions observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn emit_nmt(&self, state: NmtState) {
        if let Some(callback) = self.nmt_callback.lock().unwrap().as_ref() {
            callback(state);
        }
    }

    pub fn emit_rpdo(&self, data: CoData) {
        if let Some(callback) = self.rpdo_callback.lock().unwrap().as_ref() {
            callback(data);
        }
    }

    fn begin_transaction<T: Send + 'static>(
        &self,
        call: Call,
        answer: impl FnOnce(Outcome) -> Option<Result<T, SdoError>> + Send + 'static,
    ) -> SdoCompletion<T> {
        let outcome = self.outcome.lock().unwrap().clone();
        if let Outcome::Panic = outcome {
            panic!("driver fault while starting {:?}", call);
        }
        self.calls.lock().unwrap().push(call);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let (resolver, pending) = completion();
        let in_flight = self.in_flight.clone();
        let latency = self.latency;
        thread::spawn(move || {
            thread::sleep(latency);
            in_flight.fetch_sub(1, Ordering::SeqCst);
            if let Some(result) = answer(outcome) {
                let _ = resolver.send(result);
            }
        });
        pending
    }
}

impl CanopenDriver for StubDriver {
    fn node_id(&self) -> u8 {
        self.node_id
    }

    fn async_sdo_read(&self, address: RegisterAddress) -> SdoCompletion<u32> {
        self.begin_transaction(Call::Read(address), |outcome| match outcome {
            Outcome::Value(value) => Some(Ok(value)),
            Outcome::Fail(e) => Some(Err(e)),
            Outcome::Hangup | Outcome::Panic => None,
        })
    }

    fn async_sdo_write(&self, data: CoData) -> SdoCompletion<bool> {
        let accepted = *self.write_accepted.lock().unwrap();
        self.begin_transaction(Call::Write(data), move |outcome| match outcome {
            Outcome::Value(_) => Some(Ok(accepted)),
            Outcome::Fail(e) => Some(Err(e)),
            Outcome::Hangup | Outcome::Panic => None,
        })
    }

    fn nmt_command(&self, command: NmtCommand) {
        self.calls.lock().unwrap().push(Call::Nmt(command));
    }

    fn tpdo_transmit(&self, data: CoData) {
        self.calls.lock().unwrap().push(Call::Tpdo(data));
    }

    fn set_nmt_callback(&self, callback: NmtCallback) {
        *self.nmt_callback.lock().unwrap() = Some(callback);
    }

    fn set_rpdo_callback(&self, callback: RpdoCallback) {
        *self.rpdo_callback.lock().unwrap() = Some(callback);
    }
}

pub struct Fixture {
    pub driver: Arc<StubDriver>,
    pub activation: ActivationFlag,
    pub diagnostics: Arc<DiagnosticsCollector>,
    pub proxy: Arc<ProxyDriver>,
}

impl Fixture {
    pub fn new(latency: Duration) -> Self {
        let driver = Arc::new(StubDriver::new(latency));
        let activation = ActivationFlag::new(true);
        let diagnostics = Arc::new(DiagnosticsCollector::new());
        let proxy = Arc::new(ProxyDriver::new(
            driver.clone(),
            Arc::new(activation.clone()),
            diagnostics.clone(),
        ));
        Self {
            driver,
            activation,
            diagnostics,
            proxy,
        }
    }

    /// Fixture with the proxy wired into a fresh `LocalNode` named `device`.
    pub fn wired(latency: Duration) -> (Self, LocalNode) {
        let fixture = Self::new(latency);
        let node = LocalNode::new("device", tokio::runtime::Handle::current());
        fixture.proxy.init(&node).unwrap();
        (fixture, node)
    }
}
