//! The proxy driver.
//!
//! [`ProxyDriver`] sits between a [`CanopenDriver`] and the outside world:
//! SDO access is serialized through a single slot, NMT states become labels
//! plus diagnostic entries, and PDO values are relayed in both directions.
//! Nothing happens while the session is not activated.

mod nmt;
mod pdo;
mod sdo;

pub use nmt::NmtStateReport;

use std::sync::{Arc, Mutex, OnceLock};

use log::{debug, warn};
use thiserror::Error;

use canopen_common::{
    CanopenDriver, CoData, CoReadRequest, CoWriteRequest, SdoError, TriggerRequest,
};

use crate::activation::ActivationGate;
use crate::diagnostics::{DiagnosticCollector, DiagnosticSnapshot};
use crate::node::{NodeInterface, Publisher, TransportError};

/// Default queue depth of the proxy's topics.
pub const DEFAULT_QUEUE_DEPTH: usize = 10;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("driver not activated")]
    NotActivated,
    #[error("SDO transaction failed: {0}")]
    Transaction(#[from] SdoError),
    #[error("proxy driver already initialized")]
    AlreadyInitialized,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Proxy for one CANopen slave.
pub struct ProxyDriver {
    driver: Arc<dyn CanopenDriver>,
    activation: Arc<dyn ActivationGate>,
    diagnostics: Arc<dyn DiagnosticCollector>,
    queue_depth: usize,

    // Only one SDO transaction may be in flight
    sdo_mutex: Mutex<()>,

    initialized: OnceLock<()>,
    nmt_state_publisher: OnceLock<Arc<dyn Publisher<String>>>,
    rpdo_publisher: OnceLock<Arc<dyn Publisher<CoData>>>,
}

impl ProxyDriver {
    pub fn new(
        driver: Arc<dyn CanopenDriver>,
        activation: Arc<dyn ActivationGate>,
        diagnostics: Arc<dyn DiagnosticCollector>,
    ) -> Self {
        Self {
            driver,
            activation,
            diagnostics,
            queue_depth: DEFAULT_QUEUE_DEPTH,
            sdo_mutex: Mutex::new(()),
            initialized: OnceLock::new(),
            nmt_state_publisher: OnceLock::new(),
            rpdo_publisher: OnceLock::new(),
        }
    }

    pub fn with_queue_depth(mut self, queue_depth: usize) -> Self {
        self.queue_depth = queue_depth;
        self
    }

    pub fn node_id(&self) -> u8 {
        self.driver.node_id()
    }

    pub fn is_activated(&self) -> bool {
        self.activation.is_activated()
    }

    /// Wire topics, services and driver callbacks.
    ///
    /// Creates under the node's namespace:
    /// - `nmt_state` publisher of NMT state labels
    /// - `tpdo` subscription forwarding values to the device
    /// - `rpdo` publisher of values received from the device
    /// - `nmt_reset_node`, `nmt_start_node`, `sdo_read` and `sdo_write` services
    ///
    /// Handlers only hold a weak reference to the proxy; once it is dropped
    /// they answer with failure responses.
    ///
    /// Only the first call does any wiring. If it fails part way, whatever
    /// was registered on `node` before the failure stays registered and
    /// later calls return [`ProxyError::AlreadyInitialized`].
    pub fn init<N: NodeInterface>(self: &Arc<Self>, node: &N) -> Result<(), ProxyError> {
        if self.initialized.set(()).is_err() {
            return Err(ProxyError::AlreadyInitialized);
        }

        let namespace = node.name().to_string();
        let path = |suffix: &str| format!("{}/{}", namespace, suffix);
        let depth = self.queue_depth;

        let nmt_state_publisher = node.create_publisher::<String>(&path("nmt_state"), depth)?;

        let proxy = Arc::downgrade(self);
        node.create_subscription(&path("tpdo"), depth, move |data: CoData| {
            if let Some(proxy) = proxy.upgrade() {
                proxy.on_tpdo(data);
            }
        })?;

        let rpdo_publisher = node.create_publisher::<CoData>(&path("rpdo"), depth)?;

        let proxy = Arc::downgrade(self);
        node.create_service(&path("nmt_reset_node"), move |request: TriggerRequest| {
            proxy
                .upgrade()
                .map(|proxy| proxy.on_nmt_state_reset(request))
                .unwrap_or_default()
        })?;

        let proxy = Arc::downgrade(self);
        node.create_service(&path("nmt_start_node"), move |request: TriggerRequest| {
            proxy
                .upgrade()
                .map(|proxy| proxy.on_nmt_state_start(request))
                .unwrap_or_default()
        })?;

        let proxy = Arc::downgrade(self);
        node.create_service(&path("sdo_read"), move |request: CoReadRequest| {
            proxy
                .upgrade()
                .map(|proxy| proxy.on_sdo_read(request))
                .unwrap_or_default()
        })?;

        let proxy = Arc::downgrade(self);
        node.create_service(&path("sdo_write"), move |request: CoWriteRequest| {
            proxy
                .upgrade()
                .map(|proxy| proxy.on_sdo_write(request))
                .unwrap_or_default()
        })?;

        self.nmt_state_publisher
            .set(nmt_state_publisher)
            .map_err(|_| ProxyError::AlreadyInitialized)?;
        self.rpdo_publisher
            .set(rpdo_publisher)
            .map_err(|_| ProxyError::AlreadyInitialized)?;

        let proxy = Arc::downgrade(self);
        self.driver.set_nmt_callback(Box::new(move |state| {
            if let Some(proxy) = proxy.upgrade() {
                proxy.on_nmt(state);
            }
        }));
        let proxy = Arc::downgrade(self);
        self.driver.set_rpdo_callback(Box::new(move |data| {
            if let Some(proxy) = proxy.upgrade() {
                proxy.on_rpdo(data);
            }
        }));

        debug!("Slave 0x{:X}: proxy wired under {}", self.node_id(), namespace);
        Ok(())
    }

    /// Current diagnostic summary with the device, NMT and EMCY entries.
    pub fn diagnostic_snapshot(&self) -> DiagnosticSnapshot {
        DiagnosticSnapshot::compose(self.diagnostics.as_ref())
    }

    fn publish<T>(publisher: &OnceLock<Arc<dyn Publisher<T>>>, topic: &str, message: T) {
        match publisher.get() {
            Some(publisher) => {
                if let Err(e) = publisher.publish(message) {
                    warn!("Failed to publish on {}: {}", topic, e);
                }
            }
            None => debug!("Dropping {} message, proxy not initialized", topic),
        }
    }
}
