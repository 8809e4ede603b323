//! Diagnostic status of the proxied device.
//!
//! The proxy decides *what* is reported (severity, message, keyed value);
//! aggregation and publishing belong to the [`DiagnosticCollector`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Key under which the device state is stored.
pub const DEVICE_KEY: &str = "DEVICE";
/// Key under which the NMT state label is stored.
pub const NMT_KEY: &str = "NMT";
/// Key under which the last emergency is stored.
pub const EMCY_KEY: &str = "EMCY";

/// Severity of a diagnostic status, ordered from healthy to stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    #[default]
    Ok,
    Warn,
    Error,
    Stale,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Ok => "OK",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Stale => "STALE",
        };
        f.write_str(text)
    }
}

/// Sink for diagnostic entries, shared with the component that reports them.
///
/// Writes are best effort: they cannot fail from the caller's point of view.
pub trait DiagnosticCollector: Send + Sync {
    /// Set the overall summary and the value stored under `key` at once.
    fn update_all(&self, level: DiagnosticLevel, message: &str, key: &str, value: &str);

    fn level(&self) -> DiagnosticLevel;

    fn message(&self) -> String;

    fn value(&self, key: &str) -> Option<String>;
}

#[derive(Debug, Default)]
struct CollectorState {
    level: DiagnosticLevel,
    message: String,
    values: HashMap<String, String>,
}

/// Thread-safe in-memory [`DiagnosticCollector`].
#[derive(Debug, Default)]
pub struct DiagnosticsCollector {
    state: Mutex<CollectorState>,
}

impl DiagnosticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self, level: DiagnosticLevel, message: &str) {
        let mut state = self.lock();
        state.level = level;
        state.message = message.to_string();
    }

    pub fn add(&self, key: &str, value: &str) {
        self.lock().values.insert(key.to_string(), value.to_string());
    }

    // A panicking writer must not take diagnostics down with it
    fn lock(&self) -> MutexGuard<'_, CollectorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DiagnosticCollector for DiagnosticsCollector {
    fn update_all(&self, level: DiagnosticLevel, message: &str, key: &str, value: &str) {
        let mut state = self.lock();
        state.level = level;
        state.message = message.to_string();
        state.values.insert(key.to_string(), value.to_string());
    }

    fn level(&self) -> DiagnosticLevel {
        self.lock().level
    }

    fn message(&self) -> String {
        self.lock().message.clone()
    }

    fn value(&self, key: &str) -> Option<String> {
        self.lock().values.get(key).cloned()
    }
}

/// Point-in-time view of the device diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticSnapshot {
    pub level: DiagnosticLevel,
    pub message: String,
    pub device_state: String,
    pub nmt_state: String,
    pub emcy_state: String,
}

impl DiagnosticSnapshot {
    /// Read the current summary and the device / NMT / EMCY entries.
    pub fn compose(collector: &dyn DiagnosticCollector) -> Self {
        let value = |key: &str| collector.value(key).unwrap_or_default();
        Self {
            level: collector.level(),
            message: collector.message(),
            device_state: value(DEVICE_KEY),
            nmt_state: value(NMT_KEY),
            emcy_state: value(EMCY_KEY),
        }
    }

    /// Named entries in reporting order.
    pub fn entries(&self) -> [(&'static str, &str); 3] {
        [
            ("device_state", self.device_state.as_str()),
            ("nmt_state", self.nmt_state.as_str()),
            ("emcy_state", self.emcy_state.as_str()),
        ]
    }
}
