use log::{error, info};

use canopen_common::{NmtCommand, NmtState, TriggerRequest, TriggerResponse};

use super::{ProxyDriver, ProxyError};
use crate::diagnostics::{DiagnosticLevel, NMT_KEY};

/// How an NMT state is reported: published label plus diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NmtStateReport {
    pub label: &'static str,
    pub level: DiagnosticLevel,
    pub message: &'static str,
}

impl NmtStateReport {
    pub const fn of(state: NmtState) -> Self {
        let (label, level, message) = match state {
            NmtState::Bootup => ("BOOTUP", DiagnosticLevel::Ok, "NMT bootup"),
            NmtState::PreOp => ("PREOP", DiagnosticLevel::Ok, "NMT preop"),
            NmtState::ResetComm => ("RESET_COMM", DiagnosticLevel::Warn, "NMT reset comm"),
            NmtState::ResetNode => ("RESET_NODE", DiagnosticLevel::Warn, "NMT reset node"),
            NmtState::Start => ("START", DiagnosticLevel::Ok, "NMT start"),
            NmtState::Stop => ("STOP", DiagnosticLevel::Ok, "NMT stop"),
            NmtState::Toggle => ("TOGGLE", DiagnosticLevel::Ok, "NMT toggle"),
            NmtState::Unknown(_) => ("ERROR", DiagnosticLevel::Error, "NMT unknown state"),
        };
        Self { label, level, message }
    }
}

impl ProxyDriver {
    /// Report a new NMT state of the slave. Dropped while not activated.
    pub fn on_nmt(&self, state: NmtState) {
        if !self.is_activated() {
            return;
        }

        let report = NmtStateReport::of(state);
        if let NmtState::Unknown(raw) = state {
            error!("Unknown NMT State 0x{:02X}.", raw);
        }
        self.diagnostics
            .update_all(report.level, report.message, NMT_KEY, report.label);
        info!(
            "Slave 0x{:X}: Switched NMT state to {}",
            self.node_id(),
            report.label
        );

        Self::publish(&self.nmt_state_publisher, "nmt_state", report.label.to_string());
    }

    /// Ask the slave to enter operational state.
    pub fn start_node_nmt_command(&self) -> Result<(), ProxyError> {
        if !self.is_activated() {
            error!("Could not start device via NMT because driver not activated.");
            return Err(ProxyError::NotActivated);
        }
        self.driver.nmt_command(NmtCommand::Start);
        Ok(())
    }

    /// Ask the slave to reset. The resulting states arrive through [`ProxyDriver::on_nmt`].
    pub fn reset_node_nmt_command(&self) -> Result<(), ProxyError> {
        if !self.is_activated() {
            error!("Could not reset device via NMT because driver not activated.");
            return Err(ProxyError::NotActivated);
        }
        self.driver.nmt_command(NmtCommand::ResetNode);
        Ok(())
    }

    pub fn on_nmt_state_start(&self, _request: TriggerRequest) -> TriggerResponse {
        trigger_response(self.start_node_nmt_command())
    }

    pub fn on_nmt_state_reset(&self, _request: TriggerRequest) -> TriggerResponse {
        trigger_response(self.reset_node_nmt_command())
    }
}

fn trigger_response(result: Result<(), ProxyError>) -> TriggerResponse {
    match result {
        Ok(()) => TriggerResponse {
            success: true,
            message: String::new(),
        },
        Err(e) => TriggerResponse {
            success: false,
            message: e.to_string(),
        },
    }
}
