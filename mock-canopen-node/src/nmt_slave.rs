//! NMT state machine of the simulated slave.

use canopen_common::{NmtCommand, NmtState};

#[derive(Debug)]
pub struct NmtSlave {
    state: NmtState,
}

impl Default for NmtSlave {
    fn default() -> Self {
        Self::new()
    }
}

impl NmtSlave {
    pub fn new() -> Self {
        Self {
            state: NmtState::Bootup,
        }
    }

    pub fn state(&self) -> NmtState {
        self.state
    }

    pub fn is_operational(&self) -> bool {
        self.state == NmtState::Start
    }

    /// Power-on: boot-up message, then pre-operational.
    pub fn boot(&mut self) -> Vec<NmtState> {
        self.enter(vec![NmtState::Bootup, NmtState::PreOp])
    }

    /// Apply a master command, returning every state passed through in order.
    pub fn apply(&mut self, command: NmtCommand) -> Vec<NmtState> {
        let states = match command {
            NmtCommand::Start => vec![NmtState::Start],
            NmtCommand::Stop => vec![NmtState::Stop],
            NmtCommand::EnterPreOp => vec![NmtState::PreOp],
            NmtCommand::ResetNode => vec![NmtState::ResetNode, NmtState::Bootup, NmtState::PreOp],
            NmtCommand::ResetComm => vec![NmtState::ResetComm, NmtState::Bootup, NmtState::PreOp],
        };
        self.enter(states)
    }

    fn enter(&mut self, states: Vec<NmtState>) -> Vec<NmtState> {
        if let Some(last) = states.last() {
            self.state = *last;
        }
        states
    }
}
