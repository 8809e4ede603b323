//! NMT (network management) states and commands.

use serde::{Deserialize, Serialize};

/// NMT state of a slave as reported by the master driver.
///
/// Raw values follow the codes found in heartbeat / boot-up messages. Codes
/// outside of that set are kept as `Unknown` so that a misbehaving device
/// never makes the conversion fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NmtState {
    Bootup,
    PreOp,
    ResetComm,
    ResetNode,
    Start,
    Stop,
    Toggle,
    Unknown(u8),
}

impl NmtState {
    pub const fn raw(self) -> u8 {
        match self {
            Self::Bootup => 0x00,
            Self::Stop => 0x04,
            Self::Start => 0x05,
            Self::ResetNode => 0x06,
            Self::ResetComm => 0x07,
            Self::PreOp => 0x7F,
            Self::Toggle => 0x80,
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<u8> for NmtState {
    fn from(raw: u8) -> Self {
        match raw {
            0x00 => Self::Bootup,
            0x04 => Self::Stop,
            0x05 => Self::Start,
            0x06 => Self::ResetNode,
            0x07 => Self::ResetComm,
            0x7F => Self::PreOp,
            0x80 => Self::Toggle,
            other => Self::Unknown(other),
        }
    }
}

/// NMT command specifiers sent by the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NmtCommand {
    Start = 0x01,
    Stop = 0x02,
    EnterPreOp = 0x80,
    ResetNode = 0x81,
    ResetComm = 0x82,
}
