//! Payloads of the proxy driver's services.
//!
//! Topics carry plain `String` (NMT state labels) and [`crate::CoData`]
//! (PDO values); the request/response pairs below are used by services.

use serde::{Deserialize, Serialize};

use crate::co_data::{CoData, RegisterAddress};

/// SDO read request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoReadRequest {
    pub index: u16,
    pub subindex: u8,
}

impl CoReadRequest {
    pub const fn new(index: u16, subindex: u8) -> Self {
        Self { index, subindex }
    }

    pub fn address(&self) -> RegisterAddress {
        RegisterAddress::new(self.index, self.subindex)
    }
}

/// SDO read response. `data` is meaningless when `success` is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoReadResponse {
    pub success: bool,
    pub data: u32,
}

/// SDO write request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoWriteRequest {
    pub index: u16,
    pub subindex: u8,
    pub data: u32,
}

impl From<CoWriteRequest> for CoData {
    fn from(request: CoWriteRequest) -> Self {
        CoData::new(request.index, request.subindex, request.data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CoWriteResponse {
    pub success: bool,
}

/// Argument-less request, used by the NMT command services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TriggerRequest;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub success: bool,
    pub message: String,
}
