//! Object dictionary addressing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one entry of a device's object dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegisterAddress {
    pub index: u16,
    pub subindex: u8,
}

impl RegisterAddress {
    pub const fn new(index: u16, subindex: u8) -> Self {
        Self { index, subindex }
    }
}

impl fmt::Display for RegisterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}:{:02X}", self.index, self.subindex)
    }
}

impl From<(u16, u8)> for RegisterAddress {
    fn from((index, subindex): (u16, u8)) -> Self {
        Self::new(index, subindex)
    }
}

/// An (index, subindex, value) triple as carried by SDO writes and PDOs.
///
/// The value is passed through untouched, no byte order conversion happens
/// at this level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoData {
    pub index: u16,
    pub subindex: u8,
    pub data: u32,
}

impl CoData {
    pub const fn new(index: u16, subindex: u8, data: u32) -> Self {
        Self { index, subindex, data }
    }

    pub fn from_address(address: RegisterAddress, data: u32) -> Self {
        Self::new(address.index, address.subindex, data)
    }

    pub fn address(&self) -> RegisterAddress {
        RegisterAddress::new(self.index, self.subindex)
    }
}

impl fmt::Display for CoData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.address(), self.data)
    }
}
