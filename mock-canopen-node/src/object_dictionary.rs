//! Object Dictionary for the mock CANopen node
//!
//! This module defines the simulated object dictionary with test data.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use canopen_common::{RegisterAddress, SdoError};
use rand::Rng;

const OBJECT_DOES_NOT_EXIST: u32 = 0x0602_0000;
const READ_OF_WRITE_ONLY: u32 = 0x0601_0001;
const WRITE_OF_READ_ONLY: u32 = 0x0601_0002;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// Represents a single entry in the object dictionary
pub enum ObjectEntry {
    /// Static value, changed only by writes
    Static(u32),
    /// Dynamic value generated on each read
    Dynamic(Box<dyn Fn() -> u32 + Send + Sync>),
}

struct Entry {
    value: ObjectEntry,
    access: Access,
}

/// Object dictionary mapping (index, subindex) to values
#[derive(Default)]
pub struct ObjectDictionary {
    entries: HashMap<RegisterAddress, Entry>,
}

impl ObjectDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a static entry to the dictionary
    pub fn add_static(&mut self, address: RegisterAddress, value: u32, access: Access) {
        self.entries.insert(
            address,
            Entry {
                value: ObjectEntry::Static(value),
                access,
            },
        );
    }

    /// Add a read-only dynamic entry (value generated on each read)
    pub fn add_dynamic<F>(&mut self, address: RegisterAddress, generator: F)
    where
        F: Fn() -> u32 + Send + Sync + 'static,
    {
        self.entries.insert(
            address,
            Entry {
                value: ObjectEntry::Dynamic(Box::new(generator)),
                access: Access::ReadOnly,
            },
        );
    }

    /// SDO upload of one entry
    pub fn read(&self, address: RegisterAddress) -> Result<u32, SdoError> {
        let entry = self
            .entries
            .get(&address)
            .ok_or_else(|| SdoError::aborted(OBJECT_DOES_NOT_EXIST))?;
        if entry.access == Access::WriteOnly {
            return Err(SdoError::aborted(READ_OF_WRITE_ONLY));
        }
        Ok(match &entry.value {
            ObjectEntry::Static(value) => *value,
            ObjectEntry::Dynamic(generator) => generator(),
        })
    }

    /// SDO download of one entry
    pub fn write(&mut self, address: RegisterAddress, value: u32) -> Result<(), SdoError> {
        let entry = self
            .entries
            .get_mut(&address)
            .ok_or_else(|| SdoError::aborted(OBJECT_DOES_NOT_EXIST))?;
        match (&mut entry.value, entry.access) {
            (ObjectEntry::Static(current), Access::ReadWrite | Access::WriteOnly) => {
                *current = value;
                Ok(())
            }
            _ => Err(SdoError::aborted(WRITE_OF_READ_ONLY)),
        }
    }

    /// Store a process value received through a PDO, creating the entry if needed.
    ///
    /// Existing entries keep their SDO access rights. Dynamic entries produce
    /// their own values and are left alone; returns `false` in that case.
    pub fn store(&mut self, address: RegisterAddress, value: u32) -> bool {
        match self.entries.get_mut(&address) {
            Some(Entry { value: ObjectEntry::Static(current), .. }) => {
                *current = value;
                true
            }
            Some(Entry { value: ObjectEntry::Dynamic(_), .. }) => false,
            None => {
                self.add_static(address, value, Access::ReadWrite);
                true
            }
        }
    }

    /// Get number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One line per object, sorted by address
    pub fn summary(&self) -> Vec<String> {
        let mut addresses: Vec<_> = self.entries.keys().copied().collect();
        addresses.sort();

        addresses
            .into_iter()
            .map(|address| {
                let entry = &self.entries[&address];
                let kind = match entry.value {
                    ObjectEntry::Static(_) => "Static",
                    ObjectEntry::Dynamic(_) => "Dynamic",
                };
                format!("{} - {} {:?}", address, kind, entry.access)
            })
            .collect()
    }

    /// Add standard test objects for demonstration
    pub fn add_test_objects_for_node(&mut self, node_id: u8) {
        // 0x1000:00 - Device Type
        self.add_static(RegisterAddress::new(0x1000, 0x00), 0x0000_0191, Access::ReadOnly);

        // 0x1001:00 - Error Register
        self.add_static(RegisterAddress::new(0x1001, 0x00), 0x00, Access::ReadOnly);

        // 0x1017:00 - Producer heartbeat time (ms)
        self.add_static(RegisterAddress::new(0x1017, 0x00), 1000, Access::ReadWrite);

        // 0x1018 - Identity object
        self.add_static(RegisterAddress::new(0x1018, 0x01), 0x0000_0001, Access::ReadOnly);
        self.add_static(RegisterAddress::new(0x1018, 0x02), 0x0000_4D4B, Access::ReadOnly);
        self.add_static(RegisterAddress::new(0x1018, 0x03), 0x0001_0000, Access::ReadOnly);
        self.add_static(RegisterAddress::new(0x1018, 0x04), u32::from(node_id), Access::ReadOnly);

        // 0x2000:01 - Temperature in 1/100 °C, 20.00 to 30.00
        self.add_dynamic(RegisterAddress::new(0x2000, 0x01), || {
            rand::rng().random_range(2000..3000)
        });

        // 0x2000:02 - Pressure in hPa
        self.add_dynamic(RegisterAddress::new(0x2000, 0x02), || {
            rand::rng().random_range(950..1050)
        });

        // 0x2001:01 - Counter (incrementing)
        let counter = Arc::new(AtomicU32::new(0));
        self.add_dynamic(RegisterAddress::new(0x2001, 0x01), move || {
            counter.fetch_add(1, Ordering::SeqCst)
        });

        // 0x2003:01 - Setpoint, 0x2003:02 - Write-only command register
        self.add_static(RegisterAddress::new(0x2003, 0x01), 0x0031, Access::ReadWrite);
        self.add_static(RegisterAddress::new(0x2003, 0x02), 0x0000, Access::WriteOnly);

        // CiA 402 controlword / statusword
        self.add_static(RegisterAddress::new(0x6040, 0x00), 0x0000, Access::ReadWrite);
        self.add_static(RegisterAddress::new(0x6041, 0x00), 0x0250, Access::ReadOnly);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> ObjectDictionary {
        let mut od = ObjectDictionary::new();
        od.add_test_objects_for_node(4);
        od
    }

    #[test]
    fn identity_carries_node_id() {
        let od = dictionary();
        assert_eq!(od.read(RegisterAddress::new(0x1018, 0x04)), Ok(4));
        assert_eq!(od.read(RegisterAddress::new(0x1000, 0x00)), Ok(0x0000_0191));
    }

    #[test]
    fn missing_objects_abort() {
        let od = dictionary();
        assert_eq!(
            od.read(RegisterAddress::new(0x5FFF, 0x00)),
            Err(SdoError::aborted(0x0602_0000))
        );
    }

    #[test]
    fn access_rights_are_enforced() {
        let mut od = dictionary();
        assert_eq!(
            od.write(RegisterAddress::new(0x1000, 0x00), 1),
            Err(SdoError::aborted(0x0601_0002))
        );
        assert_eq!(
            od.write(RegisterAddress::new(0x2000, 0x01), 1),
            Err(SdoError::aborted(0x0601_0002))
        );
        assert_eq!(
            od.read(RegisterAddress::new(0x2003, 0x02)),
            Err(SdoError::aborted(0x0601_0001))
        );

        assert_eq!(od.write(RegisterAddress::new(0x2003, 0x01), 42), Ok(()));
        assert_eq!(od.read(RegisterAddress::new(0x2003, 0x01)), Ok(42));
    }

    #[test]
    fn dynamic_entries_are_generated_per_read() {
        let od = dictionary();
        let counter = RegisterAddress::new(0x2001, 0x01);
        assert_eq!(od.read(counter), Ok(0));
        assert_eq!(od.read(counter), Ok(1));

        let temperature = od.read(RegisterAddress::new(0x2000, 0x01)).unwrap();
        assert!((2000..3000).contains(&temperature));
    }

    #[test]
    fn store_creates_process_entries() {
        let mut od = ObjectDictionary::new();
        od.store(RegisterAddress::new(0x6040, 0), 0x000F);
        od.store(RegisterAddress::new(0x6040, 0), 0x001F);
        assert_eq!(od.read(RegisterAddress::new(0x6040, 0)), Ok(0x001F));
        assert_eq!(od.summary(), vec!["0x6040:00 - Static ReadWrite".to_string()]);
    }

    #[test]
    fn store_keeps_access_rights() {
        let mut od = dictionary();

        let sensor = RegisterAddress::new(0x2000, 0x01);
        assert!(!od.store(sensor, 1));
        assert_eq!(od.write(sensor, 1), Err(SdoError::aborted(0x0601_0002)));
        assert!((2000..3000).contains(&od.read(sensor).unwrap()));

        let statusword = RegisterAddress::new(0x6041, 0x00);
        assert!(od.store(statusword, 0x0237));
        assert_eq!(od.read(statusword), Ok(0x0237));
        assert_eq!(od.write(statusword, 0), Err(SdoError::aborted(0x0601_0002)));
    }
}
