//! Device enumeration snapshots and serial-number lookup.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::protocol::DeviceFamily;

use super::bridge::{PORT_FLAG_HIGH_SPEED, PORT_FLAG_OPENED, PortInfo, SerialBridge};
use super::error::TransportError;

/// Type codes of controllers known to drive a motor.
const MOTOR_TYPE_CODES: [u32; 8] = [26, 27, 40, 67, 70, 73, 80, 83];

/// Type codes of DC-servo controllers; everything else motorized is treated
/// as a stepper.
const DC_SERVO_TYPE_CODES: [u32; 2] = [27, 83];

/// Product ID shared by controllers that encode their type in the serial
/// number prefix instead.
const GENERIC_PRODUCT_ID: u16 = 0xFAF0;

/// An immutable snapshot of one enumerated device.
///
/// Created once per enumeration pass and superseded, never mutated, by the
/// next pass.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceDescriptor {
    /// Device serial number
    pub serial_number: String,
    /// Device description string
    pub description: String,
    /// Combined vendor/product identifier
    pub raw_id: u32,
    /// Bridge chip type code reported by the driver
    pub device_type_code: u32,
    /// USB location identifier
    pub location_id: u32,
    /// Whether some process already holds the port open
    pub opened: bool,
    /// Whether the device enumerated at high speed
    pub high_speed: bool,
}

impl DeviceDescriptor {
    /// Build a descriptor from the raw enumeration detail.
    #[must_use]
    pub fn from_port_info(info: PortInfo) -> Self {
        Self {
            serial_number: info.serial_number,
            description: info.description,
            raw_id: info.id,
            device_type_code: info.device_type,
            location_id: info.location_id,
            opened: info.flags & PORT_FLAG_OPENED != 0,
            high_speed: info.flags & PORT_FLAG_HIGH_SPEED != 0,
        }
    }

    /// USB vendor identifier (high 16 bits of the raw identifier).
    #[must_use]
    pub const fn vendor_id(&self) -> u16 {
        ((self.raw_id >> 16) & 0xFFFF) as u16
    }

    /// USB product identifier (low 16 bits of the raw identifier).
    #[must_use]
    pub const fn product_id(&self) -> u16 {
        (self.raw_id & 0xFFFF) as u16
    }

    /// Whether this device belongs to the controller vendor's product space.
    #[must_use]
    pub const fn is_vendor_device(&self) -> bool {
        self.vendor_id() == crate::VENDOR_ID
    }

    /// Controller type code.
    ///
    /// Foreign-vendor devices report 0. Dedicated product IDs are the type
    /// code directly; the generic product ID encodes it in the first two
    /// digits of the serial number.
    #[must_use]
    pub fn type_code(&self) -> u32 {
        if !self.is_vendor_device() {
            return 0;
        }
        if self.product_id() != GENERIC_PRODUCT_ID {
            return u32::from(self.product_id());
        }
        self.serial_number
            .get(0..2)
            .and_then(|prefix| prefix.parse().ok())
            .unwrap_or(0)
    }

    /// Whether the controller type is a known motor driver.
    #[must_use]
    pub fn is_motor(&self) -> bool {
        MOTOR_TYPE_CODES.contains(&self.type_code())
    }

    /// Controller family, used to pick status-request identifiers and to
    /// disambiguate the aliased status-frame fields.
    #[must_use]
    pub fn family(&self) -> DeviceFamily {
        if DC_SERVO_TYPE_CODES.contains(&self.type_code()) {
            DeviceFamily::DcServo
        } else {
            DeviceFamily::Stepper
        }
    }
}

/// Enumerates attached devices and answers serial-number lookups against the
/// most recent snapshot.
///
/// The registry is a plain value owned here, rebuilt wholesale on every
/// [`enumerate`](Self::enumerate) call, and passed by reference to
/// [`DeviceSession::connect`](super::DeviceSession::connect).
pub struct DeviceDirectory {
    bridge: Arc<dyn SerialBridge>,
    devices: HashMap<String, DeviceDescriptor>,
}

impl DeviceDirectory {
    /// Create a directory over the given bridge driver.
    #[must_use]
    pub fn new(bridge: Arc<dyn SerialBridge>) -> Self {
        Self {
            bridge,
            devices: HashMap::new(),
        }
    }

    /// Rebuild the snapshot from a fresh enumeration pass.
    ///
    /// Returns every attached device unfiltered; vendor filtering is the
    /// caller's choice via [`DeviceDescriptor::is_vendor_device`].
    pub fn enumerate(&mut self) -> Result<Vec<DeviceDescriptor>, TransportError> {
        let count = self.bridge.device_count()?;
        debug!(count, "enumerating attached devices");

        let mut snapshot = Vec::with_capacity(count as usize);
        for index in 0..count {
            let descriptor = DeviceDescriptor::from_port_info(self.bridge.device_info(index)?);
            snapshot.push(descriptor);
        }

        self.devices = snapshot
            .iter()
            .map(|d| (d.serial_number.clone(), d.clone()))
            .collect();

        Ok(snapshot)
    }

    /// Look up a device by serial number in the last snapshot.
    #[must_use]
    pub fn lookup(&self, serial_number: &str) -> Option<&DeviceDescriptor> {
        self.devices.get(serial_number)
    }

    /// Serial numbers of vendor devices in the last snapshot.
    #[must_use]
    pub fn vendor_serial_numbers(&self) -> Vec<String> {
        self.devices
            .values()
            .filter(|d| d.is_vendor_device())
            .map(|d| d.serial_number.clone())
            .collect()
    }
}

impl std::fmt::Debug for DeviceDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceDirectory")
            .field("devices", &self.devices.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(raw_id: u32, serial: &str) -> DeviceDescriptor {
        DeviceDescriptor {
            serial_number: serial.to_string(),
            description: "TDC001 DC Motor Controller".to_string(),
            raw_id,
            device_type_code: 5,
            location_id: 0,
            opened: false,
            high_speed: false,
        }
    }

    #[test]
    fn test_vendor_filter() {
        assert!(descriptor(0x0403_FAF0, "83000001").is_vendor_device());
        assert!(!descriptor(0x0402_5678, "83000001").is_vendor_device());
    }

    #[test]
    fn test_vendor_product_split() {
        let d = descriptor(0x0403_FAF0, "83000001");
        assert_eq!(d.vendor_id(), 0x0403);
        assert_eq!(d.product_id(), 0xFAF0);
    }

    #[test]
    fn test_type_code_from_serial_prefix() {
        assert_eq!(descriptor(0x0403_FAF0, "83000001").type_code(), 83);
        assert_eq!(descriptor(0x0403_FAF0, "27123456").type_code(), 27);
    }

    #[test]
    fn test_type_code_from_product_id() {
        assert_eq!(descriptor(0x0403_0028, "40000001").type_code(), 0x28);
    }

    #[test]
    fn test_type_code_foreign_vendor() {
        assert_eq!(descriptor(0x0402_5678, "83000001").type_code(), 0);
    }

    #[test]
    fn test_family_and_motor_detection() {
        let dc = descriptor(0x0403_FAF0, "83000001");
        assert!(dc.is_motor());
        assert_eq!(dc.family(), DeviceFamily::DcServo);

        let stepper = descriptor(0x0403_FAF0, "40000001");
        assert!(stepper.is_motor());
        assert_eq!(stepper.family(), DeviceFamily::Stepper);

        let piezo = descriptor(0x0403_FAF0, "81000001");
        assert!(!piezo.is_motor());
    }

    #[test]
    fn test_flags_decoded() {
        let d = DeviceDescriptor::from_port_info(PortInfo {
            flags: PORT_FLAG_OPENED | PORT_FLAG_HIGH_SPEED,
            device_type: 5,
            id: 0x0403_FAF0,
            location_id: 21,
            serial_number: "83000001".to_string(),
            description: "TDC001".to_string(),
        });
        assert!(d.opened);
        assert!(d.high_speed);
        assert_eq!(d.location_id, 21);
    }
}
