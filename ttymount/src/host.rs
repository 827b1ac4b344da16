//! Host-side USB details for discovered serial ports.
//!
//! Purely informational: the pipeline never depends on it. With the
//! `native` feature the `serialport` crate is asked which ports sit behind a
//! USB bridge; without it the lookup is always empty.

use std::collections::HashMap;

#[cfg(feature = "native")]
use {log::{debug, trace}, std::path::Path};

/// Common USB-to-UART bridge vendors.
const KNOWN_BRIDGE_VENDORS: &[(u16, &str)] = &[
    (0x1A86, "CH340/CH341"),
    (0x10C4, "CP210x"),
    (0x0403, "FTDI"),
    (0x067B, "PL2303"),
    (0x2341, "Arduino"),
    (0x2E8A, "Raspberry Pi"),
];

/// USB descriptor information for a serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UsbDetails {
    /// USB Vendor ID.
    pub vid: u16,
    /// USB Product ID.
    pub pid: u16,
    /// Manufacturer string (if available).
    pub manufacturer: Option<String>,
    /// Product string (if available).
    pub product: Option<String>,
    /// Serial number (if available).
    pub serial: Option<String>,
}

impl UsbDetails {
    /// Bridge family name derived from the vendor ID.
    pub fn bridge_name(&self) -> Option<&'static str> {
        KNOWN_BRIDGE_VENDORS
            .iter()
            .find(|(vid, _)| *vid == self.vid)
            .map(|(_, name)| *name)
    }

    /// One-line description, e.g. `CP210x 10C4:EA60 - CP2102 USB to UART`.
    pub fn describe(&self) -> String {
        let mut out = format!("{:04X}:{:04X}", self.vid, self.pid);
        if let Some(bridge) = self.bridge_name() {
            out = format!("{bridge} {out}");
        }
        if let Some(product) = &self.product {
            out.push_str(" - ");
            out.push_str(product);
        }
        out
    }
}

/// USB details of all host ports, keyed by device file name (`ttyUSB0`).
#[cfg(feature = "native")]
pub fn usb_details() -> HashMap<String, UsbDetails> {
    let mut result = HashMap::new();

    match serialport::available_ports() {
        Ok(ports) => {
            for port_info in ports {
                let serialport::SerialPortType::UsbPort(usb) = port_info.port_type else {
                    continue;
                };
                let Some(name) = Path::new(&port_info.port_name)
                    .file_name()
                    .and_then(|n| n.to_str())
                else {
                    continue;
                };

                trace!(
                    "USB port {}: VID {:04X} PID {:04X}",
                    port_info.port_name, usb.vid, usb.pid
                );
                result.insert(
                    name.to_string(),
                    UsbDetails {
                        vid: usb.vid,
                        pid: usb.pid,
                        manufacturer: usb.manufacturer,
                        product: usb.product,
                        serial: usb.serial_number,
                    },
                );
            }
        },
        Err(e) => {
            debug!("Failed to enumerate serial ports: {e}");
        },
    }

    result
}

/// USB details are unavailable without the `native` feature.
#[cfg(not(feature = "native"))]
pub fn usb_details() -> HashMap<String, UsbDetails> {
    HashMap::new()
}
