//! Publication of the discovered devices to the consumer environment.

use {crate::device::DeviceSet, std::fmt::Write as _};

/// Environment variable holding the default device path.
pub const DEFAULT_SERIAL_PORT_VAR: &str = "DEFAULT_SERIAL_PORT";

/// Environment variable holding all device paths, comma separated.
pub const ALL_SERIAL_PORTS_VAR: &str = "ALL_SERIAL_PORTS";

/// Values handed to the consumer process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExportedConfig {
    /// First device path, or empty.
    pub default_port: String,
    /// All device paths in set order, joined with `,`, or empty.
    pub all_ports: String,
}

impl ExportedConfig {
    /// Derive the exported values from a device set.
    pub fn from_devices(set: &DeviceSet) -> Self {
        let default_port = set
            .first()
            .map(|d| d.path.display().to_string())
            .unwrap_or_default();
        let all_ports = set
            .iter()
            .map(|d| d.path.display().to_string())
            .collect::<Vec<_>>()
            .join(",");

        Self {
            default_port,
            all_ports,
        }
    }

    /// `(name, value)` pairs for a child process environment.
    pub fn env_pairs(&self) -> [(&'static str, &str); 2] {
        [
            (DEFAULT_SERIAL_PORT_VAR, self.default_port.as_str()),
            (ALL_SERIAL_PORTS_VAR, self.all_ports.as_str()),
        ]
    }

    /// Render as POSIX shell assignments, one per line.
    pub fn to_shell(&self) -> String {
        let mut out = String::new();
        for (name, value) in self.env_pairs() {
            let _ = writeln!(out, "export {name}={}", shell_quote(value));
        }
        out
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::device::{DeviceCandidate, DeviceCategory},
    };

    #[test]
    fn test_two_devices() {
        let mut set = DeviceSet::new();
        set.insert(DeviceCandidate::new("/dev/ttyUSB0", DeviceCategory::Usb));
        set.insert(DeviceCandidate::new("/dev/ttyACM0", DeviceCategory::Acm));

        let config = ExportedConfig::from_devices(&set);
        assert_eq!(config.default_port, "/dev/ttyUSB0");
        assert_eq!(config.all_ports, "/dev/ttyUSB0,/dev/ttyACM0");
    }

    #[test]
    fn test_empty_set_exports_empty_strings() {
        let config = ExportedConfig::from_devices(&DeviceSet::new());
        assert_eq!(config, ExportedConfig::default());
        assert_eq!(
            config.env_pairs(),
            [(DEFAULT_SERIAL_PORT_VAR, ""), (ALL_SERIAL_PORTS_VAR, "")]
        );
    }

    #[test]
    fn test_single_device_has_no_separator() {
        let mut set = DeviceSet::new();
        set.insert(DeviceCandidate::new("/dev/ttyAMA0", DeviceCategory::Standard));

        let config = ExportedConfig::from_devices(&set);
        assert_eq!(config.default_port, config.all_ports);
    }

    #[test]
    fn test_to_shell() {
        let config = ExportedConfig {
            default_port: "/dev/ttyUSB0".to_string(),
            all_ports: "/dev/ttyUSB0,/dev/ttyACM0".to_string(),
        };
        assert_eq!(
            config.to_shell(),
            "export DEFAULT_SERIAL_PORT='/dev/ttyUSB0'\n\
             export ALL_SERIAL_PORTS='/dev/ttyUSB0,/dev/ttyACM0'\n"
        );
    }

    #[test]
    fn test_shell_quote_escapes_single_quote() {
        assert_eq!(shell_quote("a'b"), r"'a'\''b'");
        assert_eq!(shell_quote(""), "''");
    }
}
