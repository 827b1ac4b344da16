//! Device data model: candidates, categories and the ordered device set.

use std::{fmt, path::{Path, PathBuf}};

/// Naming category a device path was matched under.
///
/// Variants are declared in scan priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DeviceCategory {
    /// USB-to-serial bridges (`ttyUSB*`).
    Usb,
    /// USB CDC ACM modems (`ttyACM*`).
    Acm,
    /// On-board UARTs (`ttyS*`, `ttyAMA*`, `serial*`).
    Standard,
    /// Anything caught by the generic or user-supplied patterns.
    Custom,
}

impl DeviceCategory {
    /// Short human-readable label.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Usb => "USB",
            Self::Acm => "ACM",
            Self::Standard => "Standard",
            Self::Custom => "Custom",
        }
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A serial device path found during scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceCandidate {
    /// Path of the device as seen by the consumer (sandbox path).
    pub path: PathBuf,
    /// Category of the first pattern that matched.
    pub category: DeviceCategory,
}

impl DeviceCandidate {
    /// Create a new candidate.
    pub fn new(path: impl Into<PathBuf>, category: DeviceCategory) -> Self {
        Self {
            path: path.into(),
            category,
        }
    }

    /// File name of the device entry (e.g. `ttyUSB0`).
    pub fn file_name(&self) -> Option<&str> {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
    }
}

/// Ordered, duplicate-free sequence of candidates.
///
/// Insertion order is significant: the first element is the default device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSet {
    devices: Vec<DeviceCandidate>,
}

impl DeviceSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a candidate unless its path is already present.
    ///
    /// Returns `true` if the candidate was added.
    pub fn insert(&mut self, candidate: DeviceCandidate) -> bool {
        if self.contains(&candidate.path) {
            return false;
        }
        self.devices.push(candidate);
        true
    }

    /// Check whether a path is already in the set.
    pub fn contains(&self, path: &Path) -> bool {
        self.devices
            .iter()
            .any(|d| d.path == path)
    }

    /// The default device, if any.
    pub fn first(&self) -> Option<&DeviceCandidate> {
        self.devices.first()
    }

    /// Iterate candidates in set order.
    pub fn iter(&self) -> std::slice::Iter<'_, DeviceCandidate> {
        self.devices.iter()
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether no device was found.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl<'a> IntoIterator for &'a DeviceSet {
    type Item = &'a DeviceCandidate;
    type IntoIter = std::slice::Iter<'a, DeviceCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Major/minor number pair identifying a character device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceIdentity {
    /// Major number (driver).
    pub major: u64,
    /// Minor number (instance).
    pub minor: u64,
}

impl DeviceIdentity {
    /// Create a new identity.
    pub const fn new(major: u64, minor: u64) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_duplicate_path() {
        let mut set = DeviceSet::new();
        assert!(set.insert(DeviceCandidate::new("/dev/ttyUSB0", DeviceCategory::Usb)));
        assert!(!set.insert(DeviceCandidate::new("/dev/ttyUSB0", DeviceCategory::Custom)));

        assert_eq!(set.len(), 1);
        assert_eq!(set.first().map(|d| d.category), Some(DeviceCategory::Usb));
    }

    #[test]
    fn test_insertion_order_defines_default() {
        let mut set = DeviceSet::new();
        set.insert(DeviceCandidate::new("/dev/ttyACM0", DeviceCategory::Acm));
        set.insert(DeviceCandidate::new("/dev/ttyUSB0", DeviceCategory::Usb));

        let paths: Vec<_> = set
            .iter()
            .map(|d| d.path.clone())
            .collect();
        assert_eq!(paths, [PathBuf::from("/dev/ttyACM0"), PathBuf::from("/dev/ttyUSB0")]);
        assert_eq!(set.first().map(|d| d.path.as_path()), Some(Path::new("/dev/ttyACM0")));
    }

    #[test]
    fn test_empty_set() {
        let set = DeviceSet::new();
        assert!(set.is_empty());
        assert!(set.first().is_none());
    }

    #[test]
    fn test_category_priority_order() {
        assert!(DeviceCategory::Usb < DeviceCategory::Acm);
        assert!(DeviceCategory::Acm < DeviceCategory::Standard);
        assert!(DeviceCategory::Standard < DeviceCategory::Custom);
    }

    #[test]
    fn test_identity_display() {
        assert_eq!(DeviceIdentity::new(188, 0).to_string(), "188:0");
    }

    #[test]
    fn test_candidate_file_name() {
        let c = DeviceCandidate::new("/dev/ttyAMA0", DeviceCategory::Standard);
        assert_eq!(c.file_name(), Some("ttyAMA0"));
    }
}
