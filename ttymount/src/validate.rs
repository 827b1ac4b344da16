//! Read/write accessibility checks.
//!
//! Validation observes and reports; it never removes a candidate.

use {
    crate::{
        device::DeviceSet,
        fs::{DeviceFs, NodeMetadata},
    },
    log::{debug, warn},
    std::path::{Path, PathBuf},
};

/// Point-in-time accessibility of one device path.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PermissionReport {
    /// Sandbox path that was checked.
    pub path: PathBuf,
    /// Mode and ownership, if the entry could be stat'ed.
    pub metadata: Option<NodeMetadata>,
    /// `access(R_OK)` succeeded.
    pub readable: bool,
    /// `access(W_OK)` succeeded.
    pub writable: bool,
}

impl PermissionReport {
    /// Permission bits, if known.
    pub fn mode(&self) -> Option<u32> {
        self.metadata
            .as_ref()
            .map(NodeMetadata::permissions)
    }

    /// Owner name, if known.
    pub fn owner(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.owner.as_deref())
    }

    /// Group name, if known.
    pub fn group(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.group.as_deref())
    }

    /// Readable and writable.
    pub fn is_accessible(&self) -> bool {
        self.readable && self.writable
    }
}

/// Checks accessibility of every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionValidator;

impl PermissionValidator {
    /// Create a validator.
    pub fn new() -> Self {
        Self
    }

    /// Check one path.
    pub fn check(&self, path: &Path, fs: &impl DeviceFs) -> PermissionReport {
        let metadata = match fs.metadata(path) {
            Ok(meta) => Some(meta),
            Err(e) => {
                debug!("Cannot stat {}: {e}", path.display());
                None
            },
        };

        let report = PermissionReport {
            path: path.to_path_buf(),
            metadata,
            readable: fs.can_read(path),
            writable: fs.can_write(path),
        };

        if !report.is_accessible() {
            warn!(
                "{} is not fully accessible (read: {}, write: {})",
                path.display(),
                report.readable,
                report.writable
            );
        }

        report
    }

    /// Check every candidate in set order.
    pub fn validate(&self, set: &DeviceSet, fs: &impl DeviceFs) -> Vec<PermissionReport> {
        set.iter()
            .map(|candidate| self.check(&candidate.path, fs))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            device::{DeviceCandidate, DeviceCategory},
            fs::fake::{FakeFs, FakeNode},
        },
    };

    #[test]
    fn test_accessible_device() {
        let fs = FakeFs::new().with("/dev/ttyUSB0", FakeNode::char_device(188, 0));
        let report = PermissionValidator.check(Path::new("/dev/ttyUSB0"), &fs);

        assert!(report.readable);
        assert!(report.writable);
        assert_eq!(report.mode(), Some(0o660));
        assert_eq!(report.owner(), Some("root"));
        assert_eq!(report.group(), Some("dialout"));
    }

    #[test]
    fn test_read_only_device() {
        let mut node = FakeNode::char_device(4, 64);
        node.writable = false;
        let fs = FakeFs::new().with("/dev/ttyS0", node);

        let report = PermissionValidator.check(Path::new("/dev/ttyS0"), &fs);
        assert!(report.readable);
        assert!(!report.writable);
        assert!(!report.is_accessible());
    }

    #[test]
    fn test_missing_node_reported_inaccessible() {
        let fs = FakeFs::new();
        let report = PermissionValidator.check(Path::new("/dev/ttyACM0"), &fs);

        assert!(report.metadata.is_none());
        assert!(!report.readable);
        assert!(!report.writable);
    }

    #[test]
    fn test_validate_keeps_every_candidate() {
        let fs = FakeFs::new().with("/dev/ttyUSB0", FakeNode::char_device(188, 0));
        let mut set = DeviceSet::new();
        set.insert(DeviceCandidate::new("/dev/ttyUSB0", DeviceCategory::Usb));
        set.insert(DeviceCandidate::new("/dev/ttyACM0", DeviceCategory::Acm));

        let reports = PermissionValidator.validate(&set, &fs);
        assert_eq!(reports.len(), 2);
        assert!(reports[0].is_accessible());
        assert!(!reports[1].is_accessible());
        assert_eq!(set.len(), 2);
    }
}
