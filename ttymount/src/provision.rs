//! Device node provisioning inside the sandbox.
//!
//! For each candidate the host special file is stat'ed for its major/minor
//! numbers and an equivalent character node is created at the candidate's
//! sandbox path. Existing nodes are never touched. No failure here is fatal:
//! every problem becomes a [`ProvisionOutcome`] and a warning.

use {
    crate::{
        device::{DeviceCandidate, DeviceIdentity, DeviceSet},
        fs::DeviceFs,
        scan::DeviceScanner,
    },
    log::{debug, info, warn},
    std::{fmt, path::PathBuf},
};

/// Default permission bits for created nodes (read/write for everyone).
pub const DEFAULT_NODE_MODE: u32 = 0o666;

/// Result of provisioning one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// A node was already present at the sandbox path.
    AlreadyPresent,
    /// A node was created with the configured mode.
    Created(DeviceIdentity),
    /// A node was created but its mode could not be widened.
    CreatedModeUnchanged {
        /// Identity of the created node.
        identity: DeviceIdentity,
        /// Why the mode change failed.
        reason: String,
    },
    /// Major/minor could not be read from the host file.
    IdentityUnavailable(String),
    /// Node creation failed.
    Failed {
        /// Identity read from the host.
        identity: DeviceIdentity,
        /// Why creation failed.
        reason: String,
    },
    /// Provisioning is disabled.
    Skipped,
}

impl ProvisionOutcome {
    /// Whether a usable node is expected at the sandbox path.
    pub fn has_node(&self) -> bool {
        matches!(
            self,
            Self::AlreadyPresent | Self::Created(_) | Self::CreatedModeUnchanged { .. }
        )
    }

    /// Short machine-friendly label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AlreadyPresent => "present",
            Self::Created(_) => "created",
            Self::CreatedModeUnchanged { .. } => "created-mode-unchanged",
            Self::IdentityUnavailable(_) => "identity-unavailable",
            Self::Failed { .. } => "failed",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for ProvisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyPresent => f.write_str("already present"),
            Self::Created(id) => write!(f, "created ({id})"),
            Self::CreatedModeUnchanged { identity, reason } => {
                write!(f, "created ({identity}), mode unchanged: {reason}")
            },
            Self::IdentityUnavailable(reason) => write!(f, "identity unavailable: {reason}"),
            Self::Failed { identity, reason } => {
                write!(f, "creation failed ({identity}): {reason}")
            },
            Self::Skipped => f.write_str("skipped"),
        }
    }
}

/// Provisioning record for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    /// Sandbox path of the candidate.
    pub path: PathBuf,
    /// What happened.
    pub outcome: ProvisionOutcome,
}

/// Creates sandbox device nodes mirroring host special files.
#[derive(Debug, Clone)]
pub struct DeviceNodeProvisioner {
    mode: u32,
    enabled: bool,
}

impl Default for DeviceNodeProvisioner {
    fn default() -> Self {
        Self {
            mode: DEFAULT_NODE_MODE,
            enabled: true,
        }
    }
}

impl DeviceNodeProvisioner {
    /// Create a provisioner with the default mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the permission bits for created nodes.
    #[must_use]
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode & 0o7777;
        self
    }

    /// Enable or disable node creation.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Provision every candidate in set order.
    pub fn provision_all(
        &self,
        set: &DeviceSet,
        scanner: &DeviceScanner,
        fs: &impl DeviceFs,
    ) -> Vec<Provisioned> {
        let results: Vec<Provisioned> = set
            .iter()
            .map(|candidate| Provisioned {
                path: candidate.path.clone(),
                outcome: self.provision(candidate, scanner, fs),
            })
            .collect();

        let created = results
            .iter()
            .filter(|p| {
                matches!(
                    p.outcome,
                    ProvisionOutcome::Created(_) | ProvisionOutcome::CreatedModeUnchanged { .. }
                )
            })
            .count();
        if created > 0 {
            info!("Created {created} device node(s)");
        }

        results
    }

    /// Provision a single candidate.
    pub fn provision(
        &self,
        candidate: &DeviceCandidate,
        scanner: &DeviceScanner,
        fs: &impl DeviceFs,
    ) -> ProvisionOutcome {
        if !self.enabled {
            return ProvisionOutcome::Skipped;
        }

        let path = &candidate.path;
        let host_path = scanner.host_path(candidate);

        let identity = match fs.identity(&host_path) {
            Ok(identity) => identity,
            Err(e) => {
                warn!("Cannot read device numbers of {}: {e}", host_path.display());
                return ProvisionOutcome::IdentityUnavailable(e.to_string());
            },
        };

        if fs.node_exists(path) {
            debug!("{} already present ({identity}), leaving untouched", path.display());
            return ProvisionOutcome::AlreadyPresent;
        }

        if let Err(e) = fs.make_char_node(path, identity, self.mode) {
            warn!("Failed to create device node {} ({identity}): {e}", path.display());
            return ProvisionOutcome::Failed {
                identity,
                reason: e.to_string(),
            };
        }

        // mknod is subject to the umask.
        if let Err(e) = fs.set_mode(path, self.mode) {
            warn!("Created {} but could not set mode {:o}: {e}", path.display(), self.mode);
            return ProvisionOutcome::CreatedModeUnchanged {
                identity,
                reason: e.to_string(),
            };
        }

        info!("Created device node {} ({identity}, mode {:o})", path.display(), self.mode);
        ProvisionOutcome::Created(identity)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            device::DeviceCategory,
            fs::fake::{FakeFs, FakeNode},
        },
        std::path::Path,
    };

    fn sandboxed() -> DeviceScanner {
        DeviceScanner::new("/host/dev", "/dev").unwrap()
    }

    fn candidate(path: &str) -> DeviceCandidate {
        DeviceCandidate::new(path, DeviceCategory::Usb)
    }

    #[test]
    fn test_creates_node_with_host_identity() {
        let fs = FakeFs::new().with("/host/dev/ttyUSB0", FakeNode::char_device(188, 0));
        let outcome =
            DeviceNodeProvisioner::new().provision(&candidate("/dev/ttyUSB0"), &sandboxed(), &fs);

        assert_eq!(outcome, ProvisionOutcome::Created(DeviceIdentity::new(188, 0)));
        let node = fs.node(Path::new("/dev/ttyUSB0")).unwrap();
        assert_eq!(node.identity, Some(DeviceIdentity::new(188, 0)));
        assert_eq!(node.mode & 0o7777, 0o666);
    }

    #[test]
    fn test_existing_node_left_untouched() {
        let fs = FakeFs::new()
            .with("/host/dev/ttyUSB0", FakeNode::char_device(188, 0))
            .with("/dev/ttyUSB0", FakeNode::char_device(188, 0));

        let outcome =
            DeviceNodeProvisioner::new().provision(&candidate("/dev/ttyUSB0"), &sandboxed(), &fs);
        assert_eq!(outcome, ProvisionOutcome::AlreadyPresent);
        assert_eq!(fs.mknod_calls.get(), 0);
        assert_eq!(fs.node(Path::new("/dev/ttyUSB0")).unwrap().mode & 0o7777, 0o660);
    }

    #[test]
    fn test_unreadable_identity_skips_candidate() {
        let fs = FakeFs::new().with("/host/dev/ttyUSB0", FakeNode::regular_file());
        let outcome =
            DeviceNodeProvisioner::new().provision(&candidate("/dev/ttyUSB0"), &sandboxed(), &fs);

        assert!(matches!(outcome, ProvisionOutcome::IdentityUnavailable(_)));
        assert!(!outcome.has_node());
        assert_eq!(fs.mknod_calls.get(), 0);
    }

    #[test]
    fn test_mknod_permission_denied_is_absorbed() {
        let fs = FakeFs::new().with("/host/dev/ttyACM0", FakeNode::char_device(166, 0));
        fs.deny_mknod.set(true);

        let outcome =
            DeviceNodeProvisioner::new().provision(&candidate("/dev/ttyACM0"), &sandboxed(), &fs);
        assert_eq!(outcome.label(), "failed");
        assert!(outcome.to_string().contains("166:0"));
        assert!(!fs.node_exists(Path::new("/dev/ttyACM0")));
    }

    #[test]
    fn test_chmod_failure_keeps_created_node() {
        let fs = FakeFs::new().with("/host/dev/ttyACM0", FakeNode::char_device(166, 0));
        fs.deny_chmod.set(true);

        let outcome =
            DeviceNodeProvisioner::new().provision(&candidate("/dev/ttyACM0"), &sandboxed(), &fs);
        assert!(matches!(outcome, ProvisionOutcome::CreatedModeUnchanged { .. }));
        assert!(outcome.has_node());
        // umask 022 narrowed the requested 0666.
        assert_eq!(fs.node(Path::new("/dev/ttyACM0")).unwrap().mode & 0o7777, 0o644);
    }

    #[test]
    fn test_disabled_provisioner_skips() {
        let fs = FakeFs::new().with("/host/dev/ttyUSB0", FakeNode::char_device(188, 0));
        let outcome = DeviceNodeProvisioner::new()
            .enabled(false)
            .provision(&candidate("/dev/ttyUSB0"), &sandboxed(), &fs);

        assert_eq!(outcome, ProvisionOutcome::Skipped);
        assert!(!fs.node_exists(Path::new("/dev/ttyUSB0")));
    }

    #[test]
    fn test_custom_mode() {
        let fs = FakeFs::new().with("/host/dev/ttyS0", FakeNode::char_device(4, 64));
        DeviceNodeProvisioner::new()
            .with_mode(0o660)
            .provision(&candidate("/dev/ttyS0"), &sandboxed(), &fs);

        assert_eq!(fs.node(Path::new("/dev/ttyS0")).unwrap().mode & 0o7777, 0o660);
    }

    #[test]
    fn test_provision_all_is_idempotent() {
        let fs = FakeFs::new()
            .with("/host/dev/ttyUSB0", FakeNode::char_device(188, 0))
            .with("/host/dev/ttyACM0", FakeNode::char_device(166, 0));
        let scanner = sandboxed();
        let set = scanner.scan(&fs);
        let provisioner = DeviceNodeProvisioner::new();

        let first = provisioner.provision_all(&set, &scanner, &fs);
        assert!(first.iter().all(|p| matches!(p.outcome, ProvisionOutcome::Created(_))));

        let second = provisioner.provision_all(&set, &scanner, &fs);
        assert!(second.iter().all(|p| p.outcome == ProvisionOutcome::AlreadyPresent));
        assert_eq!(fs.mknod_calls.get(), 2);
    }
}
