//! Filesystem abstraction for device discovery and provisioning.
//!
//! Every stage of the pipeline talks to the device directories through the
//! [`DeviceFs`] trait so the logic can run against the real host or against
//! an in-memory model in tests.
//!
//! ```text
//! +---------+  +-------------+  +-----------+
//! | Scanner |  | Provisioner |  | Validator |
//! +----+----+  +------+------+  +-----+-----+
//!      |              |               |
//!      v              v               v
//! +----+--------------+---------------+-----+
//! |              DeviceFs trait             |
//! +----+------------------------------------+
//!      |
//!      v
//! +----+-----------------+
//! | NativeFs (nix, std)  |
//! +----------------------+
//! ```

pub mod native;

#[cfg(test)]
pub(crate) mod fake;

use std::path::Path;

use crate::{device::DeviceIdentity, error::Result};

/// Point-in-time ownership and mode of a filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NodeMetadata {
    /// Full `st_mode`, including the file type bits.
    pub mode: u32,
    /// Owning user id.
    pub uid: u32,
    /// Owning group id.
    pub gid: u32,
    /// Owner name, when the passwd database knows the uid.
    pub owner: Option<String>,
    /// Group name, when the group database knows the gid.
    pub group: Option<String>,
}

impl NodeMetadata {
    /// Permission bits only (`0o7777` mask).
    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }
}

/// Device-directory operations used by the pipeline.
///
/// All calls are synchronous and touch local metadata only.
pub trait DeviceFs {
    /// Names of the entries in a directory.
    fn list_dir(&self, dir: &Path) -> Result<Vec<String>>;

    /// Whether the path resolves to an existing entry (symlinks followed).
    fn exists(&self, path: &Path) -> bool;

    /// Whether an entry is present at the path itself (symlinks not followed).
    fn node_exists(&self, path: &Path) -> bool;

    /// Major/minor numbers of a character special file.
    fn identity(&self, path: &Path) -> Result<DeviceIdentity>;

    /// Create a character special file.
    fn make_char_node(&self, path: &Path, identity: DeviceIdentity, mode: u32) -> Result<()>;

    /// Change permission bits.
    fn set_mode(&self, path: &Path, mode: u32) -> Result<()>;

    /// Mode and ownership of an entry.
    fn metadata(&self, path: &Path) -> Result<NodeMetadata>;

    /// Whether the current process may open the path for reading.
    fn can_read(&self, path: &Path) -> bool;

    /// Whether the current process may open the path for writing.
    fn can_write(&self, path: &Path) -> bool;
}

impl<T: DeviceFs + ?Sized> DeviceFs for &T {
    fn list_dir(&self, dir: &Path) -> Result<Vec<String>> {
        (**self).list_dir(dir)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn node_exists(&self, path: &Path) -> bool {
        (**self).node_exists(path)
    }

    fn identity(&self, path: &Path) -> Result<DeviceIdentity> {
        (**self).identity(path)
    }

    fn make_char_node(&self, path: &Path, identity: DeviceIdentity, mode: u32) -> Result<()> {
        (**self).make_char_node(path, identity, mode)
    }

    fn set_mode(&self, path: &Path, mode: u32) -> Result<()> {
        (**self).set_mode(path, mode)
    }

    fn metadata(&self, path: &Path) -> Result<NodeMetadata> {
        (**self).metadata(path)
    }

    fn can_read(&self, path: &Path) -> bool {
        (**self).can_read(path)
    }

    fn can_write(&self, path: &Path) -> bool {
        (**self).can_write(path)
    }
}

pub use native::NativeFs;
