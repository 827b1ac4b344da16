//! In-memory [`DeviceFs`] used by unit tests.

use {
    crate::{
        device::DeviceIdentity,
        error::{Error, Result},
        fs::{DeviceFs, NodeMetadata},
    },
    std::{
        cell::{Cell, RefCell},
        collections::BTreeMap,
        io,
        path::{Path, PathBuf},
    },
};

#[derive(Debug, Clone)]
pub(crate) struct FakeNode {
    pub identity: Option<DeviceIdentity>,
    pub mode: u32,
    pub readable: bool,
    pub writable: bool,
    /// Dangling symlink: listed, but does not resolve.
    pub dangling: bool,
}

impl FakeNode {
    pub fn char_device(major: u64, minor: u64) -> Self {
        Self {
            identity: Some(DeviceIdentity::new(major, minor)),
            mode: 0o020_660,
            readable: true,
            writable: true,
            dangling: false,
        }
    }

    pub fn regular_file() -> Self {
        Self {
            identity: None,
            mode: 0o100_644,
            readable: true,
            writable: true,
            dangling: false,
        }
    }

    pub fn dangling_link() -> Self {
        Self {
            dangling: true,
            ..Self::regular_file()
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeFs {
    nodes: RefCell<BTreeMap<PathBuf, FakeNode>>,
    pub deny_mknod: Cell<bool>,
    pub deny_chmod: Cell<bool>,
    pub mknod_calls: Cell<usize>,
}

impl FakeFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, path: impl Into<PathBuf>, node: FakeNode) -> Self {
        self.insert(path, node);
        self
    }

    pub fn insert(&self, path: impl Into<PathBuf>, node: FakeNode) {
        self.nodes
            .borrow_mut()
            .insert(path.into(), node);
    }

    pub fn node(&self, path: &Path) -> Option<FakeNode> {
        self.nodes
            .borrow()
            .get(path)
            .cloned()
    }

    fn not_found(path: &Path) -> Error {
        Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} not found", path.display()),
        ))
    }

    fn resolved(&self, path: &Path) -> Result<FakeNode> {
        match self.node(path) {
            Some(node) if !node.dangling => Ok(node),
            _ => Err(Self::not_found(path)),
        }
    }
}

impl DeviceFs for FakeFs {
    fn list_dir(&self, dir: &Path) -> Result<Vec<String>> {
        let nodes = self.nodes.borrow();
        let names: Vec<String> = nodes
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .collect();
        if names.is_empty() && !nodes.keys().any(|p| p.starts_with(dir)) {
            return Err(Self::not_found(dir));
        }
        Ok(names)
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolved(path).is_ok()
    }

    fn node_exists(&self, path: &Path) -> bool {
        self.node(path).is_some()
    }

    fn identity(&self, path: &Path) -> Result<DeviceIdentity> {
        self.resolved(path)?
            .identity
            .ok_or_else(|| Error::NotCharDevice(path.to_path_buf()))
    }

    fn make_char_node(&self, path: &Path, identity: DeviceIdentity, mode: u32) -> Result<()> {
        self.mknod_calls
            .set(self.mknod_calls.get() + 1);
        if self.deny_mknod.get() {
            return Err(Error::Sys(nix::Error::EPERM));
        }
        if self.node_exists(path) {
            return Err(Error::Sys(nix::Error::EEXIST));
        }
        // Mimic a 022 umask; callers must chmod afterwards.
        self.insert(
            path,
            FakeNode {
                identity: Some(identity),
                mode: 0o020_000 | (mode & !0o022),
                readable: true,
                writable: mode & 0o002 != 0,
                dangling: false,
            },
        );
        Ok(())
    }

    fn set_mode(&self, path: &Path, mode: u32) -> Result<()> {
        if self.deny_chmod.get() {
            return Err(Error::Sys(nix::Error::EPERM));
        }
        let mut nodes = self.nodes.borrow_mut();
        let node = nodes
            .get_mut(path)
            .ok_or_else(|| Self::not_found(path))?;
        node.mode = (node.mode & !0o7777) | (mode & 0o7777);
        node.readable = mode & 0o004 != 0;
        node.writable = mode & 0o002 != 0;
        Ok(())
    }

    fn metadata(&self, path: &Path) -> Result<NodeMetadata> {
        let node = self.resolved(path)?;
        Ok(NodeMetadata {
            mode: node.mode,
            uid: 0,
            gid: 20,
            owner: Some("root".to_string()),
            group: Some("dialout".to_string()),
        })
    }

    fn can_read(&self, path: &Path) -> bool {
        self.resolved(path)
            .is_ok_and(|n| n.readable)
    }

    fn can_write(&self, path: &Path) -> bool {
        self.resolved(path)
            .is_ok_and(|n| n.writable)
    }
}
