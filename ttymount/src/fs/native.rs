//! Native [`DeviceFs`] implementation on top of `nix` and `std::fs`.

use {
    crate::{
        device::DeviceIdentity,
        error::{Error, Result},
        fs::{DeviceFs, NodeMetadata},
    },
    log::trace,
    nix::{
        sys::stat::{self, Mode, SFlag},
        unistd::{self, AccessFlags, Gid, Group, Uid, User},
    },
    std::{
        fs,
        os::unix::fs::{MetadataExt, PermissionsExt},
        path::Path,
    },
};

/// Host filesystem access through direct system calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeFs;

impl NativeFs {
    /// Create a native filesystem handle.
    pub fn new() -> Self {
        Self
    }
}

impl DeviceFs for NativeFs {
    fn list_dir(&self, dir: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            match entry
                .file_name()
                .into_string()
            {
                Ok(name) => names.push(name),
                Err(raw) => trace!("Skipping non-UTF-8 entry {raw:?} in {}", dir.display()),
            }
        }
        Ok(names)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn node_exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn identity(&self, path: &Path) -> Result<DeviceIdentity> {
        let st = stat::stat(path)?;
        let kind = SFlag::from_bits_truncate(st.st_mode & SFlag::S_IFMT.bits());
        if kind != SFlag::S_IFCHR {
            return Err(Error::NotCharDevice(path.to_path_buf()));
        }
        Ok(DeviceIdentity::new(
            stat::major(st.st_rdev),
            stat::minor(st.st_rdev),
        ))
    }

    fn make_char_node(&self, path: &Path, identity: DeviceIdentity, mode: u32) -> Result<()> {
        let dev = stat::makedev(identity.major, identity.minor);
        stat::mknod(path, SFlag::S_IFCHR, Mode::from_bits_truncate(mode), dev)?;
        Ok(())
    }

    fn set_mode(&self, path: &Path, mode: u32) -> Result<()> {
        fs::set_permissions(path, fs::Permissions::from_mode(mode))?;
        Ok(())
    }

    fn metadata(&self, path: &Path) -> Result<NodeMetadata> {
        let meta = fs::metadata(path)?;
        let owner = User::from_uid(Uid::from_raw(meta.uid()))
            .ok()
            .flatten()
            .map(|u| u.name);
        let group = Group::from_gid(Gid::from_raw(meta.gid()))
            .ok()
            .flatten()
            .map(|g| g.name);

        Ok(NodeMetadata {
            mode: meta.mode(),
            uid: meta.uid(),
            gid: meta.gid(),
            owner,
            group,
        })
    }

    fn can_read(&self, path: &Path) -> bool {
        unistd::access(path, AccessFlags::R_OK).is_ok()
    }

    fn can_write(&self, path: &Path) -> bool {
        unistd::access(path, AccessFlags::W_OK).is_ok()
    }
}
