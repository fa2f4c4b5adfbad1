use std::mem::MaybeUninit;
use std::sync::Arc;

use libc::{O_RDONLY, c_int, gid_t, mode_t, uid_t};

use crate::dir::Directory;
use crate::error::{ResolveError, Result};
use crate::fd::{DirFd, Fd};
use crate::file::File;
use crate::path::Path;
use crate::stats::{FsStats, Stats};
use crate::syscall;
use crate::util::sealed::Sealed;

/// The operations shared by every descriptor-bearing type: [`File`], [`Directory`] and
/// [`Object`].
pub trait Descriptor: Sealed {
    /// The held descriptor. It remains owned by `self`.
    fn raw_fd(&self) -> c_int;

    fn stat(&self) -> Result<Stats> {
        let mut raw: MaybeUninit<libc::stat> = MaybeUninit::uninit();
        // SAFETY: raw is a valid out pointer.
        syscall::cvt(unsafe { libc::fstat(self.raw_fd(), raw.as_mut_ptr()) })
            .map_err(|e| ResolveError::new("fstat", &DirFd(self.raw_fd()), e))?;
        // SAFETY: fstat succeeded, so it has initialized raw.
        Ok(Stats::from_stat(unsafe { raw.assume_init() }))
    }

    fn statvfs(&self) -> Result<FsStats> {
        let mut raw: MaybeUninit<libc::statvfs> = MaybeUninit::uninit();
        // SAFETY: raw is a valid out pointer.
        syscall::cvt_restart(|| unsafe { libc::fstatvfs(self.raw_fd(), raw.as_mut_ptr()) })
            .map_err(|e| ResolveError::new("fstatvfs", &DirFd(self.raw_fd()), e))?;
        // SAFETY: fstatvfs succeeded, so it has initialized raw.
        Ok(FsStats::from_statvfs(unsafe { raw.assume_init() }))
    }

    fn chmod(&self, mode: mode_t) -> Result<()> {
        let fd = self.raw_fd();
        // SAFETY: fchmod doesn't touch memory.
        syscall::cvt(unsafe { libc::fchmod(fd, mode) })
            .map_err(|e| ResolveError::new("fchmod", &format_args!("fd {fd}, mode 0o{mode:o}"), e))?;
        Ok(())
    }

    fn chown(&self, owner: uid_t, group: gid_t) -> Result<()> {
        let fd = self.raw_fd();
        // SAFETY: fchown doesn't touch memory.
        syscall::cvt(unsafe { libc::fchown(fd, owner, group) })
            .map_err(|e| ResolveError::new("fchown", &format_args!("fd {fd}, {owner}:{group}"), e))?;
        Ok(())
    }

    /// Flushes data and metadata to the storage device.
    fn fsync(&self) -> Result<()> {
        // SAFETY: fsync doesn't touch memory.
        syscall::cvt_restart(|| unsafe { libc::fsync(self.raw_fd()) })
            .map_err(|e| ResolveError::new("fsync", &DirFd(self.raw_fd()), e))?;
        Ok(())
    }

    /// Flushes data, and only the metadata needed to read it back.
    fn fdatasync(&self) -> Result<()> {
        // SAFETY: fdatasync doesn't touch memory.
        syscall::cvt_restart(|| unsafe { libc::fdatasync(self.raw_fd()) })
            .map_err(|e| ResolveError::new("fdatasync", &DirFd(self.raw_fd()), e))?;
        Ok(())
    }
}

/// An inode of any kind, opened read-only. Mostly useful for the [`Descriptor`] operations on
/// something that is neither a regular file nor a directory.
#[derive(Debug, Clone)]
pub struct Object {
    fd: Arc<Fd>,
}

impl Object {
    pub fn open(path: &Path) -> Result<Object> {
        Ok(Object {
            fd: Arc::new(path.make_handle(O_RDONLY, 0)?),
        })
    }
}

impl Sealed for Object {}

impl Descriptor for Object {
    fn raw_fd(&self) -> c_int {
        self.fd.get()
    }
}

impl From<&File> for Object {
    fn from(value: &File) -> Self {
        Object {
            fd: value.fd.clone(),
        }
    }
}

impl From<&Directory> for Object {
    fn from(value: &Directory) -> Self {
        Object {
            fd: value.fd.clone(),
        }
    }
}
