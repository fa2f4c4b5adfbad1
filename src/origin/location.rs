use std::ffi::{OsStr, OsString};
use std::mem::MaybeUninit;
use std::os::unix::ffi::{OsStrExt, OsStringExt};

use libc::{AT_SYMLINK_NOFOLLOW, O_DIRECTORY, O_NOFOLLOW, O_RDONLY, c_int, dev_t, ino_t};

use super::Origin;
use crate::dir::{self, DirEntry};
use crate::error::{RemovedDirectoryError, ResolveError, Result, UnreachableRootError};
use crate::fd::Fd;
use crate::kind::Kind;
use crate::mount;
use crate::path;
use crate::syscall;

// Each ".." is scanned for its child, so unlike an origin it must be readable.
const WALK_FLAGS: c_int = O_RDONLY | O_DIRECTORY | O_NOFOLLOW;

const CWD_MIN_SIZE: usize = 1 << 8;
const CWD_MAX_SIZE: usize = 1 << 16;

type Identity = (dev_t, ino_t);

/// Mount points of one device, as (inode of the mounted root, mount path). Sorted by inode, then
/// by the length and bytes of the path, so that lookups are deterministic when a directory is
/// mounted in several places.
struct Roots(Vec<(ino_t, OsString)>);

impl Roots {
    fn find(&self, inode: ino_t) -> Option<&OsStr> {
        let index = self.0.partition_point(|(i, _)| *i < inode);
        self.0
            .get(index)
            .filter(|(i, _)| *i == inode)
            .map(|(_, path)| path.as_os_str())
    }
}

impl Origin {
    /// Reconstructs the absolute pathname of the directory this origin refers to.
    ///
    /// For the working directory this is simply `getcwd`. Otherwise, nothing remembered about
    /// how the origin was opened is trusted: starting from the held descriptor, `..` is opened
    /// repeatedly and each parent is scanned for the entry carrying the inode of the level below,
    /// until a directory is found which is listed as a mount point in `/proc/self/mountinfo`.
    ///
    /// # Errors
    /// Besides failed syscalls, this fails with [`RemovedDirectoryError`] if a directory vanishes
    /// from its parent during the walk (it was removed or renamed concurrently) and with
    /// [`UnreachableRootError`] if no mount point is found before the walk leaves the device or
    /// reaches `/`.
    pub fn location(&self) -> Result<OsString> {
        if self.is_working() {
            return current_dir();
        }

        let origin_fd = self.fd().get();
        let context = self.context();

        let mut previous = identify(self.fd())?;
        let roots = self.mount_roots(previous.0)?;

        if let Some(root) = roots.find(previous.1) {
            tracing::trace!(fd = origin_fd, ?root, "origin is a mount point");
            return Ok(path::normalize(root));
        }

        let mut current = context.openat(origin_fd, c"..", WALK_FLAGS, 0)?;
        let mut next = identify(&current)?;
        // Collected from the deepest level upwards.
        let mut names: Vec<OsString> = Vec::new();

        loop {
            if next.0 != previous.0 {
                tracing::trace!(fd = origin_fd, "walk left the device without finding a mount");
                break;
            }
            if next == previous {
                tracing::trace!(fd = origin_fd, "walk reached a directory which is its own parent");
                break;
            }

            let parent = context.openat(current.get(), c"..", WALK_FLAGS, 0)?;

            let current_fd = current.get();
            let mut found = None;
            let mut failure = None;
            dir::visit(current, |entry| match is_child_directory(current_fd, &entry, previous.1) {
                Ok(true) => {
                    found = Some(entry.into_name());
                    true
                },
                Ok(false) => false,
                Err(e) => {
                    failure = Some(e);
                    true
                },
            })?;
            if let Some(e) = failure {
                Err(e)?
            }
            match found {
                Some(name) => names.push(name),
                None => Err(RemovedDirectoryError { fd: origin_fd })?,
            }

            if let Some(root) = roots.find(next.1) {
                let mut result = root.as_bytes().to_vec();
                for name in names.iter().rev() {
                    result.push(b'/');
                    result.extend_from_slice(name.as_bytes());
                }
                let result = path::normalize(OsStr::from_bytes(&result));
                tracing::debug!(fd = origin_fd, location = ?result, depth = names.len(), "resolved origin location");
                return Ok(result);
            }

            tracing::trace!(fd = origin_fd, name = ?names.last(), "walking up");
            previous = next;
            next = identify(&parent)?;
            current = parent;
        }

        Err(UnreachableRootError { fd: origin_fd }.into())
    }

    fn mount_roots(&self, device: dev_t) -> Result<Roots> {
        let root = self.working();
        let mounts = mount::find_mounts(&root)?;
        tracing::trace!(count = mounts.len(), device, "read mount table");

        let mut roots = Vec::new();
        for mount in mounts {
            if mount.device != device {
                continue;
            }
            let stats = root.path(&mount.path)?.follow(false).stat()?;
            // Hidden beneath another mount, its path now leads somewhere else.
            if stats.device != device {
                continue;
            }
            roots.push((stats.inode, mount.path));
        }

        roots.sort_by(|(l_inode, l_path), (r_inode, r_path)| {
            (l_inode, l_path.len(), l_path).cmp(&(r_inode, r_path.len(), r_path))
        });
        Ok(Roots(roots))
    }
}

fn identify(fd: &Fd) -> Result<Identity, ResolveError> {
    let raw = fd.stat()?;
    Ok((raw.st_dev, raw.st_ino))
}

/// Whether `entry`, found while scanning the directory `dir_fd`, is the directory with the given
/// inode. Entries without a recorded type are confirmed with a `stat`, whose failure is returned.
pub(super) fn is_child_directory(
    dir_fd: c_int,
    entry: &DirEntry,
    inode: ino_t,
) -> Result<bool, ResolveError> {
    if entry.inode() != inode {
        return Ok(false);
    }
    match entry.kind() {
        Kind::Directory => Ok(true),
        Kind::Unknown => {
            // Names read from a directory never contain a nul byte.
            let Ok(name) = syscall::c_pathname(entry.name()) else {
                return Ok(false);
            };
            let mut raw: MaybeUninit<libc::stat> = MaybeUninit::uninit();
            // SAFETY: name is nul-terminated and raw is a valid out pointer.
            syscall::cvt(unsafe {
                libc::fstatat(dir_fd, name.as_ptr(), raw.as_mut_ptr(), AT_SYMLINK_NOFOLLOW)
            })
            .map_err(|e| ResolveError::new("fstatat", &format_args!("fd {dir_fd}, {name:?}"), e))?;
            // SAFETY: fstatat succeeded, so it has initialized raw.
            let raw = unsafe { raw.assume_init() };
            Ok(Kind::from_stat_mode(raw.st_mode).is_directory() && raw.st_ino == inode)
        },
        _ => Ok(false),
    }
}

/// `getcwd` with a buffer growing from 256 bytes up to 64 KiB.
fn current_dir() -> Result<OsString> {
    let mut size = CWD_MIN_SIZE;
    loop {
        let mut buffer = vec![0_u8; size];
        // SAFETY: buffer is writable for size bytes.
        let rv = unsafe { libc::getcwd(buffer.as_mut_ptr().cast(), size) };
        if !rv.is_null() {
            let len = buffer.iter().position(|b| *b == 0).unwrap_or(size);
            buffer.truncate(len);
            return Ok(OsString::from_vec(buffer));
        }
        match syscall::err_no() {
            libc::ERANGE if size < CWD_MAX_SIZE => size *= 2,
            e => Err(ResolveError::new("getcwd", &format_args!("buffer of {size} bytes"), e))?,
        }
    }
}
