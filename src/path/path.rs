use std::ffi::{CStr, CString, OsStr, OsString};
use std::fmt::{self, Debug, Formatter};
use std::mem::MaybeUninit;
use std::os::unix::ffi::{OsStrExt, OsStringExt};

use libc::{
    AT_REMOVEDIR, AT_SYMLINK_FOLLOW, AT_SYMLINK_NOFOLLOW, O_DIRECTORY, O_NOFOLLOW, O_RDONLY,
    c_int, gid_t, mode_t, off_t, uid_t,
};

use super::normalize;
use crate::dir::{self, DirEntry};
use crate::error::{EmptyPathnameError, ResolveError, Result};
use crate::fd::Fd;
use crate::origin::Origin;
use crate::stats::{FsStats, Stats};
use crate::syscall;

const READLINK_MIN_SIZE: usize = 1 << 8;
const READLINK_MAX_SIZE: usize = 1 << 16;

/// A pathname relative to an [`Origin`].
///
/// A `Path` doesn't hold a descriptor. Every operation issues its own directory-relative syscall
/// against the origin, so the result always reflects the filesystem at the time of the call.
///
/// # Invariants
/// - The pathname is never empty.
/// - The pathname contains no `\0`.
#[derive(Clone)]
pub struct Path {
    origin: Origin,
    pathname: CString,
    follow: bool,
}

impl Path {
    pub(crate) fn new(origin: Origin, pathname: &OsStr, follow: bool) -> Result<Path> {
        if pathname.is_empty() {
            Err(EmptyPathnameError)?
        }
        Ok(Path {
            origin,
            pathname: syscall::c_pathname(pathname)?,
            follow,
        })
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn pathname(&self) -> &OsStr {
        OsStr::from_bytes(self.pathname.to_bytes())
    }

    /// Whether a symlink in the final component is followed.
    pub const fn is_following(&self) -> bool {
        self.follow
    }

    pub fn follow(&self, value: bool) -> Path {
        Path {
            follow: value,
            ..self.clone()
        }
    }

    /// Appends `pathname` to this path. An absolute `pathname` replaces it instead, and is
    /// resolved from the working-directory origin of the same context.
    pub fn joined<P: AsRef<OsStr>>(&self, pathname: P) -> Result<Path> {
        let pathname = pathname.as_ref();
        if pathname.as_bytes().first() == Some(&b'/') {
            Path::new(self.origin.working(), pathname, self.follow)
        } else {
            let mut joined = self.pathname.as_bytes().to_vec();
            joined.push(b'/');
            joined.extend_from_slice(pathname.as_bytes());
            Path::new(self.origin.clone(), &normalize(OsStr::from_bytes(&joined)), self.follow)
        }
    }

    /// Opens this path as a new origin.
    pub fn resolved(&self) -> Result<Origin> {
        self.origin.resolved(self.pathname(), self.follow)
    }

    /// The absolute pathname, without resolving symlinks or `..` components. A relative path is
    /// prefixed with the [location](Origin::location) of its origin.
    pub fn absolute(&self) -> Result<OsString> {
        let pathname = self.pathname.as_bytes();
        if pathname.first() == Some(&b'/') {
            return Ok(normalize(self.pathname()));
        }
        let mut result = self.origin.location()?.into_vec();
        result.push(b'/');
        result.extend_from_slice(pathname);
        Ok(normalize(OsStr::from_bytes(&result)))
    }

    pub(crate) fn make_handle(&self, flags: c_int, mode: mode_t) -> Result<Fd, ResolveError> {
        self.origin.make_handle(&self.pathname, flags | self.nofollow_flag(O_NOFOLLOW), mode)
    }

    pub fn stat(&self) -> Result<Stats> {
        let mut raw: MaybeUninit<libc::stat> = MaybeUninit::uninit();
        let flags = self.nofollow_flag(AT_SYMLINK_NOFOLLOW);
        // SAFETY: pathname is nul-terminated and raw is a valid out pointer.
        syscall::cvt(unsafe {
            libc::fstatat(self.dir_fd(), self.c_pathname(), raw.as_mut_ptr(), flags)
        })
        .map_err(|e| ResolveError::new("fstatat", self, e))?;
        // SAFETY: fstatat succeeded, so it has initialized raw.
        Ok(Stats::from_stat(unsafe { raw.assume_init() }))
    }

    pub fn chmod(&self, mode: mode_t) -> Result<()> {
        let flags = self.nofollow_flag(AT_SYMLINK_NOFOLLOW);
        // SAFETY: pathname is nul-terminated.
        syscall::cvt(unsafe { libc::fchmodat(self.dir_fd(), self.c_pathname(), mode, flags) })
            .map_err(|e| ResolveError::new("fchmodat", &format_args!("{self}, mode 0o{mode:o}"), e))?;
        Ok(())
    }

    pub fn chown(&self, owner: uid_t, group: gid_t) -> Result<()> {
        let flags = self.nofollow_flag(AT_SYMLINK_NOFOLLOW);
        // SAFETY: pathname is nul-terminated.
        syscall::cvt(unsafe {
            libc::fchownat(self.dir_fd(), self.c_pathname(), owner, group, flags)
        })
        .map_err(|e| ResolveError::new("fchownat", &format_args!("{self}, {owner}:{group}"), e))?;
        Ok(())
    }

    pub fn mkdir(&self, mode: mode_t) -> Result<()> {
        // SAFETY: pathname is nul-terminated.
        syscall::cvt(unsafe { libc::mkdirat(self.dir_fd(), self.c_pathname(), mode) })
            .map_err(|e| ResolveError::new("mkdirat", &format_args!("{self}, mode 0o{mode:o}"), e))?;
        Ok(())
    }

    pub fn rmdir(&self) -> Result<()> {
        // SAFETY: pathname is nul-terminated.
        syscall::cvt(unsafe { libc::unlinkat(self.dir_fd(), self.c_pathname(), AT_REMOVEDIR) })
            .map_err(|e| ResolveError::new("unlinkat", self, e))?;
        Ok(())
    }

    /// Creates `target` as a new hard link to this path.
    pub fn link(&self, target: &Path) -> Result<()> {
        let flags = self.follow_flag(AT_SYMLINK_FOLLOW);
        // SAFETY: Both pathnames are nul-terminated.
        syscall::cvt(unsafe {
            libc::linkat(
                self.dir_fd(),
                self.c_pathname(),
                target.dir_fd(),
                target.c_pathname(),
                flags,
            )
        })
        .map_err(|e| ResolveError::new("linkat", &format_args!("{self} -> {target}"), e))?;
        Ok(())
    }

    pub fn unlink(&self) -> Result<()> {
        // SAFETY: pathname is nul-terminated.
        syscall::cvt(unsafe { libc::unlinkat(self.dir_fd(), self.c_pathname(), 0) })
            .map_err(|e| ResolveError::new("unlinkat", self, e))?;
        Ok(())
    }

    pub fn rename(&self, target: &Path) -> Result<()> {
        // SAFETY: Both pathnames are nul-terminated.
        syscall::cvt(unsafe {
            libc::renameat(
                self.dir_fd(),
                self.c_pathname(),
                target.dir_fd(),
                target.c_pathname(),
            )
        })
        .map_err(|e| ResolveError::new("renameat", &format_args!("{self} -> {target}"), e))?;
        Ok(())
    }

    /// Reads the target of the symlink at this path.
    pub fn readlink(&self) -> Result<OsString> {
        let mut size = READLINK_MIN_SIZE;
        loop {
            let mut buffer = vec![0_u8; size];
            // SAFETY: pathname is nul-terminated and buffer is writable for size bytes.
            let count = syscall::cvt(unsafe {
                libc::readlinkat(
                    self.dir_fd(),
                    self.c_pathname(),
                    buffer.as_mut_ptr().cast(),
                    size,
                )
            })
            .map_err(|e| ResolveError::new("readlinkat", self, e))? as usize;

            // A full buffer may have truncated the target.
            if count < size {
                buffer.truncate(count);
                return Ok(OsString::from_vec(buffer));
            }
            if size >= READLINK_MAX_SIZE {
                Err(ResolveError::new("readlinkat", self, libc::ENAMETOOLONG))?
            }
            size *= 2;
        }
    }

    /// Creates a symlink at this path, pointing to `value`.
    pub fn symlink<P: AsRef<OsStr>>(&self, value: P) -> Result<()> {
        let value = syscall::c_pathname(value.as_ref())?;
        // SAFETY: Both strings are nul-terminated.
        syscall::cvt(unsafe { libc::symlinkat(value.as_ptr(), self.dir_fd(), self.c_pathname()) })
            .map_err(|e| ResolveError::new("symlinkat", &format_args!("{self} -> {value:?}"), e))?;
        Ok(())
    }

    /// All entries of the directory at this path, excluding `.` and `..`.
    pub fn list(&self) -> Result<Vec<DirEntry>> {
        dir::collect(self.open_listing()?)
    }

    /// Passes the entries of the directory at this path to `visitor` until it returns `true`.
    /// Returns whether the visitor stopped early.
    pub fn visit<F: FnMut(DirEntry) -> bool>(&self, visitor: F) -> Result<bool> {
        dir::visit(self.open_listing()?, visitor)
    }

    fn open_listing(&self) -> Result<Fd, ResolveError> {
        let flags = O_RDONLY | O_DIRECTORY | self.nofollow_flag(O_NOFOLLOW);
        self.origin.make_handle(&self.pathname, flags, 0)
    }

    /// Statistics of the filesystem containing this path.
    pub fn statvfs(&self) -> Result<FsStats> {
        let absolute = syscall::c_pathname(&self.absolute()?)?;
        let mut raw: MaybeUninit<libc::statvfs> = MaybeUninit::uninit();
        // SAFETY: absolute is nul-terminated and raw is a valid out pointer.
        syscall::cvt_restart(|| unsafe { libc::statvfs(absolute.as_ptr(), raw.as_mut_ptr()) })
            .map_err(|e| ResolveError::new("statvfs", self, e))?;
        // SAFETY: statvfs succeeded, so it has initialized raw.
        Ok(FsStats::from_statvfs(unsafe { raw.assume_init() }))
    }

    pub fn truncate(&self, length: off_t) -> Result<()> {
        let absolute = syscall::c_pathname(&self.absolute()?)?;
        // SAFETY: absolute is nul-terminated.
        syscall::cvt(unsafe { libc::truncate(absolute.as_ptr(), length) })
            .map_err(|e| ResolveError::new("truncate", &format_args!("{self}, length {length}"), e))?;
        Ok(())
    }

    pub(crate) fn dir_fd(&self) -> c_int {
        self.origin.dir_fd()
    }

    fn c_pathname(&self) -> *const libc::c_char {
        self.pathname.as_ptr()
    }

    pub(crate) fn c_str(&self) -> &CStr {
        &self.pathname
    }

    /// `flag` if the final component is followed, nothing otherwise.
    const fn follow_flag(&self, flag: c_int) -> c_int {
        if self.follow { flag } else { 0 }
    }

    /// `flag` if the final component is not followed, nothing otherwise.
    const fn nofollow_flag(&self, flag: c_int) -> c_int {
        if self.follow { 0 } else { flag }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} in {}", self.pathname(), self.origin)
    }
}

impl Debug for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("origin", &self.origin)
            .field("pathname", &self.pathname())
            .field("follow", &self.follow)
            .finish()
    }
}
