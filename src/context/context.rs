use std::ffi::{CStr, OsStr};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use libc::{O_CLOEXEC, O_NOATIME, c_int, mode_t};

use super::ContextOptions;
use crate::error::{ResolveError, Result};
use crate::fd::{DirFd, Fd};
use crate::origin::Origin;
use crate::syscall;
use crate::util::fmt::Flags;

/// The open-flag policy shared by a tree of [`Origin`]s and [`Path`](crate::Path)s.
///
/// Cloning a `Context` only clones a reference to the same immutable configuration.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    name: String,
    additional_flags: c_int,
    avoid_access_time: bool,
}

impl Context {
    /// Creates a context with the default policy, see [`ContextOptions`].
    pub fn new<S: Into<String>>(name: S) -> Context {
        ContextOptions::new().build(name)
    }

    pub fn options() -> ContextOptions {
        ContextOptions::new()
    }

    pub(crate) fn from_options(name: String, options: &ContextOptions) -> Context {
        Context {
            inner: Arc::new(ContextInner {
                name,
                additional_flags: options.flags,
                avoid_access_time: options.avoid_access_time,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn additional_flags(&self) -> c_int {
        self.inner.additional_flags
    }

    pub fn avoids_access_time(&self) -> bool {
        self.inner.avoid_access_time
    }

    /// An origin referring to the current working directory of the process, whatever it is at
    /// the time of each lookup.
    pub fn working(&self) -> Origin {
        Origin::working_in(self.clone())
    }

    /// Opens `pathname` as a new origin, relative to the current working directory.
    pub fn resolved<P: AsRef<OsStr>>(&self, pathname: P, follow: bool) -> Result<Origin> {
        self.working().resolved(pathname, follow)
    }

    pub(crate) fn openat(
        &self,
        dir_fd: c_int,
        pathname: &CStr,
        flags: c_int,
        mode: mode_t,
    ) -> Result<Fd, ResolveError> {
        let flags = flags | self.inner.additional_flags;

        if self.inner.avoid_access_time && flags & O_NOATIME == 0 {
            match raw_openat(dir_fd, pathname, flags | O_NOATIME, mode) {
                Ok(fd) => return Ok(fd),
                Err(libc::EPERM) => tracing::trace!(
                    ?pathname,
                    "O_NOATIME refused, retrying without it"
                ),
                Err(e) => Err(ResolveError::new(
                    "openat",
                    &format_args!(
                        "{}, {:?}, flags 0x{:x}",
                        DirFd(dir_fd),
                        pathname,
                        flags | O_NOATIME
                    ),
                    e,
                ))?,
            }
        }

        raw_openat(dir_fd, pathname, flags, mode).map_err(|e| {
            ResolveError::new(
                "openat",
                &format_args!(
                    "{}, {:?}, flags 0x{:x}, mode 0o{:o}",
                    DirFd(dir_fd),
                    pathname,
                    flags,
                    mode
                ),
                e,
            )
        })
    }

    /// Duplicates `fd`, marking the copy close-on-exec if the context does so for opens.
    pub(crate) fn dup(&self, fd: c_int) -> Result<Fd, ResolveError> {
        let operation = if self.inner.additional_flags & O_CLOEXEC != 0 {
            libc::F_DUPFD_CLOEXEC
        } else {
            libc::F_DUPFD
        };
        // SAFETY: F_DUPFD(_CLOEXEC) only allocates a new descriptor.
        syscall::cvt(unsafe { libc::fcntl(fd, operation, 0) })
            .map(Fd::from_raw)
            .map_err(|e| ResolveError::new("fcntl", &format_args!("fd {fd}, op {operation}"), e))
    }

    /// Creates a pipe, returning the read and write ends in that order.
    pub(crate) fn pipe(&self) -> Result<(Fd, Fd), ResolveError> {
        let mut fds: [c_int; 2] = [-1, -1];
        let flags = self.inner.additional_flags & O_CLOEXEC;
        // SAFETY: fds has room for the two descriptors written by pipe2.
        syscall::cvt(unsafe { libc::pipe2(fds.as_mut_ptr(), flags) })
            .map_err(|e| ResolveError::new("pipe2", &format_args!("flags 0x{flags:x}"), e))?;
        Ok((Fd::from_raw(fds[0]), Fd::from_raw(fds[1])))
    }
}

fn raw_openat(dir_fd: c_int, pathname: &CStr, flags: c_int, mode: mode_t) -> Result<Fd, c_int> {
    // SAFETY: pathname is nul-terminated and outlives the call.
    syscall::cvt(unsafe { libc::openat(dir_fd, pathname.as_ptr(), flags, mode) }).map(Fd::from_raw)
}

impl Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("name", &self.inner.name)
            .field("additional_flags", &Flags(self.inner.additional_flags))
            .field("avoid_access_time", &self.inner.avoid_access_time)
            .finish()
    }
}
