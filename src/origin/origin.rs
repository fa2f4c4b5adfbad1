use std::ffi::{CStr, OsStr};
use std::fmt::{self, Debug, Formatter};
use std::mem::MaybeUninit;
use std::sync::Arc;

use libc::{AT_FDCWD, O_DIRECTORY, O_NOFOLLOW, O_PATH, O_RDONLY, c_int, dev_t, ino_t, mode_t};

use crate::context::Context;
use crate::error::{ResolveError, Result};
use crate::fd::{DirFd, Fd};
use crate::path::Path;
use crate::syscall;

/// A directory anchor that pathnames are resolved against.
///
/// Cloning an `Origin` shares the underlying descriptor. Each [`resolved`](Origin::resolved)
/// step opens a new one, so origins form a tree rooted at the working directory.
#[derive(Clone)]
pub struct Origin {
    inner: Arc<OriginInner>,
}

struct OriginInner {
    context: Context,
    // Absent for the working directory.
    fd: Fd,
}

impl Origin {
    pub(crate) fn working_in(context: Context) -> Origin {
        Origin {
            inner: Arc::new(OriginInner {
                context,
                fd: Fd::absent(),
            }),
        }
    }

    fn open_in(context: Context, dir_fd: c_int, pathname: &OsStr, follow: bool) -> Result<Origin> {
        let pathname = syscall::c_pathname(pathname)?;
        let flags = O_RDONLY | O_DIRECTORY | O_PATH | (if follow { 0 } else { O_NOFOLLOW });
        let fd = context.openat(dir_fd, &pathname, flags, 0)?;

        Ok(Origin {
            inner: Arc::new(OriginInner { context, fd }),
        })
    }

    pub fn context(&self) -> &Context {
        &self.inner.context
    }

    /// Whether this origin is the working directory rather than an opened directory.
    pub fn is_working(&self) -> bool {
        self.inner.fd.is_absent()
    }

    /// An origin for the working directory, sharing this origin's context.
    pub fn working(&self) -> Origin {
        Origin::working_in(self.inner.context.clone())
    }

    /// Opens `pathname` relative to this origin as a new origin. The final component is only
    /// followed if it is a symlink and `follow` is set.
    pub fn resolved<P: AsRef<OsStr>>(&self, pathname: P, follow: bool) -> Result<Origin> {
        Origin::open_in(
            self.inner.context.clone(),
            self.dir_fd(),
            pathname.as_ref(),
            follow,
        )
    }

    /// Creates a [`Path`] relative to this origin, following a final symlink by default.
    pub fn path<P: AsRef<OsStr>>(&self, pathname: P) -> Result<Path> {
        Path::new(self.clone(), pathname.as_ref(), true)
    }

    pub(crate) fn dir_fd(&self) -> c_int {
        self.inner.fd.get_or(AT_FDCWD)
    }

    pub(crate) fn make_handle(
        &self,
        pathname: &CStr,
        flags: c_int,
        mode: mode_t,
    ) -> Result<Fd, ResolveError> {
        self.inner.context.openat(self.dir_fd(), pathname, flags, mode)
    }

    pub(crate) fn fd(&self) -> &Fd {
        &self.inner.fd
    }

    /// The device and inode numbers of the directory this origin refers to. For the working
    /// directory, these are looked up at the time of the call.
    pub fn identity(&self) -> Result<(dev_t, ino_t)> {
        let raw = if self.is_working() {
            let mut raw: MaybeUninit<libc::stat> = MaybeUninit::uninit();
            // SAFETY: "." is nul-terminated and raw is a valid out pointer.
            syscall::cvt(unsafe { libc::fstatat(AT_FDCWD, c".".as_ptr(), raw.as_mut_ptr(), 0) })
                .map_err(|e| ResolveError::new("fstatat", self, e))?;
            // SAFETY: fstatat succeeded, so it has initialized raw.
            unsafe { raw.assume_init() }
        } else {
            self.inner.fd.stat()?
        };
        Ok((raw.st_dev, raw.st_ino))
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", DirFd(self.dir_fd()))
    }
}

impl Debug for Origin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Origin")
            .field("context", &self.inner.context.name())
            .field("fd", &self.inner.fd)
            .finish()
    }
}
