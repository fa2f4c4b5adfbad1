use std::fmt::{self, Debug, Formatter};
use std::mem;
use std::mem::MaybeUninit;

use libc::{c_int, stat};

use crate::error::ResolveError;
use crate::fatal::{BadClose, Fatal};
use crate::syscall;

const ABSENT: c_int = -1;

/// An owned file descriptor, or nothing.
///
/// The descriptor is closed exactly once, when the `Fd` is dropped. A failed close can't be
/// reported from there and aborts the process.
pub(crate) struct Fd(c_int);

impl Fd {
    pub const fn absent() -> Fd {
        Fd(ABSENT)
    }

    /// Adopts `fd`, which must be open and not owned by anything else.
    pub const fn from_raw(fd: c_int) -> Fd {
        Fd(fd)
    }

    pub const fn is_absent(&self) -> bool {
        self.0 == ABSENT
    }

    pub const fn get(&self) -> c_int {
        self.0
    }

    /// Returns the held descriptor, or `alternate` if there is none. Used to substitute
    /// `AT_FDCWD` when issuing directory-relative syscalls.
    pub const fn get_or(&self, alternate: c_int) -> c_int {
        if self.is_absent() { alternate } else { self.0 }
    }

    /// Gives up ownership without closing, leaving this handle absent.
    pub const fn release(&mut self) -> c_int {
        mem::replace(&mut self.0, ABSENT)
    }

    pub fn stat(&self) -> Result<stat, ResolveError> {
        let mut raw: MaybeUninit<stat> = MaybeUninit::uninit();
        // SAFETY: raw is a valid out pointer for the duration of the call.
        syscall::cvt(unsafe { libc::fstat(self.0, raw.as_mut_ptr()) })
            .map_err(|e| ResolveError::new("fstat", self, e))?;
        // SAFETY: fstat succeeded, so it has initialized raw.
        Ok(unsafe { raw.assume_init() })
    }
}

impl Default for Fd {
    fn default() -> Self {
        Fd::absent()
    }
}

impl Drop for Fd {
    fn drop(&mut self) {
        if self.is_absent() {
            return;
        }
        let fd = self.release();
        // SAFETY: fd is owned by this handle and released above, so it is closed only once.
        if unsafe { libc::close(fd) } == -1 {
            BadClose { fd, errno: syscall::err_no() }.abort();
        }
    }
}

impl Debug for Fd {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_absent() {
            write!(f, "Fd(absent)")
        } else {
            write!(f, "Fd({})", self.0)
        }
    }
}

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_absent() {
            write!(f, "fd (absent)")
        } else {
            write!(f, "fd {}", self.0)
        }
    }
}

/// Renders a directory descriptor operand, which may be `AT_FDCWD`.
pub(crate) struct DirFd(pub c_int);

impl fmt::Display for DirFd {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            libc::AT_FDCWD => write!(f, "cwd"),
            fd => write!(f, "fd {fd}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_null() -> Fd {
        // SAFETY: The pathname is a valid nul-terminated string.
        let fd = unsafe { libc::open(c"/dev/null".as_ptr(), libc::O_RDONLY | libc::O_CLOEXEC) };
        assert_ne!(fd, -1, "/dev/null should be openable.");
        Fd::from_raw(fd)
    }

    #[test]
    fn test_absent() {
        let fd = Fd::default();
        assert!(fd.is_absent());
        assert_eq!(
            fd.get_or(libc::AT_FDCWD), libc::AT_FDCWD,
            "An absent handle should substitute the alternate."
        );
        assert_eq!(format!("{fd:?}"), "Fd(absent)");
        assert_eq!(fd.to_string(), "fd (absent)", "Display should never show the sentinel.");
    }

    #[test]
    fn test_release() {
        let mut fd = open_null();
        let raw = fd.get();
        assert_eq!(fd.get_or(libc::AT_FDCWD), raw);

        assert_eq!(fd.release(), raw);
        assert!(fd.is_absent(), "Releasing should leave the handle absent.");

        // Ownership was handed back to us, so close it manually.
        let taken = Fd::from_raw(raw);
        assert!(taken.stat().is_ok(), "A released descriptor should still be open.");
    }
}
