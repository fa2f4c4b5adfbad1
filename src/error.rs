use std::fmt::{self, Formatter};
use std::io;

use derive_more::{Display, Error, From, IsVariant};
use libc::c_int;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Any error produced by this crate.
///
/// Each variant wraps a struct describing one failure mode, so that a caller can either match on
/// the variant (or use the generated `is_*` methods) or simply propagate it with `?`.
#[derive(Debug, Display, From, Error, IsVariant)]
pub enum Error {
    Resolve(ResolveError),
    Locked(LockedError),
    MountInfo(MountInfoError),
    UnknownKind(UnknownKindError),
    RemovedDirectory(RemovedDirectoryError),
    UnreachableRoot(UnreachableRootError),
    EmptyPathname(EmptyPathnameError),
    NulByte(NulByteError),
}

impl Error {
    /// The raw OS error behind this error, if it was caused by a failed syscall.
    pub const fn errno(&self) -> Option<c_int> {
        match self {
            Error::Resolve(e) => Some(e.errno),
            Error::Locked(_) => Some(libc::EWOULDBLOCK),
            _ => None,
        }
    }
}

/// A failed syscall, along with the operands it was invoked with.
#[derive(Debug, Error)]
pub struct ResolveError {
    pub(crate) op: &'static str,
    pub(crate) target: String,
    pub(crate) errno: c_int,
}

impl ResolveError {
    pub(crate) fn new<T: fmt::Display + ?Sized>(op: &'static str, target: &T, errno: c_int) -> Self {
        ResolveError {
            op,
            target: target.to_string(),
            errno,
        }
    }

    pub const fn op(&self) -> &'static str {
        self.op
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub const fn errno(&self) -> c_int {
        self.errno
    }

    pub fn kind(&self) -> io::ErrorKind {
        io::Error::from_raw_os_error(self.errno).kind()
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed for {}: {}",
            self.op,
            self.target,
            io::Error::from_raw_os_error(self.errno)
        )
    }
}

impl From<ResolveError> for io::Error {
    fn from(value: ResolveError) -> Self {
        io::Error::from_raw_os_error(value.errno)
    }
}

/// A non-blocking lock couldn't be acquired because another holder is active.
#[derive(Debug, Display, Error)]
#[display("file already locked by another holder (fd {fd}, exclusive: {exclusive})")]
pub struct LockedError {
    pub fd: c_int,
    pub exclusive: bool,
}

#[derive(Debug, Display, Error)]
#[display("malformed mountinfo line: {line:?}")]
pub struct MountInfoError {
    pub line: String,
}

#[derive(Debug, Display, Error)]
#[display("unrecognized directory entry type: {_0}")]
pub struct UnknownKindError(#[error(not(source))] pub u8);

#[derive(Debug, Display, Error)]
#[display("directory no longer exists in its parent (origin fd {fd})")]
pub struct RemovedDirectoryError {
    pub fd: c_int,
}

#[derive(Debug, Display, Error)]
#[display("no mount point reachable from origin fd {fd}")]
pub struct UnreachableRootError {
    pub fd: c_int,
}

#[derive(Debug, Display, Error)]
#[display("pathname is empty")]
pub struct EmptyPathnameError;

#[derive(Debug, Display, Error)]
#[display("pathname contains a nul byte")]
pub struct NulByteError;
