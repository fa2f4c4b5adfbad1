use libc::{LOCK_EX, LOCK_NB, LOCK_SH, LOCK_UN, c_int};

use super::File;
use crate::error::{LockedError, ResolveError, Result};
use crate::fatal::{BadUnlock, Fatal};
use crate::syscall;

/// An advisory `flock` lock on a [`File`], released when dropped.
///
/// The lock belongs to the open file description, so it is shared with clones of the file and
/// with duplicates made by [`File::try_clone`], but not with independent opens of the same path.
#[derive(Debug)]
pub struct Lock {
    file: File,
    exclusive: bool,
}

impl Lock {
    pub(crate) fn acquire(file: File, exclusive: bool, blocking: bool) -> Result<Lock> {
        let fd = file.fd.get();
        let operation = (if exclusive { LOCK_EX } else { LOCK_SH }) | (if blocking { 0 } else { LOCK_NB });

        // SAFETY: flock doesn't touch memory.
        match syscall::cvt_restart(|| unsafe { libc::flock(fd, operation) }) {
            Ok(_) => {
                tracing::trace!(fd, exclusive, "acquired lock");
                Ok(Lock { file, exclusive })
            },
            Err(libc::EWOULDBLOCK) => Err(LockedError { fd, exclusive })?,
            Err(e) => Err(ResolveError::new(
                "flock",
                &format_args!("fd {fd}, {}", describe(operation)),
                e,
            ))?,
        }
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub const fn is_exclusive(&self) -> bool {
        self.exclusive
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        let fd = self.file.fd.get();
        // SAFETY: flock doesn't touch memory.
        if let Err(errno) = syscall::cvt_restart(|| unsafe { libc::flock(fd, LOCK_UN) }) {
            BadUnlock { fd, errno }.abort();
        }
        tracing::trace!(fd, "released lock");
    }
}

fn describe(operation: c_int) -> &'static str {
    match (operation & LOCK_EX != 0, operation & LOCK_NB != 0) {
        (true, true) => "exclusive, non-blocking",
        (true, false) => "exclusive",
        (false, true) => "shared, non-blocking",
        (false, false) => "shared",
    }
}
