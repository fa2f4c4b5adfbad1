use std::ffi::{CString, OsStr};
use std::io;
use std::os::unix::ffi::OsStrExt;

use libc::c_int;

use crate::error::NulByteError;

pub(crate) fn err_no() -> c_int {
    io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// A raw syscall return value, where `-1` signals failure through `errno`.
pub(crate) trait SysResult: Copy {
    fn is_failure(self) -> bool;
}

impl SysResult for c_int {
    fn is_failure(self) -> bool {
        self == -1
    }
}

impl SysResult for isize {
    fn is_failure(self) -> bool {
        self == -1
    }
}

/// Converts a raw return value into a result holding the current `errno` on failure.
pub(crate) fn cvt<T: SysResult>(rv: T) -> Result<T, c_int> {
    if rv.is_failure() {
        Err(err_no())
    } else {
        Ok(rv)
    }
}

/// Like [`cvt`], but restarts the call for as long as it fails with `EINTR`.
pub(crate) fn cvt_restart<T: SysResult, F: FnMut() -> T>(mut call: F) -> Result<T, c_int> {
    loop {
        match cvt(call()) {
            Err(libc::EINTR) => continue,
            other => return other,
        }
    }
}

/// Same as [`cvt_restart`], for the `posix_*` family which returns the error number directly.
pub(crate) fn cvt_restart_direct<F: FnMut() -> c_int>(mut call: F) -> Result<(), c_int> {
    loop {
        match call() {
            0 => return Ok(()),
            libc::EINTR => continue,
            e => return Err(e),
        }
    }
}

pub(crate) fn c_pathname(pathname: &OsStr) -> Result<CString, NulByteError> {
    CString::new(pathname.as_bytes()).map_err(|_| NulByteError)
}
