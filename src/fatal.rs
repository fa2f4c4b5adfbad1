use std::error::Error;
use std::io;
use std::process;

use derive_more::{Display, Error};
use libc::c_int;

/// An error which can't be reported to a caller, because it occurs while releasing a resource in
/// a destructor. The process state is considered corrupted at that point, so the only sound
/// reaction is to stop.
pub(crate) trait Fatal: Error {
    fn abort(&self) -> ! {
        tracing::error!(error = %self, "unrecoverable descriptor failure, aborting");
        process::abort()
    }
}

#[derive(Debug, Display, Error)]
#[display("error while closing fd {fd}: {}", io::Error::from_raw_os_error(*errno))]
pub(crate) struct BadClose {
    pub fd: c_int,
    pub errno: c_int,
}
impl Fatal for BadClose {}

#[derive(Debug, Display, Error)]
#[display("error while closing directory stream of fd {fd}: {}", io::Error::from_raw_os_error(*errno))]
pub(crate) struct BadCloseDir {
    pub fd: c_int,
    pub errno: c_int,
}
impl Fatal for BadCloseDir {}

#[derive(Debug, Display, Error)]
#[display("error while unlocking fd {fd}: {}", io::Error::from_raw_os_error(*errno))]
pub(crate) struct BadUnlock {
    pub fd: c_int,
    pub errno: c_int,
}
impl Fatal for BadUnlock {}
