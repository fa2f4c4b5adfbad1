use std::fmt::{self, Debug, Formatter};

use libc::{
    O_ACCMODE, O_APPEND, O_CLOEXEC, O_CREAT, O_DIRECTORY, O_EXCL, O_NOATIME, O_NOCTTY, O_NOFOLLOW,
    O_NONBLOCK, O_PATH, O_TMPFILE, O_TRUNC, c_int,
};

use super::Context;
use crate::util::flags::{get_flag, set_flag};
use crate::util::fmt::Flags;

/// Flags which are decided per call and therefore can't be part of a context's policy.
pub(crate) const EXTRA_FLAGS_MASK: c_int = !(
    O_ACCMODE | O_APPEND | O_NOATIME | O_NOFOLLOW | O_CREAT | O_EXCL | O_TRUNC | O_TMPFILE
        | O_DIRECTORY | O_PATH
);

/// A builder for [`Context`], available via [`Context::options`].
///
/// By default, every descriptor is opened with `O_CLOEXEC`, `O_NOCTTY` and `O_NONBLOCK`, and
/// access times are updated as usual.
#[derive(Clone)]
pub struct ContextOptions {
    pub(crate) flags: c_int,
    pub(crate) avoid_access_time: bool,
}

impl ContextOptions {
    pub fn new() -> ContextOptions {
        ContextOptions::default()
    }

    /// Whether descriptors are closed across `exec`. Also decides the variant of `dup` and
    /// `pipe2` used by the context.
    pub const fn close_on_exec(&mut self, value: bool) -> &mut Self {
        set_flag!(self.flags, value, O_CLOEXEC);
        self
    }

    pub const fn no_controlling_terminal(&mut self, value: bool) -> &mut Self {
        set_flag!(self.flags, value, O_NOCTTY);
        self
    }

    pub const fn non_blocking(&mut self, value: bool) -> &mut Self {
        set_flag!(self.flags, value, O_NONBLOCK);
        self
    }

    /// Attempt every open with `O_NOATIME` first, falling back to a regular open where the
    /// kernel refuses it with `EPERM` (the caller doesn't own the file).
    pub const fn avoid_access_time(&mut self, value: bool) -> &mut Self {
        self.avoid_access_time = value;
        self
    }

    /// Replaces all additional flags at once. Flags controlling access mode, creation, type
    /// checks or symlink handling are stripped, as they are chosen per operation.
    pub const fn extra_flags(&mut self, value: c_int) -> &mut Self {
        self.flags = value & EXTRA_FLAGS_MASK;
        self
    }

    pub fn build<S: Into<String>>(&self, name: S) -> Context {
        Context::from_options(name.into(), self)
    }
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions {
            flags: O_CLOEXEC | O_NOCTTY | O_NONBLOCK,
            avoid_access_time: false,
        }
    }
}

impl Debug for ContextOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextOptions")
            .field("close_on_exec", &get_flag!(self.flags, O_CLOEXEC))
            .field("no_controlling_terminal", &get_flag!(self.flags, O_NOCTTY))
            .field("non_blocking", &get_flag!(self.flags, O_NONBLOCK))
            .field("avoid_access_time", &self.avoid_access_time)
            .field("flags", &Flags(self.flags))
            .finish()
    }
}
