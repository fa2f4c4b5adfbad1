use std::fmt::{self, Debug, Formatter};

use libc::{
    O_APPEND, O_CREAT, O_EXCL, O_RDONLY, O_RDWR, O_TMPFILE, O_TRUNC, O_WRONLY, c_int, mode_t,
};

use crate::util::flags::{get_flag, set_flag};
use crate::util::fmt::Mode;

/// A builder for opening [`File`](super::File)s, with options mirroring the `open` flags.
///
/// New files are created with mode `0600`. [`executable`](FileOptions::executable),
/// [`group`](FileOptions::group) and [`others`](FileOptions::others) widen that.
#[derive(Clone, Default)]
pub struct FileOptions {
    read: bool,
    write: bool,
    flags: c_int,
    executable: bool,
    group: bool,
    others: bool,
}

impl FileOptions {
    pub fn new() -> FileOptions {
        FileOptions::default()
    }

    pub const fn read(&mut self, value: bool) -> &mut Self {
        self.read = value;
        self
    }

    pub const fn write(&mut self, value: bool) -> &mut Self {
        self.write = value;
        self
    }

    pub const fn append(&mut self, value: bool) -> &mut Self {
        set_flag!(self.flags, value, O_APPEND);
        self
    }

    pub const fn create(&mut self, value: bool) -> &mut Self {
        set_flag!(self.flags, value, O_CREAT);
        self
    }

    /// Fail if the file already exists. Only meaningful along with
    /// [`create`](FileOptions::create).
    pub const fn exclusive(&mut self, value: bool) -> &mut Self {
        set_flag!(self.flags, value, O_EXCL);
        self
    }

    /// Create an unnamed file in the directory the path refers to, which can later be given a
    /// name with [`File::link_to`](super::File::link_to). Requires write access.
    pub const fn tmpfile(&mut self, value: bool) -> &mut Self {
        set_flag!(self.flags, value, O_TMPFILE);
        self
    }

    pub const fn truncate(&mut self, value: bool) -> &mut Self {
        set_flag!(self.flags, value, O_TRUNC);
        self
    }

    pub const fn executable(&mut self, value: bool) -> &mut Self {
        self.executable = value;
        self
    }

    /// Grant the owning group the same access as the owner.
    pub const fn group(&mut self, value: bool) -> &mut Self {
        self.group = value;
        self
    }

    /// Grant everyone else the same access as the owner.
    pub const fn others(&mut self, value: bool) -> &mut Self {
        self.others = value;
        self
    }

    pub(crate) const fn flags(&self) -> c_int {
        let access = match (self.read, self.write) {
            (_, false) => O_RDONLY,
            (false, true) => O_WRONLY,
            (true, true) => O_RDWR,
        };
        access | self.flags
    }

    /// The mode applied to a newly created file.
    pub(crate) const fn mode(&self) -> mode_t {
        let execute = self.executable;
        let mut mode: mode_t = 0o600;
        if execute {
            mode |= 0o100;
        }
        if self.group {
            mode |= if execute { 0o070 } else { 0o060 };
        }
        if self.others {
            mode |= if execute { 0o007 } else { 0o006 };
        }
        mode
    }
}

impl Debug for FileOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileOptions")
            .field("read", &self.read)
            .field("write", &self.write)
            .field("append", &get_flag!(self.flags, O_APPEND))
            .field("create", &get_flag!(self.flags, O_CREAT))
            .field("exclusive", &get_flag!(self.flags, O_EXCL))
            .field("tmpfile", &get_flag!(self.flags, O_TMPFILE))
            .field("truncate", &get_flag!(self.flags, O_TRUNC))
            .field("mode", &Mode(self.mode()))
            .finish()
    }
}
