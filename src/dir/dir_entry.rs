use std::ffi::{OsStr, OsString};

use libc::ino_t;

use crate::kind::Kind;

/// A single entry of a directory, as reported by the directory stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub(crate) inode: ino_t,
    pub(crate) name: OsString,
    pub(crate) kind: Kind,
}

impl DirEntry {
    pub const fn inode(&self) -> ino_t {
        self.inode
    }

    pub fn name(&self) -> &OsStr {
        &self.name
    }

    pub fn into_name(self) -> OsString {
        self.name
    }

    /// The kind recorded in the directory itself. Filesystems which don't record kinds report
    /// [`Kind::Unknown`] for every entry.
    pub const fn kind(&self) -> Kind {
        self.kind
    }
}
