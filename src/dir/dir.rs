use std::sync::Arc;

use libc::{O_DIRECTORY, O_RDONLY, c_int};

use super::{DirEntry, scan};
use crate::context::Context;
use crate::error::{ResolveError, Result};
use crate::fd::Fd;
use crate::object::Descriptor;
use crate::path::Path;
use crate::util::sealed::Sealed;

/// A directory held open for reading.
///
/// Reading a directory stream moves the descriptor's position, so [`list`](Directory::list) and
/// [`visit`](Directory::visit) read through a fresh descriptor for `.` instead, leaving this one
/// untouched. The consuming variants reuse the held descriptor when no clone shares it.
#[derive(Debug, Clone)]
pub struct Directory {
    pub(crate) fd: Arc<Fd>,
    context: Context,
}

impl Directory {
    pub fn open(path: &Path) -> Result<Directory> {
        let fd = path.make_handle(O_RDONLY | O_DIRECTORY, 0)?;
        Ok(Directory {
            fd: Arc::new(fd),
            context: path.origin().context().clone(),
        })
    }

    pub fn list(&self) -> Result<Vec<DirEntry>> {
        scan::collect(self.reopen()?)
    }

    /// Passes entries to `visitor` until it returns `true`. Returns whether it stopped early.
    pub fn visit<F: FnMut(DirEntry) -> bool>(&self, visitor: F) -> Result<bool> {
        scan::visit(self.reopen()?, visitor)
    }

    pub fn into_list(self) -> Result<Vec<DirEntry>> {
        scan::collect(self.into_fd()?)
    }

    pub fn into_visit<F: FnMut(DirEntry) -> bool>(self, visitor: F) -> Result<bool> {
        scan::visit(self.into_fd()?, visitor)
    }

    fn reopen(&self) -> Result<Fd, ResolveError> {
        self.context
            .openat(self.fd.get(), c".", O_RDONLY | O_DIRECTORY, 0)
    }

    fn into_fd(self) -> Result<Fd, ResolveError> {
        match Arc::try_unwrap(self.fd) {
            Ok(fd) => Ok(fd),
            Err(shared) => Directory {
                fd: shared,
                context: self.context,
            }
            .reopen(),
        }
    }
}

impl Sealed for Directory {}

impl Descriptor for Directory {
    fn raw_fd(&self) -> c_int {
        self.fd.get()
    }
}
