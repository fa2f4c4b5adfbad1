use std::ptr;

use libc::{SPLICE_F_MOVE, c_int, loff_t, off_t};

use super::File;
use crate::error::{ResolveError, Result};
use crate::fd::Fd;
use crate::syscall;

/// A pipe for moving data into a [`File`] with `splice`, without copying it through userspace.
///
/// [`fill`](Channel::fill) moves bytes from any file into the pipe, [`drain`](Channel::drain)
/// moves them from the pipe into the channel's file. The pipe holds a limited amount of data
/// (64 KiB by default), so a fill larger than that blocks until the pipe is drained.
#[derive(Debug)]
pub struct Channel {
    file: File,
    read: Fd,
    write: Fd,
}

impl Channel {
    pub(crate) fn new(file: File) -> Result<Channel> {
        let (read, write) = file.context().pipe()?;
        Ok(Channel { file, read, write })
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    /// Moves up to `size` bytes from `source`, starting at `offset`, into the pipe. Returns the
    /// number of bytes moved, `0` at the end of `source`.
    pub fn fill(&self, source: &File, size: usize, offset: off_t) -> Result<usize> {
        let mut position = loff_t::from(offset);
        splice(source.fd.get(), &mut position, self.write.get(), ptr::null_mut(), size)
    }

    /// Moves up to `size` bytes from the pipe into the channel's file, starting at `offset`.
    /// Returns the number of bytes moved.
    pub fn drain(&self, size: usize, offset: off_t) -> Result<usize> {
        let mut position = loff_t::from(offset);
        splice(self.read.get(), ptr::null_mut(), self.file.fd.get(), &mut position, size)
    }
}

fn splice(
    fd_in: c_int,
    offset_in: *mut loff_t,
    fd_out: c_int,
    offset_out: *mut loff_t,
    size: usize,
) -> Result<usize> {
    // SAFETY: Each offset is either null or points to a live loff_t.
    let count = syscall::cvt_restart(|| unsafe {
        libc::splice(fd_in, offset_in, fd_out, offset_out, size, SPLICE_F_MOVE)
    })
    .map_err(|e| {
        ResolveError::new("splice", &format_args!("fd {fd_in} -> fd {fd_out}, size {size}"), e)
    })?;
    tracing::trace!(fd_in, fd_out, count, "spliced");
    Ok(count as usize)
}
