use std::ffi::OsStr;
use std::io::{IoSlice, IoSliceMut};
use std::sync::Arc;

use libc::{AT_FDCWD, AT_SYMLINK_FOLLOW, c_int, off_t};

use super::{Advice, Channel, FileOptions, Lock};
use crate::context::Context;
use crate::error::{ResolveError, Result};
use crate::fd::Fd;
use crate::object::Descriptor;
use crate::path::Path;
use crate::syscall;
use crate::util::sealed::Sealed;

const READ_MIN_SIZE: usize = 1 << 12;

/// An open file.
///
/// All I/O is positional, so a `File` has no cursor to share and clones can be used freely from
/// several places. Clones share the descriptor, which is closed once the last one is dropped.
#[derive(Debug, Clone)]
pub struct File {
    pub(crate) fd: Arc<Fd>,
    context: Context,
}

impl File {
    pub fn open(path: &Path, options: &FileOptions) -> Result<File> {
        let fd = path.make_handle(options.flags(), options.mode())?;
        tracing::trace!(fd = fd.get(), %path, ?options, "opened file");
        Ok(File {
            fd: Arc::new(fd),
            context: path.origin().context().clone(),
        })
    }

    pub fn options() -> FileOptions {
        FileOptions::new()
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Reads into `buffer` starting at `offset`. Returns the number of bytes read, which is `0`
    /// at the end of the file.
    pub fn read_at(&self, buffer: &mut [u8], offset: off_t) -> Result<usize> {
        let fd = self.fd.get();
        // SAFETY: buffer is writable for its whole length.
        let count = syscall::cvt_restart(|| unsafe {
            libc::pread(fd, buffer.as_mut_ptr().cast(), buffer.len(), offset)
        })
        .map_err(|e| ResolveError::new("pread", &format_args!("fd {fd}, offset {offset}"), e))?;
        Ok(count as usize)
    }

    pub fn write_at(&self, buffer: &[u8], offset: off_t) -> Result<usize> {
        let fd = self.fd.get();
        // SAFETY: buffer is readable for its whole length.
        let count = syscall::cvt_restart(|| unsafe {
            libc::pwrite(fd, buffer.as_ptr().cast(), buffer.len(), offset)
        })
        .map_err(|e| ResolveError::new("pwrite", &format_args!("fd {fd}, offset {offset}"), e))?;
        Ok(count as usize)
    }

    pub fn read_vectored_at(&self, buffers: &mut [IoSliceMut<'_>], offset: off_t) -> Result<usize> {
        let fd = self.fd.get();
        let count = buffers.len() as c_int;
        // SAFETY: IoSliceMut is ABI compatible with iovec, and every slice is writable.
        let read = syscall::cvt_restart(|| unsafe {
            libc::preadv(fd, buffers.as_ptr().cast(), count, offset)
        })
        .map_err(|e| ResolveError::new("preadv", &format_args!("fd {fd}, offset {offset}"), e))?;
        Ok(read as usize)
    }

    pub fn write_vectored_at(&self, buffers: &[IoSlice<'_>], offset: off_t) -> Result<usize> {
        let fd = self.fd.get();
        let count = buffers.len() as c_int;
        // SAFETY: IoSlice is ABI compatible with iovec, and every slice is readable.
        let written = syscall::cvt_restart(|| unsafe {
            libc::pwritev(fd, buffers.as_ptr().cast(), count, offset)
        })
        .map_err(|e| ResolveError::new("pwritev", &format_args!("fd {fd}, offset {offset}"), e))?;
        Ok(written as usize)
    }

    /// Reads the whole file from the start. Works for files which don't report their size, such
    /// as those under `/proc`.
    pub fn read_to_end(&self) -> Result<Vec<u8>> {
        let mut buffer = vec![0_u8; READ_MIN_SIZE];
        let mut len = 0;
        loop {
            if len == buffer.len() {
                buffer.resize(len * 2, 0);
            }
            match self.read_at(&mut buffer[len..], len as off_t)? {
                0 => break,
                count => len += count,
            }
        }
        buffer.truncate(len);
        Ok(buffer)
    }

    pub fn truncate(&self, length: off_t) -> Result<()> {
        let fd = self.fd.get();
        // SAFETY: ftruncate doesn't touch memory.
        syscall::cvt_restart(|| unsafe { libc::ftruncate(fd, length) })
            .map_err(|e| ResolveError::new("ftruncate", &format_args!("fd {fd}, length {length}"), e))?;
        Ok(())
    }

    /// Reserves storage for the given range, extending the file if needed.
    pub fn allocate(&self, offset: off_t, length: off_t) -> Result<()> {
        let fd = self.fd.get();
        // SAFETY: posix_fallocate doesn't touch memory.
        syscall::cvt_restart_direct(|| unsafe { libc::posix_fallocate(fd, offset, length) })
            .map_err(|e| {
                ResolveError::new(
                    "posix_fallocate",
                    &format_args!("fd {fd}, offset {offset}, length {length}"),
                    e,
                )
            })?;
        Ok(())
    }

    pub fn advise(&self, offset: off_t, length: off_t, advice: Advice) -> Result<()> {
        let fd = self.fd.get();
        // SAFETY: posix_fadvise doesn't touch memory.
        match unsafe { libc::posix_fadvise(fd, offset, length, advice.raw()) } {
            0 => Ok(()),
            e => Err(ResolveError::new(
                "posix_fadvise",
                &format_args!("fd {fd}, offset {offset}, length {length}, {advice:?}"),
                e,
            )
            .into()),
        }
    }

    /// Gives the open file a new name at `target`. Also works for files opened with
    /// [`FileOptions::tmpfile`], as long as they weren't opened exclusively.
    pub fn link_to(&self, target: &Path) -> Result<()> {
        let fd = self.fd.get();
        let source = syscall::c_pathname(OsStr::new(&format!("/proc/self/fd/{fd}")))?;
        // SAFETY: Both pathnames are nul-terminated.
        syscall::cvt(unsafe {
            libc::linkat(
                AT_FDCWD,
                source.as_ptr(),
                target.dir_fd(),
                target.c_str().as_ptr(),
                AT_SYMLINK_FOLLOW,
            )
        })
        .map_err(|e| ResolveError::new("linkat", &format_args!("fd {fd} -> {target}"), e))?;
        Ok(())
    }

    /// Duplicates the descriptor. Unlike a clone, the copy is closed independently, but it still
    /// shares the file offset, status flags and locks.
    pub fn try_clone(&self) -> Result<File> {
        Ok(File {
            fd: Arc::new(self.context.dup(self.fd.get())?),
            context: self.context.clone(),
        })
    }

    /// Takes an advisory lock on the whole file. A non-blocking attempt fails with
    /// [`LockedError`](crate::LockedError) while another holder is active.
    pub fn lock(&self, exclusive: bool, blocking: bool) -> Result<Lock> {
        Lock::acquire(self.clone(), exclusive, blocking)
    }

    /// Creates a pipe for moving data into this file without copying it through userspace.
    pub fn channel(&self) -> Result<Channel> {
        Channel::new(self.clone())
    }
}

impl Sealed for File {}

impl Descriptor for File {
    fn raw_fd(&self) -> c_int {
        self.fd.get()
    }
}
