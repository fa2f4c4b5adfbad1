use std::ffi::{CStr, OsString};
use std::mem;
use std::os::unix::ffi::OsStringExt;
use std::ptr;

use libc::{DIR, c_int, dirent};

use super::DirEntry;
use crate::error::{ResolveError, Result};
use crate::fatal::{BadCloseDir, Fatal};
use crate::fd::{DirFd, Fd};
use crate::kind::Kind;
use crate::syscall;

/// An open directory stream. Owns the descriptor it was created from, which is closed along with
/// the stream.
struct DirStream {
    dir: *mut DIR,
    fd: c_int,
    // Storage for one entry, kept as u64 for the alignment of dirent.
    buffer: Vec<u64>,
}

impl DirStream {
    fn open(mut fd: Fd) -> Result<DirStream, ResolveError> {
        let raw = fd.get();
        // SAFETY: raw is an open descriptor owned by fd.
        let dir = unsafe { libc::fdopendir(raw) };
        if dir.is_null() {
            // fd still owns the descriptor and closes it.
            return Err(ResolveError::new("fdopendir", &fd, syscall::err_no()));
        }
        // The stream owns the descriptor from here on.
        fd.release();
        tracing::trace!(fd = raw, "opened directory stream");

        let size = entry_size(raw);
        Ok(DirStream {
            dir,
            fd: raw,
            buffer: vec![0; size.div_ceil(mem::size_of::<u64>())],
        })
    }

    fn next(&mut self) -> Result<Option<DirEntry>> {
        loop {
            let entry: *mut dirent = self.buffer.as_mut_ptr().cast();
            let mut result: *mut dirent = ptr::null_mut();
            // SAFETY: dir is a valid stream until dropped and entry points to storage large
            // enough for any name the filesystem can return.
            #[allow(deprecated)]
            let rv = unsafe { libc::readdir_r(self.dir, entry, &mut result) };
            if rv != 0 {
                Err(ResolveError::new("readdir_r", &DirFd(self.fd), rv))?
            }
            if result.is_null() {
                return Ok(None);
            }

            // SAFETY: readdir_r succeeded with a non-null result, so it has filled entry.
            let raw = unsafe { &*result };
            // SAFETY: d_name is nul-terminated within the entry.
            let name = unsafe { CStr::from_ptr(raw.d_name.as_ptr()) }.to_bytes();
            if name == b"." || name == b".." {
                continue;
            }

            return Ok(Some(DirEntry {
                inode: raw.d_ino,
                name: OsString::from_vec(name.to_vec()),
                kind: Kind::from_dirent_type(raw.d_type)?,
            }));
        }
    }
}

impl Drop for DirStream {
    fn drop(&mut self) {
        // SAFETY: dir is valid and closed only here.
        if unsafe { libc::closedir(self.dir) } == -1 {
            BadCloseDir {
                fd: self.fd,
                errno: syscall::err_no(),
            }
            .abort();
        }
    }
}

/// The size of a dirent able to hold the longest name on the filesystem of `fd`.
fn entry_size(fd: c_int) -> usize {
    // SAFETY: fpathconf only queries the descriptor.
    let name_max = match unsafe { libc::fpathconf(fd, libc::_PC_NAME_MAX) } {
        -1 => libc::PATH_MAX as usize,
        max => max as usize,
    };
    let size = mem::offset_of!(dirent, d_name) + name_max + 1;
    size.max(mem::size_of::<dirent>())
}

/// Passes each entry of the directory `fd` to `visitor`, until it returns `true`. Consumes the
/// descriptor, the stream reads from its current position. Returns whether the visitor stopped
/// early.
pub(crate) fn visit<F: FnMut(DirEntry) -> bool>(fd: Fd, mut visitor: F) -> Result<bool> {
    let mut stream = DirStream::open(fd)?;
    while let Some(entry) = stream.next()? {
        if visitor(entry) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Collects all entries of the directory `fd`, consuming the descriptor.
pub(crate) fn collect(fd: Fd) -> Result<Vec<DirEntry>> {
    let mut entries = Vec::new();
    visit(fd, |entry| {
        entries.push(entry);
        false
    })?;
    Ok(entries)
}
