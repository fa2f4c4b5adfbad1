#![cfg(test)]

use std::fs;
use std::io::{IoSlice, IoSliceMut};
use std::os::unix::fs::PermissionsExt;

use tempfile::TempDir;

use super::*;
use crate::context::Context;
use crate::object::Descriptor;
use crate::origin::Origin;

fn temp_origin() -> (TempDir, Origin) {
    let dir = tempfile::tempdir().unwrap();
    let origin = Context::new("file").resolved(dir.path(), true).unwrap();
    (dir, origin)
}

fn read_write() -> FileOptions {
    let mut options = FileOptions::new();
    options.read(true).write(true).create(true);
    options
}

#[test]
fn test_options() {
    let mut options = FileOptions::new();
    assert_eq!(options.flags(), libc::O_RDONLY);
    assert_eq!(options.mode(), 0o600);

    options.write(true).append(true);
    assert_eq!(options.flags(), libc::O_WRONLY | libc::O_APPEND);
    options.read(true).append(false).truncate(true);
    assert_eq!(options.flags(), libc::O_RDWR | libc::O_TRUNC);

    assert_eq!(FileOptions::new().executable(true).mode(), 0o700);
    assert_eq!(FileOptions::new().group(true).others(true).mode(), 0o666);
    assert_eq!(
        FileOptions::new().executable(true).group(true).others(true).mode(),
        0o777,
        "Group and others should gain execute permission along with the owner."
    );
}

#[test]
fn test_create_mode() {
    let (dir, origin) = temp_origin();
    let path = origin.path("new").unwrap();
    File::open(&path, read_write().exclusive(true).group(true)).unwrap();

    let mode = fs::metadata(dir.path().join("new")).unwrap().permissions().mode();
    // The umask may strip group write.
    assert_eq!(mode & 0o700, 0o600);
    assert_eq!(mode & 0o007, 0, "Others shouldn't gain access unless asked.");

    let err = File::open(&path, read_write().exclusive(true)).unwrap_err();
    assert_eq!(err.errno(), Some(libc::EEXIST));
}

#[test]
fn test_positional_io() {
    let (_dir, origin) = temp_origin();
    let file = File::open(&origin.path("data").unwrap(), &read_write()).unwrap();

    assert_eq!(file.write_at(b"hello world", 0).unwrap(), 11);
    assert_eq!(file.write_at(b"W", 6).unwrap(), 1);

    let mut buffer = [0_u8; 5];
    assert_eq!(file.read_at(&mut buffer, 6).unwrap(), 5);
    assert_eq!(&buffer, b"World");
    assert_eq!(file.read_at(&mut buffer, 11).unwrap(), 0, "Reading at the end yields nothing.");

    assert_eq!(file.read_to_end().unwrap(), b"hello World");
    assert_eq!(file.stat().unwrap().size, 11);
}

#[test]
fn test_vectored_io() {
    let (_dir, origin) = temp_origin();
    let file = File::open(&origin.path("data").unwrap(), &read_write()).unwrap();

    let written = file
        .write_vectored_at(&[IoSlice::new(b"abc"), IoSlice::new(b"defg")], 2)
        .unwrap();
    assert_eq!(written, 7);

    let (mut head, mut tail) = ([0_u8; 4], [0_u8; 5]);
    let read = file
        .read_vectored_at(&mut [IoSliceMut::new(&mut head), IoSliceMut::new(&mut tail)], 0)
        .unwrap();
    assert_eq!(read, 9);
    assert_eq!(&head, b"\0\0ab", "The gap before the write should read as zeroes.");
    assert_eq!(&tail, b"cdefg");
}

#[test]
fn test_read_to_end_large() {
    let (dir, origin) = temp_origin();
    let content: Vec<u8> = (0..20_000_u32).map(|i| (i % 251) as u8).collect();
    fs::write(dir.path().join("large"), &content).unwrap();

    let file = File::open(&origin.path("large").unwrap(), &FileOptions::new()).unwrap();
    assert_eq!(file.read_to_end().unwrap(), content, "Reads beyond the first buffer should grow it.");
}

#[test]
fn test_truncate_and_allocate() {
    let (dir, origin) = temp_origin();
    let file = File::open(&origin.path("data").unwrap(), &read_write()).unwrap();

    file.write_at(b"0123456789", 0).unwrap();
    file.truncate(3).unwrap();
    assert_eq!(fs::read(dir.path().join("data")).unwrap(), b"012");

    file.allocate(0, 4096).unwrap();
    assert_eq!(file.stat().unwrap().size, 4096, "Allocating past the end should extend the file.");

    file.advise(0, 0, Advice::Sequential).unwrap();
    file.fdatasync().unwrap();
}

#[test]
fn test_lock_contention() {
    let (_dir, origin) = temp_origin();
    let path = origin.path("locked").unwrap();
    let first = File::open(&path, &read_write()).unwrap();
    let second = File::open(&path, &read_write()).unwrap();

    let lock = first.lock(true, false).unwrap();
    assert!(lock.is_exclusive());

    let err = second.lock(true, false).unwrap_err();
    assert!(
        err.is_locked(),
        "A contended non-blocking lock should be distinguishable, got {err}."
    );
    assert!(second.lock(false, false).unwrap_err().is_locked());

    drop(lock);
    let lock = second.lock(false, false).unwrap();
    assert!(!lock.is_exclusive(), "The lock should be free once its guard is dropped.");
    first.lock(false, false).unwrap();
}

#[test]
fn test_channel() {
    let (dir, origin) = temp_origin();
    fs::write(dir.path().join("source"), b"spliced content").unwrap();

    let source = File::open(&origin.path("source").unwrap(), &FileOptions::new()).unwrap();
    let target = File::open(&origin.path("target").unwrap(), &read_write()).unwrap();
    let channel = target.channel().unwrap();

    let filled = channel.fill(&source, 1024, 8).unwrap();
    assert_eq!(filled, 7);
    assert_eq!(channel.drain(filled, 0).unwrap(), 7);
    assert_eq!(fs::read(dir.path().join("target")).unwrap(), b"content");

    assert_eq!(channel.fill(&source, 1024, 15).unwrap(), 0, "Filling at the end moves nothing.");
}

#[test]
fn test_link_to() {
    let (dir, origin) = temp_origin();
    let file = File::open(&origin.path("original").unwrap(), &read_write()).unwrap();
    file.write_at(b"linked", 0).unwrap();

    file.link_to(&origin.path("alias").unwrap()).unwrap();
    assert_eq!(fs::read(dir.path().join("alias")).unwrap(), b"linked");
    assert_eq!(file.stat().unwrap().links, 2);
}

#[test]
fn test_tmpfile() {
    let (dir, origin) = temp_origin();
    let mut options = FileOptions::new();
    options.write(true).tmpfile(true);

    let file = match File::open(&origin.path(".").unwrap(), &options) {
        Ok(file) => file,
        // Not every filesystem supports unnamed files.
        Err(e) if e.errno() == Some(libc::EOPNOTSUPP) => return,
        Err(e) => panic!("Unexpected error: {e}"),
    };
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none(), "The file should have no name.");

    file.write_at(b"late", 0).unwrap();
    file.link_to(&origin.path("named").unwrap()).unwrap();
    assert_eq!(fs::read(dir.path().join("named")).unwrap(), b"late");
}

#[test]
fn test_try_clone() {
    let (_dir, origin) = temp_origin();
    let file = File::open(&origin.path("data").unwrap(), &read_write()).unwrap();
    let copy = file.try_clone().unwrap();
    assert_ne!(copy.raw_fd(), file.raw_fd());

    drop(file);
    copy.write_at(b"still open", 0).unwrap();
    assert_eq!(copy.read_to_end().unwrap(), b"still open");
}
