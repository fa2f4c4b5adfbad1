#![cfg(test)]

use std::ffi::OsString;
use std::fs;

use super::*;
use crate::context::Context;
use crate::kind::Kind;
use crate::object::{Descriptor, Object};

fn sorted_names(entries: Vec<DirEntry>) -> Vec<OsString> {
    let mut names: Vec<_> = entries.into_iter().map(DirEntry::into_name).collect();
    names.sort();
    names
}

#[test]
fn test_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = Context::new("dir").working().path(dir.path()).unwrap();

    let entries = Directory::open(&path).unwrap().list().unwrap();
    assert!(entries.is_empty(), "\".\" and \"..\" should never be listed, got {entries:?}.");
}

#[test]
fn test_entry_kinds() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("file"), b"").unwrap();
    std::os::unix::fs::symlink("file", dir.path().join("link")).unwrap();

    let path = Context::new("dir").working().path(dir.path()).unwrap();
    let mut entries = Directory::open(&path).unwrap().list().unwrap();
    entries.sort_by(|l, r| l.name().cmp(r.name()));

    let kinds: Vec<_> = entries.iter().map(|e| (e.name().to_owned(), e.kind())).collect();
    for (name, kind) in &kinds {
        // Some filesystems don't record kinds in their directories.
        if kind.is_unknown() {
            continue;
        }
        let expected = match name.to_str() {
            Some("sub") => Kind::Directory,
            Some("file") => Kind::RegularFile,
            Some("link") => Kind::SymbolicLink,
            other => panic!("Unexpected entry {other:?}."),
        };
        assert_eq!(*kind, expected, "Wrong kind for {name:?}.");
    }

    let stats = fs::symlink_metadata(dir.path().join("sub")).unwrap();
    let sub = entries.iter().find(|e| e.name() == "sub").unwrap();
    assert_eq!(sub.inode(), std::os::unix::fs::MetadataExt::ino(&stats));
}

#[test]
fn test_list_twice() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["one", "two"] {
        fs::write(dir.path().join(name), b"").unwrap();
    }

    let path = Context::new("dir").working().path(dir.path()).unwrap();
    let directory = Directory::open(&path).unwrap();
    let first = sorted_names(directory.list().unwrap());
    let second = sorted_names(directory.list().unwrap());
    assert_eq!(first, ["one", "two"]);
    assert_eq!(first, second, "Listing should leave the directory usable for another listing.");

    let shared = directory.clone();
    assert_eq!(sorted_names(directory.into_list().unwrap()), ["one", "two"]);
    assert_eq!(
        sorted_names(shared.into_list().unwrap()),
        ["one", "two"],
        "The last holder should read through the held descriptor."
    );
}

#[test]
fn test_visit_early_stop() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..10 {
        fs::write(dir.path().join(format!("f{i}")), b"").unwrap();
    }

    let path = Context::new("dir").working().path(dir.path()).unwrap();
    let directory = Directory::open(&path).unwrap();

    let mut visited = 0;
    let stopped = directory
        .visit(|entry| {
            visited += 1;
            entry.name() == "f3"
        })
        .unwrap();
    assert!(stopped, "The visitor should have found f3.");
    assert!(visited <= 10);

    let mut visited = 0;
    let stopped = directory
        .into_visit(|_| {
            visited += 1;
            false
        })
        .unwrap();
    assert!(!stopped);
    assert_eq!(visited, 10, "A visitor which never stops should see every entry.");
}

#[test]
fn test_open_not_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("file"), b"").unwrap();

    let path = Context::new("dir").working().path(dir.path().join("file")).unwrap();
    let err = Directory::open(&path).unwrap_err();
    assert_eq!(err.errno(), Some(libc::ENOTDIR));
}

#[test]
fn test_descriptor_operations() {
    let dir = tempfile::tempdir().unwrap();
    let path = Context::new("dir").working().path(dir.path()).unwrap();
    let directory = Directory::open(&path).unwrap();

    assert!(directory.stat().unwrap().is_directory());
    directory.chmod(0o700).unwrap();
    assert_eq!(directory.stat().unwrap().permissions(), 0o700);
    directory.fsync().unwrap();

    let object = Object::from(&directory);
    assert_eq!(object.stat().unwrap(), directory.stat().unwrap());
}
