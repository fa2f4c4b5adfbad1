#![cfg(test)]

use std::ffi::OsStr;
use std::fs;

use tempfile::TempDir;

use super::*;
use crate::context::Context;
use crate::dir::DirEntry;
use crate::origin::Origin;

fn temp_origin() -> (TempDir, Origin) {
    let dir = tempfile::tempdir().unwrap();
    let origin = Context::new("path")
        .working()
        .resolved(dir.path(), true)
        .unwrap();
    (dir, origin)
}

#[test]
fn test_normalize() {
    let cases = [
        ("", "."),
        (".", "."),
        ("./", "."),
        ("/", "/"),
        ("//", "/"),
        ("/.", "/"),
        ("a/./b", "a/b"),
        ("/a//b/", "/a/b"),
        ("a/.", "a"),
        ("./a", "a"),
        ("a/../b", "a/../b"),
        ("../..", "../.."),
        (".hidden/.x", ".hidden/.x"),
        ("a/..", "a/.."),
    ];
    for (input, expected) in cases {
        assert_eq!(normalize(input), OsStr::new(expected), "normalize({input:?})");
    }
}

#[test]
fn test_normalize_idempotent() {
    for input in ["", "/a//./b/", "././x/", "/..//../y/.", "a/.b/..c/"] {
        let once = normalize(input);
        assert_eq!(normalize(&once), once, "Normalizing {input:?} twice should be stable.");
    }
}

#[test]
fn test_invalid_pathnames() {
    let origin = Context::new("invalid").working();
    assert!(origin.path("").unwrap_err().is_empty_pathname());
    assert!(origin.path("a\0b").unwrap_err().is_nul_byte());
}

#[test]
fn test_joined() {
    let origin = Context::new("joined").working();
    let path = origin.path("a/b").unwrap().follow(false);

    let joined = path.joined("./c/").unwrap();
    assert_eq!(joined.pathname(), "a/b/c");
    assert!(!joined.is_following(), "Joining should keep the follow flag.");
    assert!(joined.origin().is_working());

    let absolute = path.joined("/etc//passwd").unwrap();
    assert_eq!(
        absolute.pathname(),
        "/etc//passwd",
        "An absolute pathname should replace the path unchanged."
    );
}

#[test]
fn test_joined_absolute() {
    let (dir, origin) = temp_origin();
    let location = fs::canonicalize(dir.path()).unwrap();
    let path = origin.path("p").unwrap();

    for name in ["q", "./q//", "q/../q/.", "q/r/"] {
        let expected = normalize(location.join(format!("p/{name}")));
        assert_eq!(
            path.joined(name).unwrap().absolute().unwrap(),
            expected,
            "Joining {name:?} should agree with appending it to the origin's location."
        );
    }

    let rooted = path.joined("/usr//lib/").unwrap();
    assert!(rooted.origin().is_working());
    assert_eq!(rooted.absolute().unwrap(), normalize("/usr//lib/"));
}

#[test]
fn test_list_then_locate() {
    let (dir, origin) = temp_origin();
    fs::create_dir(dir.path().join("x")).unwrap();

    let entries = origin.path(".").unwrap().list().unwrap();
    let names: Vec<_> = entries.into_iter().map(DirEntry::into_name).collect();
    assert_eq!(names, ["x"]);

    let x = origin.path("x").unwrap().resolved().unwrap();
    let expected = fs::canonicalize(dir.path()).unwrap().join("x");
    assert_eq!(x.location().unwrap(), expected.into_os_string());
}

#[test]
fn test_absolute() {
    let (dir, origin) = temp_origin();
    let expected = fs::canonicalize(dir.path()).unwrap().join("x/y");

    let path = origin.path("x//./y/").unwrap();
    assert_eq!(
        path.absolute().unwrap(),
        expected.as_os_str(),
        "A relative path should be prefixed with its origin's location."
    );

    let rooted = origin.path("/usr/./lib/").unwrap();
    assert_eq!(rooted.absolute().unwrap(), "/usr/lib");
}

#[test]
fn test_mkdir_rename_rmdir() {
    let (dir, origin) = temp_origin();

    let first = origin.path("first").unwrap();
    first.mkdir(0o755).unwrap();
    assert!(first.stat().unwrap().is_directory());

    let second = origin.path("second").unwrap();
    first.rename(&second).unwrap();
    assert!(!dir.path().join("first").exists());
    assert!(dir.path().join("second").is_dir());

    let err = first.rmdir().unwrap_err();
    assert_eq!(err.errno(), Some(libc::ENOENT));
    second.rmdir().unwrap();
    assert!(!dir.path().join("second").exists());
}

#[test]
fn test_link_and_unlink() {
    let (dir, origin) = temp_origin();
    fs::write(dir.path().join("data"), b"content").unwrap();

    let data = origin.path("data").unwrap();
    let link = origin.path("link").unwrap();
    data.link(&link).unwrap();
    assert_eq!(data.stat().unwrap().links, 2);
    assert_eq!(link.stat().unwrap().inode, data.stat().unwrap().inode);

    data.unlink().unwrap();
    assert_eq!(fs::read(dir.path().join("link")).unwrap(), b"content");
}

#[test]
fn test_symlink() {
    let (dir, origin) = temp_origin();
    fs::create_dir(dir.path().join("target")).unwrap();

    let link = origin.path("link").unwrap();
    link.symlink("target").unwrap();
    assert_eq!(link.readlink().unwrap(), "target");

    assert!(link.stat().unwrap().is_directory(), "A following path should stat the target.");
    assert!(
        link.follow(false).stat().unwrap().is_symbolic_link(),
        "A non-following path should stat the link itself."
    );

    let err = origin.path("target").unwrap().readlink().unwrap_err();
    assert_eq!(err.errno(), Some(libc::EINVAL));
}

#[test]
fn test_readlink_long_target() {
    let (_dir, origin) = temp_origin();
    let target = "t/".repeat(300);

    let link = origin.path("long").unwrap();
    link.symlink(&target).unwrap();
    assert_eq!(
        link.readlink().unwrap(),
        OsStr::new(&target),
        "Targets longer than the initial buffer should be read completely."
    );
}

#[test]
fn test_chmod() {
    let (dir, origin) = temp_origin();
    fs::write(dir.path().join("data"), b"").unwrap();

    let data = origin.path("data").unwrap();
    data.chmod(0o640).unwrap();
    assert_eq!(data.stat().unwrap().permissions(), 0o640);
}

#[test]
fn test_list_and_visit() {
    let (dir, origin) = temp_origin();
    fs::create_dir(dir.path().join("sub")).unwrap();
    for name in ["a", "b", "c"] {
        fs::write(dir.path().join("sub").join(name), b"").unwrap();
    }

    let sub = origin.path("sub").unwrap();
    let mut names: Vec<_> = sub.list().unwrap().into_iter().map(|e| e.into_name()).collect();
    names.sort();
    assert_eq!(names, ["a", "b", "c"]);

    let mut seen = 0;
    let stopped = sub
        .visit(|_| {
            seen += 1;
            seen == 2
        })
        .unwrap();
    assert!(stopped);
    assert_eq!(seen, 2, "Visiting should stop as soon as the visitor asks to.");
}

#[test]
fn test_truncate_and_statvfs() {
    let (dir, origin) = temp_origin();
    fs::write(dir.path().join("data"), b"0123456789").unwrap();

    let data = origin.path("data").unwrap();
    data.truncate(4).unwrap();
    assert_eq!(fs::read(dir.path().join("data")).unwrap(), b"0123");

    let stats = data.statvfs().unwrap();
    assert!(stats.bytes_total() >= stats.bytes_free());
}

#[test]
fn test_resolved() {
    let (dir, origin) = temp_origin();
    fs::create_dir(dir.path().join("inner")).unwrap();

    let inner = origin.path("inner").unwrap().resolved().unwrap();
    inner.path("file").unwrap().symlink("somewhere").unwrap();
    assert!(dir.path().join("inner/file").is_symlink());

    let err = origin.path("missing").unwrap().resolved().unwrap_err();
    assert_eq!(err.errno(), Some(libc::ENOENT));
}

#[test]
fn test_display() {
    let origin = Context::new("display").working();
    let path = origin.path("some/file").unwrap();
    assert_eq!(path.to_string(), "\"some/file\" in cwd");
}
