use std::ffi::OsString;
use std::os::unix::ffi::OsStringExt;
use std::str;

use libc::{c_uint, dev_t};

use crate::error::{MountInfoError, Result};
use crate::file::{File, FileOptions};
use crate::origin::Origin;

const MOUNTINFO: &str = "/proc/self/mountinfo";

/// A single mount point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Mount {
    pub device: dev_t,
    pub path: OsString,
}

/// Reads the current mount table. `root` must be a working-directory origin, so that reading the
/// table never depends on resolving another origin's location.
pub(crate) fn find_mounts(root: &Origin) -> Result<Vec<Mount>> {
    let path = root.path(MOUNTINFO)?;
    let content = File::open(&path, FileOptions::new().read(true))?.read_to_end()?;
    Ok(parse_mountinfo(&content)?)
}

/// Parses the content of a mountinfo file, one mount per line:
///
/// ```text
/// 36 35 98:0 /mnt1 /mnt/parent rw,noatime master:1 - ext3 /dev/root rw,errors=continue
/// ```
///
/// Only the device (third field) and the mount point (fifth field) are extracted.
pub(crate) fn parse_mountinfo(content: &[u8]) -> Result<Vec<Mount>, MountInfoError> {
    content
        .split(|b| *b == b'\n')
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &[u8]) -> Result<Mount, MountInfoError> {
    let error = || MountInfoError {
        line: String::from_utf8_lossy(line).into_owned(),
    };

    let mut fields = line.split(|b| *b == b' ');
    let mut next = || fields.next().ok_or_else(error);

    // Mount ID and parent ID, ignored beyond being numeric.
    for _ in 0..2 {
        parse_number::<u64>(next()?).ok_or_else(error)?;
    }

    let device = next()?;
    let (major, minor) = device
        .iter()
        .position(|b| *b == b':')
        .and_then(|i| Some((parse_number(&device[..i])?, parse_number(&device[i + 1..])?)))
        .ok_or_else(error)?;

    // The root of the mount within its filesystem, not needed here.
    next()?;
    let mount_point = next()?;
    // A mount point must be followed by further fields.
    next()?;

    Ok(Mount {
        device: make_device(major, minor),
        path: OsString::from_vec(unmangle(mount_point).ok_or_else(error)?),
    })
}

fn parse_number<T: str::FromStr>(field: &[u8]) -> Option<T> {
    str::from_utf8(field).ok()?.parse().ok()
}

#[allow(unused_unsafe)]
pub(crate) fn make_device(major: c_uint, minor: c_uint) -> dev_t {
    // SAFETY: makedev is pure arithmetic.
    unsafe { libc::makedev(major, minor) }
}

/// Reverses the escaping the kernel applies to pathnames in text files under `/proc`: space, tab,
/// newline and backslash are written as a backslash followed by three octal digits.
pub(crate) fn unmangle(field: &[u8]) -> Option<Vec<u8>> {
    let mut result = Vec::with_capacity(field.len());
    let mut bytes = field.iter().copied();

    while let Some(byte) = bytes.next() {
        if byte != b'\\' {
            result.push(byte);
            continue;
        }
        let high = octal_digit(bytes.next()?, b'3')?;
        let mid = octal_digit(bytes.next()?, b'7')?;
        let low = octal_digit(bytes.next()?, b'7')?;
        result.push((high << 6) | (mid << 3) | low);
    }

    Some(result)
}

fn octal_digit(byte: u8, max: u8) -> Option<u8> {
    (b'0'..=max).contains(&byte).then(|| byte - b'0')
}
