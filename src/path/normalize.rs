use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};

use derive_more::IsVariant;

#[derive(Debug, Clone, Copy, IsVariant)]
enum Seq {
    Slash,
    SlashDot,
    Other,
}

/// Normalizes a pathname lexically: repeated separators, trailing separators and `.` components
/// are removed. `..` components are kept, as they can't be collapsed without consulting the
/// filesystem. An absolute pathname stays absolute, and an empty result becomes `/` or `.`
/// respectively.
///
/// Normalizing is idempotent.
pub fn normalize<P: AsRef<OsStr>>(pathname: P) -> OsString {
    let pathname = pathname.as_ref().as_bytes();
    let absolute = pathname.first() == Some(&b'/');
    let prefix = if absolute { 1 } else { 0 };

    let mut result = Vec::with_capacity(pathname.len() + 1);
    if absolute {
        result.push(b'/');
    }

    // Behave as if every pathname started at a separator, so that leading "./" is dropped too.
    let mut last_seq = Seq::Slash;

    for ch in pathname.iter().copied() {
        match (ch, last_seq) {
            (b'/', Seq::Slash) => (),
            (b'/', Seq::SlashDot) => {
                last_seq = Seq::Slash;
            },
            (b'/', Seq::Other) => {
                last_seq = Seq::Slash;
                result.push(ch);
            },
            (b'.', Seq::Slash) => {
                last_seq = Seq::SlashDot;
            },
            (_, Seq::Slash) => {
                last_seq = Seq::Other;
                result.push(ch);
            },
            (_, Seq::SlashDot) => {
                last_seq = Seq::Other;
                result.push(b'.');
                result.push(ch);
            },
            (_, Seq::Other) => {
                result.push(ch);
            },
        }
    }

    // A separator is only ever pushed after a component, so a dangling one follows the last
    // component (or precedes a trailing ".").
    if !last_seq.is_other() && result.len() > prefix && result.last() == Some(&b'/') {
        result.pop();
    }

    if result.is_empty() {
        result.push(b'.');
    }

    OsString::from_vec(result)
}
