//! Directory anchors for path resolution.
//!
//! An [`Origin`] is either the current working directory of the process, or a directory held
//! open as an `O_PATH` handle. Every lookup through a [`Path`](crate::Path) is resolved relative
//! to its origin's descriptor, never by re-walking a string from `/`.
//!
//! [`Origin::location`] goes the other way and reconstructs an absolute pathname for the anchor
//! from its device and inode numbers alone.

mod location;
mod origin;

pub use origin::*;
