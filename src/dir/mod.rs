//! Reading directories.
//!
//! Entries are produced by a directory stream over a descriptor, excluding `.` and `..`. A
//! [`Directory`] keeps a readable descriptor of its own and can be listed repeatedly, while
//! [`Path::list`](crate::Path::list) and [`Path::visit`](crate::Path::visit) open a fresh one for
//! each call.

mod dir;
mod dir_entry;
mod scan;
mod tests;

pub use dir::*;
pub use dir_entry::*;
pub(crate) use scan::*;
