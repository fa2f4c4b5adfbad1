//! Parsing of `/proc/self/mountinfo`, the kernel's list of mounts in the current namespace.
//!
//! The table is read afresh whenever it is needed and never cached, see
//! [`Origin::location`](crate::Origin::location).

mod mount;

pub(crate) use mount::*;
