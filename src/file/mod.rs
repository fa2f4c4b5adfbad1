//! Regular files held open through a descriptor.
//!
//! A [`File`] is opened from a [`Path`](crate::Path) with [`FileOptions`]. Besides the shared
//! [`Descriptor`](crate::Descriptor) operations it provides positional I/O, advisory locking
//! through [`Lock`] guards and zero-copy transfers through a pipe-backed [`Channel`].

mod advice;
mod channel;
mod file;
mod lock;
mod options;
mod tests;

pub use advice::*;
pub use channel::*;
pub use file::*;
pub use lock::*;
pub use options::*;
