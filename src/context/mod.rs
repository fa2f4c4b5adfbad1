//! The [`Context`] type, which applies a shared open-flag policy to every descriptor opened
//! through it, and [`ContextOptions`] to configure that policy.
//!
//! A `Context` is cheap to clone and immutable once built. All [`Origin`](crate::Origin)s and
//! [`Path`](crate::Path)s derived from it keep it alive.

mod context;
mod options;

pub use context::*;
pub use options::*;
