//! Pathnames relative to an [`Origin`](crate::Origin).
//!
//! A [`Path`] pairs an origin with a pathname and a flag for whether a symlink in the final
//! component is followed. It holds no descriptor of its own.

mod normalize;
mod path;
mod tests;

pub use normalize::*;
pub use path::*;
