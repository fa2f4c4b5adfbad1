//! A filesystem access layer built entirely on directory-relative (`*at`) syscalls.
//!
//! # Purpose
//! Resolving pathnames from absolute strings over and over is racy: any component can be renamed
//! or replaced between two calls. This crate instead hands out descriptor-backed anchors that
//! later lookups are resolved against, so a chain of lookups keeps pointing at the same
//! directories even while the tree around them changes.
//!
//! # Structure
//! - A [`Context`] holds the open-flag policy shared by everything derived from it.
//! - An [`Origin`] is a directory anchor, either the current working directory or a directory
//!   opened (as an `O_PATH` handle) relative to another origin.
//! - A [`Path`] is a pathname relative to an origin. It never holds a descriptor itself, each
//!   operation issues a fresh `*at` syscall.
//! - [`File`], [`Directory`] and [`Object`] are the descriptor-bearing types produced from a
//!   `Path`. They share the [`Descriptor`] capability set.
//!
//! Going the other way, [`Origin::location`] reconstructs an absolute pathname from nothing but
//! the held descriptor, the mount table and inode numbers, by walking `..` upwards until a mount
//! point is reached.
//!
//! # Error Handling
//! Every fallible operation returns [`Result`], with the strongly typed [`Error`] enum wrapping
//! one struct per failure mode. Failures that can't be reported because they happen while
//! dropping a descriptor (a failed `close`, `closedir` or unlock) abort the process instead, as
//! they indicate that the descriptor table itself can no longer be trusted.
//!
//! # Dependencies
//! `libc` provides the syscall bindings, `derive_more` the error boilerplate and `tracing` the
//! diagnostics. No subscriber is installed by this crate.
#![cfg(target_os = "linux")]
#![warn(clippy::missing_safety_doc)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![warn(clippy::missing_panics_doc)]
#![warn(clippy::unwrap_used)]
#![allow(clippy::module_inception)]

pub mod context;
pub mod dir;
pub mod file;
pub mod origin;
pub mod path;

mod error;
mod fatal;
mod fd;
mod kind;
mod mount;
mod object;
mod stats;
mod syscall;
mod util;

pub use context::{Context, ContextOptions};
pub use dir::{DirEntry, Directory};
pub use error::*;
pub use file::{Advice, Channel, File, FileOptions, Lock};
pub use kind::*;
pub use object::*;
pub use origin::Origin;
pub use path::Path;
pub use stats::*;
