pub mod flags;
pub mod fmt;
pub mod sealed;
