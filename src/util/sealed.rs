/// Restricts implementations of a public trait to this crate.
pub trait Sealed {}
