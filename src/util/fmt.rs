use std::fmt::{self, Debug, Formatter};

use libc::{c_int, mode_t};

/// Open flags in `Debug` output, as hexadecimal.
pub struct Flags(pub c_int);

impl Debug for Flags {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// A file mode in `Debug` output, as octal.
pub struct Mode(pub mode_t);

impl Debug for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0o{:o}", self.0)
    }
}
