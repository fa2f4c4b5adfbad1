use derive_more::{Display, IsVariant};

use crate::error::UnknownKindError;

/// The kind of an inode, as reported by `stat` or a directory entry.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, IsVariant)]
pub enum Kind {
    #[display("block-device")]
    BlockDevice,
    #[display("character-device")]
    CharacterDevice,
    #[display("directory")]
    Directory,
    #[display("named-pipe")]
    NamedPipe,
    #[display("symbolic-link")]
    SymbolicLink,
    #[display("regular-file")]
    RegularFile,
    #[display("socket")]
    Socket,
    #[display("unknown")]
    Unknown,
}

use Kind::*;

impl Kind {
    pub(crate) const KNOWN: [Kind; 7] = [
        BlockDevice,
        CharacterDevice,
        Directory,
        NamedPipe,
        SymbolicLink,
        RegularFile,
        Socket,
    ];

    #[inline(always)]
    pub(crate) const fn from_stat_mode(st_mode: u32) -> Kind {
        match st_mode & libc::S_IFMT {
            libc::S_IFBLK => BlockDevice,
            libc::S_IFCHR => CharacterDevice,
            libc::S_IFDIR => Directory,
            libc::S_IFIFO => NamedPipe,
            libc::S_IFLNK => SymbolicLink,
            libc::S_IFREG => RegularFile,
            libc::S_IFSOCK => Socket,
            _ => Unknown,
        }
    }

    /// Maps a `d_type` byte. `DT_UNKNOWN` is a legitimate answer from filesystems which don't
    /// record types in their directories, anything else unexpected is an error.
    pub(crate) const fn from_dirent_type(d_type: u8) -> Result<Kind, UnknownKindError> {
        Ok(match d_type {
            libc::DT_BLK => BlockDevice,
            libc::DT_CHR => CharacterDevice,
            libc::DT_DIR => Directory,
            libc::DT_FIFO => NamedPipe,
            libc::DT_LNK => SymbolicLink,
            libc::DT_REG => RegularFile,
            libc::DT_SOCK => Socket,
            libc::DT_UNKNOWN => Unknown,
            other => return Err(UnknownKindError(other)),
        })
    }
}
