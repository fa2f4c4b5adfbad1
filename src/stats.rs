use libc::{dev_t, gid_t, ino_t, mode_t, nlink_t, off_t, stat, statvfs, uid_t};

use super::Kind;

/// The result of a `stat` call. Times are pairs of seconds and nanoseconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub size: off_t,
    pub mode: mode_t,
    pub uid: uid_t,
    pub gid: gid_t,
    pub device: dev_t,
    pub inode: ino_t,
    /// The device this inode represents, for device files.
    pub special_device: dev_t,
    pub links: nlink_t,
    pub block_size: i64,
    pub blocks: i64,
    pub time_accessed: (i64, i64),
    pub time_modified: (i64, i64),
    pub time_changed: (i64, i64),
}

impl Stats {
    #[allow(clippy::unnecessary_cast)]
    pub(crate) const fn from_stat(raw: stat) -> Stats {
        Stats {
            size: raw.st_size,
            mode: raw.st_mode,
            uid: raw.st_uid,
            gid: raw.st_gid,
            device: raw.st_dev,
            inode: raw.st_ino,
            special_device: raw.st_rdev,
            links: raw.st_nlink,
            block_size: raw.st_blksize as i64,
            blocks: raw.st_blocks as i64,
            time_accessed: (raw.st_atime as i64, raw.st_atime_nsec as i64),
            time_modified: (raw.st_mtime as i64, raw.st_mtime_nsec as i64),
            time_changed: (raw.st_ctime as i64, raw.st_ctime_nsec as i64),
        }
    }

    pub const fn kind(&self) -> Kind {
        Kind::from_stat_mode(self.mode)
    }

    /// Whether the inode is of the given kind. [`Kind::Unknown`] matches only if none of the
    /// known kinds do.
    pub fn is_kind(&self, kind: Kind) -> bool {
        match kind {
            Kind::Unknown => !Kind::KNOWN.iter().any(|k| self.is_kind(*k)),
            known => self.kind() == known,
        }
    }

    pub fn is_block_device(&self) -> bool {
        self.kind().is_block_device()
    }

    pub fn is_character_device(&self) -> bool {
        self.kind().is_character_device()
    }

    pub fn is_directory(&self) -> bool {
        self.kind().is_directory()
    }

    pub fn is_named_pipe(&self) -> bool {
        self.kind().is_named_pipe()
    }

    pub fn is_symbolic_link(&self) -> bool {
        self.kind().is_symbolic_link()
    }

    pub fn is_regular_file(&self) -> bool {
        self.kind().is_regular_file()
    }

    pub fn is_socket(&self) -> bool {
        self.kind().is_socket()
    }

    /// The permission bits, without the file type.
    pub const fn permissions(&self) -> mode_t {
        self.mode & 0o7777
    }
}

/// The result of a `statvfs` call, describing the filesystem an inode lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsStats {
    fragment_size: u64,
    id: u64,
    blocks: u64,
    blocks_free: u64,
    blocks_available: u64,
    files: u64,
    files_free: u64,
    files_available: u64,
}

impl FsStats {
    #[allow(clippy::unnecessary_cast)]
    pub(crate) const fn from_statvfs(raw: statvfs) -> FsStats {
        FsStats {
            fragment_size: raw.f_frsize as u64,
            id: raw.f_fsid as u64,
            blocks: raw.f_blocks as u64,
            blocks_free: raw.f_bfree as u64,
            blocks_available: raw.f_bavail as u64,
            files: raw.f_files as u64,
            files_free: raw.f_ffree as u64,
            files_available: raw.f_favail as u64,
        }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    pub const fn bytes_total(&self) -> u64 {
        self.fragment_size.saturating_mul(self.blocks)
    }

    pub const fn bytes_free(&self) -> u64 {
        self.fragment_size.saturating_mul(self.blocks_free)
    }

    pub const fn bytes_available(&self) -> u64 {
        self.fragment_size.saturating_mul(self.blocks_available)
    }

    pub const fn files_total(&self) -> u64 {
        self.files
    }

    pub const fn files_free(&self) -> u64 {
        self.files_free
    }

    pub const fn files_available(&self) -> u64 {
        self.files_available
    }
}
