#[cfg(unix)]
use libc::{DT_DIR, DT_LNK, DT_REG, S_IFDIR, S_IFLNK, S_IFMT, S_IFREG, mode_t};

/// What kind of entry a metadata query found, or why it found nothing.
///
/// The two failure states are part of the type on purpose: `NotFound` means a
/// query ran and the path was absent, `None` means no query has run at all (the
/// zero value of [`FileInfo`](crate::FileInfo)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum FileType {
    RegularFile,
    Directory,
    Symlink,
    /// The entry exists but is none of the above (device, FIFO, socket, or a
    /// Windows reparse point that is not a symlink), or its kind could not be
    /// determined.
    Unknown,
    /// A query ran and nothing was there.
    NotFound,
    /// No query has been attempted.
    #[default]
    None,
}

impl FileType {
    #[must_use]
    #[inline]
    pub const fn is_regular_file(self) -> bool {
        matches!(self, Self::RegularFile)
    }

    #[must_use]
    #[inline]
    pub const fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }

    #[must_use]
    #[inline]
    pub const fn is_symlink(self) -> bool {
        matches!(self, Self::Symlink)
    }

    /// `true` when the query found something, whatever it turned out to be.
    #[must_use]
    #[inline]
    pub const fn exists(self) -> bool {
        matches!(
            self,
            Self::RegularFile | Self::Directory | Self::Symlink | Self::Unknown
        )
    }

    /// Converts the `S_IFMT` bits of a stat mode to a `FileType`
    #[cfg(unix)]
    #[must_use]
    #[inline]
    pub(crate) const fn from_mode(mode: mode_t) -> Self {
        match mode & S_IFMT {
            S_IFREG => Self::RegularFile,
            S_IFDIR => Self::Directory,
            S_IFLNK => Self::Symlink,
            _ => Self::Unknown,
        }
    }

    /// Converts a dirent `d_type` to a `FileType`
    /// On some ESOTERIC linux filesystems this reports `DT_UNKNOWN` for everything,
    /// so callers keep a stat fallback around.
    #[cfg(unix)]
    #[must_use]
    #[inline]
    pub(crate) const fn from_dtype(d_type: u8) -> Self {
        match d_type {
            DT_DIR => Self::Directory,
            DT_REG => Self::RegularFile,
            DT_LNK => Self::Symlink,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RegularFile => write!(f, "Regular file"),
            Self::Directory => write!(f, "Directory"),
            Self::Symlink => write!(f, "Symlink"),
            Self::Unknown => write!(f, "Unknown"),
            Self::NotFound => write!(f, "Not found"),
            Self::None => write!(f, "None"),
        }
    }
}
