use crate::{FileType, Permissions};
use chrono::{DateTime, Utc};

/**
 A point-in-time snapshot of one entry's metadata.

 Built fresh by every query and owned by the caller; nothing is cached, so two
 snapshots of the same path can legitimately disagree. The zero value (also the
 `Default`) carries [`FileType::None`] and means no query has run.

 # Examples
 ```no_run
 let info = hostfs::file_info("Cargo.toml".as_ref());
 assert!(info.file_type.is_regular_file());
 assert!(info.size > 0);
 ```
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileInfo {
    pub file_type: FileType,
    pub permissions: Permissions,
    /// Byte length for regular files; directories are normalised to 0.
    pub size: u64,
    /// Creation time where the platform records one (birth time on the BSDs
    /// and Windows, inode change time elsewhere). `None` when unavailable.
    pub created: Option<DateTime<Utc>>,
    /// Last modification time, `None` when unavailable.
    pub modified: Option<DateTime<Utc>>,
}

impl FileInfo {
    /// The zero value: nothing queried, nothing known.
    #[must_use]
    #[inline]
    pub const fn none() -> Self {
        Self {
            file_type: FileType::None,
            permissions: Permissions::empty(),
            size: 0,
            created: None,
            modified: None,
        }
    }

    /// Zero-valued info recording that a query ran and found nothing.
    #[must_use]
    #[inline]
    pub(crate) const fn not_found() -> Self {
        Self {
            file_type: FileType::NotFound,
            permissions: Permissions::empty(),
            size: 0,
            created: None,
            modified: None,
        }
    }

    #[must_use]
    #[inline]
    pub const fn exists(&self) -> bool {
        self.file_type.exists()
    }

    #[must_use]
    #[inline]
    pub const fn is_dir(&self) -> bool {
        self.file_type.is_dir()
    }

    #[must_use]
    #[inline]
    pub const fn is_regular_file(&self) -> bool {
        self.file_type.is_regular_file()
    }

    #[must_use]
    #[inline]
    pub const fn is_symlink(&self) -> bool {
        self.file_type.is_symlink()
    }
}

/// Capacity and free space of the filesystem holding a path, in bytes.
///
/// `available <= free <= capacity` holds on sane filesystems but is reported
/// as the OS gave it to us, not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpaceInfo {
    /// Total size of the filesystem.
    pub capacity: u64,
    /// Free space, counting blocks reserved for privileged users.
    pub free: u64,
    /// Free space available to an unprivileged caller.
    pub available: u64,
}
