use crate::{FileInfo, FileType};
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

/**
 One entry yielded by [`read_dir`](crate::read_dir) or [`walk`](crate::walk).

 Carries the full path (the iterated directory joined with the entry's name)
 and the metadata snapshot taken while iterating. The snapshot describes the
 entry itself, so a symlink reports as a symlink rather than as its target.

 # Examples
 ```no_run
 # fn demo() -> hostfs::Result<()> {
 for entry in hostfs::read_dir("/tmp".as_ref())? {
     println!("{} ({})", entry.path().display(), entry.file_type());
 }
 # Ok(())
 # }
 ```
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    path: PathBuf,
    info: FileInfo,
}

impl DirEntry {
    #[inline]
    pub(crate) fn new(path: PathBuf, info: FileInfo) -> Self {
        Self { path, info }
    }

    /// Full path of the entry.
    #[must_use]
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consumes the entry, keeping only its path.
    #[must_use]
    #[inline]
    pub fn into_path(self) -> PathBuf {
        self.path
    }

    /// The metadata snapshot taken when the entry was yielded.
    #[must_use]
    #[inline]
    pub const fn info(&self) -> &FileInfo {
        &self.info
    }

    /// Final component of the path.
    #[must_use]
    #[inline]
    pub fn file_name(&self) -> Option<&OsStr> {
        self.path.file_name()
    }

    #[must_use]
    #[inline]
    pub const fn file_type(&self) -> FileType {
        self.info.file_type
    }

    #[must_use]
    #[inline]
    pub const fn is_dir(&self) -> bool {
        self.info.is_dir()
    }

    #[must_use]
    #[inline]
    pub const fn is_regular_file(&self) -> bool {
        self.info.is_regular_file()
    }

    #[must_use]
    #[inline]
    pub const fn is_symlink(&self) -> bool {
        self.info.is_symlink()
    }
}

impl AsRef<Path> for DirEntry {
    #[inline]
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for DirEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
