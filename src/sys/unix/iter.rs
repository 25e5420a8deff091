use crate::error::{FsError, OsError, last_errno};
use crate::{FileInfo, FileType};
use std::ffi::{CStr, OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr::NonNull;

use libc::fstatat;
#[cfg(any(target_os = "linux", target_os = "android"))]
use libc::{dirent64, readdir64};
#[cfg(not(any(target_os = "linux", target_os = "android")))]
use libc::{dirent as dirent64, readdir as readdir64};

/**
 Iterator over one directory's entries in native order, `.` and `..` skipped.

 Owns the `DIR` stream. The stream is closed eagerly the moment `readdir`
 reports the end, and `Drop` covers abandonment part way through, so the
 descriptor is released exactly once on every path.

 `dirfd` borrows the descriptor owned by the stream (for the per-entry
 `fstatat`); it must never be closed separately.
*/
pub(crate) struct ReadDir {
    dir: NonNull<libc::DIR>,
    dirfd: libc::c_int,
    exhausted: bool,
}

impl ReadDir {
    pub(crate) fn open(path: &Path) -> crate::Result<Self> {
        let cpath = super::to_cstring(path)?;
        // SAFETY: the path is NUL-terminated
        let dir = unsafe { libc::opendir(cpath.as_ptr()) };
        let Some(dir) = NonNull::new(dir) else {
            return Err(match last_errno() {
                libc::ENOENT => FsError::NotFound,
                libc::ENOTDIR => FsError::NotADirectory,
                code => OsError::log("opendir", code).into(),
            });
        };
        // SAFETY: the stream is open and keeps ownership of this descriptor
        let dirfd = unsafe { libc::dirfd(dir.as_ptr()) };
        Ok(Self {
            dir,
            dirfd,
            exhausted: false,
        })
    }

    /// Closes the stream; calling again (or dropping afterwards) is a no-op.
    fn close(&mut self) {
        if !self.exhausted {
            // SAFETY: `exhausted` being unset means the stream is still open
            unsafe { libc::closedir(self.dir.as_ptr()) };
            self.exhausted = true;
        }
    }

    /// Symlink-flavoured info for the entry under the cursor, via `fstatat`
    /// relative to the stream's own descriptor.
    ///
    /// An entry unlinked between `readdir` and the stat here is still yielded,
    /// with info recording the absence. Any other stat failure degrades to
    /// type-only info from `d_type`.
    fn entry_info(&self, name_ptr: *const libc::c_char, d_type: u8) -> FileInfo {
        match stat_syscall!(fstatat, self.dirfd, name_ptr, libc::AT_SYMLINK_NOFOLLOW) {
            Ok(stat) => super::info_from_stat(&stat),
            Err(libc::ENOENT) => FileInfo::not_found(),
            Err(code) => {
                OsError::log("fstatat", code);
                FileInfo {
                    file_type: FileType::from_dtype(d_type),
                    ..FileInfo::none()
                }
            }
        }
    }
}

impl Iterator for ReadDir {
    type Item = (OsString, FileInfo);

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        loop {
            // SAFETY: the stream is open until `close` runs
            let entry: *mut dirent64 = unsafe { readdir64(self.dir.as_ptr()) };
            if entry.is_null() {
                // end of stream, release the descriptor now
                self.close();
                return None;
            }
            skip_dot_or_dot_dot_entries!(entry, continue);
            // SAFETY: the entry is valid until the next readdir call and d_name is NUL-terminated
            let (name_ptr, d_type): (*const libc::c_char, u8) =
                unsafe { (access_dirent!(entry, d_name), access_dirent!(entry, d_type)) };
            let info = self.entry_info(name_ptr, d_type);
            // SAFETY: as above, d_name is NUL-terminated
            let name = unsafe { OsStr::from_bytes(CStr::from_ptr(name_ptr).to_bytes()) };
            return Some((name.to_os_string(), info));
        }
    }
}

impl Drop for ReadDir {
    fn drop(&mut self) {
        self.close();
    }
}
