/*!
One portable surface over the host filesystem: metadata, permissions,
symlinks, path resolution, directory walking, create/copy/rename/remove,
disk space and the user's well-known folders. Each operation is implemented
once per platform family (POSIX, Windows) in a backend selected at compile
time; callers never branch on platform.

```no_run
let info = hostfs::file_info("Cargo.toml".as_ref());
assert!(info.is_regular_file());

for entry in hostfs::walk("src".as_ref())? {
    println!("{:>9} {}", entry.info().size, entry.path().display());
}
# hostfs::Result::Ok(())
```
*/

#[macro_use]
mod macros;

mod error;
pub use error::{FsError, OsError, RemoveError, Result};
mod perm;
pub use perm::{PermApply, Permissions};
mod filetype;
pub use filetype::FileType;
mod metadata;
pub use metadata::{FileInfo, SpaceInfo};
mod direntry;
pub use direntry::DirEntry;

mod sys;

mod ops;
pub use ops::{
    absolute, canonical, copy_file, create_dir, create_dir_all, create_dir_symlink, create_file,
    create_hard_link, create_symlink, current_dir, equivalent, exists, file_info, hard_link_count,
    is_directory, is_regular_file, is_symlink, permissions, read_symlink, remove, remove_all,
    rename, set_current_dir, set_modified, space, symlink_info, update_permissions,
};
mod walk;
pub use walk::{ReadDir, RecursiveReadDir, read_dir, walk};
mod user_dirs;
pub use user_dirs::{UserDir, user_dir};

#[cfg(test)]
mod tests;
