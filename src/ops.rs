use crate::error::{FsError, Result};
use crate::sys;
use crate::{FileInfo, PermApply, Permissions, RemoveError, SpaceInfo};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/**
Metadata for `path`, following symlinks.

Never fails: absence comes back as a [`FileInfo`] whose type is
[`FileType::NotFound`](crate::FileType::NotFound), any other failure as the
zero value. Callers that need the cause use the fallible operations instead.

Only real symlinks are followed. On Windows a junction or any other
reparse point reads back as
[`FileType::Unknown`](crate::FileType::Unknown), reported from the entry
itself rather than resolved.

# Examples
```no_run
let info = hostfs::file_info("Cargo.toml".as_ref());
if info.is_regular_file() {
    println!("{} bytes", info.size);
}
```
*/
#[must_use]
pub fn file_info(path: &Path) -> FileInfo {
    match sys::stat_info(path, true) {
        Ok(info) => info,
        Err(FsError::NotFound) => FileInfo::not_found(),
        Err(_) => FileInfo::none(),
    }
}

/// Metadata for `path` itself, never following a final symlink. Total, like
/// [`file_info`].
#[must_use]
pub fn symlink_info(path: &Path) -> FileInfo {
    match sys::stat_info(path, false) {
        Ok(info) => info,
        Err(FsError::NotFound) => FileInfo::not_found(),
        Err(_) => FileInfo::none(),
    }
}

/// Does `path` point at anything? Follows symlinks, so a dangling link is
/// reported as absent.
#[must_use]
pub fn exists(path: &Path) -> bool {
    file_info(path).exists()
}

#[must_use]
pub fn is_regular_file(path: &Path) -> bool {
    file_info(path).is_regular_file()
}

#[must_use]
pub fn is_directory(path: &Path) -> bool {
    file_info(path).is_dir()
}

/// Is `path` itself a symlink? The one query that never follows.
#[must_use]
pub fn is_symlink(path: &Path) -> bool {
    symlink_info(path).is_symlink()
}

/// The permission mask of `path` after following symlinks, empty when the
/// query fails.
#[must_use]
pub fn permissions(path: &Path) -> Permissions {
    file_info(path).permissions
}

/// Number of hard links to the underlying file, 0 when the query fails.
/// Anything above 1 means other directory entries share the data.
#[must_use]
pub fn hard_link_count(path: &Path) -> u64 {
    sys::hard_link_count(path).unwrap_or(0)
}

/**
Sets the modification time of `path`, leaving the access time untouched.

# Errors

[`FsError::NotFound`] when the path does not exist, otherwise the failing
native call.
*/
pub fn set_modified(path: &Path, modified: DateTime<Utc>) -> Result<()> {
    sys::set_modified(path, modified)
}

/**
Folds `requested` into the current permission mask of `path` and installs
the result: [`PermApply::Replace`] swaps the portable bits for the requested
ones, [`PermApply::Add`] sets them on top, [`PermApply::Remove`] clears
them. Native mode bits outside the portable mask, the sticky bit for one,
ride through every variant untouched.

A computed mode equal to the current one is a success without any native
write. With `follow_symlinks` off a symlink is left alone entirely, also as
success. On Windows only the write bits have a native home (the read-only
attribute), so the rest of the mask is accepted and dropped.

# Errors

[`FsError::NotFound`] when the path does not exist, otherwise the failing
native call.
*/
pub fn update_permissions(
    path: &Path,
    requested: Permissions,
    op: PermApply,
    follow_symlinks: bool,
) -> Result<()> {
    sys::update_permissions(path, requested, op, follow_symlinks)
}

/**
Creates a symlink at `link` pointing to `target`, which does not have to
exist. For a target that is (or will be) a directory, use
[`create_dir_symlink`] so the link works on Windows too.

# Errors

[`FsError::AlreadyExists`] when something already sits at `link`,
[`FsError::NotFound`] when its parent directory is missing.
*/
pub fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    sys::create_symlink(target, link, false)
}

/// [`create_symlink`] for directory targets. The same primitive on POSIX;
/// on Windows the link is stamped with the directory flag it needs.
pub fn create_dir_symlink(target: &Path, link: &Path) -> Result<()> {
    sys::create_symlink(target, link, true)
}

/**
The target stored inside the symlink at `path`, exactly as written.

# Errors

[`FsError::NotASymlink`] when the path exists but is no symlink,
[`FsError::NotFound`] when it does not exist.
*/
pub fn read_symlink(path: &Path) -> Result<PathBuf> {
    sys::read_symlink(path)
}

/// The process-wide current working directory.
///
/// # Errors
///
/// The failing native call, e.g. when the directory was removed underneath
/// the process.
pub fn current_dir() -> Result<PathBuf> {
    sys::current_dir()
}

/// Changes the process-wide current working directory.
///
/// # Errors
///
/// [`FsError::NotFound`] / [`FsError::NotADirectory`] for the obvious
/// preconditions, otherwise the failing native call.
pub fn set_current_dir(path: &Path) -> Result<()> {
    sys::set_current_dir(path)
}

/**
Absolute form of `path` resolved against the current directory, computed
textually. Nothing has to exist and symlinks are not followed; `.` and `..`
components are collapsed lexically.

# Errors

[`FsError::InvalidPath`] for an empty path, or whatever fetching the
current directory reports.
*/
pub fn absolute(path: &Path) -> Result<PathBuf> {
    sys::absolute(path)
}

/**
The canonical form of `path`: absolute, free of `.`/`..` and with every
symlink resolved. Unlike [`absolute`] this asks the filesystem, so the path
must exist. On Windows the result mirrors the input's spelling: a `\\?\`
input keeps the long-path prefix, a plain one gets the plain form back.

# Examples
```no_run
let here = hostfs::canonical(".".as_ref())?;
assert!(here.is_absolute());
# hostfs::Result::Ok(())
```

# Errors

[`FsError::NotFound`] when any component is missing, otherwise the failing
native call.
*/
pub fn canonical(path: &Path) -> Result<PathBuf> {
    sys::canonical(path)
}

/**
Do `a` and `b` name the same underlying file? Symlinks are followed on both
sides, so a link and its target are equivalent, as are two hard links to
one inode. Distinct files with equal content are not.

Exactly one side failing to resolve answers `Ok(false)`.

# Errors

Only when both sides fail to resolve.
*/
pub fn equivalent(a: &Path, b: &Path) -> Result<bool> {
    sys::equivalent(a, b)
}

/**
Creates the directory `path`. Finding a directory already there counts as
success, so concurrent creators do not race each other into errors.

# Errors

[`FsError::AlreadyExists`] when the occupant is not a directory,
[`FsError::NotFound`] when the parent is missing (see [`create_dir_all`]).
*/
pub fn create_dir(path: &Path) -> Result<()> {
    match sys::create_dir(path) {
        Err(FsError::AlreadyExists) if is_directory(path) => Ok(()),
        other => other,
    }
}

/**
Creates `path` and every missing ancestor, like `mkdir -p`.

# Examples
```no_run
hostfs::create_dir_all("a/b/c".as_ref())?;
assert!(hostfs::is_directory("a/b/c".as_ref()));
# hostfs::Result::Ok(())
```

# Errors

As [`create_dir`], for whichever component fails first.
*/
pub fn create_dir_all(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(FsError::InvalidPath);
    }
    match sys::create_dir(path) {
        Ok(()) => Ok(()),
        Err(FsError::AlreadyExists) if is_directory(path) => Ok(()),
        Err(FsError::NotFound) => {
            let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
                return Err(FsError::NotFound);
            };
            create_dir_all(parent)?;
            match sys::create_dir(path) {
                Err(FsError::AlreadyExists) if is_directory(path) => Ok(()),
                other => other,
            }
        }
        Err(err) => Err(err),
    }
}

/**
Creates an empty regular file at `path`, truncating whatever regular file
was there before.

# Errors

[`FsError::NotFound`] when the parent directory is missing, otherwise the
failing native call.
*/
pub fn create_file(path: &Path) -> Result<()> {
    sys::create_file(path)
}

/**
Creates `link` as a new hard link to `original`. Both names address the
same data afterwards, as [`equivalent`] and [`hard_link_count`] report.

# Errors

[`FsError::AlreadyExists`] when `link` is taken, [`FsError::NotFound`] when
`original` is missing.
*/
pub fn create_hard_link(original: &Path, link: &Path) -> Result<()> {
    sys::create_hard_link(original, link)
}

/**
Copies the contents of `from` to `to`. Without `overwrite` an existing
destination fails the copy before a byte moves; with it the destination is
replaced.

# Errors

[`FsError::AlreadyExists`] from the overwrite guard, [`FsError::NotFound`]
for a missing source, otherwise the failing native call. A failure mid-copy
can leave a partial destination behind.
*/
pub fn copy_file(from: &Path, to: &Path, overwrite: bool) -> Result<()> {
    sys::copy_file(from, to, overwrite)
}

/**
Moves `from` to `to`, replacing an existing destination. Within one
filesystem this is the native atomic rename; across filesystems the host is
allowed to copy and delete.

# Errors

[`FsError::NotFound`] when the source is missing, otherwise the failing
native call.
*/
pub fn rename(from: &Path, to: &Path) -> Result<()> {
    sys::rename(from, to)
}

/**
Removes the entry at `path`: the directory itself (which must be empty),
the file, or the symlink without touching its target.

# Errors

[`RemoveError::NotFound`] keeps removal idempotent,
[`RemoveError::DirectoryNotEmpty`] says to use [`remove_all`] instead.
*/
pub fn remove(path: &Path) -> core::result::Result<(), RemoveError> {
    sys::remove(path, false)
}

/**
Removes `path` with everything below it, children before parents, and
returns how many entries went away. An absent root is a successful removal
of nothing.

# Examples
```no_run
hostfs::create_dir_all("scratch/deep".as_ref())?;
hostfs::create_file("scratch/deep/data".as_ref())?;
assert_eq!(hostfs::remove_all("scratch".as_ref()).unwrap(), 3);
# hostfs::Result::Ok(())
```

# Errors

The first child removal that fails for a real reason; entries that vanish
concurrently are skipped, not errors.
*/
pub fn remove_all(path: &Path) -> core::result::Result<u64, RemoveError> {
    let info = symlink_info(path);
    if info.file_type == crate::FileType::NotFound {
        return Ok(0);
    }
    if !info.is_dir() {
        // one entry, nothing to walk; a symlink to a directory lands here
        // too, unlinking the link and sparing the target
        sys::remove(path, true)?;
        return Ok(1);
    }
    let walker = match crate::walk(path) {
        Ok(walker) => walker,
        Err(FsError::NotFound) => return Ok(0),
        Err(FsError::Os(e)) => return Err(RemoveError::Other(e)),
        // the entry stopped being a directory mid-flight, take it as it is now
        Err(_) => {
            sys::remove(path, true)?;
            return Ok(1);
        }
    };
    let mut removed = 0u64;
    let mut dirs: Vec<PathBuf> = Vec::new();
    for entry in walker {
        if entry.is_dir() {
            dirs.push(entry.into_path());
        } else {
            match sys::remove(entry.path(), true) {
                Ok(()) => removed += 1,
                Err(RemoveError::NotFound) => {}
                Err(err) => return Err(err),
            }
        }
    }
    // the walk yields parents before children, so the reverse order empties
    // every directory before its own turn comes
    for dir in dirs.iter().rev() {
        match sys::remove(dir, true) {
            Ok(()) => removed += 1,
            Err(RemoveError::NotFound) => {}
            Err(err) => return Err(err),
        }
    }
    match sys::remove(path, false) {
        Ok(()) => Ok(removed + 1),
        Err(RemoveError::NotFound) => Ok(removed),
        Err(err) => Err(err),
    }
}

/**
Capacity and free space of the filesystem holding `path`, in bytes.

# Errors

[`FsError::NotFound`] when the path does not exist, otherwise the failing
native call.
*/
pub fn space(path: &Path) -> Result<SpaceInfo> {
    sys::space(path)
}
