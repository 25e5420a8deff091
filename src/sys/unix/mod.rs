#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]

mod fd;
mod iter;

pub(crate) use iter::ReadDir;

use fd::FileDes;

use crate::error::{FsError, OsError, Result, last_errno};
use crate::{FileInfo, FileType, PermApply, Permissions, RemoveError, SpaceInfo, UserDir};
use chrono::{DateTime, Utc};
use libc::{lstat, stat};
use std::ffi::{CStr, CString, OsStr, OsString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Component, Path, PathBuf};

/// Hands a `Path` to the C side. An embedded NUL is the caller's problem,
/// reported as an invalid path.
pub(crate) fn to_cstring(path: &Path) -> Result<CString> {
    Ok(CString::new(path.as_os_str().as_bytes())?)
}

/// Builds the portable snapshot from a raw stat buffer.
pub(crate) fn info_from_stat(st: &libc::stat) -> FileInfo {
    let mode: libc::mode_t = access_stat!(st, st_mode);
    let file_type = FileType::from_mode(mode);
    let size: u64 = if file_type.is_dir() {
        0
    } else {
        access_stat!(st, st_size)
    };
    FileInfo {
        file_type,
        permissions: Permissions::from_bits_truncate((mode as u32 & 0o6777) as u16),
        size,
        created: creation_time(st),
        modified: DateTime::from_timestamp(
            access_stat!(st, st_mtime),
            access_stat!(st, st_mtimensec),
        ),
    }
}

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd"
))]
fn creation_time(st: &libc::stat) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(
        access_stat!(st, st_birthtime),
        access_stat!(st, st_birthtimensec),
    )
}

/// Outside the BSD family no birth time is recorded; the inode change time is
/// the closest thing the platform keeps.
#[cfg(not(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd"
)))]
fn creation_time(st: &libc::stat) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(access_stat!(st, st_ctime), access_stat!(st, st_ctimensec))
}

/// Fallible metadata query behind [`file_info`](crate::file_info) and
/// [`symlink_info`](crate::symlink_info). `ENOENT`/`ENOTDIR` become the
/// `NotFound` value without being recorded anywhere.
pub(crate) fn stat_info(path: &Path, follow: bool) -> Result<FileInfo> {
    let cpath = to_cstring(path)?;
    let queried = if follow {
        stat_syscall!(stat, cpath.as_ptr())
    } else {
        stat_syscall!(lstat, cpath.as_ptr())
    };
    match queried {
        Ok(st) => Ok(info_from_stat(&st)),
        Err(libc::ENOENT | libc::ENOTDIR) => Err(FsError::NotFound),
        Err(code) => Err(OsError::log(if follow { "stat" } else { "lstat" }, code).into()),
    }
}

pub(crate) fn hard_link_count(path: &Path) -> Result<u64> {
    let cpath = to_cstring(path)?;
    match stat_syscall!(stat, cpath.as_ptr()) {
        Ok(st) => Ok(access_stat!(st, st_nlink)),
        Err(libc::ENOENT | libc::ENOTDIR) => Err(FsError::NotFound),
        Err(code) => Err(OsError::log("stat", code).into()),
    }
}

pub(crate) fn set_modified(path: &Path, modified: DateTime<Utc>) -> Result<()> {
    let cpath = to_cstring(path)?;
    let times = [
        // leave the access time exactly as it is
        libc::timespec {
            tv_sec: 0,
            tv_nsec: libc::UTIME_OMIT,
        },
        libc::timespec {
            tv_sec: modified.timestamp() as libc::time_t,
            tv_nsec: modified.timestamp_subsec_nanos() as libc::c_long,
        },
    ];
    // SAFETY: the path is NUL-terminated and `times` outlives the call
    if unsafe { libc::utimensat(libc::AT_FDCWD, cpath.as_ptr(), times.as_ptr(), 0) } == 0 {
        Ok(())
    } else {
        match last_errno() {
            libc::ENOENT | libc::ENOTDIR => Err(FsError::NotFound),
            code => Err(OsError::log("utimensat", code).into()),
        }
    }
}

pub(crate) fn update_permissions(
    path: &Path,
    requested: Permissions,
    op: PermApply,
    follow_symlinks: bool,
) -> Result<()> {
    let cpath = to_cstring(path)?;
    let queried = if follow_symlinks {
        stat_syscall!(stat, cpath.as_ptr())
    } else {
        stat_syscall!(lstat, cpath.as_ptr())
    };
    let st = match queried {
        Ok(st) => st,
        Err(libc::ENOENT | libc::ENOTDIR) => return Err(FsError::NotFound),
        Err(code) => {
            return Err(OsError::log(if follow_symlinks { "stat" } else { "lstat" }, code).into());
        }
    };
    let mode: libc::mode_t = access_stat!(st, st_mode);
    if !follow_symlinks && FileType::from_mode(mode) == FileType::Symlink {
        // a link carries no mode of its own worth editing, and
        // fchmodat(AT_SYMLINK_NOFOLLOW) is unsupported on the common platforms;
        // success without effect
        return Ok(());
    }
    // the mask clamps the requested side only; whatever the current mode
    // carries outside it, the sticky bit for instance, survives the update
    let portable = u32::from(Permissions::MASK.bits());
    let current = mode as u32 & 0o7777;
    let requested = u32::from(requested.bits());
    let computed = match op {
        PermApply::Replace => (current & !portable) | requested,
        PermApply::Add => current | requested,
        PermApply::Remove => current & !requested,
    };
    if computed == current {
        return Ok(());
    }
    // SAFETY: the path is NUL-terminated
    if unsafe { libc::chmod(cpath.as_ptr(), computed as libc::mode_t) } == 0 {
        Ok(())
    } else {
        match last_errno() {
            libc::ENOENT | libc::ENOTDIR => Err(FsError::NotFound),
            code => Err(OsError::log("chmod", code).into()),
        }
    }
}

/// One primitive covers file and directory symlinks here; the flag only
/// matters on the Windows side.
pub(crate) fn create_symlink(target: &Path, link: &Path, _directory: bool) -> Result<()> {
    let ctarget = to_cstring(target)?;
    let clink = to_cstring(link)?;
    // SAFETY: both strings are NUL-terminated
    if unsafe { libc::symlink(ctarget.as_ptr(), clink.as_ptr()) } == 0 {
        Ok(())
    } else {
        match last_errno() {
            libc::EEXIST => Err(FsError::AlreadyExists),
            libc::ENOENT | libc::ENOTDIR => Err(FsError::NotFound),
            code => Err(OsError::log("symlink", code).into()),
        }
    }
}

pub(crate) fn read_symlink(path: &Path) -> Result<PathBuf> {
    let cpath = to_cstring(path)?;
    let mut target = vec![0u8; libc::PATH_MAX as usize];
    // SAFETY: the buffer is writable for its full length; readlink does not
    // NUL-terminate, the returned length is the only size information
    let len = unsafe {
        libc::readlink(
            cpath.as_ptr(),
            target.as_mut_ptr().cast::<libc::c_char>(),
            target.len(),
        )
    };
    if len < 0 {
        return Err(match last_errno() {
            libc::EINVAL => FsError::NotASymlink,
            libc::ENOENT | libc::ENOTDIR => FsError::NotFound,
            code => OsError::log("readlink", code).into(),
        });
    }
    target.truncate(len as usize);
    Ok(PathBuf::from(OsString::from_vec(target)))
}

pub(crate) fn current_dir() -> Result<PathBuf> {
    let mut buf = vec![0u8; 512];
    loop {
        // SAFETY: the buffer is writable for its full length
        let got = unsafe { libc::getcwd(buf.as_mut_ptr().cast::<libc::c_char>(), buf.len()) };
        if !got.is_null() {
            // SAFETY: getcwd NUL-terminates on success
            let cwd = unsafe { CStr::from_ptr(buf.as_ptr().cast::<libc::c_char>()) };
            return Ok(PathBuf::from(OsStr::from_bytes(cwd.to_bytes())));
        }
        match last_errno() {
            libc::ERANGE => buf.resize(buf.len() * 2, 0),
            code => return Err(OsError::log("getcwd", code).into()),
        }
    }
}

pub(crate) fn set_current_dir(path: &Path) -> Result<()> {
    let cpath = to_cstring(path)?;
    // SAFETY: the path is NUL-terminated
    if unsafe { libc::chdir(cpath.as_ptr()) } == 0 {
        Ok(())
    } else {
        match last_errno() {
            libc::ENOENT => Err(FsError::NotFound),
            libc::ENOTDIR => Err(FsError::NotADirectory),
            code => Err(OsError::log("chdir", code).into()),
        }
    }
}

/// Lexically absolute form of `path` against the current directory. Purely
/// textual: nothing needs to exist and symlinks are left alone.
pub(crate) fn absolute(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(FsError::InvalidPath);
    }
    if path.is_absolute() {
        return Ok(lexical_normalize(path));
    }
    Ok(lexical_normalize(&current_dir()?.join(path)))
}

/// Collapses `.` components, applies `..` textually and squeezes separator
/// runs. `..` at the root stays at the root, the POSIX rule.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::RootDir | Component::Prefix(_) => out.push(comp.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = match out.components().next_back() {
                    Some(Component::Normal(_)) => out.pop(),
                    Some(Component::RootDir) => true,
                    _ => false,
                };
                if !popped {
                    // a leading run of ".." in a relative path has to survive
                    out.push("..");
                }
            }
            Component::Normal(name) => out.push(name),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Fully resolved physical path: absolute, no symlinks, no dot components.
/// The path must exist.
pub(crate) fn canonical(path: &Path) -> Result<PathBuf> {
    let full = absolute(path)?;
    let cpath = to_cstring(&full)?;
    // SAFETY: with a null resolved buffer realpath allocates; freed below
    let resolved = unsafe { libc::realpath(cpath.as_ptr(), core::ptr::null_mut()) };
    if resolved.is_null() {
        return Err(match last_errno() {
            libc::ENOENT | libc::ENOTDIR => FsError::NotFound,
            code => OsError::log("realpath", code).into(),
        });
    }
    // SAFETY: realpath returned a NUL-terminated allocation
    let bytes = unsafe { CStr::from_ptr(resolved) }.to_bytes().to_vec();
    // SAFETY: the allocation came from realpath and is released exactly once
    unsafe { libc::free(resolved.cast()) };
    Ok(PathBuf::from(OsString::from_vec(bytes)))
}

/// Do two paths name the same underlying file? Keyed on `(st_dev, st_ino)`
/// after following links. One side failing to resolve is an answer (`false`),
/// both failing is an error.
pub(crate) fn equivalent(a: &Path, b: &Path) -> Result<bool> {
    let ca = to_cstring(a)?;
    let cb = to_cstring(b)?;
    let qa = stat_syscall!(stat, ca.as_ptr());
    let qb = stat_syscall!(stat, cb.as_ptr());
    match (qa, qb) {
        (Ok(sa), Ok(sb)) => {
            let dev_a: u64 = access_stat!(sa, st_dev);
            let dev_b: u64 = access_stat!(sb, st_dev);
            let ino_a: u64 = access_stat!(sa, st_ino);
            let ino_b: u64 = access_stat!(sb, st_ino);
            Ok(dev_a == dev_b && ino_a == ino_b)
        }
        (Ok(_), Err(_)) | (Err(_), Ok(_)) => Ok(false),
        (Err(code), Err(_)) => Err(match code {
            libc::ENOENT | libc::ENOTDIR => FsError::NotFound,
            code => OsError::log("stat", code).into(),
        }),
    }
}

pub(crate) fn create_dir(path: &Path) -> Result<()> {
    let cpath = to_cstring(path)?;
    // SAFETY: the path is NUL-terminated; the mode is narrowed by the umask
    if unsafe { libc::mkdir(cpath.as_ptr(), 0o777) } == 0 {
        Ok(())
    } else {
        match last_errno() {
            libc::EEXIST => Err(FsError::AlreadyExists),
            libc::ENOENT => Err(FsError::NotFound),
            libc::ENOTDIR => Err(FsError::NotADirectory),
            code => Err(OsError::log("mkdir", code).into()),
        }
    }
}

/// Create-or-truncate: a fresh empty file, or an existing one cut to zero.
pub(crate) fn create_file(path: &Path) -> Result<()> {
    let cpath = to_cstring(path)?;
    let flags = libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC | libc::O_CLOEXEC;
    let file = FileDes::open(&cpath, flags, 0o666).map_err(|code| match code {
        libc::ENOENT | libc::ENOTDIR => FsError::NotFound,
        code => FsError::from(OsError::log("open", code)),
    })?;
    drop(file); // close now, the (possibly truncated) file stays behind
    Ok(())
}

pub(crate) fn create_hard_link(original: &Path, link: &Path) -> Result<()> {
    let coriginal = to_cstring(original)?;
    let clink = to_cstring(link)?;
    // SAFETY: both strings are NUL-terminated
    if unsafe { libc::link(coriginal.as_ptr(), clink.as_ptr()) } == 0 {
        Ok(())
    } else {
        match last_errno() {
            libc::EEXIST => Err(FsError::AlreadyExists),
            libc::ENOENT | libc::ENOTDIR => Err(FsError::NotFound),
            code => Err(OsError::log("link", code).into()),
        }
    }
}

/// Streamed copy through the std file collaborator in 4 KiB chunks. A failure
/// mid-copy can leave a partial destination behind; the no-overwrite guard
/// itself is atomic (`O_CREAT|O_EXCL` underneath).
pub(crate) fn copy_file(from: &Path, to: &Path, overwrite: bool) -> Result<()> {
    use std::io::{Read, Write};

    let mut src = std::fs::File::open(from)?;
    let mut opts = std::fs::OpenOptions::new();
    opts.write(true);
    if overwrite {
        opts.create(true).truncate(true);
    } else {
        opts.create_new(true);
    }
    let mut dst = opts.open(to)?;
    let mut chunk = [0u8; 4096];
    loop {
        let read = src.read(&mut chunk)?;
        if read == 0 {
            return Ok(());
        }
        dst.write_all(&chunk[..read])?;
    }
}

pub(crate) fn rename(from: &Path, to: &Path) -> Result<()> {
    let cfrom = to_cstring(from)?;
    let cto = to_cstring(to)?;
    // SAFETY: both strings are NUL-terminated
    if unsafe { libc::rename(cfrom.as_ptr(), cto.as_ptr()) } == 0 {
        Ok(())
    } else {
        match last_errno() {
            libc::ENOENT | libc::ENOTDIR => Err(FsError::NotFound),
            code => Err(OsError::log("rename", code).into()),
        }
    }
}

/// Removes one entry: `rmdir` for directories, `unlink` for everything else
/// (a symlink is unlinked, never followed). Absence is reported, not logged.
/// `in_recursive_remove` quietens the directory-not-empty report, which is
/// routine while a tree drain is running.
pub(crate) fn remove(
    path: &Path,
    in_recursive_remove: bool,
) -> core::result::Result<(), RemoveError> {
    let Ok(cpath) = to_cstring(path) else {
        return Err(RemoveError::Other(OsError::log("CString::new", libc::EINVAL)));
    };
    let st = match stat_syscall!(lstat, cpath.as_ptr()) {
        Ok(st) => st,
        Err(libc::ENOENT | libc::ENOTDIR) => return Err(RemoveError::NotFound),
        Err(code) => return Err(RemoveError::Other(OsError::log("lstat", code))),
    };
    let mode: libc::mode_t = access_stat!(st, st_mode);
    if FileType::from_mode(mode) == FileType::Directory {
        // SAFETY: the path is NUL-terminated
        if unsafe { libc::rmdir(cpath.as_ptr()) } == 0 {
            return Ok(());
        }
        match last_errno() {
            libc::ENOENT => Err(RemoveError::NotFound),
            // POSIX allows either code for a populated directory
            libc::ENOTEMPTY | libc::EEXIST => {
                if !in_recursive_remove {
                    tracing::debug!(target: "hostfs", path = %path.display(), "directory not empty");
                }
                Err(RemoveError::DirectoryNotEmpty)
            }
            code => Err(RemoveError::Other(OsError::log("rmdir", code))),
        }
    } else {
        // SAFETY: the path is NUL-terminated
        if unsafe { libc::unlink(cpath.as_ptr()) } == 0 {
            return Ok(());
        }
        match last_errno() {
            libc::ENOENT => Err(RemoveError::NotFound),
            code => Err(RemoveError::Other(OsError::log("unlink", code))),
        }
    }
}

pub(crate) fn space(path: &Path) -> Result<SpaceInfo> {
    let cpath = to_cstring(path)?;
    let mut vfs = core::mem::MaybeUninit::<libc::statvfs>::uninit();
    // SAFETY: the path is NUL-terminated and the buffer is sized for the call
    if unsafe { libc::statvfs(cpath.as_ptr(), vfs.as_mut_ptr()) } != 0 {
        return Err(match last_errno() {
            libc::ENOENT | libc::ENOTDIR => FsError::NotFound,
            code => OsError::log("statvfs", code).into(),
        });
    }
    // SAFETY: a zero return means the struct was filled in
    let vfs = unsafe { vfs.assume_init() };
    // block counts are in f_frsize units, not f_bsize
    let frsize = vfs.f_frsize as u64;
    Ok(SpaceInfo {
        capacity: vfs.f_blocks as u64 * frsize,
        free: vfs.f_bfree as u64 * frsize,
        available: vfs.f_bavail as u64 * frsize,
    })
}

pub(crate) fn user_dir_path(which: UserDir) -> Option<PathBuf> {
    let home = std::env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)?;
    if which == UserDir::Home {
        return Some(home);
    }
    if let Some(found) = xdg_user_dir(&home, which.xdg_key()) {
        return Some(found);
    }
    // conventional layout when nothing overrides it
    Some(home.join(which.default_name()))
}

/// Looks `key` up in the `user-dirs.dirs` file that xdg-user-dirs maintains.
fn xdg_user_dir(home: &Path, key: &str) -> Option<PathBuf> {
    let config = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map_or_else(|| home.join(".config"), PathBuf::from);
    parse_user_dirs(&config.join("user-dirs.dirs"), home, key)
}

/// Scans one `user-dirs.dirs` file for `key`. Lines look like
/// `XDG_DESKTOP_DIR="$HOME/Desktop"`; the values are quoted and either
/// `$HOME/`-relative or absolute.
fn parse_user_dirs(file: &Path, home: &Path, key: &str) -> Option<PathBuf> {
    use std::io::BufRead;

    let file = std::fs::File::open(file).ok()?;
    for line in std::io::BufReader::new(file).lines() {
        let line = line.ok()?;
        let trimmed = line.trim_start();
        let Some(value) = trimmed
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix('='))
        else {
            continue;
        };
        let value = value.trim_end().trim_matches('"');
        if let Some(rel) = value.strip_prefix("$HOME/") {
            if rel.is_empty() {
                // `"$HOME/"` is how xdg-user-dirs marks an entry disabled
                return None;
            }
            return Some(home.join(rel));
        }
        if value.starts_with('/') {
            return Some(PathBuf::from(value));
        }
        // a relative value is not allowed by the format, ignore the line
        return None;
    }
    None
}
