#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

mod handle;
mod iter;
mod reparse;

pub(crate) use iter::ReadDir;

use handle::Handle;

use crate::error::{FsError, OsError, Result, last_errno};
use crate::{FileInfo, FileType, PermApply, Permissions, RemoveError, SpaceInfo, UserDir};
use chrono::{DateTime, Utc};
use std::ffi::{OsStr, OsString};
use std::os::windows::ffi::{OsStrExt, OsStringExt};
use std::path::{Component, Path, PathBuf};
use windows_sys::Win32::Foundation::{
    ERROR_ALREADY_EXISTS, ERROR_DIR_NOT_EMPTY, ERROR_DIRECTORY, ERROR_FILE_EXISTS,
    ERROR_FILE_NOT_FOUND, ERROR_INVALID_NAME, ERROR_INVALID_PARAMETER, ERROR_PATH_NOT_FOUND,
    FILETIME, GENERIC_WRITE, S_OK,
};
use windows_sys::Win32::Storage::FileSystem::{
    BY_HANDLE_FILE_INFORMATION, CREATE_ALWAYS, CopyFileW, CreateDirectoryW, CreateFileW,
    CreateHardLinkW, CreateSymbolicLinkW, DeleteFileW, FILE_ATTRIBUTE_DIRECTORY,
    FILE_ATTRIBUTE_NORMAL, FILE_ATTRIBUTE_READONLY, FILE_ATTRIBUTE_REPARSE_POINT,
    FILE_BASIC_INFO, FILE_FLAG_BACKUP_SEMANTICS, FILE_FLAG_OPEN_REPARSE_POINT,
    FILE_READ_ATTRIBUTES, FILE_SHARE_DELETE, FILE_SHARE_READ, FILE_SHARE_WRITE,
    FILE_WRITE_ATTRIBUTES, FileBasicInfo, GetDiskFreeSpaceExW, GetFileAttributesW,
    GetFileInformationByHandle, GetFinalPathNameByHandleW, GetFullPathNameW,
    INVALID_FILE_ATTRIBUTES, MOVEFILE_COPY_ALLOWED, MOVEFILE_REPLACE_EXISTING, MoveFileExW,
    OPEN_EXISTING, RemoveDirectoryW, SYMBOLIC_LINK_FLAG_ALLOW_UNPRIVILEGED_CREATE,
    SYMBOLIC_LINK_FLAG_DIRECTORY, SetFileAttributesW, SetFileInformationByHandle, SetFileTime,
    VOLUME_NAME_DOS, VOLUME_NAME_NT, WIN32_FIND_DATAW,
};
use windows_sys::Win32::System::Com::CoTaskMemFree;
use windows_sys::Win32::System::Environment::{GetCurrentDirectoryW, SetCurrentDirectoryW};
use windows_sys::Win32::System::SystemServices::IO_REPARSE_TAG_SYMLINK;
use windows_sys::Win32::UI::Shell::SHGetKnownFolderPath;
use windows_sys::core::PWSTR;

const SHARE_ALL: u32 = FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE;

/// Hands a `Path` to the wide-character side. An embedded NUL is the caller's
/// problem, reported as an invalid path.
pub(crate) fn to_wide(value: &OsStr) -> Result<Vec<u16>> {
    let mut wide: Vec<u16> = value.encode_wide().collect();
    if wide.contains(&0) {
        return Err(FsError::InvalidPath);
    }
    wide.push(0);
    Ok(wide)
}

/**
Metadata-grade open. `FILE_FLAG_BACKUP_SEMANTICS` is what lets `CreateFileW`
hand back directory handles at all; without `follow` the reparse point itself
is opened instead of whatever it points at.
*/
fn open_handle(path: &Path, access: u32, follow: bool) -> Result<Handle> {
    let wide = to_wide(path.as_os_str())?;
    let mut flags = FILE_FLAG_BACKUP_SEMANTICS;
    if !follow {
        flags |= FILE_FLAG_OPEN_REPARSE_POINT;
    }
    // SAFETY: the path is NUL-terminated; null security and template are allowed
    let raw = unsafe {
        CreateFileW(
            wide.as_ptr(),
            access,
            SHARE_ALL,
            core::ptr::null(),
            OPEN_EXISTING,
            flags,
            core::ptr::null_mut(),
        )
    };
    Handle::new(raw).ok_or_else(|| match last_errno() as u32 {
        ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => FsError::NotFound,
        code => OsError::log("CreateFileW", code as i32).into(),
    })
}

fn by_handle_info(handle: &Handle) -> Result<BY_HANDLE_FILE_INFORMATION> {
    // SAFETY: zeroed is a valid BY_HANDLE_FILE_INFORMATION, the call fills it
    let mut info: BY_HANDLE_FILE_INFORMATION = unsafe { core::mem::zeroed() };
    // SAFETY: the handle is open and the struct is writable
    if unsafe { GetFileInformationByHandle(handle.raw(), &mut info) } == 0 {
        return Err(OsError::last("GetFileInformationByHandle").into());
    }
    Ok(info)
}

const TICKS_PER_SEC: u64 = 10_000_000;
/// Seconds between the Windows epoch (1601) and the Unix epoch (1970).
const EPOCH_GAP_SECS: u64 = 11_644_473_600;

fn filetime_to_utc(ft: &FILETIME) -> Option<DateTime<Utc>> {
    let ticks = (u64::from(ft.dwHighDateTime) << 32) | u64::from(ft.dwLowDateTime);
    if ticks == 0 {
        // filesystems that do not record the field hand back zero
        return None;
    }
    let secs = (ticks / TICKS_PER_SEC) as i64 - EPOCH_GAP_SECS as i64;
    let nanos = (ticks % TICKS_PER_SEC) as u32 * 100;
    DateTime::from_timestamp(secs, nanos)
}

fn utc_to_filetime(when: DateTime<Utc>) -> FILETIME {
    let secs = when.timestamp().saturating_add(EPOCH_GAP_SECS as i64).max(0) as u64;
    let ticks = secs
        .saturating_mul(TICKS_PER_SEC)
        .saturating_add(u64::from(when.timestamp_subsec_nanos() / 100));
    FILETIME {
        dwLowDateTime: ticks as u32,
        dwHighDateTime: (ticks >> 32) as u32,
    }
}

fn has_executable_extension(name: &OsStr) -> bool {
    Path::new(name).extension().is_some_and(|ext| {
        ext.eq_ignore_ascii_case("exe")
            || ext.eq_ignore_ascii_case("com")
            || ext.eq_ignore_ascii_case("bat")
            || ext.eq_ignore_ascii_case("cmd")
    })
}

/// Projects the attribute bits onto the octal mask. Only "read-only or not"
/// is actually stored, so write bits come and go as a block and the read
/// bits are always on; execute is inferred from the well-known extensions.
fn attrs_permissions(attrs: u32, name: &OsStr) -> Permissions {
    let mut mode = Permissions::ALL_READ;
    if attrs & FILE_ATTRIBUTE_READONLY == 0 {
        mode |= Permissions::ALL_WRITE;
    }
    if attrs & FILE_ATTRIBUTE_DIRECTORY != 0 || has_executable_extension(name) {
        mode |= Permissions::ALL_EXEC;
    }
    mode
}

/// Builds the portable snapshot straight from find data, no per-entry handle
/// needed.
pub(crate) fn info_from_find(found: &WIN32_FIND_DATAW, name: &OsStr) -> FileInfo {
    let attrs = found.dwFileAttributes;
    let file_type = if attrs & FILE_ATTRIBUTE_REPARSE_POINT != 0 {
        // dwReserved0 carries the reparse tag for reparse entries
        if found.dwReserved0 == IO_REPARSE_TAG_SYMLINK {
            FileType::Symlink
        } else {
            FileType::Unknown
        }
    } else if attrs & FILE_ATTRIBUTE_DIRECTORY != 0 {
        FileType::Directory
    } else {
        FileType::RegularFile
    };
    let size = if file_type.is_dir() {
        0
    } else {
        (u64::from(found.nFileSizeHigh) << 32) | u64::from(found.nFileSizeLow)
    };
    FileInfo {
        file_type,
        permissions: attrs_permissions(attrs, name),
        size,
        created: filetime_to_utc(&found.ftCreationTime),
        modified: filetime_to_utc(&found.ftLastWriteTime),
    }
}

fn info_from_handle(
    info: &BY_HANDLE_FILE_INFORMATION,
    file_type: FileType,
    name: &OsStr,
) -> FileInfo {
    let size = if file_type.is_dir() {
        0
    } else {
        (u64::from(info.nFileSizeHigh) << 32) | u64::from(info.nFileSizeLow)
    };
    FileInfo {
        file_type,
        permissions: attrs_permissions(info.dwFileAttributes, name),
        size,
        created: filetime_to_utc(&info.ftCreationTime),
        modified: filetime_to_utc(&info.ftLastWriteTime),
    }
}

/// Fallible metadata query behind [`file_info`](crate::file_info) and
/// [`symlink_info`](crate::symlink_info). Absence becomes `NotFound` without
/// being recorded anywhere.
///
/// The entry itself is opened first either way: only the symlink tag may be
/// followed, junctions and the other reparse kinds read back as `Unknown`
/// and are never resolved.
pub(crate) fn stat_info(path: &Path, follow: bool) -> Result<FileInfo> {
    let handle = open_handle(path, FILE_READ_ATTRIBUTES, false)?;
    let info = by_handle_info(&handle)?;
    if info.dwFileAttributes & FILE_ATTRIBUTE_REPARSE_POINT != 0 {
        let is_symlink = matches!(reparse::reparse_tag(&handle), Ok(IO_REPARSE_TAG_SYMLINK));
        if follow && is_symlink {
            drop(handle);
            let followed = open_handle(path, FILE_READ_ATTRIBUTES, true)?;
            let resolved = by_handle_info(&followed)?;
            let file_type = if resolved.dwFileAttributes & FILE_ATTRIBUTE_DIRECTORY != 0 {
                FileType::Directory
            } else {
                FileType::RegularFile
            };
            return Ok(info_from_handle(&resolved, file_type, path.as_os_str()));
        }
        let file_type = if is_symlink {
            FileType::Symlink
        } else {
            FileType::Unknown
        };
        return Ok(info_from_handle(&info, file_type, path.as_os_str()));
    }
    let file_type = if info.dwFileAttributes & FILE_ATTRIBUTE_DIRECTORY != 0 {
        FileType::Directory
    } else {
        FileType::RegularFile
    };
    Ok(info_from_handle(&info, file_type, path.as_os_str()))
}

pub(crate) fn hard_link_count(path: &Path) -> Result<u64> {
    let handle = open_handle(path, FILE_READ_ATTRIBUTES, true)?;
    Ok(u64::from(by_handle_info(&handle)?.nNumberOfLinks))
}

pub(crate) fn set_modified(path: &Path, modified: DateTime<Utc>) -> Result<()> {
    let handle = open_handle(path, FILE_WRITE_ATTRIBUTES, true)?;
    let ft = utc_to_filetime(modified);
    // SAFETY: null creation and access times leave those fields untouched
    if unsafe { SetFileTime(handle.raw(), core::ptr::null(), core::ptr::null(), &ft) } == 0 {
        return Err(OsError::last("SetFileTime").into());
    }
    Ok(())
}

pub(crate) fn update_permissions(
    path: &Path,
    requested: Permissions,
    op: PermApply,
    follow_symlinks: bool,
) -> Result<()> {
    let handle = open_handle(
        path,
        FILE_READ_ATTRIBUTES | FILE_WRITE_ATTRIBUTES,
        follow_symlinks,
    )?;
    let attrs = by_handle_info(&handle)?.dwFileAttributes;
    if !follow_symlinks && attrs & FILE_ATTRIBUTE_REPARSE_POINT != 0 {
        // a link carries no mode of its own worth editing; success without effect
        return Ok(());
    }
    let current = attrs_permissions(attrs, path.as_os_str());
    let computed = current.combine(requested, op);
    if computed == current {
        return Ok(());
    }
    let mut new_attrs = if computed.intersects(Permissions::ALL_WRITE) {
        attrs & !FILE_ATTRIBUTE_READONLY
    } else {
        attrs | FILE_ATTRIBUTE_READONLY
    };
    if new_attrs == 0 {
        // zero is not a valid attribute set
        new_attrs = FILE_ATTRIBUTE_NORMAL;
    }
    let basic = FILE_BASIC_INFO {
        // zeroed times mean "leave unchanged" to this info class
        CreationTime: 0,
        LastAccessTime: 0,
        LastWriteTime: 0,
        ChangeTime: 0,
        FileAttributes: new_attrs,
    };
    // SAFETY: the buffer is a live FILE_BASIC_INFO of exactly the stated size
    let ok = unsafe {
        SetFileInformationByHandle(
            handle.raw(),
            FileBasicInfo,
            (&raw const basic).cast(),
            size_of::<FILE_BASIC_INFO>() as u32,
        )
    };
    if ok == 0 {
        return Err(OsError::last("SetFileInformationByHandle").into());
    }
    Ok(())
}

/// `CreateSymbolicLinkW` stores the target verbatim and the kernel only
/// understands backslashes when it later resolves the link, so forward
/// slashes are rewritten and separator runs collapsed, keeping the two
/// leading ones of a UNC target.
fn normalise_target(target: &Path) -> Result<Vec<u16>> {
    const SEP: u16 = b'\\' as u16;
    let mut cleaned: Vec<u16> = Vec::new();
    for mut unit in target.as_os_str().encode_wide() {
        if unit == b'/' as u16 {
            unit = SEP;
        }
        if unit == SEP && cleaned.last() == Some(&SEP) && cleaned.len() > 1 {
            continue;
        }
        cleaned.push(unit);
    }
    if cleaned.contains(&0) {
        return Err(FsError::InvalidPath);
    }
    cleaned.push(0);
    Ok(cleaned)
}

pub(crate) fn create_symlink(target: &Path, link: &Path, directory: bool) -> Result<()> {
    let wide_target = normalise_target(target)?;
    let wide_link = to_wide(link.as_os_str())?;
    let mut flags = SYMBOLIC_LINK_FLAG_ALLOW_UNPRIVILEGED_CREATE;
    if directory {
        flags |= SYMBOLIC_LINK_FLAG_DIRECTORY;
    }
    // SAFETY: both strings are NUL-terminated
    if unsafe { CreateSymbolicLinkW(wide_link.as_ptr(), wide_target.as_ptr(), flags) } != 0 {
        return Ok(());
    }
    if last_errno() as u32 == ERROR_INVALID_PARAMETER {
        // pre-1703 kernels reject the unprivileged flag outright
        let retry = if directory { SYMBOLIC_LINK_FLAG_DIRECTORY } else { 0 };
        // SAFETY: both strings are NUL-terminated
        if unsafe { CreateSymbolicLinkW(wide_link.as_ptr(), wide_target.as_ptr(), retry) } != 0 {
            return Ok(());
        }
    }
    Err(match last_errno() as u32 {
        ERROR_ALREADY_EXISTS | ERROR_FILE_EXISTS => FsError::AlreadyExists,
        ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => FsError::NotFound,
        code => OsError::log("CreateSymbolicLinkW", code as i32).into(),
    })
}

pub(crate) fn read_symlink(path: &Path) -> Result<PathBuf> {
    let handle = open_handle(path, FILE_READ_ATTRIBUTES, false)?;
    reparse::symlink_target(&handle)
}

pub(crate) fn current_dir() -> Result<PathBuf> {
    let mut buf: Vec<u16> = Vec::new();
    loop {
        // SAFETY: the buffer length is passed alongside the pointer
        let needed = unsafe { GetCurrentDirectoryW(buf.len() as u32, buf.as_mut_ptr()) };
        if needed == 0 {
            return Err(OsError::last("GetCurrentDirectoryW").into());
        }
        let needed = needed as usize;
        // a short result counts characters written, a long one includes the
        // terminator it wants room for
        if needed <= buf.len() {
            buf.truncate(needed);
            return Ok(PathBuf::from(OsString::from_wide(&buf)));
        }
        buf.resize(needed, 0);
    }
}

pub(crate) fn set_current_dir(path: &Path) -> Result<()> {
    let wide = to_wide(path.as_os_str())?;
    // SAFETY: the path is NUL-terminated
    if unsafe { SetCurrentDirectoryW(wide.as_ptr()) } != 0 {
        return Ok(());
    }
    Err(match last_errno() as u32 {
        ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => FsError::NotFound,
        ERROR_DIRECTORY => FsError::NotADirectory,
        code => OsError::log("SetCurrentDirectoryW", code as i32).into(),
    })
}

/// Lexically absolute form of `path` against the current directory. Purely
/// textual: nothing needs to exist and symlinks are left alone.
pub(crate) fn absolute(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(FsError::InvalidPath);
    }
    let wide = to_wide(path.as_os_str())?;
    let mut buf: Vec<u16> = Vec::new();
    loop {
        // SAFETY: the path is NUL-terminated and the buffer length is honest
        let needed = unsafe {
            GetFullPathNameW(
                wide.as_ptr(),
                buf.len() as u32,
                buf.as_mut_ptr(),
                core::ptr::null_mut(),
            )
        };
        if needed == 0 {
            return Err(OsError::last("GetFullPathNameW").into());
        }
        let needed = needed as usize;
        if needed <= buf.len() {
            buf.truncate(needed);
            return Ok(PathBuf::from(OsString::from_wide(&buf)));
        }
        buf.resize(needed, 0);
    }
}

fn final_path(handle: &Handle, flags: u32) -> core::result::Result<Vec<u16>, i32> {
    let mut buf: Vec<u16> = Vec::new();
    loop {
        // SAFETY: the handle is open and the buffer length is honest
        let needed = unsafe {
            GetFinalPathNameByHandleW(handle.raw(), buf.as_mut_ptr(), buf.len() as u32, flags)
        };
        if needed == 0 {
            return Err(last_errno());
        }
        let needed = needed as usize;
        if needed <= buf.len() {
            buf.truncate(needed);
            return Ok(buf);
        }
        buf.resize(needed, 0);
    }
}

/// `\\?\C:\x` comes back from the DOS namespace query; the plain spellings
/// (`C:\x`, `\\server\share`) are what callers can hand to every other API.
fn strip_extended_prefix(units: Vec<u16>) -> Vec<u16> {
    const EXTENDED: [u16; 4] = [b'\\' as u16, b'\\' as u16, b'?' as u16, b'\\' as u16];
    const UNC: [u16; 4] = [b'U' as u16, b'N' as u16, b'C' as u16, b'\\' as u16];
    if !units.starts_with(&EXTENDED) {
        return units;
    }
    if units[EXTENDED.len()..].starts_with(&UNC) {
        let mut unc: Vec<u16> = Vec::with_capacity(units.len() - UNC.len() - 2);
        unc.extend_from_slice(&EXTENDED[..2]);
        unc.extend_from_slice(&units[EXTENDED.len() + UNC.len()..]);
        return unc;
    }
    units[EXTENDED.len()..].to_vec()
}

/// `\\?\C:\x`, `\\?\UNC\srv\share` and the other verbatim spellings, decided
/// lexically.
fn has_verbatim_prefix(path: &Path) -> bool {
    match path.components().next() {
        Some(Component::Prefix(prefix)) => prefix.kind().is_verbatim(),
        _ => false,
    }
}

/// Fully resolved physical path: absolute, no symlinks, no dot components.
/// The path must exist. The result mirrors the input's spelling: a `\\?\`
/// input keeps the long-path prefix, a plain one gets the plain form back.
pub(crate) fn canonical(path: &Path) -> Result<PathBuf> {
    let handle = open_handle(path, FILE_READ_ATTRIBUTES, true)?;
    if let Ok(units) = final_path(&handle, VOLUME_NAME_DOS) {
        let units = if has_verbatim_prefix(path) {
            units
        } else {
            strip_extended_prefix(units)
        };
        return Ok(PathBuf::from(OsString::from_wide(&units)));
    }
    // volumes without a drive letter only answer in the NT namespace
    match final_path(&handle, VOLUME_NAME_NT) {
        Ok(units) => {
            let mut full: Vec<u16> = "\\\\?\\GLOBALROOT".encode_utf16().collect();
            full.extend(units);
            Ok(PathBuf::from(OsString::from_wide(&full)))
        }
        Err(code) => Err(OsError::log("GetFinalPathNameByHandleW", code).into()),
    }
}

/// Do two paths name the same underlying file? Keyed on the volume serial
/// and file index after following links. One side failing to resolve is an
/// answer (`false`), both failing is an error.
pub(crate) fn equivalent(a: &Path, b: &Path) -> Result<bool> {
    let qa = file_key(a);
    let qb = file_key(b);
    match (qa, qb) {
        (Ok(ka), Ok(kb)) => Ok(ka == kb),
        (Ok(_), Err(_)) | (Err(_), Ok(_)) => Ok(false),
        (Err(e), Err(_)) => Err(e),
    }
}

fn file_key(path: &Path) -> Result<(u32, u32, u32)> {
    let handle = open_handle(path, FILE_READ_ATTRIBUTES, true)?;
    let info = by_handle_info(&handle)?;
    Ok((
        info.dwVolumeSerialNumber,
        info.nFileIndexHigh,
        info.nFileIndexLow,
    ))
}

pub(crate) fn create_dir(path: &Path) -> Result<()> {
    let wide = to_wide(path.as_os_str())?;
    // SAFETY: the path is NUL-terminated; null means the default security descriptor
    if unsafe { CreateDirectoryW(wide.as_ptr(), core::ptr::null()) } != 0 {
        return Ok(());
    }
    Err(match last_errno() as u32 {
        ERROR_ALREADY_EXISTS => FsError::AlreadyExists,
        ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => FsError::NotFound,
        ERROR_DIRECTORY => FsError::NotADirectory,
        code => OsError::log("CreateDirectoryW", code as i32).into(),
    })
}

/// Create-or-truncate: a fresh empty file, or an existing one cut to zero.
pub(crate) fn create_file(path: &Path) -> Result<()> {
    let wide = to_wide(path.as_os_str())?;
    // SAFETY: the path is NUL-terminated; null security and template are allowed
    let raw = unsafe {
        CreateFileW(
            wide.as_ptr(),
            GENERIC_WRITE,
            SHARE_ALL,
            core::ptr::null(),
            CREATE_ALWAYS,
            FILE_ATTRIBUTE_NORMAL,
            core::ptr::null_mut(),
        )
    };
    match Handle::new(raw) {
        Some(handle) => {
            drop(handle); // close now, the (possibly truncated) file stays behind
            Ok(())
        }
        None => Err(match last_errno() as u32 {
            ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => FsError::NotFound,
            code => OsError::log("CreateFileW", code as i32).into(),
        }),
    }
}

pub(crate) fn create_hard_link(original: &Path, link: &Path) -> Result<()> {
    let wide_original = to_wide(original.as_os_str())?;
    let wide_link = to_wide(link.as_os_str())?;
    // SAFETY: both paths are NUL-terminated
    if unsafe { CreateHardLinkW(wide_link.as_ptr(), wide_original.as_ptr(), core::ptr::null()) }
        != 0
    {
        return Ok(());
    }
    Err(match last_errno() as u32 {
        ERROR_ALREADY_EXISTS | ERROR_FILE_EXISTS => FsError::AlreadyExists,
        ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => FsError::NotFound,
        code => OsError::log("CreateHardLinkW", code as i32).into(),
    })
}

/// The copy engine does the byte shuffling; `bFailIfExists` gives the
/// no-overwrite guard atomically.
pub(crate) fn copy_file(from: &Path, to: &Path, overwrite: bool) -> Result<()> {
    let wide_from = to_wide(from.as_os_str())?;
    let wide_to = to_wide(to.as_os_str())?;
    // SAFETY: both paths are NUL-terminated
    if unsafe { CopyFileW(wide_from.as_ptr(), wide_to.as_ptr(), i32::from(!overwrite)) } != 0 {
        return Ok(());
    }
    Err(match last_errno() as u32 {
        ERROR_FILE_EXISTS | ERROR_ALREADY_EXISTS => FsError::AlreadyExists,
        ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => FsError::NotFound,
        code => OsError::log("CopyFileW", code as i32).into(),
    })
}

/// Cross-volume moves degrade to copy and delete; an existing destination is
/// replaced, matching the POSIX rename contract as closely as the host allows.
pub(crate) fn rename(from: &Path, to: &Path) -> Result<()> {
    let wide_from = to_wide(from.as_os_str())?;
    let wide_to = to_wide(to.as_os_str())?;
    // SAFETY: both paths are NUL-terminated
    let ok = unsafe {
        MoveFileExW(
            wide_from.as_ptr(),
            wide_to.as_ptr(),
            MOVEFILE_COPY_ALLOWED | MOVEFILE_REPLACE_EXISTING,
        )
    };
    if ok != 0 {
        return Ok(());
    }
    Err(match last_errno() as u32 {
        ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => FsError::NotFound,
        code => OsError::log("MoveFileExW", code as i32).into(),
    })
}

/// Removes one entry: `RemoveDirectoryW` for directories (which deletes a
/// directory link itself, never what it points at) and `DeleteFileW` for the
/// rest. A read-only attribute is cleared first and put back if the delete
/// then fails. `in_recursive_remove` quietens the directory-not-empty report,
/// which is routine while a tree drain is running.
pub(crate) fn remove(
    path: &Path,
    in_recursive_remove: bool,
) -> core::result::Result<(), RemoveError> {
    let Ok(wide) = to_wide(path.as_os_str()) else {
        return Err(RemoveError::Other(OsError::log(
            "encode_wide",
            ERROR_INVALID_NAME as i32,
        )));
    };
    // SAFETY: the path is NUL-terminated
    let attrs = unsafe { GetFileAttributesW(wide.as_ptr()) };
    if attrs == INVALID_FILE_ATTRIBUTES {
        return Err(match last_errno() as u32 {
            ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => RemoveError::NotFound,
            code => RemoveError::Other(OsError::log("GetFileAttributesW", code as i32)),
        });
    }
    let cleared_readonly = attrs & FILE_ATTRIBUTE_READONLY != 0;
    if cleared_readonly {
        // SAFETY: the path is NUL-terminated
        if unsafe { SetFileAttributesW(wide.as_ptr(), attrs & !FILE_ATTRIBUTE_READONLY) } == 0 {
            return Err(RemoveError::Other(OsError::last("SetFileAttributesW")));
        }
    }
    let restore = || {
        if cleared_readonly {
            // best effort, the entry is still there and should keep its attribute
            // SAFETY: the path is NUL-terminated
            unsafe { SetFileAttributesW(wide.as_ptr(), attrs) };
        }
    };
    if attrs & FILE_ATTRIBUTE_DIRECTORY != 0 {
        // SAFETY: the path is NUL-terminated
        if unsafe { RemoveDirectoryW(wide.as_ptr()) } != 0 {
            return Ok(());
        }
        let code = last_errno() as u32;
        restore();
        match code {
            ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => Err(RemoveError::NotFound),
            ERROR_DIR_NOT_EMPTY => {
                if !in_recursive_remove {
                    tracing::debug!(target: "hostfs", path = %path.display(), "directory not empty");
                }
                Err(RemoveError::DirectoryNotEmpty)
            }
            code => Err(RemoveError::Other(OsError::log("RemoveDirectoryW", code as i32))),
        }
    } else {
        // SAFETY: the path is NUL-terminated
        if unsafe { DeleteFileW(wide.as_ptr()) } != 0 {
            return Ok(());
        }
        let code = last_errno() as u32;
        restore();
        match code {
            ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND => Err(RemoveError::NotFound),
            code => Err(RemoveError::Other(OsError::log("DeleteFileW", code as i32))),
        }
    }
}

fn query_space(dir: &[u16]) -> core::result::Result<SpaceInfo, u32> {
    let mut available = 0u64;
    let mut capacity = 0u64;
    let mut free = 0u64;
    // SAFETY: the path is NUL-terminated and the out parameters are writable
    let ok = unsafe {
        GetDiskFreeSpaceExW(dir.as_ptr(), &mut available, &mut capacity, &mut free)
    };
    if ok == 0 {
        return Err(last_errno() as u32);
    }
    Ok(SpaceInfo {
        capacity,
        free,
        available,
    })
}

pub(crate) fn space(path: &Path) -> Result<SpaceInfo> {
    let wide = to_wide(path.as_os_str())?;
    let queried = match query_space(&wide) {
        Ok(info) => return Ok(info),
        // statvfs answers for a plain file, this API wants its directory
        Err(ERROR_DIRECTORY) => {
            let parent = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            query_space(&to_wide(parent.as_os_str())?)
        }
        Err(code) => Err(code),
    };
    match queried {
        Ok(info) => Ok(info),
        Err(ERROR_FILE_NOT_FOUND | ERROR_PATH_NOT_FOUND) => Err(FsError::NotFound),
        Err(code) => Err(OsError::log("GetDiskFreeSpaceExW", code as i32).into()),
    }
}

pub(crate) fn user_dir_path(which: UserDir) -> Option<PathBuf> {
    let mut raw: PWSTR = core::ptr::null_mut();
    // SAFETY: a null token means the calling user and the out pointer is ours
    let hr = unsafe {
        SHGetKnownFolderPath(which.known_folder(), 0, core::ptr::null_mut(), &mut raw)
    };
    let path = if hr == S_OK && !raw.is_null() {
        let mut len = 0usize;
        // SAFETY: the shell returns a NUL-terminated wide string
        while unsafe { *raw.add(len) } != 0 {
            len += 1;
        }
        // SAFETY: len wide characters were counted before the terminator
        Some(PathBuf::from(OsString::from_wide(unsafe {
            core::slice::from_raw_parts(raw, len)
        })))
    } else {
        None
    };
    // SAFETY: the shell hands the caller the allocation even when the call
    // fails, and freeing a null pointer is a no-op
    unsafe { CoTaskMemFree(raw.cast()) };
    path
}

#[cfg(test)]
mod tests {
    use super::{
        canonical, has_verbatim_prefix, normalise_target, stat_info, strip_extended_prefix,
        to_wide,
    };
    use crate::FileType;
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use std::path::{Path, PathBuf};

    fn wide(text: &str) -> Vec<u16> {
        text.encode_utf16().collect()
    }

    #[test]
    fn target_separators_are_normalised() {
        let mut expected = wide(r"a\b\c");
        expected.push(0);
        assert_eq!(normalise_target("a/b//c".as_ref()).unwrap(), expected);

        let mut unc = wide(r"\\server\share");
        unc.push(0);
        assert_eq!(normalise_target(r"\\server\\share".as_ref()).unwrap(), unc);
    }

    #[test]
    fn extended_prefixes_are_stripped() {
        assert_eq!(
            strip_extended_prefix(wide(r"\\?\C:\x\y")),
            wide(r"C:\x\y")
        );
        assert_eq!(
            strip_extended_prefix(wide(r"\\?\UNC\srv\share\z")),
            wide(r"\\srv\share\z")
        );
        assert_eq!(strip_extended_prefix(wide(r"C:\plain")), wide(r"C:\plain"));
    }

    #[test]
    fn nul_units_are_rejected() {
        assert!(to_wide(OsStr::new("fo\0o")).is_err());
    }

    #[test]
    fn verbatim_spellings_are_recognised() {
        assert!(has_verbatim_prefix(Path::new(r"\\?\C:\x")));
        assert!(has_verbatim_prefix(Path::new(r"\\?\UNC\srv\share")));
        assert!(!has_verbatim_prefix(Path::new(r"C:\x")));
        assert!(!has_verbatim_prefix(Path::new(r"\\srv\share\z")));
    }

    #[test]
    fn junctions_read_back_unknown_and_are_not_followed() {
        let scratch = tempfile::tempdir().unwrap();
        let target = scratch.path().join("store");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("inner.txt"), b"payload").unwrap();
        // mklink is a cmd builtin; /J needs no privilege
        let junction = scratch.path().join("doorway");
        let made = std::process::Command::new("cmd")
            .args(["/C", "mklink", "/J"])
            .arg(&junction)
            .arg(&target)
            .output()
            .unwrap();
        assert!(made.status.success());

        // followed or not, a junction is opaque: never the target's directory
        let through = stat_info(&junction, true).unwrap();
        assert_eq!(through.file_type, FileType::Unknown);
        let direct = stat_info(&junction, false).unwrap();
        assert_eq!(direct.file_type, FileType::Unknown);
    }

    #[test]
    fn canonical_mirrors_the_input_prefix_form() {
        let scratch = tempfile::tempdir().unwrap();
        let file = scratch.path().join("anchor.txt");
        std::fs::write(&file, b"x").unwrap();

        let plain = canonical(&file).unwrap();
        assert!(!has_verbatim_prefix(&plain));

        let verbatim = PathBuf::from(format!(r"\\?\{}", file.display()));
        let long = canonical(&verbatim).unwrap();
        assert!(has_verbatim_prefix(&long));

        // both spellings name the same resolved path underneath
        let stripped = strip_extended_prefix(long.as_os_str().encode_wide().collect());
        assert_eq!(stripped, plain.as_os_str().encode_wide().collect::<Vec<u16>>());
    }
}
