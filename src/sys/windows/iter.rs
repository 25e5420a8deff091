use super::handle::FindHandle;
use crate::error::{FsError, OsError, Result, last_errno};
use crate::metadata::FileInfo;
use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;
use std::path::Path;
use windows_sys::Win32::Foundation::{
    ERROR_DIRECTORY, ERROR_FILE_NOT_FOUND, ERROR_NO_MORE_FILES, ERROR_PATH_NOT_FOUND,
};
use windows_sys::Win32::Storage::FileSystem::{FindFirstFileW, FindNextFileW, WIN32_FIND_DATAW};

/**
One directory, one find handle. `FindFirstFileW` hands the first entry
back together with the handle, so we stash it and drain it on the first
`next` call before touching `FindNextFileW`.

An empty pattern match (a bare drive root with nothing in it) is a valid
open that yields nothing, hence the `Option` around the handle.
*/
pub(crate) struct ReadDir {
    handle: Option<FindHandle>,
    pending: Option<WIN32_FIND_DATAW>,
}

impl ReadDir {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let pattern = super::to_wide(path.join("*").as_os_str())?;
        // SAFETY: zeroed is a valid WIN32_FIND_DATAW, the call overwrites it
        let mut data: WIN32_FIND_DATAW = unsafe { core::mem::zeroed() };
        // SAFETY: pattern is NUL terminated and data is writable
        let raw = unsafe { FindFirstFileW(pattern.as_ptr(), &mut data) };
        match FindHandle::new(raw) {
            Some(handle) => Ok(Self {
                handle: Some(handle),
                pending: Some(data),
            }),
            None => match last_errno() as u32 {
                ERROR_FILE_NOT_FOUND => Ok(Self {
                    handle: None,
                    pending: None,
                }),
                ERROR_PATH_NOT_FOUND => Err(FsError::NotFound),
                ERROR_DIRECTORY => Err(FsError::NotADirectory),
                code => Err(OsError::log("FindFirstFileW", code as i32).into()),
            },
        }
    }
}

impl Iterator for ReadDir {
    type Item = (OsString, FileInfo);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let data = match self.pending.take() {
                Some(found) => found,
                None => {
                    let handle = self.handle.as_ref()?;
                    // SAFETY: zeroed is a valid WIN32_FIND_DATAW
                    let mut found: WIN32_FIND_DATAW = unsafe { core::mem::zeroed() };
                    // SAFETY: the handle stays open until we drop it below
                    if unsafe { FindNextFileW(handle.raw(), &mut found) } == 0 {
                        let code = last_errno() as u32;
                        if code != ERROR_NO_MORE_FILES {
                            OsError::log("FindNextFileW", code as i32);
                        }
                        // done either way, release the handle now rather
                        // than holding it until the iterator is dropped
                        self.handle = None;
                        return None;
                    }
                    found
                }
            };
            if is_dot_or_dot_dot(&data.cFileName) {
                continue;
            }
            let name = file_name(&data.cFileName);
            let info = super::info_from_find(&data, &name);
            return Some((name, info));
        }
    }
}

const DOT: u16 = b'.' as u16;

#[inline]
const fn is_dot_or_dot_dot(name: &[u16; 260]) -> bool {
    matches!((name[0], name[1], name[2]), (DOT, 0, _) | (DOT, DOT, 0))
}

#[inline]
fn file_name(name: &[u16; 260]) -> OsString {
    let len = name.iter().position(|&unit| unit == 0).unwrap_or(name.len());
    OsString::from_wide(&name[..len])
}
