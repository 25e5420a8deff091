use super::handle::Handle;
use crate::error::{FsError, OsError, Result, last_errno};
use std::ffi::OsString;
use std::os::windows::ffi::OsStringExt;
use std::path::PathBuf;
use windows_sys::Win32::Foundation::ERROR_NOT_A_REPARSE_POINT;
use windows_sys::Win32::System::IO::DeviceIoControl;
use windows_sys::Win32::System::Ioctl::FSCTL_GET_REPARSE_POINT;
use windows_sys::Win32::System::SystemServices::IO_REPARSE_TAG_SYMLINK;

// From ntifs.h. The ioctl refuses anything larger, so one buffer of this
// size always suffices.
const MAXIMUM_REPARSE_DATA_BUFFER_SIZE: u32 = 16 * 1024;

// The REPARSE_DATA_BUFFER layout from ntifs.h, which windows-sys does not
// carry. Byte offsets into the ioctl output:
//   0  ReparseTag           u32
//   4  ReparseDataLength    u16
//   6  Reserved             u16
// and for the symlink payload that follows:
//   8  SubstituteNameOffset u16 (bytes, relative to PathBuffer)
//  10  SubstituteNameLength u16 (bytes)
//  12  PrintNameOffset      u16
//  14  PrintNameLength      u16
//  16  Flags                u32
//  20  PathBuffer           [u16]
const SYMLINK_PATH_BUFFER: usize = 20;

const BUF_WORDS: usize = MAXIMUM_REPARSE_DATA_BUFFER_SIZE as usize / 4;

/// Pulls the raw reparse payload through `FSCTL_GET_REPARSE_POINT`. The
/// handle must have been opened with `FILE_FLAG_OPEN_REPARSE_POINT`.
/// Pointing this at a plain file is an ordinary outcome, not a recorded one.
fn read_reparse(handle: &Handle) -> Result<[u32; BUF_WORDS]> {
    let mut buf = [0u32; BUF_WORDS];
    let mut returned: u32 = 0;
    // SAFETY: the handle is open and the buffer is writable for its full length
    let ok = unsafe {
        DeviceIoControl(
            handle.raw(),
            FSCTL_GET_REPARSE_POINT,
            core::ptr::null(),
            0,
            buf.as_mut_ptr().cast(),
            MAXIMUM_REPARSE_DATA_BUFFER_SIZE,
            &mut returned,
            core::ptr::null_mut(),
        )
    };
    if ok == 0 {
        return Err(match last_errno() as u32 {
            ERROR_NOT_A_REPARSE_POINT => FsError::NotASymlink,
            code => OsError::log("DeviceIoControl", code as i32).into(),
        });
    }
    Ok(buf)
}

/// The reparse tag of the entry behind `handle`.
pub(crate) fn reparse_tag(handle: &Handle) -> Result<u32> {
    Ok(read_reparse(handle)?[0])
}

/// Target stored in a symlink reparse point: the print name when one is
/// recorded, otherwise the substitute name with its `\??\` NT prefix
/// stripped. Any other reparse kind is not a symlink to us.
pub(crate) fn symlink_target(handle: &Handle) -> Result<PathBuf> {
    let buf = read_reparse(handle)?;
    if buf[0] != IO_REPARSE_TAG_SYMLINK {
        return Err(FsError::NotASymlink);
    }
    // SAFETY: the array is fully initialised and u32 can be viewed as bytes
    let bytes: &[u8] =
        unsafe { core::slice::from_raw_parts(buf.as_ptr().cast::<u8>(), buf.len() * 4) };
    let sub_off = usize::from(u16_at(bytes, 8));
    let sub_len = usize::from(u16_at(bytes, 10));
    let print_off = usize::from(u16_at(bytes, 12));
    let print_len = usize::from(u16_at(bytes, 14));
    let (off, len) = if print_len > 0 {
        (print_off, print_len)
    } else {
        (sub_off, sub_len)
    };
    let mut name =
        wide_at(bytes, SYMLINK_PATH_BUFFER + off, len).ok_or(FsError::InvalidPath)?;
    const NT_PREFIX: [u16; 4] = [b'\\' as u16, b'?' as u16, b'?' as u16, b'\\' as u16];
    if name.starts_with(&NT_PREFIX) {
        name.drain(..NT_PREFIX.len());
    }
    Ok(PathBuf::from(OsString::from_wide(&name)))
}

fn u16_at(bytes: &[u8], at: usize) -> u16 {
    let pair = [bytes[at], bytes[at + 1]];
    u16::from_le_bytes(pair)
}

/// Bounds-checked read of `len_bytes` of UTF-16 starting at `start`; `None`
/// when the driver handed back offsets that point outside the buffer.
fn wide_at(bytes: &[u8], start: usize, len_bytes: usize) -> Option<Vec<u16>> {
    let end = start.checked_add(len_bytes)?;
    let raw = bytes.get(start..end)?;
    Some(
        raw.chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect(),
    )
}
