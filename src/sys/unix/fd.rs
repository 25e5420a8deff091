use std::ffi::CStr;

/// Owner of one open file descriptor.
///
/// Move-only. `close()` releases the descriptor and installs the sentinel, so
/// closing twice (or dropping after an explicit close) does nothing.
#[repr(transparent)]
#[derive(Debug)]
pub(crate) struct FileDes(libc::c_int);

impl FileDes {
    pub(crate) const INVALID: libc::c_int = -1;

    /// Wraps `open(2)`; the error is the raw errno so the caller decides what
    /// counts as a value and what gets recorded.
    pub(crate) fn open(path: &CStr, flags: libc::c_int, mode: libc::mode_t) -> Result<Self, i32> {
        // SAFETY: the path is NUL-terminated and the remaining arguments are plain integers
        let fd = unsafe { libc::open(path.as_ptr(), flags, libc::c_uint::from(mode)) };
        if fd < 0 {
            Err(crate::error::last_errno())
        } else {
            Ok(Self(fd))
        }
    }

    /// Releases the descriptor now rather than at drop time.
    pub(crate) fn close(&mut self) {
        if self.0 >= 0 {
            // SAFETY: the descriptor is ours and still open, nothing else closes it
            unsafe { libc::close(self.0) };
            self.0 = Self::INVALID;
        }
    }
}

impl Drop for FileDes {
    fn drop(&mut self) {
        self.close();
    }
}
