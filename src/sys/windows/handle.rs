use windows_sys::Win32::Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::Storage::FileSystem::FindClose;

/// Owner of one open Win32 handle.
///
/// Move-only. `close()` releases the handle and installs the sentinel, so
/// closing twice (or dropping after an explicit close) does nothing.
#[repr(transparent)]
#[derive(Debug)]
pub(crate) struct Handle(HANDLE);

impl Handle {
    /// Adopts a handle fresh from `CreateFileW` and friends. `None` when the
    /// call reported failure through the sentinel value.
    pub(crate) fn new(raw: HANDLE) -> Option<Self> {
        if raw == INVALID_HANDLE_VALUE {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub(crate) const fn raw(&self) -> HANDLE {
        self.0
    }

    /// Releases the handle now rather than at drop time.
    pub(crate) fn close(&mut self) {
        if self.0 != INVALID_HANDLE_VALUE {
            // SAFETY: the handle is ours and still open, nothing else closes it
            unsafe { CloseHandle(self.0) };
            self.0 = INVALID_HANDLE_VALUE;
        }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Owner of one `FindFirstFileW` search handle, which has its own release
/// call (`FindClose`, not `CloseHandle`).
#[repr(transparent)]
#[derive(Debug)]
pub(crate) struct FindHandle(HANDLE);

impl FindHandle {
    pub(crate) fn new(raw: HANDLE) -> Option<Self> {
        if raw == INVALID_HANDLE_VALUE {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub(crate) const fn raw(&self) -> HANDLE {
        self.0
    }

    pub(crate) fn close(&mut self) {
        if self.0 != INVALID_HANDLE_VALUE {
            // SAFETY: the search handle is ours and still open
            unsafe { FindClose(self.0) };
            self.0 = INVALID_HANDLE_VALUE;
        }
    }
}

impl Drop for FindHandle {
    fn drop(&mut self) {
        self.close();
    }
}
