use std::{fmt, io};

///Generic result type for filesystem operations
pub type Result<T> = core::result::Result<T, FsError>;

/// Reads the calling thread's last OS error code (errno on POSIX, `GetLastError()` on Windows).
#[inline]
pub(crate) fn last_errno() -> i32 {
    io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// A failed native call: which API failed and the raw OS code it left behind.
///
/// The code is `errno` on POSIX and `GetLastError()` on Windows, kept raw so
/// callers can still match on platform constants when they need to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OsError {
    /// Name of the native API that failed, e.g. `"lstat"` or `"CreateFileW"`.
    pub api: &'static str,
    /// The raw OS error code captured immediately after the call.
    pub code: i32,
}

impl OsError {
    /// The one place failing native calls get recorded. Expected not-found
    /// outcomes never come through here, they are values rather than errors.
    #[cold]
    pub(crate) fn log(api: &'static str, code: i32) -> Self {
        tracing::debug!(target: "hostfs", api, code, "host call failed");
        Self { api, code }
    }

    /// Captures the current thread's last OS error for `api` and records it.
    #[cold]
    pub(crate) fn last(api: &'static str) -> Self {
        Self::log(api, last_errno())
    }
}

impl fmt::Display for OsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed with code {} ({})",
            self.api,
            self.code,
            io::Error::from_raw_os_error(self.code)
        )
    }
}

impl std::error::Error for OsError {}

/// An error type for filesystem operations.
///
/// Absence and precondition violations are separate variants so callers can
/// treat them as ordinary outcomes; everything else carries the failing API
/// name and raw code in [`OsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// The path (or, when following links, its target) does not exist.
    NotFound,
    /// Something already exists where the operation wanted to create.
    AlreadyExists,
    /// A directory was required and the path is not one.
    NotADirectory,
    /// [`read_symlink`](crate::read_symlink) was pointed at a non-symlink.
    NotASymlink,
    /// The path could not be handed to the OS (embedded NUL or malformed).
    InvalidPath,
    /// Any other native failure.
    Os(OsError),
}

impl From<OsError> for FsError {
    #[inline]
    fn from(e: OsError) -> Self {
        Self::Os(e)
    }
}

impl From<std::ffi::NulError> for FsError {
    #[inline]
    fn from(_: std::ffi::NulError) -> Self {
        Self::InvalidPath
    }
}

impl From<io::Error> for FsError {
    fn from(error: io::Error) -> Self {
        // map the classified kinds to variants first
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::AlreadyExists => Self::AlreadyExists,
            io::ErrorKind::NotADirectory => Self::NotADirectory,
            io::ErrorKind::InvalidInput => Self::InvalidPath,
            _ => Self::Os(OsError::log("io", error.raw_os_error().unwrap_or(0))),
        }
    }
}

#[allow(clippy::pattern_type_mismatch)]
impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "No such file or directory"),
            Self::AlreadyExists => write!(f, "Already exists"),
            Self::NotADirectory => write!(f, "Not a directory"),
            Self::NotASymlink => write!(f, "Not a symbolic link"),
            Self::InvalidPath => write!(f, "Invalid path"),
            Self::Os(e) => write!(f, "OS error: {e}"),
        }
    }
}

#[allow(clippy::pattern_type_mismatch)]
impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Os(e) => Some(e),
            _ => None,
        }
    }
}

/// Outcome of [`remove`](crate::remove) and [`remove_all`](crate::remove_all).
///
/// `NotFound` keeps removal idempotent (the caller decides whether absence
/// matters) and `DirectoryNotEmpty` is reported distinctly because a plain
/// remove of a populated directory is an ordinary, recoverable outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveError {
    NotFound,
    DirectoryNotEmpty,
    Other(OsError),
}

impl From<OsError> for RemoveError {
    #[inline]
    fn from(e: OsError) -> Self {
        Self::Other(e)
    }
}

#[allow(clippy::pattern_type_mismatch)]
impl fmt::Display for RemoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "No such file or directory"),
            Self::DirectoryNotEmpty => write!(f, "Directory not empty"),
            Self::Other(e) => write!(f, "OS error: {e}"),
        }
    }
}

#[allow(clippy::pattern_type_mismatch)]
impl std::error::Error for RemoveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Other(e) => Some(e),
            _ => None,
        }
    }
}
