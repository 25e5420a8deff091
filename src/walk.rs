use crate::direntry::DirEntry;
use crate::error::Result;
use crate::sys;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/**
Iterator over the entries of one directory, in whatever order the host
hands them out. `.` and `..` never appear. Each entry carries the symlink
flavour of its metadata, so a link shows up as a link.

The native stream is released when the iterator is dropped, or earlier once
it runs dry.
*/
pub struct ReadDir {
    inner: sys::ReadDir,
    path: PathBuf,
}

/**
Opens `path` for flat iteration.

# Examples
```no_run
for entry in hostfs::read_dir("src".as_ref())? {
    println!("{}", entry.path().display());
}
# hostfs::Result::Ok(())
```

# Errors

[`FsError::NotFound`](crate::FsError::NotFound) when the directory is
missing, [`FsError::NotADirectory`](crate::FsError::NotADirectory) when the
path is something else.
*/
pub fn read_dir(path: &Path) -> Result<ReadDir> {
    Ok(ReadDir {
        inner: sys::ReadDir::open(path)?,
        path: path.to_path_buf(),
    })
}

impl Iterator for ReadDir {
    type Item = DirEntry;

    fn next(&mut self) -> Option<DirEntry> {
        let (name, info) = self.inner.next()?;
        Some(DirEntry::new(self.path.join(name), info))
    }
}

/**
Depth-first walk over a directory tree, parents before their contents.

The walk keeps one open directory stream per level on an explicit stack, so
arbitrarily deep trees cost no call-stack. The root directory itself is not
yielded. Directory entries are descended into right after being yielded
unless [`disable_recursion_pending`](Self::disable_recursion_pending) says
otherwise; symlinks are reported but never followed downwards. A
subdirectory that cannot be opened (at this point racing deleters are
routine) is recorded at debug level and skipped.
*/
pub struct RecursiveReadDir {
    stack: Vec<sys::ReadDir>,
    path: PathBuf,
    pending: Option<OsString>,
}

/**
Opens `path` for a recursive walk.

# Examples
```no_run
for entry in hostfs::walk("src".as_ref())? {
    println!("{}", entry.path().display());
}
# hostfs::Result::Ok(())
```

# Errors

As [`read_dir`], for the root directory only; levels below it report
through the walk's skip behaviour instead.
*/
pub fn walk(path: &Path) -> Result<RecursiveReadDir> {
    let root = sys::ReadDir::open(path)?;
    Ok(RecursiveReadDir {
        stack: vec![root],
        path: path.to_path_buf(),
        pending: None,
    })
}

impl RecursiveReadDir {
    /// How many levels below the root the walk currently sits: 0 while the
    /// root's own entries are being yielded.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len().saturating_sub(1)
    }

    /// Will the next step descend into the entry that was just yielded?
    #[must_use]
    pub fn recursion_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Keeps the walk at the current level instead of descending into the
    /// directory entry that was just yielded. A no-op when nothing is
    /// pending.
    pub fn disable_recursion_pending(&mut self) {
        self.pending = None;
    }

    /// Abandons the level currently being walked: the open directory is
    /// released and iteration resumes in its parent. At the root this ends
    /// the walk.
    pub fn pop(&mut self) {
        self.pending = None;
        if self.stack.pop().is_some() && !self.stack.is_empty() {
            self.path.pop();
        }
    }
}

impl Iterator for RecursiveReadDir {
    type Item = DirEntry;

    fn next(&mut self) -> Option<DirEntry> {
        if let Some(name) = self.pending.take() {
            self.path.push(&name);
            match sys::ReadDir::open(&self.path) {
                Ok(dir) => self.stack.push(dir),
                Err(err) => {
                    tracing::debug!(
                        target: "hostfs",
                        path = %self.path.display(),
                        error = %err,
                        "subdirectory skipped"
                    );
                    self.path.pop();
                }
            }
        }
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some((name, info)) => {
                    let entry = DirEntry::new(self.path.join(&name), info);
                    if info.is_dir() {
                        self.pending = Some(name);
                    }
                    return Some(entry);
                }
                None => {
                    // this level is done; drop its stream and step back up
                    self.stack.pop();
                    if !self.stack.is_empty() {
                        self.path.pop();
                    }
                }
            }
        }
    }
}
