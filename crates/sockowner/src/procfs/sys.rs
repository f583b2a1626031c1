//! Allocation-free filesystem primitives for the `/proc` scan.

use std::ffi::{CStr, OsStr};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr::NonNull;

/// Directory stream over `opendir`/`readdir`.
///
/// Entry names are borrowed from the stream, so iterating never allocates.
/// The stream is closed on drop.
pub(crate) struct DirStream {
    dir: NonNull<libc::DIR>,
}

impl DirStream {
    /// Open a directory for reading.
    pub(crate) fn open(path: &CStr) -> io::Result<Self> {
        // SAFETY: `path` is a valid NUL-terminated string for the duration of the call.
        let dir = unsafe { libc::opendir(path.as_ptr()) };
        NonNull::new(dir)
            .map(|dir| Self { dir })
            .ok_or_else(io::Error::last_os_error)
    }

    /// Next entry name, skipping `.` and `..`.
    ///
    /// Returns `None` at the end of the stream. A read error part way through
    /// also ends the stream: entries of a vanished directory are of no use.
    pub(crate) fn next_name(&mut self) -> Option<&CStr> {
        loop {
            // SAFETY: `self.dir` is an open stream owned by `self`.
            let ent = unsafe { libc::readdir(self.dir.as_ptr()) };
            if ent.is_null() {
                return None;
            }

            // SAFETY: readdir returned a valid dirent whose `d_name` is
            // NUL-terminated. It stays valid until the next readdir/closedir
            // on this stream, both of which need `&mut self`.
            let name = unsafe { CStr::from_ptr((*ent).d_name.as_ptr()) };
            if name == c"." || name == c".." {
                continue;
            }
            return Some(name);
        }
    }
}

impl Drop for DirStream {
    fn drop(&mut self) {
        // SAFETY: `self.dir` was returned by opendir and is closed only here.
        unsafe {
            libc::closedir(self.dir.as_ptr());
        }
    }
}

/// Read a symbolic link's target into `buf`, returning its length.
///
/// A result equal to `buf.len()` may be truncated.
pub(crate) fn read_link_into(path: &CStr, buf: &mut [u8]) -> io::Result<usize> {
    // SAFETY: `path` is NUL-terminated and `buf` is valid for `buf.len()` bytes.
    let n = unsafe { libc::readlink(path.as_ptr(), buf.as_mut_ptr().cast(), buf.len()) };
    if n < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(n as usize)
    }
}

/// Path assembled in a fixed scratch buffer, always NUL-terminated.
pub(crate) struct PathBuilder<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> PathBuilder<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        if let Some(first) = buf.first_mut() {
            *first = 0;
        }
        Self { buf, len: 0 }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Append bytes; returns `false` (leaving the path unchanged) if they
    /// would not fit together with the terminator.
    #[must_use]
    pub(crate) fn push(&mut self, bytes: &[u8]) -> bool {
        let end = self.len + bytes.len();
        if end >= self.buf.len() {
            return false;
        }
        self.buf[self.len..end].copy_from_slice(bytes);
        self.buf[end] = 0;
        self.len = end;
        true
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
            self.buf[len] = 0;
        }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub(crate) fn as_path(&self) -> &Path {
        Path::new(OsStr::from_bytes(self.as_bytes()))
    }

    /// The path as a C string; `None` if it contains an interior NUL.
    pub(crate) fn as_cstr(&self) -> Option<&CStr> {
        CStr::from_bytes_with_nul(&self.buf[..=self.len]).ok()
    }
}
