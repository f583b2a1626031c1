//! Owning-process search over the process-information tree.
//!
//! Given a socket inode and the uid that owns it, [`ProcSearcher`] walks
//! `/proc/<pid>/fd/*` of every process running as that uid and looks for a
//! descriptor linking to `socket:[<inode>]`. The executable of the first
//! process found is returned.
//!
//! The tree is read-only and racy: processes exit, descriptors close and
//! permissions deny access while the scan runs. Such failures only skip the
//! candidate at hand.

mod sys;

use std::io::{self, Write};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::{DEFAULT_PROC_ROOT, MIN_LINK_BUFFER_SIZE, MIN_PATH_BUFFER_SIZE, ResolverConfig};
use crate::error::{Error, Result};
use crate::pool::BufferPool;
use sys::{DirStream, PathBuilder, read_link_into};

/// Longest possible descriptor link target we look for: `socket:[4294967295]`.
const SOCKET_LINK_MAX: usize = 24;

/// Room needed past the root for `<pid>/fd/<fd>` plus the terminator.
const PID_PATH_RESERVE: usize = 32;

/// The process found to hold a socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessRecord {
    /// Process id, as named in the process-information tree.
    pub pid: String,
    /// Owning user id.
    pub uid: u32,
    /// Executable path.
    pub path: PathBuf,
}

/// Scanner for the process holding a given socket inode.
#[derive(Debug, Clone)]
pub struct ProcSearcher {
    root: PathBuf,
    pool: Arc<BufferPool>,
    path_buffer_size: usize,
    link_buffer_size: usize,
}

impl Default for ProcSearcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcSearcher {
    /// Search `/proc` using the process-wide buffer pool.
    pub fn new() -> Self {
        Self::with_root(DEFAULT_PROC_ROOT)
    }

    /// Search an alternate process-information root.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            pool: BufferPool::global(),
            path_buffer_size: MIN_PATH_BUFFER_SIZE,
            link_buffer_size: MIN_LINK_BUFFER_SIZE,
        }
    }

    /// Build a searcher from a resolver configuration.
    pub fn from_config(config: &ResolverConfig, pool: Arc<BufferPool>) -> Self {
        Self {
            root: config.proc_root.clone(),
            pool,
            path_buffer_size: config.path_buffer_size.max(MIN_PATH_BUFFER_SIZE),
            link_buffer_size: config.link_buffer_size.max(MIN_LINK_BUFFER_SIZE),
        }
    }

    /// Use `pool` for scratch buffers.
    pub fn pool(mut self, pool: Arc<BufferPool>) -> Self {
        self.pool = pool;
        self
    }

    /// The process-information root being searched.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The scratch buffer pool.
    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    /// Find the executable of the process holding socket `inode` owned by `uid`.
    pub fn find_executable(&self, inode: u32, uid: u32) -> Result<PathBuf> {
        self.find_process(inode, uid).map(|record| record.path)
    }

    /// Find the process holding socket `inode` owned by `uid`.
    ///
    /// Only processes running as `uid` are inspected. Returns
    /// [`Error::NotFound`] if none holds the socket and [`Error::Io`] if the
    /// root cannot be listed at all.
    pub fn find_process(&self, inode: u32, uid: u32) -> Result<ProcessRecord> {
        use std::os::unix::ffi::OsStrExt;

        let mut target = [0u8; SOCKET_LINK_MAX];
        let target = socket_link(inode, &mut target);

        let root = self.root.as_os_str().as_bytes();
        let mut path_buf = self
            .pool
            .checkout(self.path_buffer_size.max(root.len() + PID_PATH_RESERVE));
        let mut link = self.pool.checkout(self.link_buffer_size);

        let mut path = PathBuilder::new(&mut path_buf);
        if !path.push(root) || (!root.ends_with(b"/") && !path.push(b"/")) {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "process root path too long",
            )));
        }
        let root_len = path.len();

        let mut procs = {
            let cpath = path.as_cstr().ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "process root contains NUL")
            })?;
            DirStream::open(cpath)?
        };

        while let Some(name) = procs.next_name() {
            let pid = name.to_bytes();
            if !is_pid(pid) {
                continue;
            }

            path.truncate(root_len);
            if !path.push(pid) {
                continue;
            }

            match std::fs::metadata(path.as_path()) {
                Ok(meta) if meta.uid() == uid => {}
                Ok(_) => continue,
                Err(e) => {
                    tracing::trace!(path = %path.as_path().display(), error = %e, "skipping process");
                    continue;
                }
            }

            if !holds_socket(&mut path, &mut link, target) {
                continue;
            }

            path.truncate(root_len);
            if !path.push(pid) || !path.push(b"/exe") {
                continue;
            }
            match std::fs::read_link(path.as_path()) {
                Ok(exe) => {
                    let pid = String::from_utf8_lossy(pid).into_owned();
                    tracing::debug!(inode, uid, %pid, exe = %exe.display(), "process found");
                    return Ok(ProcessRecord {
                        pid,
                        uid,
                        path: exe,
                    });
                }
                Err(e) => {
                    tracing::trace!(path = %path.as_path().display(), error = %e, "unreadable exe link");
                }
            }
        }

        Err(Error::not_found(inode, uid))
    }
}

/// Whether any descriptor of the process at `path` links to `target`.
///
/// `path` must name the process directory; it is left pointing somewhere
/// inside it.
fn holds_socket(path: &mut PathBuilder<'_>, link: &mut [u8], target: &[u8]) -> bool {
    if !path.push(b"/fd/") {
        return false;
    }
    let fd_dir = path.len();

    let opened = match path.as_cstr() {
        Some(cpath) => DirStream::open(cpath),
        None => return false,
    };
    let mut fds = match opened {
        Ok(fds) => fds,
        Err(e) => {
            tracing::trace!(path = %path.as_path().display(), error = %e, "skipping descriptors");
            return false;
        }
    };

    while let Some(fd) = fds.next_name() {
        path.truncate(fd_dir);
        if !path.push(fd.to_bytes()) {
            continue;
        }
        let Some(cpath) = path.as_cstr() else {
            continue;
        };
        match read_link_into(cpath, link) {
            // A target filling the whole buffer may have been truncated.
            Ok(n) if n < link.len() && &link[..n] == target => return true,
            Ok(_) => {}
            Err(e) => {
                tracing::trace!(path = %path.as_path().display(), error = %e, "descriptor vanished");
            }
        }
    }
    false
}

/// Whether a directory entry name is a process id.
fn is_pid(name: &[u8]) -> bool {
    !name.is_empty() && name.iter().all(u8::is_ascii_digit)
}

/// Format the descriptor link target of socket `inode` into `buf`.
fn socket_link(inode: u32, buf: &mut [u8; SOCKET_LINK_MAX]) -> &[u8] {
    let mut cursor = &mut buf[..];
    // Always fits: the longest target is 19 bytes.
    let _ = write!(cursor, "socket:[{}]", inode);
    let len = SOCKET_LINK_MAX - cursor.len();
    &buf[..len]
}
