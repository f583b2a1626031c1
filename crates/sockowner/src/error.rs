//! Error types for socket owner resolution.

use std::io;

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving a socket's owning process.
///
/// Only terminal outcomes are represented here. Per-candidate failures during
/// the `/proc` scan (permission denied, vanished process, racing descriptor)
/// are absorbed by the searcher and only ever surface as [`Error::NotFound`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Protocol is neither TCP nor UDP.
    #[error("invalid network: {0}")]
    InvalidNetwork(String),

    /// Failure opening, writing to, or reading from the diagnostic channel,
    /// or an error code returned by the kernel.
    #[error("netlink error: {0}")]
    Netlink(#[source] io::Error),

    /// No socket record from the kernel, or no process holding the socket.
    #[error("{}", not_found_message(*inode, *uid))]
    NotFound {
        /// Socket inode, when the kernel returned one.
        inode: Option<u32>,
        /// Owning user id, when the kernel returned one.
        uid: Option<u32>,
    },

    /// The process-information root itself could not be listed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn not_found_message(inode: Option<u32>, uid: Option<u32>) -> String {
    match (inode, uid) {
        (Some(inode), Some(uid)) => format!("inode {} of uid {} not found", inode, uid),
        _ => "socket not found".to_string(),
    }
}

impl Error {
    /// Create a netlink error from a kernel errno (negative or positive).
    pub fn from_errno(errno: i32) -> Self {
        Self::Netlink(io::Error::from_raw_os_error(errno.wrapping_abs()))
    }

    /// Not-found error carrying the socket identity that was searched for.
    pub fn not_found(inode: u32, uid: u32) -> Self {
        Self::NotFound {
            inode: Some(inode),
            uid: Some(uid),
        }
    }

    /// Not-found error for a socket the kernel has no record of.
    pub fn no_socket() -> Self {
        Self::NotFound {
            inode: None,
            uid: None,
        }
    }

    /// Check if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an invalid network error.
    pub fn is_invalid_network(&self) -> bool {
        matches!(self, Self::InvalidNetwork(_))
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.errno(), Some(libc::EPERM) | Some(libc::EACCES))
    }

    /// Get the OS errno value, if any.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Netlink(e) | Self::Io(e) => e.raw_os_error(),
            _ => None,
        }
    }
}
