//! Resolver configuration.
//!
//! All fields have defaults, so a configuration file only needs to name the
//! values it changes:
//!
//! ```json
//! { "proc_root": "/host/proc" }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::sockdiag::{DEFAULT_RECV_BUFFER_SIZE, MIN_RECV_BUFFER_SIZE};

/// Default process-information root.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Minimum (and default) size of the path scratch buffer.
pub const MIN_PATH_BUFFER_SIZE: usize = 64;

/// Minimum (and default) size of the link-target scratch buffer.
///
/// Large enough for `socket:[4294967295]`.
pub const MIN_LINK_BUFFER_SIZE: usize = 32;

/// Tunables for [`Resolver`](crate::Resolver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Root of the process-information tree.
    pub proc_root: PathBuf,
    /// Size of the scratch buffer used to build `/proc` paths.
    pub path_buffer_size: usize,
    /// Size of the scratch buffer descriptor link targets are read into.
    pub link_buffer_size: usize,
    /// Size of the buffer the kernel's diagnostic reply is received into.
    pub recv_buffer_size: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            path_buffer_size: MIN_PATH_BUFFER_SIZE,
            link_buffer_size: MIN_LINK_BUFFER_SIZE,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
        }
    }
}

impl ResolverConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the process-information root.
    pub fn proc_root(mut self, root: impl AsRef<Path>) -> Self {
        self.proc_root = root.as_ref().to_path_buf();
        self
    }

    /// Set the path scratch buffer size (never below the minimum).
    pub fn path_buffer_size(mut self, size: usize) -> Self {
        self.path_buffer_size = size;
        self
    }

    /// Set the link scratch buffer size (never below the minimum).
    pub fn link_buffer_size(mut self, size: usize) -> Self {
        self.link_buffer_size = size;
        self
    }

    /// Set the netlink receive buffer size.
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size;
        self
    }

    /// Clamp every size to its minimum.
    pub fn normalized(mut self) -> Self {
        self.path_buffer_size = self.path_buffer_size.max(MIN_PATH_BUFFER_SIZE);
        self.link_buffer_size = self.link_buffer_size.max(MIN_LINK_BUFFER_SIZE);
        self.recv_buffer_size = self.recv_buffer_size.max(MIN_RECV_BUFFER_SIZE);
        self
    }
}
